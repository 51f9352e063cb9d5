//! Platform context and build metadata consumed by the identifier sources.

use std::collections::HashMap;

/// Value the platform reports for a build property it does not know.
pub const UNKNOWN: &str = "unknown";

/// The build properties the pseudo ID is synthesized from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProperties {
    pub board: String,
    pub brand: String,
    pub cpu_abi: String,
    pub device: String,
    pub display: String,
    pub host: String,
    pub id: String,
    pub manufacturer: String,
    pub model: String,
    pub product: String,
    pub tags: String,
    pub build_type: String,
    pub user: String,
}

impl Default for BuildProperties {
    fn default() -> Self {
        let unknown = || UNKNOWN.to_string();
        Self {
            board: unknown(),
            brand: unknown(),
            cpu_abi: unknown(),
            device: unknown(),
            display: unknown(),
            host: unknown(),
            id: unknown(),
            manufacturer: unknown(),
            model: unknown(),
            product: unknown(),
            tags: unknown(),
            build_type: unknown(),
            user: unknown(),
        }
    }
}

impl BuildProperties {
    /// Reads the build properties from Android system property keys.
    ///
    /// Keys that are absent or empty fall back to [`UNKNOWN`].
    pub fn from_system_properties(props: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            props
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| UNKNOWN.to_string())
        };
        Self {
            board: get("ro.product.board"),
            brand: get("ro.product.brand"),
            cpu_abi: get("ro.product.cpu.abi"),
            device: get("ro.product.device"),
            display: get("ro.build.display.id"),
            host: get("ro.build.host"),
            id: get("ro.build.id"),
            manufacturer: get("ro.product.manufacturer"),
            model: get("ro.product.model"),
            product: get("ro.product.name"),
            tags: get("ro.build.tags"),
            build_type: get("ro.build.type"),
            user: get("ro.build.user"),
        }
    }

    /// Parses the `[key]: [value]` lines printed by `getprop`.
    ///
    /// Lines that do not have that shape are skipped.
    pub fn parse_getprop(output: &str) -> Self {
        let mut props = HashMap::new();
        for line in output.lines() {
            let Some((key, value)) = line.trim().split_once("]: [") else {
                continue;
            };
            let (Some(key), Some(value)) = (key.strip_prefix('['), value.strip_suffix(']')) else {
                continue;
            };
            props.insert(key.to_string(), value.to_string());
        }
        Self::from_system_properties(&props)
    }

    /// The thirteen properties in pseudo ID digit order.
    pub fn fields(&self) -> [&str; 13] {
        [
            &self.board,
            &self.brand,
            &self.cpu_abi,
            &self.device,
            &self.display,
            &self.host,
            &self.id,
            &self.manufacturer,
            &self.model,
            &self.product,
            &self.tags,
            &self.build_type,
            &self.user,
        ]
    }

    /// Synthesizes the IMEI-shaped pseudo ID: `35` followed by one digit per
    /// property, each the property's length mod 10.
    ///
    /// Length is counted in UTF-16 code units, matching the platform's string length.
    pub fn pseudo_id(&self) -> String {
        let mut id = String::with_capacity(15);
        id.push_str("35");
        for field in self.fields() {
            let digit = (field.encode_utf16().count() % 10) as u32;
            // digit < 10
            id.push(char::from_digit(digit, 10).unwrap_or('0'));
        }
        id
    }
}

/// Access to the platform services the identifier sources query.
pub trait DeviceContext {
    /// The platform-assigned secure Android ID, if the platform has one.
    fn android_id(&self) -> Option<String>;

    /// The device's build properties.
    fn build_properties(&self) -> BuildProperties;
}

/// A [`DeviceContext`] over values the host has already read.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pub android_id: Option<String>,
    pub build: BuildProperties,
}

impl StaticContext {
    pub fn new(android_id: Option<String>, build: BuildProperties) -> Self {
        Self { android_id, build }
    }
}

impl DeviceContext for StaticContext {
    fn android_id(&self) -> Option<String> {
        self.android_id.clone()
    }

    fn build_properties(&self) -> BuildProperties {
        self.build.clone()
    }
}
