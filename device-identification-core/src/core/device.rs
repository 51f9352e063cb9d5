//! Device identifier resolution with process-lifetime caching.
//!
//! Each of the three identifier forms (raw, UUID, MD5) lives in its own
//! [`OnceLock`] slot. Reads of a filled slot never take a lock; the first
//! caller to miss takes the resolver's mutex, re-checks the slot and walks
//! the [`IdentifierSource`] list. A slot is written at most once and never
//! refreshed.

use crate::core::hash::string_hash;
use crate::{
    BuildProperties, DeviceContext, DeviceIdError, HashProvider, IdentifierSource, Md5Hasher,
    NotUnique, ResolverConfig, Result,
};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use uuid::Uuid;

type SourceOutcome = std::result::Result<Option<String>, NotUnique>;

/// Resolves and caches device identifiers.
pub struct DeviceIdentifierResolver {
    config: ResolverConfig,
    hasher: Box<dyn HashProvider>,
    lock: Mutex<()>,
    device_id: OnceLock<String>,
    uuid: OnceLock<String>,
    md5: OnceLock<String>,
}

impl Default for DeviceIdentifierResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl DeviceIdentifierResolver {
    /// Creates a resolver with empty caches that hashes with [`Md5Hasher`].
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_hasher(config, Md5Hasher)
    }

    pub fn with_hasher(config: ResolverConfig, hasher: impl HashProvider + 'static) -> Self {
        Self {
            config,
            hasher: Box::new(hasher),
            lock: Mutex::new(()),
            device_id: OnceLock::new(),
            uuid: OnceLock::new(),
            md5: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the first identifier produced by the sources in priority order.
    ///
    /// If `ignore_buggy_android_id` is false and the Android ID is a known
    /// non-unique value, fails instead of falling back to the next source.
    ///
    /// # Errors
    ///
    /// - [`DeviceIdError::NonUniqueIdentifier`] for an unignored buggy Android ID.
    /// - [`DeviceIdError::IdentifierUnavailable`] if no source produced a value.
    pub fn device_identifier(
        &self,
        ctx: &dyn DeviceContext,
        ignore_buggy_android_id: bool,
    ) -> Result<String> {
        if let Some(id) = self.device_id.get() {
            return Ok(id.clone());
        }
        let _guard = self.lock();
        self.init_device_identifier(ctx, ignore_buggy_android_id, &mut None)
    }

    /// Returns a UUID-formatted identifier.
    ///
    /// The low 64 bits come from the raw identifier, the high 64 bits from the
    /// Android ID (or the pseudo ID when the Android ID is absent, or buggy and
    /// ignored).
    ///
    /// # Errors
    ///
    /// Same as [`device_identifier`](Self::device_identifier).
    pub fn device_identifier_uuid(
        &self,
        ctx: &dyn DeviceContext,
        ignore_buggy_android_id: bool,
    ) -> Result<String> {
        if let Some(uuid) = self.uuid.get() {
            return Ok(uuid.clone());
        }
        let _guard = self.lock();
        if let Some(uuid) = self.uuid.get() {
            return Ok(uuid.clone());
        }

        let mut android_outcome = None;
        let raw = self.init_device_identifier(ctx, ignore_buggy_android_id, &mut android_outcome)?;
        let low = (i64::from(string_hash(&raw)) << 32) as u64;

        let android_outcome = android_outcome
            .unwrap_or_else(|| IdentifierSource::AndroidId.resolve(ctx, &self.config));
        let android_id = match android_outcome {
            Ok(Some(id)) => id,
            Ok(None) => ctx.build_properties().pseudo_id(),
            Err(not_unique) => {
                self.skip_not_unique(not_unique, ignore_buggy_android_id)?;
                ctx.build_properties().pseudo_id()
            }
        };
        let high = i64::from(string_hash(&android_id)) as u64;

        let uuid = Uuid::from_u64_pair(high, low).hyphenated().to_string();
        log::debug!("device uuid resolved: {uuid}");
        Ok(self.uuid.get_or_init(|| uuid).clone())
    }

    /// Returns the hex MD5 digest of the collected source identifiers.
    ///
    /// The digest is taken as soon as one source has contributed, so only the
    /// first source that yields a value is part of it.
    ///
    /// # Errors
    ///
    /// Same as [`device_identifier`](Self::device_identifier), plus
    /// [`DeviceIdError::HashingUnavailable`] if the digest cannot be computed.
    pub fn device_identifier_md5(
        &self,
        ctx: &dyn DeviceContext,
        ignore_buggy_android_id: bool,
    ) -> Result<String> {
        if let Some(digest) = self.md5.get() {
            return Ok(digest.clone());
        }
        let _guard = self.lock();
        if let Some(digest) = self.md5.get() {
            return Ok(digest.clone());
        }

        let mut collected = String::new();
        for source in IdentifierSource::ALL {
            match source.resolve(ctx, &self.config) {
                Ok(Some(id)) => collected.push_str(&id),
                Ok(None) => continue,
                Err(not_unique) => {
                    self.skip_not_unique(not_unique, ignore_buggy_android_id)?;
                    continue;
                }
            }

            let digest = self.hasher.md5_hex(&collected)?;
            if !digest.is_empty() {
                log::debug!("device md5 resolved from {source}");
                return Ok(self.md5.get_or_init(|| digest).clone());
            }
        }

        Err(DeviceIdError::IdentifierUnavailable)
    }

    /// Returns the Android ID alone, uncached.
    ///
    /// # Errors
    ///
    /// - [`DeviceIdError::NonUniqueIdentifier`] if it is a known buggy value.
    /// - [`DeviceIdError::IdentifierUnavailable`] if the platform has none.
    pub fn android_id(&self, ctx: &dyn DeviceContext) -> Result<String> {
        match IdentifierSource::AndroidId.resolve(ctx, &self.config) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(DeviceIdError::IdentifierUnavailable),
            Err(not_unique) => Err(DeviceIdError::NonUniqueIdentifier(not_unique.android_id)),
        }
    }

    // Caller must hold `self.lock`. If this call queries the Android ID, its
    // outcome is left in `android_outcome`.
    fn init_device_identifier(
        &self,
        ctx: &dyn DeviceContext,
        ignore_buggy_android_id: bool,
        android_outcome: &mut Option<SourceOutcome>,
    ) -> Result<String> {
        if let Some(id) = self.device_id.get() {
            return Ok(id.clone());
        }

        for source in IdentifierSource::ALL {
            let outcome = source.resolve(ctx, &self.config);
            if source == IdentifierSource::AndroidId {
                *android_outcome = Some(outcome.clone());
            }
            match outcome {
                Ok(Some(id)) => {
                    log::debug!("device identifier resolved from {source}");
                    return Ok(self.device_id.get_or_init(|| id).clone());
                }
                Ok(None) => {}
                Err(not_unique) => self.skip_not_unique(not_unique, ignore_buggy_android_id)?,
            }
        }

        Err(DeviceIdError::IdentifierUnavailable)
    }

    fn skip_not_unique(&self, not_unique: NotUnique, ignore: bool) -> Result<()> {
        if !ignore {
            return Err(DeviceIdError::NonUniqueIdentifier(not_unique.android_id));
        }
        log::warn!("skipping non-unique Android ID {}", not_unique.android_id);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // guards no data, poisoning is harmless
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static RESOLVER: OnceLock<DeviceIdentifierResolver> = OnceLock::new();

fn resolver() -> &'static DeviceIdentifierResolver {
    RESOLVER.get_or_init(DeviceIdentifierResolver::default)
}

/// [`DeviceIdentifierResolver::device_identifier`] on the process-wide resolver.
pub fn get_device_identifier(ctx: &dyn DeviceContext, ignore_buggy_android_id: bool) -> Result<String> {
    resolver().device_identifier(ctx, ignore_buggy_android_id)
}

/// [`DeviceIdentifierResolver::device_identifier_uuid`] on the process-wide resolver.
pub fn get_device_identifier_uuid(
    ctx: &dyn DeviceContext,
    ignore_buggy_android_id: bool,
) -> Result<String> {
    resolver().device_identifier_uuid(ctx, ignore_buggy_android_id)
}

/// [`DeviceIdentifierResolver::device_identifier_md5`] on the process-wide resolver.
pub fn get_device_identifier_md5(
    ctx: &dyn DeviceContext,
    ignore_buggy_android_id: bool,
) -> Result<String> {
    resolver().device_identifier_md5(ctx, ignore_buggy_android_id)
}

/// Returns the Android ID, failing on known buggy values.
pub fn get_android_id(ctx: &dyn DeviceContext) -> Result<String> {
    resolver().android_id(ctx)
}

/// Returns the pseudo ID synthesized from `build`. Never fails.
pub fn get_pseudo_device_id(build: &BuildProperties) -> String {
    build.pseudo_id()
}
