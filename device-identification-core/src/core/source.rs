//! The ordered identifier sources the resolver falls back through.

use crate::{DeviceContext, ResolverConfig};
use std::fmt;

/// The Android ID matched a known non-unique value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotUnique {
    pub android_id: String,
}

/// Strategies for obtaining a device identifier, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierSource {
    /// The platform's secure Android ID.
    AndroidId,
    /// An IMEI-shaped ID synthesized from build properties. Always available.
    PseudoId,
}

impl IdentifierSource {
    /// Every source, highest priority first.
    pub const ALL: [IdentifierSource; 2] = [IdentifierSource::AndroidId, IdentifierSource::PseudoId];

    /// Queries this source.
    ///
    /// `Ok(None)` means the platform had no value for it and the next source
    /// should be tried.
    pub fn resolve(
        self,
        ctx: &dyn DeviceContext,
        config: &ResolverConfig,
    ) -> Result<Option<String>, NotUnique> {
        match self {
            Self::AndroidId => match ctx.android_id() {
                Some(id) if config.is_buggy_android_id(&id) => {
                    log::error!(
                        "The device suffers from the Android ID bug - its ID is the emulator ID : {id}"
                    );
                    Err(NotUnique { android_id: id })
                }
                other => Ok(other),
            },
            Self::PseudoId => Ok(Some(ctx.build_properties().pseudo_id())),
        }
    }
}

impl fmt::Display for IdentifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AndroidId => f.write_str("android-id"),
            Self::PseudoId => f.write_str("pseudo-id"),
        }
    }
}
