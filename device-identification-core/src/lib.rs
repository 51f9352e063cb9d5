//! Best-effort unique device identifiers for Android hosts.
//!
//! The primary entry point is [`DeviceIdentifierResolver`], which walks the
//! ordered [`IdentifierSource`] list against a [`DeviceContext`] and caches the
//! first usable identifier. The free functions [`get_device_identifier`],
//! [`get_device_identifier_uuid`] and [`get_device_identifier_md5`] use a
//! process-wide resolver.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    config::{ResolverConfig, StoreOptions, BUGGY_ANDROID_ID, DEFAULT_NAMESPACE},
    context::{BuildProperties, DeviceContext, StaticContext, UNKNOWN},
    device::{
        get_android_id, get_device_identifier, get_device_identifier_md5,
        get_device_identifier_uuid, get_pseudo_device_id, DeviceIdentifierResolver,
    },
    error::{DeviceIdError, HashError, Result},
    hash::{HashProvider, Md5Hasher},
    source::{IdentifierSource, NotUnique},
    store::{KeyValueStore, PreferenceStore},
};
