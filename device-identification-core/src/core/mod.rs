//! Internal domain modules for the device identification library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod hash;
pub mod source;
pub mod store;

#[doc(inline)]
pub use config::{ResolverConfig, StoreOptions};
#[doc(inline)]
pub use context::{BuildProperties, DeviceContext, StaticContext};
#[doc(inline)]
pub use device::DeviceIdentifierResolver;
#[doc(inline)]
pub use error::{DeviceIdError, Result};
#[doc(inline)]
pub use hash::{HashProvider, Md5Hasher};
#[doc(inline)]
pub use source::IdentifierSource;
#[doc(inline)]
pub use store::{KeyValueStore, PreferenceStore};
