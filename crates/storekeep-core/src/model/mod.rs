//! Domain model for the versioned store catalog

pub mod store;
pub mod store_version;

pub use store::{NewStore, Store, StoreFields};
pub use store_version::{is_well_formed_history, NewStoreVersion, StoreVersion, VersionFields};
