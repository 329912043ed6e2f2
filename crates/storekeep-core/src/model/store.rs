use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::store_version::VersionFields;
use crate::rules::validation::require_non_blank;

/// A catalogued store (the versioned entity)
///
/// Only the founding attributes live on the store row. The present owner and
/// opening hours are read from the version marked current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Opaque identifier assigned by the storage backend
    pub id: String,
    pub name: String,
    pub address: String,
    /// Login of the requester that created the store
    pub creator_login: String,
    pub owner_name: String,
    pub opening_time: String,
    pub closing_time: String,
    pub created_at: DateTime<Utc>,
}

/// Founding attributes supplied by a `create_store` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFields {
    pub name: String,
    pub address: String,
    pub owner_name: String,
    pub opening_time: String,
    pub closing_time: String,
}

impl StoreFields {
    /// Reject blank required fields
    pub fn validate(&self) -> Result<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("address", &self.address)?;
        require_non_blank("owner_name", &self.owner_name)?;
        require_non_blank("opening_time", &self.opening_time)?;
        require_non_blank("closing_time", &self.closing_time)?;
        Ok(())
    }

    /// The attributes that seed version 1
    pub fn version_fields(&self) -> VersionFields {
        VersionFields {
            owner_name: self.owner_name.clone(),
            opening_time: self.opening_time.clone(),
            closing_time: self.closing_time.clone(),
        }
    }
}

/// A store ready to be persisted together with its first version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStore {
    pub fields: StoreFields,
    pub creator_login: String,
    pub created_at: DateTime<Utc>,
}

impl NewStore {
    pub fn new(fields: StoreFields, creator_login: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            fields,
            creator_login: creator_login.into(),
            created_at,
        }
    }
}
