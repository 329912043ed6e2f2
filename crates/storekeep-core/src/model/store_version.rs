use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::rules::validation::require_non_blank;

/// An immutable snapshot of a store's mutable attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreVersion {
    /// Opaque identifier assigned on insert
    pub id: String,
    pub store_id: String,
    /// 1 for the founding version, then +1 per append
    pub version_number: u32,
    pub creator_login: String,
    pub owner_name: String,
    pub opening_time: String,
    pub closing_time: String,
    pub created_at: DateTime<Utc>,
    pub is_current: bool,
}

/// Attributes supplied by a `create_store_version` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFields {
    pub owner_name: String,
    pub opening_time: String,
    pub closing_time: String,
}

impl VersionFields {
    /// Reject blank required fields
    pub fn validate(&self) -> Result<()> {
        require_non_blank("owner_name", &self.owner_name)?;
        require_non_blank("opening_time", &self.opening_time)?;
        require_non_blank("closing_time", &self.closing_time)?;
        Ok(())
    }
}

/// A version ready to be appended to a store's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoreVersion {
    pub fields: VersionFields,
    pub creator_login: String,
    pub created_at: DateTime<Utc>,
}

impl NewStoreVersion {
    pub fn new(
        fields: VersionFields,
        creator_login: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fields,
            creator_login: creator_login.into(),
            created_at,
        }
    }
}

/// Check the shape of a version history as returned by the backend:
/// newest first, numbers strictly decreasing, exactly one current.
///
/// Returns `false` for an empty history.
pub fn is_well_formed_history(history: &[StoreVersion]) -> bool {
    if history.is_empty() {
        return false;
    }
    let strictly_decreasing = history
        .windows(2)
        .all(|pair| pair[0].version_number > pair[1].version_number);
    let current = history.iter().filter(|v| v.is_current).count();
    strictly_decreasing && current == 1
}
