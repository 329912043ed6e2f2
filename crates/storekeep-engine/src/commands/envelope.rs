//! Command envelope decoding
//!
//! Turns an inbound message body into a typed `Command`. Decoding touches no
//! storage: every rejection here is an `ERR_DECODE` with no side effect.

use serde::Deserialize;
use storekeep_core::errors::{ExError, ExErrorKind, Result};
use storekeep_core::model::{StoreFields, VersionFields};

/// Wire shape of a command message
///
/// Omitted string fields decode as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Envelope {
    pub action: String,
    pub data: Option<serde_json::Value>,
    pub store_id: String,
    pub user_login: String,
    pub version_id: String,
}

/// `data` payload of `create_store`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorePayload {
    name: String,
    address: String,
    owner_name: String,
    opening_time: String,
    closing_time: String,
}

impl From<StorePayload> for StoreFields {
    fn from(p: StorePayload) -> Self {
        StoreFields {
            name: p.name,
            address: p.address,
            owner_name: p.owner_name,
            opening_time: p.opening_time,
            closing_time: p.closing_time,
        }
    }
}

/// `data` payload of `create_store_version`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionPayload {
    store_owner_name: String,
    opening_time: String,
    closing_time: String,
}

impl From<VersionPayload> for VersionFields {
    fn from(p: VersionPayload) -> Self {
        VersionFields {
            owner_name: p.store_owner_name,
            opening_time: p.opening_time,
            closing_time: p.closing_time,
        }
    }
}

/// The closed set of supported actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateStore,
    CreateStoreVersion,
    DeleteStore,
    DeleteStoreVersion,
    GetStore,
    GetStoreHistory,
    GetStoreVersion,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::CreateStore,
        Action::CreateStoreVersion,
        Action::DeleteStore,
        Action::DeleteStoreVersion,
        Action::GetStore,
        Action::GetStoreHistory,
        Action::GetStoreVersion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateStore => "create_store",
            Action::CreateStoreVersion => "create_store_version",
            Action::DeleteStore => "delete_store",
            Action::DeleteStoreVersion => "delete_store_version",
            Action::GetStore => "get_store",
            Action::GetStoreHistory => "get_store_history",
            Action::GetStoreVersion => "get_store_version",
        }
    }

    /// Exact, case-sensitive match on the wire name
    pub fn parse(name: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded command with everything its operation needs
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateStore {
        fields: StoreFields,
    },
    CreateStoreVersion {
        store_id: String,
        fields: VersionFields,
    },
    DeleteStore {
        store_id: String,
    },
    DeleteStoreVersion {
        store_id: String,
        version_id: String,
    },
    GetStore {
        store_id: String,
    },
    GetStoreHistory {
        store_id: String,
    },
    GetStoreVersion {
        store_id: String,
        version_id: String,
    },
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Command::CreateStore { .. } => Action::CreateStore,
            Command::CreateStoreVersion { .. } => Action::CreateStoreVersion,
            Command::DeleteStore { .. } => Action::DeleteStore,
            Command::DeleteStoreVersion { .. } => Action::DeleteStoreVersion,
            Command::GetStore { .. } => Action::GetStore,
            Command::GetStoreHistory { .. } => Action::GetStoreHistory,
            Command::GetStoreVersion { .. } => Action::GetStoreVersion,
        }
    }
}

/// A command plus the requester it was sent by
#[derive(Debug, Clone, PartialEq)]
pub struct CommandEnvelope {
    pub command: Command,
    pub user_login: String,
}

/// Result of decoding a message body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Command(CommandEnvelope),
    /// Well-formed envelope naming an action outside the supported set
    UnknownAction(String),
}

fn decode_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Decode)
        .with_op("decode")
        .with_message(message)
}

fn require_id(field: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(decode_error(format!("{} is required", field)));
    }
    Ok(value)
}

fn payload<T: serde::de::DeserializeOwned>(data: Option<serde_json::Value>) -> Result<T> {
    let data = data.ok_or_else(|| decode_error("data is required"))?;
    serde_json::from_value(data).map_err(|e| decode_error(format!("invalid data: {}", e)))
}

/// Decode a message body into a command
///
/// # Errors
///
/// `Decode` when the body is not a JSON envelope, a create payload is missing
/// or malformed, or a required id is empty.
pub fn decode(body: &[u8]) -> Result<Decoded> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| decode_error(format!("malformed envelope: {}", e)))?;

    let Some(action) = Action::parse(&envelope.action) else {
        return Ok(Decoded::UnknownAction(envelope.action));
    };

    let Envelope {
        data,
        store_id,
        user_login,
        version_id,
        ..
    } = envelope;

    let command = match action {
        Action::CreateStore => Command::CreateStore {
            fields: payload::<StorePayload>(data)?.into(),
        },
        Action::CreateStoreVersion => Command::CreateStoreVersion {
            store_id: require_id("storeId", store_id)?,
            fields: payload::<VersionPayload>(data)?.into(),
        },
        Action::DeleteStore => Command::DeleteStore {
            store_id: require_id("storeId", store_id)?,
        },
        Action::DeleteStoreVersion => Command::DeleteStoreVersion {
            store_id: require_id("storeId", store_id)?,
            version_id: require_id("versionId", version_id)?,
        },
        Action::GetStore => Command::GetStore {
            store_id: require_id("storeId", store_id)?,
        },
        Action::GetStoreHistory => Command::GetStoreHistory {
            store_id: require_id("storeId", store_id)?,
        },
        Action::GetStoreVersion => Command::GetStoreVersion {
            store_id: require_id("storeId", store_id)?,
            version_id: require_id("versionId", version_id)?,
        },
    };

    Ok(Decoded::Command(CommandEnvelope {
        command,
        user_login,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("CREATE_STORE"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn test_create_store_payload_maps_wire_names() {
        let body = br#"{
            "action": "create_store",
            "userLogin": "jo",
            "data": {"name": "Acme", "address": "1 Main St", "ownerName": "Jo",
                     "openingTime": "08:00", "closingTime": "20:00"}
        }"#;

        let Decoded::Command(envelope) = decode(body).unwrap() else {
            panic!("expected a command");
        };
        assert_eq!(envelope.user_login, "jo");
        match envelope.command {
            Command::CreateStore { fields } => {
                assert_eq!(fields.name, "Acme");
                assert_eq!(fields.owner_name, "Jo");
                assert_eq!(fields.closing_time, "20:00");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_version_payload_uses_store_owner_name() {
        let body = br#"{"action": "create_store_version", "storeId": "s1",
            "data": {"storeOwnerName": "Al", "openingTime": "09:00", "closingTime": "21:00"}}"#;

        let Decoded::Command(envelope) = decode(body).unwrap() else {
            panic!("expected a command");
        };
        assert_eq!(
            envelope.command,
            Command::CreateStoreVersion {
                store_id: "s1".to_string(),
                fields: VersionFields {
                    owner_name: "Al".to_string(),
                    opening_time: "09:00".to_string(),
                    closing_time: "21:00".to_string(),
                },
            }
        );
        assert_eq!(envelope.user_login, "");
    }

    #[test]
    fn test_missing_data_is_decode_error() {
        let err = decode(br#"{"action": "create_store"}"#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Decode);
    }

    #[test]
    fn test_incomplete_payload_is_decode_error() {
        let body = br#"{"action": "create_store_version", "storeId": "s1",
            "data": {"ownerName": "Al", "openingTime": "09:00", "closingTime": "21:00"}}"#;
        let err = decode(body).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Decode);
    }

    #[test]
    fn test_empty_ids_are_decode_errors() {
        let err = decode(br#"{"action": "get_store", "storeId": "  "}"#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Decode);
        assert!(err.message().contains("storeId"));

        let err =
            decode(br#"{"action": "delete_store_version", "storeId": "s1"}"#).unwrap_err();
        assert!(err.message().contains("versionId"));
    }

    #[test]
    fn test_unknown_action_is_reported_not_failed() {
        let decoded = decode(br#"{"action": "rename_store", "storeId": "s1"}"#).unwrap();
        assert_eq!(decoded, Decoded::UnknownAction("rename_store".to_string()));

        let decoded = decode(b"{}").unwrap();
        assert_eq!(decoded, Decoded::UnknownAction(String::new()));
    }

    proptest! {
        #[test]
        fn prop_non_json_bodies_never_panic(body in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode(&body);
        }

        #[test]
        fn prop_malformed_json_is_decode_error(text in "[a-z ]{1,20}") {
            let err = decode(text.as_bytes()).unwrap_err();
            prop_assert_eq!(err.kind(), ExErrorKind::Decode);
        }
    }
}
