use storekeep_core::errors::{DomainError, ExError, ExErrorKind};
use storekeep_core_types::RequestId;

#[test]
fn test_store_not_found_verifiable_by_kind() {
    let ex_err: ExError = DomainError::StoreNotFound {
        store_id: "unknown".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.store_id(), Some("unknown"));
    assert_eq!(ex_err.version_id(), None);
}

#[test]
fn test_no_current_version_is_not_found() {
    let ex_err: ExError = DomainError::NoCurrentVersion {
        store_id: "s1".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert!(ex_err.message().contains("no current version"));
}

#[test]
fn test_version_not_found_carries_both_ids() {
    let ex_err: ExError = DomainError::VersionNotFound {
        store_id: "s1".to_string(),
        version_id: "v9".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.store_id(), Some("s1"));
    assert_eq!(ex_err.version_id(), Some("v9"));
}

#[test]
fn test_current_version_deletion_is_invalid_operation() {
    let ex_err: ExError = DomainError::CurrentVersionDeletion {
        store_id: "s1".to_string(),
        version_id: "v1".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidOperation);
    assert_eq!(ex_err.code(), "ERR_INVALID_OPERATION");
    assert!(!ex_err.is_retryable());
}

#[test]
fn test_request_id_attached() {
    let request_id = RequestId::from_string("req-42".to_string());
    let ex_err = ExError::new(ExErrorKind::Decode)
        .with_op("decode_envelope")
        .with_request_id(request_id.clone());

    assert_eq!(ex_err.request_id(), Some(&request_id));
    assert_eq!(ex_err.op(), Some("decode_envelope"));
}

#[test]
fn test_serde_json_error_maps_to_serialization() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let ex_err: ExError = parse_err.into();
    assert_eq!(ex_err.kind(), ExErrorKind::Serialization);
}
