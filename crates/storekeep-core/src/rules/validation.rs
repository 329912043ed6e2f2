//! Field validation shared by the command payloads

use crate::errors::{DomainError, Result};

/// Fail with `InvalidInput` when a required string is empty or whitespace
pub fn require_non_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::BlankField { field }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_empty_is_rejected() {
        let err = require_non_blank("name", "").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    }

    proptest! {
        #[test]
        fn prop_whitespace_only_is_rejected(ws in "[ \t\r\n]{0,16}") {
            prop_assert!(require_non_blank("name", &ws).is_err());
        }

        #[test]
        fn prop_any_visible_char_is_accepted(prefix in "[ ]{0,4}", body in "[a-zA-Z0-9:]{1,16}") {
            let value = format!("{}{}", prefix, body);
            prop_assert!(require_non_blank("name", &value).is_ok());
        }
    }
}
