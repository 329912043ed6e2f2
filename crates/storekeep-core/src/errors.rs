use storekeep_core_types::RequestId;
use thiserror::Error;

/// Result type alias using the canonical error facility
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log lines and by the
/// consumer to decide how a failed delivery is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Message/input
    Decode,
    InvalidInput,

    // Domain
    NotFound,
    InvalidOperation,

    // Storage
    Conflict,
    Persistence,

    // Process plumbing
    Config,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Decode => "ERR_DECODE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidOperation => "ERR_INVALID_OPERATION",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a later attempt of the same command may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExErrorKind::Conflict)
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus the
/// operation and entity context needed to make a log line actionable.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    store_id: Option<String>,
    version_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            store_id: None,
            version_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add store ID context
    pub fn with_store_id(mut self, id: impl Into<String>) -> Self {
        self.store_id = Some(id.into());
        self
    }

    /// Add version ID context
    pub fn with_version_id(mut self, id: impl Into<String>) -> Self {
        self.version_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for `kind().is_retryable()`
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(store_id) = &self.store_id {
            write!(f, " (store_id: {})", store_id)?;
        }
        if let Some(version_id) = &self.version_id {
            write!(f, " (version_id: {})", version_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Typed domain failures raised by validation and the version lifecycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Store was not found
    #[error("Store not found: {store_id}")]
    StoreNotFound { store_id: String },

    /// Store exists (or existed) but has no version marked current
    #[error("Store {store_id} has no current version")]
    NoCurrentVersion { store_id: String },

    /// Version not found, or it belongs to a different store
    #[error("Version {version_id} not found for store {store_id}")]
    VersionNotFound {
        store_id: String,
        version_id: String,
    },

    /// The current version cannot be deleted on its own
    #[error("Version {version_id} is the current version of store {store_id} and cannot be deleted")]
    CurrentVersionDeletion {
        store_id: String,
        version_id: String,
    },

    /// Required field present but blank
    #[error("Field {field} must not be blank")]
    BlankField { field: &'static str },
}

impl From<DomainError> for ExError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::StoreNotFound { store_id } | DomainError::NoCurrentVersion { store_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_store_id(store_id)
                    .with_message(message)
            }
            DomainError::VersionNotFound {
                store_id,
                version_id,
            } => ExError::new(ExErrorKind::NotFound)
                .with_store_id(store_id)
                .with_version_id(version_id)
                .with_message(message),
            DomainError::CurrentVersionDeletion {
                store_id,
                version_id,
            } => ExError::new(ExErrorKind::InvalidOperation)
                .with_store_id(store_id)
                .with_version_id(version_id)
                .with_message(message),
            DomainError::BlankField { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
