//! Command dispatcher
//!
//! Decodes one message body and invokes exactly one service operation. The
//! outcome is logged here and returned for settlement; nothing is retried and
//! no reply is sent.

use crate::commands::envelope::{decode, Action, Command, CommandEnvelope, Decoded};
use crate::service::StoreService;
use serde::Serialize;
use storekeep_core::errors::{ExError, Result};
use storekeep_core::model::{Store, StoreVersion};
use storekeep_core::StoreBackend;
use storekeep_core_types::RequestContext;

/// Value produced by a successfully executed command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CommandResult {
    StoreCreated { store_id: String },
    VersionCreated(StoreVersion),
    StoreDeleted { store_id: String },
    VersionDeleted { store_id: String, version_id: String },
    Store(Option<Store>),
    History(Vec<StoreVersion>),
    Version(Option<StoreVersion>),
}

/// What happened to one delivery
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Completed {
        action: Action,
        result: CommandResult,
    },
    /// Unknown action; nothing was executed
    Ignored { action: String },
    /// `action` is `None` when the body could not be decoded
    Failed {
        action: Option<Action>,
        error: ExError,
    },
}

impl DispatchOutcome {
    pub fn error(&self) -> Option<&ExError> {
        match self {
            DispatchOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(ExError::from)
}

/// Routes decoded commands to the version lifecycle manager
pub struct Dispatcher<B: StoreBackend> {
    service: StoreService<B>,
}

impl<B: StoreBackend> Dispatcher<B> {
    pub fn new(service: StoreService<B>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &StoreService<B> {
        &self.service
    }

    /// Decode `body` and run the command it names
    pub fn dispatch(&self, body: &[u8], ctx: &RequestContext) -> DispatchOutcome {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %ctx.request_id,
            delivery_tag = ctx.delivery_tag,
        );
        let _guard = span.enter();

        let envelope = match decode(body) {
            Ok(Decoded::Command(envelope)) => envelope,
            Ok(Decoded::UnknownAction(action)) => {
                tracing::warn!(
                    action = %action,
                    request_id = %ctx.request_id,
                    "Unknown action"
                );
                return DispatchOutcome::Ignored { action };
            }
            Err(err) => {
                let error = err.with_request_id(ctx.request_id.clone());
                tracing::error!(
                    err_kind = ?error.kind(),
                    err_code = error.code(),
                    request_id = %ctx.request_id,
                    error = %error,
                    "Failed to decode message"
                );
                return DispatchOutcome::Failed {
                    action: None,
                    error,
                };
            }
        };

        let action = envelope.command.action();
        match self.execute(envelope) {
            Ok(result) => {
                match render(&result) {
                    Ok(rendered) => tracing::info!(
                        action = action.as_str(),
                        request_id = %ctx.request_id,
                        result = %rendered,
                        "Command completed"
                    ),
                    Err(err) => tracing::warn!(
                        action = action.as_str(),
                        request_id = %ctx.request_id,
                        err_code = err.code(),
                        error = %err,
                        "Command completed but its result could not be rendered"
                    ),
                }
                DispatchOutcome::Completed { action, result }
            }
            Err(err) => {
                let error = err.with_request_id(ctx.request_id.clone());
                tracing::error!(
                    action = action.as_str(),
                    err_kind = ?error.kind(),
                    err_code = error.code(),
                    request_id = %ctx.request_id,
                    error = %error,
                    "Command failed"
                );
                DispatchOutcome::Failed {
                    action: Some(action),
                    error,
                }
            }
        }
    }

    fn execute(&self, envelope: CommandEnvelope) -> Result<CommandResult> {
        let CommandEnvelope {
            command,
            user_login,
        } = envelope;
        let login = user_login.as_str();

        match command {
            Command::CreateStore { fields } => self
                .service
                .create_store(fields, login)
                .map(|store_id| CommandResult::StoreCreated { store_id }),
            Command::CreateStoreVersion { store_id, fields } => self
                .service
                .create_store_version(fields, &store_id, login)
                .map(CommandResult::VersionCreated),
            Command::DeleteStore { store_id } => self
                .service
                .delete_store(&store_id, login)
                .map(|()| CommandResult::StoreDeleted { store_id }),
            Command::DeleteStoreVersion {
                store_id,
                version_id,
            } => self
                .service
                .delete_store_version(&store_id, &version_id, login)
                .map(|()| CommandResult::VersionDeleted {
                    store_id,
                    version_id,
                }),
            Command::GetStore { store_id } => self
                .service
                .get_store(&store_id, login)
                .map(CommandResult::Store),
            Command::GetStoreHistory { store_id } => self
                .service
                .get_store_history(&store_id, login)
                .map(CommandResult::History),
            Command::GetStoreVersion {
                store_id,
                version_id,
            } => self
                .service
                .get_store_version(&store_id, &version_id, login)
                .map(CommandResult::Version),
        }
    }
}
