//! Entry points for the host command layer.

use crate::engine::SyncEngine;
use crate::source::RecordSource;
use crate::subscription::SubscriptionController;
use crate::timestamp::SubscriptionStatus;
use bimsync_document::Document;
use std::fmt;
use std::sync::Arc;

/// Outcome of a host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command did what was asked.
    Succeeded,
    /// The command failed; the message says why.
    Failed,
}

/// Result surfaced to the host: a status and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub status: CommandStatus,
    /// Message for the user.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Succeeded,
            message: message.into(),
        }
    }

    /// Creates a failed result.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Failed,
            message: message.into(),
        }
    }

    /// Returns true if the command succeeded.
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Succeeded
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Imports records modified at or after `since` in one shot.
///
/// Used for explicit imports; `since == 0` applies the full history
/// whatever the subscription state. Errors are returned to the caller
/// directly as the result message.
pub fn run_manual_import<S: RecordSource, D: Document>(
    engine: &SyncEngine<S>,
    document: &D,
    since: u64,
) -> CommandResult {
    let project_id = document.project_identifier();

    match engine.synchronize(document, &project_id, since) {
        Ok(result) => CommandResult::succeeded(format!(
            "Imported {} record(s) in {} ms; sync timestamp is {}",
            result.applied,
            result.duration.as_millis(),
            result.timestamp
        )),
        Err(e) => {
            tracing::error!(error = %e, project_id = %project_id, since, "manual import failed");
            CommandResult::failed(e.to_string())
        }
    }
}

/// Attaches or detaches the periodic subscription for a document.
pub fn toggle_subscription<S: RecordSource + 'static, D: Document + 'static>(
    controller: &SubscriptionController<S>,
    document: Arc<D>,
) -> CommandResult {
    match controller.toggle_subscription(document) {
        SubscriptionStatus::Subscribed => CommandResult::succeeded(format!(
            "Subscribed; checking for updates every {} ms after timestamp {}",
            controller.engine().config().sync_interval.as_millis(),
            controller.engine().timestamps().get()
        )),
        SubscriptionStatus::Unsubscribed => CommandResult::succeeded("Unsubscribed"),
    }
}
