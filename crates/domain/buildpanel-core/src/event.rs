use serde::{Deserialize, Serialize};

use crate::model::{AppId, CommandId};
use crate::CommandStatus;

/// One observable step of a command invocation.
///
/// While `status` is `Running`, `output` holds only the newest chunk; consumers
/// accumulate it (see [`crate::apply`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandUpdateEvent {
    pub app_id: AppId,
    pub command_id: CommandId,
    pub status: CommandStatus,
    pub output: String,
}

impl CommandUpdateEvent {
    pub fn new(
        app_id: AppId,
        command_id: CommandId,
        status: CommandStatus,
        output: impl Into<String>,
    ) -> Self {
        Self {
            app_id,
            command_id,
            status,
            output: output.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Destination for events produced by a running command. Implementations must
/// not block: publishing happens on the process I/O path.
pub trait EventSink: Send + Sync + 'static {
    fn publish(&self, event: CommandUpdateEvent);
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn publish(&self, event: CommandUpdateEvent) {
        (**self).publish(event)
    }
}
