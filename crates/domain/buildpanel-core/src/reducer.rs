use crate::event::CommandUpdateEvent;
use crate::model::Command;
use crate::CommandStatus;

/// Apply one update to a command.
///
/// A `Running` event arriving while the command is not running starts a fresh
/// run and replaces the output. Everything else appends, terminal events
/// included, even when the same terminal event is delivered twice.
pub fn apply(mut command: Command, ev: &CommandUpdateEvent) -> Command {
    apply_in_place(&mut command, ev);
    command
}

/// [`apply`] without moving the command, for callers holding it in a collection.
pub fn apply_in_place(command: &mut Command, ev: &CommandUpdateEvent) {
    let starting = ev.status == CommandStatus::Running && command.status != CommandStatus::Running;
    if starting {
        command.output.clear();
    }
    command.output.push_str(&ev.output);
    command.status = ev.status;
}
