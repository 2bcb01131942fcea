use buildpanel_core::{apply_in_place, CommandStatus, CommandUpdateEvent};

use crate::domain::{AppState, BootState};

use super::events::DomainEvent;

pub fn reduce(mut state: AppState, ev: DomainEvent) -> AppState {
    match ev {
        DomainEvent::BootLoadingStarted => {
            state.boot = BootState::Loading;
        }

        DomainEvent::InitialStateLoaded { mut apps, settings } => {
            // Nothing can still be attached to a command persisted mid-run.
            for cmd in apps.iter_mut().flat_map(|a| a.commands.iter_mut()) {
                if cmd.status == CommandStatus::Running {
                    cmd.status = CommandStatus::Idle;
                }
            }
            state.apps = apps;
            state.settings = settings;
            state.boot = BootState::Ready;
        }

        DomainEvent::AppAdded(app) => {
            if !state.apps.iter().any(|a| a.id == app.id) {
                state.apps.push(app);
            }
        }

        DomainEvent::AppDeleted(id) => state.apps.retain(|a| a.id != id),

        DomainEvent::CommandUpdated(ev) => apply_command_update(&mut state, &ev),

        DomainEvent::SettingsChanged(settings) => state.settings = settings,

        DomainEvent::Logged(msg) => state.logs.push(msg),
        DomainEvent::LogsCleared => state.logs.clear(),

        DomainEvent::UserError(msg) => state.error = Some(msg),
        DomainEvent::ErrorDismissed => state.error = None,
    }
    state
}

/// Updates for an app or command that no longer exists are dropped.
fn apply_command_update(state: &mut AppState, ev: &CommandUpdateEvent) {
    let target = state
        .apps
        .iter_mut()
        .find(|a| a.id == ev.app_id)
        .and_then(|a| a.command_mut(&ev.command_id));

    if let Some(cmd) = target {
        apply_in_place(cmd, ev);
    }
}
