use buildpanel_core::{App, AppId, CommandUpdateEvent, Settings};

use crate::domain::LogMessage;

#[derive(Debug, Clone)]
pub enum DomainEvent {
    // Boot state
    BootLoadingStarted,
    InitialStateLoaded { apps: Vec<App>, settings: Settings },

    // App registry
    AppAdded(App),
    AppDeleted(AppId),

    // Streamed from running commands
    CommandUpdated(CommandUpdateEvent),

    // Settings / activity log
    SettingsChanged(Settings),
    Logged(LogMessage),
    LogsCleared,

    // User-visible errors
    UserError(String),
    ErrorDismissed,
}
