use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use buildpanel_core::{App, AppId, Command, CommandId, CommandUpdateEvent};

use crate::domain::AppState;

use super::{events::DomainEvent, reducer::reduce};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("an app with id '{0}' already exists")]
    DuplicateApp(AppId),
}

/// Shared owner of [`AppState`]. Every mutation goes through [`reduce`] under
/// one lock, so concurrent writers never interleave a read-modify-write.
#[derive(Clone, Default)]
pub struct AppStore {
    inner: Arc<Mutex<AppState>>,
}

impl AppStore {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AppState {
        self.lock().clone()
    }

    /// Read without cloning the whole tree.
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.lock())
    }

    pub fn apply(&self, ev: DomainEvent) {
        let mut guard = self.lock();
        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, ev);
    }

    pub fn apps(&self) -> Vec<App> {
        self.lock().apps.clone()
    }

    pub fn app(&self, id: &AppId) -> Option<App> {
        self.lock().app(id).cloned()
    }

    pub fn find_app(&self, key: &str) -> Option<App> {
        self.lock().find_app(key).cloned()
    }

    pub fn command(&self, app_id: &AppId, command_id: &CommandId) -> Option<Command> {
        self.lock()
            .app(app_id)
            .and_then(|a| a.command(command_id))
            .cloned()
    }

    pub fn add_app(&self, app: App) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if guard.app(&app.id).is_some() {
            return Err(StoreError::DuplicateApp(app.id));
        }
        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, DomainEvent::AppAdded(app));
        Ok(())
    }

    /// Runs still in flight for the app keep going; their later events are
    /// dropped by [`AppStore::handle_event`].
    pub fn delete_app(&self, id: &AppId) -> bool {
        let mut guard = self.lock();
        if guard.app(id).is_none() {
            return false;
        }
        let current = std::mem::take(&mut *guard);
        *guard = reduce(current, DomainEvent::AppDeleted(id.clone()));
        true
    }

    /// Apply a streamed update. Returns whether a command was found for it.
    pub fn handle_event(&self, ev: CommandUpdateEvent) -> bool {
        let mut guard = self.lock();
        let known = guard
            .app(&ev.app_id)
            .is_some_and(|a| a.command(&ev.command_id).is_some());
        if known {
            let current = std::mem::take(&mut *guard);
            *guard = reduce(current, DomainEvent::CommandUpdated(ev));
        }
        known
    }
}
