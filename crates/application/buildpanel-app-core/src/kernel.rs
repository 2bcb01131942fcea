use std::collections::HashSet;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, PoisonError};

use buildpanel_core::{
    derive_app_name, App, AppId, CommandId, CommandStatus, CommandUpdateEvent, Settings,
};
use camino::Utf8PathBuf;
use tracing::{debug, error, info, warn};

use crate::app_core::{AppCommand, AppStore, DomainEvent};
use crate::broadcaster::{SubscriptionId, UpdateBroadcaster};
use crate::domain::{LogLevel, LogMessage};
use crate::ports::{AppsRepo, CommandRunner, DirectoryPicker, LogSink, SettingsRepo};

enum LogJob {
    Line(String),
    Flush(std_mpsc::Sender<()>),
}

/// Wires the store, the update broadcaster and the ports together.
///
/// The kernel is driven from one thread: commands go through [`dispatch`](Self::dispatch)
/// and streamed updates are folded in by [`tick`](Self::tick).
pub struct AppKernel<A, S, L, R> {
    pub store: AppStore,
    bus: UpdateBroadcaster,
    store_subscription: SubscriptionId,
    finished: Arc<Mutex<Vec<CommandUpdateEvent>>>,
    // Started but not yet terminated. Set before the runner returns, so a
    // second request ahead of the next tick is still refused.
    in_flight: Arc<Mutex<HashSet<(AppId, CommandId)>>>,

    apps_repo: Arc<A>,
    settings_repo: Arc<S>,
    log_sink: Arc<L>,
    runner: Arc<R>,

    log_tx: Option<std_mpsc::Sender<LogJob>>,
}

impl<A, S, L, R> AppKernel<A, S, L, R>
where
    A: AppsRepo,
    S: SettingsRepo,
    L: LogSink,
    R: CommandRunner,
{
    /// `runner` must publish into `bus`, otherwise no update ever reaches the store.
    pub fn new(
        store: AppStore,
        bus: UpdateBroadcaster,
        apps_repo: A,
        settings_repo: S,
        log_sink: L,
        runner: R,
    ) -> Self {
        let finished = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let store_subscription = {
            let store = store.clone();
            let finished = finished.clone();
            let in_flight = in_flight.clone();
            bus.subscribe(move |ev| {
                if ev.is_terminal() {
                    lock(&in_flight).remove(&(ev.app_id.clone(), ev.command_id.clone()));
                }
                let applied = store.handle_event(ev.clone());
                if applied && ev.is_terminal() {
                    lock(&finished).push(ev.clone());
                }
            })
        };

        let log_sink = Arc::new(log_sink);
        let log_tx = spawn_log_writer(log_sink.clone());

        Self {
            store,
            bus,
            store_subscription,
            finished,
            in_flight,
            apps_repo: Arc::new(apps_repo),
            settings_repo: Arc::new(settings_repo),
            log_sink,
            runner: Arc::new(runner),
            log_tx,
        }
    }

    pub fn bus(&self) -> &UpdateBroadcaster {
        &self.bus
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&CommandUpdateEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // The store's own subscription is not the caller's to remove.
        if id == self.store_subscription {
            return false;
        }
        self.bus.unsubscribe(id)
    }

    pub fn dispatch(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::LoadInitialState => self.load_initial_state(),

            AppCommand::AddApp { name, path } => {
                self.add_app(&name, path);
            }

            AppCommand::DeleteApp(id) => {
                let name = self.store.app(&id).map(|a| a.name);
                if self.store.delete_app(&id) {
                    let name = name.unwrap_or_default();
                    self.log(LogLevel::Info, format!("App '{name}' removed."));
                    self.persist_apps();
                } else {
                    self.log(LogLevel::Warning, format!("Delete failed: no app with id {id}."));
                }
            }

            AppCommand::RunCommand { app_id, command_id } => self.run_command(app_id, command_id),

            AppCommand::UpdateSettings(settings) => {
                self.store
                    .apply(DomainEvent::SettingsChanged(settings.clone()));
                if let Err(e) = self.settings_repo.save(&settings) {
                    self.log(LogLevel::Error, format!("Failed to save settings: {e:#}"));
                }
                self.log(
                    LogLevel::Debug,
                    format!("Settings updated: autoSaveLog={}.", settings.auto_save_log),
                );
            }

            AppCommand::ClearLogs => self.store.apply(DomainEvent::LogsCleared),
            AppCommand::DismissError => self.store.apply(DomainEvent::ErrorDismissed),
        }
    }

    /// Deliver queued command updates, then record and persist finished runs.
    /// Returns the number of updates delivered.
    pub fn tick(&mut self) -> usize {
        let delivered = self.bus.drain();

        let finished = std::mem::take(&mut *lock(&self.finished));
        if finished.is_empty() {
            return delivered;
        }

        for ev in &finished {
            let (app_name, cmd_name) = self.names(&ev.app_id, &ev.command_id);
            match ev.status {
                CommandStatus::Success => self.log(
                    LogLevel::Info,
                    format!("'{cmd_name}' for '{app_name}' finished successfully."),
                ),
                _ => self.log(
                    LogLevel::Error,
                    format!("'{cmd_name}' for '{app_name}' failed."),
                ),
            }
        }
        self.persist_apps();
        delivered
    }

    /// Ask `picker` for a directory and register it. `name` falls back to the
    /// directory name.
    pub fn add_app_from_picker<P: DirectoryPicker>(
        &mut self,
        picker: &mut P,
        name: Option<String>,
    ) -> Option<AppId> {
        match picker.select_directory() {
            Some(path) => self.add_app(name.as_deref().unwrap_or(""), path),
            None => {
                self.log(LogLevel::Debug, "Directory selection cancelled.");
                None
            }
        }
    }

    /// Add an entry to the activity log, mirrored to `tracing` and, when
    /// enabled, to the log sink.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let msg = LogMessage::new(level, message);
        match level {
            LogLevel::Debug => debug!("{}", msg.message),
            LogLevel::Info => info!("{}", msg.message),
            LogLevel::Warning => warn!("{}", msg.message),
            LogLevel::Error => error!("{}", msg.message),
        }

        let auto_save = self.store.with_state(|s| s.settings.auto_save_log);
        if auto_save {
            self.write_log_line(msg.to_line());
        }
        self.store.apply(DomainEvent::Logged(msg));
    }

    pub fn settings(&self) -> Settings {
        self.store.with_state(|s| s.settings.clone())
    }

    fn load_initial_state(&mut self) {
        self.store.apply(DomainEvent::BootLoadingStarted);

        let apps = self.apps_repo.load().unwrap_or_else(|e| {
            self.log(LogLevel::Error, format!("Failed to load apps: {e:#}"));
            Vec::new()
        });
        let settings = self.settings_repo.load().unwrap_or_else(|e| {
            self.log(LogLevel::Error, format!("Failed to load settings: {e:#}"));
            Settings::default()
        });

        let count = apps.len();
        self.store
            .apply(DomainEvent::InitialStateLoaded { apps, settings });
        self.log(LogLevel::Debug, format!("Loaded {count} app(s)."));
    }

    fn add_app(&mut self, name: &str, path: Utf8PathBuf) -> Option<AppId> {
        let path = Utf8PathBuf::from(path.as_str().trim());
        let name = match name.trim() {
            "" => derive_app_name(&path).unwrap_or_default(),
            n => n.to_string(),
        };

        if name.is_empty() || path.as_str().is_empty() {
            let msg = "Add app failed: missing name or path.";
            self.log(LogLevel::Warning, msg);
            self.store.apply(DomainEvent::UserError(msg.into()));
            return None;
        }

        if !path.is_absolute() {
            let msg = format!("Add app failed: path must be absolute: {path}");
            self.log(LogLevel::Warning, msg.clone());
            self.store.apply(DomainEvent::UserError(msg));
            return None;
        }

        let app = App::from_template(name, path);
        let id = app.id.clone();
        let label = format!("App '{}' added at {}.", app.name, app.path);
        if let Err(e) = self.store.add_app(app) {
            self.log(LogLevel::Error, format!("Add app failed: {e}"));
            return None;
        }
        self.log(LogLevel::Info, label);
        self.persist_apps();
        Some(id)
    }

    fn run_command(&mut self, app_id: AppId, command_id: CommandId) {
        let target = self.store.app(&app_id).and_then(|app| {
            let cmd = app.command(&command_id)?.clone();
            Some((app, cmd))
        });
        let Some((app, cmd)) = target else {
            self.log(
                LogLevel::Warning,
                format!("Run ignored: no command {command_id} in app {app_id}."),
            );
            return;
        };

        let key = (app_id.clone(), command_id.clone());
        if cmd.status.is_running() || !lock(&self.in_flight).insert(key.clone()) {
            self.log(
                LogLevel::Debug,
                format!("'{}' for '{}' is already running.", cmd.name, app.name),
            );
            return;
        }

        self.log(
            LogLevel::Info,
            format!("Running '{}' for '{}'.", cmd.name, app.name),
        );
        if let Err(e) = self.runner.run(app_id, command_id, &app.path, &cmd.script) {
            lock(&self.in_flight).remove(&key);
            self.log(
                LogLevel::Error,
                format!("Could not run '{}' for '{}': {e:#}", cmd.name, app.name),
            );
        }
    }

    fn persist_apps(&self) {
        let apps = self.store.apps();
        if let Err(e) = self.apps_repo.save(&apps) {
            self.log(LogLevel::Error, format!("Failed to save apps: {e:#}"));
        }
    }

    fn names(&self, app_id: &AppId, command_id: &CommandId) -> (String, String) {
        self.store.with_state(|s| {
            let app = s.app(app_id);
            let cmd = app.and_then(|a| a.command(command_id));
            (
                app.map(|a| a.name.clone()).unwrap_or_default(),
                cmd.map(|c| c.name.clone()).unwrap_or_default(),
            )
        })
    }

    fn write_log_line(&self, line: String) {
        let line = match &self.log_tx {
            Some(tx) => match tx.send(LogJob::Line(line)) {
                Ok(()) => return,
                Err(std_mpsc::SendError(LogJob::Line(line))) => line,
                Err(_) => return,
            },
            None => line,
        };
        // Writer thread is gone; write inline rather than lose the line.
        if let Err(e) = self.log_sink.append(&line) {
            warn!("Failed to append to log file: {e:#}");
        }
    }
}

impl<A, S, L, R> AppKernel<A, S, L, R> {
    /// Block until every log line queued so far has been handed to the sink.
    pub fn flush_log(&self) {
        let Some(tx) = &self.log_tx else {
            return;
        };
        let (done_tx, done_rx) = std_mpsc::channel();
        if tx.send(LogJob::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}

impl<A, S, L, R> Drop for AppKernel<A, S, L, R> {
    fn drop(&mut self) {
        self.flush_log();
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn spawn_log_writer<L: LogSink>(sink: Arc<L>) -> Option<std_mpsc::Sender<LogJob>> {
    let (tx, rx) = std_mpsc::channel::<LogJob>();
    let spawn_res = std::thread::Builder::new()
        .name("buildpanel-log-writer".into())
        .spawn(move || {
            for job in rx {
                match job {
                    LogJob::Line(line) => {
                        if let Err(e) = sink.append(&line) {
                            warn!("Failed to append to log file: {e:#}");
                        }
                    }
                    LogJob::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

    match spawn_res {
        Ok(_) => Some(tx),
        Err(e) => {
            warn!("Failed to start log writer thread, writing inline: {e}");
            None
        }
    }
}
