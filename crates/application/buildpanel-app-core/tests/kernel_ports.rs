use std::sync::{Arc, Mutex};

use buildpanel_app_core::app_core::{AppCommand, AppStore};
use buildpanel_app_core::kernel::AppKernel;
use buildpanel_app_core::ports::{AppsRepo, CommandRunner, DirectoryPicker, LogSink, SettingsRepo};
use buildpanel_app_core::{LogLevel, UpdateBroadcaster};
use buildpanel_core::{
    App, AppId, CommandId, CommandStatus, CommandUpdateEvent, Settings,
};
use camino::{Utf8Path, Utf8PathBuf};

#[derive(Clone, Default)]
struct MemoryApps {
    stored: Arc<Mutex<Vec<App>>>,
    saves: Arc<Mutex<usize>>,
    fail_load: bool,
}
impl AppsRepo for MemoryApps {
    fn load(&self) -> anyhow::Result<Vec<App>> {
        if self.fail_load {
            anyhow::bail!("apps.json is corrupt");
        }
        Ok(self.stored.lock().unwrap().clone())
    }
    fn save(&self, apps: &[App]) -> anyhow::Result<()> {
        *self.stored.lock().unwrap() = apps.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemorySettings {
    stored: Arc<Mutex<Settings>>,
}
impl SettingsRepo for MemorySettings {
    fn load(&self) -> anyhow::Result<Settings> {
        Ok(self.stored.lock().unwrap().clone())
    }
    fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        *self.stored.lock().unwrap() = settings.clone();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
}
impl LogSink for MemoryLog {
    fn append(&self, line: &str) -> anyhow::Result<()> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

type RunCall = (AppId, CommandId, Utf8PathBuf, String);

#[derive(Clone, Default)]
struct RecordingRunner {
    calls: Arc<Mutex<Vec<RunCall>>>,
}
impl CommandRunner for RecordingRunner {
    fn run(
        &self,
        app_id: AppId,
        command_id: CommandId,
        cwd: &Utf8Path,
        script: &str,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((
            app_id,
            command_id,
            cwd.to_owned(),
            script.to_string(),
        ));
        Ok(())
    }
}

struct ScriptedPicker(Option<Utf8PathBuf>);
impl DirectoryPicker for ScriptedPicker {
    fn select_directory(&mut self) -> Option<Utf8PathBuf> {
        self.0.take()
    }
}

struct Harness {
    kernel: AppKernel<MemoryApps, MemorySettings, MemoryLog, RecordingRunner>,
    apps: MemoryApps,
    settings: MemorySettings,
    log: MemoryLog,
    runner: RecordingRunner,
}

fn harness_with(apps: MemoryApps) -> Harness {
    let settings = MemorySettings::default();
    let log = MemoryLog::default();
    let runner = RecordingRunner::default();
    let mut kernel = AppKernel::new(
        AppStore::default(),
        UpdateBroadcaster::new(),
        apps.clone(),
        settings.clone(),
        log.clone(),
        runner.clone(),
    );
    kernel.dispatch(AppCommand::LoadInitialState);
    Harness {
        kernel,
        apps,
        settings,
        log,
        runner,
    }
}

fn harness() -> Harness {
    harness_with(MemoryApps::default())
}

fn add_site(h: &mut Harness) -> App {
    h.kernel.dispatch(AppCommand::AddApp {
        name: "site".into(),
        path: "/srv/site".into(),
    });
    h.kernel.store.apps().pop().unwrap()
}

#[test]
fn add_app_persists_template_commands() {
    let mut h = harness();
    let app = add_site(&mut h);

    let names: Vec<_> = app.commands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Git Pull", "NPM Install", "NPM Build", "NPM Test"]);
    assert_eq!(*h.apps.stored.lock().unwrap(), vec![app]);
}

#[test]
fn run_hands_path_and_script_to_the_runner() {
    let mut h = harness();
    let app = add_site(&mut h);
    let build = app.commands[2].clone();

    h.kernel.dispatch(AppCommand::RunCommand {
        app_id: app.id.clone(),
        command_id: build.id.clone(),
    });

    let calls = h.runner.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            app.id.clone(),
            build.id.clone(),
            Utf8PathBuf::from("/srv/site"),
            "npm run build".to_string()
        )]
    );
}

#[test]
fn rerun_while_running_is_ignored() {
    let mut h = harness();
    let app = add_site(&mut h);
    let cmd = app.commands[0].clone();
    let run = AppCommand::RunCommand {
        app_id: app.id.clone(),
        command_id: cmd.id.clone(),
    };

    h.kernel.dispatch(run.clone());
    h.kernel.bus().publish(CommandUpdateEvent::new(
        app.id.clone(),
        cmd.id.clone(),
        CommandStatus::Running,
        "> git pull\n",
    ));
    h.kernel.tick();
    h.kernel.dispatch(run.clone());
    assert_eq!(h.runner.calls.lock().unwrap().len(), 1);

    h.kernel.bus().publish(CommandUpdateEvent::new(
        app.id.clone(),
        cmd.id.clone(),
        CommandStatus::Success,
        "\nProcess finished with exit code 0.\n",
    ));
    h.kernel.tick();
    h.kernel.dispatch(run);
    assert_eq!(h.runner.calls.lock().unwrap().len(), 2);
}

#[test]
fn second_run_before_any_tick_is_ignored() {
    let mut h = harness();
    let app = add_site(&mut h);
    let cmd = app.commands[3].clone();
    let run = AppCommand::RunCommand {
        app_id: app.id.clone(),
        command_id: cmd.id.clone(),
    };

    h.kernel.dispatch(run.clone());
    h.kernel.dispatch(run.clone());
    assert_eq!(h.runner.calls.lock().unwrap().len(), 1);

    h.kernel.bus().publish(CommandUpdateEvent::new(
        app.id.clone(),
        cmd.id.clone(),
        CommandStatus::Error,
        "\nProcess finished with exit code 1.\n",
    ));
    h.kernel.tick();
    h.kernel.dispatch(run);
    assert_eq!(h.runner.calls.lock().unwrap().len(), 2);
}

struct RefusingRunner;
impl CommandRunner for RefusingRunner {
    fn run(&self, _: AppId, _: CommandId, _: &Utf8Path, _: &str) -> anyhow::Result<()> {
        anyhow::bail!("Script is empty")
    }
}

#[test]
fn rejected_run_does_not_block_the_next_attempt() {
    let store = AppStore::default();
    let app = App::from_template("site", "/srv/site");
    store.add_app(app.clone()).unwrap();
    let mut kernel = AppKernel::new(
        store,
        UpdateBroadcaster::new(),
        MemoryApps::default(),
        MemorySettings::default(),
        MemoryLog::default(),
        RefusingRunner,
    );

    for _ in 0..2 {
        kernel.dispatch(AppCommand::RunCommand {
            app_id: app.id.clone(),
            command_id: app.commands[0].id.clone(),
        });
        let last = kernel.store.state().logs.pop().unwrap();
        assert_eq!(last.level, LogLevel::Error);
        assert!(last.message.ends_with("Script is empty"));
    }
}

#[test]
fn run_for_unknown_target_warns_and_does_not_spawn() {
    let mut h = harness();
    let app = add_site(&mut h);

    h.kernel.dispatch(AppCommand::RunCommand {
        app_id: app.id.clone(),
        command_id: CommandId::from("missing"),
    });

    assert!(h.runner.calls.lock().unwrap().is_empty());
    let last = h.kernel.store.state().logs.pop().unwrap();
    assert_eq!(last.level, LogLevel::Warning);
}

#[test]
fn terminal_events_persist_apps_once_per_tick() {
    let mut h = harness();
    let app = add_site(&mut h);
    let saves_after_add = *h.apps.saves.lock().unwrap();

    for cmd in &app.commands[..2] {
        h.kernel.bus().publish(CommandUpdateEvent::new(
            app.id.clone(),
            cmd.id.clone(),
            CommandStatus::Running,
            format!("> {}\n", cmd.script),
        ));
    }
    h.kernel.tick();
    assert_eq!(*h.apps.saves.lock().unwrap(), saves_after_add);

    for cmd in &app.commands[..2] {
        h.kernel.bus().publish(CommandUpdateEvent::new(
            app.id.clone(),
            cmd.id.clone(),
            CommandStatus::Success,
            "\nProcess finished with exit code 0.\n",
        ));
    }
    h.kernel.tick();
    assert_eq!(*h.apps.saves.lock().unwrap(), saves_after_add + 1);

    let persisted = h.apps.stored.lock().unwrap().clone();
    assert_eq!(persisted[0].commands[0].status, CommandStatus::Success);
    assert_eq!(persisted[0].commands[1].status, CommandStatus::Success);
}

#[test]
fn events_for_deleted_app_are_dropped() {
    let mut h = harness();
    let app = add_site(&mut h);
    h.kernel.dispatch(AppCommand::DeleteApp(app.id.clone()));
    let saves = *h.apps.saves.lock().unwrap();

    h.kernel.bus().publish(CommandUpdateEvent::new(
        app.id.clone(),
        app.commands[0].id.clone(),
        CommandStatus::Error,
        "\nProcess finished with exit code 1.\n",
    ));
    assert_eq!(h.kernel.tick(), 1);

    assert!(h.kernel.store.apps().is_empty());
    assert_eq!(*h.apps.saves.lock().unwrap(), saves);
}

#[test]
fn log_lines_reach_the_sink_only_with_auto_save() {
    let mut h = harness();
    h.kernel.log(LogLevel::Info, "before");
    h.kernel.flush_log();
    assert!(h.log.lines.lock().unwrap().is_empty());

    h.kernel.dispatch(AppCommand::UpdateSettings(Settings {
        auto_save_log: true,
    }));
    assert!(h.settings.stored.lock().unwrap().auto_save_log);

    h.kernel.log(LogLevel::Warning, "after");
    h.kernel.flush_log();

    let lines = h.log.lines.lock().unwrap().clone();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("] [DEBUG] Settings updated: autoSaveLog=true."));
    assert!(lines[1].ends_with("] [WARNING] after\n"));
    assert!(lines[1].starts_with('['));
}

#[test]
fn clear_logs_empties_the_activity_log() {
    let mut h = harness();
    h.kernel.log(LogLevel::Info, "x");
    assert!(!h.kernel.store.state().logs.is_empty());
    h.kernel.dispatch(AppCommand::ClearLogs);
    assert!(h.kernel.store.state().logs.is_empty());
}

#[test]
fn failed_load_falls_back_to_empty_and_logs_an_error() {
    let h = harness_with(MemoryApps {
        fail_load: true,
        ..MemoryApps::default()
    });
    let state = h.kernel.store.state();
    assert!(state.apps.is_empty());
    assert!(state
        .logs
        .iter()
        .any(|l| l.level == LogLevel::Error && l.message.contains("apps.json is corrupt")));
}

#[test]
fn persisted_running_commands_load_idle() {
    let mut app = App::from_template("site", "/srv/site");
    app.commands[0].status = CommandStatus::Running;
    let apps = MemoryApps::default();
    *apps.stored.lock().unwrap() = vec![app.clone()];

    let h = harness_with(apps);
    let cmd = h.kernel.store.command(&app.id, &app.commands[0].id).unwrap();
    assert_eq!(cmd.status, CommandStatus::Idle);
}

#[test]
fn picker_path_becomes_an_app_and_cancel_adds_nothing() {
    let mut h = harness();

    let id = h
        .kernel
        .add_app_from_picker(&mut ScriptedPicker(Some("/work/api".into())), None)
        .unwrap();
    assert_eq!(h.kernel.store.app(&id).unwrap().name, "api");

    let none = h
        .kernel
        .add_app_from_picker(&mut ScriptedPicker(None), Some("x".into()));
    assert!(none.is_none());
    assert_eq!(h.kernel.store.apps().len(), 1);
}
