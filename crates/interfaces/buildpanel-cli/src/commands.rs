use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use buildpanel_app_core::{command_output_vm, AppCommand, DocumentSource, LogLevel};
use buildpanel_config::{DOCS_DIR, TICK_INTERVAL};
use buildpanel_core::{CommandStatus, Settings};
use buildpanel_persistence::{FilePersistence, MarkdownDocs};
use camino::{Utf8Path, Utf8PathBuf};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{apps, Session};

/// Run one command and stream its output until it finishes.
pub async fn cmd_run(session: &mut Session, app: &str, command: &str) -> Result<CommandStatus> {
    let app = apps::find(session, app)?;
    let cmd = app
        .find_command(command)
        .ok_or_else(|| anyhow!("App '{}' has no command '{}'", app.name, command))?
        .clone();

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid spinner template")?,
    );
    pb.set_message(format!("{} ({})", cmd.name, app.name));
    pb.enable_steady_tick(TICK_INTERVAL * 2);

    let started = Arc::new(AtomicBool::new(false));
    let printer = {
        let pb = pb.clone();
        let started = started.clone();
        let (app_id, command_id) = (app.id.clone(), cmd.id.clone());
        session.kernel.subscribe(move |ev| {
            if ev.app_id == app_id && ev.command_id == command_id {
                if ev.status == CommandStatus::Running {
                    started.store(true, Ordering::Release);
                }
                pb.suspend(|| {
                    let mut out = std::io::stdout().lock();
                    let _ = out.write_all(ev.output.as_bytes());
                    let _ = out.flush();
                });
            }
        })
    };

    session.kernel.dispatch(AppCommand::RunCommand {
        app_id: app.id.clone(),
        command_id: cmd.id.clone(),
    });

    // The echo is queued before the runner returns, so a started run is
    // visible after the first tick. A stored status may be from an older run.
    session.kernel.tick();
    let mut status = current_status(session, &app.id, &cmd.id)?;
    if !started.load(Ordering::Acquire) {
        session.kernel.unsubscribe(printer);
        pb.finish_and_clear();
        let reason = session
            .kernel
            .store
            .state()
            .logs
            .last()
            .map(|l| l.message.clone())
            .unwrap_or_default();
        bail!("'{}' did not start: {}", cmd.name, reason);
    }

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    while !status.is_terminal() {
        ticker.tick().await;
        session.kernel.tick();
        status = current_status(session, &app.id, &cmd.id)?;
    }

    session.kernel.unsubscribe(printer);
    session.kernel.flush_log();
    pb.finish_and_clear();
    Ok(status)
}

fn current_status(
    session: &Session,
    app_id: &buildpanel_core::AppId,
    command_id: &buildpanel_core::CommandId,
) -> Result<CommandStatus> {
    session
        .kernel
        .store
        .command(app_id, command_id)
        .map(|c| c.status)
        .ok_or_else(|| anyhow!("Command disappeared while running"))
}

pub fn cmd_show(session: &Session, app: &str, command: &str) -> Result<()> {
    let app = apps::find(session, app)?;
    let cmd = app
        .find_command(command)
        .ok_or_else(|| anyhow!("App '{}' has no command '{}'", app.name, command))?;

    let vm = session
        .kernel
        .store
        .with_state(|s| command_output_vm(s, &app.id, &cmd.id))
        .ok_or_else(|| anyhow!("Command '{}' not found", command))?;

    println!(":: {} / {} [{}]", vm.app_name, vm.command_name, vm.status_label);
    if vm.output.is_empty() {
        println!("(no output yet)");
    } else {
        print!("{}", vm.output);
    }
    Ok(())
}

pub fn cmd_settings(session: &mut Session, auto_save_log: Option<bool>) -> Result<Settings> {
    if let Some(auto_save_log) = auto_save_log {
        session
            .kernel
            .dispatch(AppCommand::UpdateSettings(Settings { auto_save_log }));
    }
    let settings = session.kernel.settings();
    println!("autoSaveLog: {}", settings.auto_save_log);
    println!(
        "data directory: {}",
        session.persistence.paths().root()
    );
    Ok(settings)
}

/// Print today's log file, keeping only lines at `levels` when any are given.
pub fn cmd_logs(persistence: &FilePersistence, levels: &[LogLevel]) -> Result<()> {
    let log = persistence.daily_log();
    let path = log.today();
    let content = log
        .read_today()
        .with_context(|| format!("Failed to read {path}"))?;

    println!(":: {} ({})", path, format_size(content.len() as u64, DECIMAL));
    for line in content.lines() {
        let keep = levels.is_empty() || line_level(line).is_some_and(|l| levels.contains(&l));
        if keep {
            println!("{line}");
        }
    }
    Ok(())
}

/// Level of a `[timestamp] [LEVEL] message` line.
pub fn line_level(line: &str) -> Option<LogLevel> {
    let rest = line.strip_prefix('[')?;
    let (_, rest) = rest.split_once("] [")?;
    let (level, _) = rest.split_once(']')?;
    level.parse().ok()
}

pub fn cmd_docs(file: &str, docs_dir: Option<Utf8PathBuf>) -> Result<()> {
    let root = match docs_dir {
        Some(dir) => dir,
        None => default_docs_dir()?,
    };
    let docs = MarkdownDocs::new(root);
    println!("{}", DocumentSource::markdown(&docs, file));
    Ok(())
}

/// `docs/` next to the executable.
fn default_docs_dir() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().context("Could not locate the executable")?;
    let exe = Utf8PathBuf::try_from(exe).context("Executable path is not valid UTF-8")?;
    let dir = exe.parent().unwrap_or(Utf8Path::new("."));
    Ok(dir.join(DOCS_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_read_from_log_lines() {
        assert_eq!(
            line_level("[2024-05-01T12:30:00.000Z] [WARNING] disk full"),
            Some(LogLevel::Warning)
        );
        assert_eq!(
            line_level("[2024-05-01T12:30:00.000Z] [ERROR] 'NPM Test' for 'x' failed."),
            Some(LogLevel::Error)
        );
        assert_eq!(line_level("continuation of a message"), None);
        assert_eq!(line_level("[ts] [VERBOSE] x"), None);
    }
}
