use anyhow::{anyhow, bail, Result};
use buildpanel_app_core::{app_card_vm, AppCommand, DirectoryPicker};
use buildpanel_core::App;
use camino::Utf8PathBuf;

use crate::{absolutize, Session};

pub fn find(session: &Session, name_or_id: &str) -> Result<App> {
    session
        .kernel
        .store
        .find_app(name_or_id)
        .ok_or_else(|| anyhow!("App '{}' not found", name_or_id))
}

pub fn handle_list(session: &Session) -> Result<()> {
    let apps = session.kernel.store.apps();
    if apps.is_empty() {
        println!("No apps registered.");
        return Ok(());
    }

    println!("{:<36} {:<24} {:<40}", "ID", "NAME", "PATH");
    println!("{:-<36} {:-<24} {:-<40}", "", "", "");
    for app in &apps {
        let card = app_card_vm(app);
        println!("{:<36} {:<24} {:<40}", card.id, card.name, card.path);
        for cmd in card.commands {
            println!("    {:<16} {:<24} {}", cmd.name, cmd.script, cmd.status_label);
        }
    }
    Ok(())
}

/// Register an app. Without `path` the directory comes from `picker`.
pub fn handle_add<P: DirectoryPicker>(
    session: &mut Session,
    name: Option<String>,
    path: Option<Utf8PathBuf>,
    picker: &mut P,
) -> Result<App> {
    let before = session.kernel.store.apps().len();
    match path {
        Some(path) => {
            let path = absolutize(&path)?;
            session.kernel.dispatch(AppCommand::AddApp {
                name: name.unwrap_or_default(),
                path,
            });
        }
        None => {
            if session.kernel.add_app_from_picker(picker, name).is_none()
                && session.kernel.store.state().error.is_none()
            {
                bail!("No directory selected");
            }
        }
    }

    if let Some(err) = session.kernel.store.state().error {
        session.kernel.dispatch(AppCommand::DismissError);
        bail!(err);
    }

    let apps = session.kernel.store.apps();
    match apps.get(before) {
        Some(app) => {
            println!(":: Added '{}' at {} ({})", app.name, app.path, app.id);
            Ok(app.clone())
        }
        None => bail!("App was not added"),
    }
}

pub fn handle_remove(session: &mut Session, name_or_id: &str) -> Result<()> {
    let app = find(session, name_or_id)?;
    session.kernel.dispatch(AppCommand::DeleteApp(app.id.clone()));
    println!(":: Removed '{}'", app.name);
    Ok(())
}
