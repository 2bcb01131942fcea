use buildpanel_core::{AppId, CommandId, EventSink};
use buildpanel_infra::ProcessRunner;
use camino::Utf8Path;

use crate::ports::CommandRunner;

impl<E: EventSink> CommandRunner for ProcessRunner<E> {
    fn run(
        &self,
        app_id: AppId,
        command_id: CommandId,
        cwd: &Utf8Path,
        script: &str,
    ) -> anyhow::Result<()> {
        Ok(ProcessRunner::run(self, app_id, command_id, cwd, script)?)
    }
}
