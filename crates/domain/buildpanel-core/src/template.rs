use crate::model::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTemplate {
    pub name: &'static str,
    pub script: &'static str,
}

/// Commands every new app starts with, in display order.
pub const DEFAULT_COMMANDS: [CommandTemplate; 4] = [
    CommandTemplate {
        name: "Git Pull",
        script: "git pull",
    },
    CommandTemplate {
        name: "NPM Install",
        script: "npm install",
    },
    CommandTemplate {
        name: "NPM Build",
        script: "npm run build",
    },
    CommandTemplate {
        name: "NPM Test",
        script: "npm test",
    },
];

pub fn default_commands() -> Vec<Command> {
    DEFAULT_COMMANDS
        .iter()
        .map(|t| Command::new(t.name, t.script))
        .collect()
}
