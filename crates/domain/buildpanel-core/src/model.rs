use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::template::default_commands;
use crate::CommandStatus;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh random identifier.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(AppId);
string_id!(CommandId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub name: String,
    pub script: String,
    #[serde(default)]
    pub status: CommandStatus,
    #[serde(default)]
    pub output: String,
}

impl Command {
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            id: CommandId::new(),
            name: name.into(),
            script: script.into(),
            status: CommandStatus::Idle,
            output: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: AppId,
    pub name: String,
    pub path: Utf8PathBuf,
    pub commands: Vec<Command>,
}

impl App {
    /// New app carrying the standard pull/install/build/test commands.
    pub fn from_template(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            id: AppId::new(),
            name: name.into(),
            path: path.into(),
            commands: default_commands(),
        }
    }

    pub fn command(&self, id: &CommandId) -> Option<&Command> {
        self.commands.iter().find(|c| &c.id == id)
    }

    pub fn command_mut(&mut self, id: &CommandId) -> Option<&mut Command> {
        self.commands.iter_mut().find(|c| &c.id == id)
    }

    /// Matches on id, then display name (ignoring case), then exact script.
    pub fn find_command(&self, key: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|c| c.id.as_str() == key)
            .or_else(|| {
                self.commands
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(key))
            })
            .or_else(|| self.commands.iter().find(|c| c.script == key))
    }
}

/// Name an app after the last component of its directory. Both separators are
/// accepted so Windows-style paths work on every host.
pub fn derive_app_name(path: &Utf8Path) -> Option<String> {
    path.as_str()
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .map(str::to_string)
        .filter(|name| !name.is_empty())
}
