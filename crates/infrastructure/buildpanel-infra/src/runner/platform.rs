#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: &'static str,
    pub args: [String; 2],
}

impl ShellInvocation {
    #[cfg(target_os = "windows")]
    pub fn for_script(script: &str) -> Self {
        Self {
            program: "cmd.exe",
            args: ["/c".to_string(), script.to_string()],
        }
    }

    #[cfg(not(target_os = "windows"))]
    pub fn for_script(script: &str) -> Self {
        Self {
            program: "/bin/sh",
            args: ["-c".to_string(), script.to_string()],
        }
    }
}
