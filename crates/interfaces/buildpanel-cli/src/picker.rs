use std::io::{self, BufRead, StdinLock, Stdout, Write};

use buildpanel_app_core::DirectoryPicker;
use camino::{Utf8Path, Utf8PathBuf};

/// Asks for a directory on a line of input. An empty answer or end of input cancels.
pub struct PromptPicker<R, W> {
    input: R,
    output: W,
    base: Utf8PathBuf,
}

impl PromptPicker<StdinLock<'static>, Stdout> {
    pub fn stdin(base: Utf8PathBuf) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), base)
    }
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    /// Relative answers are resolved against `base`.
    pub fn new(input: R, output: W, base: Utf8PathBuf) -> Self {
        Self {
            input,
            output,
            base,
        }
    }
}

impl<R: BufRead, W: Write> DirectoryPicker for PromptPicker<R, W> {
    fn select_directory(&mut self) -> Option<Utf8PathBuf> {
        let _ = write!(self.output, "Project directory (empty to cancel): ");
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let answer = line.trim();
                if answer.is_empty() {
                    return None;
                }
                let path = Utf8Path::new(answer);
                Some(if path.is_absolute() {
                    path.to_owned()
                } else {
                    self.base.join(path)
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn pick(input: &str) -> Option<Utf8PathBuf> {
        let mut out = Vec::new();
        PromptPicker::new(Cursor::new(input.as_bytes()), &mut out, "/home/me".into())
            .select_directory()
    }

    #[test]
    fn answers_resolve_against_base() {
        assert_eq!(pick("/srv/site\n"), Some("/srv/site".into()));
        assert_eq!(pick("code/shop\n"), Some("/home/me/code/shop".into()));
    }

    #[test]
    fn empty_answer_or_eof_cancels() {
        assert_eq!(pick("\n"), None);
        assert_eq!(pick("   \n"), None);
        assert_eq!(pick(""), None);
    }
}
