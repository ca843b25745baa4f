use crate::builtins;
use crate::error::ShellError;
use crate::lexer::tokenize;
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_vfs::{path, VirtualFileSystem};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const HOME: &str = "/home/aussie";
pub const DEFAULT_CWD: &str = "/workspace";

/// A built-in command. Receives the arguments after the command name and
/// returns stdout.
pub type Builtin = fn(&ShellSimulator, &[String]) -> Result<String, ShellError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ShellResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Set by `clear`; the terminal should wipe its scrollback.
    #[serde(default)]
    pub clear_screen: bool,
}

impl ShellResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub struct ShellSimulator {
    vfs: Arc<VirtualFileSystem>,
    bus: EventBus,
    cwd: Mutex<String>,
    builtins: HashMap<&'static str, Builtin>,
}

impl ShellSimulator {
    pub fn new(vfs: Arc<VirtualFileSystem>, bus: EventBus) -> Self {
        Self {
            vfs,
            bus,
            cwd: Mutex::new(DEFAULT_CWD.to_string()),
            builtins: builtins::table(),
        }
    }

    /// Add or replace a command in the dispatch table.
    pub fn register(&mut self, name: &'static str, handler: Builtin) {
        self.builtins.insert(name, handler);
    }

    pub fn commands(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.builtins.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn cwd(&self) -> String {
        self.cwd.lock().clone()
    }

    pub(crate) fn set_cwd(&self, cwd: String) {
        *self.cwd.lock() = cwd;
    }

    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    /// Resolve a user-supplied path against `cwd`, expanding `~`.
    pub fn resolve(&self, input: &str) -> Result<String, ShellError> {
        let expanded = if input == "~" {
            HOME.to_string()
        } else if let Some(rest) = input.strip_prefix("~/") {
            format!("{}/{}", HOME, rest)
        } else {
            input.to_string()
        };
        Ok(path::resolve(&self.cwd(), &expanded)?)
    }

    /// Run one command line. Never fails: errors become stderr and a
    /// non-zero exit code.
    pub fn execute(&self, line: &str) -> ShellResult {
        let result = match tokenize(line) {
            Ok(words) if words.is_empty() => return ShellResult::default(),
            Ok(words) => self.run(words),
            Err(e) => ShellResult {
                stderr: e.render("sh"),
                exit_code: e.exit_code(),
                ..Default::default()
            },
        };

        debug!("Shell `{}` exited with {}", line, result.exit_code);
        self.bus.emit(SystemEvent::ShellOutput(result.stdout.clone()));
        result
    }

    fn run(&self, mut words: Vec<String>) -> ShellResult {
        let redirect = match split_redirect(&mut words) {
            Ok(redirect) => redirect,
            Err(e) => {
                return ShellResult {
                    stderr: e.render("sh"),
                    exit_code: e.exit_code(),
                    ..Default::default()
                }
            }
        };

        let command = words.remove(0);
        let outcome = match self.builtins.get(command.as_str()) {
            Some(handler) => {
                info!("Shell executing: {} {:?}", command, words);
                handler(self, &words)
            }
            None => Err(ShellError::CommandNotFound(command.clone())),
        };

        let outcome = match (outcome, redirect) {
            (Ok(stdout), Some((target, append))) => self
                .resolve(&target)
                .and_then(|path| {
                    let body = if stdout.is_empty() {
                        stdout
                    } else {
                        format!("{}\n", stdout)
                    };
                    Ok(self.vfs.write_file(&path, &body, append)?)
                })
                .map(|_| String::new()),
            (outcome, _) => outcome,
        };

        match outcome {
            Ok(stdout) => ShellResult {
                clear_screen: command == "clear",
                stdout,
                ..Default::default()
            },
            Err(e) => ShellResult {
                stderr: e.render(&command),
                exit_code: e.exit_code(),
                ..Default::default()
            },
        }
    }
}

/// Strip a trailing `> file` / `>> file` from `words`.
fn split_redirect(words: &mut Vec<String>) -> Result<Option<(String, bool)>, ShellError> {
    let Some(index) = words.iter().position(|w| w == ">" || w == ">>") else {
        return Ok(None);
    };
    if index == 0 || index + 2 != words.len() {
        return Err(ShellError::Usage("syntax error near redirection".to_string()));
    }
    let target = words.pop().unwrap_or_default();
    let append = words.pop().as_deref() == Some(">>");
    Ok(Some((target, append)))
}
