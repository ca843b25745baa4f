//! Just enough `git` to show a working tree evolving: `init`, `add`,
//! `status`, `commit -m` and `log`. State lives in `<repo>/.git/*.json`.

use crate::error::ShellError;
use crate::simulator::ShellSimulator;
use aussie_os_vfs::path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const GIT_DIR: &str = ".git";
const INDEX_FILE: &str = "index.json";
const LOG_FILE: &str = "log.json";
const BRANCH: &str = "main";

#[derive(Debug, Default, Serialize, Deserialize)]
struct GitIndex {
    /// Content at the last commit, keyed by repo-relative path.
    committed: BTreeMap<String, String>,
    /// Pending changes; `None` stages a deletion.
    staged: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Commit {
    hash: String,
    message: String,
    timestamp: i64,
    files_changed: usize,
}

struct Repo<'a> {
    shell: &'a ShellSimulator,
    root: String,
}

pub(crate) fn run(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let Some(sub) = args.first() else {
        return Ok("usage: git <init|status|add|commit|log> [<args>]".to_string());
    };
    let rest = &args[1..];
    match sub.as_str() {
        "init" => init(shell),
        "status" => Repo::discover(shell)?.status(),
        "add" => Repo::discover(shell)?.add(rest),
        "commit" => Repo::discover(shell)?.commit(rest),
        "log" => Repo::discover(shell)?.log(),
        other => Err(ShellError::Failed(format!(
            "'{}' is not a git command. See 'git help'.",
            other
        ))),
    }
}

fn init(shell: &ShellSimulator) -> Result<String, ShellError> {
    let cwd = shell.cwd();
    let git_dir = path::join(&cwd, GIT_DIR);
    if shell.vfs().is_dir(&git_dir) {
        return Ok(format!("Reinitialized existing Git repository in {}/", git_dir));
    }
    let repo = Repo { shell, root: cwd };
    repo.save_index(&GitIndex::default())?;
    repo.save_log(&[])?;
    Ok(format!("Initialized empty Git repository in {}/", git_dir))
}

impl<'a> Repo<'a> {
    /// Find the nearest ancestor of `cwd` holding a `.git` directory.
    fn discover(shell: &'a ShellSimulator) -> Result<Self, ShellError> {
        let mut dir = shell.cwd();
        loop {
            if shell.vfs().is_dir(&path::join(&dir, GIT_DIR)) {
                return Ok(Self { shell, root: dir });
            }
            match path::split_parent(&dir) {
                Some((parent, _)) => dir = parent.to_string(),
                None => {
                    return Err(ShellError::Fatal(
                        "not a git repository (or any of the parent directories): .git".to_string(),
                    ))
                }
            }
        }
    }

    fn meta_path(&self, file: &str) -> String {
        path::join(&path::join(&self.root, GIT_DIR), file)
    }

    fn load<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T, ShellError> {
        let raw = self.shell.vfs().read_file(&self.meta_path(file))?;
        serde_json::from_str(&raw).map_err(|e| ShellError::Fatal(format!("corrupt {}: {}", file, e)))
    }

    fn store<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), ShellError> {
        let raw = serde_json::to_string_pretty(value)
            .map_err(|e| ShellError::Fatal(format!("cannot write {}: {}", file, e)))?;
        self.shell.vfs().write_file(&self.meta_path(file), &raw, false)?;
        Ok(())
    }

    fn load_index(&self) -> Result<GitIndex, ShellError> {
        self.load(INDEX_FILE)
    }

    fn save_index(&self, index: &GitIndex) -> Result<(), ShellError> {
        self.store(INDEX_FILE, index)
    }

    fn load_log(&self) -> Result<Vec<Commit>, ShellError> {
        self.load(LOG_FILE)
    }

    fn save_log(&self, log: &[Commit]) -> Result<(), ShellError> {
        self.store(LOG_FILE, log)
    }

    fn relative(&self, absolute: &str) -> String {
        if self.root == path::ROOT {
            absolute.trim_start_matches('/').to_string()
        } else {
            absolute
                .strip_prefix(&format!("{}/", self.root))
                .unwrap_or(absolute)
                .to_string()
        }
    }

    /// Working-tree files under `dir`, repo-relative, excluding `.git`.
    fn working_files(&self, dir: &str) -> Result<BTreeMap<String, String>, ShellError> {
        let git_dir = path::join(&self.root, GIT_DIR);
        let files = if self.shell.vfs().is_dir(dir) {
            self.shell.vfs().files_under(dir)?
        } else {
            let content = self.shell.vfs().read_file(dir)?;
            BTreeMap::from([(dir.to_string(), content)])
        };
        Ok(files
            .into_iter()
            .filter(|(p, _)| !path::is_within(p, &git_dir))
            .map(|(p, content)| (self.relative(&p), content))
            .collect())
    }

    fn add(&self, args: &[String]) -> Result<String, ShellError> {
        if args.is_empty() {
            return Err(ShellError::Failed(
                "Nothing specified, nothing added.".to_string(),
            ));
        }
        let mut index = self.load_index()?;

        for arg in args {
            let target = self.shell.resolve(arg)?;
            if !path::is_within(&target, &self.root) {
                return Err(ShellError::Fatal(format!(
                    "{}: '{}' is outside repository",
                    arg, target
                )));
            }
            let prefix = self.relative(&target);
            let in_scope = |p: &str| target == self.root || p == prefix || p.starts_with(&format!("{}/", prefix));

            let working = if self.shell.vfs().exists(&target) {
                self.working_files(&target)?
            } else if index.committed.keys().any(|p| in_scope(p)) {
                BTreeMap::new()
            } else {
                return Err(ShellError::Fatal(format!(
                    "pathspec '{}' did not match any files",
                    arg
                )));
            };

            for (p, content) in &working {
                if index.committed.get(p) == Some(content) {
                    index.staged.remove(p);
                } else {
                    index.staged.insert(p.clone(), Some(content.clone()));
                }
            }
            let removed: Vec<String> = index
                .committed
                .keys()
                .filter(|p| in_scope(p) && !working.contains_key(*p))
                .cloned()
                .collect();
            for p in removed {
                index.staged.insert(p, None);
            }
        }

        self.save_index(&index)?;
        Ok(String::new())
    }

    fn status(&self) -> Result<String, ShellError> {
        let index = self.load_index()?;
        let working = self.working_files(&self.root)?;

        let mut staged = Vec::new();
        for (p, change) in &index.staged {
            let label = match (change, index.committed.contains_key(p)) {
                (None, _) => "deleted:   ",
                (Some(_), true) => "modified:  ",
                (Some(_), false) => "new file:  ",
            };
            staged.push(format!("\t{}{}", label, p));
        }

        // Expected content of each tracked path once staged changes apply.
        let mut expected = index.committed.clone();
        for (p, change) in &index.staged {
            match change {
                Some(content) => {
                    expected.insert(p.clone(), content.clone());
                }
                None => {
                    expected.remove(p);
                }
            }
        }

        let mut unstaged = Vec::new();
        let mut untracked = Vec::new();
        for (p, content) in &working {
            match expected.get(p) {
                Some(tracked) if tracked != content => unstaged.push(format!("\tmodified:  {}", p)),
                Some(_) => {}
                None => untracked.push(format!("\t{}", p)),
            }
        }
        for p in expected.keys().filter(|p| !working.contains_key(*p)) {
            unstaged.push(format!("\tdeleted:   {}", p));
        }

        let mut out = vec![format!("On branch {}", BRANCH)];
        if staged.is_empty() && unstaged.is_empty() && untracked.is_empty() {
            out.push("nothing to commit, working tree clean".to_string());
            return Ok(out.join("\n"));
        }
        for (title, lines) in [
            ("Changes to be committed:", staged),
            ("Changes not staged for commit:", unstaged),
            ("Untracked files:", untracked),
        ] {
            if !lines.is_empty() {
                out.push(title.to_string());
                out.extend(lines);
            }
        }
        Ok(out.join("\n"))
    }

    fn commit(&self, args: &[String]) -> Result<String, ShellError> {
        let message = match args {
            [flag, message, ..] if flag == "-m" => message.clone(),
            _ => return Err(ShellError::Usage("usage: git commit -m <message>".to_string())),
        };

        let mut index = self.load_index()?;
        if index.staged.is_empty() {
            return Err(ShellError::Failed(
                "nothing to commit, working tree clean".to_string(),
            ));
        }

        let files_changed = index.staged.len();
        for (p, change) in std::mem::take(&mut index.staged) {
            match change {
                Some(content) => {
                    index.committed.insert(p, content);
                }
                None => {
                    index.committed.remove(&p);
                }
            }
        }

        let commit = Commit {
            hash: uuid::Uuid::new_v4().simple().to_string()[..7].to_string(),
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
            files_changed,
        };
        let mut log = self.load_log()?;
        log.push(commit.clone());

        self.save_index(&index)?;
        self.save_log(&log)?;

        Ok(format!(
            "[{} {}] {}\n {} file{} changed",
            BRANCH,
            commit.hash,
            commit.message,
            files_changed,
            if files_changed == 1 { "" } else { "s" }
        ))
    }

    fn log(&self) -> Result<String, ShellError> {
        let log = self.load_log()?;
        if log.is_empty() {
            return Err(ShellError::Fatal(format!(
                "your current branch '{}' does not have any commits yet",
                BRANCH
            )));
        }
        let entries: Vec<String> = log
            .iter()
            .rev()
            .map(|commit| {
                let date = chrono::DateTime::from_timestamp_millis(commit.timestamp)
                    .map(|d| d.to_rfc2822())
                    .unwrap_or_default();
                format!("commit {}\nDate:   {}\n\n    {}", commit.hash, date, commit.message)
            })
            .collect();
        Ok(entries.join("\n\n"))
    }
}
