use crate::error::ShellError;
use crate::simulator::{Builtin, ShellSimulator, HOME};
use crate::{git, npm};
use aussie_os_vfs::{NodeType, VfsError};
use std::collections::HashMap;

pub(crate) fn table() -> HashMap<&'static str, Builtin> {
    let entries: [(&'static str, Builtin); 17] = [
        ("cd", cd),
        ("ls", ls),
        ("pwd", pwd),
        ("echo", echo),
        ("cat", cat),
        ("mkdir", mkdir),
        ("touch", touch),
        ("rm", rm),
        ("mv", mv),
        ("clear", clear),
        ("whoami", whoami),
        ("date", date),
        ("help", help),
        ("git", git::run),
        ("npm", npm::run),
        ("tree", tree),
        ("head", head),
    ];
    entries.into_iter().collect()
}

/// Split `-x` style flags from operands.
fn flags_and_operands(args: &[String]) -> (String, Vec<&str>) {
    let mut flags = String::new();
    let mut operands = Vec::new();
    for arg in args {
        match arg.strip_prefix('-') {
            Some(f) if !f.is_empty() && !arg.starts_with("--") => flags.push_str(f),
            _ => operands.push(arg.as_str()),
        }
    }
    (flags, operands)
}

fn cd(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let target = match args.first() {
        Some(dir) => shell.resolve(dir)?,
        None => HOME.to_string(),
    };
    let stat = shell.vfs().stat(&target)?;
    if stat.node_type != NodeType::Directory {
        return Err(VfsError::NotADirectory(target).into());
    }
    shell.set_cwd(target);
    Ok(String::new())
}

fn ls(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let (flags, operands) = flags_and_operands(args);
    let show_hidden = flags.contains('a');
    let target = match operands.first() {
        Some(p) => shell.resolve(p)?,
        None => shell.cwd(),
    };

    let stat = shell.vfs().stat(&target)?;
    if stat.node_type == NodeType::File {
        return Ok(stat.name);
    }

    let lines: Vec<String> = shell
        .vfs()
        .read_dir(&target)?
        .into_iter()
        .filter(|entry| show_hidden || !entry.name.starts_with('.'))
        .map(|entry| match entry.node_type {
            NodeType::Directory => format!("{}/", entry.name),
            NodeType::File => entry.name,
        })
        .collect();
    Ok(lines.join("\n"))
}

fn pwd(shell: &ShellSimulator, _args: &[String]) -> Result<String, ShellError> {
    Ok(shell.cwd())
}

fn echo(_shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    Ok(args.join(" "))
}

fn cat(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    if args.is_empty() {
        return Err(ShellError::Usage("missing file operand".to_string()));
    }
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        let path = shell.resolve(arg)?;
        if shell.vfs().is_dir(&path) {
            return Err(VfsError::IsADirectory(path).into());
        }
        out.push(shell.vfs().read_file(&path)?);
    }
    Ok(out.concat().trim_end_matches('\n').to_string())
}

fn head(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let (count, files) = match args {
        [flag, n, rest @ ..] if flag == "-n" => (
            n.parse::<usize>()
                .map_err(|_| ShellError::Usage(format!("invalid number of lines: '{}'", n)))?,
            rest,
        ),
        rest => (10, rest),
    };
    let file = files
        .first()
        .ok_or_else(|| ShellError::Usage("missing file operand".to_string()))?;
    let content = shell.vfs().read_file(&shell.resolve(file)?)?;
    Ok(content.lines().take(count).collect::<Vec<_>>().join("\n"))
}

fn mkdir(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let (flags, operands) = flags_and_operands(args);
    if operands.is_empty() {
        return Err(ShellError::Usage("missing operand".to_string()));
    }
    for operand in operands {
        let path = shell.resolve(operand)?;
        match shell.vfs().mkdir(&path) {
            Err(VfsError::AlreadyExists(_)) if flags.contains('p') => {}
            other => other?,
        }
    }
    Ok(String::new())
}

fn touch(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    if args.is_empty() {
        return Err(ShellError::Usage("missing file operand".to_string()));
    }
    for arg in args {
        shell.vfs().write_file(&shell.resolve(arg)?, "", true)?;
    }
    Ok(String::new())
}

fn rm(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let (flags, operands) = flags_and_operands(args);
    let recursive = flags.contains('r') || flags.contains('R');
    let force = flags.contains('f');
    if operands.is_empty() {
        return Err(ShellError::Usage("missing operand".to_string()));
    }

    for operand in operands {
        let path = shell.resolve(operand)?;
        if !shell.vfs().exists(&path) {
            if force {
                continue;
            }
            return Err(ShellError::Failed(format!(
                "cannot remove '{}': No such file or directory",
                operand
            )));
        }
        if shell.vfs().is_dir(&path) && !recursive {
            return Err(ShellError::Failed(format!(
                "cannot remove '{}': Is a directory",
                operand
            )));
        }
        shell.vfs().delete(&path)?;
    }
    Ok(String::new())
}

fn mv(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let [source, dest] = args else {
        return Err(ShellError::Usage("usage: mv SOURCE DEST".to_string()));
    };
    let source = shell.resolve(source)?;
    let mut dest = shell.resolve(dest)?;
    if shell.vfs().is_dir(&dest) {
        let name = source.rsplit('/').next().unwrap_or_default();
        dest = aussie_os_vfs::path::join(&dest, name);
    }
    shell.vfs().move_path(&source, &dest)?;
    Ok(String::new())
}

fn tree(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    let root = match args.first() {
        Some(p) => shell.resolve(p)?,
        None => shell.cwd(),
    };
    let mut lines = vec![root.clone()];
    walk(shell, &root, "", &mut lines)?;
    Ok(lines.join("\n"))
}

fn walk(shell: &ShellSimulator, dir: &str, prefix: &str, lines: &mut Vec<String>) -> Result<(), ShellError> {
    let entries = shell.vfs().read_dir(dir)?;
    let last = entries.len().saturating_sub(1);
    for (i, entry) in entries.iter().enumerate() {
        let (branch, indent) = if i == last { ("└── ", "    ") } else { ("├── ", "│   ") };
        lines.push(format!("{}{}{}", prefix, branch, entry.name));
        if entry.node_type == NodeType::Directory {
            walk(shell, &entry.path, &format!("{}{}", prefix, indent), lines)?;
        }
    }
    Ok(())
}

fn clear(_shell: &ShellSimulator, _args: &[String]) -> Result<String, ShellError> {
    Ok(String::new())
}

fn whoami(_shell: &ShellSimulator, _args: &[String]) -> Result<String, ShellError> {
    Ok("aussie".to_string())
}

fn date(_shell: &ShellSimulator, _args: &[String]) -> Result<String, ShellError> {
    Ok(chrono::Utc::now().format("%a %b %e %H:%M:%S UTC %Y").to_string())
}

fn help(shell: &ShellSimulator, _args: &[String]) -> Result<String, ShellError> {
    Ok(format!("Available commands: {}", shell.commands().join(", ")))
}
