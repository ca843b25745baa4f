use crate::error::ShellError;
use crate::simulator::ShellSimulator;
use aussie_os_vfs::path;
use serde_json::{json, Map, Value};

const MANIFEST: &str = "package.json";
const MODULES: &str = "node_modules";
const DEFAULT_RANGE: &str = "^1.0.0";

pub(crate) fn run(shell: &ShellSimulator, args: &[String]) -> Result<String, ShellError> {
    match args.first().map(String::as_str) {
        Some("install") | Some("i") => install(shell, &args[1..]),
        Some(other) => Err(ShellError::Failed(format!("Unknown command: \"{}\"", other))),
        None => Ok("Usage: npm install [<package>[@<version>]]".to_string()),
    }
}

fn install(shell: &ShellSimulator, packages: &[String]) -> Result<String, ShellError> {
    let cwd = shell.cwd();
    let manifest_path = path::join(&cwd, MANIFEST);

    if packages.is_empty() {
        let manifest = read_manifest(shell, &manifest_path)?.ok_or_else(|| {
            ShellError::Failed(format!(
                "npm ERR! enoent Could not read package.json: no such file {}",
                manifest_path
            ))
        })?;
        let mut dependencies = Vec::new();
        for section in ["dependencies", "devDependencies"] {
            if let Some(Value::Object(deps)) = manifest.get(section) {
                for (name, range) in deps {
                    dependencies.push((name.clone(), range.as_str().unwrap_or(DEFAULT_RANGE).to_string()));
                }
            }
        }

        let mut added = 0;
        for (name, range) in &dependencies {
            if materialize(shell, &cwd, name, range)? {
                added += 1;
            }
        }
        return Ok(summary(added, dependencies.len()));
    }

    let mut manifest = read_manifest(shell, &manifest_path)?.unwrap_or_else(|| {
        let name = cwd.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("workspace");
        let mut fresh = Map::new();
        fresh.insert("name".to_string(), json!(name));
        fresh.insert("version".to_string(), json!("1.0.0"));
        fresh
    });

    let mut added = 0;
    for spec in packages {
        let (name, range) = split_spec(spec);
        if materialize(shell, &cwd, name, &range)? {
            added += 1;
        }
        let deps = manifest
            .entry("dependencies")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(deps) = deps {
            deps.insert(name.to_string(), json!(range));
        }
    }

    let raw = serde_json::to_string_pretty(&Value::Object(manifest))
        .map_err(|e| ShellError::Failed(e.to_string()))?;
    shell.vfs().write_file(&manifest_path, &raw, false)?;
    Ok(summary(added, packages.len()))
}

fn read_manifest(shell: &ShellSimulator, manifest_path: &str) -> Result<Option<Map<String, Value>>, ShellError> {
    if !shell.vfs().exists(manifest_path) {
        return Ok(None);
    }
    let raw = shell.vfs().read_file(manifest_path)?;
    match serde_json::from_str(&raw) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(ShellError::Failed("npm ERR! package.json must be an object".to_string())),
        Err(e) => Err(ShellError::Failed(format!("npm ERR! JSON.parse {}", e))),
    }
}

/// `left-pad@1.3.0` / `@scope/pkg@2` / `react`.
fn split_spec(spec: &str) -> (&str, String) {
    let search_from = usize::from(spec.starts_with('@'));
    match spec[search_from..].find('@') {
        Some(at) => {
            let at = at + search_from;
            (&spec[..at], spec[at + 1..].to_string())
        }
        None => (spec, DEFAULT_RANGE.to_string()),
    }
}

/// Write `node_modules/<name>/package.json`; false if it was already there.
fn materialize(shell: &ShellSimulator, cwd: &str, name: &str, range: &str) -> Result<bool, ShellError> {
    let module_manifest = path::join(&path::join(&path::join(cwd, MODULES), name), MANIFEST);
    if shell.vfs().exists(&module_manifest) {
        return Ok(false);
    }
    let version = range.trim_start_matches(['^', '~', '=']);
    let body = json!({ "name": name, "version": version }).to_string();
    shell.vfs().write_file(&module_manifest, &body, false)?;
    Ok(true)
}

fn summary(added: usize, requested: usize) -> String {
    if added == 0 {
        format!("up to date, audited {} packages in 0.2s", requested)
    } else {
        format!(
            "added {} package{}, and audited {} packages in 0.4s\n\nfound 0 vulnerabilities",
            added,
            if added == 1 { "" } else { "s" },
            requested
        )
    }
}
