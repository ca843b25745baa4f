use crate::packages::PackageManager;
use crate::traits::{str_arg, Tool, ToolContext, ToolError};
use aussie_os_policy::Capability;
use aussie_os_shell::ShellSimulator;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ShellExecTool {
    shell: Arc<ShellSimulator>,
}

impl ShellExecTool {
    pub fn new(shell: Arc<ShellSimulator>) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl Tool for ShellExecTool {
    fn name(&self) -> &str {
        "shell_exec"
    }

    fn description(&self) -> &str {
        "Execute a shell command (cd, ls, pwd, cat, echo, mkdir, touch, rm, mv, git, npm)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command line to run"
                }
            },
            "required": ["command"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::Shell
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let command = str_arg(&args, "command")?;
        // A failing command is still a successful call; the model reads the
        // exit code.
        let result = self.shell.execute(command);
        Ok(json!({
            "stdout": result.stdout,
            "stderr": result.stderr,
            "exitCode": result.exit_code,
        }))
    }
}

pub struct ApmInstallTool {
    packages: Arc<dyn PackageManager>,
}

impl ApmInstallTool {
    pub fn new(packages: Arc<dyn PackageManager>) -> Self {
        Self { packages }
    }
}

#[async_trait]
impl Tool for ApmInstallTool {
    fn name(&self) -> &str {
        "apm_install"
    }

    fn description(&self) -> &str {
        "Install a package."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "package": {
                    "type": "string",
                    "description": "Package name"
                }
            },
            "required": ["package"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::FsWrite
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let message = self.packages.install(str_arg(&args, "package")?).await?;
        Ok(json!({ "status": "installed", "message": message }))
    }
}
