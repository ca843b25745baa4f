use crate::traits::{opt_str_arg, str_arg, Tool, ToolContext, ToolError};
use aussie_os_policy::Capability;
use aussie_os_vfs::{path, VirtualFileSystem};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Relative paths from the model are taken from the workspace root.
pub const WORKSPACE: &str = "/workspace";

fn workspace_path(input: &str) -> Result<String, ToolError> {
    Ok(path::resolve(WORKSPACE, input)?)
}

pub struct FileReadTool {
    vfs: Arc<VirtualFileSystem>,
}

impl FileReadTool {
    pub fn new(vfs: Arc<VirtualFileSystem>) -> Self {
        Self { vfs }
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read file content."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "Path to the file (relative paths start at /workspace)"
                }
            },
            "required": ["file"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::FsRead
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let file = workspace_path(str_arg(&args, "file")?)?;
        let content = self.vfs.read_file(&file)?;
        Ok(json!({ "content": content }))
    }
}

pub struct FileWriteTool {
    vfs: Arc<VirtualFileSystem>,
}

impl FileWriteTool {
    pub fn new(vfs: Arc<VirtualFileSystem>) -> Self {
        Self { vfs }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Missing parent directories are created."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": {
                    "type": "string",
                    "description": "Path to the file (relative paths start at /workspace)"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write"
                },
                "append": {
                    "type": "boolean",
                    "description": "Append instead of overwriting"
                }
            },
            "required": ["file", "content"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::FsWrite
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let file = workspace_path(str_arg(&args, "file")?)?;
        let content = str_arg(&args, "content")?;
        let append = args["append"].as_bool().unwrap_or(false);

        self.vfs.write_file(&file, content, append)?;
        Ok(json!({ "status": "success" }))
    }
}

pub struct FileListTool {
    vfs: Arc<VirtualFileSystem>,
}

impl FileListTool {
    pub fn new(vfs: Arc<VirtualFileSystem>) -> Self {
        Self { vfs }
    }
}

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &str {
        "file_list"
    }

    fn description(&self) -> &str {
        "List files in a directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path (relative paths start at /workspace)"
                }
            },
            "required": ["path"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::FsRead
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let dir = workspace_path(opt_str_arg(&args, "path").unwrap_or(WORKSPACE))?;
        let files: Vec<String> = self
            .vfs
            .read_dir(&dir)?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        Ok(json!({ "files": files }))
    }
}
