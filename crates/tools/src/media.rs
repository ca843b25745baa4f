use crate::traits::{str_arg, Tool, ToolContext, ToolError};
use aussie_os_events::{EventBus, Notifier, SystemEvent};
use aussie_os_policy::Capability;
use aussie_os_vfs::VirtualFileSystem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub const MEDIA_DIR: &str = "/workspace/media";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaService {
    Veo3,
    Imagen4,
}

impl MediaService {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaService::Veo3 => "veo3",
            MediaService::Imagen4 => "imagen4",
        }
    }

    fn file_prefix(&self) -> &'static str {
        match self {
            MediaService::Veo3 => "veo",
            MediaService::Imagen4 => "imagen",
        }
    }
}

impl FromStr for MediaService {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "veo3" => Ok(MediaService::Veo3),
            "imagen4" => Ok(MediaService::Imagen4),
            other => Err(ToolError::Validation(format!("Unknown service '{}'", other))),
        }
    }
}

/// Generated file, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaArtifact {
    pub id: String,
    /// File name inside [`MEDIA_DIR`].
    pub file_name: String,
    pub content: String,
}

#[async_trait]
pub trait MediaGenerator: Send + Sync {
    async fn generate(
        &self,
        service: MediaService,
        prompt: &str,
        params: &Value,
    ) -> Result<MediaArtifact, ToolError>;
}

/// Writes a render request sheet instead of calling a model; the sheet can
/// be picked up by a real renderer later.
#[derive(Default)]
pub struct OfflineMediaGenerator;

#[async_trait]
impl MediaGenerator for OfflineMediaGenerator {
    async fn generate(
        &self,
        service: MediaService,
        prompt: &str,
        params: &Value,
    ) -> Result<MediaArtifact, ToolError> {
        let id = uuid::Uuid::new_v4().simple().to_string()[..9].to_string();
        let content = serde_json::to_string_pretty(&json!({
            "service": service.as_str(),
            "prompt": prompt,
            "params": params,
            "status": "queued",
        }))
        .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok(MediaArtifact {
            file_name: format!("{}_{}.json", service.file_prefix(), id),
            id,
            content,
        })
    }
}

const STUDIO: &str = "Media Studio";

pub struct MediaGenTool {
    generator: Arc<dyn MediaGenerator>,
    vfs: Arc<VirtualFileSystem>,
    bus: EventBus,
    notifier: Notifier,
}

impl MediaGenTool {
    pub fn new(
        generator: Arc<dyn MediaGenerator>,
        vfs: Arc<VirtualFileSystem>,
        bus: EventBus,
        notifier: Notifier,
    ) -> Self {
        Self {
            generator,
            vfs,
            bus,
            notifier,
        }
    }

    fn studio(&self, text: String) {
        self.bus.emit(SystemEvent::AgentMessage {
            agent: STUDIO.to_string(),
            text,
        });
    }
}

#[async_trait]
impl Tool for MediaGenTool {
    fn name(&self) -> &str {
        "media_gen"
    }

    fn description(&self) -> &str {
        "Generate media."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "service": { "type": "string", "enum": ["veo3", "imagen4"] },
                "prompt": { "type": "string" },
                "params": { "type": "object", "description": "Service specific options" }
            },
            "required": ["service", "prompt"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let service: MediaService = str_arg(&args, "service")?.parse()?;
        let prompt = str_arg(&args, "prompt")?;
        let params = args.get("params").cloned().unwrap_or(Value::Null);

        self.bus.emit(SystemEvent::ShellOutput(format!(
            "[Orchestrator] Requesting {} generation...",
            service.as_str().to_uppercase()
        )));
        self.studio(format!("Generating {} content: \"{}\"...", service.as_str(), prompt));

        let artifact = self.generator.generate(service, prompt, &params).await?;
        let file = format!("{}/{}", MEDIA_DIR, artifact.file_name);
        self.vfs.write_file(&file, &artifact.content, false)?;

        info!("{} artifact written to {}", service.as_str(), file);
        self.studio(format!("Generation complete. Saved to {}", file));
        let preview: String = prompt.chars().take(30).collect();
        self.notifier.success(
            "Media Generated",
            &format!("{} finished: {}...", service.as_str(), preview),
        );

        Ok(json!({
            "status": "success",
            "file": file,
            "metadata": { "prompt": prompt, "service": service.as_str(), "id": artifact.id },
        }))
    }
}
