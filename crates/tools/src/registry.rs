use crate::schema;
use crate::traits::{Tool, ToolContext, ToolError, ToolResult};
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_policy::{KernelPermissions, PermissionEngine, PermissionResult};
use aussie_os_providers::ToolDeclaration;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name-keyed dispatch table. Every call goes lookup, argument validation,
/// permission check, then the handler.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    permissions: RwLock<PermissionEngine>,
    bus: EventBus,
}

impl ToolRegistry {
    pub fn new(bus: EventBus, permissions: KernelPermissions) -> Self {
        Self {
            tools: HashMap::new(),
            permissions: RwLock::new(PermissionEngine::new(permissions)),
            bus,
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Function declarations for the model, sorted by name.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.list()
            .into_iter()
            .filter_map(|name| self.tools.get(&name))
            .map(|tool| ToolDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.schema(),
            })
            .collect()
    }

    pub fn permissions(&self) -> KernelPermissions {
        self.permissions.read().permissions().clone()
    }

    pub fn set_permissions(&self, permissions: KernelPermissions) {
        info!("Kernel permissions changed: {:?}", permissions);
        self.permissions.write().set_permissions(permissions);
        self.bus.emit(SystemEvent::PermissionsChanged);
    }

    /// Run one tool call. Never fails: every error is folded into the
    /// returned [`ToolResult`].
    pub async fn dispatch(&self, ctx: &mut ToolContext, name: &str, args: Value) -> ToolResult {
        match self.try_dispatch(ctx, name, args).await {
            Ok(output) => ToolResult::ok(output),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolResult::failure(e.to_string())
            }
        }
    }

    async fn try_dispatch(
        &self,
        ctx: &mut ToolContext,
        name: &str,
        args: Value,
    ) -> Result<Value, ToolError> {
        info!("Dispatching tool: {}", name);

        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        // A call without arguments arrives as null.
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        schema::validate(&tool.schema(), &args).map_err(ToolError::Validation)?;

        let decision = self.permissions.read().check(tool.capability());
        if let PermissionResult::Denied(reason) = decision {
            return Err(ToolError::PermissionDenied(reason));
        }

        let output = tool.execute(ctx, args).await?;
        debug!("Tool {} finished", name);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aussie_os_policy::Capability;
    use async_trait::async_trait;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo back the input message"
        }

        fn schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            })
        }

        fn capability(&self) -> Capability {
            Capability::Shell
        }

        async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
            Ok(json!({ "message": args["message"] }))
        }
    }

    fn registry(permissions: KernelPermissions) -> ToolRegistry {
        let mut registry = ToolRegistry::new(EventBus::new(), permissions);
        registry.register(Arc::new(Echo));
        registry
    }

    #[tokio::test]
    async fn test_dispatch_ok() {
        let registry = registry(KernelPermissions::default());
        let result = registry
            .dispatch(&mut ToolContext::new(), "echo", json!({"message": "hi"}))
            .await;
        assert_eq!(result.into_response(), json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = registry(KernelPermissions::default());
        let result = registry
            .dispatch(&mut ToolContext::new(), "nope", json!({}))
            .await;
        assert_eq!(result.into_response(), json!({"error": "Tool nope not found."}));
    }

    #[tokio::test]
    async fn test_invalid_args_rejected() {
        let registry = registry(KernelPermissions::default());
        let result = registry
            .dispatch(&mut ToolContext::new(), "echo", Value::Null)
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Validation error"));
    }

    #[tokio::test]
    async fn test_permission_gate() {
        let registry = registry(KernelPermissions::sandboxed());
        let result = registry
            .dispatch(&mut ToolContext::new(), "echo", json!({"message": "hi"}))
            .await;
        assert_eq!(
            result.error.as_deref(),
            Some("Permission denied: Shell access denied")
        );

        registry.set_permissions(KernelPermissions::default());
        let result = registry
            .dispatch(&mut ToolContext::new(), "echo", json!({"message": "hi"}))
            .await;
        assert!(result.success);
    }

    #[test]
    fn test_declarations_sorted() {
        let registry = registry(KernelPermissions::default());
        let declarations = registry.declarations();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "echo");
        assert_eq!(declarations[0].parameters["required"], json!(["message"]));
    }
}
