use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One piece of a chat turn. Serializes to the `{"text": ..}` /
/// `{"functionCall": ..}` / `{"functionResponse": ..}` wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default = "empty_object")]
    pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Part::FunctionCall(FunctionCall {
            name: name.into(),
            args,
        })
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Part::FunctionResponse(FunctionResponse {
            name: name.into(),
            response,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// The first candidate of a model reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub parts: Vec<Part>,
}

impl ModelResponse {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Part::text(text)])
    }

    pub fn call(name: impl Into<String>, args: Value) -> Self {
        Self::new(vec![Part::function_call(name, args)])
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|part| match part {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    pub fn has_function_calls(&self) -> bool {
        self.function_calls().next().is_some()
    }
}

/// A function the model may call, in function-calling schema form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_wire_shape() {
        let call = Part::function_call("file_read", json!({"file": "/a"}));
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"functionCall": {"name": "file_read", "args": {"file": "/a"}}})
        );
        assert_eq!(serde_json::to_value(Part::text("hi")).unwrap(), json!({"text": "hi"}));
    }

    #[test]
    fn test_call_without_args_defaults_to_empty_object() {
        let part: Part = serde_json::from_value(json!({"functionCall": {"name": "idle"}})).unwrap();
        assert_eq!(part, Part::function_call("idle", json!({})));
    }
}
