//! Argument checking against the small JSON-schema subset tools declare:
//! `required`, per-property `type`, and `enum`.

use serde_json::Value;

pub fn validate(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(object) = args.as_object() else {
        return Err("arguments must be an object".to_string());
    };

    if let Some(required) = schema["required"].as_array() {
        for key in required.iter().filter_map(Value::as_str) {
            if object.get(key).map_or(true, Value::is_null) {
                return Err(format!("missing required argument '{}'", key));
            }
        }
    }

    let Some(properties) = schema["properties"].as_object() else {
        return Ok(());
    };
    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        let Some(property) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = property["type"].as_str() {
            if !type_matches(expected, value) {
                return Err(format!("argument '{}' must be of type {}", key, expected));
            }
        }
        if let Some(options) = property["enum"].as_array() {
            if !options.contains(value) {
                let allowed: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                return Err(format!(
                    "argument '{}' must be one of {}",
                    key,
                    allowed.join(", ")
                ));
            }
        }
    }
    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        // Models often send whole numbers as floats.
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().map_or(false, |f| f.fract() == 0.0)
        }
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "file": { "type": "string" },
                "append": { "type": "boolean" },
                "interval": { "type": "integer" },
                "view": { "type": "string", "enum": ["code", "deploy"] }
            },
            "required": ["file"]
        })
    }

    #[test]
    fn test_accepts_valid_args() {
        assert!(validate(&schema(), &json!({"file": "a.txt", "append": true})).is_ok());
        assert!(validate(&schema(), &json!({"file": "a", "interval": 30.0})).is_ok());
        assert!(validate(&schema(), &json!({"file": "a", "extra": 1})).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let err = validate(&schema(), &json!({"append": true})).unwrap_err();
        assert!(err.contains("'file'"));
        assert!(validate(&schema(), &json!({"file": null})).is_err());
    }

    #[test]
    fn test_wrong_type_and_enum() {
        assert!(validate(&schema(), &json!({"file": 3})).is_err());
        assert!(validate(&schema(), &json!({"file": "a", "interval": 1.5})).is_err());
        assert!(validate(&schema(), &json!({"file": "a", "view": "flow"})).is_err());
        assert!(validate(&schema(), &json!({"file": "a", "view": "code"})).is_ok());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(validate(&schema(), &json!("file")).is_err());
    }
}
