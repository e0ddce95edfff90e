use flow_vision::utils::serde_helpers::{deserialize_lenient_f32, deserialize_lenient_usize};
use flow_vision::NodeError;
use flow_vision_types::{
    Value,
    json::{from_value, to_value},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-instance configuration of a vision node, as the host's editor stores it.
///
/// Key spellings used by older flows are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// Node id assigned by the host; generated when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// URL, path or identifier of the model. Each node type has a default.
    #[serde(default, alias = "modelUrl", alias = "model", skip_serializing_if = "Option::is_none")]
    pub model_source: Option<String>,

    #[serde(
        default,
        alias = "threshold",
        alias = "scoreThreshould",
        deserialize_with = "deserialize_lenient_f32",
        skip_serializing_if = "Option::is_none"
    )]
    pub score_threshold: Option<f32>,

    #[serde(
        default,
        deserialize_with = "deserialize_lenient_usize",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_detections: Option<usize>,
}

impl InferenceConfig {
    pub fn from_json(config: &Value) -> Result<Self, NodeError> {
        if config.is_null() {
            return Ok(Self::default());
        }
        from_value(config.clone()).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Configured model source, ignoring blank strings.
    pub fn model_source(&self) -> Option<&str> {
        self.model_source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// JSON schema of the configuration, for host editors.
    pub fn schema() -> Value {
        to_value(schemars::schema_for!(InferenceConfig)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_vision_types::json::json;

    #[test]
    fn parses_editor_config() {
        let config = InferenceConfig::from_json(&json!({
            "id": "a1b2",
            "type": "tensorflowCocoSsd",
            "name": "front door",
            "modelSource": "https://example.com/model.json",
            "scoreThreshold": "0.6",
            "maxDetections": 10,
        }))
        .unwrap();

        assert_eq!(config.id.as_deref(), Some("a1b2"));
        assert_eq!(config.model_source(), Some("https://example.com/model.json"));
        assert_eq!(config.score_threshold, Some(0.6));
        assert_eq!(config.max_detections, Some(10));
    }

    #[test]
    fn accepts_legacy_keys() {
        let config = InferenceConfig::from_json(&json!({
            "modelUrl": "file:///models/net.onnx",
            "scoreThreshould": 0.3,
        }))
        .unwrap();
        assert_eq!(config.model_source(), Some("file:///models/net.onnx"));
        assert_eq!(config.score_threshold, Some(0.3));

        let config = InferenceConfig::from_json(&json!({"threshold": "0.2"})).unwrap();
        assert_eq!(config.score_threshold, Some(0.2));
    }

    #[test]
    fn blank_fields_are_unset() {
        let config = InferenceConfig::from_json(&json!({
            "modelUrl": "  ",
            "scoreThreshold": "",
            "maxDetections": "",
        }))
        .unwrap();
        assert_eq!(config.model_source(), None);
        assert_eq!(config.score_threshold, None);
        assert_eq!(config.max_detections, None);
    }

    #[test]
    fn null_config_is_default() {
        assert_eq!(
            InferenceConfig::from_json(&Value::Null).unwrap(),
            InferenceConfig::default()
        );
    }

    #[test]
    fn schema_lists_editor_fields() {
        let schema = InferenceConfig::schema();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("modelSource"));
        assert!(properties.contains_key("scoreThreshold"));
        assert!(properties.contains_key("maxDetections"));
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let err = InferenceConfig::from_json(&json!({"maxDetections": "many"})).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }
}
