use crate::utils::serde_helpers::{deserialize_lenient_f32, deserialize_lenient_usize};
use flow_vision_types::{
    Value, create_id,
    image::DynamicImage,
    json::{DeserializeOwned, Map, from_value},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

/// Message payload.
///
/// Inbound it carries the image, outbound the inference result. A JSON string
/// is read as a file path, the same way the host passes file names around.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(untagged)]
pub enum Payload {
    #[default]
    Empty,
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// Already decoded image, only available in-process.
    #[serde(skip)]
    Image(Arc<DynamicImage>),
    Json(Value),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Path(_) => "path",
            Payload::Bytes(_) => "bytes",
            Payload::Image(_) => "image",
            Payload::Json(_) => "json",
        }
    }
}

impl From<DynamicImage> for Payload {
    fn from(image: DynamicImage) -> Self {
        Payload::Image(Arc::new(image))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<PathBuf> for Payload {
    fn from(path: PathBuf) -> Self {
        Payload::Path(path)
    }
}

/// The object passed from node to node.
///
/// Fields the vision nodes do not know about are kept in `extra` and written
/// back untouched, so upstream properties survive the trip through a node.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_msgid", default = "create_id")]
    pub id: String,

    #[serde(default)]
    pub payload: Payload,

    /// Per-message threshold override
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_f32"
    )]
    pub score_threshold: Option<f32>,

    /// Per-message max-detections override
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_usize"
    )]
    pub max_detections: Option<usize>,

    /// Shape of the input tensor the result was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,

    /// Class label to occurrence count over the filtered result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<BTreeMap<String, usize>>,

    /// Arg-max of the raw output vector (generic predictor only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_index: Option<usize>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Message {
    fn default() -> Self {
        Self::new(Payload::Empty)
    }
}

impl Message {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Message {
            id: create_id(),
            payload: payload.into(),
            score_threshold: None,
            max_detections: None,
            shape: None,
            classes: None,
            max_index: None,
            extra: Map::new(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(Payload::Path(path.into()))
    }

    pub fn with_score_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    pub fn with_max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = Some(max_detections);
        self
    }

    /// Replace the payload with a JSON result
    pub fn set_result(&mut self, value: Value) {
        self.payload = Payload::Json(value);
    }

    /// Read the JSON payload back into a typed result
    pub fn payload_as<T: DeserializeOwned>(&self) -> flow_vision_types::Result<T> {
        match &self.payload {
            Payload::Json(value) => Ok(from_value(value.clone())?),
            other => Err(flow_vision_types::anyhow!(
                "Expected a JSON payload, found {}",
                other.kind()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_vision_types::json::{from_value, json, to_value};

    #[test]
    fn string_payload_is_a_path() {
        let msg: Message = from_value(json!({"payload": "/tmp/cat.jpg"})).unwrap();
        match msg.payload {
            Payload::Path(p) => assert_eq!(p, PathBuf::from("/tmp/cat.jpg")),
            other => panic!("unexpected payload {other:?}"),
        }
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn overrides_accept_strings() {
        let msg: Message = from_value(json!({
            "_msgid": "abc",
            "payload": "/tmp/cat.jpg",
            "scoreThreshold": "0.7",
            "maxDetections": "5",
        }))
        .unwrap();
        assert_eq!(msg.id, "abc");
        assert_eq!(msg.score_threshold, Some(0.7));
        assert_eq!(msg.max_detections, Some(5));
    }

    #[test]
    fn unknown_fields_survive() {
        let msg: Message = from_value(json!({
            "_msgid": "abc",
            "payload": "/tmp/cat.jpg",
            "topic": "camera/front",
            "meta": {"frame": 12},
        }))
        .unwrap();
        assert_eq!(msg.extra.get("topic"), Some(&json!("camera/front")));

        let value = to_value(&msg).unwrap();
        assert_eq!(value["topic"], json!("camera/front"));
        assert_eq!(value["meta"]["frame"], json!(12));
        assert!(value.get("classes").is_none());
    }

    #[test]
    fn result_fields_serialize_camel_case() {
        let mut msg = Message::from_path("/tmp/x.png");
        msg.set_result(json!([0.1, 0.7, 0.2]));
        msg.max_index = Some(1);
        msg.shape = Some(vec![1, 224, 224, 3]);

        let value = to_value(&msg).unwrap();
        assert_eq!(value["maxIndex"], json!(1));
        assert_eq!(value["shape"], json!([1, 224, 224, 3]));
        assert_eq!(value["payload"], json!([0.1, 0.7, 0.2]));

        let scores: Vec<f32> = msg.payload_as().unwrap();
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn payload_as_rejects_non_json() {
        let msg = Message::new(vec![1u8, 2, 3]);
        assert!(msg.payload_as::<Vec<f32>>().is_err());
    }
}
