use crate::config::InferenceConfig;
use flow_vision::flow::message::Message;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Built-in fallbacks of a node type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParamDefaults {
    pub score_threshold: Option<f32>,
    pub max_detections: Option<usize>,
}

/// Parameters one inference call actually runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EffectiveParams {
    /// `None` means no threshold filtering at all
    pub score_threshold: Option<f32>,
    pub max_detections: Option<usize>,
}

/// First value present wins: request, then node config, then the default.
pub fn resolve<T: Copy>(request: Option<T>, node: Option<T>, default: Option<T>) -> Option<T> {
    request.or(node).or(default)
}

impl EffectiveParams {
    /// Threshold and count are resolved independently of each other.
    pub fn resolve(message: &Message, config: &InferenceConfig, defaults: ParamDefaults) -> Self {
        EffectiveParams {
            score_threshold: resolve(
                message.score_threshold,
                config.score_threshold,
                defaults.score_threshold,
            ),
            max_detections: resolve(
                message.max_detections,
                config.max_detections,
                defaults.max_detections,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETECTOR: ParamDefaults = ParamDefaults {
        score_threshold: Some(0.5),
        max_detections: Some(20),
    };

    #[test]
    fn resolution_order() {
        assert_eq!(resolve(Some(1), Some(2), Some(3)), Some(1));
        assert_eq!(resolve(None, Some(2), Some(3)), Some(2));
        assert_eq!(resolve(None, None, Some(3)), Some(3));
        assert_eq!(resolve::<u8>(None, None, None), None);
    }

    #[test]
    fn falls_back_to_variant_defaults() {
        let params =
            EffectiveParams::resolve(&Message::default(), &InferenceConfig::default(), DETECTOR);
        assert_eq!(params.score_threshold, Some(0.5));
        assert_eq!(params.max_detections, Some(20));
    }

    #[test]
    fn threshold_and_count_resolve_independently() {
        let config = InferenceConfig {
            score_threshold: Some(0.3),
            ..Default::default()
        };
        let message = Message::default().with_max_detections(5);

        let params = EffectiveParams::resolve(&message, &config, DETECTOR);
        assert_eq!(params.score_threshold, Some(0.3));
        assert_eq!(params.max_detections, Some(5));
    }

    #[test]
    fn message_beats_node_config() {
        let config = InferenceConfig {
            score_threshold: Some(0.3),
            max_detections: Some(8),
            ..Default::default()
        };
        let message = Message::default()
            .with_score_threshold(0.9)
            .with_max_detections(2);

        let params = EffectiveParams::resolve(&message, &config, DETECTOR);
        assert_eq!(params.score_threshold, Some(0.9));
        assert_eq!(params.max_detections, Some(2));
    }

    #[test]
    fn explicit_zero_is_an_override() {
        let config = InferenceConfig {
            score_threshold: Some(0.3),
            ..Default::default()
        };
        let message = Message::default().with_score_threshold(0.0);
        let params = EffectiveParams::resolve(&message, &config, DETECTOR);
        assert_eq!(params.score_threshold, Some(0.0));
    }

    #[test]
    fn classifier_has_no_default_threshold() {
        let defaults = ParamDefaults {
            score_threshold: None,
            max_detections: Some(3),
        };
        let params =
            EffectiveParams::resolve(&Message::default(), &InferenceConfig::default(), defaults);
        assert_eq!(params.score_threshold, None);
    }
}
