pub mod class_prediction;
pub mod detected_object;
pub mod pose;

/// Result element carrying a confidence score.
pub trait Scored {
    fn score(&self) -> f32;
}

/// Result element that can be counted per class.
pub trait Labeled {
    fn label(&self) -> String;
}
