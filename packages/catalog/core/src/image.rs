//! Turning message payloads into images and model input tensors.
//!
//! Codecs and resampling are delegated to the `image` crate.

use flow_vision::{NodeError, flow::message::Payload};
use flow_vision_types::{
    image::{self, DynamicImage, imageops::FilterType},
    ndarray::Array4,
};
use std::sync::Arc;

/// Image taken from a payload, not decoded yet when it arrived as bytes.
#[derive(Debug, Clone)]
pub enum ImageInput {
    Encoded(Vec<u8>),
    Decoded(Arc<DynamicImage>),
}

impl ImageInput {
    /// Resolve a payload: paths are read from disk, bytes are kept as they
    /// are, decoded images are passed through.
    pub async fn from_payload(payload: &Payload) -> Result<Self, NodeError> {
        match payload {
            Payload::Path(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    NodeError::Decode(format!("failed to read '{}': {}", path.display(), e))
                })?;
                Ok(ImageInput::Encoded(bytes))
            }
            Payload::Bytes(bytes) => Ok(ImageInput::Encoded(bytes.clone())),
            Payload::Image(image) => Ok(ImageInput::Decoded(image.clone())),
            other => Err(NodeError::Decode(format!(
                "expected an image path, bytes or image, got {} payload",
                other.kind()
            ))),
        }
    }

    /// Decode with whatever channel layout the image has.
    pub fn decode(self) -> Result<Arc<DynamicImage>, NodeError> {
        match self {
            ImageInput::Encoded(bytes) => image::load_from_memory(&bytes)
                .map(Arc::new)
                .map_err(NodeError::decode),
            ImageInput::Decoded(image) => Ok(image),
        }
    }
}

/// 8-bit copy of `image` with 1 (luma), 3 (RGB) or 4 (RGBA) channels.
pub fn with_channels(image: &DynamicImage, channels: usize) -> Result<DynamicImage, NodeError> {
    match channels {
        1 => Ok(DynamicImage::ImageLuma8(image.to_luma8())),
        3 => Ok(DynamicImage::ImageRgb8(image.to_rgb8())),
        4 => Ok(DynamicImage::ImageRgba8(image.to_rgba8())),
        other => Err(NodeError::Decode(format!(
            "unsupported channel depth {other}"
        ))),
    }
}

/// `[height, width, channels]` of a decoded image.
pub fn image_shape(image: &DynamicImage) -> Vec<usize> {
    vec![
        image.height() as usize,
        image.width() as usize,
        image.color().channel_count() as usize,
    ]
}

/// Map an 8-bit pixel value from `[0, 255]` to `[-1, 1]`.
#[inline]
pub fn normalize_pixel(value: u8) -> f32 {
    (value as f32 - 127.5) / 127.5
}

/// Build the `[1, h, w, c]` input of a layers model: convert to `c`
/// channels, resize bilinearly to `h x w`, normalize to `[-1, 1]`.
pub fn to_input_tensor(image: &DynamicImage, shape: [usize; 4]) -> Result<Array4<f32>, NodeError> {
    let [batch, height, width, channels] = shape;
    if batch != 1 || height == 0 || width == 0 {
        return Err(NodeError::Decode(format!(
            "unsupported model input shape {shape:?}"
        )));
    }

    let converted = with_channels(image, channels)?;
    let resized = converted.resize_exact(width as u32, height as u32, FilterType::Triangle);
    let data: Vec<f32> = resized
        .as_bytes()
        .iter()
        .copied()
        .map(normalize_pixel)
        .collect();

    Array4::from_shape_vec((1, height, width, channels), data).map_err(NodeError::decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_vision_types::image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn normalization_bounds() {
        assert_eq!(normalize_pixel(0), -1.0);
        assert_eq!(normalize_pixel(255), 1.0);
        assert!(normalize_pixel(128).abs() < 0.01);
    }

    #[test]
    fn decodes_png_bytes() {
        let img = RgbImage::from_pixel(4, 2, Rgb([10, 20, 30]));
        let decoded = ImageInput::Encoded(png_bytes(&img)).decode().unwrap();
        assert_eq!(image_shape(&decoded), vec![2, 4, 3]);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let err = ImageInput::Encoded(vec![0, 1, 2, 3]).decode().unwrap_err();
        assert!(matches!(err, NodeError::Decode(_)));
    }

    #[test]
    fn channel_conversion() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 0, 0])));
        assert_eq!(with_channels(&img, 1).unwrap().color().channel_count(), 1);
        assert_eq!(with_channels(&img, 4).unwrap().color().channel_count(), 4);
        assert!(with_channels(&img, 2).is_err());
    }

    #[test]
    fn input_tensor_is_resized_and_normalized() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([255, 0, 255])));
        let tensor = to_input_tensor(&img, [1, 3, 4, 3]).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 4, 3]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 2, 3, 1]], -1.0);
        assert_eq!(tensor[[0, 1, 1, 2]], 1.0);
    }

    #[test]
    fn rejects_batched_shapes() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        assert!(to_input_tensor(&img, [4, 2, 2, 3]).is_err());
    }

    #[tokio::test]
    async fn payload_resolution() {
        let img = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let bytes = png_bytes(&img);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        std::fs::write(&path, &bytes).unwrap();

        let from_path = ImageInput::from_payload(&Payload::Path(path)).await.unwrap();
        let from_bytes = ImageInput::from_payload(&Payload::Bytes(bytes)).await.unwrap();
        assert_eq!(
            from_path.decode().unwrap().as_bytes(),
            from_bytes.decode().unwrap().as_bytes()
        );

        let missing = ImageInput::from_payload(&Payload::Path("/nope/frame.png".into())).await;
        assert!(matches!(missing, Err(NodeError::Decode(_))));

        let empty = ImageInput::from_payload(&Payload::Empty).await;
        assert!(matches!(empty, Err(NodeError::Decode(_))));
    }
}
