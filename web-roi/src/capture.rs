//! The capture node: data URL in, image tensor out, never an error.

use crate::config::NodeConfig;
use crate::image::{self, ImageTensor};

/// Why a capture fell back to the placeholder.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no image data")]
    Empty,
    #[error("no ',' separating the data URL header from its payload")]
    MissingSeparator,
    #[error("invalid base64 payload: {0}")]
    Base64(#[source] base64::DecodeError),
    #[error("unreadable image: {0}")]
    Image(#[source] ::image::ImageError),
}

impl CaptureError {
    /// The node has not received anything from the widget yet.
    pub fn is_waiting(&self) -> bool {
        matches!(self, CaptureError::Empty | CaptureError::MissingSeparator)
    }
}

#[derive(Debug)]
pub enum Capture {
    Decoded(ImageTensor),
    Placeholder {
        image: ImageTensor,
        reason: CaptureError,
    },
}

impl Capture {
    pub fn image(&self) -> &ImageTensor {
        match self {
            Capture::Decoded(image) | Capture::Placeholder { image, .. } => image,
        }
    }

    pub fn into_image(self) -> ImageTensor {
        match self {
            Capture::Decoded(image) | Capture::Placeholder { image, .. } => image,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Capture::Placeholder { .. })
    }

    pub fn reason(&self) -> Option<&CaptureError> {
        match self {
            Capture::Decoded(_) => None,
            Capture::Placeholder { reason, .. } => Some(reason),
        }
    }
}

/// Decode `image_data` with the default 512x512 placeholder.
///
/// `trigger` only exists so the host re-runs the node when it changes.
pub fn capture_screen(image_data: &str, trigger: u64) -> Capture {
    capture_screen_with(&NodeConfig::default(), image_data, trigger)
}

pub fn capture_screen_with(config: &NodeConfig, image_data: &str, trigger: u64) -> Capture {
    log::trace!("capture_screen (trigger {trigger})");

    match image::decode::decode(image_data) {
        Ok(img) => Capture::Decoded(ImageTensor::from_image(&img)),
        Err(reason) => {
            if reason.is_waiting() {
                log::warn!("WebROI: Waiting for image data...");
            } else {
                log::error!("WebROI Error: {reason}");
            }

            let (width, height) = config.placeholder_dimensions();
            Capture::Placeholder {
                image: ImageTensor::placeholder(width, height),
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{to_data_url, ImageFormat, PngCompression};
    use ::image::{DynamicImage, Rgb, RgbImage};

    const PNG: ImageFormat = ImageFormat::Png {
        compression: PngCompression::Fast,
    };

    fn assert_placeholder(capture: &Capture) {
        assert!(capture.is_placeholder());
        assert_eq!(capture.image().shape(), [1, 512, 512, 3]);
        assert!(capture.image().is_blank());
    }

    #[test]
    fn empty_input_is_placeholder() {
        let capture = capture_screen("", 0);

        assert_placeholder(&capture);
        assert!(matches!(capture.reason(), Some(CaptureError::Empty)));
    }

    #[test]
    fn missing_comma_is_placeholder() {
        let capture = capture_screen("iVBORw0KGgoAAAANSUhEUgAAAAEAAAAB", 0);

        assert_placeholder(&capture);
        assert!(matches!(
            capture.reason(),
            Some(CaptureError::MissingSeparator)
        ));
    }

    #[test]
    fn corrupted_payload_is_placeholder() {
        let capture = capture_screen("data:image/png;base64,@@@@", 0);

        assert_placeholder(&capture);
        assert!(!capture.reason().unwrap().is_waiting());
    }

    #[test]
    fn truncated_png_is_placeholder() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])));
        let url = to_data_url(&img, PNG).unwrap();
        // Cut mid-stream, on a base64 quantum boundary so only the image decode fails.
        let cut = "data:image/png;base64,".len() + 40;

        let capture = capture_screen(&url[..cut], 0);

        assert_placeholder(&capture);
        assert!(matches!(capture.reason(), Some(CaptureError::Image(_))));
    }

    #[test]
    fn decodes_png_to_height_width_channels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 9, Rgb([255, 0, 128])));
        let url = to_data_url(&img, PNG).unwrap();

        let capture = capture_screen(&url, 0);

        assert!(!capture.is_placeholder());
        assert_eq!(capture.image().shape(), [1, 9, 5, 3]);
        assert_eq!(capture.image().as_array()[[0, 4, 2, 0]], 1.0);
        assert_eq!(capture.image().as_array()[[0, 4, 2, 1]], 0.0);
    }

    #[test]
    fn trigger_does_not_change_output() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([40, 80, 120])));
        let url = to_data_url(&img, PNG).unwrap();

        let a = capture_screen(&url, 0).into_image();
        let b = capture_screen(&url, u64::MAX).into_image();

        assert_eq!(a, b);
        assert_eq!(
            capture_screen("", 1).into_image(),
            capture_screen("", 0).into_image()
        );
    }

    #[test]
    fn configured_placeholder_size() {
        let config = NodeConfig {
            placeholder_width: 64,
            placeholder_height: 32,
        };

        let capture = capture_screen_with(&config, "nope", 0);

        assert_eq!(capture.image().shape(), [1, 32, 64, 3]);
    }
}
