//! Image tensors: the host's in-memory image representation

pub mod decode;
mod encode;

pub use decode::DataUrl;
pub use encode::{encode, to_data_url, PngCompression};

use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array4;

/// Number of channels in the output tensor.
pub const RGB_CHANNELS: usize = 3;

/// Edge length of the default placeholder image.
pub const PLACEHOLDER_SIZE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ImageFormat {
    Jpeg { quality: u8 },
    Png { compression: PngCompression },
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg { .. } => "image/jpeg",
            ImageFormat::Png { .. } => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg { .. } => "jpg",
            ImageFormat::Png { .. } => "png",
        }
    }
}

impl Default for ImageFormat {
    /// What the capture widget writes: `toDataURL("image/jpeg", 0.7)`.
    fn default() -> Self {
        ImageFormat::Jpeg { quality: 70 }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("expected tensor shape (1, H, W, {RGB_CHANNELS}), got {0:?}")]
pub struct ShapeError(pub Vec<usize>);

/// Batched RGB image, shape `(1, height, width, 3)`, values in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    /// All-zero (black) image.
    pub fn placeholder(width: u32, height: u32) -> Self {
        ImageTensor(Array4::zeros((
            1,
            height as usize,
            width as usize,
            RGB_CHANNELS,
        )))
    }

    /// Converts to RGB, dropping alpha, and scales each channel by `1 / 255`.
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let data = Array4::from_shape_fn(
            (1, height as usize, width as usize, RGB_CHANNELS),
            |(_, y, x, c)| f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0,
        );

        log::trace!("Converted {}x{} image to tensor", width, height);
        ImageTensor(data)
    }

    pub fn from_array(data: Array4<f32>) -> Result<Self, ShapeError> {
        let shape = data.shape();
        if shape[0] != 1 || shape[3] != RGB_CHANNELS {
            return Err(ShapeError(shape.to_vec()));
        }

        Ok(ImageTensor(data))
    }

    pub fn width(&self) -> usize {
        self.0.shape()[2]
    }

    pub fn height(&self) -> usize {
        self.0.shape()[1]
    }

    pub fn shape(&self) -> [usize; 4] {
        [1, self.height(), self.width(), RGB_CHANNELS]
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }

    pub fn into_array(self) -> Array4<f32> {
        self.0
    }

    /// True when every element is zero, i.e. the tensor looks like a placeholder.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    /// Back to 8-bit RGB, for previews. Out-of-range values are clamped.
    pub fn to_rgb_image(&self) -> RgbImage {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

        RgbImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([
                to_u8(self.0[[0, y, x, 0]]),
                to_u8(self.0[[0, y, x, 1]]),
                to_u8(self.0[[0, y, x, 2]]),
            ])
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width() as u32, self.height() as u32)
    }
}
