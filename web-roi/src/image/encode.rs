//! Image encoding: JPEG, PNG and data URLs

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ColorType, DynamicImage, GenericImageView};

use super::ImageFormat;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PngCompression {
    Fast,
    Default,
    Best,
}

/// Compress an image to JPEG format with the specified quality
fn compress_to_jpeg<W>(img: &DynamicImage, writer: &mut W, quality: u8) -> Result<()>
where
    W: std::io::Write,
{
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));

    encoder
        .encode_image(&rgb)
        .with_context(|| "Failed to compress image to JPEG")?;

    Ok(())
}

/// Compress an image to PNG format with the specified compression level
fn compress_to_png<W>(img: &DynamicImage, writer: &mut W, compression: PngCompression) -> Result<()>
where
    W: std::io::Write,
{
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::ImageEncoder;

    let compression_type = match compression {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    };

    let is_grayscale = img.color() == ColorType::L8 || img.color() == ColorType::La8;

    let encoder = PngEncoder::new_with_quality(
        writer,
        compression_type,
        if is_grayscale {
            FilterType::NoFilter
        } else {
            FilterType::Adaptive
        },
    );

    encoder
        .write_image(
            img.as_bytes(),
            img.width(),
            img.height(),
            img.color().into(),
        )
        .with_context(|| "Failed to compress image to PNG")?;

    Ok(())
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut buffer = Vec::with_capacity((width * height) as usize);

    match format {
        ImageFormat::Jpeg { quality } => compress_to_jpeg(img, &mut buffer, quality)?,
        ImageFormat::Png { compression } => compress_to_png(img, &mut buffer, compression)?,
    }

    log::trace!("Encoded {width}x{height} image to {} bytes", buffer.len());
    Ok(buffer)
}

/// Encode as `data:<mime>;base64,<payload>`, the string the capture widget
/// writes into the node's `image_data` input.
pub fn to_data_url(img: &DynamicImage, format: ImageFormat) -> Result<String> {
    let bytes = encode(img, format)?;
    Ok(format!(
        "data:{};base64,{}",
        format.mime_type(),
        STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn png_data_url_header() {
        let img = DynamicImage::new_rgb8(2, 2);
        let url = to_data_url(
            &img,
            ImageFormat::Png {
                compression: PngCompression::Fast,
            },
        )
        .unwrap();

        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn jpeg_drops_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 128])));
        let bytes = encode(&img, ImageFormat::default()).unwrap();

        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }
}
