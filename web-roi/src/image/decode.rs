//! Data URL decoding: `<header>,<base64 payload>` to an image

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{load_from_memory, DynamicImage};

use crate::capture::CaptureError;

/// A data URL split at its first comma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUrl<'a> {
    header: &'a str,
    payload: &'a str,
}

impl<'a> DataUrl<'a> {
    pub fn parse(input: &'a str) -> Result<Self, CaptureError> {
        if input.is_empty() {
            return Err(CaptureError::Empty);
        }

        let (header, payload) = input
            .split_once(',')
            .ok_or(CaptureError::MissingSeparator)?;

        Ok(DataUrl { header, payload })
    }

    pub fn header(&self) -> &'a str {
        self.header
    }

    pub fn payload(&self) -> &'a str {
        self.payload
    }

    /// Media type from a `data:<type>[;params]` header, if present.
    ///
    /// Informational only: the payload format is sniffed from the decoded bytes.
    pub fn media_type(&self) -> Option<&'a str> {
        let rest = self.header.trim().strip_prefix("data:")?;
        let media_type = rest.split(';').next()?.trim();
        (!media_type.is_empty()).then_some(media_type)
    }

    /// Decodes the payload. ASCII whitespace (line breaks from a multiline
    /// widget) is ignored.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, CaptureError> {
        let decoded = if self.payload.bytes().any(|b| b.is_ascii_whitespace()) {
            let compact: Vec<u8> = self
                .payload
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD.decode(compact)
        } else {
            STANDARD.decode(self.payload)
        };

        decoded.map_err(CaptureError::Base64)
    }
}

/// Full string-to-image path.
pub fn decode(input: &str) -> Result<DynamicImage, CaptureError> {
    let url = DataUrl::parse(input)?;
    let bytes = url.decode_bytes()?;

    log::debug!(
        "Decoded {} payload bytes (declared type: {})",
        bytes.len(),
        url.media_type().unwrap_or("unknown")
    );

    load_from_memory(&bytes).map_err(CaptureError::Image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_comma() {
        let url = DataUrl::parse("data:image/png;base64,QUJD,REVG").unwrap();

        assert_eq!(url.header(), "data:image/png;base64");
        assert_eq!(url.payload(), "QUJD,REVG");
    }

    #[test]
    fn empty_and_missing_separator() {
        assert!(matches!(DataUrl::parse(""), Err(CaptureError::Empty)));
        assert!(matches!(
            DataUrl::parse("data:image/png;base64"),
            Err(CaptureError::MissingSeparator)
        ));
    }

    #[test]
    fn media_type_from_header() {
        let url = DataUrl::parse("data:image/jpeg;base64,").unwrap();
        assert_eq!(url.media_type(), Some("image/jpeg"));

        let url = DataUrl::parse("whatever,QUJD").unwrap();
        assert_eq!(url.media_type(), None);

        let url = DataUrl::parse("data:;base64,QUJD").unwrap();
        assert_eq!(url.media_type(), None);
    }

    #[test]
    fn payload_whitespace_is_ignored() {
        let url = DataUrl::parse("data:text/plain;base64,QUJD\r\nREVG\n").unwrap();
        assert_eq!(url.decode_bytes().unwrap(), b"ABCDEF");
    }

    #[test]
    fn invalid_base64() {
        let url = DataUrl::parse("data:image/png;base64,not*base64!").unwrap();
        assert!(matches!(url.decode_bytes(), Err(CaptureError::Base64(_))));
    }

    #[test]
    fn valid_base64_but_not_an_image() {
        // "hello world"
        let err = decode("data:image/png;base64,aGVsbG8gd29ybGQ=").unwrap_err();
        assert!(matches!(err, CaptureError::Image(_)));
    }
}
