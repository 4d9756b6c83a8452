//! Asset codec – decoding, re-encoding and data-URI embedding of uploaded
//! images (passport photo, organisation logo).
//!
//! Uploads are judged by content, not by their declared type: [`decode`]
//! runs a full decode with the `image` crate and only PNG and JPEG decoders
//! are compiled in.

use std::fmt;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Accepted image encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "image/jpeg", alias = "image/jpg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl MimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::Jpeg => "image/jpeg",
            MimeType::Png => "image/png",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            MimeType::Jpeg => ImageFormat::Jpeg,
            MimeType::Png => ImageFormat::Png,
        }
    }

    /// Sniff the type from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(MimeType::Jpeg),
            ImageFormat::Png => Some(MimeType::Png),
            _ => None,
        }
    }
}

impl FromStr for MimeType {
    type Err = AssetError;

    /// Browsers report `image/jpg` as often as `image/jpeg`; both are JPEG.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "jpeg" | "jpg" => Ok(MimeType::Jpeg),
            "image/png" | "png" => Ok(MimeType::Png),
            _ => Err(AssetError::WrongType(s.to_string())),
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An accepted image asset: raw bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    bytes: Vec<u8>,
    mime: MimeType,
}

impl Asset {
    pub fn new(bytes: Vec<u8>, mime: MimeType) -> Self {
        Self { bytes, mime }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> MimeType {
        self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn decode(&self) -> Result<DynamicImage, AssetError> {
        decode(&self.bytes)
    }

    pub fn data_uri(&self) -> String {
        embed_data_uri(&self.bytes, self.mime)
    }

    /// Read an image file, taking its MIME type from the content.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        if bytes.is_empty() {
            return Err(AssetError::Empty);
        }
        let mime = MimeType::sniff(&bytes)
            .ok_or_else(|| AssetError::WrongType(path.display().to_string()))?;
        Ok(Self::new(bytes, mime))
    }

    /// Like [`Asset::read_file`], but a missing or empty file is `None`.
    pub fn read_optional(path: impl AsRef<Path>) -> Result<Option<Self>, AssetError> {
        let path = path.as_ref();
        match Self::read_file(path) {
            Ok(asset) => Ok(Some(asset)),
            Err(AssetError::Empty) => {
                log::warn!("Ignoring empty asset file '{}'", path.display());
                Ok(None)
            }
            Err(AssetError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No asset at '{}'", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Fully decode `bytes` into pixels.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, AssetError> {
    if bytes.is_empty() {
        return Err(AssetError::Empty);
    }
    image::load_from_memory(bytes).map_err(|e| AssetError::NotDecodable(e.to_string()))
}

/// Encode pixels as `mime`. JPEG has no alpha channel, so the image is
/// flattened to RGB first.
pub fn encode(img: &DynamicImage, mime: MimeType) -> Result<Vec<u8>, AssetError> {
    let mut out = Cursor::new(Vec::new());
    let result = match mime {
        MimeType::Png => img.write_to(&mut out, ImageFormat::Png),
        MimeType::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg),
    };
    result.map_err(|e| AssetError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// `data:<mime>;base64,<payload>` for inline markup.
pub fn embed_data_uri(bytes: &[u8], mime: MimeType) -> String {
    format!("data:{};base64,{}", mime.as_str(), BASE64_STD.encode(bytes))
}

/// Parse a `data:<mime>;base64,<data>` URI back into its type and bytes.
pub fn parse_data_uri(src: &str) -> Result<(MimeType, Vec<u8>), AssetError> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(40).collect();
        AssetError::InvalidDataUri(format!("expected `data:` prefix, got {preview:?}"))
    })?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        AssetError::InvalidDataUri("missing `,` between header and data".to_string())
    })?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| AssetError::InvalidDataUri("only base64 payloads are supported".to_string()))?;
    let mime = mime.parse::<MimeType>()?;
    let bytes = BASE64_STD
        .decode(payload.trim())
        .map_err(|e| AssetError::InvalidDataUri(format!("base64: {e}")))?;
    Ok((mime, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn tiny_png() -> Vec<u8> {
        let img = RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8 * 60, y as u8 * 80, 200]));
        encode(&DynamicImage::ImageRgb8(img), MimeType::Png).unwrap()
    }

    #[test]
    fn mime_aliases() {
        assert_eq!("image/jpg".parse::<MimeType>().unwrap(), MimeType::Jpeg);
        assert_eq!("IMAGE/PNG".parse::<MimeType>().unwrap(), MimeType::Png);
        assert!(matches!(
            "image/gif".parse::<MimeType>(),
            Err(AssetError::WrongType(_))
        ));
    }

    #[test]
    fn decode_rejects_empty_and_garbage() {
        assert!(matches!(decode(&[]), Err(AssetError::Empty)));
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(AssetError::NotDecodable(_))
        ));
    }

    #[test]
    fn decode_rejects_truncated_png() {
        let png = tiny_png();
        let truncated = &png[..png.len() / 2];
        assert!(matches!(decode(truncated), Err(AssetError::NotDecodable(_))));
    }

    #[test]
    fn sniff_ignores_declared_type() {
        assert_eq!(MimeType::sniff(&tiny_png()), Some(MimeType::Png));
        assert_eq!(MimeType::sniff(b"GIF89a...."), None);
    }

    #[test]
    fn jpeg_encode_flattens_alpha() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(8, 8));
        let jpeg = encode(&rgba, MimeType::Jpeg).unwrap();
        assert_eq!(MimeType::sniff(&jpeg), Some(MimeType::Jpeg));
    }

    #[test]
    fn data_uri_roundtrip() {
        let png = tiny_png();
        let uri = embed_data_uri(&png, MimeType::Png);
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = parse_data_uri(&uri).unwrap();
        assert_eq!(mime, MimeType::Png);
        assert_eq!(bytes, png);
    }

    #[test]
    fn parse_data_uri_errors() {
        assert!(parse_data_uri("photo.png").is_err());
        assert!(parse_data_uri("data:image/png;base64").is_err());
        assert!(parse_data_uri("data:image/png,abc").is_err());
    }

    #[test]
    fn read_optional_missing_file_is_none() {
        let missing = std::env::temp_dir().join("idcard-forge-no-such-logo.png");
        assert!(Asset::read_optional(&missing).unwrap().is_none());
    }
}
