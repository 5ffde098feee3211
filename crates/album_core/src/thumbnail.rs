//! Thumbnail decoding with placeholder substitution.

const MAX_THUMBNAIL_DIMENSION: u32 = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    Decoded(PreviewImage),
    /// Stands in for a payload that was fetched but could not be decoded.
    Placeholder,
}

impl Thumbnail {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match decode(bytes) {
            Some(image) => Self::Decoded(image),
            None => Self::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

/// Decodes and downsizes an image payload. `None` means the payload is not a
/// readable image.
pub fn decode(bytes: &[u8]) -> Option<PreviewImage> {
    let dynamic = match image::load_from_memory(bytes) {
        Ok(dynamic) => dynamic,
        Err(err) => {
            tracing::warn!(error = %err, bytes = bytes.len(), "thumbnail decode failed; using placeholder");
            return None;
        }
    };
    let resized = dynamic
        .thumbnail(MAX_THUMBNAIL_DIMENSION, MAX_THUMBNAIL_DIMENSION)
        .to_rgba8();
    Some(PreviewImage {
        width: resized.width() as usize,
        height: resized.height() as usize,
        rgba: resized.into_raw(),
    })
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    use std::io::Cursor;

    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}
