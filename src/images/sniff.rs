//! Image header inspection
//!
//! Reads format and pixel dimensions from the image header without
//! decoding the image.

use imagesize::ImageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub format: &'static str,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Recognized image header, or `None` for anything that is not an image
pub fn sniff(bytes: &[u8]) -> Option<ImageHeader> {
    let format = match imagesize::image_type(bytes).ok()? {
        ImageType::Png => "png",
        ImageType::Jpeg => "jpg",
        ImageType::Gif => "gif",
        ImageType::Webp => "webp",
        ImageType::Bmp => "bmp",
        ImageType::Tiff => "tiff",
        _ => return None,
    };

    // A truncated header still identifies the format
    let size = imagesize::blob_size(bytes).ok();
    Some(ImageHeader {
        format,
        width: size.and_then(|s| u32::try_from(s.width).ok()),
        height: size.and_then(|s| u32::try_from(s.height).ok()),
    })
}

/// File extension for a sniffed format
pub fn extension(format: &str) -> &str {
    match format {
        "jpeg" => "jpg",
        other => other,
    }
}
