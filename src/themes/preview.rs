use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::validation::MAX_PREVIEW_SIZE;
use crate::error::{Error, Result};

/// What the header of an accepted preview upload says about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewInfo {
    pub width: u32,
    pub height: u32,
    pub mime_type: &'static str,
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn accepted_mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Width and height from the IHDR chunk, which must directly follow the signature.
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // signature, chunk length, chunk type, 13 bytes of IHDR data, CRC
    if data.len() < 33 || !data.starts_with(PNG_SIGNATURE) {
        return None;
    }
    if be_u32(data, 8)? != 13 || data.get(12..16)? != b"IHDR" {
        return None;
    }
    Some((be_u32(data, 16)?, be_u32(data, 20)?))
}

/// Walks the marker segments up to the first start-of-frame.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    loop {
        if *data.get(pos)? != 0xFF {
            return None;
        }
        while *data.get(pos)? == 0xFF {
            pos += 1;
        }
        let marker = *data.get(pos)?;
        pos += 1;

        match marker {
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            // DHT, JPG and DAC share the SOFn range without being frames
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be_u16(data, pos + 3)?;
                let width = be_u16(data, pos + 5)?;
                return Some((u32::from(width), u32::from(height)));
            }
            _ => {
                let len = usize::from(be_u16(data, pos)?);
                if len < 2 {
                    return None;
                }
                pos += len;
            }
        }
    }
}

fn webp_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    ImageReader::with_format(Cursor::new(data), ImageFormat::WebP)
        .into_dimensions()
        .inspect_err(|e| tracing::debug!("Undecodable WEBP preview header: {e}"))
        .ok()
}

/// Checks an uploaded preview's size and format, reading only as much of the
/// image as its header needs. Pixel data is never decoded, so an image cut
/// off after its header still passes.
pub fn inspect_preview(data: &[u8]) -> Result<PreviewInfo> {
    if data.len() > MAX_PREVIEW_SIZE {
        return Err(Error::invalid(format!(
            "Preview image cannot exceed {} KiB",
            MAX_PREVIEW_SIZE / 1024
        )));
    }

    let format = image::guess_format(data).ok();
    let mime_type = format
        .and_then(accepted_mime_type)
        .ok_or_else(|| Error::invalid("Preview image must be PNG, JPEG or WEBP"))?;

    let dimensions = match format {
        Some(ImageFormat::Png) => png_dimensions(data),
        Some(ImageFormat::Jpeg) => jpeg_dimensions(data),
        _ => webp_dimensions(data),
    };

    match dimensions {
        Some((width, height)) if width > 0 && height > 0 => Ok(PreviewInfo {
            width,
            height,
            mime_type,
        }),
        _ => Err(Error::invalid("Preview image could not be decoded")),
    }
}
