use std::io::Cursor;

use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

/// Pixel size of a single QR module.
const MODULE_PIXELS: u32 = 10;

#[derive(Debug, Error)]
pub enum QrRenderError {
    #[error("payload does not fit in a QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("failed to encode PNG: {0}")]
    Image(#[from] image::ImageError),
}

/// Renders `payload` as a black-on-white PNG with the standard quiet zone.
pub fn render_png(payload: &str) -> Result<Vec<u8>, QrRenderError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)?;
    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .quiet_zone(true)
        .build();

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_png_produces_square_png() {
        let bytes = render_png("TICKET:0123456789ABCDEF").unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), decoded.height());
        assert_eq!(decoded.width() % MODULE_PIXELS, 0);
    }

    #[test]
    fn test_render_png_is_deterministic() {
        let first = render_png("TICKET:AAAAAAAAAAAAAAAA").unwrap();
        let second = render_png("TICKET:AAAAAAAAAAAAAAAA").unwrap();
        assert_eq!(first, second);
    }
}
