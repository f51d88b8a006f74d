//! QR rasterization for resident identifiers.
//!
//! The payload is the decimal string of the user id, nothing else: the
//! scanning device resolves it against the resident directory, so the
//! image itself carries no personal data.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;

/// Render the decimal form of `user_id` as a PNG QR image.
pub fn encode_user_id(user_id: i32) -> Result<Vec<u8>> {
    let code = QrCode::new(user_id.to_string().as_bytes())
        .context("Failed to encode user id as QR code")?;
    let raster = code.render::<Luma<u8>>().min_dimensions(240, 240).build();

    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(raster)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("Failed to serialize QR image as PNG")?;
    Ok(bytes)
}

/// Deterministic stored filename for a resident's QR image.
pub fn file_name(user_id: i32) -> String {
    format!("user_{user_id}_qr.png")
}
