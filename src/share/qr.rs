//! QR code rendering for share links.

use qrcode::render::svg::Color;
use qrcode::QrCode;

use crate::{QuickShareError, Result};

/// Minimum rendered size in pixels.
const QR_MIN_DIMENSION: u32 = 160;

/// Render `data` as an SVG QR code.
pub fn render_qr_svg(data: &str) -> Result<String> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| QuickShareError::Validation(format!("cannot encode QR code: {e}")))?;

    Ok(code
        .render::<Color>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .quiet_zone(true)
        .dark_color(Color("#000000"))
        .light_color(Color("#ffffff"))
        .build())
}
