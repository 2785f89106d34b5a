//! QR code rendering for download links.

use qrcode::QrCode;
use qrcode::render::svg;
use tracing::warn;

/// Minimum rendered edge, in pixels.
pub const QR_SIZE: u32 = 220;

/// Render `data` as an inline SVG QR code with a quiet zone.
///
/// Returns `None` when the data does not fit in a QR code.
pub fn render_svg(data: &str) -> Option<String> {
    QrCode::new(data.as_bytes())
        .map(|code| {
            code.render::<svg::Color>()
                .min_dimensions(QR_SIZE, QR_SIZE)
                .quiet_zone(true)
                .dark_color(svg::Color("#000000"))
                .light_color(svg::Color("#ffffff"))
                .build()
        })
        .map_err(|e| warn!("Failed to render QR code ({} bytes): {}", data.len(), e))
        .ok()
}
