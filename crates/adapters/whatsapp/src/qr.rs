//! Compact terminal rendering for pairing QR codes.

use qrcode::{Color, EcLevel, QrCode};

/// Render a QR code for terminal display using Unicode half-block
/// characters, packing two module rows into one line of text.
pub fn render_qr_terminal(data: &str) -> Result<String, String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::L)
        .map_err(|e| format!("QR generation failed: {e}"))?;

    let width = code.width();
    let colors: Vec<Color> = code.into_colors();
    let is_dark = |row: usize, col: usize| -> bool {
        row < width && col < width && colors[row * width + col] == Color::Dark
    };

    let mut out = String::new();
    let mut row = 0;
    while row < width {
        for col in 0..width {
            let top = is_dark(row, col);
            let bottom = is_dark(row + 1, col);
            out.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
        row += 2;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nonempty_output() {
        let rendered = render_qr_terminal("test-pairing-data").expect("render");
        assert!(!rendered.is_empty());
    }

    #[test]
    fn output_is_half_height() {
        let code = QrCode::with_error_correction_level(b"test-pairing-data", EcLevel::L)
            .expect("qr code");
        let width = code.width();
        let rendered = render_qr_terminal("test-pairing-data").expect("render");
        assert_eq!(rendered.lines().count(), width.div_ceil(2));
    }
}
