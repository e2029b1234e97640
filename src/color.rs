use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette: one colour per search term
// ---------------------------------------------------------------------------

/// Colour of the "without search terms" group.
pub const COMPLEMENT_COLOR: Color32 = Color32::from_rgb(0x95, 0xA5, 0xA6);

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Term colours in input order.
#[derive(Debug, Clone, Default)]
pub struct TermColors {
    colors: Vec<Color32>,
}

impl TermColors {
    pub fn new(n_terms: usize) -> Self {
        TermColors {
            colors: generate_palette(n_terms),
        }
    }

    /// Colour of the term at `index`; grey if out of range.
    pub fn color_for(&self, index: usize) -> Color32 {
        self.colors.get(index).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Diverging scale for the heatmap: red → yellow → green
// ---------------------------------------------------------------------------

const DIVERGING_LOW: (u8, u8, u8) = (0xA5, 0x00, 0x26);
const DIVERGING_MID: (u8, u8, u8) = (0xFF, 0xFF, 0xBF);
const DIVERGING_HIGH: (u8, u8, u8) = (0x00, 0x68, 0x37);

fn linear(rgb: (u8, u8, u8)) -> LinSrgb {
    Srgb::<u8>::new(rgb.0, rgb.1, rgb.2)
        .into_format::<f32>()
        .into_linear()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

/// Position of `value` in `[min, max]` mapped onto the diverging scale.
/// A degenerate range maps everything to the midpoint.
pub fn diverging_color(value: f64, min: f64, max: f64) -> Color32 {
    let range = max - min;
    let t = if range.abs() < f64::EPSILON {
        0.5
    } else {
        ((value - min) / range).clamp(0.0, 1.0) as f32
    };

    let mixed = if t < 0.5 {
        linear(DIVERGING_LOW).mix(linear(DIVERGING_MID), t * 2.0)
    } else {
        linear(DIVERGING_MID).mix(linear(DIVERGING_HIGH), (t - 0.5) * 2.0)
    };
    to_color32(Srgb::from_linear(mixed))
}

/// Black or white, whichever reads better on `background`.
pub fn contrast_text(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn term_colors_fall_back_to_grey() {
        let colors = TermColors::new(2);
        assert_eq!(colors.color_for(5), Color32::GRAY);
    }

    #[test]
    fn diverging_endpoints() {
        assert_eq!(diverging_color(0.0, 0.0, 10.0), Color32::from_rgb(0xA5, 0x00, 0x26));
        assert_eq!(diverging_color(10.0, 0.0, 10.0), Color32::from_rgb(0x00, 0x68, 0x37));
        // Out-of-range values clamp, degenerate ranges sit in the middle.
        assert_eq!(diverging_color(-5.0, 0.0, 10.0), diverging_color(0.0, 0.0, 10.0));
        assert_eq!(diverging_color(3.0, 3.0, 3.0), diverging_color(5.0, 0.0, 10.0));
    }

    #[test]
    fn text_contrast() {
        assert_eq!(contrast_text(Color32::from_rgb(0xFF, 0xFF, 0xBF)), Color32::BLACK);
        assert_eq!(contrast_text(Color32::from_rgb(0x00, 0x68, 0x37)), Color32::WHITE);
    }
}
