//! Color helpers for unit lists.

use std::fmt;

use rand::Rng;

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Uniformly random color.
    pub fn random(rng: &mut impl Rng) -> Self {
        let [_, r, g, b] = rng.random_range(0..=0xFF_FFFFu32).to_be_bytes();
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    /// Format as uppercase CSS hex: #RRGGBB
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Fresh random color string for a new list entry.
pub fn random_color() -> String {
    Rgb::random(&mut rand::rng()).to_string()
}

/// Palette color for position `index`, cycling. `None` for an empty palette.
pub fn palette_color(palette: &[String], index: usize) -> Option<&str> {
    if palette.is_empty() { return None }
    Some(palette[index % palette.len()].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_hex_color(s: &str) -> bool {
        s.len() == 7
            && s.starts_with('#')
            && s[1..].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[test]
    fn display_is_uppercase_hex() {
        assert_eq!(Rgb { r: 0, g: 171, b: 255 }.to_string(), "#00ABFF");
    }

    #[test]
    fn random_colors_are_six_hex_digits() {
        for _ in 0..100 { assert!(is_hex_color(&random_color())) }
    }

    #[test]
    fn palette_cycles() {
        let palette = vec!["#000000".to_string(), "#FFFFFF".to_string()];
        assert_eq!(palette_color(&palette, 0), Some("#000000"));
        assert_eq!(palette_color(&palette, 3), Some("#FFFFFF"));
        assert_eq!(palette_color(&[], 3), None);
    }
}
