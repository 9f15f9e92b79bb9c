#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    /// Parses `RRGGBB`, `#RRGGBB` or `AARRGGBB`; six digits get an opaque alpha.
    pub fn new(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => Some(Color(format!("FF{}", hex.to_ascii_uppercase()))),
            8 => Some(Color(hex.to_ascii_uppercase())),
            _ => None,
        }
    }

    pub(crate) fn as_argb(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_gets_opaque_alpha() {
        assert_eq!(Color::new("005cb7").unwrap().as_argb(), "FF005CB7");
        assert_eq!(Color::new("#e4e4e6").unwrap().as_argb(), "FFE4E4E6");
        assert_eq!(Color::new("80FFFFFF").unwrap().as_argb(), "80FFFFFF");
    }

    #[test]
    fn malformed_hex_is_rejected() {
        for bad in ["red", "", "#", "12345", "1234567", "GGGGGG", "#12 456"] {
            assert_eq!(Color::new(bad), None, "{bad:?}");
        }
    }
}
