//! Editor font selection

/// Point sizes offered by the size picker; the persisted value is an index
pub const FONT_SIZES: &[u32] = &[6, 7, 8, 9, 10, 11, 12, 14, 16, 18, 20, 24, 28, 36];

pub const DEFAULT_FONT_FAMILY: &str = "Courier New";

/// 12pt
pub const DEFAULT_FONT_SIZE_INDEX: i32 = 6;

/// Used when the stored index is negative (10pt)
pub const FALLBACK_FONT_SIZE_INDEX: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontChoice {
    pub family: String,
    pub size_index: usize,
}

impl Default for FontChoice {
    fn default() -> Self {
        Self::from_stored(DEFAULT_FONT_FAMILY.to_string(), DEFAULT_FONT_SIZE_INDEX)
    }
}

impl FontChoice {
    /// Build from persisted values: a blank family falls back to the default,
    /// a negative index to 10pt, an index past the end to the largest size.
    pub fn from_stored(family: String, size_index: i32) -> Self {
        let family = if family.trim().is_empty() {
            DEFAULT_FONT_FAMILY.to_string()
        } else {
            family
        };
        let size_index = if size_index < 0 {
            FALLBACK_FONT_SIZE_INDEX
        } else {
            (size_index as usize).min(FONT_SIZES.len() - 1)
        };
        Self { family, size_index }
    }

    pub fn point_size(&self) -> u32 {
        FONT_SIZES[self.size_index.min(FONT_SIZES.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_courier_12pt() {
        let font = FontChoice::default();
        assert_eq!(font.family, "Courier New");
        assert_eq!(font.point_size(), 12);
    }

    #[test]
    fn test_negative_index_falls_back() {
        let font = FontChoice::from_stored("Menlo".into(), -1);
        assert_eq!(font.size_index, FALLBACK_FONT_SIZE_INDEX);
        assert_eq!(font.point_size(), 10);
    }

    #[test]
    fn test_out_of_range_index_is_clamped() {
        let font = FontChoice::from_stored(String::new(), 99);
        assert_eq!(font.family, DEFAULT_FONT_FAMILY);
        assert_eq!(font.point_size(), 36);
    }
}
