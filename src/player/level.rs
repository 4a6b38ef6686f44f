use serde::{Deserialize, Serialize};

/// Wire value the engines use for automatic selection
pub const AUTO_LEVEL: i32 = -1;

/// One rendition listed in the master playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct QualityLevel {
    pub height: u32,
    pub width: u32,
    /// bits per second
    pub bitrate: u64,
}

impl QualityLevel {
    pub fn label(&self) -> String {
        format!("{}p", self.height)
    }
}

pub fn format_bitrate(bitrate: u64) -> String {
    format!("{:.1} Mbps", bitrate as f64 / 1_000_000.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelSelection {
    #[default]
    Auto,
    Index(usize),
}

impl LevelSelection {
    /// `None` for negative values other than -1
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            AUTO_LEVEL => Some(LevelSelection::Auto),
            i if i >= 0 => Some(LevelSelection::Index(i as usize)),
            _ => None,
        }
    }

    pub fn as_index(&self) -> i32 {
        match self {
            LevelSelection::Auto => AUTO_LEVEL,
            LevelSelection::Index(i) => *i as i32,
        }
    }

    pub fn is_valid_for(&self, levels: &[QualityLevel]) -> bool {
        match self {
            LevelSelection::Auto => true,
            LevelSelection::Index(i) => *i < levels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_round_trips_wire_index() {
        assert_eq!(LevelSelection::from_index(-1), Some(LevelSelection::Auto));
        assert_eq!(LevelSelection::from_index(2), Some(LevelSelection::Index(2)));
        assert_eq!(LevelSelection::from_index(-3), None);
        assert_eq!(LevelSelection::Index(1).as_index(), 1);
        assert_eq!(LevelSelection::Auto.as_index(), -1);
    }

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(2_500_000), "2.5 Mbps");
        assert_eq!(format_bitrate(800_000), "0.8 Mbps");
    }
}
