use serde::{Deserialize, Serialize};

use crate::validation::ValidationLimits;

/// Tunables for an editing session, usually loaded from the user's config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub min_chars: usize,
    pub max_chars: usize,
    pub font_size_min: u8,
    pub font_size_max: u8,
    pub font_size_step: u8,
    pub default_font_size: u8,
    /// Idle time after typing before an autosave snapshot is written
    pub autosave_delay_ms: u64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            min_chars: 50,
            max_chars: 7000,
            font_size_min: 12,
            font_size_max: 24,
            font_size_step: 2,
            default_font_size: 16,
            autosave_delay_ms: 2000,
        }
    }
}

impl EditorSettings {
    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            min_chars: self.min_chars,
            max_chars: self.max_chars,
        }
    }

    pub fn font_size_bounds(&self) -> FontSizeBounds {
        FontSizeBounds {
            min: self.font_size_min,
            max: self.font_size_max.max(self.font_size_min),
            step: self.font_size_step.max(1),
            default: self.default_font_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSizeBounds {
    pub min: u8,
    pub max: u8,
    pub step: u8,
    pub default: u8,
}

impl Default for FontSizeBounds {
    fn default() -> Self {
        EditorSettings::default().font_size_bounds()
    }
}

impl FontSizeBounds {
    pub fn clamp(&self, size: u8) -> u8 {
        size.clamp(self.min, self.max)
    }
}
