//! Domain model for the per-user settings document.

/// Allotment used when the user has never saved one
pub const DEFAULT_AVAILABLE_DAYS: u32 = 22;

/// Annual vacation allotment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub available_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            available_days: DEFAULT_AVAILABLE_DAYS,
        }
    }
}

/// Partial settings update; `None` fields keep their stored value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub available_days: Option<u32>,
}

impl SettingsPatch {
    pub fn available_days(days: u32) -> Self {
        Self {
            available_days: Some(days),
        }
    }
}
