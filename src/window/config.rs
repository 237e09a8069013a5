use serde::Deserialize;

// ── WindowMode ────────────────────────────────────────────────────────────────

/// Controls how the OS window is presented.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Standard decorated window at the configured resolution.
    #[default]
    Windowed,
    /// Exclusive hardware fullscreen at the configured resolution.
    Fullscreen,
    /// Borderless window sized to match the monitor's native resolution.
    Borderless,
}

// ── WindowConfig ──────────────────────────────────────────────────────────────

/// Window configuration.
///
/// - **physical** dimensions are the pixel size of the OS window.
/// - **logical** dimensions are the game resolution the orthographic
///   projection maps, so one world pixel stays one logical pixel regardless
///   of window size.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub physical_width: u32,
    pub physical_height: u32,
    pub logical_width: u32,
    pub logical_height: u32,
    pub mode: WindowMode,
}

impl Default for WindowConfig {
    /// 1280 × 720, windowed.
    fn default() -> Self {
        Self {
            title:           "tileworld".to_string(),
            physical_width:  1280,
            physical_height: 720,
            logical_width:   1280,
            logical_height:  720,
            mode:            WindowMode::Windowed,
        }
    }
}

impl WindowConfig {
    /// Aspect ratio of the logical resolution, or `0.0` when the logical
    /// height is zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.logical_height == 0 {
            return 0.0;
        }
        self.logical_width as f32 / self.logical_height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: WindowConfig = serde_json::from_str(r#"{ "title": "Dungeon", "mode": "borderless" }"#).unwrap();
        assert_eq!(cfg.title, "Dungeon");
        assert_eq!(cfg.mode, WindowMode::Borderless);
        assert_eq!((cfg.physical_width, cfg.logical_height), (1280, 720));
    }

    #[test]
    fn aspect_ratio_guards_zero_height() {
        let cfg = WindowConfig { logical_height: 0, ..WindowConfig::default() };
        assert_eq!(cfg.aspect_ratio(), 0.0);
        assert!((WindowConfig::default().aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }
}
