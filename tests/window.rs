use tileworld::window::*;

#[test]
fn default_is_1280x720_windowed() {
    let cfg = WindowConfig::default();
    assert_eq!(cfg.physical_width,  1280);
    assert_eq!(cfg.physical_height, 720);
    assert_eq!(cfg.logical_width,   1280);
    assert_eq!(cfg.logical_height,  720);
    assert_eq!(cfg.mode, WindowMode::Windowed);
    assert_eq!(cfg.title, "tileworld");
}

#[test]
fn aspect_ratio_1280x720() {
    let cfg = WindowConfig::default();
    let ratio = cfg.aspect_ratio();
    assert!((ratio - 16.0 / 9.0).abs() < 1e-5, "expected 16/9, got {ratio}");
}

#[test]
fn aspect_ratio_4x3() {
    let cfg = WindowConfig {
        physical_width: 800, physical_height: 600,
        logical_width: 800, logical_height: 600,
        mode: WindowMode::Borderless,
        ..WindowConfig::default()
    };
    let ratio = cfg.aspect_ratio();
    assert!((ratio - 4.0 / 3.0).abs() < 1e-5, "expected 4/3, got {ratio}");
}

#[test]
fn modes_parse_from_lowercase_names() {
    for (name, mode) in [
        ("windowed", WindowMode::Windowed),
        ("fullscreen", WindowMode::Fullscreen),
        ("borderless", WindowMode::Borderless),
    ] {
        let parsed: WindowMode = serde_json::from_str(&format!("\"{name}\"")).unwrap();
        assert_eq!(parsed, mode);
    }
    assert!(serde_json::from_str::<WindowMode>("\"Windowed\"").is_err());
}
