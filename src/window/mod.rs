pub mod config;

pub use config::{WindowConfig, WindowMode};

use winit::dpi::PhysicalSize;
use winit::window::{Fullscreen, Window, WindowAttributes};

/// Attributes for creating the client window from `config`.
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(config.physical_width, config.physical_height))
        .with_resizable(false)
}

/// Apply `config`'s mode to `window`.
///
/// - **Windowed** leaves fullscreen, restores decorations and requests the
///   configured physical size.
/// - **Fullscreen** picks the current monitor's video mode closest in area to
///   the configured physical size, falling back to borderless when no
///   monitor or mode is available.
/// - **Borderless** covers the current monitor at its native resolution.
pub fn apply_window_settings(window: &Window, config: &WindowConfig) {
    match config.mode {
        WindowMode::Windowed => {
            window.set_fullscreen(None);
            window.set_decorations(true);
            // The final size arrives as `WindowEvent::Resized` when not applied synchronously.
            let _ = window.request_inner_size(PhysicalSize::new(
                config.physical_width,
                config.physical_height,
            ));
        }

        WindowMode::Fullscreen => {
            let fullscreen = match window.current_monitor() {
                Some(monitor) => {
                    let target_area =
                        config.physical_width as u64 * config.physical_height as u64;

                    let best = monitor.video_modes().min_by_key(|vm| {
                        let s = vm.size();
                        let area = s.width as u64 * s.height as u64;
                        area.abs_diff(target_area)
                    });

                    match best {
                        Some(vm) => Fullscreen::Exclusive(vm),
                        None => Fullscreen::Borderless(Some(monitor)),
                    }
                }
                None => Fullscreen::Borderless(None),
            };

            log::debug!("[window] Entering fullscreen: {fullscreen:?}");
            window.set_fullscreen(Some(fullscreen));
        }

        WindowMode::Borderless => {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }
}
