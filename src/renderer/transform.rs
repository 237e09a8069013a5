use glam::{Mat4, Vec2, Vec3};

/// Orthographic projection mapping pixel coordinates (origin top-left, Y
/// down) to clip space.
pub fn orthographic_projection(width: f32, height: f32) -> Mat4 {
    Mat4::from_cols_array(&[
        2.0 / width, 0.0,           0.0, 0.0,
        0.0,         -2.0 / height, 0.0, 0.0,
        0.0,         0.0,           1.0, 0.0,
        -1.0,        1.0,           0.0, 1.0,
    ])
}

/// Model matrix placing the unit quad at `position` with extent `size`,
/// rotated `rotation_deg` degrees about its own centre.
///
/// Order: translate to `position`, translate by half the size, rotate,
/// translate back by half the size, scale. The rotation therefore pivots on
/// the quad's centre rather than its top-left corner.
pub fn model_transform(position: Vec2, size: Vec2, rotation_deg: f32) -> Mat4 {
    let half = (size * 0.5).extend(0.0);
    Mat4::from_translation(position.extend(0.0))
        * Mat4::from_translation(half)
        * Mat4::from_rotation_z(rotation_deg.to_radians())
        * Mat4::from_translation(-half)
        * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn unrotated_quad_covers_position_and_size() {
        let m = model_transform(Vec2::new(32.0, 16.0), Vec2::new(16.0, 8.0), 0.0);
        assert!(close(m.transform_point3(Vec3::ZERO), Vec3::new(32.0, 16.0, 0.0)));
        assert!(close(m.transform_point3(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(48.0, 24.0, 0.0)));
    }

    #[test]
    fn rotation_pivots_on_centre() {
        let m = model_transform(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0), 90.0);
        // Centre stays put.
        assert!(close(m.transform_point3(Vec3::new(0.5, 0.5, 0.0)), Vec3::new(20.0, 20.0, 0.0)));
        // Top-left corner swings to top-right.
        assert!(close(m.transform_point3(Vec3::ZERO), Vec3::new(30.0, 10.0, 0.0)));
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let p = orthographic_projection(640.0, 480.0);
        assert!(close(p.transform_point3(Vec3::ZERO), Vec3::new(-1.0, 1.0, 0.0)));
        assert!(close(p.transform_point3(Vec3::new(640.0, 480.0, 0.0)), Vec3::new(1.0, -1.0, 0.0)));
    }
}
