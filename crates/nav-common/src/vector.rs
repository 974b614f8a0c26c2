//! Vector utilities for planar navigation

use glam::Vec2;

/// Calculates the distance between two points
#[inline]
pub fn distance(a: &Vec2, b: &Vec2) -> f32 {
    (*b - *a).length()
}

/// Calculates the squared distance between two points
///
/// Widened to `f64`, which stays finite for any pair of finite `f32` points.
#[inline]
pub fn distance_squared(a: &Vec2, b: &Vec2) -> f64 {
    (b.as_dvec2() - a.as_dvec2()).length_squared()
}

/// Parses a comma separated `x,y` pair
pub fn parse_vec2(s: &str) -> std::result::Result<Vec2, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != 2 {
        return Err(format!(
            "Vector must have 2 components, got {}",
            parts.len()
        ));
    }

    let x = parts[0].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Vec2::new(x, y))
}
