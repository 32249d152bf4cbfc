//! Camera-relative visibility queries
//!
//! Points are mapped into viewport-normalized space where (0, 0) is the
//! bottom-left corner of the view and (1, 1) the top-right. Padding is a
//! fraction of the view size.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldError};

/// Orthographic camera as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World-space center of the view
    pub center: Vec2,
    /// Half of the visible height (orthographic size)
    pub half_height: f32,
    /// Width / height
    pub aspect: f32,
}

impl Camera {
    pub fn new(center: Vec2, half_height: f32, aspect: f32) -> Self {
        Self { center, half_height, aspect }
    }

    /// Build from explicit half extents
    pub fn from_half_extents(center: Vec2, half_width: f32, half_height: f32) -> Self {
        let aspect = if half_height != 0.0 { half_width / half_height } else { 0.0 };
        Self { center, half_height, aspect }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.half_height * self.aspect
    }
}

/// Axis-aligned world-space rectangle, never zero-sized
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    center: Vec2,
    size: Vec2,
}

impl Viewport {
    pub fn new(center: Vec2, size: Vec2) -> Result<Self> {
        let valid = center.is_finite() && size.is_finite() && size.x > 0.0 && size.y > 0.0;
        if !valid {
            return Err(WorldError::DegenerateViewport {
                width: size.x,
                height: size.y,
            });
        }
        Ok(Self { center, size })
    }

    /// Exactly what the camera sees
    pub fn from_camera(camera: &Camera) -> Result<Self> {
        let half = Vec2::new(camera.half_width(), camera.half_height);
        Self::new(camera.center, half * 2.0)
    }

    /// Camera view snapped outward to whole units, plus overdraw on each side
    pub fn with_overdraw(camera: &Camera, x_overdraw: u32, y_overdraw: u32) -> Result<Self> {
        let half = Vec2::new(camera.half_width(), camera.half_height);
        let overdraw = Vec2::new(x_overdraw as f32, y_overdraw as f32);
        let min = (camera.center - half).floor() - overdraw;
        let size = (half * 2.0).ceil() + overdraw * 2.0;
        Self::new(min + size / 2.0, size)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.size / 2.0
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.size / 2.0
    }

    /// World point to viewport-normalized coordinates
    #[inline]
    pub fn normalize(&self, point: Vec2) -> Vec2 {
        (point - self.min()) / self.size
    }
}

/// True iff the point lies within `[-padding, 1 + padding]` on both axes
pub fn is_visible(point: Vec2, viewport: &Viewport, padding: f32) -> bool {
    let n = viewport.normalize(point);
    let lo = -padding;
    let hi = 1.0 + padding;
    n.x >= lo && n.x <= hi && n.y >= lo && n.y <= hi
}

/// True while the point has not scrolled past the padded top edge
///
/// ```text
///      x   (past the edge: retire)
/// ---------- 1 + padding
///      x   (still kept)
///    +----+
///    |    |  camera view
///    +----+
/// ```
///
/// Horizontal position is ignored.
pub fn is_above_view(point: Vec2, viewport: &Viewport, padding: f32) -> bool {
    viewport.normalize(point).y < 1.0 + padding
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_view() -> Viewport {
        // Spans (0,0) to (10,10)
        Viewport::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0)).unwrap()
    }

    #[test]
    fn test_degenerate_viewport_rejected() {
        assert!(Viewport::new(Vec2::ZERO, Vec2::new(0.0, 5.0)).is_err());
        assert!(Viewport::new(Vec2::ZERO, Vec2::new(5.0, -1.0)).is_err());
        assert!(Viewport::new(Vec2::ZERO, Vec2::new(f32::NAN, 1.0)).is_err());
        let flat = Camera::new(Vec2::ZERO, 5.0, 0.0);
        assert!(Viewport::from_camera(&flat).is_err());
    }

    #[test]
    fn test_is_visible_with_padding() {
        let view = unit_view();
        assert!(is_visible(Vec2::new(5.0, 5.0), &view, 0.0));
        assert!(is_visible(Vec2::new(10.0, 0.0), &view, 0.0));
        assert!(!is_visible(Vec2::new(10.5, 5.0), &view, 0.0));
        // 10.5 normalizes to 1.05, inside a 10% pad
        assert!(is_visible(Vec2::new(10.5, 5.0), &view, 0.1));
        assert!(!is_visible(Vec2::new(5.0, -2.0), &view, 0.1));
    }

    #[test]
    fn test_is_above_view_threshold() {
        let view = unit_view();
        // y = 12 -> 1.2, past 1.1
        assert!(!is_above_view(Vec2::new(5.0, 12.0), &view, 0.1));
        // y = 10.5 -> 1.05, still kept
        assert!(is_above_view(Vec2::new(5.0, 10.5), &view, 0.1));
        // far left/below never counts as past the top
        assert!(is_above_view(Vec2::new(-100.0, -100.0), &view, 0.1));
    }

    #[test]
    fn test_camera_viewports() {
        let camera = Camera::new(Vec2::new(0.0, -10.0), 10.0, 0.5);
        let strict = Viewport::from_camera(&camera).unwrap();
        assert_eq!(strict.size(), Vec2::new(10.0, 20.0));
        assert_eq!(strict.min(), Vec2::new(-5.0, -20.0));

        let wide = Viewport::with_overdraw(&camera, 5, 5).unwrap();
        assert_eq!(wide.size(), Vec2::new(20.0, 30.0));
        assert_eq!(wide.min(), Vec2::new(-10.0, -25.0));
        assert_eq!(wide.max(), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn test_half_extents_roundtrip() {
        let camera = Camera::from_half_extents(Vec2::ZERO, 4.0, 8.0);
        assert!((camera.half_width() - 4.0).abs() < 1e-6);
    }
}
