// Camera: keeps the local player centered in the viewport
//
//   offset = focus - viewport / 2
//   screen = world - offset
//
// No smoothing and no zoom: the camera snaps to the predicted local position
// every frame, so it can never lag behind or jump back to a server echo.
use glam::Vec2;

/// Spacing of the background grid, in world units.
pub const GRID_PITCH: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    offset: Vec2,
    viewport: Vec2,
}

impl Camera {
    /// Center the camera on `focus` for a viewport of the given size.
    pub fn centered_on(focus: Vec2, viewport: Vec2) -> Self {
        Self {
            offset: focus - viewport / 2.0,
            viewport,
        }
    }

    #[inline]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    #[inline]
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    #[inline(always)]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.offset
    }

    /// Screen x of every vertical grid line.
    pub fn grid_columns(&self) -> GridLines {
        GridLines::new(self.offset.x, self.viewport.x, GRID_PITCH)
    }

    /// Screen y of every horizontal grid line.
    pub fn grid_rows(&self) -> GridLines {
        GridLines::new(self.offset.y, self.viewport.y, GRID_PITCH)
    }
}

/// Screen positions of grid lines along one axis, starting at
/// `-offset % pitch` and stepping by `pitch` while inside the viewport.
///
/// `%` is the truncated remainder (same sign as the dividend), so the first
/// line may sit slightly off-screen to the left/top; that is harmless and
/// keeps the grid scrolling continuously.
#[derive(Debug, Clone)]
pub struct GridLines {
    start: f32,
    extent: f32,
    pitch: f32,
    index: u32,
}

impl GridLines {
    fn new(offset: f32, extent: f32, pitch: f32) -> Self {
        Self {
            start: -offset % pitch,
            extent,
            pitch,
            index: 0,
        }
    }
}

impl Iterator for GridLines {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if !(self.pitch > 0.0) || !self.start.is_finite() {
            return None;
        }
        // Integer-based stepping avoids accumulating float error.
        let pos = self.start + self.index as f32 * self.pitch;
        if pos >= self.extent {
            return None;
        }
        self.index += 1;
        Some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_centers_local_player() {
        let cam = Camera::centered_on(Vec2::new(500.0, 500.0), Vec2::new(800.0, 600.0));
        assert_eq!(cam.offset(), Vec2::new(100.0, 200.0));
        assert_eq!(cam.world_to_screen(Vec2::new(150.0, 250.0)), Vec2::new(50.0, 50.0));
        assert_eq!(cam.world_to_screen(Vec2::new(500.0, 500.0)), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_grid_scrolls_with_offset() {
        let cam = Camera::centered_on(Vec2::new(530.0, 300.0), Vec2::new(400.0, 200.0));
        // offset = (330, 200) -> columns start at -330 % 100 = -30
        let cols: Vec<f32> = cam.grid_columns().collect();
        assert_eq!(cols, vec![-30.0, 70.0, 170.0, 270.0, 370.0]);
        // offset.y = 200 -> rows start at -0 (aligned)
        let rows: Vec<f32> = cam.grid_rows().collect();
        assert_eq!(rows, vec![0.0, 100.0]);
    }

    #[test]
    fn test_grid_with_negative_offset() {
        let cam = Camera::centered_on(Vec2::new(-20.0, 0.0), Vec2::new(200.0, 0.0));
        // offset.x = -120 -> start at 120 % 100 = 20
        let cols: Vec<f32> = cam.grid_columns().collect();
        assert_eq!(cols, vec![20.0, 120.0]);
        // zero-height viewport draws no rows
        assert_eq!(cam.grid_rows().count(), 0);
    }

    #[test]
    fn test_grid_line_count_is_bounded_by_viewport() {
        let cam = Camera::centered_on(Vec2::new(12345.6, -789.1), Vec2::new(1920.0, 1080.0));
        // At most one partially off-screen line beyond what fits.
        assert_eq!(cam.grid_columns().count(), 21);
        assert_eq!(cam.grid_rows().count(), 11);
    }
}
