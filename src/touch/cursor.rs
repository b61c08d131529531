//! Position of the on-screen pointer driven by a touch pad.

/// Cursor position clamped to the display. Nothing is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerCursor {
    width: i32,
    height: i32,
    x: f32,
    y: f32,
}

impl PointerCursor {
    /// Resize to a new display and centre the cursor.
    pub fn configure(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.x = self.max_x() * 0.5;
        self.y = self.max_y() * 0.5;
    }

    fn max_x(&self) -> f32 {
        (self.width - 1).max(0) as f32
    }

    fn max_y(&self) -> f32 {
        (self.height - 1).max(0) as f32
    }

    pub fn move_by(&mut self, dx: f32, dy: f32) {
        self.set_position(self.x + dx, self.y + dy);
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x.clamp(0.0, self.max_x());
        self.y = y.clamp(0.0, self.max_y());
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}
