use egui::{Pos2, Rect, Vec2};

/// Pan and zoom of the canvas inside its screen viewport.
/// `screen = viewport.min + origin + canvas * zoom`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasView {
    pub viewport: Rect,
    pub origin: Vec2,
    pub zoom: f32,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self { viewport: Rect::from_min_size(Pos2::ZERO, egui::vec2(1280.0, 720.0)), origin: Vec2::ZERO, zoom: 1.0 }
    }
}

impl CanvasView {
    pub fn to_canvas(&self, screen: Pos2) -> Pos2 {
        ((screen - self.viewport.min - self.origin) / self.zoom).to_pos2()
    }

    pub fn to_screen(&self, canvas: Pos2) -> Pos2 {
        self.viewport.min + self.origin + canvas.to_vec2() * self.zoom
    }

    pub fn rect_to_screen(&self, canvas: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(canvas.min), self.to_screen(canvas.max))
    }

    pub fn rect_to_canvas(&self, screen: Rect) -> Rect {
        Rect::from_min_max(self.to_canvas(screen.min), self.to_canvas(screen.max))
    }

    /// Part of the canvas currently on screen.
    pub fn visible_rect(&self) -> Rect { self.rect_to_canvas(self.viewport) }

    // Canvas-space offset of the viewport's top left corner
    pub fn scroll(&self) -> Vec2 { -self.origin / self.zoom }

    pub fn set_scroll(&mut self, scroll: Vec2) { self.origin = -scroll * self.zoom; }

    /// Changes zoom keeping the canvas point under `screen` in place.
    pub fn zoom_at(&mut self, screen: Pos2, zoom: f32) {
        let anchor = self.to_canvas(screen);
        self.zoom = zoom;
        self.origin = screen - self.viewport.min - anchor.to_vec2() * zoom;
    }

    pub fn pan(&mut self, screen_delta: Vec2) { self.origin += screen_delta; }

    /// View centered on `target` at `zoom`.
    pub fn centered_on(&self, target: Pos2, zoom: f32) -> CanvasView {
        let origin = self.viewport.size() * 0.5 - target.to_vec2() * zoom;
        CanvasView { viewport: self.viewport, origin, zoom }
    }
}
