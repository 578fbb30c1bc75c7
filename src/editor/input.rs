use egui::{Key, Modifiers, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Primary, MouseButton::Secondary, MouseButton::Middle];

    pub fn index(self) -> usize {
        match self {
            MouseButton::Primary => 0,
            MouseButton::Secondary => 1,
            MouseButton::Middle => 2,
        }
    }
}

impl TryFrom<egui::PointerButton> for MouseButton {
    type Error = ();

    fn try_from(button: egui::PointerButton) -> Result<Self, Self::Error> {
        match button {
            egui::PointerButton::Primary => Ok(MouseButton::Primary),
            egui::PointerButton::Secondary => Ok(MouseButton::Secondary),
            egui::PointerButton::Middle => Ok(MouseButton::Middle),
            _ => Err(()),
        }
    }
}

/// Raw input for one frame, in screen coordinates. The host fills this from its
/// windowing layer before calling `EditorContext::begin`.
#[derive(Clone, Debug)]
pub struct InputState {
    // Screen rectangle the canvas occupies
    pub viewport: Rect,
    pub pointer_pos: Option<Pos2>,
    pub buttons_down: [bool; 3],
    pub double_clicked: [bool; 3],
    // Positive scrolls up / zooms in
    pub scroll_delta: f32,
    pub modifiers: Modifiers,
    pub keys_pressed: Vec<Key>,
    // Seconds since an arbitrary epoch, monotonically increasing
    pub time: f64,
    pub has_focus: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            viewport: Rect::from_min_size(Pos2::ZERO, egui::vec2(1280.0, 720.0)),
            pointer_pos: None,
            buttons_down: [false; 3],
            double_clicked: [false; 3],
            scroll_delta: 0.0,
            modifiers: Modifiers::NONE,
            keys_pressed: Vec::new(),
            time: 0.0,
            has_focus: true,
        }
    }
}

impl InputState {
    pub fn is_down(&self, button: MouseButton) -> bool { self.buttons_down[button.index()] }

    pub fn set_down(&mut self, button: MouseButton, down: bool) { self.buttons_down[button.index()] = down; }

    pub fn key_pressed(&self, key: Key) -> bool { self.keys_pressed.contains(&key) }
}

#[derive(Clone, Copy, Debug, Default)]
struct ButtonTrack {
    down: bool,
    pressed: bool,
    released: bool,
    press_pos: Option<Pos2>,
    // Set once the pointer leaves the threshold radius, kept for the release frame
    dragged: bool,
    clicked: bool,
    double_clicked: bool,
}

/// Press/release edges and drag detection derived from consecutive `InputState`s.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    buttons: [ButtonTrack; 3],
    pos: Option<Pos2>,
    prev_pos: Option<Pos2>,
    scroll: f32,
    modifiers: Modifiers,
    keys: Vec<Key>,
    viewport: Option<Rect>,
    has_focus: bool,
}

impl PointerTracker {
    pub fn update(&mut self, input: &InputState, threshold: f32) {
        self.prev_pos = self.pos;
        self.pos = input.pointer_pos;
        self.scroll = input.scroll_delta;
        self.modifiers = input.modifiers;
        self.keys = input.keys_pressed.clone();
        self.viewport = Some(input.viewport);
        self.has_focus = input.has_focus;

        for button in MouseButton::ALL {
            let track = &mut self.buttons[button.index()];
            let down = input.is_down(button);
            track.pressed = down && !track.down;
            track.released = !down && track.down;
            track.double_clicked = track.pressed && input.double_clicked[button.index()];
            if track.pressed {
                track.press_pos = self.pos;
                track.dragged = false;
            }
            if down
                && !track.dragged
                && let (Some(pos), Some(start)) = (self.pos, track.press_pos)
                && (pos - start).length() >= threshold
            {
                track.dragged = true;
            }
            track.clicked = track.released && !track.dragged;
            if !down && !track.released {
                track.dragged = false;
            }
            track.down = down;
        }
    }

    pub fn pos(&self) -> Option<Pos2> { self.pos }

    pub fn delta(&self) -> Vec2 {
        match (self.pos, self.prev_pos) {
            (Some(now), Some(before)) => now - before,
            _ => Vec2::ZERO,
        }
    }

    pub fn is_down(&self, button: MouseButton) -> bool { self.buttons[button.index()].down }
    pub fn pressed(&self, button: MouseButton) -> bool { self.buttons[button.index()].pressed }
    pub fn released(&self, button: MouseButton) -> bool { self.buttons[button.index()].released }
    pub fn clicked(&self, button: MouseButton) -> bool { self.buttons[button.index()].clicked }
    pub fn double_clicked(&self, button: MouseButton) -> bool { self.buttons[button.index()].double_clicked }
    pub fn press_pos(&self, button: MouseButton) -> Option<Pos2> { self.buttons[button.index()].press_pos }

    // Held down and moved past the threshold since the press
    pub fn is_dragging(&self, button: MouseButton) -> bool {
        let track = &self.buttons[button.index()];
        track.down && track.dragged
    }

    pub fn drag_delta(&self, button: MouseButton) -> Vec2 {
        match (self.pos, self.press_pos(button)) {
            (Some(pos), Some(start)) => pos - start,
            _ => Vec2::ZERO,
        }
    }

    pub fn any_down(&self) -> bool { self.buttons.iter().any(|b| b.down) }

    pub fn scroll(&self) -> f32 { self.scroll }
    pub fn modifiers(&self) -> Modifiers { self.modifiers }
    pub fn key_pressed(&self, key: Key) -> bool { self.keys.contains(&key) }
    pub fn viewport(&self) -> Option<Rect> { self.viewport }
    pub fn has_focus(&self) -> bool { self.has_focus }

    pub fn is_over_viewport(&self) -> bool {
        matches!((self.pos, self.viewport), (Some(p), Some(viewport)) if viewport.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn frame(pos: Pos2, primary: bool) -> InputState {
        let mut input = InputState { pointer_pos: Some(pos), ..Default::default() };
        input.set_down(MouseButton::Primary, primary);
        input
    }

    #[test]
    fn short_press_is_a_click() {
        let mut tracker = PointerTracker::default();
        tracker.update(&frame(pos2(10.0, 10.0), true), 3.0);
        assert!(tracker.pressed(MouseButton::Primary));
        tracker.update(&frame(pos2(11.0, 10.0), true), 3.0);
        assert!(!tracker.is_dragging(MouseButton::Primary));
        tracker.update(&frame(pos2(11.0, 10.0), false), 3.0);
        assert!(tracker.released(MouseButton::Primary));
        assert!(tracker.clicked(MouseButton::Primary));
    }

    #[test]
    fn moving_past_threshold_is_a_drag_not_a_click() {
        let mut tracker = PointerTracker::default();
        tracker.update(&frame(pos2(10.0, 10.0), true), 3.0);
        tracker.update(&frame(pos2(20.0, 10.0), true), 3.0);
        assert!(tracker.is_dragging(MouseButton::Primary));
        assert_eq!(tracker.drag_delta(MouseButton::Primary), egui::vec2(10.0, 0.0));
        tracker.update(&frame(pos2(20.0, 10.0), false), 3.0);
        assert!(!tracker.clicked(MouseButton::Primary));
        assert!(!tracker.is_dragging(MouseButton::Primary));
        tracker.update(&frame(pos2(20.0, 10.0), false), 3.0);
        assert!(!tracker.released(MouseButton::Primary));
    }
}
