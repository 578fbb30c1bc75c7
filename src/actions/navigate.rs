use egui::Key;

use super::{AcceptResult, ActionKind, EditorAction};
use crate::editor::animation::NavigateReason;
use crate::editor::state::{EditorState, SaveReason};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Mode {
    #[default]
    Idle,
    // Wheel step, positive zooms in
    Zoom(f32),
    Pan,
    Focus,
}

/// Wheel zoom, panning with the navigate button and framing with F.
#[derive(Debug, Default)]
pub struct NavigateAction {
    mode: Mode,
}

/// Next configured zoom level in the wheel direction, or the current zoom at the ends.
pub fn step_zoom(levels: &[f32], zoom: f32, direction: f32) -> f32 {
    const EPSILON: f32 = 1e-4;
    let next = if direction > 0.0 {
        levels.iter().copied().find(|&level| level > zoom + EPSILON)
    } else {
        levels.iter().rev().copied().find(|&level| level < zoom - EPSILON)
    };
    next.unwrap_or(zoom)
}

impl EditorAction for NavigateAction {
    fn kind(&self) -> ActionKind { ActionKind::Navigate }

    fn accept(&mut self, state: &mut EditorState) -> AcceptResult {
        let pointer = &state.pointer;
        let button = state.config.navigate_button;
        if pointer.has_focus() && pointer.key_pressed(Key::F) && !pointer.any_down() {
            self.mode = Mode::Focus;
            return AcceptResult::True;
        }
        if pointer.scroll() != 0.0 && pointer.is_over_viewport() {
            self.mode = Mode::Zoom(pointer.scroll());
            return AcceptResult::True;
        }
        if state.control.pressed_object(button).is_none() {
            return AcceptResult::False;
        }
        if pointer.is_dragging(button) {
            self.mode = Mode::Pan;
            return AcceptResult::True;
        }
        if pointer.is_down(button) { AcceptResult::Possible } else { AcceptResult::False }
    }

    fn process(&mut self, state: &mut EditorState) -> bool {
        match self.mode {
            Mode::Idle => false,
            Mode::Zoom(direction) => {
                let zoom = step_zoom(&state.config.zoom_levels, state.view.zoom, direction);
                if let Some(pos) = state.pointer.pos()
                    && zoom != state.view.zoom
                {
                    state.animations.stop_navigation();
                    state.view.zoom_at(pos, zoom);
                    state.navigation_reason = NavigateReason::MouseZoom;
                    state.make_dirty(SaveReason::NAVIGATION, None);
                    log::debug!("zoom {zoom:.2}");
                }
                self.mode = Mode::Idle;
                false
            }
            Mode::Pan => {
                if !state.pointer.is_down(state.config.navigate_button) {
                    self.mode = Mode::Idle;
                    return false;
                }
                let delta = state.pointer.delta();
                if delta != egui::Vec2::ZERO {
                    state.animations.stop_navigation();
                    state.view.pan(delta);
                    state.navigation_reason = NavigateReason::Unknown;
                    state.make_dirty(SaveReason::NAVIGATION, None);
                }
                true
            }
            Mode::Focus => {
                if !state.navigate_to_selection(true, None) {
                    state.navigate_to_content(None);
                }
                self.mode = Mode::Idle;
                false
            }
        }
    }

    fn cancel(&mut self, _state: &mut EditorState) { self.mode = Mode::Idle; }

    fn is_active(&self) -> bool { self.mode != Mode::Idle }

    fn is_dragging(&self) -> bool { self.mode == Mode::Pan }

    // Panning gives way to any higher priority gesture made with another button
    fn is_interruptible(&self) -> bool { true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_through_levels_and_stops_at_ends() {
        let levels = [0.5, 1.0, 2.0];
        assert_eq!(step_zoom(&levels, 1.0, 1.0), 2.0);
        assert_eq!(step_zoom(&levels, 1.0, -1.0), 0.5);
        assert_eq!(step_zoom(&levels, 2.0, 1.0), 2.0);
        assert_eq!(step_zoom(&levels, 0.7, 1.0), 1.0);
        assert_eq!(step_zoom(&levels, 0.7, -1.0), 0.5);
    }
}
