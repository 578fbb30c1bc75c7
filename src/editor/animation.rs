use std::collections::HashMap;

use egui::{Rect, Vec2};

use super::view::CanvasView;
use crate::graph_utils::ids::LinkId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ZoomMode {
    // Pan only
    #[default]
    None,
    Exact,
    WithMargin,
}

/// Why the camera last moved. Informational, only mouse zoom changes behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NavigateReason {
    #[default]
    Unknown,
    MouseZoom,
    Selection,
    Object,
    Content,
    Edge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowDirection {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug)]
struct CameraAnimation {
    from: CanvasView,
    to: CanvasView,
    start: f64,
    duration: f32,
    reason: NavigateReason,
}

#[derive(Clone, Copy, Debug)]
struct FlowAnimation {
    direction: FlowDirection,
    start: f64,
    duration: f32,
}

/// Camera moves and link flow markers. Both run for a fixed duration with linear timing.
#[derive(Clone, Debug, Default)]
pub struct Animations {
    camera: Option<CameraAnimation>,
    flows: HashMap<LinkId, FlowAnimation>,
}

/// View that frames `target` (canvas space) in `view`'s viewport.
pub fn navigation_target(view: &CanvasView, target: Rect, mode: ZoomMode, margin: f32, zoom_range: (f32, f32)) -> CanvasView {
    let viewport = view.viewport.size();
    let available = match mode {
        ZoomMode::WithMargin => (viewport - Vec2::splat(margin * 2.0)).max(Vec2::splat(1.0)),
        _ => viewport,
    };
    let zoom = match mode {
        ZoomMode::None => view.zoom,
        ZoomMode::Exact | ZoomMode::WithMargin => {
            let size = target.size().max(Vec2::splat(1.0));
            (available.x / size.x).min(available.y / size.y).clamp(zoom_range.0, zoom_range.1)
        }
    };
    view.centered_on(target.center(), zoom)
}

impl Animations {
    pub fn navigate(&mut self, view: &mut CanvasView, to: CanvasView, duration: f32, time: f64, reason: NavigateReason) {
        if duration <= 0.0 {
            self.camera = None;
            view.origin = to.origin;
            view.zoom = to.zoom;
            return;
        }
        log::debug!("navigating ({reason:?}) to zoom {:.2} over {duration:.2}s", to.zoom);
        self.camera = Some(CameraAnimation { from: *view, to, start: time, duration, reason });
    }

    pub fn stop_navigation(&mut self) { self.camera = None; }

    pub fn is_navigating(&self) -> bool { self.camera.is_some() }

    pub fn navigation_reason(&self) -> Option<NavigateReason> { self.camera.map(|c| c.reason) }

    /// Advances the camera. Returns true on the frame the animation lands.
    pub fn update(&mut self, view: &mut CanvasView, time: f64) -> bool {
        self.flows.retain(|_, flow| time - flow.start < flow.duration as f64);
        let Some(camera) = self.camera else { return false };
        let t = (((time - camera.start) / camera.duration as f64) as f32).clamp(0.0, 1.0);
        view.origin = camera.from.origin + (camera.to.origin - camera.from.origin) * t;
        view.zoom = camera.from.zoom + (camera.to.zoom - camera.from.zoom) * t;
        if t >= 1.0 {
            self.camera = None;
            return true;
        }
        false
    }

    pub fn flow(&mut self, link: LinkId, direction: FlowDirection, duration: f32, time: f64) {
        self.flows.insert(link, FlowAnimation { direction, start: time, duration });
    }

    pub fn stop_flow(&mut self, link: LinkId) { self.flows.remove(&link); }

    // Direction and progress in 0..1
    pub fn flow_progress(&self, link: LinkId, time: f64) -> Option<(FlowDirection, f32)> {
        let flow = self.flows.get(&link)?;
        let progress = ((time - flow.start) / flow.duration.max(f32::EPSILON) as f64) as f32;
        Some((flow.direction, progress.clamp(0.0, 1.0)))
    }
}
