use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::editor::input::MouseButton;

/// How a box selection decides which objects it picks up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoxSelectMode {
    // Anything whose bounds overlap the rectangle
    #[default]
    Intersect,
    // Only objects entirely inside the rectangle
    Contain,
}

/// What happens to a creation proposal the host never answered when the pointer is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreateReleasePolicy {
    /// Only proposals the host accepted while dragging reach the Create stage, and
    /// unanswered Create proposals are dropped.
    Explicit,
    /// Unrejected proposals reach the Create stage and unanswered link proposals
    /// commit on their own.
    #[default]
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    // Mouse assignments
    pub drag_button: MouseButton,
    pub select_button: MouseButton,
    pub navigate_button: MouseButton,
    pub context_menu_button: MouseButton,
    // Pixels the pointer must travel before a press turns into a drag
    pub drag_threshold: f32,
    pub grid_size: f32,
    pub snap_to_grid: bool,
    pub zoom_levels: Vec<f32>,
    // Hit testing, in screen pixels
    pub pin_hit_margin: f32,
    pub link_hit_distance: f32,
    // Groups
    pub group_resize_edge: f32,
    pub group_header_height: f32,
    pub min_group_size: (f32, f32),
    pub auto_group_on_drop: bool,
    // Navigation, durations in seconds
    pub navigate_margin: f32,
    pub navigate_duration: f32,
    pub edge_scroll_margin: f32,
    pub edge_scroll_speed: f32,
    pub flow_duration: f32,
    pub box_select_mode: BoxSelectMode,
    pub create_release_policy: CreateReleasePolicy,
    pub highlight_connected_links: bool,
    pub shortcuts_enabled: bool,
    pub theme: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_button: MouseButton::Primary,
            select_button: MouseButton::Primary,
            navigate_button: MouseButton::Secondary,
            context_menu_button: MouseButton::Secondary,
            drag_threshold: 3.0,
            grid_size: 16.0,
            snap_to_grid: true,
            zoom_levels: vec![0.1, 0.15, 0.2, 0.25, 0.33, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0],
            pin_hit_margin: 2.0,
            link_hit_distance: 6.0,
            group_resize_edge: 8.0,
            group_header_height: 24.0,
            min_group_size: (64.0, 48.0),
            auto_group_on_drop: true,
            navigate_margin: 32.0,
            navigate_duration: 0.25,
            edge_scroll_margin: 24.0,
            edge_scroll_speed: 600.0,
            flow_duration: 2.0,
            box_select_mode: BoxSelectMode::Intersect,
            create_release_policy: CreateReleasePolicy::Implicit,
            highlight_connected_links: true,
            shortcuts_enabled: true,
            theme: "default".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let mut config: Self = serde_json::from_str(s)?;
        config.normalize();
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut f = fs::File::open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Self::from_json_str(&s)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    // Zoom stepping needs a sorted, positive level list
    pub fn normalize(&mut self) {
        self.zoom_levels.retain(|z| z.is_finite() && *z > 0.0);
        self.zoom_levels.sort_by(|a, b| a.total_cmp(b));
        self.zoom_levels.dedup();
        if self.zoom_levels.is_empty() {
            self.zoom_levels.push(1.0);
        }
        self.drag_threshold = self.drag_threshold.max(0.0);
    }

    pub fn min_zoom(&self) -> f32 { self.zoom_levels.first().copied().unwrap_or(1.0) }
    pub fn max_zoom(&self) -> f32 { self.zoom_levels.last().copied().unwrap_or(1.0) }

    pub fn min_group_size(&self) -> egui::Vec2 { egui::vec2(self.min_group_size.0, self.min_group_size.1) }
}
