mod gui;

use std::path::PathBuf;

use gui::frontend::{Document, NodeLoomApp};
use node_loom::EditorConfig;

use eframe::egui;

fn path_from_env(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(fallback))
}

fn main() -> eframe::Result {
    env_logger::init();

    let settings_path = path_from_env("NODE_LOOM_SETTINGS", "node-loom-settings.json");
    let config = if settings_path.exists() {
        EditorConfig::load(&settings_path).unwrap_or_else(|e| {
            log::warn!("ignoring settings at {}: {e}", settings_path.display());
            EditorConfig::default()
        })
    } else {
        EditorConfig::default()
    };

    let document_path = path_from_env("NODE_LOOM_DOCUMENT", "node-loom-document.json");
    let document = if document_path.exists() {
        Document::load(&document_path).unwrap_or_else(|e| {
            log::warn!("could not load {}: {e}, starting from the sample graph", document_path.display());
            Document::sample()
        })
    } else {
        Document::sample()
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 710.0])
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Node-Loom",
        options,
        Box::new(move |_cc| Ok(Box::new(NodeLoomApp::new(config, document, document_path)) as Box<dyn eframe::App>)),
    )
}
