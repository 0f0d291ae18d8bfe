//! CLI binary for the native desktop preview of the wreck viewer.

use std::path::Path;

use wreck_viewer::viewer::DesktopPreview;
use wreck_viewer::Config;

fn print_usage() {
    log::error!("Usage: wreck-viewer <model.glb> [config.toml]");
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(model_path) = args.next() else {
        print_usage();
        std::process::exit(1);
    };

    if !Path::new(&model_path).exists() {
        log::error!("Model file not found: {model_path}");
        std::process::exit(1);
    }

    let config = match args.next() {
        Some(config_path) => match Config::load(Path::new(&config_path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {config_path}: {e}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let preview = DesktopPreview::builder()
        .with_model_path(model_path)
        .with_config(config)
        .build();

    if let Err(e) = preview.run() {
        log::error!("Viewer error: {e}");
        std::process::exit(1);
    }
}
