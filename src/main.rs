use std::path::Path;

use anyhow::{Context, Result};
use inkflow::{FluidConfig, InteractiveApp, Renderer, Simulation};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let mut config = FluidConfig::default();
    if let Some(path) = args.iter().skip(1).find(|a| a.ends_with(".json")) {
        config = load_config(Path::new(path))?;
    }

    if args.iter().any(|a| a == "test") {
        run_headless(config)
    } else {
        run_gui(config)
    }
}

fn load_config(path: &Path) -> Result<FluidConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: FluidConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(config)
}

/// Seed random splats, step at a fixed cadence, export frames and print
/// diagnostics. Useful for eyeballing solver changes without a window.
fn run_headless(config: FluidConfig) -> Result<()> {
    println!("Running headless simulation, exporting frames...");

    let mut simulation = Simulation::new(config, 512, 512)?;
    let mut renderer = Renderer::new(512, 512);

    simulation.seed_random_splats(3)?;
    simulation.metrics().print_summary();

    for frame in 1..=60 {
        simulation.step(1.0 / 60.0)?;

        if frame % 10 == 0 {
            let path = format!("frame_{frame:04}.png");
            renderer
                .export_png(&mut simulation, Path::new(&path))
                .map_err(|e| anyhow::anyhow!("exporting {path}: {e}"))?;
            simulation.metrics().print_summary();
        }
    }

    println!("Done: 60 frames simulated, 6 exported.");
    Ok(())
}

fn run_gui(config: FluidConfig) -> Result<()> {
    let app = InteractiveApp::new(config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([830.0, 780.0])
            .with_title("inkflow"),
        ..Default::default()
    };

    eframe::run_native("inkflow", options, Box::new(move |_cc| Box::new(app)))
        .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}
