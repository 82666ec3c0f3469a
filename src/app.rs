use std::time::Instant;

use eframe::egui;
use glam::Vec2;

use crate::compose::FeatureSet;
use crate::config::FluidConfig;
use crate::simulation::Simulation;
use crate::splat::SPLAT_PALETTE;

const OUTPUT_WIDTH: u32 = 800;
const OUTPUT_HEIGHT: u32 = 600;

/// Interactive front end: drag to splat force and dye at the cursor.
pub struct InteractiveApp {
    simulation: Simulation,
    pending: FluidConfig,
    paused: bool,
    shading: bool,
    palette_index: usize,
    dragging: bool,
    last_frame: Option<Instant>,
    texture: Option<egui::TextureHandle>,
    pixels: Vec<u8>,
    last_error: Option<String>,
}

impl InteractiveApp {
    pub fn new(config: FluidConfig) -> Result<Self, crate::error::FluidError> {
        let shading = config.shading;
        let pending = config.clone();
        let mut simulation = Simulation::new(config, OUTPUT_WIDTH, OUTPUT_HEIGHT)?;
        let last_error = simulation.seed_random_splats(3).err().map(|e| e.to_string());

        Ok(Self {
            simulation,
            pending,
            paused: false,
            shading,
            palette_index: 0,
            dragging: false,
            last_frame: None,
            texture: None,
            pixels: Vec::new(),
            last_error,
        })
    }

    fn restart(&mut self) {
        match Simulation::new(self.pending.clone(), OUTPUT_WIDTH, OUTPUT_HEIGHT) {
            Ok(simulation) => {
                self.simulation = simulation;
                self.shading = self.pending.shading;
                self.last_error = self.simulation.seed_random_splats(3).err().map(|e| e.to_string());
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }

    fn record_error(&mut self, result: Result<(), crate::error::FluidError>) {
        if let Err(e) = result {
            self.last_error = Some(e.to_string());
            self.paused = true;
        }
    }

    fn splat_at(&mut self, rect: egui::Rect, pos: egui::Pos2, drag: egui::Vec2, with_force: bool) {
        let point = Vec2::new(
            ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0),
            // UV origin is bottom-left; screen origin is top-left.
            (1.0 - (pos.y - rect.top()) / rect.height()).clamp(0.0, 1.0),
        );
        let force = if with_force {
            let scale = self.simulation.config().splat_force;
            Vec2::new(
                drag.x / rect.width() * scale,
                -drag.y / rect.height() * scale,
            )
        } else {
            Vec2::ZERO
        };
        let color = SPLAT_PALETTE[self.palette_index % SPLAT_PALETTE.len()];
        let result = self.simulation.inject(point, force, color);
        self.record_error(result);
    }
}

impl eframe::App for InteractiveApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("inkflow");

            ui.horizontal(|ui| {
                if ui.button(if self.paused { "Resume" } else { "Pause" }).clicked() {
                    self.paused = !self.paused;
                }
                if ui.button("Seed splats").clicked() {
                    let result = self.simulation.seed_random_splats(3);
                    self.record_error(result);
                }
                ui.checkbox(&mut self.shading, "Shading");
            });

            egui::CollapsingHeader::new("Settings (apply restarts the simulation)").show(ui, |ui| {
                ui.add(
                    egui::Slider::new(&mut self.pending.curl, 0.0..=50.0).text("Curl strength"),
                );
                ui.add(
                    egui::Slider::new(&mut self.pending.pressure_iterations, 1..=60)
                        .text("Pressure iterations"),
                );
                ui.add(
                    egui::Slider::new(&mut self.pending.pressure, 0.0..=1.0)
                        .text("Pressure weight"),
                );
                ui.add(
                    egui::Slider::new(&mut self.pending.velocity_dissipation, 0.0..=4.0)
                        .text("Velocity dissipation"),
                );
                ui.add(
                    egui::Slider::new(&mut self.pending.density_dissipation, 0.0..=4.0)
                        .text("Density dissipation"),
                );
                ui.add(
                    egui::Slider::new(&mut self.pending.splat_radius, 0.01..=2.0)
                        .text("Splat radius"),
                );
                ui.add(
                    egui::Slider::new(&mut self.pending.splat_force, 500.0..=12000.0)
                        .text("Splat force"),
                );
                if ui.button("Apply").clicked() {
                    self.restart();
                }
            });

            ui.separator();

            let (rect, response) = ui.allocate_exact_size(
                egui::Vec2::new(OUTPUT_WIDTH as f32, OUTPUT_HEIGHT as f32),
                egui::Sense::click_and_drag(),
            );

            // Left drag pulls fluid and dyes it; right drag dyes only.
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pos) = response.interact_pointer_pos() {
                    if !self.dragging {
                        self.dragging = true;
                        self.palette_index += 1;
                    }
                    let drag = response.drag_delta();
                    self.splat_at(rect, pos, drag, true);
                }
            } else if response.dragged_by(egui::PointerButton::Secondary) {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.splat_at(rect, pos, egui::Vec2::ZERO, false);
                }
            } else {
                self.dragging = false;
            }

            if !self.paused {
                let now = Instant::now();
                let delta = self
                    .last_frame
                    .map(|t| now.duration_since(t).as_secs_f32())
                    .unwrap_or(0.0);
                self.last_frame = Some(now);
                let result = self.simulation.step(delta);
                self.record_error(result);
            } else {
                self.last_frame = None;
            }

            let features = FeatureSet {
                shading: self.shading,
                bloom: self.simulation.config().bloom,
                sunrays: self.simulation.config().sunrays,
            };
            match self.simulation.render_rgba_with(features, &mut self.pixels) {
                Ok((w, h)) => {
                    let image =
                        egui::ColorImage::from_rgba_unmultiplied([w, h], &self.pixels);
                    match &mut self.texture {
                        Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                        None => {
                            self.texture = Some(ctx.load_texture(
                                "dye",
                                image,
                                egui::TextureOptions::LINEAR,
                            ))
                        }
                    }
                }
                Err(e) => self.last_error = Some(e.to_string()),
            }

            if let Some(texture) = &self.texture {
                ui.painter().image(
                    texture.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            ui.label(format!(
                "Frame: {} | Drag: splat | Right-drag: dye only",
                self.simulation.frame()
            ));

            if let Some(err) = &self.last_error {
                ui.colored_label(egui::Color32::RED, err);
            }
        });

        ctx.request_repaint();
    }
}
