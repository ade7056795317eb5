//! Debug overlay: frame statistics plus live editors for the lit scene.

use egui::{Context, DragValue, Ui};
use glam::Vec3;
use glint_render_wgpu::FreeCamera;
use glint_scene::{LightBase, Scene};
use glint_tools::PerfTracker;

/// What the overlay reads and edits for one frame.
pub struct Overlay<'a> {
    pub perf: &'a PerfTracker,
    pub camera: &'a FreeCamera,
    /// `None` in demos without a lit scene.
    pub scene: Option<&'a mut Scene>,
    pub shadows: Option<&'a mut bool>,
}

impl Overlay<'_> {
    pub fn show(self, ctx: &Context) {
        let Overlay {
            perf,
            camera,
            scene,
            shadows,
        } = self;

        egui::Window::new("Stats")
            .default_pos([10.0, 10.0])
            .default_width(300.0)
            .show(ctx, |ui| {
                stats(ui, perf);
                ui.separator();
                ui.label(format!(
                    "Camera: ({:.2}, {:.2}, {:.2})",
                    camera.position.x, camera.position.y, camera.position.z
                ));

                if let Some(shadows) = shadows {
                    ui.checkbox(shadows, "Shadows (F2)");
                }

                if let Some(scene) = scene {
                    ui.add(
                        egui::Slider::new(&mut scene.spin_degrees_per_sec, 0.0..=360.0)
                            .text("Cube spin (deg/s)"),
                    );
                    ui.separator();
                    lights(ui, scene);
                }

                ui.separator();
                ui.small("F1: overlay | F2: shadows | WASD: move | arrows: look | Esc: quit");
            });
    }
}

fn stats(ui: &mut Ui, perf: &PerfTracker) {
    let counters = perf.counters();
    ui.label(format!("FPS: {:.1}", perf.fps()));
    ui.label(format!(
        "Frame: {:.2} ms (avg {:.2}, min {:.2}, max {:.2})",
        perf.frame_ms(),
        perf.avg_ms(),
        perf.min_ms(),
        perf.max_ms()
    ));
    ui.label(format!("CPU: {:.2} ms  GPU wait: {:.2} ms", perf.cpu_ms(), perf.gpu_wait_ms()));
    ui.label(format!(
        "Draw calls: {}  Triangles: {}",
        counters.draw_calls, counters.triangles
    ));
    ui.label(format!(
        "Binds: {} pipeline, {} texture",
        counters.shader_binds, counters.texture_binds
    ));
    ui.label(format!(
        "VRAM: {:.2} MB  Upload: {:.2} KB",
        perf.vram_bytes() as f64 / (1024.0 * 1024.0),
        counters.upload_bytes as f64 / 1024.0
    ));
}

fn lights(ui: &mut Ui, scene: &mut Scene) {
    egui::CollapsingHeader::new("Directional light").show(ui, |ui| {
        let light = &mut scene.directional;
        color_editor(ui, &mut light.base);
        let mut direction = light.direction;
        if vec3_row(ui, "Direction", &mut direction, 0.05) {
            if let Some(direction) = usable_direction(direction) {
                light.direction = direction;
            }
        }
    });

    for (i, light) in scene.points.iter_mut().enumerate() {
        egui::CollapsingHeader::new(format!("Point light {i}")).show(ui, |ui| {
            color_editor(ui, &mut light.base);
            vec3_row(ui, "Position", &mut light.base.position, 0.1);
            vec3_row(ui, "Velocity", &mut light.base.velocity, 0.05);
        });
    }

    for (i, light) in scene.spots.iter_mut().enumerate() {
        egui::CollapsingHeader::new(format!("Spot light {i}")).show(ui, |ui| {
            color_editor(ui, &mut light.base);
            let mut position = light.base.position;
            let mut direction = light.direction();
            let moved = vec3_row(ui, "Position", &mut position, 0.1);
            let turned = vec3_row(ui, "Direction", &mut direction, 0.05);
            vec3_row(ui, "Velocity", &mut light.base.velocity, 0.05);
            ui.add(egui::Slider::new(&mut light.inner_cutoff, 1.0..=89.0).text("Inner cutoff"));
            ui.add(egui::Slider::new(&mut light.outer_cutoff, 1.0..=89.0).text("Outer cutoff"));
            if light.outer_cutoff < light.inner_cutoff {
                light.outer_cutoff = light.inner_cutoff;
            }
            if moved || turned {
                let direction = usable_direction(direction).unwrap_or(light.direction());
                let up = light.up();
                light.align(position, direction, up);
            }
        });
    }
}

fn color_editor(ui: &mut Ui, base: &mut LightBase) {
    ui.horizontal(|ui| {
        let mut rgb = base.color.rgb.to_array();
        ui.label("Colour");
        if ui.color_edit_button_rgb(&mut rgb).changed() {
            base.color.rgb = Vec3::from_array(rgb);
        }
        ui.add(DragValue::new(&mut base.color.w).prefix("I: ").speed(0.05).range(0.0..=10.0));
    });
}

/// Edited directions of (near) zero length are dropped.
fn usable_direction(direction: Vec3) -> Option<Vec3> {
    (direction.length_squared() > 1e-6).then(|| direction.normalize())
}

/// Returns whether any component changed.
fn vec3_row(ui: &mut Ui, label: &str, value: &mut Vec3, speed: f64) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        let x = ui.add(DragValue::new(&mut value.x).prefix("X: ").speed(speed)).changed();
        let y = ui.add(DragValue::new(&mut value.y).prefix("Y: ").speed(speed)).changed();
        let z = ui.add(DragValue::new(&mut value.z).prefix("Z: ").speed(speed)).changed();
        x || y || z
    })
    .inner
}
