use std::fmt::Write;

use glam::Vec3;
use glint_scene::{Light, Scene, SceneObject};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, 12.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a view configuration, then produces
/// output. Animation happens in [`Scene::update`], never here.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &Scene, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of a scene: lights, objects and triangle totals.
///
/// Backs the CLI `inspect` command and renderer-free tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn fmt_vec(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, view: &RenderView) -> String {
        // Writing to a String cannot fail.
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene ({} objects, {} triangles) ===",
            scene.object_count(),
            scene.triangle_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye={} target={} fov={:.0}",
            fmt_vec(view.eye),
            fmt_vec(view.target),
            view.fov_degrees
        );

        let d = &scene.directional;
        let _ = writeln!(
            out,
            "Directional: dir={} color={} ambient={:.2}",
            fmt_vec(d.direction),
            fmt_vec(d.color().rgb),
            d.color().w
        );
        for (i, light) in scene.points.iter().enumerate() {
            let _ = writeln!(
                out,
                "  Point[{i}] pos={} color={} vel={}",
                fmt_vec(light.position()),
                fmt_vec(light.color().rgb),
                fmt_vec(light.velocity())
            );
        }
        for (i, light) in scene.spots.iter().enumerate() {
            let _ = writeln!(
                out,
                "  Spot[{i}] pos={} dir={} cutoff={:.1}/{:.1}",
                fmt_vec(light.position()),
                fmt_vec(light.direction()),
                light.inner_cutoff,
                light.outer_cutoff
            );
        }

        for wall in &scene.walls {
            let _ = writeln!(
                out,
                "  Wall pos={} scale={}{}{}",
                fmt_vec(wall.transform().position),
                fmt_vec(wall.transform().scale),
                if wall.is_static() { " static" } else { "" },
                if wall.textured { " textured" } else { "" }
            );
        }
        for cube in &scene.cubes {
            let _ = writeln!(
                out,
                "  Cube pos={} rot={:.1}",
                fmt_vec(cube.transform().position),
                cube.transform().rotation.degrees
            );
        }
        for model in &scene.models {
            let _ = writeln!(
                out,
                "  Model#{} pos={} tris={}",
                model.model,
                fmt_vec(model.transform().position),
                model.triangle_count()
            );
        }

        tracing::debug!(objects = scene.object_count(), "scene dumped as text");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_common::Transform;
    use glint_scene::ModelInstance;

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());

        assert!(output.contains("0 objects, 0 triangles"));
        assert!(output.contains("Directional:"));
        assert!(!output.contains("Cube"));
    }

    #[test]
    fn debug_renderer_demo_scene() {
        let scene = Scene::demo(4);
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());

        assert_eq!(output.matches("  Cube ").count(), 4);
        assert_eq!(output.matches("  Wall ").count(), 2);
        assert!(output.contains("Point[1]"));
        assert!(output.contains("Spot[0]"));
        assert!(output.contains("textured"));
    }

    #[test]
    fn debug_renderer_lists_models() {
        let mut scene = Scene::new();
        scene.add_model(ModelInstance::new(
            3,
            120,
            Transform::at(Vec3::new(1.0, 2.0, 3.0)),
            true,
        ));
        let output = DebugTextRenderer::new().render(&scene, &RenderView::default());

        assert!(output.contains("Model#3 pos=(1.00, 2.00, 3.00) tris=120"));
        assert!(output.contains("120 triangles"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 45.0);
        assert_eq!(view.target, Vec3::ZERO);
    }
}
