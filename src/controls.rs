//! Tweakable parameters of the simulation and its rendering.
//!
//! [`Controls`] holds plain values only. The frame loop copies them into the
//! GPU uniform blocks every tick, so edits made through the egui panel (or
//! directly on the struct) take effect on the next frame.

use std::ops::RangeInclusive;

use crate::uniforms::SimulationUniforms;

pub const POINT_SIZE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const INFLUENCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const STRENGTH_RANGE: RangeInclusive<f32> = 0.0..=10.0;
pub const FREQUENCY_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Background colour, `#29191f`.
pub const DEFAULT_CLEAR_COLOR: [u8; 3] = [0x29, 0x19, 0x1f];

/// User-facing parameters.
///
/// Slider bounds are the `*_RANGE` constants. Values written from code are
/// not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controls {
    /// Background colour as sRGB bytes.
    pub clear_color: [u8; 3],
    pub point_size: f32,
    /// How many particles the flow field moves, from none (0) to all (1).
    pub flow_field_influence: f32,
    pub flow_field_strength: f32,
    pub flow_field_frequency: f32,
    /// Draw the state texture on a quad next to the particles.
    pub show_debug_plane: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            point_size: 0.07,
            flow_field_influence: 0.5,
            flow_field_strength: 2.0,
            flow_field_frequency: 0.5,
            show_debug_plane: false,
        }
    }
}

impl Controls {
    /// Simulation uniform block for a tick at `time` with step `delta`.
    pub fn simulation_uniforms(&self, time: f32, delta: f32, size: u32, count: u32) -> SimulationUniforms {
        let mut uniforms = SimulationUniforms::new(size, count);
        uniforms.time = time;
        uniforms.delta_time = delta;
        self.apply(&mut uniforms);
        uniforms
    }

    /// Copy the flow-field parameters into an existing uniform block.
    pub fn apply(&self, uniforms: &mut SimulationUniforms) {
        uniforms.flow_field_influence = self.flow_field_influence;
        uniforms.flow_field_strength = self.flow_field_strength;
        uniforms.flow_field_frequency = self.flow_field_frequency;
    }

    /// Clear colour in linear space, for sRGB render targets.
    pub fn clear_color(&self) -> wgpu::Color {
        let [r, g, b] = self.clear_color.map(|c| srgb_to_linear(c as f64 / 255.0));
        wgpu::Color { r, g, b, a: 1.0 }
    }

    /// Clear colour encoded for a render target of `format`.
    pub fn clear_color_for(&self, format: wgpu::TextureFormat) -> wgpu::Color {
        if format.is_srgb() {
            self.clear_color()
        } else {
            let [r, g, b] = self.clear_color.map(|c| c as f64 / 255.0);
            wgpu::Color { r, g, b, a: 1.0 }
        }
    }

    /// Draw the control panel. Returns true if any value changed.
    #[cfg(feature = "egui")]
    pub fn ui(&mut self, ctx: &egui::Context) -> bool {
        let before = *self;

        egui::Window::new("Controls")
            .default_pos([10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Clear color");
                    ui.color_edit_button_srgb(&mut self.clear_color);
                });
                ui.add(egui::Slider::new(&mut self.point_size, POINT_SIZE_RANGE).text("Point size"));

                ui.separator();
                ui.add(
                    egui::Slider::new(&mut self.flow_field_influence, INFLUENCE_RANGE)
                        .text("Influence"),
                );
                ui.add(
                    egui::Slider::new(&mut self.flow_field_strength, STRENGTH_RANGE)
                        .text("Strength"),
                );
                ui.add(
                    egui::Slider::new(&mut self.flow_field_frequency, FREQUENCY_RANGE)
                        .text("Frequency"),
                );

                ui.separator();
                ui.checkbox(&mut self.show_debug_plane, "Show state texture");
            });

        *self != before
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let controls = Controls::default();
        assert_eq!(controls.clear_color, [41, 25, 31]);
        assert_eq!(controls.point_size, 0.07);
        assert_eq!(controls.flow_field_influence, 0.5);
        assert_eq!(controls.flow_field_strength, 2.0);
        assert_eq!(controls.flow_field_frequency, 0.5);
        assert!(!controls.show_debug_plane);
    }

    #[test]
    fn test_defaults_within_bounds() {
        let c = Controls::default();
        assert!(POINT_SIZE_RANGE.contains(&c.point_size));
        assert!(INFLUENCE_RANGE.contains(&c.flow_field_influence));
        assert!(STRENGTH_RANGE.contains(&c.flow_field_strength));
        assert!(FREQUENCY_RANGE.contains(&c.flow_field_frequency));
    }

    #[test]
    fn test_simulation_uniforms() {
        let controls = Controls {
            flow_field_strength: 7.5,
            flow_field_frequency: 0.25,
            ..Default::default()
        };
        let u = controls.simulation_uniforms(3.0, 0.016, 51, 2562);
        assert_eq!(u.time, 3.0);
        assert_eq!(u.delta_time, 0.016);
        assert_eq!(u.flow_field_strength, 7.5);
        assert_eq!(u.flow_field_frequency, 0.25);
        assert_eq!(u.flow_field_influence, 0.5);
        assert_eq!(u.size, 51);
        assert_eq!(u.count, 2562);
    }

    #[test]
    fn test_out_of_range_writes_are_kept() {
        let controls = Controls {
            flow_field_strength: 42.0,
            ..Default::default()
        };
        let u = controls.simulation_uniforms(0.0, 0.0, 1, 1);
        assert_eq!(u.flow_field_strength, 42.0);
    }

    #[test]
    fn test_clear_color_linear() {
        let color = Controls::default().clear_color();
        // 0x29 = 41 -> ~0.0222 linear
        assert!((color.r - 0.0222).abs() < 1e-3);
        assert!(color.r > color.b && color.b > color.g);
        assert_eq!(color.a, 1.0);

        let raw = Controls::default().clear_color_for(wgpu::TextureFormat::Bgra8Unorm);
        assert!((raw.r - 41.0 / 255.0).abs() < 1e-9);
    }

    #[cfg(feature = "egui")]
    #[test]
    fn test_ui_without_input_reports_no_change() {
        let ctx = egui::Context::default();
        let mut controls = Controls::default();
        let mut changed = false;

        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| changed |= controls.ui(ctx));
        }

        assert!(!changed);
        assert_eq!(controls, Controls::default());
    }
}
