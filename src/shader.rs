//! WGSL sources for the compute and render pipelines.

use crate::shader_utils;

pub const FLOW_FIELD_SOURCE: &str = include_str!("shaders/flow_field.wgsl");
pub const PARTICLES_SOURCE: &str = include_str!("shaders/particles.wgsl");
pub const DEBUG_PLANE_SOURCE: &str = include_str!("shaders/debug_plane.wgsl");

/// Workgroup edge of the flow-field compute shader (`@workgroup_size(8, 8)`).
pub const FLOW_FIELD_WORKGROUP: u32 = 8;

/// Complete flow-field compute shader, utility prelude included.
pub fn flow_field_shader() -> String {
    format!("{}\n{}", shader_utils::all_utils_wgsl(), FLOW_FIELD_SOURCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {}", e.emit_to_string(code)))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    #[test]
    fn test_flow_field_shader_validates() {
        validate_wgsl(&flow_field_shader()).expect("flow field WGSL should be valid");
    }

    #[test]
    fn test_flow_field_needs_prelude() {
        // The bare source calls simplex4/smooth_ramp without defining them
        assert!(validate_wgsl(FLOW_FIELD_SOURCE).is_err());
    }

    #[test]
    fn test_particles_shader_validates() {
        validate_wgsl(PARTICLES_SOURCE).expect("particle WGSL should be valid");
    }

    #[test]
    fn test_debug_plane_shader_validates() {
        validate_wgsl(DEBUG_PLANE_SOURCE).expect("debug plane WGSL should be valid");
    }

    #[test]
    fn test_utils_validate_standalone() {
        let code = format!(
            "{}\n@compute @workgroup_size(1)\nfn main() {{ let n = simplex4(vec4<f32>(0.5)); let s = smooth_ramp(0.0, 1.0, n); }}\n",
            shader_utils::all_utils_wgsl()
        );
        validate_wgsl(&code).expect("utility WGSL should be valid");
    }

    #[test]
    fn test_workgroup_size_matches_shader() {
        let attr = format!("@workgroup_size({0}, {0})", FLOW_FIELD_WORKGROUP);
        assert!(FLOW_FIELD_SOURCE.contains(&attr));
    }
}
