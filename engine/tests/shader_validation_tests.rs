//! Shader Validation Tests
//!
//! Parses and validates every shipped WGSL shader with naga, so a shader
//! that would fail pipeline creation at startup is caught by `cargo test`
//! without a GPU.

use froxel_fog_engine::render::shader_loader::paths;
use froxel_fog_engine::render::{load_shader_file, ShaderSource};

fn validate_wgsl(label: &str, source: &str) {
    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|e| panic!("{} failed to parse: {}", label, e.emit_to_string(source)));

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .unwrap_or_else(|e| panic!("{} failed validation: {:?}", label, e));
}

fn load(path: &str) -> String {
    // Resolve relative to the manifest dir so the test passes regardless of
    // the working directory cargo uses.
    let full = format!("{}/{}", env!("CARGO_MANIFEST_DIR"), path);
    match load_shader_file(&full).expect("shader file must exist") {
        ShaderSource::Runtime(s) => s,
        ShaderSource::Embedded(s) => s.to_string(),
    }
}

#[test]
fn test_light_inject_shader_validates() {
    let src = load(paths::LIGHT_INJECT);
    validate_wgsl("light_inject.wgsl", &src);
    assert!(src.contains("fn cs_inject"));
}

#[test]
fn test_temporal_blend_shader_validates() {
    let src = load(paths::TEMPORAL_BLEND);
    validate_wgsl("temporal_blend.wgsl", &src);
    assert!(src.contains("fn cs_blend"));
}

#[test]
fn test_ray_march_shader_validates() {
    let src = load(paths::RAY_MARCH);
    validate_wgsl("ray_march.wgsl", &src);
    assert!(src.contains("fn cs_march"));
}

#[test]
fn test_fog_sample_library_validates() {
    let src = load(paths::FOG_SAMPLE);
    validate_wgsl("fog_sample.wgsl", &src);
    assert!(src.contains("fn sample_fog"));
}

#[test]
fn test_stage_shaders_share_uniform_struct() {
    // The three compute stages must declare the identical FogUniforms
    // block; a drifted copy would corrupt every field after the drift.
    let extract = |src: &str| -> String {
        let start = src.find("struct FogUniforms").expect("missing FogUniforms");
        let end = src[start..].find("};").expect("unterminated struct") + start;
        src[start..end].to_string()
    };

    let inject = extract(&load(paths::LIGHT_INJECT));
    let blend = extract(&load(paths::TEMPORAL_BLEND));
    let march = extract(&load(paths::RAY_MARCH));

    // Compare field lists, ignoring per-file comments and whitespace.
    let fields = |s: &str| -> Vec<String> {
        s.lines()
            .map(str::trim)
            .filter(|l| !l.starts_with("//") && l.contains(':'))
            .map(|l| l.split("//").next().unwrap_or(l).trim().to_string())
            .collect()
    };
    assert_eq!(fields(&inject), fields(&blend));
    assert_eq!(fields(&inject), fields(&march));
}

#[test]
fn test_workgroup_sizes_match_dispatch() {
    // Dispatch math in fog_dispatch.rs assumes 8x8x1 workgroups.
    for path in [paths::LIGHT_INJECT, paths::TEMPORAL_BLEND, paths::RAY_MARCH] {
        let src = load(path);
        assert!(
            src.contains("@workgroup_size(8, 8, 1)"),
            "{} must use 8x8x1 workgroups",
            path
        );
    }
}
