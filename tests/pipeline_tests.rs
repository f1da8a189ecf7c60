//! Pipeline Compilation Tests
//!
//! End-to-end tests for:
//! - Document compilation: section splitting, program kind, stage output
//! - Preprocessing through `compile`: defines, stdlib include, `#error`
//! - Uniform buffer sizing under each layout rule
//! - Backend hand-off and serialization of compiled pipelines

use prism::pipeline::state::{Blend, BlendFactor, BlendOp, CullMode, DepthTest};
use prism::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const MESH_DEFINITION: &str = "\
// Lit mesh
#section layout
vec3 position
vec3 normal
normalized vec4 color byte
packed material {
    byte flags 4
    ivec2 cell 6
}

#section types
struct Light {
    vec3 direction;
    vec3 color;
}

#section uniforms
mat4 model
Light sun
sampler2D albedo
buffer Camera {
    mat4 view_projection
    vec3 position
    float exposure
}

#section state
cull back
blend src_alpha one_minus_src_alpha
depth lequal

#section common
#define PI 3.14159

#section vertex
#ifdef VERTEX
vertex PI
#endif

#section fragment
#if SHADOWS == 1
fragment shadows
#else
fragment plain
#endif
";

fn stdlib_registry() -> IncludeRegistry {
    let registry = IncludeRegistry::new();
    registry.register_source("stdlib", "#define STDLIB 1");
    registry
}

// ============================================================================
// Document Compilation
// ============================================================================

#[test]
fn compile_full_definition() {
    init_logger();
    let registry = stdlib_registry();
    let options = CompileOptions::default().with_define("SHADOWS", "1");

    let pipeline = compile(MESH_DEFINITION, &registry, &options).unwrap();
    assert!(!pipeline.is_compute());

    let layout = pipeline.layout.as_ref().unwrap();
    assert_eq!(layout.offsets(), vec![0, 12, 24, 28]);
    assert_eq!(layout.stride(), 32);

    assert_eq!(pipeline.state.cull, Some(CullMode::Back));
    assert_eq!(
        pipeline.state.blend,
        Some(Blend::Enabled {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
            op: BlendOp::Add,
        })
    );
    assert!(matches!(pipeline.state.depth, Some(DepthTest::Enabled(_))));
    assert_eq!(pipeline.state.stencil, None);

    assert_eq!(pipeline.stage(StageKind::Vertex), Some("vertex 3.14159"));
    assert_eq!(pipeline.stage(StageKind::Fragment), Some("fragment shadows"));
    assert_eq!(pipeline.stage(StageKind::Geometry), None);
}

#[test]
fn defines_select_branches() {
    init_logger();
    let registry = stdlib_registry();

    let plain = compile(MESH_DEFINITION, &registry, &CompileOptions::default()).unwrap();
    assert_eq!(plain.stage(StageKind::Fragment), Some("fragment plain"));
}

#[test]
fn fragment_only_definition_has_no_stage() {
    init_logger();
    let registry = stdlib_registry();
    let err = compile(
        "#section fragment\nvoid main() {}",
        &registry,
        &CompileOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err, PrismError::MissingEntryStage);
    assert!(err.to_string().contains("no stage"));
}

#[test]
fn compute_definition() {
    init_logger();
    let registry = stdlib_registry();
    let document = "\
#section uniforms
image2D target rgba8
#section compute
#ifdef COMPUTE
dispatch STDLIB
#endif
";
    let pipeline = compile(document, &registry, &CompileOptions::default()).unwrap();
    assert!(pipeline.is_compute());
    assert_eq!(pipeline.stages.len(), 1);
    assert_eq!(pipeline.stage(StageKind::Compute), Some("dispatch 1"));
    assert_eq!(
        pipeline.glsl_declarations(),
        "layout(rgba8) uniform image2D target;"
    );
}

#[test]
fn missing_stdlib_aborts() {
    init_logger();
    let registry = IncludeRegistry::new();
    let err = compile("#section vertex\nv", &registry, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, PrismError::ErrorDirective { .. }));
    assert!(err.to_string().contains("stdlib"));
}

#[test]
fn custom_stdlib_name() {
    init_logger();
    let registry = IncludeRegistry::new();
    registry.register_source("engine/common", "#define ENGINE 1");
    let options = CompileOptions::default().with_stdlib_include("engine/common");

    let pipeline = compile("#section vertex\nENGINE", &registry, &options).unwrap();
    assert_eq!(pipeline.stage(StageKind::Vertex), Some("1"));
}

#[test]
fn packed_overflow_aborts_compilation() {
    init_logger();
    let registry = stdlib_registry();
    let document = "#section layout\npacked {\nbyte flags 4\nbyte kind 4\nint extra 30\n}\n#section vertex\nv";
    let err = compile(document, &registry, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, PrismError::PackedGroupOverflow { requested: 30, available: 24, .. }));
}

// ============================================================================
// Buffer Sizing
// ============================================================================

#[test]
fn buffer_sizes_per_layout_rule() {
    init_logger();
    let registry = stdlib_registry();

    let sizes: Vec<u32> = [LayoutRule::Std140, LayoutRule::Std430, LayoutRule::Packed]
        .into_iter()
        .map(|rule| {
            let options = CompileOptions::default().with_layout_rule(rule);
            let pipeline = compile(MESH_DEFINITION, &registry, &options).unwrap();
            pipeline.buffer_sizes()[0].1
        })
        .collect();

    assert_eq!(sizes, vec![96, 84, 80]);
}

#[test]
fn struct_layout_from_types_section() {
    init_logger();
    let registry = stdlib_registry();
    let pipeline = compile(MESH_DEFINITION, &registry, &CompileOptions::default()).unwrap();

    let light = pipeline
        .program
        .types()
        .layout("Light", LayoutRule::Std140)
        .unwrap();
    assert_eq!(light.offsets(), vec![0, 16]);
    assert_eq!(light.size, 32);
}

// ============================================================================
// Backend Hand-off
// ============================================================================

struct CountingBackend {
    stages_seen: usize,
}

impl PipelineBackend for CountingBackend {
    type Pipeline = u32;
    type Error = PrismError;

    fn create_pipeline(&mut self, desc: &PipelineDescriptor<'_>) -> Result<u32, PrismError> {
        self.stages_seen += desc.stages.len();
        desc.layout
            .map(prism::VertexLayout::stride)
            .ok_or(PrismError::MissingEntryStage)
    }
}

#[test]
fn backend_receives_descriptor() {
    init_logger();
    let registry = stdlib_registry();
    let pipeline = compile(MESH_DEFINITION, &registry, &CompileOptions::default()).unwrap();

    let mut backend = CountingBackend { stages_seen: 0 };
    assert_eq!(pipeline.build(&mut backend), Ok(32));
    assert_eq!(backend.stages_seen, 2);
}

#[test]
fn compiled_pipeline_serializes() {
    init_logger();
    let registry = stdlib_registry();
    let pipeline = compile(MESH_DEFINITION, &registry, &CompileOptions::default()).unwrap();

    let json = serde_json::to_value(&pipeline).unwrap();
    assert_eq!(json["layout"]["stride"], 32);
    assert_eq!(json["stages"][0]["kind"], "Vertex");
    assert_eq!(json["stages"][1]["source"], "fragment plain");
    assert_eq!(json["layout_rule"], "Std140");
}
