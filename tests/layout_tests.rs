//! Layout Engine Tests
//!
//! Tests for:
//! - VertexLayoutBuilder: offsets, stride, backing types
//! - PackedGroup: bit offsets, overflow, pack/unpack
//! - LayoutRule: value and struct sizes under std140, std430 and packed
//! - GLSL input and unpack generation

use prism::pipeline::layout::{AttributeDecl, AttributeType, ComponentKind, VertexLayoutBuilder};
use prism::pipeline::parser::parse_layout;
use prism::pipeline::schema::{PropertyDecl, PropertyType, StructDecl, TypeSchema, ValueType};
use prism::{LayoutRule, PrismError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Vertex Layout
// ============================================================================

#[test]
fn plain_attributes_are_tightly_packed() {
    init_logger();
    let layout = parse_layout("vec3 position\nvec2 uv").unwrap().unwrap();
    assert_eq!(layout.offsets(), vec![0, 12]);
    assert_eq!(layout.stride(), 20);
}

#[test]
fn builder_matches_parser() {
    init_logger();
    let mut builder = VertexLayoutBuilder::new();
    builder.add("position", AttributeDecl::new(AttributeType::Float, 3));
    builder.add("uv", AttributeDecl::new(AttributeType::Float, 2));

    let parsed = parse_layout("vec3 position\nvec2 uv").unwrap().unwrap();
    assert_eq!(builder.build(), parsed);
}

#[test]
fn empty_layout_section_yields_none() {
    init_logger();
    assert_eq!(parse_layout("mat4 model\nvec3").unwrap(), None);
}

// ============================================================================
// Packed Groups
// ============================================================================

#[test]
fn packed_fields_take_consecutive_bits() {
    init_logger();
    let layout = parse_layout("packed { byte flags 4  byte kind 4 }").unwrap().unwrap();
    let group = layout.packed_groups().next().unwrap();

    assert_eq!(group.field("flags").unwrap().offset, 0);
    assert_eq!(group.field("kind").unwrap().offset, 4);
    assert_eq!(group.used_bits(), 8);
    assert_eq!(layout.stride(), 4);
}

#[test]
fn packed_overflow_reports_bits() {
    init_logger();
    let err = parse_layout("packed {\nbyte flags 4\nbyte kind 4\nint extra 30\n}").unwrap_err();
    assert_eq!(
        err,
        PrismError::PackedGroupOverflow {
            group: "packed0".to_string(),
            field: "extra".to_string(),
            requested: 30,
            available: 24,
        }
    );
}

#[test]
fn packed_overflow_is_fatal_for_any_field_type() {
    init_logger();
    for (document, requested, available) in [
        ("packed {\nbyte flags 4\nbyte kind 4\nbyte extra 30\n}", 30, 24),
        ("packed {\nint a 33\n}", 33, 32),
        ("packed {\nshort s 16\nivec2 v 9\n}", 18, 16),
    ] {
        let err = parse_layout(document).unwrap_err();
        assert!(
            matches!(err, PrismError::PackedGroupOverflow { requested: r, available: a, .. } if r == requested && a == available),
            "{document:?} gave {err:?}"
        );
    }
}

#[test]
fn over_wide_field_that_fits_is_skipped() {
    init_logger();
    let layout = parse_layout("packed {\nbyte wide 9\nbyte ok 4\n}").unwrap().unwrap();
    let group = layout.packed_groups().next().unwrap();
    assert!(group.field("wide").is_none());
    assert_eq!(group.field("ok").unwrap().offset, 0);
}

#[test]
fn packed_vector_components() {
    init_logger();
    let layout = parse_layout("vec3 position\npacked bone {\nivec3 cell 8\nbyte weight 8\n}")
        .unwrap()
        .unwrap();

    let cell = layout.component("cell").unwrap();
    let ComponentKind::Packed(field) = &cell.kind else {
        panic!("cell should be packed");
    };
    assert_eq!(field.total_bits(), 24);
    assert_eq!(field.component_offset(2), 16);
    assert_eq!(layout.attribute_for("weight").unwrap().name, "bone");
    assert_eq!(layout.attribute_offset(1), Some(12));

    let group = layout.attribute("bone").unwrap().packed.as_ref().unwrap();
    let word = group.pack(&[1, 2, 3, 200]);
    assert_eq!(word, 1 | (2 << 8) | (3 << 16) | (200 << 24));
    assert_eq!(group.unpack(word), vec![1, 2, 3, 200]);
}

#[test]
fn glsl_inputs_and_unpack() {
    init_logger();
    let layout = parse_layout("vec3 position\npacked {\nbyte flags 4\n}").unwrap().unwrap();
    let inputs = layout.glsl_inputs();
    assert_eq!(inputs, "in vec3 position;\nin int packed0;");
    assert!(layout.glsl_unpack().contains("int flags = (packed0 >> 0) & 0xF;"));
}

// ============================================================================
// Memory Layout Rules
// ============================================================================

#[test]
fn value_sizes_per_rule() {
    assert_eq!(LayoutRule::Std140.value_size(ValueType::FLOAT), 16);
    assert_eq!(LayoutRule::Std430.value_size(ValueType::FLOAT), 4);
    assert_eq!(LayoutRule::Std430.value_size(ValueType::VEC3), 16);
    assert_eq!(LayoutRule::Packed.value_size(ValueType::VEC3), 12);
    assert_eq!(LayoutRule::Std140.value_size(ValueType::MAT3), 48);
    assert_eq!(LayoutRule::Packed.value_size(ValueType::MAT3), 36);
}

#[test]
fn struct_layout_per_rule() {
    let mut types = TypeSchema::new();
    let mut particle = StructDecl::new("Particle");
    particle.push(PropertyDecl::new("position", PropertyType::Value(ValueType::VEC3), 1), 12);
    particle.push(PropertyDecl::new("life", PropertyType::Value(ValueType::FLOAT), 1), 4);
    types.add(particle);

    let std140 = types.layout("Particle", LayoutRule::Std140).unwrap();
    assert_eq!(std140.offsets(), vec![0, 16]);
    assert_eq!(std140.size, 32);

    let std430 = types.layout("Particle", LayoutRule::Std430).unwrap();
    assert_eq!(std430.offsets(), vec![0, 16]);
    assert_eq!(std430.size, 20);

    let packed = types.layout("Particle", LayoutRule::Packed).unwrap();
    assert_eq!(packed.offsets(), vec![0, 12]);
    assert_eq!(packed.size, 16);
    assert_eq!(packed.property("life").unwrap().padding, 0);
}
