//! Byte and bit level layout engines.
//!
//! - [`vertex`]: vertex attributes, offsets, stride and bit-packed groups
//! - [`memory`]: struct and buffer block layout under a [`LayoutRule`]

pub mod memory;
pub mod vertex;

pub use memory::{LayoutRule, PropertyLayout, StructLayout};
pub use vertex::{
    Attribute, AttributeDecl, AttributeType, BasicType, Component, ComponentKind, PackedField,
    PackedGroup, VertexLayout, VertexLayoutBuilder,
};
