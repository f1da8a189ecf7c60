//! Type and uniform schemas.
//!
//! - [`TypeSchema`]: structs declared in the `types` section
//! - [`UniformSchema`]: values, samplers, images and buffer blocks declared in
//!   the `uniforms` section
//! - [`ValueType`]: the built-in scalar, vector and matrix types both refer to

pub mod types;
pub mod uniforms;
pub mod value;

pub use types::{PropertyDecl, PropertyType, StructDecl, TypeSchema};
pub use uniforms::{BufferBlock, PixelFormat, TextureDim, UniformDecl, UniformKind, UniformSchema};
pub use value::{ScalarKind, ValueType};
