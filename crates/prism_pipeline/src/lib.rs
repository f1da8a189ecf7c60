//! # Prism - Pipeline
//!
//! Compiles a sectioned pipeline definition document into a backend-agnostic
//! [`CompiledPipeline`]:
//!
//! - [`parser`]: splits the document into `#section`s and parses each one
//! - [`layout`]: vertex attribute packing and uniform memory layout engines
//! - [`schema`]: struct and uniform declarations
//! - [`state`]: fixed-function render state
//! - [`stage`]: program stages and their preprocessing
//! - [`assembler`]: turns a parsed definition into a compiled pipeline
//! - [`backend`]: the [`PipelineBackend`] hand-off trait
//!
//! ```rust,ignore
//! let registry = IncludeRegistry::new();
//! registry.register_source("stdlib", STDLIB_GLSL);
//!
//! let pipeline = compile(document, &registry, &CompileOptions::default())?;
//! let handle = pipeline.build(&mut my_backend)?;
//! ```

pub mod assembler;
pub mod backend;
pub mod layout;
pub mod options;
pub mod parser;
pub mod schema;
pub mod section;
pub mod stage;
pub mod state;

#[cfg(feature = "wgpu")]
pub mod wgpu_layout;

pub use assembler::{CompiledPipeline, StageOutput, assemble, compile};
pub use backend::{PipelineBackend, PipelineDescriptor};
pub use layout::{
    AttributeDecl, AttributeType, LayoutRule, PackedGroup, StructLayout, VertexLayout,
    VertexLayoutBuilder,
};
pub use options::{CompileOptions, DEFAULT_STDLIB_INCLUDE};
pub use parser::parse_definition;
pub use schema::{TypeSchema, UniformSchema, ValueType};
pub use section::{DefinitionSection, PipelineDefinition, SectionKind, StageSource};
pub use stage::{PipelineStage, ProgramSource, StageKind};
pub use state::State;
