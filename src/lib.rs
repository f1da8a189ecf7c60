//! # Prism
//!
//! Umbrella crate for the Prism pipeline compiler. Re-exports the member
//! crates and flattens the items most callers need.
//!
//! | Crate | Contents |
//! |---|---|
//! | [`core`] | errors, defines, include registry, text helpers |
//! | [`preprocess`] | `#include` resolution and the conditional preprocessor |
//! | [`pipeline`] | definition parsing, layout engines, assembly, backend hand-off |

pub use prism_core as core;
pub use prism_pipeline as pipeline;
pub use prism_preprocess as preprocess;

pub use prism_core::{IncludeRegistry, IncludeSource, PrismError, Result, ShaderDefines};
pub use prism_pipeline::{
    CompileOptions, CompiledPipeline, LayoutRule, PipelineBackend, PipelineDefinition,
    PipelineDescriptor, ProgramSource, SectionKind, StageKind, State, VertexLayout, assemble,
    compile, parse_definition,
};
pub use prism_preprocess::{Preprocessor, preprocess};

pub mod prelude {
    pub use crate::{
        CompileOptions, CompiledPipeline, IncludeRegistry, LayoutRule, PipelineBackend,
        PipelineDescriptor, PrismError, ShaderDefines, StageKind, compile,
    };
}
