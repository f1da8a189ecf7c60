//! Backend Hand-off
//!
//! The compiler never talks to a GPU. A [`PipelineBackend`] receives a
//! borrowed [`PipelineDescriptor`] and turns it into whatever pipeline object
//! its API uses.
//!
//! ```rust,ignore
//! struct GlBackend { /* context */ }
//!
//! impl PipelineBackend for GlBackend {
//!     type Pipeline = GlProgram;
//!     type Error = GlError;
//!
//!     fn create_pipeline(&mut self, desc: &PipelineDescriptor<'_>) -> Result<GlProgram, GlError> {
//!         let vs = self.compile(gl::VERTEX_SHADER, desc.stage(StageKind::Vertex).unwrap_or_default())?;
//!         // ...
//!     }
//! }
//!
//! let pipeline = compiled.build(&mut backend)?;
//! ```

use crate::assembler::StageOutput;
use crate::layout::{LayoutRule, VertexLayout};
use crate::stage::{ProgramSource, StageKind};
use crate::state::State;

/// Borrowed view of a compiled pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineDescriptor<'a> {
    pub layout: Option<&'a VertexLayout>,
    pub program: &'a ProgramSource,
    /// Preprocessed stage sources
    pub stages: &'a [StageOutput],
    pub state: &'a State,
    /// Rule used to size uniform buffer memory
    pub layout_rule: LayoutRule,
}

impl<'a> PipelineDescriptor<'a> {
    /// Preprocessed source of stage `kind`.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&'a str> {
        self.stages
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.source.as_str())
    }

    #[must_use]
    pub fn is_compute(&self) -> bool {
        self.program.is_compute()
    }
}

/// Creates API pipeline objects from compiled pipelines.
pub trait PipelineBackend {
    type Pipeline;
    type Error: std::fmt::Display;

    fn create_pipeline(&mut self, desc: &PipelineDescriptor<'_>) -> Result<Self::Pipeline, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::compile;
    use crate::options::CompileOptions;
    use prism_core::{IncludeRegistry, PrismError};

    /// Records what it was handed and fails on request.
    #[derive(Default)]
    struct RecordingBackend {
        fail: bool,
        created: Vec<(Option<u32>, Vec<StageKind>)>,
    }

    impl PipelineBackend for RecordingBackend {
        type Pipeline = usize;
        type Error = String;

        fn create_pipeline(&mut self, desc: &PipelineDescriptor<'_>) -> Result<usize, String> {
            if self.fail {
                return Err("shader compilation failed".to_string());
            }
            let stride = desc.layout.map(VertexLayout::stride);
            let kinds = desc.stages.iter().map(|s| s.kind).collect();
            self.created.push((stride, kinds));
            Ok(self.created.len() - 1)
        }
    }

    fn pipeline() -> crate::assembler::CompiledPipeline {
        let _ = env_logger::builder().is_test(true).try_init();
        let registry = IncludeRegistry::new();
        let document = "#section layout\nvec4 color\n#section vertex\nv\n#section fragment\nf";
        compile(document, &registry, &CompileOptions::default().without_stdlib_include()).unwrap()
    }

    #[test]
    fn test_build_hands_over_descriptor() {
        let pipeline = pipeline();
        let mut backend = RecordingBackend::default();

        assert_eq!(pipeline.build(&mut backend), Ok(0));
        assert_eq!(
            backend.created,
            vec![(Some(16), vec![StageKind::Vertex, StageKind::Fragment])]
        );

        let desc = pipeline.descriptor();
        assert_eq!(desc.stage(StageKind::Fragment), Some("f"));
        assert!(!desc.is_compute());
    }

    #[test]
    fn test_backend_errors_are_wrapped() {
        let pipeline = pipeline();
        let mut backend = RecordingBackend {
            fail: true,
            ..Default::default()
        };
        assert_eq!(
            pipeline.build(&mut backend),
            Err(PrismError::Backend("shader compilation failed".to_string()))
        );
    }
}
