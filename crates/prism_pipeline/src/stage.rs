//! Shader stages and the program that groups them.
//!
//! A [`ProgramSource`] is either a graphics program (a vertex stage plus
//! optional geometry and fragment stages) or a compute program (a single
//! compute stage). Stage text is stored raw; the preprocessed form is derived
//! on demand and never cached.

use prism_core::{IncludeRegistry, PrismError, Result, ShaderDefines};
use prism_preprocess::Preprocessor;
use serde::Serialize;

use crate::schema::{TypeSchema, UniformSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StageKind {
    Vertex,
    Geometry,
    Fragment,
    Compute,
}

impl StageKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }

    /// Macro defined while preprocessing this stage.
    #[must_use]
    pub fn macro_name(self) -> &'static str {
        match self {
            Self::Vertex => "VERTEX",
            Self::Geometry => "GEOMETRY",
            Self::Fragment => "FRAGMENT",
            Self::Compute => "COMPUTE",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One stage's raw source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStage {
    pub kind: StageKind,
    pub source: String,
}

impl PipelineStage {
    #[must_use]
    pub fn new(kind: StageKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    /// Preprocesses the stage source.
    ///
    /// The stage macro (`VERTEX`, `FRAGMENT`, ...) is defined as `1`, `defines`
    /// are predefined, and when `stdlib` is set it is included ahead of the
    /// source. The standard library runs as its own pass, so `#error` line
    /// numbers count from the first line of the stage text.
    pub fn preprocess(
        &self,
        defines: &ShaderDefines,
        registry: &IncludeRegistry,
        stdlib: Option<&str>,
    ) -> Result<String> {
        let mut preprocessor = Preprocessor::new(registry)
            .with_origin(self.kind.name())
            .with_defines(defines);
        preprocessor.define(self.kind.macro_name(), "1");

        let Some(name) = stdlib else {
            return preprocessor.run(&self.source);
        };
        let prelude = preprocessor.run(&format!("#include \"{name}\""))?;
        let body = preprocessor.run(&self.source)?;
        Ok(match (prelude.is_empty(), body.is_empty()) {
            (true, _) => body,
            (false, true) => prelude,
            (false, false) => format!("{prelude}\n{body}"),
        })
    }
}

/// Stages of a program plus the defines and schemas they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramSource {
    defines: ShaderDefines,
    types: TypeSchema,
    uniforms: UniformSchema,
    /// Sorted by kind, at most one per kind
    stages: Vec<PipelineStage>,
}

impl ProgramSource {
    /// A graphics program with a vertex entry stage.
    #[must_use]
    pub fn graphics(vertex: impl Into<String>) -> Self {
        Self::with_entry(PipelineStage::new(StageKind::Vertex, vertex))
    }

    /// A compute program.
    #[must_use]
    pub fn compute(source: impl Into<String>) -> Self {
        Self::with_entry(PipelineStage::new(StageKind::Compute, source))
    }

    fn with_entry(entry: PipelineStage) -> Self {
        Self {
            defines: ShaderDefines::new(),
            types: TypeSchema::new(),
            uniforms: UniformSchema::new(),
            stages: vec![entry],
        }
    }

    #[must_use]
    pub fn with_defines(mut self, defines: ShaderDefines) -> Self {
        self.defines = defines;
        self
    }

    #[must_use]
    pub fn with_types(mut self, types: TypeSchema) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn with_uniforms(mut self, uniforms: UniformSchema) -> Self {
        self.uniforms = uniforms;
        self
    }

    /// Adds a geometry or fragment stage to a graphics program, or replaces
    /// the entry stage's source.
    ///
    /// Returns `false` when the stage cannot belong to this program: compute
    /// programs take no other stage and graphics programs take no compute stage.
    pub fn add_stage(&mut self, kind: StageKind, source: impl Into<String>) -> bool {
        let compatible = match kind {
            StageKind::Compute => self.is_compute(),
            StageKind::Vertex | StageKind::Geometry | StageKind::Fragment => !self.is_compute(),
        };
        if !compatible {
            log::warn!(
                "{kind} stage cannot be added to a {} program",
                if self.is_compute() { "compute" } else { "graphics" }
            );
            return false;
        }

        let stage = PipelineStage::new(kind, source);
        match self.stages.binary_search_by_key(&kind, |s| s.kind) {
            Ok(index) => {
                log::debug!("Replacing {kind} stage source");
                self.stages[index] = stage;
            }
            Err(index) => self.stages.insert(index, stage),
        }
        true
    }

    #[must_use]
    pub fn is_compute(&self) -> bool {
        self.stages.iter().any(|s| s.kind == StageKind::Compute)
    }

    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&PipelineStage> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    #[must_use]
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    #[must_use]
    pub fn defines(&self) -> &ShaderDefines {
        &self.defines
    }

    pub fn defines_mut(&mut self) -> &mut ShaderDefines {
        &mut self.defines
    }

    #[must_use]
    pub fn types(&self) -> &TypeSchema {
        &self.types
    }

    #[must_use]
    pub fn uniforms(&self) -> &UniformSchema {
        &self.uniforms
    }

    /// Preprocessed text of stage `kind` using this program's defines.
    pub fn preprocess(
        &self,
        kind: StageKind,
        registry: &IncludeRegistry,
        stdlib: Option<&str>,
    ) -> Result<String> {
        let Some(stage) = self.stage(kind) else {
            log::error!("Program has no {kind} stage");
            return Err(PrismError::StageNotPresent(kind.name().to_string()));
        };
        stage.preprocess(&self.defines, registry, stdlib)
    }
}
