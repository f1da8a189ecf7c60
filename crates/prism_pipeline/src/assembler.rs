//! Pipeline Assembly
//!
//! Turns a parsed [`PipelineDefinition`] into a [`CompiledPipeline`]:
//!
//! 1. Chooses the program kind. A `vertex` section makes a graphics program
//!    (with optional `geometry` and `fragment` stages); otherwise a `compute`
//!    section makes a compute program. A definition with neither fails with
//!    [`PrismError::MissingEntryStage`].
//! 2. Prefixes every stage with the `common` section.
//! 3. Preprocesses every stage with its stage macro, the caller's defines and
//!    the standard library include. An active `#error` aborts assembly.

use prism_core::{IncludeRegistry, PrismError, Result};
use serde::Serialize;

use crate::backend::{PipelineBackend, PipelineDescriptor};
use crate::layout::{LayoutRule, VertexLayout};
use crate::options::CompileOptions;
use crate::parser::parse_definition;
use crate::section::{DefinitionSection, PipelineDefinition, SectionKind};
use crate::stage::{ProgramSource, StageKind};
use crate::state::State;

/// Preprocessed text of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutput {
    pub kind: StageKind,
    pub source: String,
}

/// Everything a backend needs to create the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledPipeline {
    pub layout: Option<VertexLayout>,
    pub program: ProgramSource,
    pub state: State,
    /// One entry per program stage, in stage order
    pub stages: Vec<StageOutput>,
    pub layout_rule: LayoutRule,
}

impl CompiledPipeline {
    /// Preprocessed source of stage `kind`.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&str> {
        self.stages
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.source.as_str())
    }

    #[must_use]
    pub fn is_compute(&self) -> bool {
        self.program.is_compute()
    }

    /// Backing memory size of every buffer block, in declaration order.
    #[must_use]
    pub fn buffer_sizes(&self) -> Vec<(&str, u32)> {
        let types = self.program.types();
        self.program
            .uniforms()
            .buffers()
            .map(|block| (block.name.as_str(), block.layout(self.layout_rule, types).size))
            .collect()
    }

    /// GLSL declarations for the program's structs and uniforms.
    #[must_use]
    pub fn glsl_declarations(&self) -> String {
        let types = self.program.types().glsl_declarations();
        let uniforms = self.program.uniforms().glsl_declarations(self.layout_rule);
        match (types.is_empty(), uniforms.is_empty()) {
            (false, false) => format!("{types}\n{uniforms}"),
            (false, true) => types,
            (true, _) => uniforms,
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> PipelineDescriptor<'_> {
        PipelineDescriptor {
            layout: self.layout.as_ref(),
            program: &self.program,
            stages: &self.stages,
            state: &self.state,
            layout_rule: self.layout_rule,
        }
    }

    /// Hands the pipeline to `backend`.
    pub fn build<B: PipelineBackend>(&self, backend: &mut B) -> Result<B::Pipeline> {
        backend.create_pipeline(&self.descriptor()).map_err(|err| {
            log::error!("Backend rejected pipeline: {err}");
            PrismError::Backend(err.to_string())
        })
    }
}

/// Parses and assembles a pipeline definition document.
pub fn compile(
    document: &str,
    registry: &IncludeRegistry,
    options: &CompileOptions,
) -> Result<CompiledPipeline> {
    let definition = parse_definition(document)?;
    assemble(definition, registry, options)
}

/// Assembles a parsed definition.
pub fn assemble(
    mut definition: PipelineDefinition,
    registry: &IncludeRegistry,
    options: &CompileOptions,
) -> Result<CompiledPipeline> {
    let common = take_source(&mut definition, SectionKind::Common);
    let with_common = |stage: String| match &common {
        Some(common) => format!("{common}\n{stage}"),
        None => stage,
    };

    let vertex = take_source(&mut definition, SectionKind::Vertex);
    let geometry = take_source(&mut definition, SectionKind::Geometry);
    let fragment = take_source(&mut definition, SectionKind::Fragment);
    let compute = take_source(&mut definition, SectionKind::Compute);

    let program = match (vertex, compute) {
        (Some(vertex), compute) => {
            if compute.is_some() {
                log::warn!("Definition has both vertex and compute sections, compute is ignored");
            }
            let mut program = ProgramSource::graphics(with_common(vertex));
            if let Some(geometry) = geometry {
                program.add_stage(StageKind::Geometry, with_common(geometry));
            }
            if let Some(fragment) = fragment {
                program.add_stage(StageKind::Fragment, with_common(fragment));
            }
            program
        }
        (None, Some(compute)) => {
            if geometry.is_some() || fragment.is_some() {
                log::warn!("Geometry and fragment sections need a vertex section, ignored");
            }
            ProgramSource::compute(with_common(compute))
        }
        (None, None) => {
            log::error!("Pipeline definition has neither a vertex nor a compute section");
            return Err(PrismError::MissingEntryStage);
        }
    };

    let types = match definition.take_section(SectionKind::Types) {
        Some(DefinitionSection::Types(types)) => types,
        _ => Default::default(),
    };
    let uniforms = match definition.take_section(SectionKind::Uniforms) {
        Some(DefinitionSection::Uniforms(uniforms)) => uniforms,
        _ => Default::default(),
    };
    let program = program
        .with_defines(options.defines.clone())
        .with_types(types)
        .with_uniforms(uniforms);

    let mut layout = match definition.take_section(SectionKind::Layout) {
        Some(DefinitionSection::Layout(layout)) => layout,
        _ => None,
    };
    if program.is_compute() && layout.take().is_some() {
        log::warn!("Vertex layout has no meaning for a compute program, ignored");
    }

    let state = match definition.take_section(SectionKind::State) {
        Some(DefinitionSection::State(state)) => state,
        _ => State::default(),
    };

    let stdlib = options.stdlib_include.as_deref();
    let mut stages = Vec::with_capacity(program.stages().len());
    for stage in program.stages() {
        let source = stage.preprocess(program.defines(), registry, stdlib)?;
        log::debug!("Assembled {} stage ({} bytes)", stage.kind, source.len());
        stages.push(StageOutput {
            kind: stage.kind,
            source,
        });
    }

    Ok(CompiledPipeline {
        layout,
        program,
        state,
        stages,
        layout_rule: options.layout_rule,
    })
}

fn take_source(definition: &mut PipelineDefinition, kind: SectionKind) -> Option<String> {
    match definition.take_section(kind)? {
        DefinitionSection::Source(source) => Some(source.into_text()),
        _ => None,
    }
}
