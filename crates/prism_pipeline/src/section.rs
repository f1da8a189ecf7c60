//! Parsed pipeline definition: one typed section per [`SectionKind`].

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::layout::VertexLayout;
use crate::schema::{TypeSchema, UniformSchema};
use crate::stage::StageKind;
use crate::state::State;

/// The nine sections a pipeline definition may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SectionKind {
    Layout,
    Types,
    State,
    Uniforms,
    Common,
    Vertex,
    Geometry,
    Fragment,
    Compute,
}

impl SectionKind {
    pub const ALL: [Self; 9] = [
        Self::Layout,
        Self::Types,
        Self::State,
        Self::Uniforms,
        Self::Common,
        Self::Vertex,
        Self::Geometry,
        Self::Fragment,
        Self::Compute,
    ];

    /// Case-insensitive lookup of a `#section` name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Types => "types",
            Self::State => "state",
            Self::Uniforms => "uniforms",
            Self::Common => "common",
            Self::Vertex => "vertex",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }

    /// Sections holding shader source text.
    #[must_use]
    pub fn is_source(self) -> bool {
        matches!(
            self,
            Self::Common | Self::Vertex | Self::Geometry | Self::Fragment | Self::Compute
        )
    }

    /// The stage a source section compiles to. `common` has none.
    #[must_use]
    pub fn stage(self) -> Option<StageKind> {
        match self {
            Self::Vertex => Some(StageKind::Vertex),
            Self::Geometry => Some(StageKind::Geometry),
            Self::Fragment => Some(StageKind::Fragment),
            Self::Compute => Some(StageKind::Compute),
            _ => None,
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw text of a source section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSource {
    kind: SectionKind,
    text: String,
}

impl StageSource {
    /// Returns `None` when `kind` is not a source section.
    #[must_use]
    pub fn new(kind: SectionKind, text: impl Into<String>) -> Option<Self> {
        kind.is_source().then(|| Self {
            kind,
            text: text.into(),
        })
    }

    #[must_use]
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// One parsed section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DefinitionSection {
    /// `None` when the section declared no usable attribute
    Layout(Option<VertexLayout>),
    Types(TypeSchema),
    State(State),
    Uniforms(UniformSchema),
    Source(StageSource),
}

impl DefinitionSection {
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Layout(_) => SectionKind::Layout,
            Self::Types(_) => SectionKind::Types,
            Self::State(_) => SectionKind::State,
            Self::Uniforms(_) => SectionKind::Uniforms,
            Self::Source(source) => source.kind(),
        }
    }
}

/// Sections of a pipeline definition, at most one per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDefinition {
    sections: FxHashMap<SectionKind, DefinitionSection>,
}

impl PipelineDefinition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `section` under its kind, returning the section it replaces.
    pub fn set_section(&mut self, section: DefinitionSection) -> Option<DefinitionSection> {
        self.sections.insert(section.kind(), section)
    }

    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&DefinitionSection> {
        self.sections.get(&kind)
    }

    pub fn take_section(&mut self, kind: SectionKind) -> Option<DefinitionSection> {
        self.sections.remove(&kind)
    }

    #[must_use]
    pub fn contains(&self, kind: SectionKind) -> bool {
        self.sections.contains_key(&kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in [`SectionKind`] order.
    pub fn iter(&self) -> impl Iterator<Item = &DefinitionSection> + '_ {
        SectionKind::ALL
            .into_iter()
            .filter_map(|kind| self.sections.get(&kind))
    }

    #[must_use]
    pub fn layout(&self) -> Option<&VertexLayout> {
        match self.section(SectionKind::Layout)? {
            DefinitionSection::Layout(layout) => layout.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn types(&self) -> Option<&TypeSchema> {
        match self.section(SectionKind::Types)? {
            DefinitionSection::Types(types) => Some(types),
            _ => None,
        }
    }

    #[must_use]
    pub fn uniforms(&self) -> Option<&UniformSchema> {
        match self.section(SectionKind::Uniforms)? {
            DefinitionSection::Uniforms(uniforms) => Some(uniforms),
            _ => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<&State> {
        match self.section(SectionKind::State)? {
            DefinitionSection::State(state) => Some(state),
            _ => None,
        }
    }

    /// Raw text of a source section.
    #[must_use]
    pub fn source(&self, kind: SectionKind) -> Option<&str> {
        match self.section(kind)? {
            DefinitionSection::Source(source) => Some(source.text()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_names() {
        assert_eq!(SectionKind::parse("VERTEX"), Some(SectionKind::Vertex));
        assert_eq!(SectionKind::parse("Uniforms"), Some(SectionKind::Uniforms));
        assert_eq!(SectionKind::parse("tessellation"), None);
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::parse(kind.name()), Some(kind));
        }
        assert_eq!(SectionKind::Common.stage(), None);
        assert_eq!(SectionKind::Compute.stage(), Some(StageKind::Compute));
    }

    #[test]
    fn test_stage_source_requires_source_kind() {
        assert!(StageSource::new(SectionKind::Vertex, "void main() {}").is_some());
        assert!(StageSource::new(SectionKind::Layout, "vec3 position").is_none());
    }

    #[test]
    fn test_set_section_replaces() {
        let mut definition = PipelineDefinition::new();
        let first = StageSource::new(SectionKind::Vertex, "a").unwrap();
        let second = StageSource::new(SectionKind::Vertex, "b").unwrap();

        assert!(definition.set_section(DefinitionSection::Source(first)).is_none());
        assert!(definition.set_section(DefinitionSection::Source(second)).is_some());
        definition.set_section(DefinitionSection::State(State::default()));

        assert_eq!(definition.len(), 2);
        assert_eq!(definition.source(SectionKind::Vertex), Some("b"));
        let kinds: Vec<_> = definition.iter().map(DefinitionSection::kind).collect();
        assert_eq!(kinds, vec![SectionKind::State, SectionKind::Vertex]);

        assert!(definition.take_section(SectionKind::Vertex).is_some());
        assert!(!definition.contains(SectionKind::Vertex));
    }
}
