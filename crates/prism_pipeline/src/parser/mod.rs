//! Pipeline Definition Parser
//!
//! A definition document is split into sections by `#section <name>` lines:
//!
//! ```text
//! #section layout
//! vec3 position
//! vec2 uv
//!
//! #section vertex
//! void main() { ... }
//! ```
//!
//! Comments and blank lines are removed first. Lines before the first
//! `#section`, or after an unknown one, are dropped. A section named twice
//! accumulates the lines of both.
//!
//! Sections are then parsed in dependency order (`types`, `uniforms`,
//! `layout`, `state`, then the source sections) so uniforms can refer to
//! structs declared in `types`.
//!
//! Problems with a single line are logged and the line is skipped; problems
//! with a block are logged and the parser resynchronizes. Only a packed group
//! overflow stops parsing.

mod layout;
mod state;
mod types;
mod uniforms;

use prism_core::Result;
use prism_core::text::{clean_document, directive};

use crate::section::{DefinitionSection, PipelineDefinition, SectionKind, StageSource};

pub use layout::parse_layout;
pub use state::parse_state;
pub use types::parse_types;
pub use uniforms::parse_uniforms;

const SOURCE_SECTIONS: [SectionKind; 5] = [
    SectionKind::Common,
    SectionKind::Vertex,
    SectionKind::Geometry,
    SectionKind::Fragment,
    SectionKind::Compute,
];

/// Raw lines of every section, indexed by [`SectionKind`].
#[derive(Debug, Default)]
struct Accumulators([String; SectionKind::ALL.len()]);

impl Accumulators {
    fn push_line(&mut self, kind: SectionKind, line: &str) {
        let text = &mut self.0[kind as usize];
        text.push_str(line);
        text.push('\n');
    }

    fn text(&self, kind: SectionKind) -> Option<&str> {
        let text = self.0[kind as usize].trim_end_matches('\n');
        (!text.is_empty()).then_some(text)
    }
}

/// Splits `document` into sections and parses each one.
///
/// Fails only on a packed group overflow in the `layout` section.
pub fn parse_definition(document: &str) -> Result<PipelineDefinition> {
    let cleaned = clean_document(document);
    let mut accumulators = Accumulators::default();
    let mut current: Option<SectionKind> = None;

    for line in cleaned.lines() {
        if let Some((name, argument)) = directive(line)
            && name.eq_ignore_ascii_case("section")
        {
            let section_name = argument.split_whitespace().next().unwrap_or_default();
            current = SectionKind::parse(section_name);
            match current {
                Some(kind) => log::debug!("Entering section '{kind}'"),
                None => log::warn!("Unknown section '{argument}', its lines are ignored"),
            }
            continue;
        }

        match current {
            Some(kind) => accumulators.push_line(kind, line),
            None => log::debug!("Dropping line outside any section: {line}"),
        }
    }

    let mut definition = PipelineDefinition::new();

    let types = accumulators
        .text(SectionKind::Types)
        .map(parse_types)
        .unwrap_or_default();

    if let Some(text) = accumulators.text(SectionKind::Uniforms) {
        let uniforms = parse_uniforms(text, &types);
        definition.set_section(DefinitionSection::Uniforms(uniforms));
    }
    if accumulators.text(SectionKind::Types).is_some() {
        definition.set_section(DefinitionSection::Types(types));
    }

    if let Some(text) = accumulators.text(SectionKind::Layout) {
        let layout = parse_layout(text)?;
        definition.set_section(DefinitionSection::Layout(layout));
    }

    if let Some(text) = accumulators.text(SectionKind::State) {
        definition.set_section(DefinitionSection::State(parse_state(text)));
    }

    for kind in SOURCE_SECTIONS {
        if let Some(text) = accumulators.text(kind)
            && let Some(source) = StageSource::new(kind, text)
        {
            definition.set_section(DefinitionSection::Source(source));
        }
    }

    log::debug!("Parsed pipeline definition with {} section(s)", definition.len());
    Ok(definition)
}
