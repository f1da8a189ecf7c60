//! `layout` section parser.
//!
//! ```text
//! vec3 position                  plain attribute
//! ivec4 joints byte              attribute stored as bytes
//! normalized vec4 color byte     integer storage read as [0, 1] floats
//! packed material {              32-bit group of small integer fields
//!     byte flags 4
//!     ivec3 cell 8
//! }
//! ```

use prism_core::Result;
use prism_core::text::{is_identifier, tokenize};

use crate::layout::{AttributeDecl, AttributeType, BasicType, VertexLayout, VertexLayoutBuilder};

/// Parses a `layout` section.
///
/// Returns `Ok(None)` when no attribute survived, and an error only when a
/// packed group overflows its 32 bits.
pub fn parse_layout(text: &str) -> Result<Option<VertexLayout>> {
    let mut parser = LayoutParser::default();
    for (index, line) in text.lines().enumerate() {
        parser.line(index + 1, line)?;
    }
    Ok(parser.finish())
}

/// A `packed [name]` header still waiting for its `{`.
#[derive(Debug)]
struct PendingGroup {
    name: Option<String>,
    line: usize,
}

#[derive(Debug, Default)]
struct LayoutParser {
    builder: VertexLayoutBuilder,
    pending: Option<PendingGroup>,
    /// Line that opened the current packed group
    group_line: usize,
    /// Resynchronizing: everything up to the next `}` is ignored
    skipping: bool,
}

impl LayoutParser {
    fn line(&mut self, line_no: usize, line: &str) -> Result<()> {
        let mut rest = line.trim();

        if self.skipping {
            let Some(close) = rest.find('}') else {
                return Ok(());
            };
            self.skipping = false;
            rest = rest[close + 1..].trim();
            if rest.is_empty() {
                return Ok(());
            }
        }

        if let Some(pending) = self.pending.take() {
            if let Some(body) = rest.strip_prefix('{') {
                self.open_group(pending.name.as_deref(), pending.line);
                return self.group_body(body, line_no);
            }
            log::warn!(
                "layout:{line_no}: expected '{{' to open the packed group declared on line {}, group dropped",
                pending.line
            );
        }

        if self.builder.is_packing() {
            return self.group_body(rest, line_no);
        }
        self.declaration(rest, line_no)
    }

    fn declaration(&mut self, line: &str, line_no: usize) -> Result<()> {
        if let Some(after) = line.strip_prefix("packed")
            && (after.is_empty() || after.starts_with(|c: char| c.is_whitespace() || c == '{'))
        {
            return self.packed_header(after, line_no);
        }

        let tokens = tokenize(line);
        match tokens.as_slice() {
            [] => {}
            [first, ..] if first.starts_with('}') => {
                log::warn!("layout:{line_no}: '}}' without an open packed group");
            }
            ["normalized", rest @ ..] => self.normalized(rest, line_no),
            _ => self.plain(&tokens, line_no),
        }
        Ok(())
    }

    fn plain(&mut self, tokens: &[&str], line_no: usize) {
        let (ty, name, backing) = match tokens {
            [ty, name] => (*ty, *name, None),
            [ty, name, backing] => (*ty, *name, Some(*backing)),
            _ => {
                log::warn!("layout:{line_no}: malformed declaration '{}'", tokens.join(" "));
                return;
            }
        };

        let Some(basic) = BasicType::parse(ty) else {
            log::warn!("layout:{line_no}: unknown attribute type '{ty}'");
            return;
        };
        if !is_identifier(name) {
            log::warn!("layout:{line_no}: invalid attribute name '{name}'");
            return;
        }

        let storage = match backing.map(|b| (b, AttributeType::parse(b))) {
            None => basic.ty,
            Some((backing, None)) => {
                log::warn!("layout:{line_no}: unknown backing type '{backing}' for '{name}', ignored");
                basic.ty
            }
            Some((backing, Some(storage))) if storage.is_integer() != basic.ty.is_integer() => {
                log::warn!(
                    "layout:{line_no}: backing type '{backing}' does not match '{ty}' for '{name}', ignored"
                );
                basic.ty
            }
            Some((_, Some(storage))) => storage,
        };

        self.builder.add(name, AttributeDecl::new(storage, basic.count));
    }

    fn normalized(&mut self, tokens: &[&str], line_no: usize) {
        let [ty, name, backing] = tokens else {
            log::warn!(
                "layout:{line_no}: expected 'normalized <type> <name> <backing-type>', got 'normalized {}'",
                tokens.join(" ")
            );
            return;
        };

        let Some(basic) = BasicType::parse(ty) else {
            log::warn!("layout:{line_no}: unknown attribute type '{ty}'");
            return;
        };
        if !is_identifier(name) {
            log::warn!("layout:{line_no}: invalid attribute name '{name}'");
            return;
        }
        let Some(storage) = AttributeType::parse(backing).filter(|t| t.is_integer()) else {
            log::warn!(
                "layout:{line_no}: normalized attribute '{name}' needs a byte, short or int backing type, got '{backing}'"
            );
            return;
        };
        if basic.ty.is_integer() {
            log::warn!("layout:{line_no}: normalized attribute '{name}' is read as float, not '{ty}'");
        }

        self.builder
            .add(name, AttributeDecl::new(storage, basic.count).normalized());
    }

    fn packed_header(&mut self, after: &str, line_no: usize) -> Result<()> {
        let (head, body) = match after.find('{') {
            Some(brace) => (&after[..brace], Some(&after[brace + 1..])),
            None => (after, None),
        };

        let name = match tokenize(head).as_slice() {
            [] => None,
            [name] if is_identifier(name) => Some((*name).to_string()),
            _ => {
                log::warn!(
                    "layout:{line_no}: invalid packed group name '{}', using the default name",
                    head.trim()
                );
                None
            }
        };

        match body {
            Some(body) => {
                self.open_group(name.as_deref(), line_no);
                self.group_body(body, line_no)
            }
            None => {
                self.pending = Some(PendingGroup { name, line: line_no });
                Ok(())
            }
        }
    }

    fn open_group(&mut self, name: Option<&str>, line_no: usize) {
        self.group_line = line_no;
        let name = self.builder.begin_packed(name);
        log::debug!("layout:{line_no}: opened packed group '{name}'");
    }

    /// Fields of the open group, up to and including an optional `}`.
    fn group_body(&mut self, body: &str, line_no: usize) -> Result<()> {
        let (inner, closed) = match body.find('}') {
            Some(close) => {
                let trailing = body[close + 1..].trim();
                if !trailing.is_empty() {
                    log::warn!("layout:{line_no}: ignoring '{trailing}' after packed group");
                }
                (&body[..close], true)
            }
            None => (body, false),
        };

        let tokens = tokenize(inner);
        if tokens
            .iter()
            .any(|t| *t == "packed" || *t == "normalized" || t.contains('{'))
        {
            log::warn!(
                "layout:{line_no}: packed group opened on line {} is not terminated, skipping to the next '}}'",
                self.group_line
            );
            self.builder.discard_packed();
            self.skipping = !closed;
            return Ok(());
        }

        for field in tokens.chunks(3) {
            self.packed_field(field, line_no)?;
        }

        if closed {
            self.builder.end_packed();
        }
        Ok(())
    }

    fn packed_field(&mut self, field: &[&str], line_no: usize) -> Result<()> {
        let [ty, name, bits] = field else {
            log::warn!("layout:{line_no}: incomplete packed field '{}'", field.join(" "));
            return Ok(());
        };

        let Some(basic) = BasicType::parse(ty).filter(|b| b.is_packable()) else {
            log::warn!("layout:{line_no}: '{ty}' cannot be packed, expected byte, short, int or ivecN");
            return Ok(());
        };
        if !is_identifier(name) {
            log::warn!("layout:{line_no}: invalid packed field name '{name}'");
            return Ok(());
        }
        let Ok(bits) = bits.parse::<u32>() else {
            log::warn!("layout:{line_no}: invalid bit width '{bits}' for packed field '{name}'");
            return Ok(());
        };
        if bits == 0 {
            log::warn!("layout:{line_no}: packed field '{name}' has zero width");
            return Ok(());
        }

        // Group overflow is fatal even when the width is also wrong for the type
        let requested = bits.saturating_mul(u32::from(basic.count));
        let fits = self
            .builder
            .packed_bits_available()
            .is_some_and(|available| requested <= available);
        let capacity = basic.ty.bits();
        if fits && bits > capacity {
            log::warn!(
                "layout:{line_no}: packed field '{name}' width {bits} outside 1..={capacity} for '{ty}'"
            );
            return Ok(());
        }

        self.builder.add_packed_field(name, basic.ty, basic.count, bits)
    }

    fn finish(mut self) -> Option<VertexLayout> {
        if let Some(pending) = self.pending.take() {
            log::warn!(
                "layout:{}: packed group declared at the end of the section without a body",
                pending.line
            );
        }
        if self.builder.is_packing() {
            log::warn!(
                "layout:{}: packed group is not terminated, discarded",
                self.group_line
            );
            self.builder.discard_packed();
        }
        if self.skipping {
            log::warn!("layout: reached the end of the section while looking for '}}'");
        }

        let layout = self.builder.build();
        (!layout.is_empty()).then_some(layout)
    }
}
