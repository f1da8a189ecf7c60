//! `uniforms` section parser.
//!
//! ```text
//! mat4 model
//! vec4 palette[8]
//! Light sun                      struct from the `types` section
//! sampler2D albedo
//! image2D target rgba8
//! buffer Camera {
//!     mat4 view_projection
//!     vec3 position
//! }
//! ```

use prism_core::text::{is_identifier, split_array_suffix, tokenize};

use crate::schema::{
    BufferBlock, PixelFormat, PropertyDecl, TextureDim, TypeSchema, UniformDecl, UniformKind,
    UniformSchema, ValueType,
};

/// Parses a `uniforms` section, resolving struct types against `types`.
#[must_use]
pub fn parse_uniforms(text: &str, types: &TypeSchema) -> UniformSchema {
    let mut parser = UniformsParser {
        types,
        schema: UniformSchema::new(),
        open: None,
        pending: None,
        skipping: false,
    };
    for (index, line) in text.lines().enumerate() {
        parser.line(index + 1, line.trim());
    }
    parser.finish()
}

#[derive(Debug)]
struct OpenBlock {
    block: BufferBlock,
    line: usize,
    valid: bool,
}

struct UniformsParser<'a> {
    types: &'a TypeSchema,
    schema: UniformSchema,
    open: Option<OpenBlock>,
    pending: Option<OpenBlock>,
    skipping: bool,
}

impl UniformsParser<'_> {
    fn line(&mut self, line_no: usize, line: &str) {
        if self.skipping {
            if line.contains('}') {
                self.skipping = false;
            }
            return;
        }

        if let Some(pending) = self.pending.take() {
            if let Some(body) = line.strip_prefix('{') {
                self.open = Some(pending);
                self.block_body(body, line_no);
                return;
            }
            log::warn!(
                "uniforms:{line_no}: expected '{{' after 'buffer {}' (line {}), declaration dropped",
                pending.block.name,
                pending.line
            );
        }

        let tokens = tokenize(line);
        match tokens.first() {
            None => {}
            Some(&"buffer") => self.header(line, line_no),
            Some(first) if first.starts_with('{') => {
                log::warn!("uniforms:{line_no}: '{{' without a buffer declaration");
            }
            Some(_) if self.open.is_some() => self.block_body(line, line_no),
            Some(first) if first.starts_with('}') => {
                log::warn!("uniforms:{line_no}: '}}' without an open buffer");
            }
            Some(_) => {
                for piece in line.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                    self.uniform(piece, line_no);
                }
            }
        }
    }

    fn header(&mut self, line: &str, line_no: usize) {
        if let Some(open) = &self.open {
            log::warn!(
                "uniforms:{line_no}: nested buffer inside '{}' is not supported, skipping its body",
                open.block.name
            );
            self.skipping = !line.contains('}');
            return;
        }

        let after = line["buffer".len()..].trim_start();
        let (head, body) = match after.find('{') {
            Some(brace) => (after[..brace].trim(), Some(&after[brace + 1..])),
            None => (after.trim(), None),
        };

        let valid = if !is_identifier(head) {
            log::warn!("uniforms:{line_no}: invalid buffer name '{head}'");
            false
        } else if self.schema.get(head).is_some() {
            log::warn!("uniforms:{line_no}: '{head}' is already declared");
            false
        } else {
            true
        };

        let open = OpenBlock {
            block: BufferBlock::new(head),
            line: line_no,
            valid,
        };
        match body {
            Some(body) => {
                self.open = Some(open);
                self.block_body(body, line_no);
            }
            None => self.pending = Some(open),
        }
    }

    fn block_body(&mut self, text: &str, line_no: usize) {
        let (inner, closed) = match text.find('}') {
            Some(close) => {
                let trailing = text[close + 1..].trim().trim_start_matches(';').trim();
                if !trailing.is_empty() {
                    log::warn!("uniforms:{line_no}: ignoring '{trailing}' after buffer");
                }
                (&text[..close], true)
            }
            None => (text, false),
        };

        for piece in inner.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.block_property(piece, line_no);
        }

        if closed {
            self.close(line_no);
        }
    }

    fn block_property(&mut self, piece: &str, line_no: usize) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        if piece.contains('=') {
            log::warn!("uniforms:{line_no}: initializers are not supported in '{piece}'");
            return;
        }
        let Some((ty, declarator)) = piece.split_once(char::is_whitespace) else {
            log::warn!("uniforms:{line_no}: malformed buffer property '{piece}'");
            return;
        };
        let Some((name, array_len)) = split_array_suffix(declarator) else {
            log::warn!("uniforms:{line_no}: malformed declarator '{}'", declarator.trim());
            return;
        };
        if !is_identifier(name) {
            log::warn!("uniforms:{line_no}: invalid property name '{name}'");
            return;
        }
        let Some((property_type, _)) = self.types.resolve(ty) else {
            log::warn!(
                "uniforms:{line_no}: unknown type '{ty}' for '{}.{name}'",
                open.block.name
            );
            return;
        };
        if open.block.property(name).is_some() {
            log::warn!("uniforms:{line_no}: duplicate property '{}.{name}'", open.block.name);
            return;
        }

        open.block
            .properties
            .push(PropertyDecl::new(name, property_type, array_len));
    }

    fn uniform(&mut self, piece: &str, line_no: usize) {
        if piece.contains('=') {
            log::warn!("uniforms:{line_no}: initializers are not supported in '{piece}'");
            return;
        }

        let tokens = tokenize(piece);
        let [ty, rest @ ..] = tokens.as_slice() else {
            return;
        };
        // `name[N]` and `name [N]` are both accepted
        let (declarator, extra) = match rest {
            [] => {
                log::warn!("uniforms:{line_no}: '{ty}' declaration without a name");
                return;
            }
            [name, array, extra @ ..] if array.starts_with('[') => (format!("{name}{array}"), extra),
            [name, extra @ ..] => ((*name).to_string(), extra),
        };
        let Some((name, array_len)) = split_array_suffix(&declarator) else {
            log::warn!("uniforms:{line_no}: malformed declarator '{declarator}'");
            return;
        };
        if !is_identifier(name) {
            log::warn!("uniforms:{line_no}: invalid uniform name '{name}'");
            return;
        }

        let kind = if let Some(dim) = TextureDim::parse_image(ty) {
            let format = match extra {
                [] => None,
                [format, ignored @ ..] => {
                    if !ignored.is_empty() {
                        log::warn!("uniforms:{line_no}: ignoring '{}' after '{name}'", ignored.join(" "));
                    }
                    let parsed = PixelFormat::parse(format);
                    if parsed.is_none() {
                        log::warn!("uniforms:{line_no}: unknown pixel format '{format}' for '{name}', ignored");
                    }
                    parsed
                }
            };
            UniformKind::Image { dim, format }
        } else {
            if !extra.is_empty() {
                log::warn!("uniforms:{line_no}: ignoring '{}' after '{name}'", extra.join(" "));
            }
            if let Some(dim) = TextureDim::parse_sampler(ty) {
                UniformKind::Sampler(dim)
            } else if let Some(value) = ValueType::parse(ty) {
                UniformKind::Value(value)
            } else if self.types.contains(ty) {
                UniformKind::Struct((*ty).to_string())
            } else {
                log::warn!("uniforms:{line_no}: unknown type '{ty}' for uniform '{name}'");
                return;
            }
        };

        if !self.schema.add(UniformDecl::new(name, kind, array_len)) {
            log::warn!("uniforms:{line_no}: uniform '{name}' is already declared");
        }
    }

    fn close(&mut self, line_no: usize) {
        let Some(open) = self.open.take() else {
            log::warn!("uniforms:{line_no}: '}}' without an open buffer");
            return;
        };
        if !open.valid {
            return;
        }
        if open.block.properties.is_empty() {
            log::warn!("uniforms:{}: buffer '{}' has no properties, ignored", open.line, open.block.name);
            return;
        }
        if !self.schema.add(UniformDecl::buffer(open.block)) {
            log::warn!("uniforms:{}: buffer name is already declared", open.line);
        }
    }

    fn finish(mut self) -> UniformSchema {
        if let Some(pending) = self.pending.take() {
            log::warn!(
                "uniforms:{}: buffer '{}' has no body",
                pending.line,
                pending.block.name
            );
        }
        if let Some(open) = self.open.take() {
            log::warn!(
                "uniforms:{}: buffer '{}' is not terminated, discarded",
                open.line,
                open.block.name
            );
        }
        self.schema
    }
}
