//! `types` section parser.
//!
//! ```text
//! struct Light {
//!     vec3 color;
//!     float intensity;
//! };
//! struct Lights
//! {
//!     Light items[4];
//! }
//! ```

use prism_core::text::{is_identifier, split_array_suffix, tokenize};

use crate::schema::{PropertyDecl, StructDecl, TypeSchema, ValueType};

/// Parses a `types` section. Struct members may use built-in types and
/// structs declared earlier in the section.
#[must_use]
pub fn parse_types(text: &str) -> TypeSchema {
    let mut parser = TypesParser::default();
    for (index, line) in text.lines().enumerate() {
        parser.line(index + 1, line.trim());
    }
    parser.finish()
}

#[derive(Debug)]
struct OpenStruct {
    decl: StructDecl,
    line: usize,
    /// Invalid headers still consume their body, but nothing is kept
    valid: bool,
}

#[derive(Debug, Default)]
struct TypesParser {
    schema: TypeSchema,
    open: Option<OpenStruct>,
    pending: Option<OpenStruct>,
    /// Skipping a nested struct body up to its `}`
    skipping: bool,
}

impl TypesParser {
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
                self.body(body, line_no);
                return;
            }
            log::warn!(
                "types:{line_no}: expected '{{' after 'struct {}' (line {}), declaration dropped",
                pending.decl.name,
                pending.line
            );
        }

        let tokens = tokenize(line);
        match tokens.first() {
            Some(&"struct") => self.header(line, line_no),
            Some(first) if first.starts_with('{') => {
                log::warn!("types:{line_no}: '{{' without a struct declaration");
            }
            _ => self.body(line, line_no),
        }
    }

    fn header(&mut self, line: &str, line_no: usize) {
        if let Some(open) = &self.open {
            log::warn!(
                "types:{line_no}: nested struct inside '{}' is not supported, skipping its body",
                open.decl.name
            );
            self.skipping = !line.contains('}');
            return;
        }

        let after = line["struct".len()..].trim_start();
        let (head, body) = match after.find('{') {
            Some(brace) => (after[..brace].trim(), Some(&after[brace + 1..])),
            None => (after.trim(), None),
        };

        let valid = if !is_identifier(head) {
            log::warn!("types:{line_no}: invalid struct name '{head}'");
            false
        } else if ValueType::parse(head).is_some() {
            log::warn!("types:{line_no}: struct name '{head}' shadows a built-in type");
            false
        } else if self.schema.contains(head) {
            log::warn!("types:{line_no}: struct '{head}' is already declared");
            false
        } else {
            true
        };

        let open = OpenStruct {
            decl: StructDecl::new(head),
            line: line_no,
            valid,
        };
        match body {
            Some(body) => {
                self.open = Some(open);
                self.body(body, line_no);
            }
            None => self.pending = Some(open),
        }
    }

    /// Property declarations, up to and including an optional `}`.
    fn body(&mut self, text: &str, line_no: usize) {
        let (inner, closed) = match text.find('}') {
            Some(close) => {
                let trailing = text[close + 1..].trim().trim_start_matches(';').trim();
                if !trailing.is_empty() {
                    log::warn!("types:{line_no}: ignoring '{trailing}' after struct");
                }
                (&text[..close], true)
            }
            None => (text, false),
        };

        for piece in inner.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.property(piece, line_no);
        }

        if closed {
            self.close(line_no);
        }
    }

    fn property(&mut self, piece: &str, line_no: usize) {
        let Some(open) = self.open.as_mut() else {
            log::warn!("types:{line_no}: '{piece}' outside a struct, ignored");
            return;
        };
        let Some((ty, declarator)) = piece.split_once(char::is_whitespace) else {
            log::warn!("types:{line_no}: malformed property '{piece}'");
            return;
        };
        let Some((name, array_len)) = split_array_suffix(declarator) else {
            log::warn!("types:{line_no}: malformed property declarator '{}'", declarator.trim());
            return;
        };
        if !is_identifier(name) {
            log::warn!("types:{line_no}: invalid property name '{name}'");
            return;
        }
        let Some((property_type, size)) = self.schema.resolve(ty) else {
            log::warn!("types:{line_no}: unknown type '{ty}' for '{}.{name}'", open.decl.name);
            return;
        };
        if open.decl.property(name).is_some() {
            log::warn!("types:{line_no}: duplicate property '{}.{name}'", open.decl.name);
            return;
        }

        if !open.decl.push(PropertyDecl::new(name, property_type, array_len), size) {
            log::warn!("types:{line_no}: array '{name}[{array_len}]' is too large");
        }
    }

    fn close(&mut self, line_no: usize) {
        let Some(open) = self.open.take() else {
            log::warn!("types:{line_no}: '}}' without an open struct");
            return;
        };
        if !open.valid {
            return;
        }
        if open.decl.properties.is_empty() {
            log::warn!("types:{}: struct '{}' has no properties, ignored", open.line, open.decl.name);
            return;
        }
        log::debug!(
            "types:{}: struct '{}' ({} bytes)",
            open.line,
            open.decl.name,
            open.decl.size
        );
        self.schema.add(open.decl);
    }

    fn finish(mut self) -> TypeSchema {
        if let Some(pending) = self.pending.take() {
            log::warn!(
                "types:{}: struct '{}' has no body",
                pending.line,
                pending.decl.name
            );
        }
        if let Some(open) = self.open.take() {
            log::warn!(
                "types:{}: struct '{}' is not terminated, discarded",
                open.line,
                open.decl.name
            );
        }
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyType;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn types(text: &str) -> TypeSchema {
        init_logger();
        parse_types(text)
    }

    #[test]
    fn test_struct_sizes() {
        let schema = types(
            "struct Light {\n    vec3 color;\n    float intensity;\n};\n\
             struct Lights\n{\n    Light items[4];\n    int count;\n}",
        );
        assert_eq!(schema.len(), 2);

        let light = schema.get("Light").unwrap();
        assert_eq!(light.size, 16);

        let lights = schema.get("Lights").unwrap();
        let items = lights.property("items").unwrap();
        assert_eq!(items.ty, PropertyType::Struct("Light".to_string()));
        assert_eq!(items.array_len, 4);
        assert_eq!(lights.size, 68);
    }

    #[test]
    fn test_declarator_forms() {
        let schema = types("struct S {\nfloat a\nvec2 b[2];\nmat4 c [3];\nfloat d; float e;\n}");
        let s = schema.get("S").unwrap();
        let names: Vec<_> = s.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(s.property("c").unwrap().array_len, 3);
        assert_eq!(s.size, 4 + 16 + 192 + 4 + 4);
    }

    #[test]
    fn test_inline_struct() {
        let schema = types("struct P { vec4 position; float size; }");
        assert_eq!(schema.get("P").unwrap().size, 20);
    }

    #[test]
    fn test_unresolved_types_are_skipped() {
        let schema = types("struct A {\nB b;\nA self_ref;\nvec3 ok;\n}\nstruct B {\nfloat x;\n}");
        let a = schema.get("A").unwrap();
        assert_eq!(a.properties.len(), 1);
        assert_eq!(a.size, 12);
    }

    #[test]
    fn test_nested_struct_is_skipped() {
        let schema = types(
            "struct Outer {\nfloat a;\nstruct Inner {\nfloat x;\n}\nfloat b;\n}",
        );
        let outer = schema.get("Outer").unwrap();
        let names: Vec<_> = outer.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(!schema.contains("Inner"));
    }

    #[test]
    fn test_structural_errors() {
        let schema = types(
            "float stray;\n}\nstruct vec3 {\nfloat x;\n}\nstruct Ok {\nfloat x;\n}\nstruct Ok {\nint y;\n}\nstruct Open {\nfloat z;",
        );
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.get("Ok").unwrap().properties[0].name, "x");
    }

    #[test]
    fn test_oversized_array_is_skipped() {
        let schema = types("struct S {\nmat4 m[100000000];\nfloat f;\n}");
        let s = schema.get("S").unwrap();
        assert!(s.property("m").is_none());
        assert_eq!(s.size, 4);
    }

    #[test]
    fn test_header_without_body() {
        let schema = types("struct A\nfloat x;\nstruct B {\nfloat y;\n}");
        assert!(!schema.contains("A"));
        assert!(schema.contains("B"));
    }
}
