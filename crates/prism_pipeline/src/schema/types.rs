//! User-declared struct types from the `types` section.

use serde::Serialize;

use crate::layout::memory::{ElementSize, LayoutRule, StructLayout, layout_properties};

use super::ValueType;

/// Type of a struct member or buffer property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PropertyType {
    Value(ValueType),
    /// A struct declared earlier in the `types` section
    Struct(String),
}

impl PropertyType {
    #[must_use]
    pub fn glsl_name(&self) -> String {
        match self {
            Self::Value(ty) => ty.glsl_name(),
            Self::Struct(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: PropertyType,
    /// 1 for non-arrays
    pub array_len: u32,
}

impl PropertyDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: PropertyType, array_len: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            array_len,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.array_len > 1
    }

    /// `type name;` or `type name[N];`
    #[must_use]
    pub fn glsl_declaration(&self) -> String {
        if self.is_array() {
            format!("{} {}[{}];", self.ty.glsl_name(), self.name, self.array_len)
        } else {
            format!("{} {};", self.ty.glsl_name(), self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub properties: Vec<PropertyDecl>,
    /// Tightly packed size in bytes
    pub size: u32,
}

impl StructDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            size: 0,
        }
    }

    /// Appends a property whose single element is `element_size` bytes.
    ///
    /// Returns `false` (and leaves the struct unchanged) when the struct size
    /// would no longer fit in a `u32`.
    pub fn push(&mut self, property: PropertyDecl, element_size: u32) -> bool {
        let Some(size) = element_size
            .checked_mul(property.array_len)
            .and_then(|bytes| self.size.checked_add(bytes))
        else {
            return false;
        };
        self.size = size;
        self.properties.push(property);
        true
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn glsl_declaration(&self) -> String {
        let mut out = format!("struct {} {{\n", self.name);
        for property in &self.properties {
            out.push_str("    ");
            out.push_str(&property.glsl_declaration());
            out.push('\n');
        }
        out.push_str("};");
        out
    }
}

/// Ordered struct declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSchema {
    structs: Vec<StructDecl>,
}

impl TypeSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a struct. Returns `false` (and keeps the first one) when the
    /// name is already taken.
    pub fn add(&mut self, decl: StructDecl) -> bool {
        if self.contains(&decl.name) {
            return false;
        }
        self.structs.push(decl);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn structs(&self) -> &[StructDecl] {
        &self.structs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Resolves a type name against the built-in value types and the
    /// structs declared so far, returning it with its tight size.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<(PropertyType, u32)> {
        if let Some(ty) = ValueType::parse(name) {
            return Some((PropertyType::Value(ty), ty.size()));
        }
        self.get(name)
            .map(|decl| (PropertyType::Struct(decl.name.clone()), decl.size))
    }

    /// Layout of struct `name` under `rule`.
    #[must_use]
    pub fn layout(&self, name: &str, rule: LayoutRule) -> Option<StructLayout> {
        let index = self.structs.iter().position(|s| s.name == name)?;
        Some(self.layout_at(index, rule))
    }

    // Nested structs are resolved among earlier declarations only, which keeps
    // the recursion finite.
    fn layout_at(&self, index: usize, rule: LayoutRule) -> StructLayout {
        let decl = &self.structs[index];
        let earlier = &self.structs[..index];
        layout_properties(&decl.name, &decl.properties, rule, |nested| {
            let position = earlier.iter().position(|s| s.name == nested)?;
            Some(ElementSize {
                padded: self.layout_at(position, rule).size,
                tight: earlier[position].size,
            })
        })
    }

    /// Element size of any struct, used when laying out buffer blocks.
    pub(crate) fn element_size(&self, name: &str, rule: LayoutRule) -> Option<ElementSize> {
        let index = self.structs.iter().position(|s| s.name == name)?;
        Some(ElementSize {
            padded: self.layout_at(index, rule).size,
            tight: self.structs[index].size,
        })
    }

    /// GLSL `struct` declarations for every type, in declaration order.
    #[must_use]
    pub fn glsl_declarations(&self) -> String {
        self.structs
            .iter()
            .map(StructDecl::glsl_declaration)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> StructDecl {
        let mut light = StructDecl::new("Light");
        light.push(PropertyDecl::new("color", PropertyType::Value(ValueType::VEC3), 1), 12);
        light.push(PropertyDecl::new("intensity", PropertyType::Value(ValueType::FLOAT), 1), 4);
        light
    }

    #[test]
    fn test_resolve_builtins_and_structs() {
        let mut types = TypeSchema::new();
        assert!(types.add(light()));
        assert!(!types.add(StructDecl::new("Light")));

        assert_eq!(
            types.resolve("vec4"),
            Some((PropertyType::Value(ValueType::VEC4), 16))
        );
        assert_eq!(
            types.resolve("Light"),
            Some((PropertyType::Struct("Light".into()), 16))
        );
        assert_eq!(types.resolve("Shadow"), None);
        assert_eq!(types.len(), 1);
    }

    #[test]
    fn test_nested_layout() {
        let mut types = TypeSchema::new();
        types.add(light());

        let mut scene = StructDecl::new("Scene");
        scene.push(PropertyDecl::new("lights", PropertyType::Struct("Light".into()), 4), 16);
        scene.push(PropertyDecl::new("ambient", PropertyType::Value(ValueType::VEC4), 1), 16);
        assert_eq!(scene.size, 80);
        types.add(scene);

        let layout = types.layout("Scene", LayoutRule::Std140).unwrap();
        assert_eq!(layout.offsets(), vec![0, 128]);
        assert_eq!(layout.size, 144);

        let packed = types.layout("Scene", LayoutRule::Packed).unwrap();
        assert_eq!(packed.offsets(), vec![0, 64]);
        assert_eq!(packed.size, 80);

        assert!(types.layout("Missing", LayoutRule::Std140).is_none());
    }

    #[test]
    fn test_glsl_declarations() {
        let mut types = TypeSchema::new();
        let mut bones = StructDecl::new("Bones");
        bones.push(PropertyDecl::new("matrices", PropertyType::Value(ValueType::MAT4), 64), 64);
        types.add(light());
        types.add(bones);

        assert_eq!(
            types.glsl_declarations(),
            "struct Light {\n    vec3 color;\n    float intensity;\n};\n\
             struct Bones {\n    mat4 matrices[64];\n};"
        );
    }
}
