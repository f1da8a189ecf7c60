//! Uniform declarations from the `uniforms` section.

use serde::Serialize;

use crate::layout::memory::{LayoutRule, StructLayout, layout_properties};

use super::{PropertyDecl, TypeSchema, ValueType};

/// Dimensionality of a sampled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextureDim {
    D2,
    D3,
    Cube,
}

impl TextureDim {
    fn suffix(self) -> &'static str {
        match self {
            Self::D2 => "2D",
            Self::D3 => "3D",
            Self::Cube => "Cube",
        }
    }

    /// Parses the sampler type names `sampler2D`, `sampler3D` and `samplerCube`.
    #[must_use]
    pub fn parse_sampler(name: &str) -> Option<Self> {
        match name {
            "sampler2D" => Some(Self::D2),
            "sampler3D" => Some(Self::D3),
            "samplerCube" => Some(Self::Cube),
            _ => None,
        }
    }

    /// Parses the image type names `image2D` and `image3D`.
    #[must_use]
    pub fn parse_image(name: &str) -> Option<Self> {
        match name {
            "image2D" => Some(Self::D2),
            "image3D" => Some(Self::D3),
            _ => None,
        }
    }
}

/// Storage format of an image uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    Rgba32f,
    Rgba16f,
    Rg32f,
    Rg16f,
    R32f,
    R16f,
    Rgba8,
    Rgba8Snorm,
    Rg8,
    R8,
    Rgba32i,
    Rgba16i,
    Rgba8i,
    R32i,
    Rgba32ui,
    Rgba16ui,
    Rgba8ui,
    R32ui,
}

impl PixelFormat {
    const ALL: [Self; 18] = [
        Self::Rgba32f,
        Self::Rgba16f,
        Self::Rg32f,
        Self::Rg16f,
        Self::R32f,
        Self::R16f,
        Self::Rgba8,
        Self::Rgba8Snorm,
        Self::Rg8,
        Self::R8,
        Self::Rgba32i,
        Self::Rgba16i,
        Self::Rgba8i,
        Self::R32i,
        Self::Rgba32ui,
        Self::Rgba16ui,
        Self::Rgba8ui,
        Self::R32ui,
    ];

    /// Case-insensitive parse of a GLSL format qualifier.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.qualifier().eq_ignore_ascii_case(name))
    }

    /// GLSL `layout(...)` format qualifier.
    #[must_use]
    pub fn qualifier(self) -> &'static str {
        match self {
            Self::Rgba32f => "rgba32f",
            Self::Rgba16f => "rgba16f",
            Self::Rg32f => "rg32f",
            Self::Rg16f => "rg16f",
            Self::R32f => "r32f",
            Self::R16f => "r16f",
            Self::Rgba8 => "rgba8",
            Self::Rgba8Snorm => "rgba8_snorm",
            Self::Rg8 => "rg8",
            Self::R8 => "r8",
            Self::Rgba32i => "rgba32i",
            Self::Rgba16i => "rgba16i",
            Self::Rgba8i => "rgba8i",
            Self::R32i => "r32i",
            Self::Rgba32ui => "rgba32ui",
            Self::Rgba16ui => "rgba16ui",
            Self::Rgba8ui => "rgba8ui",
            Self::R32ui => "r32ui",
        }
    }
}

/// A named block of properties backed by buffer memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferBlock {
    pub name: String,
    pub properties: Vec<PropertyDecl>,
}

impl BufferBlock {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Offsets and total size of the block's memory under `rule`.
    #[must_use]
    pub fn layout(&self, rule: LayoutRule, types: &TypeSchema) -> StructLayout {
        layout_properties(&self.name, &self.properties, rule, |name| {
            types.element_size(name, rule)
        })
    }

    fn glsl_declaration(&self, rule: LayoutRule) -> String {
        // std430 is only valid on shader storage blocks
        let storage = match rule {
            LayoutRule::Std430 => "buffer",
            LayoutRule::Std140 | LayoutRule::Packed => "uniform",
        };
        let mut out = format!("layout({}) {storage} {} {{\n", rule.name(), self.name);
        for property in &self.properties {
            out.push_str("    ");
            out.push_str(&property.glsl_declaration());
            out.push('\n');
        }
        out.push_str("};");
        out
    }
}

/// What a uniform declaration binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UniformKind {
    Value(ValueType),
    /// A struct declared in the `types` section
    Struct(String),
    Sampler(TextureDim),
    Image {
        dim: TextureDim,
        format: Option<PixelFormat>,
    },
    Buffer(BufferBlock),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniformDecl {
    pub name: String,
    pub kind: UniformKind,
    /// 1 for non-arrays
    pub array_len: u32,
}

impl UniformDecl {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: UniformKind, array_len: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            array_len,
        }
    }

    /// A buffer block uniform, named after its block.
    #[must_use]
    pub fn buffer(block: BufferBlock) -> Self {
        Self {
            name: block.name.clone(),
            kind: UniformKind::Buffer(block),
            array_len: 1,
        }
    }

    fn array_suffix(&self) -> String {
        if self.array_len > 1 {
            format!("[{}]", self.array_len)
        } else {
            String::new()
        }
    }

    fn glsl_declaration(&self, rule: LayoutRule) -> String {
        let name = &self.name;
        let array = self.array_suffix();
        match &self.kind {
            UniformKind::Value(ty) => format!("uniform {} {name}{array};", ty.glsl_name()),
            UniformKind::Struct(ty) => format!("uniform {ty} {name}{array};"),
            UniformKind::Sampler(dim) => format!("uniform sampler{} {name}{array};", dim.suffix()),
            UniformKind::Image { dim, format } => match format {
                Some(format) => format!(
                    "layout({}) uniform image{} {name}{array};",
                    format.qualifier(),
                    dim.suffix()
                ),
                None => format!("uniform image{} {name}{array};", dim.suffix()),
            },
            UniformKind::Buffer(block) => block.glsl_declaration(rule),
        }
    }
}

/// Ordered uniform declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniformSchema {
    uniforms: Vec<UniformDecl>,
}

impl UniformSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a uniform. Returns `false` (and keeps the first one) when the
    /// name is already taken.
    pub fn add(&mut self, decl: UniformDecl) -> bool {
        if self.get(&decl.name).is_some() {
            return false;
        }
        self.uniforms.push(decl);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&UniformDecl> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UniformDecl> {
        self.uniforms.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    pub fn buffers(&self) -> impl Iterator<Item = &BufferBlock> + '_ {
        self.uniforms.iter().filter_map(|u| match &u.kind {
            UniformKind::Buffer(block) => Some(block),
            _ => None,
        })
    }

    /// Bytes of backing memory buffer `name` needs under `rule`.
    #[must_use]
    pub fn buffer_size(&self, name: &str, rule: LayoutRule, types: &TypeSchema) -> Option<u32> {
        self.buffers()
            .find(|block| block.name == name)
            .map(|block| block.layout(rule, types).size)
    }

    /// GLSL declarations for every uniform, in declaration order.
    #[must_use]
    pub fn glsl_declarations(&self, rule: LayoutRule) -> String {
        self.uniforms
            .iter()
            .map(|u| u.glsl_declaration(rule))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a UniformSchema {
    type Item = &'a UniformDecl;
    type IntoIter = std::slice::Iter<'a, UniformDecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.uniforms.iter()
    }
}
