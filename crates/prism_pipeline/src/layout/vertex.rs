//! Vertex Layout & Attribute Packing
//!
//! Turns the declarations of a `layout` section into a [`VertexLayout`]: the
//! ordered list of logical components the shader sees, and the physical
//! attributes that back them.
//!
//! Plain declarations map one component to one attribute. A `packed { ... }`
//! block maps several small integer components onto the bits of a single
//! 32-bit `int` attribute:
//!
//! ```text
//! packed {            attribute `packed0` (int, 4 bytes)
//!     byte flags 4    bits 0..4
//!     byte kind 4     bits 4..8
//! }
//! ```
//!
//! The layout also emits the shader glue for itself: the `in` declarations of
//! every physical attribute and one unpack statement per packed component.

use prism_core::{PrismError, Result};
use serde::Serialize;

/// Bits available in one packed group.
pub const PACKED_GROUP_BITS: u32 = 32;

/// Storage type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeType {
    Byte,
    Short,
    Int,
    Float,
}

impl AttributeType {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(Self::Byte),
            "short" => Some(Self::Short),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            _ => None,
        }
    }

    /// Size of one component in bytes.
    #[inline]
    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
        }
    }

    /// Width of one component in bits.
    #[inline]
    #[must_use]
    pub fn bits(self) -> u32 {
        self.size() * 8
    }

    #[inline]
    #[must_use]
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
        }
    }
}

/// A basic layout type token: `byte short int float vec2..4 ivec2..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicType {
    pub ty: AttributeType,
    pub count: u8,
}

impl BasicType {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(ty) = AttributeType::parse(name) {
            return Some(Self { ty, count: 1 });
        }
        let (ty, digits) = if let Some(rest) = name.strip_prefix("ivec") {
            (AttributeType::Int, rest)
        } else {
            (AttributeType::Float, name.strip_prefix("vec")?)
        };
        let count = match digits {
            "2" => 2,
            "3" => 3,
            "4" => 4,
            _ => return None,
        };
        Some(Self { ty, count })
    }

    /// Packed fields hold integers only.
    #[inline]
    #[must_use]
    pub fn is_packable(self) -> bool {
        self.ty.is_integer()
    }
}

/// A resolved plain attribute declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDecl {
    pub ty: AttributeType,
    pub count: u8,
    pub normalized: bool,
}

impl AttributeDecl {
    #[must_use]
    pub fn new(ty: AttributeType, count: u8) -> Self {
        Self {
            ty,
            count,
            normalized: false,
        }
    }

    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

/// One sub-field of a packed group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackedField {
    pub name: String,
    pub ty: AttributeType,
    pub count: u8,
    /// Width of each component in bits
    pub bits: u32,
    /// Bit offset of the first component inside the group
    pub offset: u32,
}

impl PackedField {
    /// Mask selecting one component after shifting.
    #[must_use]
    pub fn mask(&self) -> u32 {
        if self.bits >= 32 {
            u32::MAX
        } else {
            (1u32 << self.bits) - 1
        }
    }

    #[inline]
    #[must_use]
    pub fn total_bits(&self) -> u32 {
        self.bits * u32::from(self.count)
    }

    /// Bit offset of component `i`.
    #[inline]
    #[must_use]
    pub fn component_offset(&self, i: u8) -> u32 {
        self.offset + self.bits * u32::from(i)
    }

    fn shader_type(&self) -> String {
        integer_type_name(self.count)
    }

    fn unpack_statement(&self, group: &str) -> String {
        let extract = |i: u8| {
            format!(
                "({group} >> {}) & 0x{:X}",
                self.component_offset(i),
                self.mask()
            )
        };
        if self.count == 1 {
            format!("int {} = {};", self.name, extract(0))
        } else {
            let parts: Vec<String> = (0..self.count).map(extract).collect();
            let ty = self.shader_type();
            format!("{ty} {} = {ty}({});", self.name, parts.join(", "))
        }
    }
}

/// A named 32-bit integer attribute holding bit-packed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackedGroup {
    pub name: String,
    pub fields: Vec<PackedField>,
}

impl PackedGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn used_bits(&self) -> u32 {
        self.fields.iter().map(PackedField::total_bits).sum()
    }

    #[inline]
    #[must_use]
    pub fn available_bits(&self) -> u32 {
        PACKED_GROUP_BITS.saturating_sub(self.used_bits())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&PackedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of scalar components across all fields.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.fields.iter().map(|f| usize::from(f.count)).sum()
    }

    /// Appends a field at the next free bit offset.
    ///
    /// Fails when the field does not fit in the remaining bits.
    pub fn push(&mut self, name: &str, ty: AttributeType, count: u8, bits: u32) -> Result<()> {
        let requested = bits.saturating_mul(u32::from(count));
        let available = self.available_bits();
        if requested > available {
            log::error!(
                "Packed group '{}': field '{name}' needs {requested} bits, only {available} left",
                self.name
            );
            return Err(PrismError::PackedGroupOverflow {
                group: self.name.clone(),
                field: name.to_string(),
                requested,
                available,
            });
        }

        self.fields.push(PackedField {
            name: name.to_string(),
            ty,
            count,
            bits,
            offset: self.used_bits(),
        });
        Ok(())
    }

    /// Packs one value per component, in field order, into a single word.
    ///
    /// Missing values are zero. Values wider than their field are truncated.
    #[must_use]
    pub fn pack(&self, values: &[u32]) -> u32 {
        if values.len() != self.component_count() {
            log::warn!(
                "Packed group '{}': expected {} values, got {}",
                self.name,
                self.component_count(),
                values.len()
            );
        }

        let mut word = 0u32;
        let mut values = values.iter().copied();
        for field in &self.fields {
            let mask = field.mask();
            for i in 0..field.count {
                let value = values.next().unwrap_or(0);
                if value & !mask != 0 {
                    log::warn!(
                        "Packed field '{}': value {value} truncated to {} bits",
                        field.name,
                        field.bits
                    );
                }
                word |= (value & mask) << field.component_offset(i);
            }
        }
        word
    }

    /// Inverse of [`pack`](Self::pack).
    #[must_use]
    pub fn unpack(&self, word: u32) -> Vec<u32> {
        self.fields
            .iter()
            .flat_map(|field| {
                (0..field.count).map(move |i| (word >> field.component_offset(i)) & field.mask())
            })
            .collect()
    }
}

/// A physical vertex attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub ty: AttributeType,
    pub count: u8,
    pub normalized: bool,
    /// The shader receives integers rather than floats
    pub as_integer: bool,
    /// Byte offset inside one vertex
    pub offset: u32,
    /// Type the shader declares for this input
    pub shader_type: String,
    pub packed: Option<PackedGroup>,
}

impl Attribute {
    fn new(name: &str, decl: AttributeDecl, offset: u32) -> Self {
        let as_integer = !decl.normalized && decl.ty.is_integer();
        let shader_type = if as_integer {
            integer_type_name(decl.count)
        } else {
            float_type_name(decl.count)
        };
        Self {
            name: name.to_string(),
            ty: decl.ty,
            count: decl.count,
            normalized: decl.normalized,
            as_integer,
            offset,
            shader_type,
            packed: None,
        }
    }

    /// Size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.ty.size() * u32::from(self.count)
    }

    #[inline]
    #[must_use]
    pub fn is_packed(&self) -> bool {
        self.packed.is_some()
    }
}

/// How a component is stored in its attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ComponentKind {
    /// The component is the whole attribute
    Plain,
    /// The component is a bit range of a packed attribute
    Packed(PackedField),
}

/// A logical vertex input as declared in the layout section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub name: String,
    /// Declaration index
    pub index: usize,
    /// Index of the backing attribute
    pub attribute: usize,
    pub kind: ComponentKind,
}

/// Ordered vertex components and the attributes backing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VertexLayout {
    components: Vec<Component>,
    attributes: Vec<Attribute>,
    stride: u32,
}

impl VertexLayout {
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Bytes per vertex.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[must_use]
    pub fn offsets(&self) -> Vec<u32> {
        self.attributes.iter().map(|a| a.offset).collect()
    }

    #[must_use]
    pub fn attribute_offset(&self, index: usize) -> Option<u32> {
        self.attributes.get(index).map(|a| a.offset)
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The attribute a component was declared in.
    #[must_use]
    pub fn attribute_for(&self, component: &str) -> Option<&Attribute> {
        let component = self.component(component)?;
        self.attributes.get(component.attribute)
    }

    pub fn packed_groups(&self) -> impl Iterator<Item = &PackedGroup> + '_ {
        self.attributes.iter().filter_map(|a| a.packed.as_ref())
    }

    /// `in <type> <name>;` for every physical attribute.
    #[must_use]
    pub fn glsl_inputs(&self) -> String {
        self.attributes
            .iter()
            .map(|a| format!("in {} {};", a.shader_type, a.name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One statement per packed component extracting it from its group.
    #[must_use]
    pub fn glsl_unpack(&self) -> String {
        self.packed_groups()
            .flat_map(|group| {
                group
                    .fields
                    .iter()
                    .map(move |field| field.unpack_statement(&group.name))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Incrementally builds a [`VertexLayout`] from declarations in order.
#[derive(Debug, Default)]
pub struct VertexLayoutBuilder {
    components: Vec<Component>,
    attributes: Vec<Attribute>,
    offset: u32,
    open: Option<PackedGroup>,
    groups_started: usize,
}

impl VertexLayoutBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plain attribute at the next byte offset.
    pub fn add(&mut self, name: &str, decl: AttributeDecl) {
        if self.open.is_some() {
            log::warn!("Attribute '{name}' declared inside an open packed group, ignored");
            return;
        }
        if self.is_declared(name) {
            log::warn!("Duplicate vertex component '{name}', ignored");
            return;
        }

        let attribute = Attribute::new(name, decl, self.offset);
        self.offset += attribute.size();
        self.components.push(Component {
            name: name.to_string(),
            index: self.components.len(),
            attribute: self.attributes.len(),
            kind: ComponentKind::Plain,
        });
        self.attributes.push(attribute);
    }

    /// Opens a packed group and returns its name. Unnamed groups are called
    /// `packed0`, `packed1`, ... in the order they are opened.
    pub fn begin_packed(&mut self, name: Option<&str>) -> &str {
        if let Some(previous) = self.open.take() {
            log::warn!("Packed group '{}' was never closed, discarded", previous.name);
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("packed{}", self.groups_started),
        };
        self.groups_started += 1;
        &self.open.insert(PackedGroup::new(name)).name
    }

    /// Adds a field to the open packed group.
    ///
    /// Returns [`PrismError::PackedGroupOverflow`] when the group's 32 bits are
    /// exhausted.
    pub fn add_packed_field(&mut self, name: &str, ty: AttributeType, count: u8, bits: u32) -> Result<()> {
        if bits == 0 {
            log::warn!("Packed field '{name}' has zero width, ignored");
            return Ok(());
        }
        let duplicate = self.is_declared(name);
        let Some(group) = self.open.as_mut() else {
            log::warn!("Packed field '{name}' declared outside a packed group, ignored");
            return Ok(());
        };
        if duplicate || group.field(name).is_some() {
            log::warn!("Duplicate vertex component '{name}', ignored");
            return Ok(());
        }
        group.push(name, ty, count, bits)
    }

    /// Closes the open packed group, allocating its `int` attribute.
    ///
    /// Returns `false` when no group was open or the group had no fields.
    pub fn end_packed(&mut self) -> bool {
        let Some(group) = self.open.take() else {
            log::warn!("No packed group to close");
            return false;
        };
        if group.fields.is_empty() {
            log::warn!("Packed group '{}' is empty, no attribute allocated", group.name);
            return false;
        }

        let attribute_index = self.attributes.len();
        for field in &group.fields {
            self.components.push(Component {
                name: field.name.clone(),
                index: self.components.len(),
                attribute: attribute_index,
                kind: ComponentKind::Packed(field.clone()),
            });
        }

        let mut attribute = Attribute::new(
            &group.name,
            AttributeDecl::new(AttributeType::Int, 1),
            self.offset,
        );
        self.offset += attribute.size();
        attribute.packed = Some(group);
        self.attributes.push(attribute);
        true
    }

    /// Drops the open packed group and its fields.
    pub fn discard_packed(&mut self) {
        if let Some(group) = self.open.take() {
            log::debug!("Discarding packed group '{}'", group.name);
        }
    }

    /// Bits still free in the open packed group.
    #[must_use]
    pub fn packed_bits_available(&self) -> Option<u32> {
        self.open.as_ref().map(PackedGroup::available_bits)
    }

    #[inline]
    #[must_use]
    pub fn is_packing(&self) -> bool {
        self.open.is_some()
    }

    #[must_use]
    pub fn build(mut self) -> VertexLayout {
        if let Some(group) = self.open.take() {
            log::warn!("Packed group '{}' was never closed, discarded", group.name);
        }
        VertexLayout {
            components: self.components,
            attributes: self.attributes,
            stride: self.offset,
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.components.iter().any(|c| c.name == name)
    }
}

fn float_type_name(count: u8) -> String {
    if count == 1 {
        "float".to_string()
    } else {
        format!("vec{count}")
    }
}

fn integer_type_name(count: u8) -> String {
    if count == 1 {
        "int".to_string()
    } else {
        format!("ivec{count}")
    }
}
