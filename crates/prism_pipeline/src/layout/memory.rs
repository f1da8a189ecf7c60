//! Memory Layout Rules
//!
//! Computes byte offsets and sizes of struct members and buffer block
//! properties under one of three alignment regimes:
//!
//! | rule     | scalars / vec2 | vec3 | vec4 | matrix column     | struct size   |
//! |----------|----------------|------|------|-------------------|---------------|
//! | `Std140` | 16             | 16   | 16   | 16                | multiple of 16|
//! | `Std430` | tight          | 16   | 16   | 16 if 3 rows      | tight         |
//! | `Packed` | tight          | 12   | 16   | tight             | tight         |
//!
//! Members are laid out one after another; every member's size already
//! includes its padding, so offsets are running sums. Array elements use the
//! padded element size as their stride.

use serde::Serialize;

use crate::schema::{PropertyDecl, PropertyType, ValueType};

/// Alignment regime used to size uniform and buffer memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum LayoutRule {
    /// Every non-vec4 scalar/vector takes a 16-byte slot, struct sizes round up to 16
    #[default]
    Std140,
    /// Only 3-component vectors (and 3-row matrix columns) are padded to 16
    Std430,
    /// No padding
    Packed,
}

impl LayoutRule {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "std140" => Some(Self::Std140),
            "std430" => Some(Self::Std430),
            "packed" => Some(Self::Packed),
            _ => None,
        }
    }

    /// Name used in GLSL `layout(...)` qualifiers.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Std140 => "std140",
            Self::Std430 => "std430",
            Self::Packed => "packed",
        }
    }

    /// Size of one value, padding included.
    #[must_use]
    pub fn value_size(self, ty: ValueType) -> u32 {
        let tight = 4 * u32::from(ty.rows);
        let column = match self {
            Self::Std140 => 16,
            Self::Std430 if ty.rows == 3 => 16,
            Self::Std430 | Self::Packed => tight,
        };
        column * u32::from(ty.columns)
    }

    /// Final size of a struct whose members occupy `members` bytes.
    #[must_use]
    pub fn struct_size(self, members: u32) -> u32 {
        match self {
            Self::Std140 => members.next_multiple_of(16),
            Self::Std430 | Self::Packed => members,
        }
    }
}

/// Placement of one property inside a struct or buffer block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyLayout {
    pub name: String,
    pub offset: u32,
    /// Padded size of one element
    pub stride: u32,
    pub array_len: u32,
    /// `stride * array_len`
    pub size: u32,
    /// Padding bytes trailing each element
    pub padding: u32,
}

/// Placement of every property of a struct or buffer block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructLayout {
    pub name: String,
    pub rule: LayoutRule,
    pub properties: Vec<PropertyLayout>,
    /// Total size including trailing padding
    pub size: u32,
}

impl StructLayout {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyLayout> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn offsets(&self) -> Vec<u32> {
        self.properties.iter().map(|p| p.offset).collect()
    }
}

/// Padded and tight size of one element of a nested struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ElementSize {
    pub padded: u32,
    pub tight: u32,
}

/// Lays out `properties` in order. `nested` sizes struct-typed properties;
/// properties it cannot resolve are logged and left out.
pub(crate) fn layout_properties<F>(
    name: &str,
    properties: &[PropertyDecl],
    rule: LayoutRule,
    mut nested: F,
) -> StructLayout
where
    F: FnMut(&str) -> Option<ElementSize>,
{
    let mut offset: u32 = 0;
    let mut placed = Vec::with_capacity(properties.len());

    for property in properties {
        let element = match &property.ty {
            PropertyType::Value(ty) => ElementSize {
                padded: rule.value_size(*ty),
                tight: ty.size(),
            },
            PropertyType::Struct(struct_name) => {
                let Some(element) = nested(struct_name) else {
                    log::warn!(
                        "{name}.{}: unknown struct '{struct_name}', property left out of the layout",
                        property.name
                    );
                    continue;
                };
                element
            }
        };

        let Some(size) = element
            .padded
            .checked_mul(property.array_len)
            .filter(|size| {
                offset
                    .checked_add(*size)
                    .and_then(|end| end.checked_next_multiple_of(16))
                    .is_some()
            })
        else {
            log::warn!(
                "{name}.{}: {} elements of {} bytes overflow the layout, property left out",
                property.name,
                property.array_len,
                element.padded
            );
            continue;
        };
        placed.push(PropertyLayout {
            name: property.name.clone(),
            offset,
            stride: element.padded,
            array_len: property.array_len,
            size,
            padding: element.padded - element.tight,
        });
        offset += size;
    }

    StructLayout {
        name: name.to_string(),
        rule,
        properties: placed,
        size: rule.struct_size(offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarKind;

    fn value(name: &str, ty: ValueType, array_len: u32) -> PropertyDecl {
        PropertyDecl::new(name, PropertyType::Value(ty), array_len)
    }

    #[test]
    fn test_value_sizes_per_rule() {
        let cases = [
            (ValueType::FLOAT, [16, 4, 4]),
            (ValueType::VEC2, [16, 8, 8]),
            (ValueType::VEC3, [16, 16, 12]),
            (ValueType::VEC4, [16, 16, 16]),
            (ValueType::MAT3, [48, 48, 36]),
            (ValueType::MAT4, [64, 64, 64]),
            (ValueType::vector(ScalarKind::Int, 3), [16, 16, 12]),
        ];
        for (ty, [std140, std430, packed]) in cases {
            assert_eq!(LayoutRule::Std140.value_size(ty), std140, "{ty:?}");
            assert_eq!(LayoutRule::Std430.value_size(ty), std430, "{ty:?}");
            assert_eq!(LayoutRule::Packed.value_size(ty), packed, "{ty:?}");
        }
    }

    #[test]
    fn test_array_stride_is_padded_element() {
        let props = [value("weights", ValueType::FLOAT, 4)];
        let std140 = layout_properties("W", &props, LayoutRule::Std140, |_| None);
        let weights = std140.property("weights").unwrap();
        assert_eq!(weights.stride, 16);
        assert_eq!(weights.size, 64);
        assert_eq!(weights.padding, 12);

        let packed = layout_properties("W", &props, LayoutRule::Packed, |_| None);
        assert_eq!(packed.size, 16);
    }

    #[test]
    fn test_offsets_and_struct_rounding() {
        let props = [
            value("color", ValueType::VEC3, 1),
            value("intensity", ValueType::FLOAT, 1),
        ];
        let std140 = layout_properties("Light", &props, LayoutRule::Std140, |_| None);
        assert_eq!(std140.offsets(), vec![0, 16]);
        assert_eq!(std140.size, 32);

        let std430 = layout_properties("Light", &props, LayoutRule::Std430, |_| None);
        assert_eq!(std430.offsets(), vec![0, 16]);
        assert_eq!(std430.size, 20);

        let packed = layout_properties("Light", &props, LayoutRule::Packed, |_| None);
        assert_eq!(packed.offsets(), vec![0, 12]);
        assert_eq!(packed.size, 16);

        let odd = [value("a", ValueType::VEC2, 1), value("b", ValueType::FLOAT, 1)];
        assert_eq!(layout_properties("Odd", &odd, LayoutRule::Std140, |_| None).size, 32);
        assert_eq!(layout_properties("Odd", &odd, LayoutRule::Packed, |_| None).size, 12);
    }

    #[test]
    fn test_oversized_array_is_left_out() {
        let props = [
            value("huge", ValueType::MAT4, 100_000_000),
            value("edge", ValueType::FLOAT, u32::MAX / 4),
            value("tail", ValueType::FLOAT, 1),
        ];
        let layout = layout_properties("Big", &props, LayoutRule::Packed, |_| None);
        let names: Vec<_> = layout.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["tail"]);
        assert_eq!(layout.size, 4);
    }

    #[test]
    fn test_nested_struct_sizes() {
        let props = [
            PropertyDecl::new("lights", PropertyType::Struct("Light".into()), 2),
            PropertyDecl::new("fog", PropertyType::Struct("Fog".into()), 1),
            value("count", ValueType::INT, 1),
        ];
        let layout = layout_properties("Scene", &props, LayoutRule::Std140, |name| {
            (name == "Light").then_some(ElementSize { padded: 32, tight: 16 })
        });

        // `fog` does not resolve and is left out
        assert_eq!(layout.properties.len(), 2);
        let lights = layout.property("lights").unwrap();
        assert_eq!((lights.offset, lights.stride, lights.size, lights.padding), (0, 32, 64, 16));
        assert_eq!(layout.property("count").unwrap().offset, 64);
        assert_eq!(layout.size, 80);
    }

    #[test]
    fn test_parse_rule_names() {
        assert_eq!(LayoutRule::parse("STD140"), Some(LayoutRule::Std140));
        assert_eq!(LayoutRule::parse("std430"), Some(LayoutRule::Std430));
        assert_eq!(LayoutRule::parse("packed"), Some(LayoutRule::Packed));
        assert_eq!(LayoutRule::parse("shared"), None);
        assert_eq!(LayoutRule::default().name(), "std140");
    }
}
