use serde::Serialize;

/// Element type of a scalar, vector or matrix value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    Float,
    Int,
    Uint,
    Bool,
}

impl ScalarKind {
    /// Prefix used for vector type names (`vec`, `ivec`, `uvec`, `bvec`).
    fn vector_prefix(self) -> &'static str {
        match self {
            ScalarKind::Float => "",
            ScalarKind::Int => "i",
            ScalarKind::Uint => "u",
            ScalarKind::Bool => "b",
        }
    }

    fn scalar_name(self) -> &'static str {
        match self {
            ScalarKind::Float => "float",
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Bool => "bool",
        }
    }
}

/// A scalar, vector or square matrix value type.
///
/// Scalars and vectors have a single column; `mat2`..`mat4` have `columns == rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ValueType {
    pub scalar: ScalarKind,
    /// Components per column (1..=4)
    pub rows: u8,
    /// 1 for scalars and vectors
    pub columns: u8,
}

impl ValueType {
    pub const FLOAT: Self = Self::vector(ScalarKind::Float, 1);
    pub const INT: Self = Self::vector(ScalarKind::Int, 1);
    pub const VEC2: Self = Self::vector(ScalarKind::Float, 2);
    pub const VEC3: Self = Self::vector(ScalarKind::Float, 3);
    pub const VEC4: Self = Self::vector(ScalarKind::Float, 4);
    pub const MAT3: Self = Self::matrix(3);
    pub const MAT4: Self = Self::matrix(4);

    #[must_use]
    pub const fn vector(scalar: ScalarKind, rows: u8) -> Self {
        Self {
            scalar,
            rows,
            columns: 1,
        }
    }

    #[must_use]
    pub const fn matrix(size: u8) -> Self {
        Self {
            scalar: ScalarKind::Float,
            rows: size,
            columns: size,
        }
    }

    /// Parses a GLSL-style type name such as `float`, `uvec3` or `mat4`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let scalar = match name {
            "float" => Some(ScalarKind::Float),
            "int" => Some(ScalarKind::Int),
            "uint" => Some(ScalarKind::Uint),
            "bool" => Some(ScalarKind::Bool),
            _ => None,
        };
        if let Some(scalar) = scalar {
            return Some(Self::vector(scalar, 1));
        }

        if let Some(size) = name.strip_prefix("mat") {
            return parse_dimension(size).map(Self::matrix);
        }

        let (scalar, rest) = match name.as_bytes().first()? {
            b'i' => (ScalarKind::Int, &name[1..]),
            b'u' => (ScalarKind::Uint, &name[1..]),
            b'b' => (ScalarKind::Bool, &name[1..]),
            _ => (ScalarKind::Float, name),
        };
        let rows = parse_dimension(rest.strip_prefix("vec")?)?;
        Some(Self::vector(scalar, rows))
    }

    #[inline]
    #[must_use]
    pub fn is_matrix(&self) -> bool {
        self.columns > 1
    }

    /// Tightly packed size in bytes. Every scalar kind is 4 bytes wide.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        4 * u32::from(self.rows) * u32::from(self.columns)
    }

    #[must_use]
    pub fn glsl_name(&self) -> String {
        if self.is_matrix() {
            format!("mat{}", self.columns)
        } else if self.rows == 1 {
            self.scalar.scalar_name().to_string()
        } else {
            format!("{}vec{}", self.scalar.vector_prefix(), self.rows)
        }
    }
}

fn parse_dimension(digits: &str) -> Option<u8> {
    match digits {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}
