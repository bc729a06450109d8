//! Semantic type tags shared by inference and both emitters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Element kind of a scalar, vector or matrix type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Uint,
    Int,
    Float,
}

/// Shader value type.
///
/// Declaration order doubles as the promotion priority used when two operands disagree
/// (scalars < vectors < matrices).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Bool,
    Uint,
    Int,
    Float,
    Bvec2,
    Ivec2,
    Uvec2,
    Vec2,
    Bvec3,
    Ivec3,
    Uvec3,
    Vec3,
    Bvec4,
    Ivec4,
    Uvec4,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Texture,
    Sampler2D,
    /// User struct, named by its header id.
    Struct(String),
}

const NAMED: [(&str, Type); 22] = [
    ("void", Type::Void),
    ("bool", Type::Bool),
    ("uint", Type::Uint),
    ("int", Type::Int),
    ("float", Type::Float),
    ("bvec2", Type::Bvec2),
    ("ivec2", Type::Ivec2),
    ("uvec2", Type::Uvec2),
    ("vec2", Type::Vec2),
    ("bvec3", Type::Bvec3),
    ("ivec3", Type::Ivec3),
    ("uvec3", Type::Uvec3),
    ("vec3", Type::Vec3),
    ("bvec4", Type::Bvec4),
    ("ivec4", Type::Ivec4),
    ("uvec4", Type::Uvec4),
    ("vec4", Type::Vec4),
    ("mat2", Type::Mat2),
    ("mat3", Type::Mat3),
    ("mat4", Type::Mat4),
    ("texture", Type::Texture),
    ("sampler2D", Type::Sampler2D),
];

impl Type {
    /// Promotion priority; higher wins when operand types disagree.
    pub fn priority(&self) -> usize {
        match self {
            Type::Struct(_) => NAMED.len(),
            other => NAMED.iter().position(|(_, t)| t == other).unwrap_or(0),
        }
    }

    /// The GLSL spelling, which is also the canonical name of the type.
    pub fn glsl(&self) -> &str {
        match self {
            Type::Struct(name) => name,
            other => NAMED
                .iter()
                .find(|(_, t)| t == other)
                .map(|(name, _)| *name)
                .unwrap_or("float"),
        }
    }

    /// The WGSL spelling.
    pub fn wgsl(&self) -> &str {
        match self {
            Type::Void => "void",
            Type::Bool => "bool",
            Type::Uint => "u32",
            Type::Int => "i32",
            Type::Float => "f32",
            Type::Bvec2 => "vec2<bool>",
            Type::Ivec2 => "vec2i",
            Type::Uvec2 => "vec2u",
            Type::Vec2 => "vec2f",
            Type::Bvec3 => "vec3<bool>",
            Type::Ivec3 => "vec3i",
            Type::Uvec3 => "vec3u",
            Type::Vec3 => "vec3f",
            Type::Bvec4 => "vec4<bool>",
            Type::Ivec4 => "vec4i",
            Type::Uvec4 => "vec4u",
            Type::Vec4 => "vec4f",
            Type::Mat2 => "mat2x2f",
            Type::Mat3 => "mat3x3f",
            Type::Mat4 => "mat4x4f",
            Type::Texture => "texture_2d<f32>",
            Type::Sampler2D => "sampler",
            Type::Struct(name) => name,
        }
    }

    pub fn element(&self) -> Option<ScalarKind> {
        Some(match self {
            Type::Bool | Type::Bvec2 | Type::Bvec3 | Type::Bvec4 => ScalarKind::Bool,
            Type::Uint | Type::Uvec2 | Type::Uvec3 | Type::Uvec4 => ScalarKind::Uint,
            Type::Int | Type::Ivec2 | Type::Ivec3 | Type::Ivec4 => ScalarKind::Int,
            Type::Float
            | Type::Vec2
            | Type::Vec3
            | Type::Vec4
            | Type::Mat2
            | Type::Mat3
            | Type::Mat4 => ScalarKind::Float,
            _ => return None,
        })
    }

    /// Number of scalar components (matrices count every cell).
    pub fn components(&self) -> usize {
        match self {
            Type::Bool | Type::Uint | Type::Int | Type::Float => 1,
            Type::Bvec2 | Type::Ivec2 | Type::Uvec2 | Type::Vec2 => 2,
            Type::Bvec3 | Type::Ivec3 | Type::Uvec3 | Type::Vec3 => 3,
            Type::Bvec4 | Type::Ivec4 | Type::Uvec4 | Type::Vec4 | Type::Mat2 => 4,
            Type::Mat3 => 9,
            Type::Mat4 => 16,
            _ => 0,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::Uint | Type::Int | Type::Float)
    }

    pub fn is_vector(&self) -> bool {
        self.vector_width().is_some()
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Mat2 | Type::Mat3 | Type::Mat4)
    }

    pub fn is_texture(&self) -> bool {
        matches!(self, Type::Texture | Type::Sampler2D)
    }

    /// Width of a vector type, `None` for everything else.
    pub fn vector_width(&self) -> Option<usize> {
        match self {
            Type::Bvec2 | Type::Ivec2 | Type::Uvec2 | Type::Vec2 => Some(2),
            Type::Bvec3 | Type::Ivec3 | Type::Uvec3 | Type::Vec3 => Some(3),
            Type::Bvec4 | Type::Ivec4 | Type::Uvec4 | Type::Vec4 => Some(4),
            _ => None,
        }
    }

    /// Column vector type of a matrix.
    pub fn column(&self) -> Option<Type> {
        match self {
            Type::Mat2 => Some(Type::Vec2),
            Type::Mat3 => Some(Type::Vec3),
            Type::Mat4 => Some(Type::Vec4),
            _ => None,
        }
    }

    /// Scalar (`width == 1`) or vector type of the given element kind.
    pub fn vector(kind: ScalarKind, width: usize) -> Type {
        use ScalarKind::*;
        match (kind, width) {
            (Bool, 1) => Type::Bool,
            (Bool, 2) => Type::Bvec2,
            (Bool, 3) => Type::Bvec3,
            (Bool, 4) => Type::Bvec4,
            (Uint, 1) => Type::Uint,
            (Uint, 2) => Type::Uvec2,
            (Uint, 3) => Type::Uvec3,
            (Uint, 4) => Type::Uvec4,
            (Int, 1) => Type::Int,
            (Int, 2) => Type::Ivec2,
            (Int, 3) => Type::Ivec3,
            (Int, 4) => Type::Ivec4,
            (Float, 2) => Type::Vec2,
            (Float, 3) => Type::Vec3,
            (Float, 4) => Type::Vec4,
            _ => Type::Float,
        }
    }

    /// Type implied by a raw array length: 1/2/3/4/9/16 → float/vec2/vec3/vec4/mat3/mat4.
    pub fn from_count(count: usize) -> Option<Type> {
        match count {
            1 => Some(Type::Float),
            2 => Some(Type::Vec2),
            3 => Some(Type::Vec3),
            4 => Some(Type::Vec4),
            9 => Some(Type::Mat3),
            16 => Some(Type::Mat4),
            _ => None,
        }
    }

    /// Struct id for struct types.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glsl())
    }
}

impl FromStr for Type {
    type Err = ();

    /// Parses builtin type names; `color` is an alias of `vec3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "color" {
            return Ok(Type::Vec3);
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, t)| t.clone())
            .ok_or(())
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.glsl())
    }
}

impl<'de> Deserialize<'de> for Type {
    /// Unknown names deserialize as struct types.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(name.parse().unwrap_or(Type::Struct(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_scalars_below_vectors_below_matrices() {
        assert!(Type::Float.priority() < Type::Vec2.priority());
        assert!(Type::Vec4.priority() < Type::Mat2.priority());
        assert!(Type::Bool.priority() < Type::Float.priority());
    }

    #[test]
    fn dialect_names() {
        assert_eq!(Type::Vec3.glsl(), "vec3");
        assert_eq!(Type::Vec3.wgsl(), "vec3f");
        assert_eq!(Type::Bvec2.wgsl(), "vec2<bool>");
        assert_eq!(Type::Mat4.wgsl(), "mat4x4f");
        assert_eq!(Type::Struct("Light".into()).wgsl(), "Light");
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("ivec3".parse::<Type>(), Ok(Type::Ivec3));
        assert_eq!("color".parse::<Type>(), Ok(Type::Vec3));
        assert!("Light".parse::<Type>().is_err());
    }

    #[test]
    fn deserializes_struct_names() {
        let t: Type = serde_json::from_str("\"Light\"").unwrap();
        assert_eq!(t, Type::Struct("Light".into()));
        let t: Type = serde_json::from_str("\"vec2\"").unwrap();
        assert_eq!(t, Type::Vec2);
    }

    #[test]
    fn vector_constructor_keeps_kind() {
        assert_eq!(Type::vector(ScalarKind::Int, 3), Type::Ivec3);
        assert_eq!(Type::vector(ScalarKind::Float, 1), Type::Float);
        assert_eq!(Type::from_count(16), Some(Type::Mat4));
        assert_eq!(Type::from_count(5), None);
    }
}
