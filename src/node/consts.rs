//! Operator, function and builtin tables.

use std::str::FromStr;

use super::types::Type;

/// Binary, unary and compound-assignment operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    And,
    Or,
    Not,
    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    ShiftLeft,
    ShiftRight,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanEqual => ">=",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Not => "!",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitNot => "~",
            Operator::ShiftLeft => "<<",
            Operator::ShiftRight => ">>",
            Operator::AddAssign => "+=",
            Operator::SubAssign => "-=",
            Operator::MulAssign => "*=",
            Operator::DivAssign => "/=",
            Operator::ModAssign => "%=",
            Operator::BitAndAssign => "&=",
            Operator::BitOrAssign => "|=",
            Operator::BitXorAssign => "^=",
            Operator::ShiftLeftAssign => "<<=",
            Operator::ShiftRightAssign => ">>=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::LessThan
                | Operator::LessThanEqual
                | Operator::GreaterThan
                | Operator::GreaterThanEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Operator::And | Operator::Or | Operator::Not)
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Not | Operator::BitNot)
    }

    pub fn is_assign(self) -> bool {
        self.binary_of_assign().is_some()
    }

    /// The plain operator behind a compound assignment (`AddAssign` → `Add`).
    pub fn binary_of_assign(self) -> Option<Operator> {
        Some(match self {
            Operator::AddAssign => Operator::Add,
            Operator::SubAssign => Operator::Sub,
            Operator::MulAssign => Operator::Mul,
            Operator::DivAssign => Operator::Div,
            Operator::ModAssign => Operator::Mod,
            Operator::BitAndAssign => Operator::BitAnd,
            Operator::BitOrAssign => Operator::BitOr,
            Operator::BitXorAssign => Operator::BitXor,
            Operator::ShiftLeftAssign => Operator::ShiftLeft,
            Operator::ShiftRightAssign => Operator::ShiftRight,
            _ => return None,
        })
    }
}

/// How a builtin function's return type is derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnRule {
    Fixed(Type),
    FirstArg,
    HighestArg,
}

macro_rules! math_functions {
    ($($variant:ident => $name:literal,)*) => {
        /// Builtin shader functions callable from the graph.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum MathFunction {
            $($variant,)*
        }

        impl MathFunction {
            /// Canonical (camelCase) name; also the GLSL spelling unless lowered otherwise.
            pub fn name(self) -> &'static str {
                match self {
                    $(MathFunction::$variant => $name,)*
                }
            }
        }

        impl FromStr for MathFunction {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(MathFunction::$variant),)*
                    _ => Err(()),
                }
            }
        }
    };
}

math_functions! {
    Abs => "abs",
    Acos => "acos",
    Acosh => "acosh",
    All => "all",
    Any => "any",
    Asin => "asin",
    Asinh => "asinh",
    Atan => "atan",
    Atan2 => "atan2",
    Atanh => "atanh",
    Ceil => "ceil",
    Clamp => "clamp",
    Cos => "cos",
    Cosh => "cosh",
    Cross => "cross",
    CubeTexture => "cubeTexture",
    Degrees => "degrees",
    Determinant => "determinant",
    DFdx => "dFdx",
    DFdy => "dFdy",
    Difference => "difference",
    Distance => "distance",
    Dot => "dot",
    Equals => "equals",
    Exp => "exp",
    Exp2 => "exp2",
    Faceforward => "faceforward",
    Floor => "floor",
    Fract => "fract",
    Fwidth => "fwidth",
    InverseSqrt => "inverseSqrt",
    Length => "length",
    LengthSq => "lengthSq",
    Log => "log",
    Log2 => "log2",
    Luminance => "luminance",
    Max => "max",
    Min => "min",
    Mix => "mix",
    Negate => "negate",
    Normalize => "normalize",
    OneMinus => "oneMinus",
    Pow => "pow",
    Pow2 => "pow2",
    Pow3 => "pow3",
    Pow4 => "pow4",
    Radians => "radians",
    Reciprocal => "reciprocal",
    Reflect => "reflect",
    Refract => "refract",
    Round => "round",
    Saturate => "saturate",
    Sign => "sign",
    Sin => "sin",
    Sinh => "sinh",
    Smoothstep => "smoothstep",
    Sqrt => "sqrt",
    Step => "step",
    Tan => "tan",
    Tanh => "tanh",
    TexelFetch => "texelFetch",
    Texture => "texture",
    TextureLod => "textureLod",
    TextureSize => "textureSize",
    TransformDirection => "transformDirection",
    Trunc => "trunc",
}

impl MathFunction {
    pub fn return_rule(self) -> ReturnRule {
        use MathFunction::*;
        match self {
            All | Any | Equals => ReturnRule::Fixed(Type::Bool),
            Determinant | Distance | Dot | Length | LengthSq | Luminance => {
                ReturnRule::Fixed(Type::Float)
            }
            Cross => ReturnRule::Fixed(Type::Vec3),
            CubeTexture | Texture | TexelFetch | TextureLod => ReturnRule::Fixed(Type::Vec4),
            TextureSize => ReturnRule::Fixed(Type::Ivec2),
            Clamp | Max | Min | Mix | Smoothstep | Step => ReturnRule::HighestArg,
            _ => ReturnRule::FirstArg,
        }
    }
}

/// Builtin variable name → type. WGSL names, TSL-compatible names and legacy GLSL names.
pub fn builtin_type(name: &str) -> Option<Type> {
    Some(match name {
        "position" | "gl_FragCoord" | "color" => Type::Vec4,
        "vertex_index" | "instance_index" | "sample_index" | "sample_mask" => Type::Uint,
        "gl_VertexID" | "gl_InstanceID" | "gl_SampleID" | "gl_SampleMask" => Type::Uint,
        "front_facing" | "gl_FrontFacing" => Type::Bool,
        "frag_depth" | "gl_FragDepth" => Type::Float,
        "point_coord" | "gl_PointCoord" | "screenCoordinate" | "screenUV" | "uv" => Type::Vec2,
        "global_invocation_id" => Type::Uvec3,
        "positionLocal" | "positionWorld" | "positionView" => Type::Vec3,
        "normalLocal" | "normalWorld" | "normalView" | "normal" => Type::Vec3,
        _ => return None,
    })
}

/// WGSL builtin name → GLSL expression.
pub const WGSL_TO_GLSL_BUILTIN: &[(&str, &str)] = &[
    ("position", "gl_FragCoord"),
    ("vertex_index", "gl_VertexID"),
    ("instance_index", "gl_InstanceID"),
    ("front_facing", "gl_FrontFacing"),
    ("frag_depth", "gl_FragDepth"),
    ("sample_index", "gl_SampleID"),
    ("sample_mask", "gl_SampleMask"),
    ("point_coord", "gl_PointCoord"),
    ("uv", "gl_FragCoord.xy"),
];

pub fn glsl_builtin(name: &str) -> Option<&'static str> {
    if name.starts_with("gl_") && builtin_type(name).is_some() {
        return WGSL_TO_GLSL_BUILTIN
            .iter()
            .find(|(_, g)| *g == name)
            .map(|(_, g)| *g);
    }
    WGSL_TO_GLSL_BUILTIN
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, g)| *g)
}

/// `true` for 1–4 characters from one of the swizzle alphabets (`xyzw`, `rgba`, `stpq`).
pub fn is_swizzle(key: &str) -> bool {
    (1..=4).contains(&key.len()) && key.chars().all(|c| "xyzwrgbastpq".contains(c))
}

/// `true` when the accessor names an array index.
pub fn is_array_access(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Literals interned by the process-wide constant cache.
pub const CACHE_BOOLS: [bool; 2] = [true, false];
pub const CACHE_INTS: [i64; 6] = [0, 1, 2, 3, 4, 5];
pub const CACHE_FLOATS: [f64; 4] = [0.0, 1.0, 0.5, 2.0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_names_round_trip() {
        assert_eq!("inverseSqrt".parse::<MathFunction>(), Ok(MathFunction::InverseSqrt));
        assert_eq!(MathFunction::DFdx.name(), "dFdx");
        assert!("noSuchFn".parse::<MathFunction>().is_err());
    }

    #[test]
    fn swizzle_and_index_accessors() {
        assert!(is_swizzle("xyz"));
        assert!(is_swizzle("rgba"));
        assert!(!is_swizzle("xyzwx"));
        assert!(!is_swizzle("color"));
        assert!(is_array_access("12"));
        assert!(!is_array_access("a1"));
    }

    #[test]
    fn glsl_builtin_mapping() {
        assert_eq!(glsl_builtin("position"), Some("gl_FragCoord"));
        assert_eq!(glsl_builtin("gl_PointCoord"), Some("gl_PointCoord"));
        assert_eq!(glsl_builtin("normalWorld"), None);
    }

    #[test]
    fn compound_assign_maps_to_binary() {
        assert_eq!(Operator::MulAssign.binary_of_assign(), Some(Operator::Mul));
        assert!(Operator::AddAssign.is_assign());
        assert!(!Operator::Add.is_assign());
    }
}
