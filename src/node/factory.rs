//! Free constructor functions: typed constructors, resources, builtins and math helpers.

use std::sync::OnceLock;

use super::cache::{cached_bool, cached_float, cached_int};
use super::consts::MathFunction;
use super::ops::NodeOps;
use super::types::Type;
use super::{Child, Node, NodeKind};
use crate::utils::hex2rgb;

/// Argument list of a constructor call.
///
/// Implemented for single values, tuples of up to four values, arrays and `Vec<Child>`, so
/// `vec3(1.0)`, `vec3((uv, 0.0))` and `mat3([0.0; 9])` all read naturally.
pub trait IntoArgs {
    fn into_args(self) -> Vec<Child>;
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<Child> {
        Vec::new()
    }
}

impl IntoArgs for Vec<Child> {
    fn into_args(self) -> Vec<Child> {
        self
    }
}

impl<T: Into<Child>, const N: usize> IntoArgs for [T; N] {
    fn into_args(self) -> Vec<Child> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! single_args {
    ($($ty:ty),*) => {
        $(
            impl IntoArgs for $ty {
                fn into_args(self) -> Vec<Child> {
                    vec![self.into()]
                }
            }
        )*
    };
}

single_args!(Node, &Node, Child, f64, f32, i32, u32, bool);

macro_rules! tuple_args {
    ($($name:ident),+) => {
        impl<$($name: Into<Child>),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Vec<Child> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple_args!(A);
tuple_args!(A, B);
tuple_args!(A, B, C);
tuple_args!(A, B, C, D);

/// `ty(args…)`, the generic constructor behind every typed helper.
pub fn construct(ty: Type, args: impl IntoArgs) -> Node {
    Node::new(NodeKind::Conversion {
        ty,
        args: args.into_args(),
    })
}

fn single(args: &[Child]) -> Option<&Child> {
    match args {
        [only] => Some(only),
        _ => None,
    }
}

/// `float(x)`; seeded literals come from the constant cache.
pub fn float(args: impl IntoArgs) -> Node {
    let args = args.into_args();
    if let Some(Child::Float(v)) = single(&args) {
        return cached_float(*v);
    }
    construct(Type::Float, args)
}

pub fn int(args: impl IntoArgs) -> Node {
    let args = args.into_args();
    if let Some(Child::Float(v)) = single(&args) {
        if v.fract() == 0.0 && v.is_finite() {
            return cached_int(*v as i64);
        }
    }
    construct(Type::Int, args)
}

pub fn uint(args: impl IntoArgs) -> Node {
    construct(Type::Uint, args)
}

pub fn bool_(args: impl IntoArgs) -> Node {
    let args = args.into_args();
    if let Some(Child::Bool(v)) = single(&args) {
        return cached_bool(*v);
    }
    construct(Type::Bool, args)
}

macro_rules! constructors {
    ($($name:ident => $ty:ident),* $(,)?) => {
        $(
            pub fn $name(args: impl IntoArgs) -> Node {
                construct(Type::$ty, args)
            }
        )*
    };
}

constructors!(
    vec2 => Vec2,
    vec3 => Vec3,
    vec4 => Vec4,
    ivec2 => Ivec2,
    ivec3 => Ivec3,
    ivec4 => Ivec4,
    uvec2 => Uvec2,
    uvec3 => Uvec3,
    uvec4 => Uvec4,
    bvec2 => Bvec2,
    bvec3 => Bvec3,
    bvec4 => Bvec4,
    mat2 => Mat2,
    mat3 => Mat3,
    mat4 => Mat4,
);

/// `vec3` from a `0xRRGGBB` colour.
pub fn color(hex: u32) -> Node {
    let [r, g, b] = hex2rgb(hex);
    construct(Type::Vec3, (r, g, b))
}

pub fn uniform(value: impl Into<Child>, id: &str) -> Node {
    Node::new(NodeKind::Uniform {
        id: id.to_string(),
        value: value.into(),
    })
}

pub fn attribute(value: impl Into<Child>, id: &str) -> Node {
    Node::new(NodeKind::Attribute {
        id: id.to_string(),
        value: value.into(),
    })
}

pub fn instance(value: impl Into<Child>, id: &str) -> Node {
    Node::new(NodeKind::Instance {
        id: id.to_string(),
        value: value.into(),
    })
}

pub fn constant(value: impl Into<Child>, id: &str) -> Node {
    Node::new(NodeKind::Constant {
        id: id.to_string(),
        value: value.into(),
    })
}

pub fn storage(value: impl Into<Child>, id: &str) -> Node {
    Node::new(NodeKind::Storage {
        id: id.to_string(),
        value: value.into(),
    })
}

pub fn builtin(id: &str) -> Node {
    Node::new(NodeKind::Builtin { id: id.to_string() })
}

/// Reference to an already declared name.
pub fn variable(id: &str, ty: Type) -> Node {
    Node::new(NodeKind::Variable {
        id: id.to_string(),
        source: super::VarSource::Declared(ty),
        mutable: true,
    })
}

/// Value computed in the vertex stage and read in the fragment stage.
pub fn varying(value: impl Into<Child>, id: &str) -> Node {
    Node::new(NodeKind::Varying {
        id: id.to_string(),
        value: value.into(),
    })
}

fn shared(cell: &'static OnceLock<Node>, init: impl FnOnce() -> Node) -> Node {
    cell.get_or_init(init).clone()
}

pub fn i_resolution() -> Node {
    static CELL: OnceLock<Node> = OnceLock::new();
    shared(&CELL, || uniform([1280.0f32, 800.0], "iResolution"))
}

pub fn i_mouse() -> Node {
    static CELL: OnceLock<Node> = OnceLock::new();
    shared(&CELL, || uniform([0.0f32, 0.0], "iMouse"))
}

pub fn i_time() -> Node {
    static CELL: OnceLock<Node> = OnceLock::new();
    shared(&CELL, || uniform(0.0, "iTime"))
}

macro_rules! builtins {
    ($($name:ident => $id:literal),* $(,)?) => {
        $(
            pub fn $name() -> Node {
                builtin($id)
            }
        )*
    };
}

builtins!(
    position => "position",
    vertex_index => "vertex_index",
    instance_index => "instance_index",
    front_facing => "front_facing",
    frag_depth => "frag_depth",
    sample_index => "sample_index",
    sample_mask => "sample_mask",
    point_coord => "point_coord",
    global_invocation_id => "global_invocation_id",
    position_local => "position",
    position_world => "positionWorld",
    position_view => "positionView",
    normal_local => "normalLocal",
    normal_world => "normalWorld",
    normal_view => "normalView",
    screen_coordinate => "screenCoordinate",
    screen_uv => "screenUV",
);

fn call(func: MathFunction, args: Vec<Child>) -> Node {
    Node::new(NodeKind::Function { func, args })
}

macro_rules! unary_free {
    ($($name:ident => $func:ident),* $(,)?) => {
        $(
            pub fn $name(x: impl Into<Child>) -> Node {
                call(MathFunction::$func, vec![x.into()])
            }
        )*
    };
}

macro_rules! binary_free {
    ($($name:ident => $func:ident),* $(,)?) => {
        $(
            pub fn $name(a: impl Into<Child>, b: impl Into<Child>) -> Node {
                call(MathFunction::$func, vec![a.into(), b.into()])
            }
        )*
    };
}

macro_rules! ternary_free {
    ($($name:ident => $func:ident),* $(,)?) => {
        $(
            pub fn $name(a: impl Into<Child>, b: impl Into<Child>, c: impl Into<Child>) -> Node {
                call(MathFunction::$func, vec![a.into(), b.into(), c.into()])
            }
        )*
    };
}

unary_free!(
    abs => Abs,
    acos => Acos,
    acosh => Acosh,
    all => All,
    any => Any,
    asin => Asin,
    asinh => Asinh,
    atan => Atan,
    atanh => Atanh,
    ceil => Ceil,
    cos => Cos,
    cosh => Cosh,
    degrees => Degrees,
    determinant => Determinant,
    dfdx => DFdx,
    dfdy => DFdy,
    exp => Exp,
    exp2 => Exp2,
    floor => Floor,
    fract => Fract,
    fwidth => Fwidth,
    inverse_sqrt => InverseSqrt,
    length => Length,
    length_sq => LengthSq,
    log => Log,
    log2 => Log2,
    luminance => Luminance,
    negate => Negate,
    normalize => Normalize,
    one_minus => OneMinus,
    pow2 => Pow2,
    pow3 => Pow3,
    pow4 => Pow4,
    radians => Radians,
    reciprocal => Reciprocal,
    round => Round,
    saturate => Saturate,
    sign => Sign,
    sin => Sin,
    sinh => Sinh,
    sqrt => Sqrt,
    tan => Tan,
    tanh => Tanh,
    trunc => Trunc,
);

binary_free!(
    atan2 => Atan2,
    cross => Cross,
    difference => Difference,
    distance => Distance,
    dot => Dot,
    equals => Equals,
    max => Max,
    min => Min,
    pow => Pow,
    reflect => Reflect,
    step => Step,
    transform_direction => TransformDirection,
    texture => Texture,
    cube_texture => CubeTexture,
    texture_size => TextureSize,
);

ternary_free!(
    clamp => Clamp,
    mix => Mix,
    smoothstep => Smoothstep,
    refract => Refract,
    faceforward => Faceforward,
    texture_lod => TextureLod,
    texel_fetch => TexelFetch,
);

/// `condition ? yes : no`
pub fn select(yes: &Node, no: impl Into<Child>, condition: impl Into<Child>) -> Node {
    yes.select(no, condition)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_constructors_share_nodes() {
        assert_eq!(float(1.0), float(1.0));
        assert_eq!(int(2), int(2));
        assert_eq!(bool_(false), bool_(false));
        assert_ne!(float(0.3), float(0.3));
    }

    #[test]
    fn tuple_arguments_keep_order() {
        let v = vec3((1, 2.5, true));
        match v.kind() {
            NodeKind::Conversion { ty, args } => {
                assert_eq!(*ty, Type::Vec3);
                assert_eq!(args.len(), 3);
                assert!(matches!(args[2], Child::Bool(true)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn default_uniforms_are_process_wide() {
        assert_eq!(i_time(), i_time());
        assert_eq!(i_resolution().id(), Some("iResolution"));
    }

    #[test]
    fn color_splits_hex_channels() {
        match color(0xff8000).kind() {
            NodeKind::Conversion { args, .. } => {
                assert!(matches!(args[0], Child::Float(r) if r == 1.0));
                assert!(matches!(args[2], Child::Float(b) if b == 0.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
