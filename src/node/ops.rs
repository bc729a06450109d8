//! The fluent method surface of graph nodes.

use anyhow::Result;

use super::consts::{self, MathFunction, Operator};
use super::types::Type;
use super::{Child, Node, NodeKind};
use crate::scope::Builder;

macro_rules! swizzles {
    ($($name:ident),* $(,)?) => {
        $(
            fn $name(&self) -> Node {
                self.swizzle(stringify!($name))
            }
        )*
    };
}

macro_rules! binary_ops {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            fn $name(&self, rhs: impl Into<Child>) -> Node {
                binary(self.handle(), Operator::$op, rhs.into())
            }
        )*
    };
}

macro_rules! assign_ops {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            fn $name(&self, builder: &mut Builder, rhs: impl Into<Child>) -> Result<()> {
                builder.op_assign(&self.handle(), Operator::$op, rhs)
            }
        )*
    };
}

macro_rules! unary_fns {
    ($($name:ident => $func:ident),* $(,)?) => {
        $(
            fn $name(&self) -> Node {
                self.apply(MathFunction::$func, Vec::new())
            }
        )*
    };
}

macro_rules! binary_fns {
    ($($name:ident => $func:ident),* $(,)?) => {
        $(
            fn $name(&self, other: impl Into<Child>) -> Node {
                self.apply(MathFunction::$func, vec![other.into()])
            }
        )*
    };
}

macro_rules! conversions {
    ($($name:ident => $ty:ident),* $(,)?) => {
        $(
            fn $name(&self) -> Node {
                self.convert(Type::$ty)
            }
        )*
    };
}

fn binary(lhs: Node, op: Operator, rhs: Child) -> Node {
    Node::new(NodeKind::Operator {
        op,
        lhs: Child::Node(lhs),
        rhs: Some(rhs),
    })
}

fn unary(operand: Node, op: Operator) -> Node {
    Node::new(NodeKind::Operator {
        op,
        lhs: Child::Node(operand),
        rhs: None,
    })
}

/// Swizzles, operators, math functions, conversions and statement helpers.
///
/// Every method builds a new node; the receiver is never modified. Methods that emit a
/// statement take the [`Builder`] whose active scope receives it.
pub trait NodeOps {
    fn handle(&self) -> Node;

    fn swizzle(&self, letters: &str) -> Node {
        Node::new(NodeKind::Swizzle {
            base: self.handle(),
            letters: letters.to_string(),
        })
    }

    swizzles!(
        x, y, z, w, xy, xz, yx, yz, zw, xyz, zyx, xyzw, r, g, b, a, rg, rgb, bgr, rgba
    );

    /// Accessor parser: swizzle letters, then array indices, then struct members.
    fn get(&self, key: &str) -> Node {
        if consts::is_swizzle(key) {
            return self.swizzle(key);
        }
        if consts::is_array_access(key) {
            let index = key.parse::<f64>().unwrap_or(0.0);
            return self.element(index);
        }
        self.member(key)
    }

    binary_ops!(
        add => Add,
        sub => Sub,
        mul => Mul,
        div => Div,
        modulo => Mod,
        equal => Equal,
        not_equal => NotEqual,
        less_than => LessThan,
        less_than_equal => LessThanEqual,
        greater_than => GreaterThan,
        greater_than_equal => GreaterThanEqual,
        and => And,
        or => Or,
        bit_and => BitAnd,
        bit_or => BitOr,
        bit_xor => BitXor,
        shift_left => ShiftLeft,
        shift_right => ShiftRight,
    );

    fn not(&self) -> Node {
        unary(self.handle(), Operator::Not)
    }

    fn bit_not(&self) -> Node {
        unary(self.handle(), Operator::BitNot)
    }

    assign_ops!(
        add_assign => AddAssign,
        sub_assign => SubAssign,
        mul_assign => MulAssign,
        div_assign => DivAssign,
        mod_assign => ModAssign,
        bit_and_assign => BitAndAssign,
        bit_or_assign => BitOrAssign,
        bit_xor_assign => BitXorAssign,
        shift_left_assign => ShiftLeftAssign,
        shift_right_assign => ShiftRightAssign,
    );

    /// Builtin function call with the receiver as first argument.
    fn apply(&self, func: MathFunction, rest: Vec<Child>) -> Node {
        let mut args = Vec::with_capacity(rest.len() + 1);
        args.push(Child::Node(self.handle()));
        args.extend(rest);
        Node::new(NodeKind::Function { func, args })
    }

    unary_fns!(
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

    binary_fns!(
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
    );

    fn clamp(&self, lo: impl Into<Child>, hi: impl Into<Child>) -> Node {
        self.apply(MathFunction::Clamp, vec![lo.into(), hi.into()])
    }

    fn mix(&self, other: impl Into<Child>, t: impl Into<Child>) -> Node {
        self.apply(MathFunction::Mix, vec![other.into(), t.into()])
    }

    fn smoothstep(&self, edge: impl Into<Child>, x: impl Into<Child>) -> Node {
        self.apply(MathFunction::Smoothstep, vec![edge.into(), x.into()])
    }

    fn refract(&self, normal: impl Into<Child>, eta: impl Into<Child>) -> Node {
        self.apply(MathFunction::Refract, vec![normal.into(), eta.into()])
    }

    fn faceforward(&self, incident: impl Into<Child>, reference: impl Into<Child>) -> Node {
        self.apply(MathFunction::Faceforward, vec![incident.into(), reference.into()])
    }

    fn convert(&self, ty: Type) -> Node {
        Node::new(NodeKind::Conversion {
            ty,
            args: vec![Child::Node(self.handle())],
        })
    }

    conversions!(
        to_float => Float,
        to_int => Int,
        to_uint => Uint,
        to_bool => Bool,
        to_vec2 => Vec2,
        to_vec3 => Vec3,
        to_vec4 => Vec4,
        to_ivec2 => Ivec2,
        to_ivec3 => Ivec3,
        to_ivec4 => Ivec4,
        to_uvec2 => Uvec2,
        to_uvec3 => Uvec3,
        to_uvec4 => Uvec4,
        to_bvec2 => Bvec2,
        to_bvec3 => Bvec3,
        to_bvec4 => Bvec4,
        to_mat2 => Mat2,
        to_mat3 => Mat3,
        to_mat4 => Mat4,
        to_color => Vec3,
    );

    fn to_var(&self, builder: &mut Builder) -> Result<Node> {
        builder.to_var(self.handle(), None)
    }

    fn to_var_named(&self, builder: &mut Builder, name: &str) -> Result<Node> {
        builder.to_var(self.handle(), Some(name))
    }

    fn to_const(&self, builder: &mut Builder) -> Result<Node> {
        builder.to_const(self.handle(), None)
    }

    fn to_const_named(&self, builder: &mut Builder, name: &str) -> Result<Node> {
        builder.to_const(self.handle(), Some(name))
    }

    fn assign(&self, builder: &mut Builder, value: impl Into<Child>) -> Result<Node> {
        builder.assign(&self.handle(), value)
    }

    /// Indexed access; on a storage buffer this is a gather.
    fn element(&self, index: impl Into<Child>) -> Node {
        let base = self.handle();
        let index = index.into();
        if matches!(base.kind(), NodeKind::Storage { .. }) {
            return Node::new(NodeKind::Gather {
                storage: base,
                index,
            });
        }
        Node::new(NodeKind::Element { base, index })
    }

    fn member(&self, key: &str) -> Node {
        Node::new(NodeKind::Member {
            base: self.handle(),
            key: key.to_string(),
        })
    }

    /// `condition ? self : other`
    fn select(&self, other: impl Into<Child>, condition: impl Into<Child>) -> Node {
        Node::new(NodeKind::Ternary {
            yes: Child::Node(self.handle()),
            no: other.into(),
            cond: condition.into(),
        })
    }
}

impl NodeOps for Node {
    fn handle(&self) -> Node {
        self.clone()
    }
}

macro_rules! std_binary {
    ($($trait:ident :: $method:ident => $op:ident),* $(,)?) => {
        $(
            impl<T: Into<Child>> std::ops::$trait<T> for Node {
                type Output = Node;

                fn $method(self, rhs: T) -> Node {
                    binary(self, Operator::$op, rhs.into())
                }
            }

            impl<T: Into<Child>> std::ops::$trait<T> for &Node {
                type Output = Node;

                fn $method(self, rhs: T) -> Node {
                    binary(self.clone(), Operator::$op, rhs.into())
                }
            }
        )*
    };
}

std_binary!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Mod,
);

impl std::ops::Neg for Node {
    type Output = Node;

    fn neg(self) -> Node {
        NodeOps::negate(&self)
    }
}

impl std::ops::Neg for &Node {
    type Output = Node;

    fn neg(self) -> Node {
        NodeOps::negate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: &str) -> Node {
        Node::new(NodeKind::Variable {
            id: id.to_string(),
            source: super::super::VarSource::Declared(Type::Vec3),
            mutable: true,
        })
    }

    #[test]
    fn accessor_parser_routes_keys() {
        let v = var("v");
        assert_eq!(v.get("xy").kind_name(), "swizzle");
        assert_eq!(v.get("2").kind_name(), "element");
        assert_eq!(v.get("albedo").kind_name(), "member");
    }

    #[test]
    fn std_operators_build_operator_nodes() {
        let v = var("v");
        let sum = &v + 1.0;
        match sum.kind() {
            NodeKind::Operator { op, rhs, .. } => {
                assert_eq!(*op, Operator::Add);
                assert!(matches!(rhs, Some(Child::Float(f)) if *f == 1.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!((-v).kind_name(), "function");
    }

    #[test]
    fn element_on_storage_is_gather() {
        let s = Node::new(NodeKind::Storage {
            id: "particles".into(),
            value: Child::Array(vec![0.0; 4]),
        });
        assert_eq!(s.element(3).kind_name(), "gather");
        assert_eq!(var("v").element(0).kind_name(), "element");
    }

    #[test]
    fn select_keeps_receiver_as_true_branch() {
        let a = var("a");
        let t = a.select(0.0, true);
        match t.kind() {
            NodeKind::Ternary { yes, no, cond } => {
                assert_eq!(yes.as_node(), Some(&a));
                assert!(matches!(no, Child::Float(_)));
                assert!(matches!(cond, Child::Bool(true)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
