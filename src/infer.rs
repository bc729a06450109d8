//! Structural type inference, memoised per node identity in the [`NodeContext`].

use crate::codegen::NodeContext;
use crate::node::consts::{ReturnRule, builtin_type, is_swizzle};
use crate::node::{Child, LayoutType, Node, NodeKind, Operator, Type, VarSource};
use crate::utils::stride;

/// Type of a child slot.
pub fn infer(child: &Child, ctx: &mut NodeContext) -> Type {
    match child {
        Child::Node(node) => infer_node(node, ctx),
        Child::Bool(_) => Type::Bool,
        Child::Float(_) => Type::Float,
        Child::Text(_) => Type::Texture,
        Child::Array(values) => Type::from_count(values.len()).unwrap_or(Type::Float),
    }
}

/// Type of a node; the first answer for a node is cached for the rest of the build.
pub fn infer_node(node: &Node, ctx: &mut NodeContext) -> Type {
    if let Some((_, ty)) = ctx.infers.get(&node.key()) {
        return ty.clone();
    }
    let ty = infer_impl(node, ctx);
    // The stored handle keeps the allocation, and with it the key, alive.
    ctx.infers.insert(node.key(), (node.clone(), ty.clone()));
    ty
}

fn infer_impl(node: &Node, ctx: &mut NodeContext) -> Type {
    match node.kind() {
        NodeKind::Uniform { value, .. }
        | NodeKind::Constant { value, .. }
        | NodeKind::Varying { value, .. }
        | NodeKind::Storage { value, .. } => infer(value, ctx),
        NodeKind::Attribute { id, value } => infer_attribute(id, value, ctx.config.vertex_count, ctx),
        NodeKind::Instance { id, value } => {
            infer_attribute(id, value, ctx.config.instance_count, ctx)
        }
        NodeKind::Variable { source, .. } => match source {
            VarSource::Expr(value) => infer(value, ctx),
            VarSource::Declared(ty) => ty.clone(),
            VarSource::LoopIndex(bound) => match infer(bound, ctx) {
                ty @ (Type::Float | Type::Vec2 | Type::Vec3) => ty,
                _ => Type::Int,
            },
            VarSource::Struct(layout) => Type::Struct(layout.id.clone()),
        },
        NodeKind::Builtin { id } => builtin_type(id).unwrap_or(Type::Float),
        NodeKind::Swizzle { base, letters } => {
            let kind = infer_node(base, ctx).element().unwrap_or(crate::node::ScalarKind::Float);
            Type::vector(kind, letters.len())
        }
        NodeKind::Operator { op, lhs, rhs } => {
            if op.is_comparison() || op.is_logical() {
                return Type::Bool;
            }
            let left = infer(lhs, ctx);
            match rhs {
                Some(rhs) if !op.is_assign() => {
                    let right = infer(rhs, ctx);
                    promote(left, right, *op, ctx)
                }
                _ => left,
            }
        }
        NodeKind::Function { func, args } => match func.return_rule() {
            ReturnRule::Fixed(ty) => ty,
            ReturnRule::FirstArg => args.first().map(|a| infer(a, ctx)).unwrap_or(Type::Float),
            ReturnRule::HighestArg => {
                let mut best = Type::Float;
                for (i, arg) in args.iter().enumerate() {
                    let ty = infer(arg, ctx);
                    if i == 0 || ty.priority() > best.priority() {
                        best = ty;
                    }
                }
                best
            }
        },
        NodeKind::Conversion { ty, .. } => ty.clone(),
        NodeKind::Ternary { yes, no, .. } => {
            let yes = infer(yes, ctx);
            let no = infer(no, ctx);
            promote(yes, no, Operator::Add, ctx)
        }
        NodeKind::Member { base, key } => infer_member(base, key, ctx),
        NodeKind::Element { base, .. } => {
            let ty = infer_node(base, ctx);
            if let Some(column) = ty.column() {
                column
            } else if ty.is_vector() {
                Type::vector(ty.element().unwrap_or(crate::node::ScalarKind::Float), 1)
            } else {
                ty
            }
        }
        NodeKind::Gather { storage, .. } => infer_node(storage, ctx),
        NodeKind::Define {
            layout, returns, ..
        } => {
            if let Some(layout) = layout {
                if let LayoutType::Is(ty) = &layout.ty {
                    return ty.clone();
                }
            }
            match returns.first() {
                Some(first) => infer(first, ctx),
                None => Type::Void,
            }
        }
        NodeKind::Struct { layout, .. } => Type::Struct(layout.id.clone()),
        NodeKind::Scatter { .. }
        | NodeKind::Scope { .. }
        | NodeKind::Expr { .. }
        | NodeKind::Assign { .. }
        | NodeKind::Declare { .. }
        | NodeKind::Return { .. }
        | NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Loop { .. }
        | NodeKind::If { .. }
        | NodeKind::Switch { .. } => Type::Void,
    }
}

/// Raw per-vertex data is typed by its stride over the configured count.
fn infer_attribute(id: &str, value: &Child, count: Option<u32>, ctx: &mut NodeContext) -> Type {
    let (Child::Array(values), Some(count)) = (value, count) else {
        return infer(value, ctx);
    };
    let stride = stride(values.len(), count);
    match Type::from_count(stride) {
        Some(ty) => ty,
        None => {
            ctx.warn(format!(
                "attribute {id}: stride {stride} ({} values over {count}) is not one of 1, 2, 3, 4, 9, 16",
                values.len()
            ));
            Type::Float
        }
    }
}

fn infer_member(base: &Node, key: &str, ctx: &mut NodeContext) -> Type {
    if is_swizzle(key) {
        let kind = infer_node(base, ctx).element().unwrap_or(crate::node::ScalarKind::Float);
        return Type::vector(kind, key.len());
    }
    let layout = match base.kind() {
        NodeKind::Variable {
            source: VarSource::Struct(layout),
            ..
        } => Some(layout.clone()),
        _ => match infer_node(base, ctx) {
            Type::Struct(name) => ctx.struct_fields.get(&name).cloned(),
            _ => None,
        },
    };
    if let Some(ty) = layout.as_ref().and_then(|layout| layout.field(key)) {
        return ty.clone();
    }
    ctx.warn(format!("cannot resolve member '{key}'; assuming float"));
    Type::Float
}

/// Result type of a binary operator. Disagreeing operands produce a warning and the
/// higher-priority type.
pub fn promote(left: Type, right: Type, op: Operator, ctx: &mut NodeContext) -> Type {
    if left == right {
        return left;
    }
    let same_element = left.element().is_some() && left.element() == right.element();
    if same_element && left.is_scalar() && (right.is_vector() || right.is_matrix()) {
        return right;
    }
    if same_element && right.is_scalar() && (left.is_vector() || left.is_matrix()) {
        return left;
    }
    if op == Operator::Mul {
        if left.column().as_ref() == Some(&right) {
            return right;
        }
        if right.column().as_ref() == Some(&left) {
            return left;
        }
    }
    ctx.warn(format!(
        "operator '{}' between {left} and {right}; using the higher-priority type",
        op.symbol()
    ));
    if right.priority() > left.priority() {
        right
    } else {
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::node::factory::*;
    use crate::node::ops::NodeOps;
    use crate::codegen::Dialect;

    fn ctx() -> NodeContext {
        NodeContext::glsl()
    }

    #[test]
    fn raw_values() {
        let mut c = ctx();
        assert_eq!(infer(&Child::Bool(true), &mut c), Type::Bool);
        assert_eq!(infer(&Child::Float(1.0), &mut c), Type::Float);
        assert_eq!(infer(&Child::Text("img.png".into()), &mut c), Type::Texture);
        assert_eq!(infer(&Child::Array(vec![0.0; 9]), &mut c), Type::Mat3);
        assert_eq!(infer(&Child::Array(vec![0.0; 5]), &mut c), Type::Float);
    }

    #[test]
    fn scalar_broadcasts_to_vector() {
        let mut c = ctx();
        let v = vec3(1.0).mul(2.0);
        assert_eq!(infer_node(&v, &mut c), Type::Vec3);
        assert!(c.warnings().is_empty());
    }

    #[test]
    fn matrix_times_vector_is_vector() {
        let mut c = ctx();
        let m = mat4(());
        let v = vec4(1.0);
        assert_eq!(infer_node(&m.mul(&v), &mut c), Type::Vec4);
        assert_eq!(infer_node(&v.mul(&m), &mut c), Type::Vec4);
        assert!(c.warnings().is_empty());
    }

    #[test]
    fn mismatch_warns_and_picks_higher_priority() {
        let mut c = ctx();
        let t = ivec2(1).add(vec3(1.0));
        assert_eq!(infer_node(&t, &mut c), Type::Vec3);
        assert_eq!(c.warnings().len(), 1);
    }

    #[test]
    fn comparisons_and_logic_are_bool() {
        let mut c = ctx();
        let a = vec3(1.0);
        assert_eq!(infer_node(&a.less_than(2.0), &mut c), Type::Bool);
        assert_eq!(infer_node(&a.and(true), &mut c), Type::Bool);
        assert_eq!(infer_node(&a.not(), &mut c), Type::Bool);
        assert_eq!(infer_node(&ivec2(1).bit_not(), &mut c), Type::Ivec2);
    }

    #[test]
    fn swizzles_keep_element_kind() {
        let mut c = ctx();
        assert_eq!(infer_node(&ivec4(1).xyz(), &mut c), Type::Ivec3);
        assert_eq!(infer_node(&uvec3(1u32).x(), &mut c), Type::Uint);
        assert_eq!(infer_node(&vec4(1.0).get("rg"), &mut c), Type::Vec2);
    }

    #[test]
    fn function_return_rules() {
        let mut c = ctx();
        let v = vec3(1.0);
        assert_eq!(infer_node(&v.length(), &mut c), Type::Float);
        assert_eq!(infer_node(&v.cross(vec3(0.0)), &mut c), Type::Vec3);
        assert_eq!(infer_node(&v.normalize(), &mut c), Type::Vec3);
        assert_eq!(infer_node(&mix(1.0, vec4(0.0), 0.5), &mut c), Type::Vec4);
        assert_eq!(infer_node(&texture(uniform("a.png", "tex"), vec2(0.0)), &mut c), Type::Vec4);
    }

    #[test]
    fn attribute_stride_comes_from_vertex_count() {
        let config = BuildConfig {
            vertex_count: Some(3),
            ..BuildConfig::default()
        };
        let mut c = NodeContext::with_config(Dialect::Wgsl, config);
        let pos = attribute(vec![0.0f32; 9], "pos");
        assert_eq!(infer_node(&pos, &mut c), Type::Vec3);
        let odd = attribute(vec![0.0f32; 15], "odd");
        assert_eq!(infer_node(&odd, &mut c), Type::Float);
        assert_eq!(c.warnings().len(), 1);
    }

    #[test]
    fn element_access() {
        let mut c = ctx();
        assert_eq!(infer_node(&mat3(()).element(0), &mut c), Type::Vec3);
        assert_eq!(infer_node(&ivec3(0).element(1), &mut c), Type::Int);
    }

    #[test]
    fn results_are_memoised_per_node() {
        let mut c = ctx();
        let t = ivec2(1).add(vec3(1.0));
        infer_node(&t, &mut c);
        infer_node(&t, &mut c);
        assert_eq!(c.warnings().len(), 1);
    }
}
