use proptest::prelude::*;

use node_forge_shader::codegen::code;
use node_forge_shader::infer::infer_node;
use node_forge_shader::node::ScalarKind;
use node_forge_shader::prelude::*;

fn vector_type() -> impl Strategy<Value = Type> {
    prop::sample::select(vec![
        Type::Vec2,
        Type::Vec3,
        Type::Vec4,
        Type::Ivec2,
        Type::Ivec3,
        Type::Ivec4,
        Type::Uvec2,
        Type::Uvec3,
        Type::Uvec4,
    ])
}

fn dialect() -> impl Strategy<Value = Dialect> {
    prop::sample::select(vec![Dialect::Glsl, Dialect::Wgsl])
}

fn arithmetic(lhs: &Node, rhs: &Node, op: usize) -> Node {
    match op {
        0 => lhs.add(rhs),
        1 => lhs.sub(rhs),
        2 => lhs.mul(rhs),
        _ => lhs.div(rhs),
    }
}

fn comparison(lhs: &Node, rhs: &Node, op: usize) -> Node {
    match op {
        0 => lhs.equal(rhs),
        1 => lhs.not_equal(rhs),
        2 => lhs.less_than(rhs),
        3 => lhs.greater_than_equal(rhs),
        4 => lhs.and(rhs),
        _ => lhs.or(rhs),
    }
}

proptest! {
    #[test]
    fn same_type_arithmetic_keeps_the_operand_type(
        ty in vector_type(),
        op in 0usize..4,
        dialect in dialect(),
    ) {
        let mut ctx = NodeContext::new(dialect);
        let expr = arithmetic(&variable("a", ty.clone()), &variable("b", ty.clone()), op);
        prop_assert_eq!(infer_node(&expr, &mut ctx), ty);
        prop_assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn comparisons_and_logic_are_bool(ty in vector_type(), op in 0usize..6) {
        let mut ctx = NodeContext::glsl();
        let expr = comparison(&variable("a", ty.clone()), &variable("b", ty), op);
        prop_assert_eq!(infer_node(&expr, &mut ctx), Type::Bool);
    }

    #[test]
    fn swizzle_length_sets_the_width(
        kind in prop::sample::select(vec![ScalarKind::Float, ScalarKind::Int, ScalarKind::Uint, ScalarKind::Bool]),
        letters in "[xyzw]{1,4}",
    ) {
        let base = variable("v", Type::vector(kind, 4));
        let mut ctx = NodeContext::wgsl();
        let ty = infer_node(&base.swizzle(&letters), &mut ctx);
        prop_assert_eq!(ty.element(), Some(kind));
        prop_assert_eq!(ty.components(), letters.len());
    }

    #[test]
    fn number_literals_are_dotted(v in any::<f64>().prop_filter("finite", |v| v.is_finite()), dialect in dialect()) {
        let text = code(&Child::Float(v), &mut NodeContext::new(dialect)).unwrap();
        prop_assert!(text.contains('.') || text.contains('e'), "{}", text);
        prop_assert_eq!(text.parse::<f64>().unwrap(), v);
    }

    #[test]
    fn uniforms_are_declared_once(id in "u[A-Z][a-zA-Z0-9]{0,8}", value in -100.0f64..100.0, dialect in dialect()) {
        let u = uniform(value, &id);
        let mut ctx = NodeContext::new(dialect);
        let mut b = Builder::new();
        let root = b.scope(|_| Ok(Some(vec4((u.add(&u), 0.0, 0.0, 1.0))))).unwrap();
        let text = fragment(&root, &mut ctx).unwrap();
        prop_assert_eq!(ctx.headers().len(), 1);
        let reference = format!("({id} + {id})");
        prop_assert!(text.contains(&reference), "{}", text);
        // One declaration plus the two references.
        prop_assert_eq!(text.matches(id.as_str()).count(), 3);
    }

    #[test]
    fn independent_builds_are_byte_identical(
        ops in prop::collection::vec(0usize..4, 1..12),
        dialect in dialect(),
    ) {
        let render = || {
            let mut b = Builder::new();
            let root = b
                .scope(|b| {
                    let mut acc = b.to_var(vec3(1.0), None)?;
                    for (i, op) in ops.iter().enumerate() {
                        let rhs = vec3(i as f64 + 0.5);
                        acc = b.to_var(arithmetic(&acc, &rhs, *op), None)?;
                    }
                    Ok(Some(vec4((acc, 1.0))))
                })
                .unwrap();
            fragment(&root, &mut NodeContext::new(dialect)).unwrap()
        };
        prop_assert_eq!(render(), render());
    }
}
