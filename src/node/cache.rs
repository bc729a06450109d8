//! Process-wide interning of common literal nodes.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::consts::{CACHE_BOOLS, CACHE_FLOATS, CACHE_INTS};
use super::types::Type;
use super::{Child, Node, NodeKind};

struct ConstantCache {
    bools: HashMap<bool, Node>,
    ints: HashMap<i64, Node>,
    floats: HashMap<u64, Node>,
}

fn literal(ty: Type, value: Child) -> Node {
    Node::new(NodeKind::Conversion {
        ty,
        args: vec![value],
    })
}

fn cache() -> &'static ConstantCache {
    static CACHE: OnceLock<ConstantCache> = OnceLock::new();
    CACHE.get_or_init(|| ConstantCache {
        bools: CACHE_BOOLS
            .iter()
            .map(|&b| (b, literal(Type::Bool, Child::Bool(b))))
            .collect(),
        ints: CACHE_INTS
            .iter()
            .map(|&i| (i, literal(Type::Int, Child::Float(i as f64))))
            .collect(),
        floats: CACHE_FLOATS
            .iter()
            .map(|&f| (f.to_bits(), literal(Type::Float, Child::Float(f))))
            .collect(),
    })
}

pub fn cached_bool(value: bool) -> Node {
    match cache().bools.get(&value) {
        Some(node) => node.clone(),
        None => literal(Type::Bool, Child::Bool(value)),
    }
}

pub fn cached_int(value: i64) -> Node {
    match cache().ints.get(&value) {
        Some(node) => node.clone(),
        None => literal(Type::Int, Child::Float(value as f64)),
    }
}

pub fn cached_float(value: f64) -> Node {
    // -0.0 and 0.0 differ in bits; only the seeded bit patterns hit.
    match cache().floats.get(&value.to_bits()) {
        Some(node) => node.clone(),
        None => literal(Type::Float, Child::Float(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_literals_are_shared() {
        assert_eq!(cached_float(1.0), cached_float(1.0));
        assert_eq!(cached_float(0.5), cached_float(0.5));
        assert_eq!(cached_int(3), cached_int(3));
        assert_eq!(cached_bool(true), cached_bool(true));
    }

    #[test]
    fn other_literals_allocate() {
        assert_ne!(cached_float(0.25), cached_float(0.25));
        assert_ne!(cached_int(42), cached_int(42));
        assert_ne!(cached_float(-0.0), cached_float(0.0));
    }
}
