//! Graph node representation.
//!
//! A [`Node`] is a cheap-to-clone handle to immutable node data. Identity (the shared
//! allocation) is what inference and header deduplication key on, so cloning a handle and
//! reusing it in several places refers to the *same* node.

pub mod cache;
pub mod consts;
pub mod factory;
pub mod ops;
pub mod types;
pub mod value;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use consts::{MathFunction, Operator};
pub use types::{ScalarKind, Type};
pub use value::{Listener, ResourceSink, UniformValue};

/// A child slot: another node or a raw literal.
#[derive(Clone, Debug)]
pub enum Child {
    Node(Node),
    Float(f64),
    Bool(bool),
    /// Identifier-like text, also used as a texture source.
    Text(String),
    /// Raw uniform/attribute data.
    Array(Vec<f64>),
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<Node> for Child {
    fn from(n: Node) -> Self {
        Child::Node(n)
    }
}

impl From<&Node> for Child {
    fn from(n: &Node) -> Self {
        Child::Node(n.clone())
    }
}

impl From<f64> for Child {
    fn from(v: f64) -> Self {
        Child::Float(v)
    }
}

impl From<f32> for Child {
    /// Goes through the shortest decimal form so `0.1f32` stays `0.1`.
    fn from(v: f32) -> Self {
        Child::Float(v.to_string().parse().unwrap_or(v as f64))
    }
}

impl From<i32> for Child {
    fn from(v: i32) -> Self {
        Child::Float(v as f64)
    }
}

impl From<u32> for Child {
    fn from(v: u32) -> Self {
        Child::Float(v as f64)
    }
}

impl From<bool> for Child {
    fn from(v: bool) -> Self {
        Child::Bool(v)
    }
}

impl From<&str> for Child {
    fn from(v: &str) -> Self {
        Child::Text(v.to_string())
    }
}

impl From<String> for Child {
    fn from(v: String) -> Self {
        Child::Text(v)
    }
}

impl<const N: usize> From<[f32; N]> for Child {
    fn from(v: [f32; N]) -> Self {
        Child::Array(v.iter().map(|x| Child::from(*x).as_float()).collect())
    }
}

impl<const N: usize> From<[f64; N]> for Child {
    fn from(v: [f64; N]) -> Self {
        Child::Array(v.to_vec())
    }
}

impl From<Vec<f32>> for Child {
    fn from(v: Vec<f32>) -> Self {
        Child::Array(v.into_iter().map(|x| Child::from(x).as_float()).collect())
    }
}

impl Child {
    fn as_float(&self) -> f64 {
        match self {
            Child::Float(f) => *f,
            _ => 0.0,
        }
    }
}

/// Where a variable reference gets its type from.
#[derive(Clone, Debug)]
pub enum VarSource {
    /// The expression it was initialised with.
    Expr(Child),
    /// An explicit type (function parameters with a declared layout type).
    Declared(Type),
    /// A loop counter; typed after the loop bound.
    LoopIndex(Child),
    /// A struct instance.
    Struct(Arc<StructLayout>),
}

/// Field list of a user struct.
#[derive(Clone, Debug, PartialEq)]
pub struct StructLayout {
    pub id: String,
    pub fields: Vec<(String, Type)>,
    /// Layouts of struct-typed fields that were declared before this struct.
    pub nested: Vec<Arc<StructLayout>>,
}

impl StructLayout {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }
}

/// Parameter or return type of a function layout; `auto` defers to inference.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LayoutType {
    #[default]
    Auto,
    Is(Type),
}

impl Serialize for LayoutType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LayoutType::Auto => serializer.serialize_str("auto"),
            LayoutType::Is(t) => t.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for LayoutType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        if name == "auto" {
            return Ok(LayoutType::Auto);
        }
        Ok(LayoutType::Is(name.parse().unwrap_or(Type::Struct(name))))
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FnInput {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: LayoutType,
}

/// Optional signature of a `Fn` definition.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct FnLayout {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub ty: LayoutType,
    #[serde(default)]
    pub inputs: Vec<FnInput>,
}

/// The tagged union of node kinds.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Uniform { id: String, value: Child },
    Attribute { id: String, value: Child },
    Instance { id: String, value: Child },
    Constant { id: String, value: Child },
    Storage { id: String, value: Child },
    Varying { id: String, value: Child },
    Variable { id: String, source: VarSource, mutable: bool },
    Builtin { id: String },
    Swizzle { base: Node, letters: String },
    Operator { op: Operator, lhs: Child, rhs: Option<Child> },
    Function { func: MathFunction, args: Vec<Child> },
    Conversion { ty: Type, args: Vec<Child> },
    /// `cond ? yes : no`
    Ternary { yes: Child, no: Child, cond: Child },
    Member { base: Node, key: String },
    Element { base: Node, index: Child },
    Gather { storage: Node, index: Child },
    Scatter { target: Node, value: Child },
    Scope { statements: Vec<Node> },
    /// Expression evaluated for its side effects, e.g. a call to a void function.
    Expr { value: Node },
    Assign { target: Node, value: Child },
    Declare { var: Node, value: Child },
    Return { value: Option<Child> },
    Break,
    Continue,
    Loop { id: String, bound: Child, body: Node },
    /// Flattened `if / else if` chain plus an optional `else` scope.
    If { branches: Vec<(Child, Node)>, otherwise: Option<Node> },
    Switch { value: Child, cases: Vec<(Vec<Child>, Node)>, default: Option<Node> },
    Define {
        id: String,
        layout: Option<FnLayout>,
        params: Vec<Node>,
        args: Vec<Child>,
        body: Node,
        returns: Vec<Child>,
    },
    Struct {
        layout: Arc<StructLayout>,
        instance: Node,
        initial: Option<Vec<(String, Child)>>,
    },
}

struct NodeData {
    kind: NodeKind,
    /// Listeners, optionally keyed so the same owner registers at most once.
    listeners: Mutex<Vec<(Option<usize>, Listener)>>,
}

#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node(Arc::new(NodeData {
            kind,
            listeners: Mutex::new(Vec::new()),
        }))
    }

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind() {
            NodeKind::Uniform { .. } => "uniform",
            NodeKind::Attribute { .. } => "attribute",
            NodeKind::Instance { .. } => "instance",
            NodeKind::Constant { .. } => "constant",
            NodeKind::Storage { .. } => "storage",
            NodeKind::Varying { .. } => "varying",
            NodeKind::Variable { .. } => "variable",
            NodeKind::Builtin { .. } => "builtin",
            NodeKind::Swizzle { .. } => "swizzle",
            NodeKind::Operator { .. } => "operator",
            NodeKind::Function { .. } => "function",
            NodeKind::Conversion { .. } => "conversion",
            NodeKind::Ternary { .. } => "ternary",
            NodeKind::Member { .. } => "member",
            NodeKind::Element { .. } => "element",
            NodeKind::Gather { .. } => "gather",
            NodeKind::Scatter { .. } => "scatter",
            NodeKind::Scope { .. } => "scope",
            NodeKind::Expr { .. } => "expr",
            NodeKind::Assign { .. } => "assign",
            NodeKind::Declare { .. } => "declare",
            NodeKind::Return { .. } => "return",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Loop { .. } => "loop",
            NodeKind::If { .. } => "if",
            NodeKind::Switch { .. } => "switch",
            NodeKind::Define { .. } => "define",
            NodeKind::Struct { .. } => "struct",
        }
    }

    /// Stable name of id-bearing nodes.
    pub fn id(&self) -> Option<&str> {
        match self.kind() {
            NodeKind::Uniform { id, .. }
            | NodeKind::Attribute { id, .. }
            | NodeKind::Instance { id, .. }
            | NodeKind::Constant { id, .. }
            | NodeKind::Storage { id, .. }
            | NodeKind::Varying { id, .. }
            | NodeKind::Variable { id, .. }
            | NodeKind::Builtin { id }
            | NodeKind::Loop { id, .. }
            | NodeKind::Define { id, .. } => Some(id),
            NodeKind::Struct { layout, .. } => Some(&layout.id),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity key for per-node memoisation.
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(Option<usize>, Listener)>> {
        self.0
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Notify every listener of a new value.
    pub fn set_value(&self, value: impl Into<UniformValue>) {
        let value = value.into();
        let listeners: Vec<Listener> = self
            .listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    pub fn on_change<F>(&self, listener: F) -> &Self
    where
        F: Fn(&UniformValue) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(listener));
        self
    }

    pub(crate) fn add_listener(&self, listener: Listener) {
        self.listeners().push((None, listener));
    }

    /// Register `listener` unless one with the same `key` is already present. Returns
    /// whether it was added.
    pub(crate) fn add_keyed_listener(&self, key: usize, listener: Listener) -> bool {
        let mut listeners = self.listeners();
        if listeners.iter().any(|(k, _)| *k == Some(key)) {
            return false;
        }
        listeners.push((Some(key), listener));
        true
    }

    /// Receive every later value over a channel.
    pub fn subscribe(&self) -> crossbeam_channel::Receiver<UniformValue> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.add_listener(Arc::new(move |value: &UniformValue| {
            let _ = tx.send(value.clone());
        }));
        rx
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(id: &str, v: impl Into<Child>) -> Node {
        Node::new(NodeKind::Uniform {
            id: id.to_string(),
            value: v.into(),
        })
    }

    #[test]
    fn identity_is_per_allocation() {
        let a = uniform("a", 1.0);
        let b = uniform("a", 1.0);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn f32_literals_keep_their_decimal_form() {
        match Child::from(0.1f32) {
            Child::Float(v) => assert_eq!(v, 0.1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn set_value_notifies_listeners_and_subscribers() {
        let u = uniform("iTime", 0.0);
        let rx = u.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        u.on_change(move |v| sink.lock().unwrap().push(v.clone()));
        u.set_value(2.5f32);
        assert_eq!(rx.try_recv().unwrap(), UniformValue::Float(2.5));
        assert_eq!(seen.lock().unwrap().as_slice(), &[UniformValue::Float(2.5)]);
        assert_eq!(u.listener_count(), 2);
    }

    #[test]
    fn keyed_listeners_register_once() {
        let u = uniform("uGain", 1.0);
        assert!(u.add_keyed_listener(7, Arc::new(|_| {})));
        assert!(!u.add_keyed_listener(7, Arc::new(|_| {})));
        assert!(u.add_keyed_listener(8, Arc::new(|_| {})));
        assert_eq!(u.listener_count(), 2);
    }

    #[test]
    fn layout_deserializes_auto_and_struct_types() {
        let layout: FnLayout = serde_json::from_str(
            r#"{ "name": "shade", "type": "vec4", "inputs": [
                { "name": "p", "type": "auto" },
                { "name": "light", "type": "Light" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(layout.name.as_deref(), Some("shade"));
        assert_eq!(layout.ty, LayoutType::Is(Type::Vec4));
        assert_eq!(layout.inputs[0].ty, LayoutType::Auto);
        assert_eq!(layout.inputs[1].ty, LayoutType::Is(Type::Struct("Light".into())));
    }
}
