//! The statement builder: scope stack, control flow, functions and variables.
//!
//! A [`Builder`] is one build session. Statements are appended to the innermost open scope;
//! block bodies are closures that receive the builder back, so nesting in Rust mirrors
//! nesting in the emitted program.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};

use crate::error::NodeError;
use crate::node::factory::IntoArgs;
use crate::node::{
    Child, FnLayout, LayoutType, Node, NodeKind, Operator, StructLayout, Type, VarSource,
};

/// Body of a block that may end with a returned expression.
pub type FnBody = Arc<dyn Fn(&mut Builder, &[Node]) -> Result<Option<Node>> + Send + Sync>;

#[derive(Default)]
pub struct Builder {
    scopes: Vec<Vec<Node>>,
    /// Return values of the functions currently being built, innermost last.
    defines: Vec<Vec<Child>>,
    /// Struct layouts declared in this session, by id.
    structs: HashMap<String, Arc<StructLayout>>,
    next_id: usize,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh `x{n}` id, unique within this session.
    pub fn next_id(&mut self) -> String {
        let id = format!("x{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn id_or_next(&mut self, name: Option<&str>) -> String {
        match name {
            Some(name) => name.to_string(),
            None => self.next_id(),
        }
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn push(&mut self, node: Node, what: &'static str) -> Result<()> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.push(node);
                Ok(())
            }
            None => Err(NodeError::NoActiveScope(what).into()),
        }
    }

    fn require_scope(&self, what: &'static str) -> Result<()> {
        if self.scopes.is_empty() {
            return Err(NodeError::NoActiveScope(what).into());
        }
        Ok(())
    }

    /// Run `body` inside a new scope and return the closed scope node. A returned
    /// expression becomes a trailing `return`.
    fn scoped<F>(&mut self, body: F) -> Result<Node>
    where
        F: FnOnce(&mut Builder) -> Result<Option<Node>>,
    {
        self.scopes.push(Vec::new());
        let result = body(self).and_then(|value| match value {
            Some(value) => self.return_(value),
            None => Ok(()),
        });
        let statements = self.scopes.pop().unwrap_or_default();
        result?;
        Ok(Node::new(NodeKind::Scope { statements }))
    }

    /// Open a root scope, typically a whole stage body.
    pub fn scope<F>(&mut self, body: F) -> Result<Node>
    where
        F: FnOnce(&mut Builder) -> Result<Option<Node>>,
    {
        self.scoped(body)
    }

    pub fn if_<F>(&mut self, cond: impl Into<Child>, body: F) -> Result<IfChain<'_>>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        self.require_scope("if")?;
        let scope = self.scoped(|b| body(b).map(|_| None))?;
        Ok(IfChain {
            builder: self,
            branches: vec![(cond.into(), scope)],
            otherwise: None,
            abandoned: false,
        })
    }

    /// `for` loop over `0..bound`; the body receives the index variable.
    pub fn loop_<F>(&mut self, bound: impl Into<Child>, body: F) -> Result<Node>
    where
        F: FnOnce(&mut Builder, Node) -> Result<()>,
    {
        self.require_scope("loop")?;
        let bound = bound.into();
        let id = self.next_id();
        let index = Node::new(NodeKind::Variable {
            id: id.clone(),
            source: VarSource::LoopIndex(bound.clone()),
            mutable: true,
        });
        let body = self.scoped(|b| body(b, index).map(|_| None))?;
        let node = Node::new(NodeKind::Loop { id, bound, body });
        self.push(node.clone(), "loop")?;
        Ok(node)
    }

    pub fn switch(&mut self, value: impl Into<Child>) -> Result<SwitchChain<'_>> {
        self.require_scope("switch")?;
        Ok(SwitchChain {
            builder: self,
            value: value.into(),
            cases: Vec::new(),
            default: None,
            abandoned: false,
        })
    }

    /// Function with a session-generated id.
    pub fn func<F>(&mut self, body: F) -> FnDef
    where
        F: Fn(&mut Builder, &[Node]) -> Result<Option<Node>> + Send + Sync + 'static,
    {
        let id = self.next_id();
        FnDef::new(id, Arc::new(body))
    }

    pub fn func_named<F>(&mut self, name: &str, body: F) -> FnDef
    where
        F: Fn(&mut Builder, &[Node]) -> Result<Option<Node>> + Send + Sync + 'static,
    {
        FnDef::new(name.to_string(), Arc::new(body))
    }

    fn declare(&mut self, value: Child, name: Option<&str>, mutable: bool) -> Result<Node> {
        let what = if mutable { "toVar" } else { "toConst" };
        self.require_scope(what)?;
        let id = self.id_or_next(name);
        let var = Node::new(NodeKind::Variable {
            id,
            source: VarSource::Expr(value.clone()),
            mutable,
        });
        self.push(
            Node::new(NodeKind::Declare {
                var: var.clone(),
                value,
            }),
            what,
        )?;
        Ok(var)
    }

    /// Declare a mutable local initialised with `value`.
    pub fn to_var(&mut self, value: impl Into<Child>, name: Option<&str>) -> Result<Node> {
        self.declare(value.into(), name, true)
    }

    pub fn to_const(&mut self, value: impl Into<Child>, name: Option<&str>) -> Result<Node> {
        self.declare(value.into(), name, false)
    }

    /// `target = value;`. Storage elements become scatters.
    pub fn assign(&mut self, target: &Node, value: impl Into<Child>) -> Result<Node> {
        self.require_scope("assign")?;
        let value = value.into();
        let statement = match target.kind() {
            NodeKind::Gather { .. } => NodeKind::Scatter {
                target: target.clone(),
                value,
            },
            NodeKind::Variable { mutable: true, .. }
            | NodeKind::Member { .. }
            | NodeKind::Element { .. }
            | NodeKind::Swizzle { .. }
            | NodeKind::Builtin { .. } => NodeKind::Assign {
                target: target.clone(),
                value,
            },
            _ => return Err(NodeError::NotAssignable(target.kind_name()).into()),
        };
        self.push(Node::new(statement), "assign")?;
        Ok(target.clone())
    }

    /// `target op= value;`
    pub fn op_assign(&mut self, target: &Node, op: Operator, value: impl Into<Child>) -> Result<()> {
        if !op.is_assign() {
            bail!("'{}' is not a compound assignment operator", op.symbol());
        }
        self.require_scope("assign")?;
        if matches!(
            target.kind(),
            NodeKind::Variable { mutable: false, .. }
                | NodeKind::Uniform { .. }
                | NodeKind::Constant { .. }
                | NodeKind::Attribute { .. }
                | NodeKind::Instance { .. }
                | NodeKind::Gather { .. }
        ) {
            return Err(NodeError::NotAssignable(target.kind_name()).into());
        }
        let statement = Node::new(NodeKind::Operator {
            op,
            lhs: Child::Node(target.clone()),
            rhs: Some(value.into()),
        });
        self.push(statement, "assign")
    }

    /// `return value;`, also recorded for the enclosing function's return type.
    pub fn return_(&mut self, value: impl Into<Child>) -> Result<()> {
        let value = value.into();
        self.push(
            Node::new(NodeKind::Return {
                value: Some(value.clone()),
            }),
            "return",
        )?;
        if let Some(returns) = self.defines.last_mut() {
            returns.push(value);
        }
        Ok(())
    }

    pub fn return_void(&mut self) -> Result<()> {
        self.push(Node::new(NodeKind::Return { value: None }), "return")
    }

    pub fn break_(&mut self) -> Result<()> {
        self.push(Node::new(NodeKind::Break), "break")
    }

    pub fn continue_(&mut self) -> Result<()> {
        self.push(Node::new(NodeKind::Continue), "continue")
    }

    /// Struct type with ordered fields; `name` defaults to a generated id.
    pub fn struct_<'a>(
        &mut self,
        fields: impl IntoIterator<Item = (&'a str, Type)>,
        name: Option<&str>,
    ) -> StructDef {
        let id = self.id_or_next(name);
        let fields: Vec<(String, Type)> = fields
            .into_iter()
            .map(|(name, ty)| (name.to_string(), ty))
            .collect();
        let mut nested: Vec<Arc<StructLayout>> = Vec::new();
        for (_, ty) in &fields {
            let Some(known) = ty.struct_name().and_then(|n| self.structs.get(n)) else {
                continue;
            };
            if !nested.iter().any(|l| l.id == known.id) {
                nested.push(known.clone());
            }
        }
        let layout = Arc::new(StructLayout { id, fields, nested });
        self.structs.insert(layout.id.clone(), layout.clone());
        StructDef { layout }
    }

    /// Varying passed from the vertex to the fragment stage. No statement is emitted.
    pub fn varying(&mut self, value: impl Into<Child>, name: Option<&str>) -> Node {
        let id = self.id_or_next(name);
        crate::node::factory::varying(value, &id)
    }

    pub fn uniform(&mut self, value: impl Into<Child>, name: Option<&str>) -> Node {
        let id = self.id_or_next(name);
        crate::node::factory::uniform(value, &id)
    }

    pub fn attribute(&mut self, value: impl Into<Child>, name: Option<&str>) -> Node {
        let id = self.id_or_next(name);
        crate::node::factory::attribute(value, &id)
    }

    pub fn constant(&mut self, value: impl Into<Child>, name: Option<&str>) -> Node {
        let id = self.id_or_next(name);
        crate::node::factory::constant(value, &id)
    }

    pub fn storage(&mut self, value: impl Into<Child>, name: Option<&str>) -> Node {
        let id = self.id_or_next(name);
        crate::node::factory::storage(value, &id)
    }
}

/// Open `if` statement. It is appended to the enclosing scope when the chain is dropped,
/// so `b.if_(..)?;` and `b.if_(..)?.else_(..)?;` both emit one statement.
pub struct IfChain<'a> {
    builder: &'a mut Builder,
    branches: Vec<(Child, Node)>,
    otherwise: Option<Node>,
    abandoned: bool,
}

impl IfChain<'_> {
    pub fn else_if<F>(mut self, cond: impl Into<Child>, body: F) -> Result<Self>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        match self.builder.scoped(|b| body(b).map(|_| None)) {
            Ok(scope) => {
                self.branches.push((cond.into(), scope));
                Ok(self)
            }
            Err(err) => {
                self.abandoned = true;
                Err(err)
            }
        }
    }

    pub fn else_<F>(mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        match self.builder.scoped(|b| body(b).map(|_| None)) {
            Ok(scope) => {
                self.otherwise = Some(scope);
                Ok(())
            }
            Err(err) => {
                self.abandoned = true;
                Err(err)
            }
        }
    }
}

impl Drop for IfChain<'_> {
    fn drop(&mut self) {
        if self.abandoned {
            return;
        }
        let node = Node::new(NodeKind::If {
            branches: std::mem::take(&mut self.branches),
            otherwise: self.otherwise.take(),
        });
        // The scope was checked when the chain opened and cannot have closed since.
        let _ = self.builder.push(node, "if");
    }
}

/// Open `switch` statement, appended to the enclosing scope on drop.
pub struct SwitchChain<'a> {
    builder: &'a mut Builder,
    value: Child,
    cases: Vec<(Vec<Child>, Node)>,
    default: Option<Node>,
    abandoned: bool,
}

impl SwitchChain<'_> {
    /// One or more selectors sharing `body`.
    pub fn case<F>(mut self, values: impl IntoArgs, body: F) -> Result<Self>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        match self.builder.scoped(|b| body(b).map(|_| None)) {
            Ok(scope) => {
                self.cases.push((values.into_args(), scope));
                Ok(self)
            }
            Err(err) => {
                self.abandoned = true;
                Err(err)
            }
        }
    }

    pub fn default<F>(mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Builder) -> Result<()>,
    {
        match self.builder.scoped(|b| body(b).map(|_| None)) {
            Ok(scope) => {
                self.default = Some(scope);
                Ok(())
            }
            Err(err) => {
                self.abandoned = true;
                Err(err)
            }
        }
    }
}

impl Drop for SwitchChain<'_> {
    fn drop(&mut self) {
        if self.abandoned {
            return;
        }
        let node = Node::new(NodeKind::Switch {
            value: self.value.clone(),
            cases: std::mem::take(&mut self.cases),
            default: self.default.take(),
        });
        let _ = self.builder.push(node, "switch");
    }
}

#[derive(Clone)]
struct Built {
    params: Vec<Node>,
    body: Node,
    returns: Vec<Child>,
}

#[derive(Default)]
enum BuildState {
    #[default]
    Pending,
    Building,
    Done(Built),
}

/// A shader function. Calling it yields a `define` node; the body is built on the first
/// call and shared by every later call.
#[derive(Clone)]
pub struct FnDef {
    id: String,
    layout: Option<FnLayout>,
    body: FnBody,
    state: Arc<Mutex<BuildState>>,
}

impl FnDef {
    fn new(id: String, body: FnBody) -> Self {
        Self {
            id,
            layout: None,
            body,
            state: Arc::new(Mutex::new(BuildState::Pending)),
        }
    }

    /// Attach a signature. A layout name overrides the function id.
    pub fn with_layout(mut self, layout: FnLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn layout(&self) -> Option<&FnLayout> {
        self.layout.as_ref()
    }

    pub fn id(&self) -> &str {
        self.layout
            .as_ref()
            .and_then(|l| l.name.as_deref())
            .unwrap_or(&self.id)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BuildState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn params(&self, args: &[Child]) -> Vec<Node> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                let input = self.layout.as_ref().and_then(|l| l.inputs.get(i));
                let (id, source) = match input {
                    Some(input) => (
                        input.name.clone(),
                        match &input.ty {
                            LayoutType::Auto => VarSource::Expr(arg.clone()),
                            LayoutType::Is(ty) => VarSource::Declared(ty.clone()),
                        },
                    ),
                    None => (format!("p{i}"), VarSource::Expr(arg.clone())),
                };
                Node::new(NodeKind::Variable {
                    id,
                    source,
                    mutable: false,
                })
            })
            .collect()
    }

    fn build(&self, b: &mut Builder, args: &[Child]) -> Result<Built> {
        {
            let mut state = self.state();
            match &*state {
                BuildState::Done(built) => return Ok(built.clone()),
                BuildState::Building => {
                    return Err(NodeError::RecursiveFunction(self.id().to_string()).into());
                }
                BuildState::Pending => *state = BuildState::Building,
            }
        }
        let params = self.params(args);
        b.defines.push(Vec::new());
        let body = b.scoped(|b| (self.body)(b, &params));
        let returns = b.defines.pop().unwrap_or_default();
        let body = match body {
            Ok(body) => body,
            Err(err) => {
                *self.state() = BuildState::Pending;
                return Err(err);
            }
        };
        let built = Built {
            params,
            body,
            returns,
        };
        *self.state() = BuildState::Done(built.clone());
        Ok(built)
    }

    /// Call expression. The function itself is emitted as a header when the call is
    /// rendered.
    pub fn call(&self, b: &mut Builder, args: impl IntoArgs) -> Result<Node> {
        let args = args.into_args();
        let Built {
            params,
            body,
            returns,
        } = self.build(b, &args)?;
        Ok(Node::new(NodeKind::Define {
            id: self.id().to_string(),
            layout: self.layout.clone(),
            params,
            args,
            body,
            returns,
        }))
    }

    /// Call as a statement, for functions without a result.
    pub fn call_stmt(&self, b: &mut Builder, args: impl IntoArgs) -> Result<()> {
        let call = self.call(b, args)?;
        b.push(Node::new(NodeKind::Expr { value: call }), "call")
    }
}

/// A struct type; instances are declared in the active scope.
#[derive(Clone, Debug)]
pub struct StructDef {
    layout: Arc<StructLayout>,
}

impl StructDef {
    pub fn id(&self) -> &str {
        &self.layout.id
    }

    pub fn layout(&self) -> &StructLayout {
        &self.layout
    }

    pub fn ty(&self) -> Type {
        Type::Struct(self.layout.id.clone())
    }

    /// Declare an uninitialised instance.
    pub fn instantiate(&self, b: &mut Builder) -> Result<Node> {
        self.declare(b, None, None)
    }

    /// Declare an instance built from `values`; fields left out are zero.
    pub fn instantiate_with(&self, b: &mut Builder, values: Vec<(&str, Child)>) -> Result<Node> {
        self.declare(b, Some(values), None)
    }

    pub fn instantiate_named(
        &self,
        b: &mut Builder,
        name: &str,
        values: Option<Vec<(&str, Child)>>,
    ) -> Result<Node> {
        self.declare(b, values, Some(name))
    }

    fn declare(
        &self,
        b: &mut Builder,
        values: Option<Vec<(&str, Child)>>,
        name: Option<&str>,
    ) -> Result<Node> {
        b.require_scope("struct")?;
        let id = b.id_or_next(name);
        let instance = Node::new(NodeKind::Variable {
            id,
            source: VarSource::Struct(self.layout.clone()),
            mutable: true,
        });
        let initial = values.map(|values| {
            values
                .into_iter()
                .map(|(field, value)| (field.to_string(), value))
                .collect()
        });
        b.push(
            Node::new(NodeKind::Struct {
                layout: self.layout.clone(),
                instance: instance.clone(),
                initial,
            }),
            "struct",
        )?;
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::node::factory::*;
    use crate::node::ops::NodeOps;

    fn statements(scope: &Node) -> &[Node] {
        match scope.kind() {
            NodeKind::Scope { statements } => statements,
            other => panic!("expected a scope, got {other:?}"),
        }
    }

    #[test]
    fn statements_need_an_open_scope() {
        let mut b = Builder::new();
        let err = b.to_var(1.0, None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::NoActiveScope("toVar"))
        );
        assert!(b.if_(true, |_| Ok(())).is_err());
        assert!(b.break_().is_err());
    }

    #[test]
    fn returned_expression_becomes_trailing_return() {
        let mut b = Builder::new();
        let root = b
            .scope(|b| {
                let v = b.to_var(vec3(1.0), None)?;
                Ok(Some(v.mul(2.0)))
            })
            .unwrap();
        let body = statements(&root);
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].kind_name(), "declare");
        assert_eq!(body[1].kind_name(), "return");
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn scopes_close_when_a_body_fails() {
        let mut b = Builder::new();
        let result = b.scope(|b| {
            b.if_(true, |b| {
                b.assign(&uniform(1.0, "u"), 2.0)?;
                Ok(())
            })?;
            Ok(None)
        });
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::NotAssignable("uniform"))
        );
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn if_chain_is_one_statement() {
        let mut b = Builder::new();
        let root = b
            .scope(|b| {
                let x = b.to_var(0.0, Some("x"))?;
                b.if_(x.less_than(1.0), |b| b.assign(&x, 1.0).map(|_| ()))?
                    .else_if(x.less_than(2.0), |b| b.assign(&x, 2.0).map(|_| ()))?
                    .else_(|b| b.assign(&x, 3.0).map(|_| ()))?;
                Ok(None)
            })
            .unwrap();
        let body = statements(&root);
        assert_eq!(body.len(), 2);
        match body[1].kind() {
            NodeKind::If {
                branches,
                otherwise,
            } => {
                assert_eq!(branches.len(), 2);
                assert!(otherwise.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loop_index_is_a_fresh_variable() {
        let mut b = Builder::new();
        let mut index_id = String::new();
        b.scope(|b| {
            let acc = b.to_var(0.0, Some("acc"))?;
            b.loop_(int(4), |b, i| {
                index_id = i.id().unwrap_or_default().to_string();
                acc.add_assign(b, i.to_float())
            })?;
            Ok(None)
        })
        .unwrap();
        assert_eq!(index_id, "x0");
    }

    #[test]
    fn switch_cases_share_bodies() {
        let mut b = Builder::new();
        let root = b
            .scope(|b| {
                let mode = b.to_var(int(0), Some("mode"))?;
                let out = b.to_var(0.0, Some("out"))?;
                b.switch(&mode)?
                    .case((0, 1), |b| b.assign(&out, 1.0).map(|_| ()))?
                    .case(2, |b| b.break_())?
                    .default(|b| b.assign(&out, 0.5).map(|_| ()))?;
                Ok(None)
            })
            .unwrap();
        match statements(&root)[2].kind() {
            NodeKind::Switch { cases, default, .. } => {
                assert_eq!(cases[0].0.len(), 2);
                assert_eq!(cases.len(), 2);
                assert!(default.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn functions_build_once_and_collect_returns() {
        let mut b = Builder::new();
        let square = b.func_named("square", |_, p| Ok(Some(p[0].mul(&p[0]))));
        let (first, second) = (
            square.call(&mut b, 2.0).unwrap(),
            square.call(&mut b, vec2(1.0)).unwrap(),
        );
        let body_of = |n: &Node| match n.kind() {
            NodeKind::Define { body, returns, id, .. } => {
                assert_eq!(id, "square");
                assert_eq!(returns.len(), 1);
                body.clone()
            }
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(body_of(&first), body_of(&second));
    }

    #[test]
    fn layout_names_and_types_parameters() {
        let mut b = Builder::new();
        let layout: FnLayout = serde_json::from_str(
            r#"{ "name": "tint", "type": "vec3", "inputs": [{ "name": "c", "type": "vec3" }] }"#,
        )
        .unwrap();
        let tint = b
            .func(|_, p| Ok(Some(p[0].mul(0.5))))
            .with_layout(layout);
        assert_eq!(tint.id(), "tint");
        let call = tint.call(&mut b, vec3(1.0)).unwrap();
        match call.kind() {
            NodeKind::Define { params, .. } => {
                assert_eq!(params[0].id(), Some("c"));
                assert!(matches!(
                    params[0].kind(),
                    NodeKind::Variable {
                        source: VarSource::Declared(Type::Vec3),
                        ..
                    }
                ));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn self_calls_are_rejected() {
        let mut b = Builder::new();
        let slot: Arc<OnceLock<FnDef>> = Arc::new(OnceLock::new());
        let inner = slot.clone();
        let f = b.func_named("loopy", move |b, p| {
            let me = inner.get().expect("set before the first call");
            Ok(Some(me.call(b, p[0].clone())?))
        });
        slot.set(f.clone()).ok();
        let err = f.call(&mut b, 1.0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::RecursiveFunction("loopy".into()))
        );
        assert_eq!(b.depth(), 0);
    }

    #[test]
    fn storage_assignment_is_a_scatter() {
        let mut b = Builder::new();
        let root = b
            .scope(|b| {
                let particles = b.storage(vec![0.0f32; 16], Some("particles"));
                b.assign(&particles.element(int(3)), vec4(1.0))?;
                Ok(None)
            })
            .unwrap();
        assert_eq!(statements(&root)[0].kind_name(), "scatter");
    }

    #[test]
    fn struct_instances_are_declared_in_scope() {
        let mut b = Builder::new();
        let light = b.struct_([("color", Type::Vec3), ("power", Type::Float)], Some("Light"));
        let root = b
            .scope(|b| {
                let l = light.instantiate_with(b, vec![("power", Child::from(2.0))])?;
                Ok(Some(l.member("color")))
            })
            .unwrap();
        assert_eq!(statements(&root)[0].kind_name(), "struct");
        assert_eq!(light.ty(), Type::Struct("Light".into()));
    }
}
