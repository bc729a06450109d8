//! Lowering of node graphs to GLSL and WGSL.
//!
//! [`code`] walks a graph once per dialect through the [`Emitter`] seam. Headers (uniforms,
//! constants, storages, structs and functions) are collected into the [`NodeContext`] and
//! referenced by bare id from the body; stage interface fields (attributes, varyings,
//! builtins) go into the per-stage maps. The stage assemblers in [`stage`] wrap it all up.

pub mod emitter;
pub mod glsl;
pub mod headers;
pub mod stage;
pub mod wgsl;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use log::warn;

use crate::config::{Binding, BuildConfig};
use crate::error::NodeError;
use crate::infer::{infer, infer_node};
use crate::node::consts::builtin_type;
use crate::node::{Child, Node, NodeKind, ResourceSink, StructLayout, Type, UniformValue};
use crate::utils::{fmt_index, fmt_number};

pub use emitter::Emitter;
pub use glsl::GlslEmitter;
pub use headers::{HeaderMap, OrderedMap};
pub use stage::{compute, fragment, vertex};
pub use wgsl::WgslEmitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// GLSL ES 3.00 for WebGL2.
    Glsl,
    Wgsl,
}

impl Dialect {
    pub fn emitter(self) -> &'static dyn Emitter {
        match self {
            Dialect::Glsl => &GlslEmitter,
            Dialect::Wgsl => &WgslEmitter,
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "glsl" | "webgl" => Ok(Dialect::Glsl),
            "wgsl" | "webgpu" => Ok(Dialect::Wgsl),
            other => Err(anyhow!("unknown dialect '{other}' (expected glsl or wgsl)")),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Glsl => "glsl",
            Dialect::Wgsl => "wgsl",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fragment,
    Vertex,
    Compute,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fragment => "frag",
            Stage::Vertex => "vert",
            Stage::Compute => "compute",
        }
    }
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "frag" | "fragment" => Ok(Stage::Fragment),
            "vert" | "vertex" => Ok(Stage::Vertex),
            "compute" => Ok(Stage::Compute),
            other => Err(anyhow!(
                "unknown stage '{other}' (expected fragment, vertex or compute)"
            )),
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    bindings: HashMap<String, Binding>,
    locations: HashMap<String, u32>,
    next_binding: u32,
    next_texture: u32,
    next_location: u32,
    /// Fragment outputs of the stage being assembled; reset per stage.
    outputs: HashMap<String, u32>,
}

/// Per-build state threaded through [`code`] and the stage assemblers.
///
/// A context belongs to one build session. Build the fragment stage before the vertex stage
/// with the same context: varyings first read by the fragment graph are then written by the
/// vertex program.
pub struct NodeContext {
    pub(crate) dialect: Dialect,
    pub(crate) stage: Stage,
    pub(crate) config: BuildConfig,
    pub(crate) headers: HeaderMap,
    pub(crate) frag_inputs: OrderedMap,
    pub(crate) vert_inputs: OrderedMap,
    pub(crate) vert_outputs: OrderedMap,
    pub(crate) vert_varyings: OrderedMap,
    /// Varying ids with their unrendered values, in location order.
    varying_values: Vec<(String, Child)>,
    pub(crate) compute_inputs: OrderedMap,
    pub(crate) struct_fields: HashMap<String, Arc<StructLayout>>,
    pub(crate) infers: HashMap<usize, (Node, Type)>,
    defining: Vec<String>,
    slots: Slots,
    warnings: Vec<String>,
    sink: Option<Arc<dyn ResourceSink>>,
    subscribed: HashSet<String>,
}

impl NodeContext {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_config(dialect, BuildConfig::default())
    }

    pub fn glsl() -> Self {
        Self::new(Dialect::Glsl)
    }

    pub fn wgsl() -> Self {
        Self::new(Dialect::Wgsl)
    }

    pub fn with_config(dialect: Dialect, config: BuildConfig) -> Self {
        let mut ctx = Self {
            dialect,
            stage: Stage::Fragment,
            config,
            headers: HeaderMap::default(),
            frag_inputs: OrderedMap::default(),
            vert_inputs: OrderedMap::default(),
            vert_outputs: OrderedMap::default(),
            vert_varyings: OrderedMap::default(),
            varying_values: Vec::new(),
            compute_inputs: OrderedMap::default(),
            struct_fields: HashMap::new(),
            infers: HashMap::new(),
            defining: Vec::new(),
            slots: Slots::default(),
            warnings: Vec::new(),
            sink: None,
            subscribed: HashSet::new(),
        };
        if dialect == Dialect::Wgsl {
            let position = "@builtin(position) position: vec4f".to_string();
            ctx.frag_inputs.set("position", position.clone());
            ctx.vert_outputs.set("position", position);
        }
        ctx
    }

    /// Route initial values and later changes of resource nodes to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn ResourceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn frag_inputs(&self) -> &OrderedMap {
        &self.frag_inputs
    }

    pub fn vert_inputs(&self) -> &OrderedMap {
        &self.vert_inputs
    }

    pub fn vert_outputs(&self) -> &OrderedMap {
        &self.vert_outputs
    }

    pub fn vert_varyings(&self) -> &OrderedMap {
        &self.vert_varyings
    }

    pub fn compute_inputs(&self) -> &OrderedMap {
        &self.compute_inputs
    }

    /// Soft failures collected so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    pub(crate) fn emitter(&self) -> &'static dyn Emitter {
        self.dialect.emitter()
    }

    /// Stage input map builtins of the current stage register into.
    pub(crate) fn stage_inputs(&mut self) -> &mut OrderedMap {
        match self.stage {
            Stage::Fragment => &mut self.frag_inputs,
            Stage::Vertex => &mut self.vert_inputs,
            Stage::Compute => &mut self.compute_inputs,
        }
    }

    fn group0_slot(&mut self, id: &str, configured: Option<Binding>) -> Binding {
        if let Some(slot) = configured {
            return slot;
        }
        if let Some(slot) = self.slots.bindings.get(id) {
            return *slot;
        }
        let slot = Binding {
            group: 0,
            binding: self.slots.next_binding,
        };
        self.slots.next_binding += 1;
        self.slots.bindings.insert(id.to_string(), slot);
        slot
    }

    pub(crate) fn uniform_slot(&mut self, id: &str) -> Binding {
        let configured = self.config.bindings.uniforms.get(id).copied();
        self.group0_slot(id, configured)
    }

    pub(crate) fn storage_slot(&mut self, id: &str) -> Binding {
        let configured = self.config.bindings.storages.get(id).copied();
        self.group0_slot(id, configured)
    }

    pub(crate) fn texture_slot(&mut self, id: &str) -> Binding {
        if let Some(slot) = self.config.bindings.textures.get(id) {
            return *slot;
        }
        if let Some(slot) = self.slots.bindings.get(id) {
            return *slot;
        }
        let slot = Binding {
            group: 1,
            binding: self.slots.next_texture,
        };
        self.slots.next_texture += 2;
        self.slots.bindings.insert(id.to_string(), slot);
        slot
    }

    /// Colour attachment a storage write of the current stage goes to, from 0.
    pub(crate) fn output_location(&mut self, id: &str) -> u32 {
        let next = self.slots.outputs.len() as u32;
        *self.slots.outputs.entry(id.to_string()).or_insert(next)
    }

    pub(crate) fn reset_stage_outputs(&mut self) {
        self.slots.outputs.clear();
    }

    pub(crate) fn attribute_location(&mut self, id: &str) -> u32 {
        if let Some(location) = self.config.bindings.attributes.get(id) {
            return *location;
        }
        if let Some(location) = self.slots.locations.get(id) {
            return *location;
        }
        let location = self.slots.next_location;
        self.slots.next_location += 1;
        self.slots.locations.insert(id.to_string(), location);
        location
    }
}

#[derive(Clone, Copy)]
enum ResourceKind {
    Uniform,
    Attribute,
    Instance,
    Texture,
}

impl ResourceKind {
    fn send(self, sink: &dyn ResourceSink, id: &str, value: &UniformValue) {
        match self {
            ResourceKind::Uniform => sink.uniform(id, value),
            ResourceKind::Attribute => sink.attribute(id, value),
            ResourceKind::Instance => sink.instance(id, value),
            ResourceKind::Texture => sink.texture(id, value),
        }
    }
}

/// Initial value of a resource: raw data, or a constructor over number literals.
fn initial_value(value: &Child) -> Option<UniformValue> {
    let Child::Node(node) = value else {
        return UniformValue::from_child(value);
    };
    let NodeKind::Conversion { ty, args } = node.kind() else {
        return None;
    };
    let numbers: Option<Vec<f32>> = args
        .iter()
        .map(|arg| match arg {
            Child::Float(f) => Some(*f as f32),
            _ => None,
        })
        .collect();
    let mut numbers = numbers?;
    match numbers.as_slice() {
        [] => None,
        [only] if ty.is_scalar() => Some(UniformValue::Float(*only)),
        [only] => {
            numbers = vec![*only; ty.components().max(1)];
            Some(UniformValue::Vector(numbers))
        }
        _ => Some(UniformValue::Vector(numbers)),
    }
}

fn setup_event(ctx: &mut NodeContext, node: &Node, id: &str, kind: ResourceKind, value: &Child) {
    let Some(sink) = ctx.sink.clone() else {
        return;
    };
    if !ctx.subscribed.insert(id.to_string()) {
        return;
    }
    if let Some(initial) = initial_value(value) {
        kind.send(sink.as_ref(), id, &initial);
    }
    // Default uniforms are process-wide nodes: one listener per sink, however many builds.
    let key = Arc::as_ptr(&sink) as *const () as usize;
    let id = id.to_string();
    let listener_sink = sink.clone();
    node.add_keyed_listener(
        key,
        Arc::new(move |value: &UniformValue| kind.send(listener_sink.as_ref(), &id, value)),
    );
}

/// Render a child slot.
pub fn code(child: &Child, ctx: &mut NodeContext) -> Result<String> {
    match child {
        Child::Node(node) => code_node(node, ctx),
        Child::Float(v) => Ok(fmt_number(*v)),
        Child::Bool(b) => Ok(b.to_string()),
        Child::Text(text) => Ok(text.clone()),
        Child::Array(values) => Ok(values
            .iter()
            .map(|v| fmt_number(*v))
            .collect::<Vec<_>>()
            .join(", ")),
    }
}

fn codes(children: &[Child], ctx: &mut NodeContext) -> Result<Vec<String>> {
    children.iter().map(|child| code(child, ctx)).collect()
}

/// Array indices and case selectors render integral literals without a fraction.
fn index_code(child: &Child, ctx: &mut NodeContext) -> Result<String> {
    match child {
        Child::Float(v) => Ok(fmt_index(*v)),
        other => code(other, ctx),
    }
}

/// Render a node, registering any headers and interface fields it needs.
pub fn code_node(node: &Node, ctx: &mut NodeContext) -> Result<String> {
    let e = ctx.emitter();
    Ok(match node.kind() {
        NodeKind::Variable { id, .. } => id.clone(),
        NodeKind::Member { base, key } => format!("{}.{key}", code_node(base, ctx)?),
        NodeKind::Element { base, index } => {
            format!("{}[{}]", code_node(base, ctx)?, index_code(index, ctx)?)
        }
        NodeKind::Swizzle { base, letters } => format!("{}.{letters}", code_node(base, ctx)?),
        NodeKind::Gather { storage, index } => {
            let ty = infer_node(node, ctx);
            let storage = code_node(storage, ctx)?;
            let index = index_code(index, ctx)?;
            e.gather(ctx, &storage, &index, &ty)?
        }
        NodeKind::Scatter { target, value } => {
            let NodeKind::Gather { storage, index } = target.kind() else {
                return Err(NodeError::NotAssignable(target.kind_name()).into());
            };
            let storage = code_node(storage, ctx)?;
            let index = index_code(index, ctx)?;
            let ty = infer(value, ctx);
            let value = code(value, ctx)?;
            e.scatter(&storage, &index, &value, &ty)?
        }
        NodeKind::Ternary { yes, no, cond } => {
            let cond = code(cond, ctx)?;
            let yes = code(yes, ctx)?;
            let no = code(no, ctx)?;
            e.ternary(&cond, &yes, &no)
        }
        NodeKind::Conversion { ty, args } => {
            let args = codes(args, ctx)?;
            e.conversion(ty, &args)
        }
        NodeKind::Operator { op, lhs, rhs } => {
            let lhs = code(lhs, ctx)?;
            match rhs {
                None => format!("{}{lhs}", op.symbol()),
                Some(rhs) => {
                    let rhs = code(rhs, ctx)?;
                    if *op == crate::node::Operator::Mod {
                        e.modulo(&lhs, &rhs)
                    } else if op.is_assign() {
                        format!("{lhs} {} {rhs};", op.symbol())
                    } else {
                        format!("({lhs} {} {rhs})", op.symbol())
                    }
                }
            }
        }
        NodeKind::Function { func, args } => {
            let args = codes(args, ctx)?;
            e.function(*func, &args)
        }
        NodeKind::Scope { statements } => {
            let mut lines = Vec::with_capacity(statements.len());
            for statement in statements {
                let line = code_node(statement, ctx)?;
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            lines.join("\n")
        }
        NodeKind::Expr { value } => format!("{};", code_node(value, ctx)?),
        NodeKind::Assign { target, value } => {
            format!("{} = {};", code_node(target, ctx)?, code(value, ctx)?)
        }
        NodeKind::Declare { var, value } => {
            let ty = infer_node(var, ctx);
            let value = code(value, ctx)?;
            let mutable = matches!(var.kind(), NodeKind::Variable { mutable: true, .. });
            e.declare(var.id().unwrap_or_default(), &ty, &value, mutable)
        }
        NodeKind::Return { value } => match value {
            Some(value) => format!("return {};", code(value, ctx)?),
            None => "return;".to_string(),
        },
        NodeKind::Break => "break;".to_string(),
        NodeKind::Continue => "continue;".to_string(),
        NodeKind::Loop { id, bound, body } => {
            let bound_ty = infer(bound, ctx);
            let body = code_node(body, ctx)?;
            let bound = code(bound, ctx)?;
            e.for_loop(id, &bound_ty, &bound, &body)
        }
        NodeKind::If {
            branches,
            otherwise,
        } => {
            let mut text = String::new();
            for (i, (cond, scope)) in branches.iter().enumerate() {
                let cond = code(cond, ctx)?;
                let body = code_node(scope, ctx)?;
                if i == 0 {
                    text.push_str(&format!("if ({cond}) {{\n{body}\n}}"));
                } else {
                    text.push_str(&format!(" else if ({cond}) {{\n{body}\n}}"));
                }
            }
            if let Some(scope) = otherwise {
                text.push_str(&format!(" else {{\n{}\n}}", code_node(scope, ctx)?));
            }
            text
        }
        NodeKind::Switch {
            value,
            cases,
            default,
        } => {
            let value = code(value, ctx)?;
            let mut rendered = Vec::with_capacity(cases.len());
            for (selectors, scope) in cases {
                let selectors = selectors
                    .iter()
                    .map(|s| index_code(s, ctx))
                    .collect::<Result<Vec<_>>>()?;
                rendered.push((selectors, code_node(scope, ctx)?));
            }
            let default = default.as_ref().map(|d| code_node(d, ctx)).transpose()?;
            e.switch(&value, &rendered, default.as_deref())
        }
        NodeKind::Define { .. } => emit_define(node, ctx)?,
        NodeKind::Struct { .. } => emit_struct(node, ctx)?,
        NodeKind::Varying { .. } => emit_varying(node, ctx)?,
        NodeKind::Builtin { id } => {
            let ty = builtin_type(id).ok_or_else(|| NodeError::UnknownBuiltin(id.clone()))?;
            e.builtin(ctx, id, &ty)?
        }
        NodeKind::Attribute { id, value } | NodeKind::Instance { id, value } => {
            let kind = match node.kind() {
                NodeKind::Instance { .. } => ResourceKind::Instance,
                _ => ResourceKind::Attribute,
            };
            setup_event(ctx, node, id, kind, value);
            let ty = infer_node(node, ctx);
            let location = ctx.attribute_location(id);
            let field = e.attribute_field(id, &ty, location);
            ctx.vert_inputs.set(id, field);
            e.attribute_ref(id)
        }
        NodeKind::Uniform { id, value } => {
            if !ctx.headers.contains(id) {
                let ty = infer_node(node, ctx);
                let head = if ty.is_texture() {
                    setup_event(ctx, node, id, ResourceKind::Texture, value);
                    let slot = ctx.texture_slot(id);
                    e.texture_head(id, slot)
                } else {
                    setup_event(ctx, node, id, ResourceKind::Uniform, value);
                    let slot = ctx.uniform_slot(id);
                    e.uniform_head(id, &ty, slot)
                };
                ctx.headers.insert(id, head);
            }
            id.clone()
        }
        NodeKind::Storage { id, .. } => {
            if !ctx.headers.contains(id) {
                let ty = infer_node(node, ctx);
                let slot = ctx.storage_slot(id);
                let head = e.storage_head(ctx, id, &ty, slot);
                ctx.headers.insert(id, head);
            }
            id.clone()
        }
        NodeKind::Constant { id, value } => {
            if !ctx.headers.contains(id) {
                let ty = infer_node(node, ctx);
                let value = code(value, ctx)?;
                let head = e.constant_head(id, &ty, &value);
                ctx.headers.insert(id, head);
            }
            id.clone()
        }
    })
}

fn emit_define(node: &Node, ctx: &mut NodeContext) -> Result<String> {
    let NodeKind::Define { id, args, .. } = node.kind() else {
        bail!("expected a define node, got {}", node.kind_name());
    };
    if !ctx.headers.contains(id) {
        if ctx.defining.iter().any(|d| d == id) {
            return Err(NodeError::RecursiveFunction(id.clone()).into());
        }
        ctx.defining.push(id.clone());
        let head = define_head(node, ctx);
        ctx.defining.pop();
        ctx.headers.insert(id, head?);
    }
    let args = codes(args, ctx)?;
    Ok(format!("{id}({})", args.join(", ")))
}

fn define_head(node: &Node, ctx: &mut NodeContext) -> Result<String> {
    let NodeKind::Define {
        id, params, body, ..
    } = node.kind()
    else {
        bail!("expected a define node, got {}", node.kind_name());
    };
    let mut typed = Vec::with_capacity(params.len());
    for param in params {
        let ty = infer_node(param, ctx);
        typed.push((param.id().unwrap_or_default().to_string(), ty));
    }
    // Body first so struct headers it declares exist before the return type resolves.
    let body = code_node(body, ctx)?;
    let returns = infer_node(node, ctx);
    for (_, ty) in &typed {
        if let Some(name) = ty.struct_name() {
            ctx.headers.add_dependency(id, name);
        }
    }
    if let Some(name) = returns.struct_name() {
        ctx.headers.add_dependency(id, name);
    }
    Ok(ctx.emitter().define_head(id, &typed, &returns, &body))
}

fn emit_struct(node: &Node, ctx: &mut NodeContext) -> Result<String> {
    let NodeKind::Struct {
        layout,
        instance,
        initial,
    } = node.kind()
    else {
        bail!("expected a struct node, got {}", node.kind_name());
    };
    let e = ctx.emitter();
    emit_struct_head(layout, ctx);
    let args = match initial {
        Some(values) => {
            let mut args = Vec::with_capacity(layout.fields.len());
            for (field, ty) in &layout.fields {
                match values.iter().find(|(name, _)| name == field) {
                    Some((_, value)) => args.push(code(value, ctx)?),
                    None => args.push(e.zero(ty)),
                }
            }
            Some(args)
        }
        None => None,
    };
    Ok(e.struct_instance(
        &layout.id,
        instance.id().unwrap_or_default(),
        args.as_deref(),
    ))
}

/// Declare `layout` and, first, the struct layouts its fields are typed with.
fn emit_struct_head(layout: &Arc<StructLayout>, ctx: &mut NodeContext) {
    if ctx.headers.contains(&layout.id) {
        return;
    }
    ctx.struct_fields.insert(layout.id.clone(), layout.clone());
    let head = ctx.emitter().struct_head(&layout.id, &layout.fields);
    ctx.headers.insert(&layout.id, head);
    for (_, ty) in &layout.fields {
        if let Some(name) = ty.struct_name() {
            ctx.headers.add_dependency(&layout.id, name);
        }
    }
    for nested in &layout.nested {
        emit_struct_head(nested, ctx);
    }
}

/// Declare struct field types the stage has not declared yet. A field typed with a struct
/// this build never saw is an error.
pub(crate) fn complete_struct_headers(ctx: &mut NodeContext) -> Result<()> {
    loop {
        let mut missing = None;
        for id in ctx.headers.ids() {
            let Some(layout) = ctx.struct_fields.get(id) else {
                continue;
            };
            let unknown = layout
                .fields
                .iter()
                .filter_map(|(_, ty)| ty.struct_name())
                .find(|name| !ctx.headers.contains(name));
            if let Some(name) = unknown {
                missing = Some(name.to_string());
                break;
            }
        }
        let Some(name) = missing else {
            return Ok(());
        };
        let Some(layout) = ctx.struct_fields.get(&name).cloned() else {
            return Err(NodeError::UndeclaredStruct(name).into());
        };
        emit_struct_head(&layout, ctx);
    }
}

fn emit_varying(node: &Node, ctx: &mut NodeContext) -> Result<String> {
    let NodeKind::Varying { id, value } = node.kind() else {
        bail!("expected a varying node, got {}", node.kind_name());
    };
    let e = ctx.emitter();
    if ctx.varying_values.iter().any(|(known, _)| known == id) {
        return Ok(e.varying_ref(id));
    }
    let ty = infer_node(node, ctx);
    let location = ctx.varying_values.len();
    let field = e.varying_field(id, &ty, location);
    ctx.frag_inputs.set(id, field.clone());
    ctx.vert_outputs.set(id, field);
    ctx.varying_values.push((id.clone(), value.clone()));
    Ok(e.varying_ref(id))
}

/// Render the value of every varying seen so far as a vertex-stage expression, so the
/// headers and builtins it needs land in the vertex program.
pub(crate) fn emit_varying_values(ctx: &mut NodeContext) -> Result<()> {
    // Values may reference varyings not seen before, which extends the list.
    let mut i = 0;
    while let Some((id, value)) = ctx.varying_values.get(i).cloned() {
        let text = code(&value, ctx)?;
        ctx.vert_varyings.set(&id, text);
        i += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::node::factory::*;
    use crate::node::ops::NodeOps;

    #[test]
    fn literals_render_dotted_in_both_dialects() {
        for dialect in [Dialect::Glsl, Dialect::Wgsl] {
            let mut ctx = NodeContext::new(dialect);
            assert_eq!(code(&Child::Float(42.0), &mut ctx).unwrap(), "42.0");
            assert_eq!(code(&Child::Float(3.14), &mut ctx).unwrap(), "3.14");
            assert_eq!(code(&Child::Bool(true), &mut ctx).unwrap(), "true");
        }
    }

    #[test]
    fn vector_constructor_spelling_differs() {
        let v = vec3((1, 2, 3));
        assert_eq!(code_node(&v, &mut NodeContext::glsl()).unwrap(), "vec3(1.0, 2.0, 3.0)");
        assert_eq!(code_node(&v, &mut NodeContext::wgsl()).unwrap(), "vec3f(1.0, 2.0, 3.0)");
    }

    #[test]
    fn operators_nest_with_parens() {
        let x = variable("x", Type::Float);
        let y = variable("y", Type::Float);
        let w = variable("w", Type::Float);
        let expr = x.add(y.mul(&w));
        assert_eq!(code_node(&expr, &mut NodeContext::glsl()).unwrap(), "(x + (y * w))");
        let m = x.modulo(&y);
        assert_eq!(code_node(&m, &mut NodeContext::glsl()).unwrap(), "mod(x, y)");
        assert_eq!(
            code_node(&m, &mut NodeContext::wgsl()).unwrap(),
            "(x - y * floor(x / y))"
        );
        assert_eq!(code_node(&x.not(), &mut NodeContext::glsl()).unwrap(), "!x");
    }

    #[test]
    fn uniform_header_is_emitted_once() {
        let u = uniform(0.5, "uAmount");
        let expr = u.add(&u);
        let mut ctx = NodeContext::wgsl();
        assert_eq!(code_node(&expr, &mut ctx).unwrap(), "(uAmount + uAmount)");
        assert_eq!(ctx.headers().len(), 1);
        assert_eq!(
            ctx.headers().get("uAmount"),
            Some("@group(0) @binding(0) var<uniform> uAmount: f32;")
        );
    }

    #[test]
    fn binding_slots_are_stable_per_id() {
        let a = uniform(1.0, "a");
        let b = uniform(1.0, "b");
        let tex = uniform("albedo.png", "albedo");
        let mut ctx = NodeContext::wgsl();
        code_node(&a.add(&b), &mut ctx).unwrap();
        code_node(&tex, &mut ctx).unwrap();
        ctx.headers.clear();
        code_node(&b, &mut ctx).unwrap();
        assert_eq!(
            ctx.headers().get("b"),
            Some("@group(0) @binding(1) var<uniform> b: f32;")
        );
        code_node(&tex, &mut ctx).unwrap();
        assert!(ctx.headers().get("albedo").unwrap().contains("@group(1) @binding(1) var albedo: texture_2d<f32>;"));
    }

    #[test]
    fn unknown_builtins_are_hard_errors() {
        let err = code_node(&builtin("nonsense"), &mut NodeContext::wgsl()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::UnknownBuiltin("nonsense".into()))
        );
        let err = code_node(&normal_world(), &mut NodeContext::glsl()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::NoGlslBuiltin("normalWorld".into()))
        );
    }

    #[test]
    fn builtins_register_stage_inputs() {
        let mut ctx = NodeContext::wgsl();
        ctx.stage = Stage::Vertex;
        assert_eq!(code_node(&vertex_index(), &mut ctx).unwrap(), "in.vertex_index");
        assert_eq!(
            ctx.vert_inputs().get("vertex_index"),
            Some("@builtin(vertex_index) vertex_index: u32")
        );
        assert_eq!(code_node(&position(), &mut ctx).unwrap(), "out.position");
        assert_eq!(code_node(&position(), &mut NodeContext::glsl()).unwrap(), "gl_FragCoord");
    }

    #[test]
    fn varyings_fill_both_interfaces() {
        let uv = attribute(vec![0.0f32; 6], "uv");
        let v = varying(uv.xy(), "vUv");
        let mut ctx = NodeContext::wgsl();
        assert_eq!(code_node(&v, &mut ctx).unwrap(), "out.vUv");
        assert_eq!(ctx.frag_inputs().get("vUv"), Some("@location(0) vUv: vec2f"));
        // The value is rendered with the vertex stage, not where the varying is read.
        assert!(ctx.vert_varyings().is_empty());
        assert!(!ctx.vert_inputs().contains("uv"));
        ctx.stage = Stage::Vertex;
        emit_varying_values(&mut ctx).unwrap();
        assert_eq!(ctx.vert_varyings().get("vUv"), Some("in.uv.xy"));
        assert!(ctx.vert_inputs().contains("uv"));
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, UniformValue)>>);

    impl ResourceSink for Recorder {
        fn uniform(&self, id: &str, value: &UniformValue) {
            self.0.lock().unwrap().push((id.to_string(), value.clone()));
        }
        fn attribute(&self, id: &str, value: &UniformValue) {
            self.0.lock().unwrap().push((format!("attr:{id}"), value.clone()));
        }
        fn instance(&self, _: &str, _: &UniformValue) {}
        fn texture(&self, id: &str, value: &UniformValue) {
            self.0.lock().unwrap().push((format!("tex:{id}"), value.clone()));
        }
    }

    #[test]
    fn sink_receives_initial_and_later_values() {
        let recorder = Arc::new(Recorder::default());
        let mut ctx = NodeContext::glsl().with_sink(recorder.clone());
        let u = uniform(vec2(1.0), "uOffset");
        code_node(&u, &mut ctx).unwrap();
        code_node(&u, &mut ctx).unwrap();
        u.set_value([0.25f32, 0.75]);
        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("uOffset".to_string(), UniformValue::Vector(vec![1.0, 1.0])),
                ("uOffset".to_string(), UniformValue::Vector(vec![0.25, 0.75])),
            ]
        );
        assert_eq!(u.listener_count(), 1);
    }

    #[test]
    fn repeated_builds_share_one_listener_per_sink() {
        let recorder = Arc::new(Recorder::default());
        let u = uniform(0.0, "uPhase");
        for _ in 0..3 {
            let mut ctx = NodeContext::wgsl().with_sink(recorder.clone());
            code_node(&u, &mut ctx).unwrap();
        }
        assert_eq!(u.listener_count(), 1);
        u.set_value(1.0f32);
        let seen = recorder.0.lock().unwrap().clone();
        // Three initial values, then one notification.
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[3], ("uPhase".to_string(), UniformValue::Float(1.0)));

        let other = Arc::new(Recorder::default());
        code_node(&u, &mut NodeContext::glsl().with_sink(other)).unwrap();
        assert_eq!(u.listener_count(), 2);
    }

    #[test]
    fn storage_outputs_start_at_location_zero_per_stage() {
        let particles = storage(vec4(0.0), "particles");
        let amount = uniform(1.0, "uAmount");
        let mut ctx = NodeContext::glsl();
        ctx.stage = Stage::Compute;
        code_node(&amount, &mut ctx).unwrap();
        code_node(&particles, &mut ctx).unwrap();
        assert_eq!(
            ctx.headers().get("particles"),
            Some("uniform sampler2D particles;\nlayout(location = 0) out vec4 _particles;")
        );
    }

    #[test]
    fn struct_field_types_are_declared_with_their_user() {
        let inner = Arc::new(StructLayout {
            id: "Light".into(),
            fields: vec![("color".into(), Type::Vec3)],
            nested: Vec::new(),
        });
        let outer = Arc::new(StructLayout {
            id: "Scene".into(),
            fields: vec![("light".into(), Type::Struct("Light".into()))],
            nested: vec![inner],
        });
        let mut ctx = NodeContext::wgsl();
        emit_struct_head(&outer, &mut ctx);
        complete_struct_headers(&mut ctx).unwrap();
        assert_eq!(
            ctx.headers().sorted().unwrap(),
            vec!["struct Light {\n  color: vec3f,\n}", "struct Scene {\n  light: Light,\n}"]
        );
    }

    #[test]
    fn fields_typed_with_unknown_structs_are_rejected() {
        let orphan = Arc::new(StructLayout {
            id: "Scene".into(),
            fields: vec![("light".into(), Type::Struct("Light".into()))],
            nested: Vec::new(),
        });
        let mut ctx = NodeContext::glsl();
        emit_struct_head(&orphan, &mut ctx);
        let err = complete_struct_headers(&mut ctx).unwrap_err();
        assert_eq!(
            err.downcast_ref::<NodeError>(),
            Some(&NodeError::UndeclaredStruct("Light".into()))
        );
    }
}
