//! WGSL (WebGPU) spelling.

use anyhow::Result;

use super::emitter::Emitter;
use super::headers::OrderedMap;
use super::stage::{StageParts, finish, indent};
use super::{Dialect, NodeContext, Stage};
use crate::config::Binding;
use crate::node::{MathFunction, Type};

pub struct WgslEmitter;

fn arg(args: &[String], i: usize) -> &str {
    args.get(i).map(String::as_str).unwrap_or("0.0")
}

fn interface_struct(id: &str, fields: &OrderedMap) -> String {
    let fields: Vec<&str> = fields.values().collect();
    format!("struct {id} {{\n  {}\n}}", fields.join(",\n  "))
}

impl Emitter for WgslEmitter {
    fn dialect(&self) -> Dialect {
        Dialect::Wgsl
    }

    fn type_name(&self, ty: &Type) -> String {
        ty.wgsl().to_string()
    }

    fn modulo(&self, lhs: &str, rhs: &str) -> String {
        format!("({lhs} - {rhs} * floor({lhs} / {rhs}))")
    }

    fn ternary(&self, cond: &str, yes: &str, no: &str) -> String {
        format!("select({no}, {yes}, {cond})")
    }

    fn conversion(&self, ty: &Type, args: &[String]) -> String {
        format!("{}({})", self.type_name(ty), args.join(", "))
    }

    fn function(&self, func: MathFunction, args: &[String]) -> String {
        use MathFunction::*;
        let a = arg(args, 0);
        let b = arg(args, 1);
        match func {
            Negate => format!("(-{a})"),
            OneMinus => format!("(1.0 - {a})"),
            Reciprocal => format!("(1.0 / {a})"),
            Saturate => format!("clamp({a}, 0.0, 1.0)"),
            Pow2 => format!("pow({a}, 2.0)"),
            Pow3 => format!("pow({a}, 3.0)"),
            Pow4 => format!("pow({a}, 4.0)"),
            LengthSq => format!("dot({a}, {a})"),
            Difference => format!("abs({a} - {b})"),
            Equals => format!("({a} == {b})"),
            Luminance => format!("dot({a}, vec3f(0.2126, 0.7152, 0.0722))"),
            TransformDirection => format!("normalize(({b} * vec4f({a}, 0.0)).xyz)"),
            DFdx => format!("dpdx({a})"),
            DFdy => format!("dpdy({a})"),
            Faceforward => format!("faceForward({})", args.join(", ")),
            Texture | CubeTexture => match args.get(2) {
                Some(level) => format!("textureSampleLevel({a}, {a}Sampler, {b}, {level})"),
                None => format!("textureSample({a}, {a}Sampler, {b})"),
            },
            TextureLod => format!("textureSampleLevel({a}, {a}Sampler, {b}, {})", arg(args, 2)),
            TexelFetch => format!("textureLoad({a}, {b}, i32({}))", arg(args, 2)),
            TextureSize => format!("vec2i(textureDimensions({a}, i32({})))", arg(args, 1)),
            other => format!("{}({})", other.name(), args.join(", ")),
        }
    }

    fn declare(&self, name: &str, ty: &Type, value: &str, mutable: bool) -> String {
        let keyword = if mutable { "var" } else { "let" };
        format!("{keyword} {name}: {} = {value};", self.type_name(ty))
    }

    fn for_loop(&self, id: &str, bound_ty: &Type, bound: &str, body: &str) -> String {
        match bound_ty {
            Type::Float => format!(
                "for (var {id}: f32 = 0.0; {id} < {bound}; {id} += 1.0) {{\n{body}\n}}"
            ),
            Type::Vec2 => format!(
                "for (var {id}: vec2f = vec2f(0.0); {id}.x < {bound}.x && {id}.y < {bound}.y; {id} += vec2f(1.0)) {{\n{body}\n}}"
            ),
            Type::Vec3 => format!(
                "for (var {id}: vec3f = vec3f(0.0); {id}.x < {bound}.x && {id}.y < {bound}.y && {id}.z < {bound}.z; {id} += vec3f(1.0)) {{\n{body}\n}}"
            ),
            _ => format!("for (var {id}: i32 = 0; {id} < {bound}; {id}++) {{\n{body}\n}}"),
        }
    }

    fn switch(&self, value: &str, cases: &[(Vec<String>, String)], default: Option<&str>) -> String {
        let mut text = format!("switch ({value}) {{\n");
        for (selectors, body) in cases {
            text.push_str(&format!("case {}: {{\n{body}\n}}\n", selectors.join(", ")));
        }
        // WGSL requires a default clause.
        text.push_str(&format!("default: {{\n{}\n}}\n", default.unwrap_or_default()));
        text.push('}');
        text
    }

    fn uniform_head(&self, id: &str, ty: &Type, slot: Binding) -> String {
        format!(
            "@group({}) @binding({}) var<uniform> {id}: {};",
            slot.group,
            slot.binding,
            self.type_name(ty)
        )
    }

    fn texture_head(&self, id: &str, slot: Binding) -> String {
        format!(
            "@group({g}) @binding({b}) var {id}Sampler: sampler;\n@group({g}) @binding({t}) var {id}: texture_2d<f32>;",
            g = slot.group,
            b = slot.binding,
            t = slot.binding + 1
        )
    }

    fn constant_head(&self, id: &str, ty: &Type, value: &str) -> String {
        format!("const {id}: {} = {value};", self.type_name(ty))
    }

    fn storage_head(&self, _ctx: &mut NodeContext, id: &str, ty: &Type, slot: Binding) -> String {
        format!(
            "@group({}) @binding({}) var<storage, read_write> {id}: array<{}>;",
            slot.group,
            slot.binding,
            self.type_name(ty)
        )
    }

    fn struct_head(&self, id: &str, fields: &[(String, Type)]) -> String {
        let lines: Vec<String> = fields
            .iter()
            .map(|(name, ty)| format!("{name}: {},", self.type_name(ty)))
            .collect();
        format!("struct {id} {{\n  {}\n}}", lines.join("\n  "))
    }

    fn struct_instance(&self, id: &str, instance: &str, args: Option<&[String]>) -> String {
        match args {
            Some(args) => format!("var {instance}: {id} = {id}({});", args.join(", ")),
            None => format!("var {instance}: {id};"),
        }
    }

    fn define_head(&self, id: &str, params: &[(String, Type)], returns: &Type, body: &str) -> String {
        let params: Vec<String> = params
            .iter()
            .map(|(name, ty)| format!("{name}: {}", self.type_name(ty)))
            .collect();
        let signature = match returns {
            Type::Void => format!("fn {id}({}) {{", params.join(", ")),
            ty => format!("fn {id}({}) -> {} {{", params.join(", "), self.type_name(ty)),
        };
        let mut lines = vec![signature];
        if !body.is_empty() {
            lines.push(body.to_string());
        }
        lines.push("}".to_string());
        lines.join("\n")
    }

    fn attribute_field(&self, id: &str, ty: &Type, location: u32) -> String {
        format!("@location({location}) {id}: {}", self.type_name(ty))
    }

    fn attribute_ref(&self, id: &str) -> String {
        format!("in.{id}")
    }

    fn varying_field(&self, id: &str, ty: &Type, location: usize) -> String {
        format!("@location({location}) {id}: {}", self.type_name(ty))
    }

    fn varying_ref(&self, id: &str) -> String {
        format!("out.{id}")
    }

    /// Builtins become fields of the stage input struct. The fragment entry point receives
    /// its inputs as `out: Out`, so fragment builtins are read through `out`.
    fn builtin(&self, ctx: &mut NodeContext, id: &str, ty: &Type) -> Result<String> {
        if id == "position" {
            return Ok("out.position".to_string());
        }
        let field = format!("@builtin({id}) {id}: {}", self.type_name(ty));
        ctx.stage_inputs().set(id, field);
        Ok(match ctx.stage {
            Stage::Fragment => format!("out.{id}"),
            _ => format!("in.{id}"),
        })
    }

    fn gather(&self, _ctx: &NodeContext, storage: &str, index: &str, _ty: &Type) -> Result<String> {
        Ok(format!("{storage}[{index}]"))
    }

    fn scatter(&self, storage: &str, index: &str, value: &str, _ty: &Type) -> Result<String> {
        Ok(format!("{storage}[{index}] = {value};"))
    }

    fn fragment(&self, ctx: &NodeContext, parts: &StageParts) -> String {
        let mut out = Vec::new();
        if !ctx.frag_inputs.is_empty() {
            out.push(interface_struct("Out", &ctx.frag_inputs));
        }
        out.push(parts.head.clone());
        out.push("@fragment".to_string());
        out.push("fn main(out: Out) -> @location(0) vec4f {".to_string());
        out.push(indent(&parts.lines));
        if let Some(result) = &parts.result {
            out.push(format!("  return {result};"));
        }
        out.push("}".to_string());
        finish(out)
    }

    fn vertex(&self, ctx: &NodeContext, parts: &StageParts) -> String {
        let mut out = Vec::new();
        if !ctx.vert_inputs.is_empty() {
            out.push(interface_struct("In", &ctx.vert_inputs));
        }
        if !ctx.vert_outputs.is_empty() {
            out.push(interface_struct("Out", &ctx.vert_outputs));
        }
        out.push(parts.head.clone());
        out.push("@vertex".to_string());
        let input = if ctx.vert_inputs.is_empty() { "" } else { "in: In" };
        out.push(format!("fn main({input}) -> Out {{"));
        out.push("  var out: Out;".to_string());
        out.push(indent(&parts.lines));
        if let Some(result) = &parts.result {
            out.push(format!("  out.position = {result};"));
        }
        for (id, value) in ctx.vert_varyings.iter() {
            out.push(format!("  out.{id} = {value};"));
        }
        out.push("  return out;".to_string());
        out.push("}".to_string());
        finish(out)
    }

    fn compute(&self, ctx: &NodeContext, parts: &StageParts) -> String {
        let mut out = Vec::new();
        if !ctx.compute_inputs.is_empty() {
            out.push(interface_struct("In", &ctx.compute_inputs));
        }
        out.push(parts.head.clone());
        out.push(format!("@compute @workgroup_size({})", ctx.config.workgroup_size));
        let input = if ctx.compute_inputs.is_empty() { "" } else { "in: In" };
        out.push(format!("fn main({input}) {{"));
        out.push(indent(&parts.lines));
        if let Some(result) = &parts.result {
            out.push(format!("  {result};"));
        }
        out.push("}".to_string());
        finish(out)
    }
}
