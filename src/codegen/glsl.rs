//! GLSL ES 3.00 (WebGL2) spelling.

use anyhow::{Result, bail};

use super::emitter::Emitter;
use super::stage::{StageParts, finish, indent};
use super::{Dialect, NodeContext, Stage};
use crate::config::Binding;
use crate::error::NodeError;
use crate::node::consts::glsl_builtin;
use crate::node::{MathFunction, ScalarKind, Type};
use crate::utils::storage_size;

const PRECISION: &str = "precision highp float;\nprecision highp int;";

pub struct GlslEmitter;

fn arg(args: &[String], i: usize) -> &str {
    args.get(i).map(String::as_str).unwrap_or("0.0")
}

impl Emitter for GlslEmitter {
    fn dialect(&self) -> Dialect {
        Dialect::Glsl
    }

    fn type_name(&self, ty: &Type) -> String {
        match ty {
            Type::Texture => "sampler2D".to_string(),
            other => other.glsl().to_string(),
        }
    }

    fn modulo(&self, lhs: &str, rhs: &str) -> String {
        format!("mod({lhs}, {rhs})")
    }

    fn ternary(&self, cond: &str, yes: &str, no: &str) -> String {
        format!("({cond} ? {yes} : {no})")
    }

    fn conversion(&self, ty: &Type, args: &[String]) -> String {
        let name = self.type_name(ty);
        if !args.is_empty() {
            return format!("{name}({})", args.join(", "));
        }
        let zero = match ty.element() {
            Some(ScalarKind::Bool) => "false",
            Some(ScalarKind::Int) => "0",
            Some(ScalarKind::Uint) => "0u",
            Some(ScalarKind::Float) => "0.0",
            None => "",
        };
        format!("{name}({zero})")
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
            Atan2 => format!("atan({a}, {b})"),
            Pow2 => format!("pow({a}, 2.0)"),
            Pow3 => format!("pow({a}, 3.0)"),
            Pow4 => format!("pow({a}, 4.0)"),
            LengthSq => format!("dot({a}, {a})"),
            Difference => format!("abs({a} - {b})"),
            Equals => format!("({a} == {b})"),
            Luminance => format!("dot({a}, vec3(0.2126, 0.7152, 0.0722))"),
            TransformDirection => format!("normalize(({b} * vec4({a}, 0.0)).xyz)"),
            InverseSqrt => format!("inversesqrt({a})"),
            Texture | CubeTexture => format!("texture({})", args.join(", ")),
            TextureLod => format!("textureLod({})", args.join(", ")),
            TexelFetch => format!("texelFetch({a}, {b}, int({}))", arg(args, 2)),
            TextureSize => format!("textureSize({a}, int({}))", arg(args, 1)),
            other => format!("{}({})", other.name(), args.join(", ")),
        }
    }

    /// GLSL `const` needs a constant initializer, so immutable locals are plain locals too.
    fn declare(&self, name: &str, ty: &Type, value: &str, _mutable: bool) -> String {
        format!("{} {name} = {value};", self.type_name(ty))
    }

    fn for_loop(&self, id: &str, bound_ty: &Type, bound: &str, body: &str) -> String {
        match bound_ty {
            Type::Float => format!(
                "for (float {id} = 0.0; {id} < {bound}; {id} += 1.0) {{\n{body}\n}}"
            ),
            Type::Vec2 => format!(
                "for (vec2 {id} = vec2(0.0); {id}.x < {bound}.x && {id}.y < {bound}.y; {id} += vec2(1.0)) {{\n{body}\n}}"
            ),
            Type::Vec3 => format!(
                "for (vec3 {id} = vec3(0.0); {id}.x < {bound}.x && {id}.y < {bound}.y && {id}.z < {bound}.z; {id} += vec3(1.0)) {{\n{body}\n}}"
            ),
            _ => format!("for (int {id} = 0; {id} < {bound}; {id} += 1) {{\n{body}\n}}"),
        }
    }

    fn switch(&self, value: &str, cases: &[(Vec<String>, String)], default: Option<&str>) -> String {
        let mut text = format!("switch ({value}) {{\n");
        for (selectors, body) in cases {
            for selector in selectors {
                text.push_str(&format!("case {selector}:\n"));
            }
            text.push_str(&format!("{body}\nbreak;\n"));
        }
        if let Some(body) = default {
            text.push_str(&format!("default:\n{body}\nbreak;\n"));
        }
        text.push('}');
        text
    }

    fn uniform_head(&self, id: &str, ty: &Type, _slot: Binding) -> String {
        format!("uniform {} {id};", self.type_name(ty))
    }

    fn texture_head(&self, id: &str, _slot: Binding) -> String {
        format!("uniform sampler2D {id};")
    }

    fn constant_head(&self, id: &str, ty: &Type, value: &str) -> String {
        format!("const {} {id} = {value};", self.type_name(ty))
    }

    /// Storage buffers are emulated with a data texture; compute passes write the packed
    /// value to a colour attachment.
    fn storage_head(&self, ctx: &mut NodeContext, id: &str, _ty: &Type, _slot: Binding) -> String {
        let head = format!("uniform sampler2D {id};");
        if ctx.stage != Stage::Compute {
            return head;
        }
        let location = ctx.output_location(id);
        format!("{head}\nlayout(location = {location}) out vec4 _{id};")
    }

    fn struct_head(&self, id: &str, fields: &[(String, Type)]) -> String {
        let lines: Vec<String> = fields
            .iter()
            .map(|(name, ty)| format!("{} {name};", self.type_name(ty)))
            .collect();
        format!("struct {id} {{\n  {}\n}};", lines.join("\n  "))
    }

    fn struct_instance(&self, id: &str, instance: &str, args: Option<&[String]>) -> String {
        match args {
            Some(args) => format!("{id} {instance} = {id}({});", args.join(", ")),
            None => format!("{id} {instance};"),
        }
    }

    fn define_head(&self, id: &str, params: &[(String, Type)], returns: &Type, body: &str) -> String {
        let params: Vec<String> = params
            .iter()
            .map(|(name, ty)| format!("{} {name}", self.type_name(ty)))
            .collect();
        let mut lines = vec![format!(
            "{} {id}({}) {{",
            self.type_name(returns),
            params.join(", ")
        )];
        if !body.is_empty() {
            lines.push(body.to_string());
        }
        lines.push("}".to_string());
        lines.join("\n")
    }

    fn attribute_field(&self, id: &str, ty: &Type, _location: u32) -> String {
        format!("{} {id};", self.type_name(ty))
    }

    fn attribute_ref(&self, id: &str) -> String {
        id.to_string()
    }

    fn varying_field(&self, id: &str, ty: &Type, _location: usize) -> String {
        format!("{} {id};", self.type_name(ty))
    }

    fn varying_ref(&self, id: &str) -> String {
        id.to_string()
    }

    fn builtin(&self, ctx: &mut NodeContext, id: &str, _ty: &Type) -> Result<String> {
        if id == "global_invocation_id" {
            let (width, _) = storage_size(&ctx.config.particle_count);
            return Ok(format!(
                "uvec3(uint(gl_FragCoord.y) * uint({width}) + uint(gl_FragCoord.x), 0u, 0u)"
            ));
        }
        match glsl_builtin(id) {
            Some(name) => Ok(name.to_string()),
            None => Err(NodeError::NoGlslBuiltin(id.to_string()).into()),
        }
    }

    fn gather(&self, ctx: &NodeContext, storage: &str, index: &str, ty: &Type) -> Result<String> {
        let swizzle = match ty {
            Type::Float => ".x",
            Type::Vec2 => ".xy",
            Type::Vec3 => ".xyz",
            Type::Vec4 => "",
            other => bail!("unsupported storage element type {other} for texture emulation"),
        };
        let (width, _) = storage_size(&ctx.config.particle_count);
        Ok(format!(
            "texelFetch({storage}, ivec2(int({index}) % {width}, int({index}) / {width}), 0){swizzle}"
        ))
    }

    fn scatter(&self, storage: &str, _index: &str, value: &str, ty: &Type) -> Result<String> {
        Ok(match ty {
            Type::Float => format!("_{storage} = vec4({value}, 0.0, 0.0, 1.0);"),
            Type::Vec2 => format!("_{storage} = vec4({value}, 0.0, 1.0);"),
            Type::Vec3 => format!("_{storage} = vec4({value}, 1.0);"),
            Type::Vec4 => format!("_{storage} = {value};"),
            other => bail!("unsupported storage element type {other} for texture emulation"),
        })
    }

    fn fragment(&self, ctx: &NodeContext, parts: &StageParts) -> String {
        let mut out = vec![
            "#version 300 es".to_string(),
            PRECISION.to_string(),
            "out vec4 fragColor;".to_string(),
        ];
        out.extend(ctx.frag_inputs.values().map(|field| format!("in {field}")));
        out.push(parts.head.clone());
        out.push("void main() {".to_string());
        out.push(indent(&parts.lines));
        if let Some(result) = &parts.result {
            out.push(format!("  fragColor = {result};"));
        }
        out.push("}".to_string());
        finish(out)
    }

    fn vertex(&self, ctx: &NodeContext, parts: &StageParts) -> String {
        let mut out = vec!["#version 300 es".to_string()];
        out.extend(ctx.vert_inputs.values().map(|field| format!("in {field}")));
        out.extend(ctx.vert_outputs.values().map(|field| format!("out {field}")));
        out.push(parts.head.clone());
        out.push("void main() {".to_string());
        out.push(indent(&parts.lines));
        if let Some(result) = &parts.result {
            out.push(format!("  gl_Position = {result};"));
        }
        for (id, value) in ctx.vert_varyings.iter() {
            out.push(format!("  {id} = {value};"));
        }
        out.push("}".to_string());
        finish(out)
    }

    fn compute(&self, _ctx: &NodeContext, parts: &StageParts) -> String {
        let mut out = vec!["#version 300 es".to_string(), PRECISION.to_string()];
        out.push(parts.head.clone());
        out.push("void main() {".to_string());
        out.push(indent(&parts.lines));
        if let Some(result) = &parts.result {
            out.push(format!("  {result};"));
        }
        out.push("}".to_string());
        finish(out)
    }
}
