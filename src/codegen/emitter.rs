//! The dialect seam of the code generator.
//!
//! The graph walk in [`super::code`] is shared; everything whose spelling differs between
//! GLSL and WGSL goes through one of these methods. Implementations are stateless.

use anyhow::Result;

use super::stage::StageParts;
use super::{Dialect, NodeContext};
use crate::config::Binding;
use crate::node::{MathFunction, Type};

pub trait Emitter: Sync {
    fn dialect(&self) -> Dialect;

    fn type_name(&self, ty: &Type) -> String;

    /// Zero value of a type, used for unset struct fields.
    fn zero(&self, ty: &Type) -> String {
        match ty {
            Type::Bool => "false".to_string(),
            Type::Float => "0.0".to_string(),
            Type::Int => "0".to_string(),
            Type::Uint => "0u".to_string(),
            other => format!("{}()", self.type_name(other)),
        }
    }

    fn modulo(&self, lhs: &str, rhs: &str) -> String;

    /// `cond ? yes : no`
    fn ternary(&self, cond: &str, yes: &str, no: &str) -> String;

    fn conversion(&self, ty: &Type, args: &[String]) -> String;

    /// Call of a builtin function, including per-dialect lowering of helpers with no
    /// native counterpart.
    fn function(&self, func: MathFunction, args: &[String]) -> String;

    fn declare(&self, name: &str, ty: &Type, value: &str, mutable: bool) -> String;

    fn for_loop(&self, id: &str, bound_ty: &Type, bound: &str, body: &str) -> String;

    fn switch(&self, value: &str, cases: &[(Vec<String>, String)], default: Option<&str>) -> String;

    fn uniform_head(&self, id: &str, ty: &Type, slot: Binding) -> String;

    /// `slot.binding` holds the sampler; the texture takes the next binding.
    fn texture_head(&self, id: &str, slot: Binding) -> String;

    fn constant_head(&self, id: &str, ty: &Type, value: &str) -> String;

    fn storage_head(&self, ctx: &mut NodeContext, id: &str, ty: &Type, slot: Binding) -> String;

    fn struct_head(&self, id: &str, fields: &[(String, Type)]) -> String;

    fn struct_instance(&self, id: &str, instance: &str, args: Option<&[String]>) -> String;

    fn define_head(&self, id: &str, params: &[(String, Type)], returns: &Type, body: &str) -> String;

    fn attribute_field(&self, id: &str, ty: &Type, location: u32) -> String;

    fn attribute_ref(&self, id: &str) -> String;

    fn varying_field(&self, id: &str, ty: &Type, location: usize) -> String;

    fn varying_ref(&self, id: &str) -> String;

    /// Reference to a builtin variable; may register a stage input field.
    fn builtin(&self, ctx: &mut NodeContext, id: &str, ty: &Type) -> Result<String>;

    fn gather(&self, ctx: &NodeContext, storage: &str, index: &str, ty: &Type) -> Result<String>;

    fn scatter(&self, storage: &str, index: &str, value: &str, ty: &Type) -> Result<String>;

    fn fragment(&self, ctx: &NodeContext, parts: &StageParts) -> String;

    fn vertex(&self, ctx: &NodeContext, parts: &StageParts) -> String;

    fn compute(&self, ctx: &NodeContext, parts: &StageParts) -> String;
}
