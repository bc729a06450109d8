//! Hard failures raised while building or emitting a shader graph.
//!
//! Soft failures (operand type disagreement and the like) never surface here: they are
//! logged and collected on the [`NodeContext`](crate::codegen::NodeContext) instead.

/// Errors that abort the current build.
///
/// Functions across the crate return `anyhow::Result`; callers that need to branch on the
/// failure kind can `downcast_ref::<NodeError>()` the error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("unknown builtin variable `{0}`")]
    UnknownBuiltin(String),

    #[error("builtin variable `{0}` has no GLSL equivalent")]
    NoGlslBuiltin(String),

    #[error("`{0}` needs an active scope (call it inside a Fn, If, Loop or Switch body)")]
    NoActiveScope(&'static str),

    #[error("cannot assign to a `{0}` node")]
    NotAssignable(&'static str),

    #[error("cyclic header dependency: {}", .0.join(" -> "))]
    CyclicHeaders(Vec<String>),

    #[error("function `{0}` is referenced from its own body")]
    RecursiveFunction(String),

    #[error("struct `{0}` is used as a field type but never declared")]
    UndeclaredStruct(String),
}
