//! Shader node graphs compiled to GLSL ES 3.00 and WGSL.
//!
//! Graphs are built from the free constructors in [`node::factory`], the fluent
//! [`node::ops::NodeOps`] methods and a [`scope::Builder`] session for statements. The
//! stage assemblers in [`codegen`] turn a root node into a complete program.

pub mod codegen;
pub mod config;
pub mod error;
pub mod infer;
pub mod node;
pub mod scope;
pub mod utils;
pub mod validation;

/// Everything needed to build and compile a graph.
pub mod prelude {
    pub use crate::codegen::{Dialect, NodeContext, Stage, compute, fragment, vertex};
    pub use crate::config::{BuildConfig, ParticleCount};
    pub use crate::error::NodeError;
    pub use crate::node::factory::*;
    pub use crate::node::ops::NodeOps;
    pub use crate::node::{
        Child, FnInput, FnLayout, LayoutType, Node, NodeKind, ResourceSink, Type, UniformValue,
    };
    pub use crate::scope::{Builder, FnDef, StructDef};
}
