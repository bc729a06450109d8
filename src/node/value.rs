//! Value-change side channel for resource nodes (uniforms, attributes, storages, textures).
//!
//! Setting a value never mutates the graph; it notifies listeners so a runtime can push the
//! new data to the GPU.

use std::sync::Arc;

use super::Child;

/// A CPU-side value bound to a resource node.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Float(f32),
    Vector(Vec<f32>),
    /// Image source of a texture uniform.
    Texture(String),
}

impl UniformValue {
    /// Bytes as laid out for upload (booleans widen to `u32`).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Bool(b) => bytemuck::bytes_of(&u32::from(*b)).to_vec(),
            UniformValue::Float(f) => bytemuck::bytes_of(f).to_vec(),
            UniformValue::Vector(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Texture(src) => src.as_bytes().to_vec(),
        }
    }

    /// Initial value carried by a raw child, if it has one.
    pub(crate) fn from_child(child: &Child) -> Option<Self> {
        match child {
            Child::Bool(b) => Some(UniformValue::Bool(*b)),
            Child::Float(f) => Some(UniformValue::Float(*f as f32)),
            Child::Array(values) => Some(UniformValue::Vector(
                values.iter().map(|v| *v as f32).collect(),
            )),
            Child::Text(src) => Some(UniformValue::Texture(src.clone())),
            Child::Node(_) => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl<const N: usize> From<[f32; N]> for UniformValue {
    fn from(v: [f32; N]) -> Self {
        UniformValue::Vector(v.to_vec())
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(v: Vec<f32>) -> Self {
        UniformValue::Vector(v)
    }
}

/// Callback invoked with every new value of a node.
pub type Listener = Arc<dyn Fn(&UniformValue) + Send + Sync>;

/// Runtime collaborator that receives resource data.
///
/// The code generator calls the matching method with the initial value when a resource is
/// first emitted, then forwards every later [`Node::set_value`](super::Node::set_value).
pub trait ResourceSink: Send + Sync {
    fn uniform(&self, id: &str, value: &UniformValue);
    fn attribute(&self, id: &str, value: &UniformValue);
    fn instance(&self, id: &str, value: &UniformValue);
    fn texture(&self, id: &str, value: &UniformValue);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_follow_gpu_layout() {
        assert_eq!(UniformValue::Float(1.0).to_bytes(), 1.0f32.to_ne_bytes().to_vec());
        assert_eq!(UniformValue::Bool(true).to_bytes(), 1u32.to_ne_bytes().to_vec());
        assert_eq!(UniformValue::from([1.0, 2.0]).to_bytes().len(), 8);
    }

    #[test]
    fn raw_children_carry_initial_values() {
        assert_eq!(
            UniformValue::from_child(&Child::Array(vec![1.0, 2.0])),
            Some(UniformValue::Vector(vec![1.0, 2.0]))
        );
        assert_eq!(UniformValue::from_child(&Child::Float(0.5)), Some(UniformValue::Float(0.5)));
    }
}
