//! Stage assemblers: wrap rendered body and ordered headers in entry-point boilerplate.

use anyhow::Result;
use log::debug;

use super::{
    NodeContext, Stage, code, code_node, complete_struct_headers, emit_varying_values,
};
use crate::node::{Node, NodeKind};

/// Rendered pieces of one stage, before dialect boilerplate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageParts {
    /// Ordered header declarations.
    pub head: String,
    /// Body statements.
    pub lines: String,
    /// Stage result expression (`fragColor`, `gl_Position`, …).
    pub result: Option<String>,
}

pub(crate) fn indent(text: &str) -> String {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn finish(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Render the root. A scope root's trailing `return` becomes the stage result; any other
/// root is itself the result.
fn build(root: &Node, ctx: &mut NodeContext) -> Result<StageParts> {
    let (lines, result) = match root.kind() {
        NodeKind::Scope { statements } => {
            let (body, result) = match statements.split_last() {
                Some((last, body)) => match last.kind() {
                    NodeKind::Return { value: Some(value) } => (body, Some(value)),
                    _ => (statements.as_slice(), None),
                },
                None => (statements.as_slice(), None),
            };
            let mut lines = Vec::with_capacity(body.len());
            for statement in body {
                let line = code_node(statement, ctx)?;
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            let result = result.map(|value| code(value, ctx)).transpose()?;
            (lines.join("\n"), result)
        }
        _ => (String::new(), Some(code_node(root, ctx)?)),
    };
    if ctx.stage == Stage::Vertex {
        emit_varying_values(ctx)?;
    }
    complete_struct_headers(ctx)?;
    let head = ctx.headers.sorted()?.join("\n");
    Ok(StageParts {
        head,
        lines,
        result,
    })
}

fn assemble(root: &Node, ctx: &mut NodeContext, stage: Stage) -> Result<String> {
    ctx.headers.clear();
    ctx.reset_stage_outputs();
    ctx.stage = stage;
    let parts = build(root, ctx)?;
    let e = ctx.emitter();
    let program = match stage {
        Stage::Fragment => e.fragment(ctx, &parts),
        Stage::Vertex => e.vertex(ctx, &parts),
        Stage::Compute => e.compute(ctx, &parts),
    };
    if ctx.config.debug {
        debug!("generated {} {} program:\n{program}", ctx.dialect, stage.label());
    }
    Ok(program)
}

/// Complete fragment program for `root`.
pub fn fragment(root: &Node, ctx: &mut NodeContext) -> Result<String> {
    assemble(root, ctx, Stage::Fragment)
}

/// Complete vertex program; `root` yields the clip-space position.
pub fn vertex(root: &Node, ctx: &mut NodeContext) -> Result<String> {
    assemble(root, ctx, Stage::Vertex)
}

pub fn compute(root: &Node, ctx: &mut NodeContext) -> Result<String> {
    assemble(root, ctx, Stage::Compute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_skips_blank_lines() {
        assert_eq!(indent("a;\n\nb;"), "  a;\n  b;");
        assert_eq!(indent(""), "");
    }

    #[test]
    fn finish_drops_empty_parts() {
        let text = finish(vec!["a".into(), String::new(), "b".into()]);
        assert_eq!(text, "a\nb");
    }
}
