//! WGSL validation of generated programs using the naga library.

use anyhow::{Context, Result, anyhow, bail};

use crate::codegen::Stage;

/// Parse WGSL source with naga's front end.
///
/// Returns the parsed module, or an error that lists the numbered source.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL validation failed:\n{}", format_naga_error(source, &e)))
}

/// Like [`validate_wgsl`], naming what produced the source on failure.
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{} generated invalid WGSL", context))
}

/// Parse and fully validate one generated stage: types, bindings, and a `main` entry point
/// of the expected kind.
pub fn validate_stage(source: &str, stage: Stage) -> Result<naga::valid::ModuleInfo> {
    let module = validate_wgsl_with_context(source, stage.label())?;
    let expected = match stage {
        Stage::Fragment => naga::ShaderStage::Fragment,
        Stage::Vertex => naga::ShaderStage::Vertex,
        Stage::Compute => naga::ShaderStage::Compute,
    };
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.name == "main" && ep.stage == expected)
    {
        bail!("no {:?} entry point named main", expected);
    }
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| {
        anyhow!(
            "{} stage failed validation: {e:?}\n{}",
            stage.label(),
            numbered(source)
        )
    })
}

fn numbered(source: &str) -> String {
    let mut output = String::from("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");
    output
}

fn format_naga_error(source: &str, error: &naga::front::wgsl::ParseError) -> String {
    format!("  {}\n\nGenerated WGSL:\n{}", error, numbered(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_fragment_program() {
        let source = r#"
struct Out {
  @builtin(position) position: vec4f
}
@group(0) @binding(0) var<uniform> iTime: f32;
@fragment
fn main(out: Out) -> @location(0) vec4f {
  return vec4f(sin(iTime), out.position.x, 0.0, 1.0);
}
"#;
        assert!(validate_wgsl(source).is_ok());
        assert!(validate_stage(source, Stage::Fragment).is_ok());
    }

    #[test]
    fn rejects_syntax_errors() {
        let source = "fn invalid() -> { return vec4f(1.0); }";
        assert!(validate_wgsl(source).is_err());
    }

    #[test]
    fn rejects_the_wrong_stage() {
        let source = "@compute @workgroup_size(32)\nfn main() {\n}\n";
        assert!(validate_stage(source, Stage::Compute).is_ok());
        assert!(validate_stage(source, Stage::Fragment).is_err());
    }

    #[test]
    fn context_names_the_producer() {
        let result = validate_wgsl_with_context("invalid wgsl", "frag stage");
        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("frag stage"));
        assert!(err_msg.contains("   1 | invalid wgsl"));
    }
}
