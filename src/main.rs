use std::path::PathBuf;

use anyhow::{Result, anyhow};
use log::{Level, LevelFilter, Log, Metadata, Record};

use node_forge_shader::config::load_config_from_path;
use node_forge_shader::prelude::*;
use node_forge_shader::validation::validate_stage;

#[derive(Debug, Clone)]
struct Cli {
    dialect: Dialect,
    stages: Vec<Stage>,
    config: Option<PathBuf>,
    validate: bool,
    verbose: bool,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            dialect: Dialect::Wgsl,
            stages: vec![Stage::Fragment, Stage::Vertex, Stage::Compute],
            config: None,
            validate: false,
            verbose: false,
        }
    }
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--dialect" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --dialect"));
                };
                cli.dialect = v.parse()?;
                i += 2;
            }
            "--stage" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --stage"));
                };
                cli.stages = match v.as_str() {
                    "all" => Cli::default().stages,
                    // Varyings are collected from the fragment graph.
                    "vertex" | "vert" => vec![Stage::Fragment, Stage::Vertex],
                    other => vec![other.parse()?],
                };
                i += 2;
            }
            "--config" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --config"));
                };
                cli.config = Some(PathBuf::from(v));
                i += 2;
            }
            "--validate" => {
                cli.validate = true;
                i += 1;
            }
            "--verbose" | "-v" => {
                cli.verbose = true;
                i += 1;
            }
            other => {
                return Err(anyhow!(
                    "unknown argument: {other} (supported: --dialect <glsl|wgsl>, --stage <vertex|fragment|compute|all>, --config <build.json>, --validate, --verbose)"
                ));
            }
        }
    }
    Ok(cli)
}

/// Prints log records the way the rest of the binary reports progress.
struct CliLogger;

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug | Level::Trace => "debug",
        };
        eprintln!("[{tag}] {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: CliLogger = CliLogger;

/// Built-in demo: a gradient quad with a pulsing blue channel and a particle update pass.
struct Demo {
    vertex: Node,
    fragment: Node,
    compute: Node,
}

fn build_demo(b: &mut Builder) -> Result<Demo> {
    let positions = b.attribute(
        vec![-1.0f32, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0],
        Some("positions"),
    );
    let v_uv = b.varying(positions.mul(0.5).add(0.5), Some("vUv"));

    let vertex = b.scope(|_| Ok(Some(vec4((positions.clone(), 0.0, 1.0)))))?;
    let pulse = b.func_named("pulse", |_, p| {
        Ok(Some(sin(p[0].mul(3.0)).mul(0.5).add(0.5)))
    });
    let fragment = b.scope(|b| {
        let uv = b.to_var(&v_uv, Some("uv"))?;
        let blue = pulse.call(b, i_time())?;
        let tint = b.to_var(vec3((uv.x(), uv.y(), blue)), Some("tint"))?;
        b.if_(uv.x().greater_than(0.5), |b| {
            tint.mul_assign(b, 0.8)?;
            Ok(())
        })?;
        Ok(Some(vec4((tint.clone(), 1.0))))
    })?;

    let particles = b.storage(vec4(0.0), Some("particles"));
    let compute = b.scope(|b| {
        let id = b.to_const(global_invocation_id().x(), Some("id"))?;
        let p = b.to_var(particles.element(&id), Some("p"))?;
        b.assign(&particles.element(&id), p.add(vec4((0.0, 0.01, 0.0, 0.0))))?;
        Ok(None)
    })?;

    Ok(Demo {
        vertex,
        fragment,
        compute,
    })
}

fn main() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(level))
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;

    let config = match cli.config.as_deref() {
        Some(path) => load_config_from_path(path)?,
        None => BuildConfig {
            vertex_count: Some(6),
            ..BuildConfig::default()
        },
    };

    let mut builder = Builder::new();
    let demo = build_demo(&mut builder)?;
    let mut ctx = NodeContext::with_config(cli.dialect, config);

    for stage in &cli.stages {
        let root = match stage {
            Stage::Vertex => &demo.vertex,
            Stage::Fragment => &demo.fragment,
            Stage::Compute => &demo.compute,
        };
        let program = match stage {
            Stage::Vertex => vertex(root, &mut ctx)?,
            Stage::Fragment => fragment(root, &mut ctx)?,
            Stage::Compute => compute(root, &mut ctx)?,
        };
        if cli.validate {
            match cli.dialect {
                Dialect::Wgsl => {
                    validate_stage(&program, *stage)?;
                    eprintln!("[validate] {} stage ok", stage.label());
                }
                Dialect::Glsl => {
                    eprintln!("[validate] skipped {} stage: only WGSL is validated", stage.label())
                }
            }
        }
        println!("// {} {}\n{program}\n", cli.dialect, stage.label());
    }

    if !ctx.warnings().is_empty() {
        eprintln!("[build] {} warning(s)", ctx.warnings().len());
    }
    Ok(())
}
