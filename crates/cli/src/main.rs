use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use qstr::geometry::{NullSink, ShapeSink, SvgSink};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;
mod scene;

use scene::Scene;

#[derive(Parser)]
#[command(name = "qstr-cli")]
#[command(about = "Evaluate spatial scenes with the qstr engine")]
struct Cmd {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Evaluate a scene file; print or write the shape/relation report
    Eval {
        #[arg(long)]
        scene: PathBuf,
        /// Report path; a provenance sidecar is written next to it
        #[arg(long)]
        out: Option<PathBuf>,
        /// Directory for SVG exports of `draw` terms
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    match cmd.action {
        Action::Eval { scene, out, export } => eval(&scene, out.as_deref(), export.as_deref()),
        Action::Report => report(),
    }
}

fn eval(scene_path: &Path, out: Option<&Path>, export: Option<&Path>) -> Result<()> {
    tracing::info!(scene = %scene_path.display(), "eval");
    let scene = Scene::load(scene_path)?;
    let sink: Box<dyn ShapeSink> = match export {
        Some(dir) => Box::new(SvgSink::new(dir)),
        None => Box::new(NullSink),
    };
    let report = scene.evaluate(sink.as_ref())?;
    tracing::info!(
        objects = report.objects.len(),
        relations = report.relations.len(),
        "evaluated"
    );

    let Some(out) = out else {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating report dir {}", parent.display()))?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("writing {}", out.display()))?;

    let payload = provenance::Payload::new(serde_json::json!({
        "terms": scene.terms.len(),
        "relations": scene.relations.len(),
        "export": export.map(|p| p.to_string_lossy().into_owned()),
    }))
    .input(scene_path)?;
    let sidecar = provenance::write_sidecar(out, payload)?;
    tracing::info!(report = %out.display(), sidecar = %sidecar.display(), "written");
    Ok(())
}

fn report() -> Result<()> {
    let obj = serde_json::json!({
        "code_rev": provenance::code_rev(),
        "engine_version": qstr::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
