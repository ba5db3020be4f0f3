use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use viewport_common::ViewportSize;
use viewport_render::{DebugTextTarget, PerspectiveCamera, ProjectionCamera};
use viewport_sync::{HeadlessWindow, HostComponent, SyncConfig, bind_resize_sync};

#[derive(Parser)]
#[command(name = "viewport-cli", about = "Replay window resizes through the viewport pipeline")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file with resize pipeline settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective settings
    Info,
    /// Fire a sequence of resize events at a headless window
    Replay {
        /// Resize steps as WIDTHxHEIGHT or WIDTHxHEIGHT@RATIO
        #[arg(required = true)]
        steps: Vec<String>,
        /// Initial window size as WIDTHxHEIGHT
        #[arg(long, default_value = "800x600")]
        initial: String,
        /// Initial device pixel ratio
        #[arg(long, default_value = "1")]
        ratio: f64,
        /// Unmount the host after this many steps
        #[arg(long)]
        detach_after: Option<usize>,
        /// Print one JSON object per step instead of text
        #[arg(long)]
        json: bool,
    },
}

/// One parsed resize step.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Step {
    width: f64,
    height: f64,
    ratio: Option<f64>,
}

fn parse_step(text: &str) -> anyhow::Result<Step> {
    let (dims, ratio) = match text.split_once('@') {
        Some((dims, ratio)) => (
            dims,
            Some(
                ratio
                    .parse::<f64>()
                    .with_context(|| format!("bad pixel ratio in {text:?}"))?,
            ),
        ),
        None => (text, None),
    };
    let Some((w, h)) = dims.split_once(['x', 'X']) else {
        bail!("expected WIDTHxHEIGHT, got {text:?}");
    };
    let width = w
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad width in {text:?}"))?;
    let height = h
        .trim()
        .parse::<f64>()
        .with_context(|| format!("bad height in {text:?}"))?;
    Ok(Step {
        width,
        height,
        ratio,
    })
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: usize,
    attached: bool,
    size: ViewportSize,
    aspect: f64,
    output: (f64, f64),
    pixel_density: f64,
}

fn replay(
    config: SyncConfig,
    initial: Step,
    ratio: f64,
    steps: &[Step],
    detach_after: Option<usize>,
) -> anyhow::Result<Vec<StepReport>> {
    let window = Rc::new(HeadlessWindow::new(initial.width, initial.height, ratio));
    let size = ViewportSize::new(initial.width, initial.height).shared();
    let camera = Rc::new(RefCell::new(PerspectiveCamera::default()));
    let target = Rc::new(RefCell::new(DebugTextTarget::new()));

    let mut host = HostComponent::new("replay");
    bind_resize_sync(
        &mut host,
        window.clone(),
        size.clone(),
        camera.clone(),
        target.clone(),
        config,
    );
    host.mount()?;

    let mut reports = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        if detach_after == Some(i) {
            host.unmount();
        }
        if let Some(ratio) = step.ratio {
            window.set_device_pixel_ratio(ratio);
        }
        window.resize_to(step.width, step.height)?;

        let target = target.borrow();
        reports.push(StepReport {
            step: i + 1,
            attached: window.listener_count() > 0,
            size: *size.borrow(),
            aspect: camera.borrow().aspect(),
            output: target.output_size(),
            pixel_density: target.pixel_density(),
        });
        tracing::debug!("{}", target.describe());
    }
    Ok(reports)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SyncConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("viewport-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("max pixel ratio: {}", config.max_pixel_ratio);
        }
        Commands::Replay {
            steps,
            initial,
            ratio,
            detach_after,
            json,
        } => {
            let initial = parse_step(&initial)?;
            let steps = steps
                .iter()
                .map(|s| parse_step(s))
                .collect::<anyhow::Result<Vec<_>>>()?;

            for report in replay(config, initial, ratio, &steps, detach_after)? {
                if json {
                    println!("{}", serde_json::to_string(&report)?);
                } else {
                    println!(
                        "[{}] {} size={:.0}x{:.0} aspect={:.4} output={:.0}x{:.0} density={}",
                        report.step,
                        if report.attached { "attached" } else { "detached" },
                        report.size.width,
                        report.size.height,
                        report.aspect,
                        report.output.0,
                        report.output.1,
                        report.pixel_density
                    );
                }
            }
        }
    }

    Ok(())
}
