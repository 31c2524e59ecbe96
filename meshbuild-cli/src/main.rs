//! meshbuild: ball pivoting surface reconstruction from the command line.
//!
//! Reads an oriented point cloud (PLY with normals or faces, or XYZN text),
//! runs one ball pivoting pass per radius and writes the mesh as PLY.
//!
//! # Example
//!
//! ```bash
//! # Two passes, the larger radius fills holes left by the smaller one
//! meshbuild bunny.ply bunny_mesh.ply 1000 0.002 0.004
//!
//! # Machine-readable pass reports plus a topology/empty-ball audit
//! meshbuild scan.xyzn mesh.ply 5000 0.1 --format json --audit
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meshbuild_reconstruction::{BallPivoting, BallPivotingConfig, FaceWinding};

mod output;

/// meshbuild - reconstruct a triangle mesh from an oriented point cloud.
#[derive(Parser, Debug)]
#[command(name = "meshbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input point cloud (.ply, .xyz, .xyzn or .txt)
    input: PathBuf,

    /// Output mesh (.ply)
    output: PathBuf,

    /// Maximum number of seed triangles per radius
    max_iters: usize,

    /// Ball radii, processed in the given order
    #[arg(required = true, num_args = 1..)]
    radii: Vec<f64>,

    /// Winding of the written faces relative to the point normals
    #[arg(long, default_value = "ccw")]
    winding: Winding,

    /// Output format for results
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Check the result for topology, empty-ball and winding violations
    #[arg(long)]
    audit: bool,

    /// Suppress logging and the progress bar
    #[arg(long, short)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Winding {
    /// Counter-clockwise seen from the side the normals point to
    Ccw,
    /// Clockwise seen from the side the normals point to
    Cw,
}

impl From<Winding> for FaceWinding {
    fn from(winding: Winding) -> Self {
        match winding {
            Winding::Ccw => FaceWinding::CounterClockwise,
            Winding::Cw => FaceWinding::Clockwise,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Progress bar and one line per radius
    Text,
    /// JSON pass reports for scripting
    Json,
}

impl Cli {
    fn config(&self) -> BallPivotingConfig {
        BallPivotingConfig::default()
            .with_radii(self.radii.clone())
            .with_max_iterations(self.max_iters)
            .with_output_winding(self.winding.into())
    }

    fn shows_progress(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}

/// Initialize the tracing subscriber from the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let level = match verbose {
        0 => "warn",
        1 => "meshbuild_reconstruction=info,meshbuild_io=info,meshbuild=info",
        2 => "meshbuild_reconstruction=debug,meshbuild_io=debug,meshbuild=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config();

    let cloud = meshbuild_io::read_oriented_cloud(&cli.input)
        .with_context(|| format!("Failed to read point cloud from {}", cli.input.display()))?;

    let mut bpa = BallPivoting::new(&cloud, config).context("Invalid reconstruction input")?;
    if cli.shows_progress() {
        bpa = bpa.with_progress(output::progress_bar());
    }

    let mut reports = Vec::with_capacity(cli.radii.len());
    for &radius in &cli.radii {
        let report = bpa
            .run_pass(radius)
            .with_context(|| format!("Ball pivoting failed at rho={}", radius))?;
        if cli.format == OutputFormat::Text {
            if cli.shows_progress() {
                println!();
            }
            output::print_pass(&report);
        }
        reports.push(report);
    }

    let audit = cli.audit.then(|| bpa.audit());
    match cli.format {
        OutputFormat::Text => {
            if let Some(summary) = &audit {
                output::print_audit(summary);
            }
        }
        OutputFormat::Json => println!("{}", output::to_json(&reports, audit.as_ref())?),
    }

    let mesh = bpa.to_triangle_mesh();
    meshbuild_io::write_mesh(&mesh, &cli.output)
        .with_context(|| format!("Failed to write mesh to {}", cli.output.display()))?;
    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        path = %cli.output.display(),
        "Mesh written"
    );

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {}", cause);
        }
        std::process::exit(1);
    }

    Ok(())
}
