//! scenepack CLI
//!
//! Exports scene snapshots to vertex buffers, textures and a JSON manifest,
//! and inspects written vertex buffers.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use scenepack_export::logging::{init_with_config, TracingConfig};
use scenepack_export::mesh::vertex_buffer::{AttributeFlags, HEADER_SIZE, VERTEX_STRIDE};
use scenepack_export::{ExportOptions, ExportReport, Exporter, VertexBuffer};
use scenepack_scene::Scene;

/// scenepack - scene-to-asset exporter
#[derive(Parser)]
#[command(name = "scenepack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for command results
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene snapshot
    Export(ExportArgs),

    /// Decode and print a vertex-buffer file
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Scene snapshot (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Manifest file to write
    #[arg(short, long)]
    manifest: PathBuf,

    /// Directory for vertex buffers and textures (default: the manifest's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// YAML file with export options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export selected objects only
    #[arg(long)]
    selected_only: bool,

    /// Manifest indentation width
    #[arg(long)]
    indent: Option<usize>,

    /// Skip writing texture files
    #[arg(long)]
    no_textures: bool,
}

#[derive(Args)]
struct InspectArgs {
    /// Vertex-buffer file
    path: PathBuf,

    /// Number of vertices to print
    #[arg(long, default_value = "0")]
    vertices: usize,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    init_with_config(TracingConfig {
        default_level: level.to_string(),
        show_target: verbosity >= 2,
        show_thread_ids: verbosity >= 3,
        show_file: verbosity >= 3,
        show_line_number: verbosity >= 3,
    });
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

fn load_options(args: &ExportArgs) -> Result<ExportOptions> {
    let mut options = match &args.config {
        Some(path) => ExportOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => ExportOptions::default(),
    };

    // Flags override the config file
    if args.selected_only {
        options.selected_only = true;
    }
    if let Some(indent) = args.indent {
        options.indent = indent;
    }
    if args.no_textures {
        options.write_textures = false;
    }
    Ok(options)
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    if !args.scene.exists() {
        bail!("Scene not found: {:?}", args.scene);
    }

    let options = load_options(&args)?;
    debug!(?options, "Export options");

    let scene = Scene::from_json_file(&args.scene)
        .with_context(|| format!("Failed to load scene {:?}", args.scene))?;
    info!(
        objects = scene.objects.len(),
        meshes = scene.meshes.len(),
        materials = scene.materials.len(),
        "Scene loaded"
    );

    let exporter = Exporter::new(options);
    let report = match &args.output_dir {
        Some(dir) => exporter.export_to(&scene, &args.manifest, dir),
        None => exporter.export(&scene, &args.manifest),
    }
    .with_context(|| format!("Export to {:?} failed", args.manifest))?;

    print_report(&report, format)?;

    if !report.is_clean() {
        warn!("Export finished with asset failures");
    }
    Ok(())
}

fn print_report(report: &ExportReport, format: OutputFormat) -> Result<()> {
    let summary = report.summary();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!("Manifest: {}", summary.manifest);
            println!("  Output directory:  {}", summary.output_dir);
            println!("  Lights:            {}", summary.lights);
            println!("  Mesh instances:    {}", summary.mesh_instances);
            println!(
                "  Meshes written:    {}/{}",
                summary.meshes_written,
                report.mesh_results.len()
            );
            println!("  Materials:         {}", summary.materials);
            println!(
                "  Textures written:  {}/{}",
                summary.textures_written,
                report.texture_results.len()
            );
            println!("  Elapsed:           {} ms", summary.elapsed_ms);

            if !summary.skipped.is_empty() {
                println!("\nSkipped:");
                for line in &summary.skipped {
                    println!("  {}", line);
                }
            }
            if !summary.failures.is_empty() {
                println!("\nFailures:");
                for line in &summary.failures {
                    println!("  {}", line);
                }
            }
        }
    }

    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let path = &args.path;
    if !path.exists() {
        bail!("File not found: {:?}", path);
    }

    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let buffer = VertexBuffer::from_bytes(&bytes)
        .with_context(|| format!("Failed to decode {:?}", path))?;

    let attributes: Vec<&str> = [
        (AttributeFlags::POSITION, "position"),
        (AttributeFlags::UV, "uv"),
        (AttributeFlags::NORMAL, "normal"),
        (AttributeFlags::TANGENT, "tangent"),
    ]
    .into_iter()
    .filter(|(flag, _)| buffer.flags.contains(*flag))
    .map(|(_, name)| name)
    .collect();
    let shown = &buffer.vertices[..args.vertices.min(buffer.vertex_count())];

    match format {
        OutputFormat::Json => {
            let vertices: Vec<_> = shown
                .iter()
                .map(|v| {
                    serde_json::json!({
                        "position": v.position,
                        "uv": v.uv,
                        "normal": v.normal,
                        "tangent": v.tangent,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "path": path,
                "size": bytes.len(),
                "flags": buffer.flags.bits(),
                "attributes": attributes,
                "vertex_count": buffer.vertex_count(),
                "triangle_count": buffer.triangle_count(),
                "vertices": vertices,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Vertex buffer: {:?}", path);
            println!("  Size:        {}", format_size(bytes.len() as u64));
            println!("  Flags:       0b{:05b} ({})", buffer.flags.bits(), attributes.join(", "));
            println!("  Vertices:    {}", buffer.vertex_count());
            println!("  Triangles:   {}", buffer.triangle_count());
            println!("  Layout:      {} byte header, {} bytes per vertex", HEADER_SIZE, VERTEX_STRIDE);

            if !shown.is_empty() {
                println!("\n{:>6}  {:<28} {:<18} {:<28} tangent", "#", "position", "uv", "normal");
                for (i, v) in shown.iter().enumerate() {
                    println!(
                        "{:>6}  {:<28} {:<18} {:<28} {}",
                        i,
                        fmt_floats(&v.position),
                        fmt_floats(&v.uv),
                        fmt_floats(&v.normal),
                        fmt_floats(&v.tangent)
                    );
                }
            }
        }
    }

    Ok(())
}

fn fmt_floats(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{:.3}", v)).collect();
    format!("[{}]", parts.join(", "))
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
