use anyhow::{Context, Result};
use clap::Parser;
use geomap_app::{MapController, ToggleOutcome};
use geomap_project::{Project, SETTINGS_FILE_NAME, default_settings_path};
use geomap_render::{MapView, RecordingCanvas};
use geomap_source::HttpDataSource;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless map driver", long_about = None)]
struct Args {
    /// Settings file (defaults to the per-user config directory)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Backend base URL, overriding the settings file
    #[arg(short, long)]
    backend: Option<String>,

    /// Project to select
    #[arg(short, long)]
    project: Option<String>,

    /// Layer to toggle on (repeatable)
    #[arg(short, long = "layer")]
    layers: Vec<String>,

    /// List projects and exit
    #[arg(long)]
    list: bool,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    write_settings: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let settings_path = args
        .settings
        .clone()
        .or_else(default_settings_path)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));
    let mut project = Project::open(settings_path)?;
    tracing::info!("Using settings at {}", project.path.display());
    if let Some(base_url) = &args.backend {
        project.settings.backend.base_url = base_url.clone();
    }
    if args.write_settings {
        project.save()?;
        println!("Wrote settings to {}", project.path.display());
    }
    let settings = &project.settings;

    let source = HttpDataSource::new(
        &settings.backend.base_url,
        Duration::from_secs(settings.backend.timeout_secs),
    )
    .context("Failed to set up backend client")?;

    let mut view = MapView::new(RecordingCanvas::new(), settings.view_config());
    view.init_view(settings.initial_view.center, settings.initial_view.zoom);
    let controller = MapController::new(view, source);

    if !settings.scene.is_empty() {
        let summary = controller.load_scene(&settings.scene)?;
        println!("Scene: {:?}", summary);
    }

    if args.list || args.project.is_none() {
        let projects = controller.list_projects().await?;
        println!("{} projects at {}", projects.len(), settings.backend.base_url);
        for info in projects {
            println!("  {}\t{}", info.id, info.name);
        }
        if args.list {
            return Ok(());
        }
    }

    if let Some(project_id) = &args.project {
        let layers = controller.select_project(project_id).await?;
        println!("Project {}: {} layers", project_id, layers.len());
        for layer in &layers {
            println!("  {}\t{:?}\t{}", layer.id, layer.data_kind, layer.name);
        }

        for layer_id in &args.layers {
            match controller.toggle_layer(layer_id, true).await {
                Ok(ToggleOutcome::Applied { category, placed }) => {
                    println!("Layer {}: {} primitives in {}", layer_id, placed, category)
                }
                Ok(ToggleOutcome::Ignored) => {
                    println!("Layer {}: unsupported data kind, skipped", layer_id)
                }
                Ok(other) => println!("Layer {}: {:?}", layer_id, other),
                Err(err) => eprintln!("Layer {}: {}", layer_id, err),
            }
        }
    }

    controller.with_view(|view| {
        let canvas = view.canvas();
        println!("Canvas holds {} primitives", canvas.primitive_count());
        for (kind, count) in canvas.count_by_kind() {
            println!("  {:<14}{}", kind, count);
        }
        if let Some(viewport) = canvas.viewport() {
            println!("Viewport: {} at zoom {}", viewport.center, viewport.zoom);
        }
    });
    if let Some(base) = settings.selected_base_layer() {
        println!("Base layer: {}", base.name);
    }

    controller.teardown();
    Ok(())
}
