use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use inkframe::api;
use inkframe::models::AppConfig;
use inkframe::server;
use inkframe::services::{self, Pipeline};

#[derive(Parser)]
#[command(name = "inkframe")]
#[command(about = "Photo upload server for 800x480 six-color e-paper frames")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Convert an image file once and write the artifacts
    Convert {
        /// Input image (PNG, JPEG, GIF, BMP, WebP, ...)
        input: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write preview.png
        #[arg(long)]
        preview: bool,
    },
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inkframe API",
        description = "Photo upload server for 800x480 six-color e-paper frames",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(api::handle_upload),
    components(schemas(
        api::UploadForm,
        services::ProcessOutcome,
        services::StatsDocument,
        services::artifacts::ColorEntry,
    )),
    tags(
        (name = "Upload", description = "Image upload and conversion")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert {
            input,
            output,
            preview,
        }) => run_convert_command(&input, output, preview),
        Some(Commands::Serve) => run_server().await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Run the pipeline once on a file (no server needed)
fn run_convert_command(
    input: &Path,
    output: Option<PathBuf>,
    preview: bool,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkframe=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = AppConfig::from_env();
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    let pipeline = Pipeline::from_config(&config).save_preview(preview || config.save_preview);

    let bytes = std::fs::read(input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
    let report = pipeline.process(&bytes, &output_dir)?;

    println!(
        "Converted {} -> {} (run {})",
        input.display(),
        report.binary_path.display(),
        report.run_id
    );
    for color in &report.stats.colors {
        println!(
            "  {:<7} (index {}): {:>7} pixels ({:.2}%)",
            color.name, color.index, color.count, color.percentage
        );
    }

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Read environment variables
    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();
    let output_dir = std::env::var("OUTPUT_DIR").ok();

    // Header
    println!("Inkframe v{VERSION}");
    println!("Photo upload server for 800x480 six-color e-paper frames\n");

    // Environment variables section
    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:3000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  OUTPUT_DIR  = {}",
        output_dir.as_deref().unwrap_or("(not set)")
    );

    // Effective configuration
    let config = AppConfig::from_env();
    println!("\nConfiguration:");
    println!("  Output dir:    {}", config.output_dir.display());
    println!("  Upload limit:  {} bytes", config.max_upload_bytes);
    println!("  Resize filter: {}", config.resize_filter);
    println!("  Save preview:  {}", config.save_preview);
    println!(
        "  Normalizer:    {}",
        describe_command(config.normalize_command.as_deref(), "built-in")
    );
    println!(
        "  Quantizer:     {}",
        describe_command(config.quantize_command.as_deref(), "built-in (Floyd-Steinberg)")
    );

    // Commands section
    println!("\nCommands:");
    println!("  inkframe serve            Start the HTTP server");
    println!("  inkframe convert <INPUT>  Convert an image file once");
    println!("\nRun 'inkframe --help' for more details.");
}

fn describe_command(argv: Option<&[String]>, fallback: &str) -> String {
    match argv {
        Some(argv) if !argv.is_empty() => argv.join(" "),
        _ => fallback.to_string(),
    }
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkframe=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let config = AppConfig::from_env();

    tracing::info!(
        output_dir = %config.output_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        filter = %config.resize_filter,
        save_preview = config.save_preview,
        "Configuration loaded"
    );

    // Create application state using shared server module
    let state = server::create_app_state(config)?;

    // Build router: start with shared API routes, add production-only routes
    let app = server::build_router(state)
        // OpenAPI documentation (production only)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Inkframe server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
