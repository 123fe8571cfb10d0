use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

use statusboard::config::Config;
use statusboard::logging::init_logging;
use statusboard::page::refresh;
use statusboard::render::PageRenderer;
use statusboard::status::HttpStatusSource;
use statusboard::version::VERSION;
use statusboard::web::{AppState, create_axum_router};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about = "Renders a service status page from the status API", long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one page load and write the result
    Render {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,
    },
    /// Serve the status page over HTTP, rebuilding it on every request
    Serve {
        /// Overrides `bind_address` from the configuration
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Complete HTML document
    Html,
    /// JSON list of element patches
    Patches,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };

    if let Err(e) = init_logging(&config.log_dir) {
        eprintln!("Failed to initialize logging: {e}");
        return Err(e.into());
    }
    info!("Starting statusboard, version: {}", VERSION);

    let source = Arc::new(HttpStatusSource::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);
    let renderer = Arc::new(PageRenderer::new()?);

    let result = match args.command {
        Command::Render { output, format } => {
            run_render(&config, source, renderer, output, format).await
        }
        Command::Serve { bind } => run_serve(&config, source, renderer, bind).await,
    };

    if let Err(e) = &result {
        error!(error = %e, "statusboard exited with an error.");
    }
    result
}

async fn run_render(
    config: &Config,
    source: Arc<HttpStatusSource>,
    renderer: Arc<PageRenderer>,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), BoxError> {
    let page = refresh(source.as_ref(), &config.display_settings()).await?;
    let rendered = match format {
        OutputFormat::Html => renderer.render_document(&page),
        OutputFormat::Patches => renderer.render_patches_json(&page),
    }?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, rendered.as_bytes()).await?;
            info!(path = %path.display(), "Wrote status page.");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn run_serve(
    config: &Config,
    source: Arc<HttpStatusSource>,
    renderer: Arc<PageRenderer>,
    bind: Option<std::net::SocketAddr>,
) -> Result<(), BoxError> {
    let app = create_axum_router(AppState {
        source,
        renderer,
        settings: Arc::new(config.display_settings()),
    });

    let addr = bind.unwrap_or(config.bind_address);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
