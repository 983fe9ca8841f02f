//! docling-gateway - convert uploaded documents to Markdown and JSON.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docling_gateway::{
    config::{CheckConfig, Cli, Command, ConverterArgs, ConverterKind, ServeConfig},
    convert::{ConversionService, StagedUpload},
    converter::{DoclingCliConverter, DocumentConverter, PlainTextConverter},
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("docling-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Converter: {}", config.converter.converter);
    if config.converter.converter == ConverterKind::Docling {
        info!("  docling binary: {}", config.converter.docling_bin.display());
        if !config.converter.docling_args.is_empty() {
            info!("  docling args: {:?}", config.converter.docling_args);
        }
    }
    info!("  Temp dir: {}", config.converter.temp_root().display());
    match config.convert_timeout_secs {
        Some(secs) => info!("  Conversion timeout: {}s", secs),
        None => info!("  Conversion timeout: none"),
    }
    match config.max_upload_mb {
        Some(mb) => info!("  Upload limit: {}MB", mb),
        None => info!("  Upload limit: none"),
    }

    if config.api_key().is_some() {
        info!("  Auth: enabled (X-Docling-Key)");
    } else {
        warn!("  Auth: DISABLED - /convert is publicly accessible");
        warn!("        Enable for production: DOCLING_KEY=<secret>");
    }

    match config.converter.converter {
        ConverterKind::Docling => serve(docling_converter(&config.converter), &config).await,
        ConverterKind::Text => serve(PlainTextConverter::new(), &config).await,
    }
}

async fn serve<C>(converter: C, config: &ServeConfig) -> ExitCode
where
    C: DocumentConverter + 'static,
{
    info!("");
    info!("Probing converter '{}'...", converter.name());
    match converter.probe().await {
        Ok(version) => info!("  Converter ready: {}", version),
        Err(e) => {
            error!("  Converter is not usable: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - docling is installed (pip install docling)");
            error!("    - --docling-bin / DOCLING_BIN points at the executable");
            return ExitCode::FAILURE;
        }
    }

    let service = ConversionService::new(converter)
        .with_temp_root(config.converter.temp_root())
        .with_timeout(config.convert_timeout());

    let router = create_router(service, build_router_config(config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    if config.api_key().is_some() {
        info!(
            "    curl -H 'X-Docling-Key: <key>' -F file=@document.pdf http://{}/convert",
            addr
        );
    } else {
        info!("    curl -F file=@document.pdf http://{}/convert", addr);
    }
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

fn docling_converter(args: &ConverterArgs) -> DoclingCliConverter {
    let converter =
        DoclingCliConverter::new(&args.docling_bin).with_args(args.docling_args.iter().cloned());

    match args.temp_dir {
        Some(ref dir) => converter.with_work_dir(dir),
        None => converter,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "docling_gateway=debug,tower_http=debug"
    } else {
        "docling_gateway=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::without_auth()
        .with_api_key(config.api_key().map(str::to_owned))
        .with_max_upload_bytes(config.max_upload_bytes());

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

/// Resolve when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("docling-gateway Configuration Check");
    println!("═══════════════════════════════════");
    println!();

    if let Err(e) = config.converter.validate() {
        println!("✗ Configuration: {}", e);
        return ExitCode::FAILURE;
    }
    println!("✓ Converter: {}", config.converter.converter);

    let temp_root = config.converter.temp_root();
    println!("✓ Temp dir: {}", temp_root.display());
    println!();

    print!("Testing temp dir is writable... ");
    let staged = match StagedUpload::create(&temp_root, Some("check.txt")).await {
        Ok(mut upload) => match upload.write_chunk(b"check").await {
            Ok(()) => match upload.finish().await {
                Ok(()) => upload.close().await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    match staged {
        Ok(()) => println!("✓ success"),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    print!("Probing converter... ");
    let probe = match config.converter.converter {
        ConverterKind::Docling => docling_converter(&config.converter).probe().await,
        ConverterKind::Text => PlainTextConverter::new().probe().await,
    };
    match probe {
        Ok(version) => println!("✓ {}", version),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            if config.converter.converter == ConverterKind::Docling {
                println!();
                println!("Please check:");
                println!("  - docling is installed (pip install docling)");
                println!(
                    "  - '{}' is on PATH or an absolute path",
                    config.converter.docling_bin.display()
                );
            }
            return ExitCode::FAILURE;
        }
    }

    println!();
    println!("═══════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
