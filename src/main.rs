use std::process::ExitCode;

use tracing::{error, info, warn};

use filevault::{BlobStore, Catalog, Config, FileBlob};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = filevault::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        filevault::logging::init_console_only(&config.logging.level);
    }

    info!("filevault - personal file vault");
    info!("Storage at {}", config.storage.path);

    let store = match BlobStore::open(&config.storage.path).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let mut catalog = Catalog::new(&store).with_config(&config);

    // Any paths on the command line are imported into the root folder.
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if !paths.is_empty() {
        let mut blobs = Vec::with_capacity(paths.len());
        for path in &paths {
            match FileBlob::from_path(path).await {
                Ok(blob) => blobs.push(blob),
                Err(e) => warn!(path = %path, error = %e, "skipping unreadable file"),
            }
        }
        if !blobs.is_empty() {
            match catalog.upload_files(blobs, None).await {
                Ok(report) => {
                    for failure in &report.failed {
                        warn!(name = %failure.key, error = %failure.error, "import failed");
                    }
                    info!(imported = report.succeeded.len(), "import finished");
                }
                Err(e) => warn!(error = %e, "import rejected"),
            }
        }
    }

    if let Err(e) = catalog.refresh().await {
        error!(error = %e, "{}", e.user_message());
        drop(catalog);
        store.close().await;
        return ExitCode::FAILURE;
    }

    let usage = catalog.usage();
    info!(
        "{} files in {} folders, {} stored",
        usage.total_files,
        catalog.folders().len(),
        usage.total_size_display
    );
    match serde_json::to_string_pretty(&usage) {
        Ok(json) => info!("Usage:\n{json}"),
        Err(e) => warn!(error = %e, "could not serialize usage"),
    }

    drop(catalog);
    store.close().await;
    ExitCode::SUCCESS
}
