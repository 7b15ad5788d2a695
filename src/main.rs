use portion_tail::{DirectorySource, Error, FileSink, config, logging, tail};
use std::process;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let settings = match config::parse() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = logging::init(&settings.log_level) {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    let tail_config = settings.tail;
    info!(
        instance = %tail_config.instance_id,
        source_dir = %settings.source_dir.display(),
        output_dir = %tail_config.output_dir.display(),
        chunk_size = tail_config.chunk_size,
        fetch_nap = ?tail_config.fetch_nap,
        portion_nap = ?tail_config.portion_nap,
        run_as_service = tail_config.run_as_service,
        "All set. Starting."
    );

    let source = DirectorySource::new(settings.source_dir);
    let sink = FileSink::new(&tail_config.output_dir);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Keep the sender alive so the tailer does not read a closed
            // channel as a shutdown request.
            warn!(error = %e, "unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        let _ = shutdown_tx.send(());
    });

    match tail(source, sink, tail_config, shutdown_rx).await {
        Ok(state) => {
            info!(
                file = ?state.active_file.map(|f| f.to_string()),
                cursor = %state.active_cursor,
                "Done."
            );
        }
        Err(e) => {
            report_fatal(&e);
            process::exit(1);
        }
    }
}

/// Logs everything known about a fatal error, including its cause chain.
fn report_fatal(e: &Error) {
    let mut causes = Vec::new();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = std::error::Error::source(cause);
    }

    error!(
        kind = ?e.kind(),
        provider_code = e.provider_code().unwrap_or("-"),
        causes = ?causes,
        "{}",
        e
    );
}
