use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use lexatlas::address::allocator::{AddressAllocator, OverflowPolicy};
use lexatlas::classify::rules::RuleBasedClassifier;
use lexatlas::coordinator::handlers::{
    handle_complete, handle_health, handle_progress, handle_register, handle_request_work,
    handle_status, handle_store_entries,
};
use lexatlas::coordinator::master::{CoordinatorConfig, WorkCoordinator};
use lexatlas::coordinator::protocol::{
    ENDPOINT_COMPLETE, ENDPOINT_HEALTH, ENDPOINT_PROGRESS, ENDPOINT_REGISTER, ENDPOINT_STATUS,
    ENDPOINT_STORE_ENTRIES, ENDPOINT_WORK,
};
use lexatlas::coordinator::types::WorkUnit;
use lexatlas::source::JsonLinesSource;
use lexatlas::storage::store::MemoryStore;
use lexatlas::worker::client::CoordinatorClient;
use lexatlas::worker::extractor::{EntrySink, ExtractionWorker, WorkerConfig};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let mut mode: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        if args[i].as_str() == "--mode" {
            mode = Some(flag_value(&args, i)?.to_string());
            i += 2;
        } else {
            i += 1;
        }
    }

    match mode.as_deref() {
        Some("coordinator") => run_coordinator(&args).await,
        Some("worker") => run_worker(&args).await,
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }
}

/// The value following a flag. A flag given as the last argument is a usage
/// error, not a panic.
fn flag_value(args: &[String], i: usize) -> anyhow::Result<&str> {
    match args.get(i + 1) {
        Some(value) => Ok(value.as_str()),
        None => anyhow::bail!("flag {} expects a value", args[i]),
    }
}

fn print_usage(binary: &str) {
    eprintln!("Usage:");
    eprintln!(
        "  {} --mode coordinator --bind <addr:port> (--manifest <file> | --span <keys>) \
         [--unit-size <n>] [--language <code>] [--source <name>] [--requeue-stale]",
        binary
    );
    eprintln!(
        "  {} --mode worker --coordinator <url> --id <worker_id> --dump <file> \
         [--language <code>] [--domain <hex byte>] [--batch-size <n>] [--spill <file>]",
        binary
    );
    eprintln!();
    eprintln!(
        "Example: {} --mode coordinator --bind 127.0.0.1:6000 --span 800000 --unit-size 1000",
        binary
    );
    eprintln!(
        "Example: {} --mode worker --coordinator http://127.0.0.1:6000 --id w1 --dump de.jsonl",
        binary
    );
}

async fn run_coordinator(args: &[String]) -> anyhow::Result<()> {
    let mut bind_addr: Option<SocketAddr> = None;
    let mut manifest: Option<String> = None;
    let mut span: Option<u64> = None;
    let mut unit_size: u64 = 1000;
    let mut language = "de".to_string();
    let mut source = "dump".to_string();
    let mut config = CoordinatorConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(flag_value(args, i)?.parse()?);
                i += 2;
            }
            "--manifest" => {
                manifest = Some(flag_value(args, i)?.to_string());
                i += 2;
            }
            "--span" => {
                span = Some(flag_value(args, i)?.parse()?);
                i += 2;
            }
            "--unit-size" => {
                unit_size = flag_value(args, i)?.parse()?;
                i += 2;
            }
            "--language" => {
                language = flag_value(args, i)?.to_string();
                i += 2;
            }
            "--source" => {
                source = flag_value(args, i)?.to_string();
                i += 2;
            }
            "--requeue-stale" => {
                config.requeue_stale = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = match bind_addr {
        Some(addr) => addr,
        None => anyhow::bail!("--bind is required in coordinator mode"),
    };

    let units = match (manifest, span) {
        (Some(path), _) => {
            tracing::info!("Loading work manifest from {}", path);
            WorkCoordinator::load_manifest(&path)?
        }
        (None, Some(span)) => {
            tracing::info!(
                "Planning {} keys of '{}' into units of {}",
                span,
                language,
                unit_size
            );
            WorkUnit::plan_units(&language, &source, span, unit_size)
        }
        (None, None) => anyhow::bail!("one of --manifest or --span is required"),
    };
    tracing::info!("Coordinating {} work units", units.len());

    let coordinator = WorkCoordinator::new(units, Arc::new(MemoryStore::new()), config);
    coordinator.spawn_liveness_sweep();

    let app = Router::new()
        .route(ENDPOINT_REGISTER, post(handle_register))
        .route(ENDPOINT_WORK, get(handle_request_work))
        .route(ENDPOINT_PROGRESS, post(handle_progress))
        .route(ENDPOINT_COMPLETE, post(handle_complete))
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(ENDPOINT_STORE_ENTRIES, post(handle_store_entries))
        .layer(Extension(coordinator.clone()));

    // Periodic progress report for operators watching the log.
    let stats = coordinator.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(10));
        loop {
            interval.tick().await;
            let status = stats.status_snapshot();
            let in_flight = status.overview.assigned + status.overview.processing;
            tracing::info!(
                "Progress: {:.1}% ({}/{} units done, {} in flight, {} workers alive, {} entries)",
                status.progress_percent,
                status.overview.completed,
                status.overview.total_units,
                in_flight,
                status.overview.workers_alive,
                status.overview.total_processed_entries
            );
        }
    });

    tracing::info!("Coordinator listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_worker(args: &[String]) -> anyhow::Result<()> {
    let mut coordinator_url: Option<String> = None;
    let mut worker_id: Option<String> = None;
    let mut dump: Option<String> = None;
    let mut address = "unknown".to_string();
    let mut language = "de".to_string();
    let mut domain: u8 = 0xA0;
    let mut batch_size: Option<usize> = None;
    let mut spill: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--coordinator" => {
                coordinator_url = Some(flag_value(args, i)?.to_string());
                i += 2;
            }
            "--id" => {
                worker_id = Some(flag_value(args, i)?.to_string());
                i += 2;
            }
            "--dump" => {
                dump = Some(flag_value(args, i)?.to_string());
                i += 2;
            }
            "--address" => {
                address = flag_value(args, i)?.to_string();
                i += 2;
            }
            "--language" => {
                language = flag_value(args, i)?.to_string();
                i += 2;
            }
            "--domain" => {
                let raw = flag_value(args, i)?.trim_start_matches("0x");
                domain = u8::from_str_radix(raw, 16)?;
                i += 2;
            }
            "--batch-size" => {
                batch_size = Some(flag_value(args, i)?.parse()?);
                i += 2;
            }
            "--spill" => {
                spill = Some(flag_value(args, i)?.to_string());
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let coordinator_url = match coordinator_url {
        Some(url) => url,
        None => anyhow::bail!("--coordinator is required in worker mode"),
    };
    let worker_id = match worker_id {
        Some(id) => id,
        None => anyhow::bail!("--id is required in worker mode"),
    };
    let dump = match dump {
        Some(path) => path,
        None => anyhow::bail!("--dump is required in worker mode"),
    };

    let mut config = WorkerConfig::new(&worker_id, &address, &language, domain);
    if let Some(batch_size) = batch_size {
        config.batch_size = batch_size;
    }
    if let Some(spill) = spill {
        config.spill_path = spill.into();
    }

    tracing::info!(
        "Worker {} starting: coordinator={} dump={} domain=0x{:02X}",
        worker_id,
        coordinator_url,
        dump,
        domain
    );

    let worker = Arc::new(ExtractionWorker::new(
        config,
        Arc::new(CoordinatorClient::new(&coordinator_url)),
        Arc::new(JsonLinesSource::new(dump)),
        Arc::new(RuleBasedClassifier::new()),
        Arc::new(AddressAllocator::new(OverflowPolicy::default())),
        EntrySink::Remote,
    ));

    worker.run().await
}

#[cfg(test)]
mod tests {
    use super::flag_value;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flag_value_returns_following_argument() {
        let args = args(&["bin", "--bind", "127.0.0.1:6000"]);
        assert_eq!(flag_value(&args, 1).unwrap(), "127.0.0.1:6000");
    }

    #[test]
    fn test_flag_value_rejects_trailing_flag() {
        let args = args(&["bin", "--mode", "worker", "--bind"]);
        let err = flag_value(&args, 3).unwrap_err();
        assert!(err.to_string().contains("--bind"));
    }
}
