//! # typed-fetch demo
//!
//! Fetches one JSON resource, over HTTP(S) or from disk, through an
//! [`OperationQueue`] and prints it.
//!
//! ```bash
//! RUST_LOG=info typed-fetch https://httpbin.org/json
//! typed-fetch -X POST -H Accept:application/json --data '{"name":"Alice"}' https://httpbin.org/anything
//! typed-fetch --file ./fixtures/settings.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info, Instrument};
use typed_fetch::operation::{
    OperationQueue, QueueError, ResourceOperation, DEFAULT_MAX_CONCURRENT,
};
use typed_fetch::resource::{DiskJsonResource, HttpMethod, NetworkJsonResource, QueryItem};
use typed_fetch::service::{DiskJsonService, FetchService};
use typed_fetch::tracing::setup_tracing;
use typed_fetch::transport::ReqwestSession;

#[derive(Debug, Parser)]
#[command(name = "typed-fetch", version, about = "Fetch a JSON resource")]
struct Cli {
    /// Endpoint to fetch
    #[arg(required_unless_present = "file")]
    url: Option<String>,

    /// Read the resource from a local JSON file instead
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    method: HttpMethod,

    /// Header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Query item as NAME=VALUE or NAME (repeatable)
    #[arg(short, long = "query", value_parser = parse_query_item)]
    query: Vec<QueryItem>,

    /// JSON request body
    #[arg(long, value_parser = parse_json)]
    data: Option<serde_json::Value>,

    /// Maximum operations in flight
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
    concurrency: usize,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("Expected NAME:VALUE, got {raw}"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn parse_query_item(raw: &str) -> Result<QueryItem, String> {
    Ok(match raw.split_once('=') {
        Some((name, value)) => QueryItem::new(name, value),
        None => QueryItem::flag(raw),
    })
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("Invalid JSON body: {e}"))
}

type Delivered = Result<serde_json::Value, String>;

/// Builds the operation the CLI describes and hands it to the queue.
async fn submit<F>(cli: &Cli, queue: &OperationQueue, deliver: F) -> Result<(), QueueError>
where
    F: FnOnce(Delivered) + Send + 'static,
{
    if let Some(path) = &cli.file {
        info!(path = %path.display(), "Loading from disk");
        let operation = ResourceOperation::new(
            DiskJsonService::<DiskJsonResource<serde_json::Value>>::new(),
            DiskJsonResource::new(path),
            move |result| deliver(result.map_err(|e| e.to_string())),
        );
        return queue.add_operation(operation).await;
    }

    let url = cli.url.as_deref().unwrap_or_default();
    info!(%url, method = %cli.method, "Fetching");
    let mut resource = NetworkJsonResource::<serde_json::Value>::new(url)
        .with_method(cli.method)
        .with_query_items(cli.query.iter().cloned());
    for (name, value) in &cli.headers {
        resource = resource.with_header(name.as_str(), value.as_str());
    }
    if let Some(body) = &cli.data {
        resource = resource.with_json_body(body.clone());
    }

    let service: FetchService<NetworkJsonResource<serde_json::Value>> =
        FetchService::new(Arc::new(ReqwestSession::default()));
    let operation = ResourceOperation::new(service, resource, move |result| {
        deliver(result.map_err(|e| e.to_string()))
    });
    queue.add_operation(operation).await
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let cli = Cli::parse();

    let (queue, queue_handle) = OperationQueue::spawn(cli.concurrency);
    let (tx, rx) = oneshot::channel::<Delivered>();
    let deliver = move |result: Delivered| {
        let _ = tx.send(result);
    };

    submit(&cli, &queue, deliver)
        .instrument(tracing::info_span!("demo"))
        .await
        .map_err(|e| e.to_string())?;

    let delivered = rx
        .await
        .map_err(|_| "Operation finished without a result".to_string())?;

    drop(queue);
    queue_handle
        .await
        .map_err(|e| format!("Queue task failed: {e:?}"))?;

    match delivered {
        Ok(json) => {
            let pretty = serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?;
            println!("{pretty}");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Fetch failed");
            Err(e)
        }
    }
}
