//! # Observability & Tracing
//!
//! The library only emits events; installing a subscriber is the binary's job.
//! [`setup_tracing`] installs the compact one the demo uses.
//!
//! ## What Gets Traced
//!
//! - **Fetches**: one span per `fetch` carrying the `url` (or `path` for disk
//!   resources), a debug event per executed request, a warning per failure.
//! - **Operations**: start, cancellation, discarded results.
//! - **Queue**: startup, enqueue, `cancel_all`, shutdown.
//!
//! ## Usage
//!
//! ```bash
//! # Failures only
//! RUST_LOG=warn typed-fetch https://httpbin.org/status/404
//!
//! # Every request and response status
//! RUST_LOG=typed_fetch=debug typed-fetch https://httpbin.org/json
//! ```
//!
//! With `RUST_LOG=debug`:
//!
//! ```text
//! DEBUG fetch: Executing request method=GET url="https://httpbin.org/json"
//! DEBUG fetch: Response received status=200 url="https://httpbin.org/json"
//! DEBUG fetch: Fetch ok bytes=429 url="https://httpbin.org/json"
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
