//! # typed-fetch
//!
//! > **Typed remote resources over an injected transport.**
//!
//! Describe an endpoint and the model its JSON decodes into; get back exactly
//! one `Result<Model, FetchError>`. The crate never talks to the network
//! directly. It goes through a [`TransportSession`](transport::TransportSession)
//! you hand it, which keeps fetch logic testable without sockets.
//!
//! ## Core Concepts
//!
//! ### Generics: the model rides on the resource
//! A [`Resource`](resource::Resource) carries its `Model` as an associated type,
//! so `FetchService<UserResource>` can only ever produce `User`s.
//!
//! ### A closed error taxonomy
//! Five failure kinds, two families ([`NetworkServiceError`], [`JsonParsingError`]),
//! joined in [`FetchError`]. Match it exhaustively; nothing is thrown.
//!
//! ### Single-shot completion
//! `fetch` resolves once. [`ResourceService::fetch_with`](service::ResourceService::fetch_with)
//! is the callback form and [`ResourceOperation`](operation::ResourceOperation)
//! the cancellable one.
//!
//! ## Module Tour
//!
//! ### 1. Descriptions ([`resource`])
//! - **Role**: What to fetch and which model to expect.
//! - **Key items**: [`NetworkResource`](resource::NetworkResource),
//!   [`NetworkJsonResource`](resource::NetworkJsonResource),
//!   [`DiskJsonResource`](resource::DiskJsonResource).
//!
//! ### 2. The wire ([`transport`])
//! - **Role**: The narrow capability the pipeline consumes.
//! - **Key items**: [`TransportSession`](transport::TransportSession),
//!   [`ReqwestSession`](transport::ReqwestSession).
//!
//! ### 3. The pipeline ([`service`])
//! - **Role**: Build, execute, classify, decode.
//! - **Key items**: [`FetchService`](service::FetchService),
//!   [`DiskJsonService`](service::DiskJsonService).
//!
//! ### 4. Scheduling ([`operation`])
//! - **Role**: Cancellable units of work and a queue to host them.
//! - **Key items**: [`ResourceOperation`](operation::ResourceOperation),
//!   [`OperationQueue`](operation::OperationQueue).
//!
//! ### 5. Testing ([`mock`])
//! Scripted and channel-driven transports. See the module for both patterns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde::Deserialize;
//! use typed_fetch::resource::NetworkJsonResource;
//! use typed_fetch::service::{FetchService, ResourceService};
//! use typed_fetch::transport::ReqwestSession;
//!
//! #[derive(Debug, Deserialize)]
//! struct Slideshow { title: String }
//!
//! #[derive(Debug, Deserialize)]
//! struct Envelope { slideshow: Slideshow }
//!
//! #[tokio::main]
//! async fn main() {
//!     let service: FetchService<NetworkJsonResource<Envelope>> =
//!         FetchService::new(Arc::new(ReqwestSession::default()));
//!     let resource = NetworkJsonResource::<Envelope>::new("https://httpbin.org/json");
//!     let envelope = service.fetch(&resource).await.unwrap();
//!     println!("{}", envelope.slideshow.title);
//! }
//! ```
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run -- https://httpbin.org/json
//! ```

pub mod error;
pub mod mock;
pub mod operation;
pub mod resource;
pub mod service;
pub mod tracing;
pub mod transport;

pub use error::{
    DiskServiceError, FetchError, JsonParsingError, LoadError, NetworkServiceError,
    HANDLED_STATUS_CODES,
};
