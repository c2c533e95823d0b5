//! # Network Fetch Service
//!
//! [`FetchService`] drives the HTTP pipeline:
//!
//! 1. Ask the resource for a [`Request`](crate::resource::Request). No request
//!    means [`NetworkServiceError::CouldNotCreateRequest`]; the transport is
//!    never called.
//! 2. Execute it through the [`TransportSession`].
//! 3. [`classify`] the raw outcome.
//! 4. Decode the body into the resource's model.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::{short_type_name, FetchResult, ResourceService};
use crate::error::{FetchError, NetworkServiceError};
use crate::resource::NetworkResource;
use crate::transport::{TransportOutcome, TransportSession};

/// Fetches [`NetworkResource`]s of type `R` through a shared transport.
///
/// Holds nothing but the session handle. Clone it freely and call it from as
/// many tasks as you like; fetches do not coordinate with each other.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use typed_fetch::resource::NetworkJsonResource;
/// use typed_fetch::service::{FetchService, ResourceService};
/// use typed_fetch::transport::ReqwestSession;
///
/// # async fn run() {
/// let service: FetchService<NetworkJsonResource<serde_json::Value>> =
///     FetchService::new(Arc::new(ReqwestSession::default()));
/// let resource = NetworkJsonResource::<serde_json::Value>::new("https://httpbin.org/json");
/// match service.fetch(&resource).await {
///     Ok(json) => println!("{json}"),
///     Err(e) => eprintln!("{e}"),
/// }
/// # }
/// ```
pub struct FetchService<R> {
    session: Arc<dyn TransportSession>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: NetworkResource> FetchService<R> {
    pub fn new(session: Arc<dyn TransportSession>) -> Self {
        Self {
            session,
            _resource: PhantomData,
        }
    }
}

impl<R> Clone for FetchService<R> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for FetchService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchService")
            .field("resource_type", &short_type_name::<R>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: NetworkResource> ResourceService for FetchService<R> {
    type Resource = R;
    type Error = FetchError;

    #[instrument(skip_all, fields(url = resource.url()))]
    async fn fetch(&self, resource: &R) -> FetchResult<Self> {
        let Some(request) = resource.build_request() else {
            warn!("Could not create request");
            return Err(NetworkServiceError::CouldNotCreateRequest.into());
        };

        debug!(method = %request.method, "Executing request");
        let outcome = self.session.execute(request).await;

        let data = classify(outcome).inspect_err(|e| warn!(error = %e, "Fetch failed"))?;
        let model = R::decode(&data).inspect_err(|e| warn!(error = %e, "Decode failed"))?;

        debug!(bytes = data.len(), "Fetch ok");
        Ok(model)
    }
}

/// Sorts a raw transport outcome into body bytes or a failure.
///
/// Priority, first match wins:
/// 1. A status in [`HANDLED_STATUS_CODES`](crate::error::HANDLED_STATUS_CODES)
///    is a [`NetworkServiceError::StatusCode`], even when the transport also
///    reported an error. The status is the more specific signal.
/// 2. Any other transport error is a [`NetworkServiceError::Networking`].
/// 3. No error and no data is [`NetworkServiceError::NoData`].
///
/// Present-but-empty data passes through; decoding rejects it later.
pub fn classify(outcome: TransportOutcome) -> Result<Vec<u8>, NetworkServiceError> {
    if let Some(status_error) = outcome
        .status_code()
        .and_then(NetworkServiceError::from_status_code)
    {
        return Err(status_error);
    }
    if let Some(error) = outcome.error {
        return Err(NetworkServiceError::Networking(error));
    }
    outcome.data.ok_or(NetworkServiceError::NoData)
}
