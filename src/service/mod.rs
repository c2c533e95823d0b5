//! # Resource Services
//!
//! A service turns a [`Resource`] into its model. Two are provided:
//!
//! - [`FetchService`]: HTTP(S) through an injected
//!   [`TransportSession`](crate::transport::TransportSession).
//! - [`DiskJsonService`]: a JSON file on the local filesystem.
//!
//! Both implement [`ResourceService`], which is the seam
//! [`ResourceOperation`](crate::operation::ResourceOperation) is generic over.

pub mod disk;
pub mod network;

pub use disk::*;
pub use network::*;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::resource::Resource;

/// Model type of a resource.
pub type ModelOf<R> = <R as Resource>::Model;

/// What a service delivers for one fetch.
pub type FetchResult<S> =
    Result<ModelOf<<S as ResourceService>::Resource>, <S as ResourceService>::Error>;

/// Fetches one kind of resource.
///
/// # Contract
/// - One `fetch` yields exactly one `Result`: no partial results, no retries.
/// - Every failure is folded into `Self::Error`; nothing panics.
/// - Implementations hold no mutable shared state, so concurrent fetches on
///   one instance are independent and may complete in any order.
#[async_trait]
pub trait ResourceService: Send + Sync + 'static {
    type Resource: Resource;
    type Error: std::error::Error + Clone + Send + Sync + 'static;

    async fn fetch(
        &self,
        resource: &Self::Resource,
    ) -> Result<ModelOf<Self::Resource>, Self::Error>;

    /// Callback form of [`fetch`](Self::fetch).
    ///
    /// Returns as soon as the work is spawned. `completion` runs exactly once,
    /// on a runtime worker, with the delivered `Result`.
    fn fetch_with<F>(&self, resource: Self::Resource, completion: F) -> JoinHandle<()>
    where
        Self: Clone + Sized,
        F: FnOnce(FetchResult<Self>) + Send + 'static,
    {
        let service = self.clone();
        tokio::spawn(async move {
            let result = service.fetch(&resource).await;
            completion(result);
        })
    }
}

/// Last path segment of a type name, generics stripped
/// (`typed_fetch::resource::NetworkJsonResource<String>` → `NetworkJsonResource`).
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
