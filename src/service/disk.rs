//! # Disk Fetch Service
//!
//! [`DiskJsonService`] reads a [`DiskResource`] with `tokio::fs` and decodes it
//! the same way the network pipeline does.

use std::fmt;
use std::io::ErrorKind;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::{FetchResult, ResourceService};
use crate::error::{DiskServiceError, LoadError};
use crate::resource::DiskResource;

/// Loads [`DiskResource`]s of type `R`. Stateless.
pub struct DiskJsonService<R> {
    _resource: PhantomData<fn() -> R>,
}

impl<R: DiskResource> DiskJsonService<R> {
    pub fn new() -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<R: DiskResource> Default for DiskJsonService<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for DiskJsonService<R> {
    fn clone(&self) -> Self {
        Self {
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for DiskJsonService<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskJsonService").finish()
    }
}

#[async_trait]
impl<R: DiskResource> ResourceService for DiskJsonService<R> {
    type Resource = R;
    type Error = LoadError;

    #[instrument(skip_all, fields(path = %resource.path().display()))]
    async fn fetch(&self, resource: &R) -> FetchResult<Self> {
        let path = resource.path();
        let data = tokio::fs::read(path).await.map_err(|e| {
            warn!(error = %e, "Read failed");
            match e.kind() {
                ErrorKind::NotFound => DiskServiceError::FileNotFound(path.to_path_buf()),
                _ => DiskServiceError::Io {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
            }
        })?;

        let model = R::decode(&data)?;
        debug!(bytes = data.len(), "Load ok");
        Ok(model)
    }
}
