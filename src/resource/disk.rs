//! # Disk Resources
//!
//! A JSON document on the local filesystem, fetched through
//! [`DiskJsonService`](crate::service::DiskJsonService). Handy for fixtures,
//! bundled defaults, and offline modes.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::Resource;

/// A JSON document addressed by a filesystem path.
pub trait DiskResource: Resource {
    fn path(&self) -> &Path;
}

/// A ready-made disk descriptor generic over its model.
pub struct DiskJsonResource<M> {
    path: PathBuf,
    _model: PhantomData<fn() -> M>,
}

impl<M> DiskJsonResource<M> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _model: PhantomData,
        }
    }
}

impl<M> Clone for DiskJsonResource<M> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<M> fmt::Debug for DiskJsonResource<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskJsonResource")
            .field("path", &self.path)
            .finish()
    }
}

impl<M: DeserializeOwned + Send + 'static> Resource for DiskJsonResource<M> {
    type Model = M;
}

impl<M: DeserializeOwned + Send + 'static> DiskResource for DiskJsonResource<M> {
    fn path(&self) -> &Path {
        &self.path
    }
}
