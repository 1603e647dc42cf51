//! Host-visible object handles.

use restvol_types::{ObjectKind, ServerId};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

use crate::domain::Domain;
use crate::error::ConnectorResult;
use crate::resolver::ResolutionResult;

/// A local handle on one remote object.
///
/// `kind` and `server_id` are fixed at creation. Each live handle holds one
/// count on its domain: [`Handle::materialize`] and `clone` acquire it,
/// [`Handle::release`] or drop gives it back. Handles are not deduplicated;
/// two handles on the same object are independent.
pub struct Handle {
    kind: ObjectKind,
    server_id: ServerId,
    domain: Arc<Domain>,
    path: Option<String>,
    released: bool,
}

impl Handle {
    /// Creates a handle for a resolved object and counts it on its domain.
    pub fn materialize(result: &ResolutionResult) -> Self {
        let count = result.domain.acquire();
        trace!(
            "Materialized {} {} in {} (count {})",
            result.kind,
            result.server_id,
            result.domain.path(),
            count
        );
        Self {
            kind: result.kind,
            server_id: result.server_id.clone(),
            domain: Arc::clone(&result.domain),
            path: result.path.clone(),
            released: false,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// Absolute path the handle was opened by, when known. Handles reached
    /// across an external link have no path, because the path they were
    /// opened by belongs to the source domain.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The `(kind, id, domain)` triple of this handle, for use as a
    /// resolution starting point.
    pub fn location(&self) -> ResolutionResult {
        ResolutionResult {
            kind: self.kind,
            server_id: self.server_id.clone(),
            domain: Arc::clone(&self.domain),
            path: self.path.clone(),
        }
    }

    /// Closes the handle. Returns true if it was the last one on its domain.
    pub fn release(mut self) -> ConnectorResult<bool> {
        self.released = true;
        self.domain.release()
    }
}

impl Clone for Handle {
    fn clone(&self) -> Self {
        self.domain.acquire();
        Self {
            kind: self.kind,
            server_id: self.server_id.clone(),
            domain: Arc::clone(&self.domain),
            path: self.path.clone(),
            released: false,
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.domain.release() {
            warn!("Dropping handle {}: {}", self.server_id, e);
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("server_id", &self.server_id)
            .field("domain", &self.domain.path())
            .field("path", &self.path)
            .finish()
    }
}
