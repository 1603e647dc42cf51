//! Domains: the remote containers handles belong to.

use restvol_json::{Extract, JsonResult, KeyPath, Lookup, ParseTree};
use restvol_types::{Feature, ServerId, ServerVersion};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use crate::endpoint::Endpoints;
use crate::error::{ConnectorError, ConnectorResult};
use crate::transport::{Method, RestRequest, Transport};

/// A remote container shared by every handle opened inside it.
///
/// The reference count tracks live handles, not Rust owners of the `Arc`:
/// resolution results and in-flight walks hold the `Arc` without counting.
/// The count never goes below zero, and each transition to zero counts as one
/// closure of the domain's local bookkeeping. A closed domain may be acquired
/// again; nothing remote is torn down here.
pub struct Domain {
    path: String,
    root_id: ServerId,
    server_version: ServerVersion,
    ref_count: AtomicUsize,
    closures: AtomicUsize,
}

impl Domain {
    pub fn new(path: impl Into<String>, root_id: ServerId, server_version: ServerVersion) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            root_id,
            server_version,
            ref_count: AtomicUsize::new(0),
            closures: AtomicUsize::new(0),
        })
    }

    /// Canonical remote path, also sent as the `Host` header.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identifier of the domain's root group.
    pub fn root_id(&self) -> &ServerId {
        &self.root_id
    }

    pub fn server_version(&self) -> ServerVersion {
        self.server_version
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.server_version.supports(feature)
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Number of times the count has fallen to zero.
    pub fn closures(&self) -> usize {
        self.closures.load(Ordering::Acquire)
    }

    pub fn is_open(&self) -> bool {
        self.ref_count() > 0
    }

    /// Registers one more handle. Returns the new count.
    pub(crate) fn acquire(&self) -> usize {
        let previous = self.ref_count.fetch_add(1, Ordering::AcqRel);
        if previous == 0 {
            debug!("Domain {} opened", self.path);
        }
        previous + 1
    }

    /// Unregisters one handle. Returns true when this was the last one.
    ///
    /// Fails instead of wrapping when the count is already zero.
    pub(crate) fn release(&self) -> ConnectorResult<bool> {
        let previous = self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map_err(|_| {
                ConnectorError::InvalidArgument(format!(
                    "domain {} released more times than it was acquired",
                    self.path
                ))
            })?;

        if previous == 1 {
            self.closures.fetch_add(1, Ordering::AcqRel);
            info!("Domain {} closed", self.path);
            return Ok(true);
        }
        Ok(false)
    }

    /// Opens `path` by fetching its domain document.
    pub(crate) fn open<T: Transport + ?Sized>(
        transport: &T,
        endpoints: &Endpoints,
        path: &str,
        server_version: ServerVersion,
    ) -> ConnectorResult<Arc<Self>> {
        validate_domain_path(path)?;

        let request = RestRequest::get(endpoints.domain(), path);
        let response = transport.execute(&request)?;
        let document: DomainDocument = restvol_json::extract(&response.body)?;

        debug!("Domain {} has root group {}", path, document.root);
        Ok(Self::new(path, document.root, server_version))
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("path", &self.path)
            .field("root_id", &self.root_id)
            .field("server_version", &self.server_version)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

/// Domains compare by path: two `Arc`s to different instances opened for
/// the same path describe the same remote container.
impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.root_id == other.root_id
    }
}

impl Eq for Domain {}

struct DomainDocument {
    root: ServerId,
}

impl Extract for DomainDocument {
    fn extract(tree: &ParseTree) -> JsonResult<Self> {
        let root = tree.get_str(&KeyPath::keys(&["root"]))?;
        let root = ServerId::parse(root).map_err(|e| restvol_json::JsonError::BadValue {
            path: "root".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { root })
    }
}

/// Reads the service version from the `/about` document.
///
/// A missing or unparseable version is treated as [`ServerVersion::UNKNOWN`],
/// which disables every version-gated feature.
pub(crate) fn fetch_server_version<T: Transport + ?Sized>(
    transport: &T,
    endpoints: &Endpoints,
) -> ConnectorResult<ServerVersion> {
    let request = RestRequest::new(Method::Get, endpoints.about());
    let response = transport.execute(&request)?;
    let tree = restvol_json::parse(&response.body)?;

    let raw = match tree.get_str(&KeyPath::keys(&["hsds_version"])) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Service did not report a version: {}", e);
            return Ok(ServerVersion::UNKNOWN);
        }
    };
    match ServerVersion::parse(raw) {
        Ok(version) => {
            info!("Connected to service version {}", version);
            Ok(version)
        }
        Err(e) => {
            warn!("Unparseable service version {:?}: {}", raw, e);
            Ok(ServerVersion::UNKNOWN)
        }
    }
}

fn validate_domain_path(path: &str) -> ConnectorResult<()> {
    if !path.starts_with('/') {
        return Err(ConnectorError::InvalidArgument(format!(
            "domain path must be absolute, got {path:?}"
        )));
    }
    if path.len() < 2 {
        return Err(ConnectorError::InvalidArgument(
            "domain path names no container".to_string(),
        ));
    }
    Ok(())
}
