//! Host-facing operations.
//!
//! Each entry point is a one-shot sequence: validate, resolve the locator,
//! build the URL for the resolved kind, execute, extract, then materialize a
//! handle or fill the caller's output. A failing entry point pushes one
//! record onto the connector's [`ErrorStack`] before returning the error.
//!
//! Operations with several sub-operations take a tagged argument enum
//! ([`ObjectGetArgs`], [`LinkSpecificArgs`], ...) with one variant per
//! sub-operation, each carrying its own inputs and output slot.

mod group;
mod link;
mod object;
mod table;

pub use group::GroupInfo;
pub use link::{IterControl, LinkCreateArgs, LinkGetArgs, LinkInfo, LinkSpecificArgs, LinkValue};
pub use object::{ObjectGetArgs, ObjectInfo, ObjectSpecificArgs};
pub use table::{KindOps, OperationTable};

use restvol_types::{ObjectKind, ServerId, ServerVersion};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::config::ConnectorConfig;
use crate::domain::{fetch_server_version, Domain};
use crate::endpoint::Endpoints;
use crate::error::{ConnectorError, ConnectorResult};
use crate::error_stack::{ErrorRecord, ErrorStack};
use crate::handle::Handle;
use crate::link::{IndexType, IterOrder};
use crate::resolver::{ResolutionResult, Resolver};
use crate::transport::{HttpTransport, RestRequest, Transport};

/// How an operation names its target relative to the starting handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// The starting handle itself.
    SelfRef,
    /// An absolute or relative pathname.
    ByName(String),
    /// The `n`th link of a group, in the given order.
    ByIndex {
        group: String,
        index_type: IndexType,
        order: IterOrder,
        n: usize,
    },
}

impl Locator {
    pub fn by_name(path: impl Into<String>) -> Self {
        Locator::ByName(path.into())
    }

    pub fn by_index(group: impl Into<String>, index_type: IndexType, order: IterOrder, n: usize) -> Self {
        Locator::ByIndex {
            group: group.into(),
            index_type,
            order,
            n,
        }
    }
}

/// Entry point for every host-facing operation.
pub struct Connector<T: Transport> {
    transport: T,
    endpoints: Endpoints,
    table: OperationTable,
    errors: ErrorStack,
    server_version: OnceLock<ServerVersion>,
}

impl Connector<HttpTransport> {
    /// Connects to the service described by `config` over HTTP.
    pub fn connect(config: &ConnectorConfig) -> ConnectorResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        info!("REST VOL connector targeting {}", config.base_url());
        Ok(Self::with_transport(config.base_url(), transport))
    }
}

impl<T: Transport> Connector<T> {
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            transport,
            endpoints: Endpoints::new(base_url),
            table: OperationTable::standard(),
            errors: ErrorStack::new(),
            server_version: OnceLock::new(),
        }
    }

    /// Records every error pushed by a failing operation.
    pub fn errors(&self) -> &ErrorStack {
        &self.errors
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn table(&self) -> &OperationTable {
        &self.table
    }

    pub fn resolver(&self) -> Resolver<'_, T> {
        Resolver::new(&self.transport, &self.endpoints)
    }

    /// Service version, fetched on first use and cached.
    pub fn server_version(&self) -> ConnectorResult<ServerVersion> {
        if let Some(version) = self.server_version.get() {
            return Ok(*version);
        }
        let version = fetch_server_version(&self.transport, &self.endpoints)?;
        Ok(*self.server_version.get_or_init(|| version))
    }

    /// Opens a domain and returns a handle on its root group.
    pub fn open_domain(&self, path: &str) -> ConnectorResult<Handle> {
        let result = self.open_domain_inner(path);
        self.record("open domain", result)
    }

    fn open_domain_inner(&self, path: &str) -> ConnectorResult<Handle> {
        let version = self.server_version()?;
        let domain = Domain::open(&self.transport, &self.endpoints, path, version)?;
        Ok(Handle::materialize(&ResolutionResult::root_of(&domain)))
    }

    /// Opens the object `locator` names, optionally insisting on its kind.
    ///
    /// The object document is fetched and checked against the kind's
    /// expected shape before a handle is created.
    pub fn open(&self, start: &Handle, locator: &Locator, expected: Option<ObjectKind>) -> ConnectorResult<Handle> {
        let result = self.open_inner(start, locator, expected);
        self.record("open", result)
    }

    fn open_inner(&self, start: &Handle, locator: &Locator, expected: Option<ObjectKind>) -> ConnectorResult<Handle> {
        if let Some(kind) = expected
            && !kind.is_object()
        {
            return Err(ConnectorError::InvalidArgument(format!(
                "{kind} objects cannot be opened"
            )));
        }

        let resolution = self.locate(start, locator)?;
        if let Some(kind) = expected
            && !same_collection(kind, resolution.kind)
        {
            return Err(ConnectorError::InvalidArgument(format!(
                "{} is a {}, not a {kind}",
                describe(locator, &resolution),
                resolution.kind
            )));
        }

        let ops = self.table.get(resolution.kind)?;
        let tree = self.fetch_object(&resolution)?;
        (ops.confirm)(&tree)?;

        Ok(Handle::materialize(&resolution))
    }

    /// Closes a handle. Returns true if it was the last one on its domain.
    pub fn close(&self, handle: Handle) -> ConnectorResult<bool> {
        let result = handle.release();
        self.record("close", result)
    }

    /// Server identifier of an open handle.
    pub fn object_uri<'h>(&self, handle: &'h Handle) -> &'h ServerId {
        handle.server_id()
    }

    pub(crate) fn locate(&self, start: &Handle, locator: &Locator) -> ConnectorResult<ResolutionResult> {
        let origin = start.location();
        match locator {
            Locator::SelfRef => Ok(origin),
            Locator::ByName(path) => self.resolver().resolve(&origin, path),
            Locator::ByIndex {
                group,
                index_type,
                order,
                n,
            } => self
                .resolver()
                .resolve_by_index(&origin, group, *index_type, *order, *n),
        }
    }

    pub(crate) fn fetch_object(&self, target: &ResolutionResult) -> ConnectorResult<restvol_json::ParseTree> {
        let url = self.endpoints.object(target.kind, &target.server_id)?;
        let response = self
            .transport
            .execute(&RestRequest::get(url, target.domain.path()))?;
        Ok(restvol_json::parse(&response.body)?)
    }

    pub(crate) fn record<R>(&self, operation: &'static str, result: ConnectorResult<R>) -> ConnectorResult<R> {
        if let Err(e) = &result {
            let record = ErrorRecord::from_error(operation, e);
            warn!("{}", record);
            self.errors.push(record);
        }
        result
    }
}

/// Containers are opened through the groups collection, so a container
/// satisfies a request for a group and vice versa.
fn same_collection(expected: ObjectKind, actual: ObjectKind) -> bool {
    expected.collection().is_some() && expected.collection() == actual.collection()
}

fn describe(locator: &Locator, resolution: &ResolutionResult) -> String {
    match (locator, &resolution.path) {
        (Locator::ByName(path), _) => path.clone(),
        (_, Some(path)) => path.clone(),
        (_, None) => resolution.server_id.to_string(),
    }
}
