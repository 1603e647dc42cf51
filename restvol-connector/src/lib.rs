//! REST VOL connector core.
//!
//! Presents a hierarchical, handle-based object store (domains, groups,
//! datasets, named types, links) on top of a stateless HTTP+JSON service
//! that only knows server-assigned identifiers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Connector (ops)      open / get / specific / close   │
//! │   │  OperationTable: kind → KindOps                  │
//! │   ▼                                                  │
//! │ Resolver             path ─► (kind, id, domain)      │
//! │   │                                                  │
//! │   ▼                                                  │
//! │ Transport            one request, one response       │
//! │   │                                                  │
//! │   ▼                                                  │
//! │ restvol-json         key paths ─► typed values       │
//! │   │                                                  │
//! │   ▼                                                  │
//! │ Handle / Domain      counted handles on domains      │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Object references stored as dataset elements are handled separately by
//! [`reference`].
//!
//! Every operation runs synchronously on the calling thread. The transport
//! gives each call its own response buffer, so a [`Connector`] can be shared
//! between threads.

pub mod config;
mod domain;
mod endpoint;
mod error;
mod error_stack;
mod handle;
mod link;
mod ops;
mod path;
pub mod reference;
mod resolver;
pub mod transport;

pub use config::ConnectorConfig;
pub use domain::Domain;
pub use endpoint::Endpoints;
pub use error::{ConnectorError, ConnectorResult, ErrorKind};
pub use error_stack::{ErrorRecord, ErrorStack, Stage};
pub use handle::Handle;
pub use link::{IndexType, IterOrder, LinkClass, LinkRecord, LinkTarget};
pub use ops::{
    Connector, GroupInfo, IterControl, KindOps, LinkCreateArgs, LinkGetArgs, LinkInfo,
    LinkSpecificArgs, LinkValue, Locator, ObjectGetArgs, ObjectInfo, ObjectSpecificArgs, OperationTable,
};
pub use path::NormalizedPath;
pub use reference::{RefKind, WireReference};
pub use resolver::{ResolutionResult, Resolver};
pub use transport::{HttpTransport, Method, RestRequest, RestResponse, Transport};

pub use restvol_types::{Feature, ObjectKind, ServerId, ServerVersion};
