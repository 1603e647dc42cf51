//! Pathname resolution.
//!
//! A resolution walks a normalized path one link at a time, issuing one
//! `GET /groups/{id}/links/{name}` per segment:
//!
//! ```text
//!   start ──"/"──► domain root
//!     │
//!     ├─ hard link ──────► (kind, id) in the same domain
//!     ├─ soft link ──────► re-walk the link's path from the domain root
//!     └─ external link ──► open the target domain, walk its path there
//! ```
//!
//! Every failure aborts the whole walk; callers never see an intermediate
//! object. Nothing is cached: each call re-walks from its starting point.

use restvol_types::limits::MAX_LINK_TRAVERSALS;
use restvol_types::{Feature, ObjectKind, ServerId};
use std::sync::Arc;
use tracing::debug;

use crate::domain::Domain;
use crate::endpoint::Endpoints;
use crate::error::{ConnectorError, ConnectorResult};
use crate::link::{sort_links, IndexType, IterOrder, LinkRecord, LinkTarget};
use crate::path::{child_path, NormalizedPath};
use crate::transport::{RestRequest, Transport};
use restvol_json::{KeyPath, Lookup};

/// The object a path resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub kind: ObjectKind,
    pub server_id: ServerId,
    /// May differ from the starting domain after an external link.
    pub domain: Arc<Domain>,
    /// Absolute path the object was reached by, when known. Always
    /// relative to `domain`: it is `None` once a walk has crossed into
    /// another domain, since the source path means nothing there.
    pub path: Option<String>,
}

impl ResolutionResult {
    /// The root group of `domain`.
    pub fn root_of(domain: &Arc<Domain>) -> Self {
        Self {
            kind: ObjectKind::Container,
            server_id: domain.root_id().clone(),
            domain: Arc::clone(domain),
            path: Some("/".to_string()),
        }
    }

    /// Whether two results name the same object in the same domain,
    /// ignoring the path they were reached by.
    pub fn same_object(&self, other: &Self) -> bool {
        self.kind == other.kind && self.server_id == other.server_id && self.domain == other.domain
    }
}

/// Walks paths against a service through a [`Transport`].
pub struct Resolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    endpoints: &'a Endpoints,
}

impl<'a, T: Transport + ?Sized> Resolver<'a, T> {
    pub fn new(transport: &'a T, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Resolves `path` starting at `start`.
    pub fn resolve(&self, start: &ResolutionResult, path: &str) -> ConnectorResult<ResolutionResult> {
        let normalized = NormalizedPath::parse(path)?;
        let mut result = self.walk(start, &normalized, path, 0)?;
        result.path = if Arc::ptr_eq(&result.domain, &start.domain) {
            normalized.absolute_under(start.path.as_deref())
        } else {
            None
        };
        debug!("Resolved {:?} to {} {}", path, result.kind, result.server_id);
        Ok(result)
    }

    /// Resolves the `n`th link of the group at `group_path`.
    ///
    /// Creation-order indexing needs service support; older services fail
    /// with `Unsupported` instead of falling back to name order.
    pub fn resolve_by_index(
        &self,
        start: &ResolutionResult,
        group_path: &str,
        index_type: IndexType,
        order: IterOrder,
        n: usize,
    ) -> ConnectorResult<ResolutionResult> {
        check_index_support(&start.domain, index_type)?;

        let group = self.resolve(start, group_path)?;
        let link = self.nth_link(&group, index_type, order, n)?;

        let mut result = self.follow(&group, &link, group_path, 0)?;
        result.path = if Arc::ptr_eq(&result.domain, &group.domain) {
            child_path(group.path.as_deref(), &link.name)
        } else {
            None
        };
        debug!(
            "Resolved link #{} of {:?} ({}) to {} {}",
            n, group_path, link.name, result.kind, result.server_id
        );
        Ok(result)
    }

    /// Fetches one named link of `group`. A 404 becomes `PathNotFound`.
    pub fn fetch_link(&self, group: &ResolutionResult, name: &str) -> ConnectorResult<LinkRecord> {
        self.fetch_link_for(group, name, name)
    }

    /// The `n`th link of `group` in the requested order.
    pub fn nth_link(
        &self,
        group: &ResolutionResult,
        index_type: IndexType,
        order: IterOrder,
        n: usize,
    ) -> ConnectorResult<LinkRecord> {
        let links = self.list_links(group, index_type, order)?;
        let count = links.len();
        links.into_iter().nth(n).ok_or_else(|| {
            ConnectorError::not_found(
                group.path.as_deref().unwrap_or(group.server_id.as_str()),
                format!("link index {n} is out of range ({count} links)"),
            )
        })
    }

    /// Lists the links of `group` in the requested order.
    pub fn list_links(
        &self,
        group: &ResolutionResult,
        index_type: IndexType,
        order: IterOrder,
    ) -> ConnectorResult<Vec<LinkRecord>> {
        if !group.kind.has_children() {
            return Err(ConnectorError::not_found(
                group.path.as_deref().unwrap_or(group.server_id.as_str()),
                format!("{} objects have no links", group.kind),
            ));
        }
        check_index_support(&group.domain, index_type)?;

        let creation_order = index_type == IndexType::CreationOrder;
        let url = self.endpoints.links(&group.server_id, creation_order)?;
        let response = self.transport.execute(&RestRequest::get(url, group.domain.path()))?;

        let tree = restvol_json::parse(&response.body)?;
        let mut links = tree
            .items(&KeyPath::keys(&["links"]))?
            .iter()
            .map(|node| LinkRecord::from_json(node, ""))
            .collect::<Result<Vec<_>, _>>()?;

        sort_links(&mut links, index_type, order);
        Ok(links)
    }

    fn walk(
        &self,
        start: &ResolutionResult,
        path: &NormalizedPath,
        raw: &str,
        hops: usize,
    ) -> ConnectorResult<ResolutionResult> {
        let mut current = if path.is_absolute() {
            ResolutionResult::root_of(&start.domain)
        } else {
            start.clone()
        };

        for segment in path.segments() {
            if !current.kind.has_children() {
                return Err(ConnectorError::not_found(
                    raw,
                    format!(
                        "{} {} has no links, cannot look up {:?}",
                        current.kind, current.server_id, segment
                    ),
                ));
            }
            let link = self.fetch_link_for(&current, segment, raw)?;
            current = self.follow(&current, &link, raw, hops)?;
        }

        Ok(current)
    }

    /// Turns a link of `group` into the object it points at.
    fn follow(
        &self,
        group: &ResolutionResult,
        link: &LinkRecord,
        raw: &str,
        hops: usize,
    ) -> ConnectorResult<ResolutionResult> {
        match &link.target {
            LinkTarget::Hard { kind, id } => {
                let kind = if id == group.domain.root_id() {
                    ObjectKind::Container
                } else {
                    *kind
                };
                Ok(ResolutionResult {
                    kind,
                    server_id: id.clone(),
                    domain: Arc::clone(&group.domain),
                    path: None,
                })
            }
            LinkTarget::Soft { path } => {
                check_hops(raw, hops)?;
                debug!("Following soft link {:?} -> {:?}", link.name, path);
                let target = NormalizedPath::parse(path)?;
                let root = ResolutionResult::root_of(&group.domain);
                self.walk(&root, &target, raw, hops + 1)
            }
            LinkTarget::External { domain, path } => {
                check_hops(raw, hops)?;
                debug!("Following external link {:?} -> {}:{}", link.name, domain, path);
                let opened = Domain::open(
                    self.transport,
                    self.endpoints,
                    domain,
                    group.domain.server_version(),
                )?;
                let root = ResolutionResult::root_of(&opened);
                let target = NormalizedPath::parse(path)?;
                self.walk(&root, &target, raw, hops + 1)
            }
        }
    }

    fn fetch_link_for(
        &self,
        group: &ResolutionResult,
        name: &str,
        raw: &str,
    ) -> ConnectorResult<LinkRecord> {
        let url = self.endpoints.link(&group.server_id, name)?;
        let request = RestRequest::get(url, group.domain.path());

        let response = self.transport.execute(&request).map_err(|e| {
            if e.is_not_found() {
                ConnectorError::not_found(
                    raw,
                    format!("no link {:?} in group {}", name, group.server_id),
                )
            } else {
                e
            }
        })?;

        let tree = restvol_json::parse(&response.body)?;
        Ok(LinkRecord::from_json(&tree, name)?)
    }
}

fn check_hops(raw: &str, hops: usize) -> ConnectorResult<()> {
    if hops >= MAX_LINK_TRAVERSALS {
        return Err(ConnectorError::not_found(
            raw,
            format!("too many soft or external links (limit {MAX_LINK_TRAVERSALS})"),
        ));
    }
    Ok(())
}

fn check_index_support(domain: &Domain, index_type: IndexType) -> ConnectorResult<()> {
    if index_type == IndexType::CreationOrder && !domain.supports(Feature::CreationOrderIndex) {
        return Err(ConnectorError::unsupported(format!(
            "creation-order indexing needs service version {} or later, {} is {}",
            Feature::CreationOrderIndex.minimum_version(),
            domain.path(),
            domain.server_version()
        )));
    }
    Ok(())
}
