//! Link create, get and specific operations.

use restvol_types::{Feature, ServerId};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{Connector, Locator};
use crate::endpoint::check_link_name;
use crate::error::{ConnectorError, ConnectorResult};
use crate::handle::Handle;
use crate::link::{IndexType, IterOrder, LinkClass, LinkRecord, LinkTarget};
use crate::path::NormalizedPath;
use crate::resolver::ResolutionResult;
use crate::transport::{RestRequest, Transport};

/// Link metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkInfo {
    /// `None` until filled.
    pub class: Option<LinkClass>,
    /// Target identifier of a hard link.
    pub target: Option<ServerId>,
    /// Size of a soft or external link's value; see [`LinkValue::size`].
    pub value_size: usize,
    /// Creation time in seconds since the epoch, when reported.
    pub created: Option<f64>,
}

/// The value of a soft or external link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValue {
    Soft { path: String },
    External { domain: String, path: String },
}

impl LinkValue {
    /// Size of the value as stored by the library: the path plus its NUL
    /// terminator, or for external links a flag byte followed by the domain
    /// and path, each NUL terminated.
    pub fn size(&self) -> usize {
        match self {
            LinkValue::Soft { path } => path.len() + 1,
            LinkValue::External { domain, path } => 1 + domain.len() + 1 + path.len() + 1,
        }
    }
}

/// Returned by an iteration visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterControl {
    Continue,
    Stop,
}

/// What a new link points at. Arguments of [`Connector::link_create`].
#[derive(Debug)]
pub enum LinkCreateArgs<'a> {
    /// The object `locator` names relative to `target`. It must live in
    /// the same domain as the new link.
    Hard { target: &'a Handle, locator: Locator },
    Soft { path: String },
    External { domain: String, path: String },
}

/// Arguments of [`Connector::link_get`].
#[derive(Debug)]
pub enum LinkGetArgs<'a> {
    Info { out: &'a mut LinkInfo },
    Value { out: &'a mut Option<LinkValue> },
    NameByIndex {
        index_type: IndexType,
        order: IterOrder,
        n: usize,
        out: &'a mut String,
    },
}

/// Arguments of [`Connector::link_specific`].
pub enum LinkSpecificArgs<'a> {
    Exists { out: &'a mut bool },
    /// Visits the links of the group the locator names, in order, until the
    /// visitor stops. Does not recurse.
    Iterate {
        index_type: IndexType,
        order: IterOrder,
        visitor: &'a mut dyn FnMut(&LinkRecord) -> IterControl,
    },
    Delete,
}

impl std::fmt::Debug for LinkSpecificArgs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkSpecificArgs::Exists { out } => f.debug_struct("Exists").field("out", out).finish(),
            LinkSpecificArgs::Iterate {
                index_type, order, ..
            } => f
                .debug_struct("Iterate")
                .field("index_type", index_type)
                .field("order", order)
                .finish_non_exhaustive(),
            LinkSpecificArgs::Delete => f.write_str("Delete"),
        }
    }
}

impl<T: Transport> Connector<T> {
    /// Creates the link `locator` names. The groups leading up to it must
    /// already exist.
    pub fn link_create(&self, obj: &Handle, locator: &Locator, args: LinkCreateArgs<'_>) -> ConnectorResult<()> {
        let result = self.link_create_inner(obj, locator, args);
        self.record("link create", result)
    }

    fn link_create_inner(&self, obj: &Handle, locator: &Locator, args: LinkCreateArgs<'_>) -> ConnectorResult<()> {
        if !matches!(locator, Locator::ByName(_)) {
            return Err(ConnectorError::InvalidArgument(
                "a new link needs a name".to_string(),
            ));
        }
        let (group, name) = self.locate_parent(obj, locator)?;
        check_link_name(&name)?;

        let body = match args {
            LinkCreateArgs::Hard { target, locator } => {
                let target = self.locate(target, &locator)?;
                if *target.domain != *group.domain {
                    return Err(ConnectorError::InvalidArgument(format!(
                        "hard link {name:?} in {} cannot point into {}",
                        group.domain.path(),
                        target.domain.path()
                    )));
                }
                if target.kind.collection().is_none() {
                    return Err(ConnectorError::InvalidArgument(format!(
                        "{} objects cannot be hard linked",
                        target.kind
                    )));
                }
                json!({ "id": target.server_id.as_str() })
            }
            LinkCreateArgs::Soft { path } => {
                check_link_value(&name, &path)?;
                json!({ "h5path": path })
            }
            LinkCreateArgs::External { domain, path } => {
                check_link_value(&name, &domain)?;
                check_link_value(&name, &path)?;
                json!({ "h5domain": domain, "h5path": path })
            }
        };

        // Newer services take the name in the body, so it is not bounded by
        // the URL length.
        let request = if group.domain.supports(Feature::LongNames) {
            let url = self.endpoints.links(&group.server_id, false)?;
            let mut links = serde_json::Map::new();
            links.insert(name.clone(), body);
            RestRequest::put(url, group.domain.path()).with_json(&json!({ "links": Value::Object(links) }))
        } else {
            let url = self.endpoints.link(&group.server_id, &name)?;
            RestRequest::put(url, group.domain.path()).with_json(&body)
        };
        self.transport.execute(&request)?;

        info!("Created link {:?} in group {}", name, group.server_id);
        Ok(())
    }

    pub fn link_get(&self, obj: &Handle, locator: &Locator, args: LinkGetArgs<'_>) -> ConnectorResult<()> {
        let result = self.link_get_inner(obj, locator, args);
        self.record("link get", result)
    }

    fn link_get_inner(&self, obj: &Handle, locator: &Locator, args: LinkGetArgs<'_>) -> ConnectorResult<()> {
        match args {
            LinkGetArgs::Info { out } => {
                let (_, link) = self.locate_link(obj, locator)?;
                let value = link_value(&link.target);
                *out = LinkInfo {
                    class: Some(link.target.class()),
                    target: match &link.target {
                        LinkTarget::Hard { id, .. } => Some(id.clone()),
                        _ => None,
                    },
                    value_size: value.as_ref().map_or(0, LinkValue::size),
                    created: link.created,
                };
                Ok(())
            }
            LinkGetArgs::Value { out } => {
                let (_, link) = self.locate_link(obj, locator)?;
                let value = link_value(&link.target).ok_or_else(|| {
                    ConnectorError::InvalidArgument(format!("{:?} is a hard link and has no value", link.name))
                })?;
                *out = Some(value);
                Ok(())
            }
            LinkGetArgs::NameByIndex {
                index_type,
                order,
                n,
                out,
            } => {
                let group = self.locate(obj, locator)?;
                *out = self.resolver().nth_link(&group, index_type, order, n)?.name;
                Ok(())
            }
        }
    }

    pub fn link_specific(&self, obj: &Handle, locator: &Locator, args: LinkSpecificArgs<'_>) -> ConnectorResult<()> {
        let result = self.link_specific_inner(obj, locator, args);
        self.record("link specific", result)
    }

    fn link_specific_inner(&self, obj: &Handle, locator: &Locator, args: LinkSpecificArgs<'_>) -> ConnectorResult<()> {
        match args {
            LinkSpecificArgs::Exists { out } => {
                // Intermediate groups must exist; only the last link may be missing.
                let (group, name) = self.locate_parent(obj, locator)?;
                *out = match self.resolver().fetch_link(&group, &name) {
                    Ok(_) => true,
                    Err(ConnectorError::PathNotFound { .. }) => false,
                    Err(e) => return Err(e),
                };
                Ok(())
            }
            LinkSpecificArgs::Iterate {
                index_type,
                order,
                visitor,
            } => {
                let group = self.locate(obj, locator)?;
                let links = self.resolver().list_links(&group, index_type, order)?;
                for link in &links {
                    if visitor(link) == IterControl::Stop {
                        debug!("Link iteration stopped at {:?}", link.name);
                        break;
                    }
                }
                Ok(())
            }
            LinkSpecificArgs::Delete => {
                let (group, name) = self.locate_parent(obj, locator)?;
                let url = self.endpoints.link(&group.server_id, &name)?;
                self.transport
                    .execute(&RestRequest::delete(url, group.domain.path()))
                    .map_err(|e| {
                        if e.is_not_found() {
                            ConnectorError::not_found(&name, "link does not exist")
                        } else {
                            e
                        }
                    })?;
                info!("Deleted link {:?} from group {}", name, group.server_id);
                Ok(())
            }
        }
    }

    /// Resolves the group holding the link a locator names, plus the
    /// link's name.
    fn locate_parent(&self, obj: &Handle, locator: &Locator) -> ConnectorResult<(ResolutionResult, String)> {
        match locator {
            Locator::ByName(path) => {
                let normalized = NormalizedPath::parse(path)?;
                let (parent, name) = normalized.parent_and_name().ok_or_else(|| {
                    ConnectorError::InvalidArgument(format!("{path:?} does not name a link"))
                })?;
                let group = self.resolver().resolve(&obj.location(), &parent)?;
                if !group.kind.has_children() {
                    return Err(ConnectorError::not_found(
                        path,
                        format!("{} is a {} and holds no links", parent, group.kind),
                    ));
                }
                Ok((group, name.to_string()))
            }
            Locator::ByIndex {
                group,
                index_type,
                order,
                n,
            } => {
                let group_result = self.resolver().resolve(&obj.location(), group)?;
                let link = self
                    .resolver()
                    .nth_link(&group_result, *index_type, *order, *n)?;
                Ok((group_result, link.name))
            }
            Locator::SelfRef => Err(ConnectorError::InvalidArgument(
                "link operations need a link name or index".to_string(),
            )),
        }
    }

    fn locate_link(&self, obj: &Handle, locator: &Locator) -> ConnectorResult<(ResolutionResult, LinkRecord)> {
        match locator {
            Locator::ByIndex {
                group,
                index_type,
                order,
                n,
            } => {
                let group_result = self.resolver().resolve(&obj.location(), group)?;
                let link = self
                    .resolver()
                    .nth_link(&group_result, *index_type, *order, *n)?;
                Ok((group_result, link))
            }
            _ => {
                let (group, name) = self.locate_parent(obj, locator)?;
                let link = self.resolver().fetch_link(&group, &name)?;
                Ok((group, link))
            }
        }
    }
}

fn check_link_value(name: &str, value: &str) -> ConnectorResult<()> {
    if value.is_empty() {
        return Err(ConnectorError::InvalidArgument(format!(
            "link {name:?} has an empty target"
        )));
    }
    Ok(())
}

fn link_value(target: &LinkTarget) -> Option<LinkValue> {
    match target {
        LinkTarget::Hard { .. } => None,
        LinkTarget::Soft { path } => Some(LinkValue::Soft { path: path.clone() }),
        LinkTarget::External { domain, path } => Some(LinkValue::External {
            domain: domain.clone(),
            path: path.clone(),
        }),
    }
}
