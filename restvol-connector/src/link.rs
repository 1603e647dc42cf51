//! Link records as the service reports them.

use restvol_json::{JsonError, JsonResult, JsonType, KeyPath, Lookup};
use restvol_types::{ObjectKind, ServerId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const HARD_LINK_CLASS: &str = "H5L_TYPE_HARD";
pub const SOFT_LINK_CLASS: &str = "H5L_TYPE_SOFT";
pub const EXTERNAL_LINK_CLASS: &str = "H5L_TYPE_EXTERNAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkClass {
    Hard,
    Soft,
    External,
}

impl LinkClass {
    pub fn as_wire(self) -> &'static str {
        match self {
            LinkClass::Hard => HARD_LINK_CLASS,
            LinkClass::Soft => SOFT_LINK_CLASS,
            LinkClass::External => EXTERNAL_LINK_CLASS,
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            HARD_LINK_CLASS => Some(LinkClass::Hard),
            SOFT_LINK_CLASS => Some(LinkClass::Soft),
            EXTERNAL_LINK_CLASS => Some(LinkClass::External),
            _ => None,
        }
    }
}

impl fmt::Display for LinkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkClass::Hard => "hard",
            LinkClass::Soft => "soft",
            LinkClass::External => "external",
        };
        f.write_str(name)
    }
}

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// An object in the same domain, addressed by identifier.
    Hard { kind: ObjectKind, id: ServerId },
    /// A path in the same domain.
    Soft { path: String },
    /// A path inside another domain.
    External { domain: String, path: String },
}

impl LinkTarget {
    pub fn class(&self) -> LinkClass {
        match self {
            LinkTarget::Hard { .. } => LinkClass::Hard,
            LinkTarget::Soft { .. } => LinkClass::Soft,
            LinkTarget::External { .. } => LinkClass::External,
        }
    }
}

/// One named link of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub name: String,
    pub target: LinkTarget,
    /// Creation time in seconds since the epoch, when reported.
    pub created: Option<f64>,
}

/// Link fields may be nested under `link` (single-link responses) or sit at
/// the top level (entries of a `links` array, older services).
fn field(name: &str) -> [KeyPath; 2] {
    [KeyPath::keys(&["link", name]), KeyPath::keys(&[name])]
}

impl LinkRecord {
    /// Reads a link from a single-link response or a `links` array entry.
    ///
    /// `fallback_name` is used when the document carries no `title`.
    pub fn from_json<L: Lookup + ?Sized>(node: &L, fallback_name: &str) -> JsonResult<Self> {
        let name = match node.lookup_first(&field("title"), JsonType::String) {
            Ok(value) => value.as_str().unwrap_or(fallback_name).to_string(),
            Err(JsonError::MissingField { .. }) => fallback_name.to_string(),
            Err(e) => return Err(e),
        };

        let class_paths = field("class");
        let class_str = node.get_str_first(&class_paths)?;
        let class = LinkClass::from_wire(class_str).ok_or_else(|| JsonError::BadValue {
            path: describe(node, &class_paths[0]),
            reason: format!("invalid link class {class_str:?}"),
        })?;

        let target = match class {
            LinkClass::Hard => {
                let collection_paths = field("collection");
                let collection = node.get_str_first(&collection_paths)?;
                let kind = ObjectKind::from_collection(collection).map_err(|e| JsonError::BadValue {
                    path: describe(node, &collection_paths[0]),
                    reason: e.to_string(),
                })?;
                let id_paths = field("id");
                let id = ServerId::parse(node.get_str_first(&id_paths)?).map_err(|e| {
                    JsonError::BadValue {
                        path: describe(node, &id_paths[0]),
                        reason: e.to_string(),
                    }
                })?;
                LinkTarget::Hard { kind, id }
            }
            LinkClass::Soft => LinkTarget::Soft {
                path: node.get_str_first(&field("h5path"))?.to_string(),
            },
            LinkClass::External => LinkTarget::External {
                domain: node.get_str_first(&field("h5domain"))?.to_string(),
                path: node.get_str_first(&field("h5path"))?.to_string(),
            },
        };

        let created = node
            .lookup_first(&field("created"), JsonType::Number)
            .ok()
            .and_then(serde_json::Value::as_f64);

        Ok(Self {
            name,
            target,
            created,
        })
    }
}

fn describe<L: Lookup + ?Sized>(node: &L, path: &KeyPath) -> String {
    if node.prefix().is_empty() {
        path.to_string()
    } else {
        format!("{}.{path}", node.prefix())
    }
}

/// Which property orders a group's links for index-based access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Name,
    CreationOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterOrder {
    Increasing,
    Decreasing,
    /// Whatever order the service returned.
    Native,
}

/// Orders `links` for index-based access.
pub fn sort_links(links: &mut [LinkRecord], index_type: IndexType, order: IterOrder) {
    if order == IterOrder::Native {
        return;
    }

    let compare = |a: &LinkRecord, b: &LinkRecord| -> Ordering {
        match index_type {
            IndexType::Name => a.name.as_bytes().cmp(b.name.as_bytes()),
            IndexType::CreationOrder => a
                .created
                .unwrap_or_default()
                .total_cmp(&b.created.unwrap_or_default())
                .then_with(|| a.name.cmp(&b.name)),
        }
    };

    match order {
        IterOrder::Increasing => links.sort_by(compare),
        IterOrder::Decreasing => links.sort_by(|a, b| compare(b, a)),
        IterOrder::Native => {}
    }
}
