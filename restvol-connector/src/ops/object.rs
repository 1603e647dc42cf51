//! Object-level get and specific operations.

use restvol_json::{JsonError, JsonResult, JsonType, KeyPath, Lookup, ParseTree};
use restvol_types::{ObjectKind, ServerId};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{Connector, Locator};
use crate::error::{ConnectorError, ConnectorResult};
use crate::handle::Handle;
use crate::transport::{RestRequest, Transport};

/// Object metadata.
///
/// Unset fields hold their sentinels: `kind` is `Unresolved`, `server_id`
/// is `None`, `fileno` and `num_attrs` are 0. A failed `Info` request leaves
/// the caller's structure unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Kind implied by the object's identifier tag. The root of a domain
    /// reports `Group`.
    pub kind: ObjectKind,
    pub server_id: Option<ServerId>,
    /// Stable number identifying the domain the object lives in.
    pub fileno: u64,
    pub num_attrs: u64,
}

impl Default for ObjectInfo {
    fn default() -> Self {
        Self {
            kind: ObjectKind::Unresolved,
            server_id: None,
            fileno: 0,
            num_attrs: 0,
        }
    }
}

/// Arguments of [`Connector::object_get`].
#[derive(Debug)]
pub enum ObjectGetArgs<'a> {
    Info { out: &'a mut ObjectInfo },
    /// Absolute path the object was reached by; empty when unknown.
    Name { out: &'a mut String },
    /// The containing file handle.
    File,
    /// The datatype of the object.
    Type,
}

/// Arguments of [`Connector::object_specific`].
#[derive(Debug)]
pub enum ObjectSpecificArgs<'a> {
    Exists { out: &'a mut bool },
    ChangeRefCount { delta: i32 },
    Copy { destination: String },
    Visit,
    Flush,
    Refresh,
}

impl<T: Transport> Connector<T> {
    pub fn object_get(&self, obj: &Handle, locator: &Locator, args: ObjectGetArgs<'_>) -> ConnectorResult<()> {
        let result = self.object_get_inner(obj, locator, args);
        self.record("object get", result)
    }

    fn object_get_inner(&self, obj: &Handle, locator: &Locator, args: ObjectGetArgs<'_>) -> ConnectorResult<()> {
        match args {
            ObjectGetArgs::Info { out } => {
                if matches!(locator, Locator::ByIndex { .. }) {
                    return Err(ConnectorError::unsupported(
                        "object info retrieval by link index",
                    ));
                }
                let target = self.locate(obj, locator)?;
                self.table.get(target.kind)?;

                let url = self.endpoints.object(target.kind, &target.server_id)?;
                let response = self
                    .transport
                    .execute(&RestRequest::get(url, target.domain.path()))?;

                let mut staged = ObjectInfo::default();
                restvol_json::dispatch(&response.body, object_info_callback, &mut staged)?;
                if staged.fileno == 0 {
                    staged.fileno = fileno_for(target.domain.path());
                }
                *out = staged;
                Ok(())
            }
            ObjectGetArgs::Name { out } => {
                let target = self.locate(obj, locator)?;
                *out = target.path.unwrap_or_default();
                Ok(())
            }
            ObjectGetArgs::File => Err(ConnectorError::unsupported("get file of object")),
            ObjectGetArgs::Type => Err(ConnectorError::unsupported("get type of object")),
        }
    }

    pub fn object_specific(
        &self,
        obj: &Handle,
        locator: &Locator,
        args: ObjectSpecificArgs<'_>,
    ) -> ConnectorResult<()> {
        let result = self.object_specific_inner(obj, locator, args);
        self.record("object specific", result)
    }

    fn object_specific_inner(
        &self,
        obj: &Handle,
        locator: &Locator,
        args: ObjectSpecificArgs<'_>,
    ) -> ConnectorResult<()> {
        match args {
            ObjectSpecificArgs::Exists { out } => match self.locate(obj, locator) {
                Ok(_) => {
                    *out = true;
                    Ok(())
                }
                Err(ConnectorError::PathNotFound { path, reason }) => {
                    debug!("{} does not exist: {}", path, reason);
                    *out = false;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            ObjectSpecificArgs::ChangeRefCount { .. } => {
                Err(ConnectorError::unsupported("change object reference count"))
            }
            ObjectSpecificArgs::Copy { .. } => Err(ConnectorError::unsupported("object copy")),
            ObjectSpecificArgs::Visit => Err(ConnectorError::unsupported("object visit")),
            ObjectSpecificArgs::Flush => Err(ConnectorError::unsupported("object flush")),
            ObjectSpecificArgs::Refresh => Err(ConnectorError::unsupported("object refresh")),
        }
    }
}

/// Fills an [`ObjectInfo`] from an object document.
fn object_info_callback(tree: &ParseTree, info: &mut ObjectInfo) -> JsonResult<()> {
    let raw_id = tree.get_str(&KeyPath::keys(&["id"]))?;
    let id = ServerId::parse(raw_id).map_err(|e| JsonError::BadValue {
        path: "id".to_string(),
        reason: e.to_string(),
    })?;
    info.kind = id.tagged_kind().ok_or_else(|| JsonError::BadValue {
        path: "id".to_string(),
        reason: format!("cannot tell the object kind of {raw_id:?}"),
    })?;
    info.server_id = Some(id);

    info.num_attrs = tree.get_count(&KeyPath::keys(&["attributeCount"]))?;

    if let Some(home) = home_href(tree)? {
        info.fileno = fileno_for(&home);
    }
    Ok(())
}

fn home_href(tree: &ParseTree) -> JsonResult<Option<String>> {
    let hrefs = KeyPath::keys(&["hrefs"]);
    if tree.lookup_optional(&hrefs, JsonType::Array)?.is_none() {
        return Ok(None);
    }
    for node in tree.items(&hrefs)? {
        if node.get_str(&KeyPath::keys(&["rel"]))? == "home" {
            return Ok(Some(node.get_str(&KeyPath::keys(&["href"]))?.to_string()));
        }
    }
    Ok(None)
}

/// Hashes a domain locator into a stable file number.
pub(crate) fn fileno_for(domain: &str) -> u64 {
    let digest = Sha256::digest(domain.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    // Zero is the unset sentinel.
    u64::from_le_bytes(bytes).max(1)
}
