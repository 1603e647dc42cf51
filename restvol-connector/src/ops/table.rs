//! Per-kind operation table.

use restvol_json::{JsonResult, JsonType, KeyPath, Lookup, ParseTree};
use restvol_types::ObjectKind;
use std::collections::HashMap;

use crate::error::{ConnectorError, ConnectorResult};

/// Kind-specific behaviour used by the generic operations.
#[derive(Debug, Clone, Copy)]
pub struct KindOps {
    pub kind: ObjectKind,
    /// Checks that an object document has the shape expected of this kind.
    pub confirm: fn(&ParseTree) -> JsonResult<()>,
}

/// Mapping from object kind to its [`KindOps`], built once per connector.
#[derive(Debug, Clone)]
pub struct OperationTable {
    entries: HashMap<ObjectKind, KindOps>,
}

impl OperationTable {
    /// Table covering the four kinds the service has collections for.
    pub fn standard() -> Self {
        let entries = [
            KindOps {
                kind: ObjectKind::Container,
                confirm: confirm_group,
            },
            KindOps {
                kind: ObjectKind::Group,
                confirm: confirm_group,
            },
            KindOps {
                kind: ObjectKind::Dataset,
                confirm: confirm_dataset,
            },
            KindOps {
                kind: ObjectKind::NamedType,
                confirm: confirm_datatype,
            },
        ]
        .into_iter()
        .map(|ops| (ops.kind, ops))
        .collect();

        Self { entries }
    }

    pub fn get(&self, kind: ObjectKind) -> ConnectorResult<&KindOps> {
        self.entries
            .get(&kind)
            .ok_or_else(|| ConnectorError::unsupported(format!("no operations for {kind} objects")))
    }

    pub fn kinds(&self) -> impl Iterator<Item = ObjectKind> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for OperationTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn confirm_group(tree: &ParseTree) -> JsonResult<()> {
    tree.get_str(&KeyPath::keys(&["id"]))?;
    tree.get_count(&KeyPath::keys(&["linkCount"]))?;
    Ok(())
}

fn confirm_dataset(tree: &ParseTree) -> JsonResult<()> {
    tree.get_str(&KeyPath::keys(&["id"]))?;
    tree.lookup(&KeyPath::keys(&["type"]), JsonType::Object)?;
    tree.lookup(&KeyPath::keys(&["shape"]), JsonType::Object)?;
    Ok(())
}

fn confirm_datatype(tree: &ParseTree) -> JsonResult<()> {
    tree.get_str(&KeyPath::keys(&["id"]))?;
    tree.lookup(&KeyPath::keys(&["type"]), JsonType::Object)?;
    Ok(())
}
