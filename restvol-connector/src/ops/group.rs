use restvol_json::{JsonResult, KeyPath, Lookup, ParseTree};

use super::{Connector, Locator};
use crate::error::{ConnectorError, ConnectorResult};
use crate::handle::Handle;
use crate::transport::{RestRequest, Transport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupInfo {
    pub link_count: u64,
}

impl<T: Transport> Connector<T> {
    /// Reads the link count of the group `locator` names.
    pub fn group_get_info(&self, obj: &Handle, locator: &Locator) -> ConnectorResult<GroupInfo> {
        let result = self.group_get_info_inner(obj, locator);
        self.record("group get info", result)
    }

    fn group_get_info_inner(&self, obj: &Handle, locator: &Locator) -> ConnectorResult<GroupInfo> {
        let group = self.locate(obj, locator)?;
        if !group.kind.has_children() {
            return Err(ConnectorError::InvalidArgument(format!(
                "{} is a {}, not a group",
                group.server_id, group.kind
            )));
        }

        let url = self.endpoints.object(group.kind, &group.server_id)?;
        let response = self
            .transport
            .execute(&RestRequest::get(url, group.domain.path()))?;

        let mut info = GroupInfo::default();
        restvol_json::dispatch(&response.body, group_info_callback, &mut info)?;
        Ok(info)
    }
}

fn group_info_callback(tree: &ParseTree, info: &mut GroupInfo) -> JsonResult<()> {
    info.link_count = tree.get_count(&KeyPath::keys(&["linkCount"]))?;
    Ok(())
}
