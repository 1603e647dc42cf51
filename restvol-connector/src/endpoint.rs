//! Request URL construction.
//!
//! URL shape depends only on the object kind: containers and groups live
//! under `groups`, datasets under `datasets`, named types under `datatypes`.

use restvol_types::limits::{LINK_NAME_MAX_LENGTH, URL_MAX_LENGTH};
use restvol_types::{ObjectKind, ServerId};

use crate::error::{ConnectorError, ConnectorResult};

/// Builds URLs below one service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The domain document, selected by the `Host` header.
    pub fn domain(&self) -> String {
        format!("{}/", self.base)
    }

    /// Service information, including its version.
    pub fn about(&self) -> String {
        format!("{}/about", self.base)
    }

    pub fn object(&self, kind: ObjectKind, id: &ServerId) -> ConnectorResult<String> {
        let collection = collection(kind)?;
        checked(format!("{}/{collection}/{id}", self.base))
    }

    /// The link listing of a group, optionally in creation order.
    pub fn links(&self, group: &ServerId, creation_order: bool) -> ConnectorResult<String> {
        let query = if creation_order { "?CreateOrder=1" } else { "" };
        checked(format!("{}/groups/{group}/links{query}", self.base))
    }

    /// A single named link of a group.
    pub fn link(&self, group: &ServerId, name: &str) -> ConnectorResult<String> {
        check_link_name(name)?;
        checked(format!(
            "{}/groups/{group}/links/{}",
            self.base,
            urlencoding::encode(name)
        ))
    }
}

/// Rejects link names the service cannot store.
pub(crate) fn check_link_name(name: &str) -> ConnectorResult<()> {
    if name.is_empty() {
        return Err(ConnectorError::InvalidArgument(
            "link name is empty".to_string(),
        ));
    }
    if name.len() > LINK_NAME_MAX_LENGTH {
        return Err(ConnectorError::InvalidArgument(format!(
            "link name is {} bytes, limit is {LINK_NAME_MAX_LENGTH}",
            name.len()
        )));
    }
    Ok(())
}

fn collection(kind: ObjectKind) -> ConnectorResult<&'static str> {
    kind.collection()
        .ok_or_else(|| ConnectorError::unsupported(format!("{kind} objects have no REST endpoint")))
}

fn checked(url: String) -> ConnectorResult<String> {
    if url.len() > URL_MAX_LENGTH {
        return Err(ConnectorError::InvalidArgument(format!(
            "request URL is {} bytes, limit is {URL_MAX_LENGTH}",
            url.len()
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ServerId {
        ServerId::parse(s).unwrap()
    }

    #[test]
    fn object_urls_follow_kind() {
        let ep = Endpoints::new("http://svc:5101/");
        assert_eq!(ep.object(ObjectKind::Container, &id("g-1")).unwrap(), "http://svc:5101/groups/g-1");
        assert_eq!(ep.object(ObjectKind::Dataset, &id("d-1")).unwrap(), "http://svc:5101/datasets/d-1");
        assert_eq!(ep.object(ObjectKind::NamedType, &id("t-1")).unwrap(), "http://svc:5101/datatypes/t-1");
        assert!(ep.object(ObjectKind::Attribute, &id("g-1")).is_err());
    }

    #[test]
    fn link_names_are_url_encoded() {
        let ep = Endpoints::new("http://svc");
        assert_eq!(
            ep.link(&id("g-1"), "a b/c").unwrap(),
            "http://svc/groups/g-1/links/a%20b%2Fc"
        );
    }

    #[test]
    fn creation_order_adds_query() {
        let ep = Endpoints::new("http://svc");
        assert_eq!(ep.links(&id("g-1"), false).unwrap(), "http://svc/groups/g-1/links");
        assert_eq!(ep.links(&id("g-1"), true).unwrap(), "http://svc/groups/g-1/links?CreateOrder=1");
    }

    #[test]
    fn domain_and_about_urls() {
        let ep = Endpoints::new("http://svc");
        assert_eq!(ep.domain(), "http://svc/");
        assert_eq!(ep.about(), "http://svc/about");
        assert!(ep.object(ObjectKind::Link, &id("g-1")).is_err());
    }

    #[test]
    fn oversized_urls_are_rejected() {
        let ep = Endpoints::new("http://svc");
        assert!(ep.link(&id("g-1"), &"n".repeat(LINK_NAME_MAX_LENGTH + 1)).is_err());
        assert!(ep.link(&id("g-1"), &"n".repeat(URL_MAX_LENGTH)).is_err());
        assert!(ep.link(&id("g-1"), "").is_err());
    }
}
