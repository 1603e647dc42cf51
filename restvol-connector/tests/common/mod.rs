//! In-memory stand-in for the REST service.

#![allow(dead_code)]

use restvol_connector::transport::check_status;
use restvol_connector::{
    Connector, ConnectorResult, Handle, Method, RestRequest, RestResponse, Transport,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const BASE: &str = "http://hsds.test";
pub const ALPHA: &str = "/home/test/alpha.h5";
pub const BETA: &str = "/home/test/beta.h5";

#[derive(Debug, Clone)]
enum Target {
    Hard { collection: &'static str, id: String },
    Soft(String),
    External { domain: String, path: String },
}

#[derive(Debug, Clone)]
struct Link {
    name: String,
    created: f64,
    target: Target,
}

#[derive(Debug, Default)]
struct FakeDomain {
    root: String,
    /// group id -> links in creation order
    groups: HashMap<String, Vec<Link>>,
    datasets: Vec<String>,
    datatypes: Vec<String>,
    attribute_counts: HashMap<String, i64>,
    overrides: HashMap<String, Value>,
}

#[derive(Debug, Default)]
struct State {
    domains: HashMap<String, FakeDomain>,
    clock: f64,
    fail_with: Option<u16>,
}

/// A fake service keyed by domain path, recording every request it sees.
pub struct FakeService {
    version: Option<String>,
    state: Mutex<State>,
    requests: Mutex<Vec<RestRequest>>,
}

pub fn mint(tag: char) -> String {
    format!("{tag}-{}", uuid::Uuid::new_v4())
}

impl FakeService {
    pub fn new() -> Self {
        Self::with_version(Some("0.8.4"))
    }

    pub fn with_version(version: Option<&str>) -> Self {
        Self {
            version: version.map(str::to_string),
            state: Mutex::new(State {
                clock: 1_700_000_000.0,
                ..State::default()
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn add_domain(&self, path: &str) -> String {
        let root = mint('g');
        let mut state = self.state.lock().unwrap();
        let mut domain = FakeDomain {
            root: root.clone(),
            ..FakeDomain::default()
        };
        domain.groups.insert(root.clone(), Vec::new());
        state.domains.insert(path.to_string(), domain);
        root
    }

    fn add_link(&self, domain: &str, parent: &str, name: &str, target: Target) {
        let mut state = self.state.lock().unwrap();
        state.clock += 1.0;
        let created = state.clock;
        let domain = state.domains.get_mut(domain).expect("unknown domain");
        domain
            .groups
            .get_mut(parent)
            .expect("unknown parent group")
            .push(Link {
                name: name.to_string(),
                created,
                target,
            });
    }

    pub fn add_group(&self, domain: &str, parent: &str, name: &str) -> String {
        let id = mint('g');
        self.state
            .lock()
            .unwrap()
            .domains
            .get_mut(domain)
            .expect("unknown domain")
            .groups
            .insert(id.clone(), Vec::new());
        self.add_link(domain, parent, name, Target::Hard {
            collection: "groups",
            id: id.clone(),
        });
        id
    }

    pub fn add_dataset(&self, domain: &str, parent: &str, name: &str) -> String {
        let id = mint('d');
        self.state
            .lock()
            .unwrap()
            .domains
            .get_mut(domain)
            .expect("unknown domain")
            .datasets
            .push(id.clone());
        self.add_link(domain, parent, name, Target::Hard {
            collection: "datasets",
            id: id.clone(),
        });
        id
    }

    pub fn add_datatype(&self, domain: &str, parent: &str, name: &str) -> String {
        let id = mint('t');
        self.state
            .lock()
            .unwrap()
            .domains
            .get_mut(domain)
            .expect("unknown domain")
            .datatypes
            .push(id.clone());
        self.add_link(domain, parent, name, Target::Hard {
            collection: "datatypes",
            id: id.clone(),
        });
        id
    }

    /// Adds a second hard link to an existing group.
    pub fn add_hard_link(&self, domain: &str, parent: &str, name: &str, collection: &'static str, id: &str) {
        self.add_link(domain, parent, name, Target::Hard {
            collection,
            id: id.to_string(),
        });
    }

    pub fn add_soft_link(&self, domain: &str, parent: &str, name: &str, path: &str) {
        self.add_link(domain, parent, name, Target::Soft(path.to_string()));
    }

    pub fn add_external_link(&self, domain: &str, parent: &str, name: &str, target_domain: &str, path: &str) {
        self.add_link(domain, parent, name, Target::External {
            domain: target_domain.to_string(),
            path: path.to_string(),
        });
    }

    pub fn set_attribute_count(&self, domain: &str, id: &str, count: i64) {
        self.state
            .lock()
            .unwrap()
            .domains
            .get_mut(domain)
            .expect("unknown domain")
            .attribute_counts
            .insert(id.to_string(), count);
    }

    /// Serves `doc` verbatim for the object `id`.
    pub fn override_object(&self, domain: &str, id: &str, doc: Value) {
        self.state
            .lock()
            .unwrap()
            .domains
            .get_mut(domain)
            .expect("unknown domain")
            .overrides
            .insert(id.to_string(), doc);
    }

    /// Makes every later request fail with `status`.
    pub fn fail_with(&self, status: u16) {
        self.state.lock().unwrap().fail_with = Some(status);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn link_names(&self, domain: &str, group: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.domains[domain].groups[group]
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    fn route(&self, request: &RestRequest) -> (u16, Value) {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.fail_with {
            return (status, json!({"message": format!("injected failure {status}")}));
        }

        let Some(rest) = request.url.strip_prefix(BASE) else {
            return (400, json!({"message": "wrong host"}));
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        if path == "/about" {
            return match &self.version {
                Some(v) => (200, json!({"state": "READY", "hsds_version": v})),
                None => (200, json!({"state": "READY"})),
            };
        }

        let domain_path = request.domain().unwrap_or_default();
        let Some(domain) = state.domains.get(domain_path) else {
            return (404, json!({"message": format!("domain {domain_path} not found")}));
        };

        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match (request.method, parts.as_slice()) {
            (Method::Get, [""]) => (
                200,
                json!({"root": domain.root, "owner": "test", "class": "domain"}),
            ),
            (Method::Get, ["groups", id]) => match domain.groups.get(*id) {
                Some(links) => self.object_doc(domain, domain_path, id, json!({
                    "linkCount": links.len(),
                })),
                None => not_found(),
            },
            (Method::Get, ["datasets", id]) if domain.datasets.iter().any(|d| d.as_str() == *id) => {
                self.object_doc(domain, domain_path, id, json!({
                    "type": {"class": "H5T_INTEGER", "base": "H5T_STD_I32LE"},
                    "shape": {"class": "H5S_SIMPLE", "dims": [10]},
                }))
            }
            (Method::Get, ["datatypes", id]) if domain.datatypes.iter().any(|t| t.as_str() == *id) => {
                self.object_doc(domain, domain_path, id, json!({
                    "type": {"class": "H5T_FLOAT", "base": "H5T_IEEE_F64LE"},
                }))
            }
            (Method::Get, ["groups", id, "links"]) => match domain.groups.get(*id) {
                Some(links) => {
                    let mut entries: Vec<&Link> = links.iter().collect();
                    if query.contains("CreateOrder=1") {
                        entries.sort_by(|a, b| a.created.total_cmp(&b.created));
                    }
                    let links: Vec<Value> = entries.into_iter().map(link_json).collect();
                    (200, json!({"links": links}))
                }
                None => not_found(),
            },
            (Method::Put, ["groups", id, "links"]) => {
                let body = request_json(request);
                let Some((name, spec)) = body["links"].as_object().and_then(|links| links.iter().next()) else {
                    return (400, json!({"message": "no link in request body"}));
                };
                let (id, domain_path) = (id.to_string(), domain_path.to_string());
                drop(state);
                self.put_link(&domain_path, &id, name, spec)
            }
            (Method::Put, ["groups", id, "links", name]) => {
                let name = urlencoding::decode(name).unwrap().into_owned();
                let body = request_json(request);
                let (id, domain_path) = (id.to_string(), domain_path.to_string());
                drop(state);
                self.put_link(&domain_path, &id, &name, &body)
            }
            (method, ["groups", id, "links", name]) => {
                let name = urlencoding::decode(name).unwrap().into_owned();
                let Some(links) = domain.groups.get(*id) else {
                    return not_found();
                };
                let Some(link) = links.iter().find(|l| l.name == name) else {
                    return not_found();
                };
                match method {
                    Method::Get => (200, json!({"link": link_json(link), "hrefs": []})),
                    Method::Delete => {
                        let (id, name) = (id.to_string(), name.clone());
                        drop(state);
                        let mut state = self.state.lock().unwrap();
                        let domain = state.domains.get_mut(domain_path).unwrap();
                        domain.groups.get_mut(&id).unwrap().retain(|l| l.name != name);
                        (200, json!({}))
                    }
                    _ => (405, json!({"message": "method not allowed"})),
                }
            }
            _ => not_found(),
        }
    }

    fn put_link(&self, domain_path: &str, group: &str, name: &str, spec: &Value) -> (u16, Value) {
        let target = {
            let state = self.state.lock().unwrap();
            let domain = &state.domains[domain_path];
            let Some(links) = domain.groups.get(group) else {
                return not_found();
            };
            if links.iter().any(|l| l.name == name) {
                return (409, json!({"message": format!("link {name} already exists")}));
            }
            if let Some(id) = spec["id"].as_str() {
                let collection = if domain.groups.contains_key(id) {
                    "groups"
                } else if domain.datasets.iter().any(|d| d == id) {
                    "datasets"
                } else if domain.datatypes.iter().any(|t| t == id) {
                    "datatypes"
                } else {
                    return not_found();
                };
                Target::Hard {
                    collection,
                    id: id.to_string(),
                }
            } else if let (Some(domain), Some(path)) = (spec["h5domain"].as_str(), spec["h5path"].as_str()) {
                Target::External {
                    domain: domain.to_string(),
                    path: path.to_string(),
                }
            } else if let Some(path) = spec["h5path"].as_str() {
                Target::Soft(path.to_string())
            } else {
                return (400, json!({"message": "unrecognized link body"}));
            }
        };
        self.add_link(domain_path, group, name, target);
        (201, json!({}))
    }

    fn object_doc(&self, domain: &FakeDomain, domain_path: &str, id: &str, extra: Value) -> (u16, Value) {
        if let Some(doc) = domain.overrides.get(id) {
            return (200, doc.clone());
        }
        let mut doc = json!({
            "id": id,
            "root": domain.root,
            "attributeCount": domain.attribute_counts.get(id).copied().unwrap_or(0),
            "hrefs": [
                {"rel": "self", "href": format!("{BASE}/{id}?domain={domain_path}")},
                {"rel": "home", "href": format!("{BASE}/?domain={domain_path}")},
            ],
        });
        if let (Some(doc), Some(extra)) = (doc.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                doc.insert(k.clone(), v.clone());
            }
        }
        (200, doc)
    }
}

fn request_json(request: &RestRequest) -> Value {
    request
        .body
        .as_deref()
        .and_then(|body| serde_json::from_slice(body).ok())
        .unwrap_or(Value::Null)
}

fn not_found() -> (u16, Value) {
    (404, json!({"message": "not found"}))
}

fn link_json(link: &Link) -> Value {
    match &link.target {
        Target::Hard { collection, id } => json!({
            "class": "H5L_TYPE_HARD",
            "title": link.name,
            "collection": collection,
            "id": id,
            "created": link.created,
        }),
        Target::Soft(path) => json!({
            "class": "H5L_TYPE_SOFT",
            "title": link.name,
            "h5path": path,
            "created": link.created,
        }),
        Target::External { domain, path } => json!({
            "class": "H5L_TYPE_EXTERNAL",
            "title": link.name,
            "h5domain": domain,
            "h5path": path,
            "created": link.created,
        }),
    }
}

impl Transport for FakeService {
    fn execute(&self, request: &RestRequest) -> ConnectorResult<RestResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let (status, body) = self.route(request);
        check_status(status, body.to_string().into_bytes())
    }
}

// ── Fixture ──────────────────────────────────────────────────────

/// Two domains:
///
/// ```text
/// alpha:/            beta:/
///   g1/                b1/
///     dset             
///     g2/
///       leaf/
///   s1 -> /g1
///   s_rel -> g1/dset
///   e1 -> beta:/
///   e2 -> beta:/b1
///   loop -> /loop
///   dangling -> /nope
///   type1 (named type)
///   self_root (hard link to /)
/// ```
pub struct World {
    pub service: Arc<FakeService>,
    pub connector: Connector<Arc<FakeService>>,
    pub alpha_root: String,
    pub g1: String,
    pub dset: String,
    pub g2: String,
    pub leaf: String,
    pub type1: String,
    pub beta_root: String,
    pub b1: String,
}

impl World {
    pub fn new() -> Self {
        Self::with_service(FakeService::new())
    }

    pub fn with_service(service: FakeService) -> Self {
        let alpha_root = service.add_domain(ALPHA);
        let beta_root = service.add_domain(BETA);

        let g1 = service.add_group(ALPHA, &alpha_root, "g1");
        let dset = service.add_dataset(ALPHA, &g1, "dset");
        let g2 = service.add_group(ALPHA, &g1, "g2");
        let leaf = service.add_group(ALPHA, &g2, "leaf");
        service.add_soft_link(ALPHA, &alpha_root, "s1", "/g1");
        service.add_soft_link(ALPHA, &alpha_root, "s_rel", "g1/dset");
        service.add_external_link(ALPHA, &alpha_root, "e1", BETA, "/");
        service.add_external_link(ALPHA, &alpha_root, "e2", BETA, "/b1");
        service.add_soft_link(ALPHA, &alpha_root, "loop", "/loop");
        service.add_soft_link(ALPHA, &alpha_root, "dangling", "/nope");
        let type1 = service.add_datatype(ALPHA, &alpha_root, "type1");
        service.add_hard_link(ALPHA, &alpha_root, "self_root", "groups", &alpha_root);
        let b1 = service.add_group(BETA, &beta_root, "b1");

        let service = Arc::new(service);
        let connector = Connector::with_transport(BASE, Arc::clone(&service));

        Self {
            service,
            connector,
            alpha_root,
            g1,
            dset,
            g2,
            leaf,
            type1,
            beta_root,
            b1,
        }
    }

    pub fn open_alpha(&self) -> Handle {
        self.connector.open_domain(ALPHA).unwrap()
    }

    pub fn requests(&self) -> usize {
        self.service.request_count()
    }
}
