mod common;

use common::{World, ALPHA, BETA};
use pretty_assertions::assert_eq;
use restvol_connector::{
    ConnectorError, ErrorKind, IndexType, IterOrder, ObjectKind, ResolutionResult, ServerId,
};

fn id(s: &str) -> ServerId {
    ServerId::parse(s).unwrap()
}

fn resolve(world: &World, start: &ResolutionResult, path: &str) -> Result<ResolutionResult, ConnectorError> {
    world.connector.resolver().resolve(start, path)
}

// ── Concrete scenarios ────────────────────────────────────────────

#[test]
fn hard_link_to_child_group() {
    let world = World::new();
    let root = world.open_alpha();

    let result = resolve(&world, &root.location(), "/g1").unwrap();
    assert_eq!(result.kind, ObjectKind::Group);
    assert_eq!(result.server_id, id(&world.g1));
    assert_eq!(result.domain.path(), ALPHA);
    assert_eq!(result.path.as_deref(), Some("/g1"));
}

#[test]
fn soft_link_resolves_like_its_target() {
    let world = World::new();
    let root = world.open_alpha();

    let direct = resolve(&world, &root.location(), "/g1").unwrap();
    let via_soft = resolve(&world, &root.location(), "/s1").unwrap();
    assert!(via_soft.same_object(&direct));
    assert_eq!(via_soft.path.as_deref(), Some("/s1"));
}

#[test]
fn external_link_crosses_into_other_domain() {
    let world = World::new();
    let root = world.open_alpha();

    let result = resolve(&world, &root.location(), "/e1").unwrap();
    assert_eq!(result.kind, ObjectKind::Container);
    assert_eq!(result.server_id, id(&world.beta_root));
    assert_eq!(result.domain.path(), BETA);

    let before = result.domain.ref_count();
    let handle = restvol_connector::Handle::materialize(&result);
    assert_eq!(result.domain.ref_count(), before + 1);
    assert_eq!(handle.domain().path(), BETA);
    // The starting domain is unaffected.
    assert_eq!(root.domain().ref_count(), 1);
}

#[test]
fn external_link_path_continues_in_target_domain() {
    let world = World::new();
    let root = world.open_alpha();

    let result = resolve(&world, &root.location(), "/e2").unwrap();
    assert_eq!(result.kind, ObjectKind::Group);
    assert_eq!(result.server_id, id(&world.b1));
    assert_eq!(result.domain.path(), BETA);
    // "/e2" names nothing in beta.
    assert_eq!(result.path, None);
}

#[test]
fn relative_soft_link_value_starts_at_domain_root() {
    let world = World::new();
    let root = world.open_alpha();

    let result = resolve(&world, &root.location(), "s_rel").unwrap();
    assert_eq!(result.kind, ObjectKind::Dataset);
    assert_eq!(result.server_id, id(&world.dset));

    // The same value stored one level down still walks from "/".
    world.service.add_soft_link(ALPHA, &world.g1, "sr", "g1/dset");
    let nested = resolve(&world, &root.location(), "/g1/sr").unwrap();
    assert_eq!(nested.kind, ObjectKind::Dataset);
    assert_eq!(nested.server_id, id(&world.dset));
    assert_eq!(nested.path.as_deref(), Some("/g1/sr"));

    // A value relative to the holding group does not resolve.
    world.service.add_soft_link(ALPHA, &world.g1, "sr_local", "dset");
    let err = resolve(&world, &root.location(), "/g1/sr_local").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn relative_resolve_from_external_target_has_no_path() {
    let world = World::new();
    let root = world.open_alpha();

    let beta_root = resolve(&world, &root.location(), "/e1").unwrap();
    assert_eq!(beta_root.path, None);

    let b1 = resolve(&world, &beta_root, "b1").unwrap();
    assert_eq!(b1.server_id, id(&world.b1));
    assert_eq!(b1.path, None);
}

#[test]
fn hard_link_back_to_root_is_the_container() {
    let world = World::new();
    let root = world.open_alpha();

    let result = resolve(&world, &root.location(), "/self_root/g1").unwrap();
    assert_eq!(result.server_id, id(&world.g1));
    let back = resolve(&world, &root.location(), "/self_root").unwrap();
    assert_eq!(back.kind, ObjectKind::Container);
}

// ── Normalization laws ────────────────────────────────────────────

#[test]
fn dot_returns_start_without_requests() {
    let world = World::new();
    let root = world.open_alpha();
    let g1 = resolve(&world, &root.location(), "/g1").unwrap();

    let before = world.requests();
    let same = resolve(&world, &g1, ".").unwrap();
    assert_eq!(world.requests(), before);
    assert_eq!(same, g1);
}

#[test]
fn root_resolves_without_requests() {
    let world = World::new();
    let root = world.open_alpha();
    let dset = resolve(&world, &root.location(), "/g1/dset").unwrap();

    let before = world.requests();
    let result = resolve(&world, &dset, "/").unwrap();
    assert_eq!(world.requests(), before);
    assert_eq!(result.kind, ObjectKind::Container);
    assert_eq!(result.server_id, id(&world.alpha_root));
}

#[test]
fn dot_slash_prefix_matches_plain_relative() {
    let world = World::new();
    let root = world.open_alpha();
    let g1 = resolve(&world, &root.location(), "/g1").unwrap();

    assert_eq!(
        resolve(&world, &g1, "./g2/leaf").unwrap(),
        resolve(&world, &g1, "g2/leaf").unwrap()
    );
}

#[test]
fn absolute_paths_ignore_the_starting_object() {
    let world = World::new();
    let root = world.open_alpha();
    let leaf = resolve(&world, &root.location(), "/g1/g2/leaf").unwrap();

    let from_leaf = resolve(&world, &leaf, "/g1/dset").unwrap();
    let from_root = resolve(&world, &root.location(), "g1/dset").unwrap();
    assert_eq!(from_leaf, from_root);
}

#[test]
fn redundant_separators_collapse() {
    let world = World::new();
    let root = world.open_alpha();
    let tidy = resolve(&world, &root.location(), "/g1/g2/leaf").unwrap();
    let messy = resolve(&world, &root.location(), "//g1///g2/./leaf/").unwrap();
    assert_eq!(messy, tidy);
}

#[test]
fn relative_result_path_is_joined_onto_start() {
    let world = World::new();
    let root = world.open_alpha();
    let g1 = resolve(&world, &root.location(), "/g1").unwrap();
    let leaf = resolve(&world, &g1, "g2/leaf").unwrap();
    assert_eq!(leaf.path.as_deref(), Some("/g1/g2/leaf"));
}

// ── Failures ──────────────────────────────────────────────────────

#[test]
fn missing_segment_is_path_not_found() {
    let world = World::new();
    let root = world.open_alpha();
    let err = resolve(&world, &root.location(), "/g1/nope/leaf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn walking_through_a_dataset_fails_without_asking_it() {
    let world = World::new();
    let root = world.open_alpha();

    let before = world.requests();
    let err = resolve(&world, &root.location(), "/g1/dset/anything").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
    // One lookup for g1, one for dset; nothing is asked of the dataset.
    assert_eq!(world.requests() - before, 2);
}

#[test]
fn walking_through_a_named_type_fails() {
    let world = World::new();
    let root = world.open_alpha();
    let err = resolve(&world, &root.location(), "/type1/x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn relative_path_from_dataset_fails() {
    let world = World::new();
    let root = world.open_alpha();
    let dset = resolve(&world, &root.location(), "/g1/dset").unwrap();
    let err = resolve(&world, &dset, "child").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn dangling_soft_link_is_path_not_found() {
    let world = World::new();
    let root = world.open_alpha();
    let err = resolve(&world, &root.location(), "/dangling").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn soft_link_cycle_is_cut_off() {
    let world = World::new();
    let root = world.open_alpha();
    let err = resolve(&world, &root.location(), "/loop").unwrap_err();
    assert!(matches!(err, ConnectorError::PathNotFound { ref reason, .. } if reason.contains("too many")));
}

#[test]
fn empty_path_is_invalid() {
    let world = World::new();
    let root = world.open_alpha();
    let err = resolve(&world, &root.location(), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn server_errors_other_than_404_propagate() {
    let world = World::new();
    let root = world.open_alpha();
    world.service.fail_with(503);

    let err = resolve(&world, &root.location(), "/g1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), Some(503));
    match err {
        ConnectorError::Transport {
            message,
            server_message,
            ..
        } => {
            assert_eq!(message, "Service unavailable");
            assert_eq!(server_message.as_deref(), Some("injected failure 503"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn requests_carry_domain_host_header() {
    let world = World::new();
    let root = world.open_alpha();
    resolve(&world, &root.location(), "/e2").unwrap();

    let hosts: Vec<String> = world
        .service
        .requests()
        .iter()
        .filter_map(|r| r.domain().map(str::to_string))
        .collect();
    assert!(hosts.iter().any(|h| h == ALPHA));
    assert!(hosts.iter().any(|h| h == BETA));
    assert!(world.service.requests().iter().all(|r| r.header("Expect") == Some("")));
}

// ── Index lookup ──────────────────────────────────────────────────

#[test]
fn index_by_name_increasing_and_decreasing() {
    let world = World::new();
    let root = world.open_alpha();
    let resolver = world.connector.resolver();

    // g1 holds "dset" then "g2".
    let first = resolver
        .resolve_by_index(&root.location(), "/g1", IndexType::Name, IterOrder::Increasing, 0)
        .unwrap();
    assert_eq!(first.server_id, id(&world.dset));
    assert_eq!(first.path.as_deref(), Some("/g1/dset"));

    let first_desc = resolver
        .resolve_by_index(&root.location(), "/g1", IndexType::Name, IterOrder::Decreasing, 0)
        .unwrap();
    assert_eq!(first_desc.server_id, id(&world.g2));
}

#[test]
fn index_by_creation_order() {
    let world = World::new();
    let root = world.open_alpha();
    let resolver = world.connector.resolver();

    // Root links were created g1, s1, s_rel, e1, ...
    let first = resolver
        .resolve_by_index(&root.location(), "/", IndexType::CreationOrder, IterOrder::Increasing, 0)
        .unwrap();
    assert_eq!(first.server_id, id(&world.g1));

    let second = resolver
        .resolve_by_index(&root.location(), "/", IndexType::CreationOrder, IterOrder::Increasing, 1)
        .unwrap();
    // "s1" is a soft link to /g1.
    assert!(second.same_object(&first));
    assert_eq!(second.path.as_deref(), Some("/s1"));

    let requests = world.service.requests();
    assert!(requests.iter().any(|r| r.url.ends_with("/links?CreateOrder=1")));
}

#[test]
fn creation_order_needs_a_recent_service() {
    let world = World::with_service(common::FakeService::with_version(Some("0.7.9")));
    let root = world.open_alpha();

    let before = world.requests();
    let err = world
        .connector
        .resolver()
        .resolve_by_index(&root.location(), "/", IndexType::CreationOrder, IterOrder::Increasing, 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(world.requests(), before);
}

#[test]
fn service_without_version_has_no_creation_order() {
    let world = World::with_service(common::FakeService::with_version(None));
    let root = world.open_alpha();
    let err = world
        .connector
        .resolver()
        .resolve_by_index(&root.location(), "/", IndexType::CreationOrder, IterOrder::Native, 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    // Name order still works.
    assert!(world
        .connector
        .resolver()
        .resolve_by_index(&root.location(), "/", IndexType::Name, IterOrder::Increasing, 0)
        .is_ok());
}

#[test]
fn index_out_of_range_is_path_not_found() {
    let world = World::new();
    let root = world.open_alpha();
    let err = world
        .connector
        .resolver()
        .resolve_by_index(&root.location(), "/g1", IndexType::Name, IterOrder::Increasing, 2)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}

#[test]
fn list_links_of_dataset_fails() {
    let world = World::new();
    let root = world.open_alpha();
    let dset = resolve(&world, &root.location(), "/g1/dset").unwrap();
    let err = world
        .connector
        .resolver()
        .list_links(&dset, IndexType::Name, IterOrder::Increasing)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathNotFound);
}
