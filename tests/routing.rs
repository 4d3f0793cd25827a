//! Routing table construction and request matching.

use std::fs;

use discovery_router::discovery::load_catalog;
use discovery_router::routing::{builtin_registry, RoutingTable, SharedTable, TableError};
use discovery_router::synthesis::{RouteDirective, Synthesizer};

mod common;

fn route(matcher: &str, pattern: &str, strip: &str) -> RouteDirective {
    RouteDirective::new("svc", pattern, "http://10.0.0.1:8080/")
        .with_opt("strip", strip)
        .with_opt("proto", "http")
        .with_opt("matcher", matcher)
}

fn table(directive: RouteDirective) -> RoutingTable {
    RoutingTable::build(&[directive], builtin_registry()).unwrap()
}

#[test]
fn test_prefix_strip() {
    let table = table(route("prefix", "/api", "/api"));
    let target = &table.lookup("/api/users").unwrap().targets[0];

    assert_eq!(target.strip_path("/api/users"), "/users");
    assert_eq!(target.strip_path("/api/api/users"), "/api/users");
    assert_eq!(target.strip_path("/web/users"), "/web/users");
    assert!(table.lookup("/web/users").is_none());
}

#[test]
fn test_iprefix_ignores_case() {
    let table = table(route("iprefix", "/api", "/api"));
    let target = &table.lookup("/API/x").unwrap().targets[0];

    assert_eq!(target.strip_path("/API/x"), "/x");
    assert_eq!(target.strip_path("/Api/x"), "/x");
}

#[test]
fn test_glob_strips_literal_prefix() {
    let table = table(route("glob", "/api/*/users", "/api"));
    let route = table.lookup("/api/v1/users").unwrap();

    assert_eq!(route.targets[0].strip_path("/API/v1/users"), "/v1/users");
    assert!(table.lookup("/web/v1/users").is_none());
}

#[test]
fn test_regex_strips_every_match() {
    let table = table(route("regex", "^/v[0-9]+/", r"\d+"));
    let target = &table.lookup("/v1/users/42/orders/7").unwrap().targets[0];

    assert_eq!(target.strip_path("/v1/users/42/orders/7"), "/v/users//orders/");
}

#[test]
fn test_unknown_matcher_fails_build() {
    let err = RoutingTable::build(&[route("fuzzy", "/api", "/api")], builtin_registry()).unwrap_err();

    assert_eq!(err.route(), "svc");
    assert_eq!(err.to_string(), r#"route "svc": unknown matcher "fuzzy""#);
    assert!(matches!(err, TableError::UnknownMatcher { .. }));
}

#[test]
fn test_catalog_to_forwarded_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(&path, common::CATALOG_JSON).unwrap();

    let records = load_catalog(&path).unwrap();
    let synthesizer = Synthesizer::new(common::prod_config().with_discovery_tag("routable"));
    let table = RoutingTable::from_catalog(&records, &synthesizer, builtin_registry()).unwrap();
    assert_eq!(table.len(), 2);

    let users = table.lookup("/prod/users/42").unwrap();
    assert_eq!(users.targets[0].tags, vec!["v2".to_string()]);
    assert_eq!(
        users.targets[0].forward_url("/prod/users/42").unwrap().as_str(),
        "http://10.0.0.1:8080/42"
    );

    let billing = table.lookup("/canary/billing/invoices").unwrap();
    assert_eq!(billing.targets[0].proto.as_deref(), Some("https"));
    assert_eq!(
        billing.targets[0].forward_url("/canary/billing/invoices").unwrap().as_str(),
        "https://192.168.1.11:8443/api/invoices"
    );

    assert!(table.lookup("/prod/reports").is_none());
    assert!(table.lookup("/prod/consul").is_none());
}

#[test]
fn test_published_table_visible_to_new_readers() {
    let shared = SharedTable::default();
    let reader = shared.load();

    let records = vec![common::scoped_record("users", "prod", "http")];
    let synthesizer = Synthesizer::new(common::prod_config());
    shared.publish(RoutingTable::from_catalog(&records, &synthesizer, builtin_registry()).unwrap());

    assert!(reader.lookup("/prod/users").is_none());
    assert!(shared.load().lookup("/prod/users").is_some());
}
