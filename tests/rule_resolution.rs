//! Resolution contract of the default rule table.

use axum::http::Method;

use dev_proxy::config::schema::{default_rules, RuleConfig};
use dev_proxy::routing::{Router, RoutingError, RuleTable};

fn table() -> RuleTable {
    RuleTable::from_config(&default_rules()).unwrap()
}

#[test]
fn test_dataset_paths() {
    let table = table();
    for path in ["/api/dataset", "/api/dataset/list", "/api/dataset/7/rows?x", "/api/datasets"] {
        let res = table.resolve(path).unwrap();
        assert_eq!(res.target, "http://localhost:8080", "{}", path);
        assert_eq!(res.path, &path["/api".len()..], "{}", path);
    }
}

#[test]
fn test_experiments_paths() {
    let table = table();
    for path in ["/api/experiments", "/api/experiments/42/results"] {
        let res = table.resolve(path).unwrap();
        assert_eq!(res.target, "http://localhost:8081", "{}", path);
        assert_eq!(res.path, &path["/api".len()..], "{}", path);
    }
}

#[test]
fn test_other_api_paths_hit_catch_all() {
    let table = table();
    for path in ["/api/unknown/thing", "/api/", "/api/data", "/api/experiment"] {
        let res = table.resolve(path).unwrap();
        assert_eq!(res.target, "http://localhost:3000", "{}", path);
    }
    assert_eq!(table.resolve("/api/unknown/thing").unwrap().path, "/unknown/thing");
}

#[test]
fn test_non_api_paths_do_not_match() {
    let table = table();
    for path in ["/health", "/", "/index.html", "/apix/dataset"] {
        assert_eq!(
            table.resolve(path),
            Err(RoutingError::NoMatchingRoute { path: path.to_string() })
        );
    }
}

#[test]
fn test_precedence_independent_of_config_order() {
    let mut reversed = default_rules();
    reversed.reverse();
    let reversed = RuleTable::from_config(&reversed).unwrap();

    assert_eq!(
        reversed.resolve("/api/dataset/list").unwrap().target,
        "http://localhost:8080"
    );
    assert_eq!(
        reversed.resolve("/api/experiments/1").unwrap().target,
        "http://localhost:8081"
    );
}

#[test]
fn test_router_resolution_is_idempotent() {
    let router = Router::new(table());
    let first = router.resolve(&Method::GET, "/api/experiments/42/results");
    let second = router.resolve(&Method::GET, "/api/experiments/42/results");
    assert_eq!(first, second);
}

#[test]
fn test_invalid_patterns_fail_construction() {
    for rule in [
        RuleConfig::prefix("", "http://localhost:8080"),
        RuleConfig::regex("", "http://localhost:8080"),
        RuleConfig::regex("^/api/(unclosed", "http://localhost:8080"),
    ] {
        assert!(matches!(
            RuleTable::from_config(&[rule]),
            Err(RoutingError::InvalidRulePattern { .. })
        ));
    }
}
