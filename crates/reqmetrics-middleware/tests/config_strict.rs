#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use reqmetrics_core::ErrorKind;
use reqmetrics_middleware::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
http:
  metric_path: "/metrics"
  exclude_pathz: ["/healthz"] # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.kind().as_str(), "CONFIGURATION");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.registry.namespace, "gfast");
    assert_eq!(cfg.http.metric_path, "/debug/metrics");
    assert!(!cfg.registry.enable_process_metrics);
    assert!(cfg.registry.max_cardinality.is_none());
}

#[test]
fn full_config_round_trip() {
    let ok = r#"
version: 1
identity:
  app: "shop"
  host: "node-7"
registry:
  namespace: shop
  enable_runtime_metrics: true
  enable_process_metrics: true
  process_namespace: shop
  report_errors: true
  max_cardinality: 500
http:
  listen: "127.0.0.1:9000"
  metric_path: "/metrics"
  exclude_paths: ["/healthz", "/ping"]
  server_name: "shop-api"
  metadata:
    team: payments
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let id = cfg.identity.resolve();
    assert_eq!(id.app, "shop");
    assert_eq!(id.host, "node-7");
    assert_eq!(cfg.registry.max_cardinality, Some(500));
    assert_eq!(cfg.http.exclude_paths, vec!["/healthz", "/ping"]);
    assert_eq!(cfg.http.metadata.get("team").map(String::as_str), Some("payments"));
}

#[test]
fn rejects_invalid_values() {
    let cases = [
        "version: 2\n",
        "version: 1\nhttp:\n  metric_path: \"metrics\"\n",
        "version: 1\nhttp:\n  exclude_paths: [\"healthz\"]\n",
        "version: 1\nhttp:\n  listen: \"not-an-addr\"\n",
        "version: 1\nregistry:\n  namespace: \"bad-ns\"\n",
        "version: 1\nregistry:\n  max_cardinality: 0\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.kind(), ErrorKind::Configuration, "case={c}");
    }
}
