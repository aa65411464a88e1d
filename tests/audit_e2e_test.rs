//! End-to-end audit test against a real AWS account
//!
//! Requires credentials in the environment. Run with:
//!   cargo test --features e2e
#![cfg(feature = "e2e")]

use costctl::audit::{run_audit, AuditOptions};
use costctl::report::{
    CPU_METRICS_FILE, UNUSED_EIPS_FILE, UNUSED_SNAPSHOTS_FILE, VOLUME_METRICS_FILE,
};
use costctl::window::MetricWindow;
use tempfile::TempDir;

#[tokio::test]
async fn test_audit_single_region_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let options = AuditOptions {
        regions: vec!["us-east-1".to_string()],
        output_dir: tmp.path().to_path_buf(),
        window: MetricWindow::default(),
    };

    let summary = run_audit(&options).await.unwrap();
    assert_eq!(summary.regions.len(), 1);
    assert_eq!(summary.regions[0].region, "us-east-1");

    // All four reports exist with their headers, whatever the account holds
    for name in [
        VOLUME_METRICS_FILE,
        CPU_METRICS_FILE,
        UNUSED_SNAPSHOTS_FILE,
        UNUSED_EIPS_FILE,
    ] {
        let content = std::fs::read_to_string(tmp.path().join(name)).unwrap();
        assert!(content.lines().count() >= 1, "{} missing header", name);
    }
}
