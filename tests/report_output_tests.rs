//! Integration tests for the CSV report contract
//!
//! Exercises the report sinks the way the audit loop drives them: rows
//! from several regions interleaved into shared files, fresh truncation
//! per run, and the split read/write row shape for volume metrics.

use costctl::report::{
    CpuMetricsRow, ReportSet, UnusedEipRow, VolumeMetricsRow, CPU_METRICS_FILE,
    UNUSED_EIPS_FILE, UNUSED_SNAPSHOTS_FILE, VOLUME_METRICS_FILE,
};
use std::path::Path;
use tempfile::TempDir;

fn lines(dir: &Path, name: &str) -> Vec<String> {
    std::fs::read_to_string(dir.join(name))
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

fn cpu_row(region: &str, instance_id: &str) -> CpuMetricsRow {
    CpuMetricsRow {
        region: region.to_string(),
        instance_id: instance_id.to_string(),
        instance_type: "t3.medium".to_string(),
        platform: "".to_string(),
        platform_details: "Linux/UNIX".to_string(),
        timestamp: "2024-02-01T00:00:00Z".to_string(),
        average_pct: 12.5,
    }
}

#[test]
fn test_empty_run_leaves_headers_only() {
    let tmp = TempDir::new().unwrap();
    // A run over regions with zero resources writes nothing after create
    let _reports = ReportSet::create(tmp.path()).unwrap();

    for name in [
        VOLUME_METRICS_FILE,
        CPU_METRICS_FILE,
        UNUSED_SNAPSHOTS_FILE,
        UNUSED_EIPS_FILE,
    ] {
        let content = lines(tmp.path(), name);
        assert_eq!(content.len(), 1, "{} should contain only its header", name);
    }
}

#[test]
fn test_interleaved_regions_each_row_tagged() {
    let tmp = TempDir::new().unwrap();
    let mut reports = ReportSet::create(tmp.path()).unwrap();

    reports.write_cpu_metric(&cpu_row("us-east-1", "i-1")).unwrap();
    reports.write_cpu_metric(&cpu_row("eu-west-1", "i-2")).unwrap();
    reports.write_cpu_metric(&cpu_row("us-east-1", "i-3")).unwrap();

    let content = lines(tmp.path(), CPU_METRICS_FILE);
    assert_eq!(content.len(), 4);
    assert!(content[1].starts_with("us-east-1,i-1,"));
    assert!(content[2].starts_with("eu-west-1,i-2,"));
    assert!(content[3].starts_with("us-east-1,i-3,"));
}

#[test]
fn test_rerun_truncates_not_appends() {
    let tmp = TempDir::new().unwrap();

    {
        let mut reports = ReportSet::create(tmp.path()).unwrap();
        for i in 0..5 {
            reports
                .write_unused_eip(&UnusedEipRow {
                    region: "us-east-1".to_string(),
                    public_ip: format!("1.2.3.{}", i),
                    allocation_id: format!("eipalloc-{}", i),
                })
                .unwrap();
        }
        assert_eq!(lines(tmp.path(), UNUSED_EIPS_FILE).len(), 6);
    }

    // Second run starts fresh
    let _reports = ReportSet::create(tmp.path()).unwrap();
    assert_eq!(lines(tmp.path(), UNUSED_EIPS_FILE).len(), 1);
}

#[test]
fn test_volume_metric_rows_are_never_joined() {
    let tmp = TempDir::new().unwrap();
    let mut reports = ReportSet::create(tmp.path()).unwrap();

    let base = VolumeMetricsRow {
        region: "ap-south-1".to_string(),
        volume_id: "vol-7".to_string(),
        state: "available".to_string(),
        attachment_time: "".to_string(),
        instance_id: "".to_string(),
        timestamp: "2024-01-15T00:00:00Z".to_string(),
        read_ops: None,
        write_ops: None,
    };

    // Read-ops at T1 and T2, write-ops at T1: three rows, never a merged one
    reports
        .write_volume_metric(&VolumeMetricsRow {
            read_ops: Some(10.0),
            ..base.clone()
        })
        .unwrap();
    reports
        .write_volume_metric(&VolumeMetricsRow {
            timestamp: "2024-02-15T00:00:00Z".to_string(),
            read_ops: Some(20.0),
            ..base.clone()
        })
        .unwrap();
    reports
        .write_volume_metric(&VolumeMetricsRow {
            write_ops: Some(5.0),
            ..base.clone()
        })
        .unwrap();

    let content = lines(tmp.path(), VOLUME_METRICS_FILE);
    assert_eq!(content.len(), 4);

    let read_rows: Vec<&String> = content[1..]
        .iter()
        .filter(|l| l.split(',').nth(6).unwrap() != "")
        .collect();
    let write_rows: Vec<&String> = content[1..]
        .iter()
        .filter(|l| l.split(',').nth(7).unwrap() != "")
        .collect();

    assert_eq!(read_rows.len(), 2);
    assert_eq!(write_rows.len(), 1);
    // No row carries both values
    for line in &content[1..] {
        let fields: Vec<&str> = line.split(',').collect();
        assert!(
            fields[6].is_empty() || fields[7].is_empty(),
            "row must not merge read and write ops: {}",
            line
        );
    }
}
