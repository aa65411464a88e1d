//! Multi-region audit orchestration
//!
//! Regions are processed strictly sequentially, in configured order; within
//! a region the collectors run one at a time, each AWS call awaited to
//! completion before the next is issued. Rows from every region interleave
//! in the four shared report files, so each row carries its own region tag.
//!
//! A failure inside one region is logged and recorded in the summary; the
//! remaining regions still run. Partial reports stay on disk either way.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::aws::cloudwatch::{self, VolumeMetric};
use crate::aws::ec2::{self, VolumeRecord};
use crate::aws::RegionClients;
use crate::error::Result;
use crate::report::{
    CpuMetricsRow, ReportSet, UnusedEipRow, UnusedSnapshotRow, VolumeMetricsRow,
};
use crate::window::{iso8601, MetricWindow};

/// Inputs for one audit run, resolved from config plus CLI overrides
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub regions: Vec<String>,
    pub output_dir: PathBuf,
    pub window: MetricWindow,
}

/// Per-region row counts for the end-of-run summary
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub region: String,
    pub instances: usize,
    pub cpu_rows: usize,
    pub volumes: usize,
    pub volume_metric_rows: usize,
    pub unused_volumes: usize,
    pub snapshot_rows: usize,
    pub unused_eips: usize,
    /// Set when the region aborted partway; counts reflect rows emitted
    /// before the failure.
    pub error: Option<String>,
}

impl RegionReport {
    fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            instances: 0,
            cpu_rows: 0,
            volumes: 0,
            volume_metric_rows: 0,
            unused_volumes: 0,
            snapshot_rows: 0,
            unused_eips: 0,
            error: None,
        }
    }
}

/// Outcome of a full audit run
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub regions: Vec<RegionReport>,
    pub window_start: String,
    pub window_end: String,
}

impl AuditSummary {
    pub fn failed_regions(&self) -> usize {
        self.regions.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn total_rows(&self) -> usize {
        self.regions
            .iter()
            .map(|r| r.cpu_rows + r.volume_metric_rows + r.snapshot_rows + r.unused_eips)
            .sum()
    }
}

/// Run the audit over every configured region and return the summary.
pub async fn run_audit(options: &AuditOptions) -> Result<AuditSummary> {
    let mut reports = ReportSet::create(&options.output_dir)?;
    let mut summary = AuditSummary {
        regions: Vec::with_capacity(options.regions.len()),
        window_start: iso8601(options.window.start),
        window_end: iso8601(options.window.end),
    };

    info!(
        regions = options.regions.len(),
        window_start = %summary.window_start,
        window_end = %summary.window_end,
        "Starting cost audit"
    );

    for region in &options.regions {
        let mut report = RegionReport::new(region);
        if let Err(e) = audit_region(region, &options.window, &mut reports, &mut report).await {
            warn!("Region {} failed, continuing: {}", region, e);
            report.error = Some(e.to_string());
        }
        summary.regions.push(report);
    }

    Ok(summary)
}

async fn audit_region(
    region: &str,
    window: &MetricWindow,
    reports: &mut ReportSet,
    counts: &mut RegionReport,
) -> Result<()> {
    info!("Auditing region {}", region);
    let clients = RegionClients::connect(region).await;

    // Instances -> CPU utilization rows
    let instances = ec2::list_instances(&clients.ec2).await?;
    counts.instances = instances.len();
    for instance in &instances {
        let datapoints =
            cloudwatch::instance_cpu_utilization(&clients.cloudwatch, &instance.id, window).await?;
        // Zero datapoints means zero rows - no placeholder
        for dp in datapoints {
            reports.write_cpu_metric(&CpuMetricsRow {
                region: region.to_string(),
                instance_id: instance.id.clone(),
                instance_type: instance.instance_type.clone(),
                platform: instance.platform.clone(),
                platform_details: instance.platform_details.clone(),
                timestamp: iso8601(dp.timestamp),
                average_pct: dp.value,
            })?;
            counts.cpu_rows += 1;
        }
    }

    // Volumes -> read-ops and write-ops rows, two independent series
    let volumes = ec2::list_volumes(&clients.ec2).await?;
    counts.volumes = volumes.len();
    for volume in &volumes {
        for metric in [VolumeMetric::ReadOps, VolumeMetric::WriteOps] {
            let datapoints =
                cloudwatch::volume_ops(&clients.cloudwatch, &volume.id, metric, window).await?;
            for dp in datapoints {
                reports.write_volume_metric(&volume_metric_row(region, volume, metric, &dp))?;
                counts.volume_metric_rows += 1;
            }
        }
    }

    // Unattached volumes -> snapshot cross-reference
    let unused = ec2::list_available_volumes(&clients.ec2).await?;
    counts.unused_volumes = unused.len();
    for volume in &unused {
        let snapshots = ec2::list_snapshots_for_volume(&clients.ec2, &volume.id).await?;
        for snapshot in snapshots {
            reports.write_unused_snapshot(&UnusedSnapshotRow {
                region: region.to_string(),
                snapshot_id: snapshot.id,
                volume_id: snapshot.volume_id,
                start_time: snapshot.start_time,
                description: snapshot.description,
            })?;
            counts.snapshot_rows += 1;
        }
    }

    // Addresses -> unassociated allocations only
    let addresses = ec2::list_addresses(&clients.ec2).await?;
    for address in ec2::unassociated_addresses(addresses) {
        reports.write_unused_eip(&UnusedEipRow {
            region: region.to_string(),
            public_ip: address.public_ip,
            allocation_id: address.allocation_id,
        })?;
        counts.unused_eips += 1;
    }

    Ok(())
}

fn volume_metric_row(
    region: &str,
    volume: &VolumeRecord,
    metric: VolumeMetric,
    dp: &cloudwatch::Datapoint,
) -> VolumeMetricsRow {
    let (read_ops, write_ops) = match metric {
        VolumeMetric::ReadOps => (Some(dp.value), None),
        VolumeMetric::WriteOps => (None, Some(dp.value)),
    };
    VolumeMetricsRow {
        region: region.to_string(),
        volume_id: volume.id.clone(),
        state: volume.state.clone(),
        attachment_time: volume.attachment_time.clone(),
        instance_id: volume.instance_id.clone(),
        timestamp: iso8601(dp.timestamp),
        read_ops,
        write_ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn volume() -> VolumeRecord {
        VolumeRecord {
            id: "vol-1".to_string(),
            state: "in-use".to_string(),
            attachment_state: "attached".to_string(),
            attachment_time: "2024-01-01T00:00:00Z".to_string(),
            instance_id: "i-1".to_string(),
            device: "/dev/sdf".to_string(),
        }
    }

    #[test]
    fn test_read_row_has_empty_write_column() {
        let dp = cloudwatch::Datapoint {
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            value: 120.0,
        };
        let row = volume_metric_row("us-east-1", &volume(), VolumeMetric::ReadOps, &dp);
        assert_eq!(row.read_ops, Some(120.0));
        assert_eq!(row.write_ops, None);
        assert_eq!(row.timestamp, "2024-02-01T00:00:00Z");
    }

    #[test]
    fn test_write_row_has_empty_read_column() {
        let dp = cloudwatch::Datapoint {
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            value: 33.0,
        };
        let row = volume_metric_row("us-east-1", &volume(), VolumeMetric::WriteOps, &dp);
        assert_eq!(row.read_ops, None);
        assert_eq!(row.write_ops, Some(33.0));
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = AuditSummary {
            regions: vec![],
            window_start: "2024-01-01T00:00:00Z".to_string(),
            window_end: "2024-03-31T00:00:00Z".to_string(),
        };

        let mut ok = RegionReport::new("us-east-1");
        ok.cpu_rows = 3;
        ok.volume_metric_rows = 4;
        summary.regions.push(ok);

        let mut failed = RegionReport::new("eu-west-1");
        failed.error = Some("Throttling".to_string());
        failed.unused_eips = 2;
        summary.regions.push(failed);

        assert_eq!(summary.failed_regions(), 1);
        assert_eq!(summary.total_rows(), 9);
    }
}
