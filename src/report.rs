//! CSV report sinks
//!
//! Four reports, one file each, created fresh at the start of a run
//! (pre-existing files are truncated). The header row is written once at
//! create; after that the writers are append-only. Every row is flushed as
//! soon as it is produced, so an interrupted run still leaves durable
//! partial output on disk.
//!
//! Sinks are explicit handles opened once at startup and passed into the
//! audit loop - there is no global writer state.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CostctlError, Result};

pub const VOLUME_METRICS_FILE: &str = "ebs_volume_metrics.csv";
pub const CPU_METRICS_FILE: &str = "ec2_cpu_metrics.csv";
pub const UNUSED_SNAPSHOTS_FILE: &str = "unused_ebs_snapshots.csv";
pub const UNUSED_EIPS_FILE: &str = "unused_eips.csv";

const VOLUME_METRICS_HEADER: &str =
    "region,volume_id,state,attachment_time,instance_id,timestamp,read_ops,write_ops";
const CPU_METRICS_HEADER: &str =
    "region,instance_id,instance_type,platform,platform_details,timestamp,average_pct";
const UNUSED_SNAPSHOTS_HEADER: &str = "region,snapshot_id,volume_id,start_time,description";
const UNUSED_EIPS_HEADER: &str = "region,public_ip,allocation_id";

/// One EBS read-ops or write-ops datapoint. Exactly one of `read_ops` /
/// `write_ops` is set; the other column is emitted empty. The two metrics
/// are fetched independently and never joined by timestamp, so a single
/// timestamp may appear as two rows.
#[derive(Debug, Clone)]
pub struct VolumeMetricsRow {
    pub region: String,
    pub volume_id: String,
    pub state: String,
    pub attachment_time: String,
    pub instance_id: String,
    pub timestamp: String,
    pub read_ops: Option<f64>,
    pub write_ops: Option<f64>,
}

/// One CPU utilization datapoint for an instance
#[derive(Debug, Clone)]
pub struct CpuMetricsRow {
    pub region: String,
    pub instance_id: String,
    pub instance_type: String,
    pub platform: String,
    pub platform_details: String,
    pub timestamp: String,
    pub average_pct: f64,
}

/// A snapshot whose source volume is unattached
#[derive(Debug, Clone)]
pub struct UnusedSnapshotRow {
    pub region: String,
    pub snapshot_id: String,
    pub volume_id: String,
    pub start_time: String,
    pub description: String,
}

/// An Elastic IP allocation with no association
#[derive(Debug, Clone)]
pub struct UnusedEipRow {
    pub region: String,
    pub public_ip: String,
    pub allocation_id: String,
}

/// Append-only writer for one report file
pub struct ReportWriter {
    name: &'static str,
    file: File,
}

impl ReportWriter {
    fn create(dir: &Path, name: &'static str, header: &str) -> Result<Self> {
        let path = dir.join(name);
        let mut file = File::create(&path).map_err(|e| CostctlError::Report {
            report: name.to_string(),
            message: format!("failed to create {}: {}", path.display(), e),
        })?;
        writeln!(file, "{}", header).map_err(|e| CostctlError::Report {
            report: name.to_string(),
            message: format!("failed to write header: {}", e),
        })?;
        file.flush()?;
        Ok(Self { name, file })
    }

    /// Append one row and flush it to disk
    fn append_row(&mut self, fields: &[String]) -> Result<()> {
        let line = fields
            .iter()
            .map(|f| csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(self.file, "{}", line).map_err(|e| CostctlError::Report {
            report: self.name.to_string(),
            message: format!("failed to append row: {}", e),
        })?;
        self.file.flush()?;
        Ok(())
    }
}

/// Quote a field when it contains a comma, double quote, or newline
/// (snapshot descriptions are free text). Inner quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn metric_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// All four report sinks for one audit run
pub struct ReportSet {
    volume_metrics: ReportWriter,
    cpu_metrics: ReportWriter,
    unused_snapshots: ReportWriter,
    unused_eips: ReportWriter,
    dir: PathBuf,
}

impl ReportSet {
    /// Open all four reports under `dir`, truncating any previous run's files
    /// and writing each header line.
    pub fn create(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            volume_metrics: ReportWriter::create(dir, VOLUME_METRICS_FILE, VOLUME_METRICS_HEADER)?,
            cpu_metrics: ReportWriter::create(dir, CPU_METRICS_FILE, CPU_METRICS_HEADER)?,
            unused_snapshots: ReportWriter::create(
                dir,
                UNUSED_SNAPSHOTS_FILE,
                UNUSED_SNAPSHOTS_HEADER,
            )?,
            unused_eips: ReportWriter::create(dir, UNUSED_EIPS_FILE, UNUSED_EIPS_HEADER)?,
            dir: dir.to_path_buf(),
        })
    }

    /// Directory the reports are written into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_volume_metric(&mut self, row: &VolumeMetricsRow) -> Result<()> {
        self.volume_metrics.append_row(&[
            row.region.clone(),
            row.volume_id.clone(),
            row.state.clone(),
            row.attachment_time.clone(),
            row.instance_id.clone(),
            row.timestamp.clone(),
            metric_value(row.read_ops),
            metric_value(row.write_ops),
        ])
    }

    pub fn write_cpu_metric(&mut self, row: &CpuMetricsRow) -> Result<()> {
        self.cpu_metrics.append_row(&[
            row.region.clone(),
            row.instance_id.clone(),
            row.instance_type.clone(),
            row.platform.clone(),
            row.platform_details.clone(),
            row.timestamp.clone(),
            row.average_pct.to_string(),
        ])
    }

    pub fn write_unused_snapshot(&mut self, row: &UnusedSnapshotRow) -> Result<()> {
        self.unused_snapshots.append_row(&[
            row.region.clone(),
            row.snapshot_id.clone(),
            row.volume_id.clone(),
            row.start_time.clone(),
            row.description.clone(),
        ])
    }

    pub fn write_unused_eip(&mut self, row: &UnusedEipRow) -> Result<()> {
        self.unused_eips.append_row(&[
            row.region.clone(),
            row.public_ip.clone(),
            row.allocation_id.clone(),
        ])
    }
}
