//! CloudWatch utilization metric fetchers
//!
//! One GetMetricStatistics call per resource per metric, all over the same
//! shared window. With the default 90-day window and 30-day period each
//! call returns at most 3 aggregated datapoints.

use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Datapoint as CwDatapoint, Dimension, Statistic};
use aws_sdk_cloudwatch::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{wrap_aws_error, Result};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use crate::window::MetricWindow;

const EC2_NAMESPACE: &str = "AWS/EC2";
const EBS_NAMESPACE: &str = "AWS/EBS";

/// One aggregated statistic value within the query window
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Which EBS operations metric to fetch. Read and write series are fetched
/// independently and emitted as separate rows - they are never joined by
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeMetric {
    ReadOps,
    WriteOps,
}

impl VolumeMetric {
    pub fn metric_name(&self) -> &'static str {
        match self {
            VolumeMetric::ReadOps => "VolumeReadOps",
            VolumeMetric::WriteOps => "VolumeWriteOps",
        }
    }
}

/// Average CPU utilization datapoints for one instance
pub async fn instance_cpu_utilization(
    client: &Client,
    instance_id: &str,
    window: &MetricWindow,
) -> Result<Vec<Datapoint>> {
    let response = ExponentialBackoffPolicy::for_cloud_api()
        .execute_with_retry(|| async {
            client
                .get_metric_statistics()
                .namespace(EC2_NAMESPACE)
                .metric_name("CPUUtilization")
                .dimensions(
                    Dimension::builder()
                        .name("InstanceId")
                        .value(instance_id)
                        .build(),
                )
                .start_time(AwsDateTime::from_secs(window.start.timestamp()))
                .end_time(AwsDateTime::from_secs(window.end.timestamp()))
                .period(window.period_secs)
                .statistics(Statistic::Average)
                .send()
                .await
                .map_err(|e| wrap_aws_error("Failed to fetch CPUUtilization", e))
        })
        .await?;

    let datapoints = collect_datapoints(response.datapoints(), Statistic::Average);
    debug!(
        instance = %instance_id,
        datapoints = datapoints.len(),
        "Fetched CPU utilization"
    );
    Ok(datapoints)
}

/// Maximum read-ops or write-ops datapoints for one volume
pub async fn volume_ops(
    client: &Client,
    volume_id: &str,
    metric: VolumeMetric,
    window: &MetricWindow,
) -> Result<Vec<Datapoint>> {
    let response = ExponentialBackoffPolicy::for_cloud_api()
        .execute_with_retry(|| async {
            client
                .get_metric_statistics()
                .namespace(EBS_NAMESPACE)
                .metric_name(metric.metric_name())
                .dimensions(
                    Dimension::builder()
                        .name("VolumeId")
                        .value(volume_id)
                        .build(),
                )
                .start_time(AwsDateTime::from_secs(window.start.timestamp()))
                .end_time(AwsDateTime::from_secs(window.end.timestamp()))
                .period(window.period_secs)
                .statistics(Statistic::Maximum)
                .send()
                .await
                .map_err(|e| {
                    wrap_aws_error(&format!("Failed to fetch {}", metric.metric_name()), e)
                })
        })
        .await?;

    let datapoints = collect_datapoints(response.datapoints(), Statistic::Maximum);
    debug!(
        volume = %volume_id,
        metric = metric.metric_name(),
        datapoints = datapoints.len(),
        "Fetched volume ops"
    );
    Ok(datapoints)
}

/// Project SDK datapoints onto (timestamp, value) pairs, sorted by
/// timestamp. GetMetricStatistics returns periods in no particular order.
fn collect_datapoints(raw: &[CwDatapoint], statistic: Statistic) -> Vec<Datapoint> {
    let mut datapoints: Vec<Datapoint> = raw
        .iter()
        .filter_map(|dp| to_datapoint(dp, &statistic))
        .collect();
    datapoints.sort_by_key(|dp| dp.timestamp);
    datapoints
}

fn to_datapoint(dp: &CwDatapoint, statistic: &Statistic) -> Option<Datapoint> {
    let value = match statistic {
        Statistic::Average => dp.average(),
        Statistic::Maximum => dp.maximum(),
        Statistic::Minimum => dp.minimum(),
        Statistic::Sum => dp.sum(),
        _ => dp.sample_count(),
    }?;
    let timestamp = dp.timestamp()?;
    let timestamp = chrono::DateTime::from_timestamp(timestamp.secs(), 0)?;
    Some(Datapoint { timestamp, value })
}
