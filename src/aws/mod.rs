//! AWS collectors
//!
//! This module holds the region-scoped plumbing for the audit:
//! - `ec2`: read-only describe enumerators for instances, volumes,
//!   snapshots, and Elastic IPs
//! - `cloudwatch`: utilization metric fetchers over the shared window
//!
//! Direct SDK calls are used rather than shelling out to the AWS CLI:
//! typed responses remove a whole class of text re-parsing fragility, and
//! the SDK's credential chain picks up whatever the environment provides.

pub mod cloudwatch;
pub mod ec2;

use aws_config::{BehaviorVersion, Region};

/// Region-scoped clients for one audit pass.
///
/// Both EC2 and CloudWatch are regional APIs; the audit loop connects a
/// fresh pair per region and drops them when the region is done.
pub struct RegionClients {
    pub region: String,
    pub ec2: aws_sdk_ec2::Client,
    pub cloudwatch: aws_sdk_cloudwatch::Client,
}

impl RegionClients {
    /// Build clients for `region` from the default credential chain.
    pub async fn connect(region: &str) -> Self {
        let conf = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            region: region.to_string(),
            ec2: aws_sdk_ec2::Client::new(&conf),
            cloudwatch: aws_sdk_cloudwatch::Client::new(&conf),
        }
    }
}
