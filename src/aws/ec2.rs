//! Read-only EC2 resource enumerators
//!
//! Each enumerator issues describe calls against one region's client and
//! projects the response into a flat record carrying only the fields the
//! reports need. Describe calls that support `next_token` run a pagination
//! loop so accounts larger than a single page are not silently truncated.
//!
//! An empty result set is a normal, typed empty vector - the audit loop
//! simply iterates zero times over it.

use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client as Ec2Client;

use crate::error::{wrap_aws_error, Result};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};
use crate::window::iso8601;

/// Static attributes of one EC2 instance
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    pub id: String,
    pub instance_type: String,
    pub platform: String,
    pub platform_details: String,
}

/// One EBS volume plus its first attachment, if any.
///
/// The reports only ever show a single attachment; multi-attach volumes
/// keep whatever the API lists first.
#[derive(Debug, Clone)]
pub struct VolumeRecord {
    pub id: String,
    pub state: String,
    pub attachment_state: String,
    pub attachment_time: String,
    pub instance_id: String,
    pub device: String,
}

/// One EBS snapshot
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub id: String,
    pub volume_id: String,
    pub start_time: String,
    pub description: String,
}

/// One Elastic IP allocation
#[derive(Debug, Clone)]
pub struct AddressRecord {
    pub public_ip: String,
    pub allocation_id: String,
    pub association_id: Option<String>,
}

/// List all instances in the region
pub async fn list_instances(client: &Ec2Client) -> Result<Vec<InstanceRecord>> {
    let mut records = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page_token = token.clone();
        let response = ExponentialBackoffPolicy::for_cloud_api()
            .execute_with_retry(|| async {
                let mut req = client.describe_instances();
                if let Some(t) = page_token.as_deref() {
                    req = req.next_token(t);
                }
                req.send()
                    .await
                    .map_err(|e| wrap_aws_error("Failed to list EC2 instances", e))
            })
            .await?;

        for reservation in response.reservations() {
            for instance in reservation.instances() {
                if let Some(record) = instance_record(instance) {
                    records.push(record);
                }
            }
        }

        token = response.next_token().map(|s| s.to_string());
        if token.is_none() {
            break;
        }
    }

    Ok(records)
}

/// List all volumes in the region
pub async fn list_volumes(client: &Ec2Client) -> Result<Vec<VolumeRecord>> {
    describe_volumes(client, None).await
}

/// List volumes not attached to any instance.
///
/// Uses the server-side `status = available` filter, so attached volumes
/// never cross the wire.
pub async fn list_available_volumes(client: &Ec2Client) -> Result<Vec<VolumeRecord>> {
    let filter = Filter::builder().name("status").values("available").build();
    describe_volumes(client, Some(filter)).await
}

async fn describe_volumes(client: &Ec2Client, filter: Option<Filter>) -> Result<Vec<VolumeRecord>> {
    let mut records = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page_token = token.clone();
        let page_filter = filter.clone();
        let response = ExponentialBackoffPolicy::for_cloud_api()
            .execute_with_retry(|| async {
                let mut req = client.describe_volumes();
                if let Some(f) = page_filter.clone() {
                    req = req.filters(f);
                }
                if let Some(t) = page_token.as_deref() {
                    req = req.next_token(t);
                }
                req.send()
                    .await
                    .map_err(|e| wrap_aws_error("Failed to list EBS volumes", e))
            })
            .await?;

        for volume in response.volumes() {
            if let Some(record) = volume_record(volume) {
                records.push(record);
            }
        }

        token = response.next_token().map(|s| s.to_string());
        if token.is_none() {
            break;
        }
    }

    Ok(records)
}

/// List snapshots whose source volume is `volume_id`
pub async fn list_snapshots_for_volume(
    client: &Ec2Client,
    volume_id: &str,
) -> Result<Vec<SnapshotRecord>> {
    let mut records = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page_token = token.clone();
        let response = ExponentialBackoffPolicy::for_cloud_api()
            .execute_with_retry(|| async {
                let mut req = client.describe_snapshots().filters(
                    Filter::builder()
                        .name("volume-id")
                        .values(volume_id)
                        .build(),
                );
                if let Some(t) = page_token.as_deref() {
                    req = req.next_token(t);
                }
                req.send()
                    .await
                    .map_err(|e| wrap_aws_error("Failed to list EBS snapshots", e))
            })
            .await?;

        for snapshot in response.snapshots() {
            if let Some(record) = snapshot_record(snapshot) {
                records.push(record);
            }
        }

        token = response.next_token().map(|s| s.to_string());
        if token.is_none() {
            break;
        }
    }

    Ok(records)
}

/// List all Elastic IP allocations in the region.
///
/// DescribeAddresses returns the complete set in one response; there is no
/// pagination token for this call.
pub async fn list_addresses(client: &Ec2Client) -> Result<Vec<AddressRecord>> {
    let response = ExponentialBackoffPolicy::for_cloud_api()
        .execute_with_retry(|| async {
            client
                .describe_addresses()
                .send()
                .await
                .map_err(|e| wrap_aws_error("Failed to list Elastic IPs", e))
        })
        .await?;

    Ok(response.addresses().iter().map(address_record).collect())
}

/// Keep only allocations with no association.
///
/// The describe-addresses filter language cannot express "association-id
/// is absent", so the filter runs client-side on the returned field set.
pub fn unassociated_addresses(addresses: Vec<AddressRecord>) -> Vec<AddressRecord> {
    addresses
        .into_iter()
        .filter(|a| a.association_id.is_none())
        .collect()
}

fn instance_record(instance: &aws_sdk_ec2::types::Instance) -> Option<InstanceRecord> {
    let id = instance.instance_id()?.to_string();
    Some(InstanceRecord {
        id,
        instance_type: instance
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        platform: instance
            .platform()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
        platform_details: instance.platform_details().unwrap_or_default().to_string(),
    })
}

fn volume_record(volume: &aws_sdk_ec2::types::Volume) -> Option<VolumeRecord> {
    let id = volume.volume_id()?.to_string();
    let attachment = volume.attachments().first();
    Some(VolumeRecord {
        id,
        state: volume
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        attachment_state: attachment
            .and_then(|a| a.state())
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        attachment_time: attachment
            .and_then(|a| a.attach_time())
            .map(smithy_timestamp)
            .unwrap_or_default(),
        instance_id: attachment
            .and_then(|a| a.instance_id())
            .unwrap_or_default()
            .to_string(),
        device: attachment
            .and_then(|a| a.device())
            .unwrap_or_default()
            .to_string(),
    })
}

fn snapshot_record(snapshot: &aws_sdk_ec2::types::Snapshot) -> Option<SnapshotRecord> {
    let id = snapshot.snapshot_id()?.to_string();
    Some(SnapshotRecord {
        id,
        volume_id: snapshot.volume_id().unwrap_or_default().to_string(),
        start_time: snapshot
            .start_time()
            .map(smithy_timestamp)
            .unwrap_or_default(),
        description: snapshot.description().unwrap_or_default().to_string(),
    })
}

fn address_record(address: &aws_sdk_ec2::types::Address) -> AddressRecord {
    AddressRecord {
        public_ip: address.public_ip().unwrap_or_default().to_string(),
        allocation_id: address.allocation_id().unwrap_or_default().to_string(),
        association_id: address.association_id().map(|s| s.to_string()),
    }
}

fn smithy_timestamp(t: &aws_sdk_ec2::primitives::DateTime) -> String {
    chrono::DateTime::from_timestamp(t.secs(), 0)
        .map(iso8601)
        .unwrap_or_default()
}
