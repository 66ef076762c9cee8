// This file is part of the terraform-provider-powervs project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wire models of the PowerVS API

use serde::{Deserialize, Serialize};

// Cloud instance (workspace)

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudInstance {
    #[serde(rename = "cloudInstanceID")]
    pub cloud_instance_id: String,
    pub name: String,
    pub region: String,
    pub enabled: bool,
    pub capabilities: Vec<String>,
}

// PVM instances

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PvmInstance {
    #[serde(rename = "pvmInstanceID")]
    pub pvm_instance_id: String,
    pub server_name: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    pub status: String,
    pub proc_type: String,
    pub processors: f64,
    pub memory: f64,
    pub minproc: f64,
    pub maxproc: f64,
    pub minmem: f64,
    pub maxmem: f64,
    pub migratable: Option<bool>,
    pub progress: f64,
    pub storage_type: Option<String>,
    pub storage_pool: String,
    pub storage_pool_affinity: Option<bool>,
    pub placement_group: Option<String>,
    pub shared_processor_pool: String,
    #[serde(rename = "sharedProcessorPoolID")]
    pub shared_processor_pool_id: String,
    pub networks: Vec<PvmInstanceNetwork>,
    pub sap_profile: Option<SapProfileReference>,
    pub sys_type: String,
    pub pin_policy: String,
    pub operating_system: String,
    pub os_type: Option<String>,
    pub health: Option<PvmInstanceHealth>,
    pub virtual_cores: Option<VirtualCores>,
    pub license_repository_capacity: i64,
    pub virtual_serial_number: Option<InstanceVirtualSerialNumber>,
}

impl PvmInstance {
    pub fn health_status(&self) -> &str {
        self.health.as_ref().map_or("", |h| h.status.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PvmInstanceNetwork {
    pub ip_address: String,
    pub mac_address: String,
    #[serde(rename = "networkID")]
    pub network_id: String,
    pub network_name: String,
    #[serde(rename = "type")]
    pub network_type: String,
    #[serde(rename = "externalIP")]
    pub external_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PvmInstanceHealth {
    pub status: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SapProfileReference {
    #[serde(rename = "profileID")]
    pub profile_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VirtualCores {
    pub assigned: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
}

impl VirtualCores {
    pub fn assigned(assigned: i64) -> Self {
        Self {
            assigned,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceVirtualSerialNumber {
    pub serial: String,
    pub description: String,
    pub software_tier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PvmInstanceAddNetwork {
    #[serde(rename = "networkID")]
    pub network_id: String,
    #[serde(rename = "ipAddress", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageAffinity {
    pub affinity_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affinity_volume: Option<String>,
    #[serde(rename = "affinityPVMInstance", skip_serializing_if = "Option::is_none")]
    pub affinity_pvm_instance: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub anti_affinity_volumes: Vec<String>,
    #[serde(
        rename = "antiAffinityPVMInstances",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub anti_affinity_pvm_instances: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PvmInstanceCreate {
    pub server_name: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    pub processors: f64,
    pub memory: f64,
    pub proc_type: String,
    pub sys_type: String,
    pub networks: Vec<PvmInstanceAddNetwork>,
    #[serde(rename = "volumeIDs", skip_serializing_if = "Vec::is_empty")]
    pub volume_ids: Vec<String>,
    pub replicants: i64,
    pub replicant_naming_scheme: String,
    pub replicant_affinity_policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pair_name: Option<String>,
    pub migratable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_cores: Option<VirtualCores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_affinity: Option<StorageAffinity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_connection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_processor_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_repository_capacity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PvmInstanceMultiCreate {
    pub affinity_policy: String,
    pub count: i64,
    pub numerical: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SapCreate {
    pub name: String,
    #[serde(rename = "profileID")]
    pub profile_id: String,
    #[serde(rename = "imageID")]
    pub image_id: String,
    pub networks: Vec<PvmInstanceAddNetwork>,
    pub instances: PvmInstanceMultiCreate,
    #[serde(rename = "volumeIDs", skip_serializing_if = "Vec::is_empty")]
    pub volume_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sys_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_affinity: Option<StorageAffinity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PvmInstanceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proc_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processors: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migratable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_cores: Option<VirtualCores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_repository_capacity: Option<i64>,
    #[serde(rename = "sapProfileID", skip_serializing_if = "Option::is_none")]
    pub sap_profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_pool_affinity: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PvmInstanceAction {
    pub action: String,
}

// Images and jobs

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    #[serde(rename = "imageID")]
    pub image_id: String,
    pub name: String,
    pub state: String,
    pub specifications: Option<ImageSpecifications>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSpecifications {
    pub image_type: String,
    pub operating_system: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExportImage {
    pub bucket_name: String,
    pub region: String,
    pub access_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobReference {
    pub id: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub id: String,
    pub operation: JobOperation,
    pub status: JobStatus,
    pub creation_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobOperation {
    pub action: String,
    pub id: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobStatus {
    pub state: String,
    pub message: String,
    pub progress: String,
}

// Placement groups

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlacementGroup {
    pub id: String,
    pub name: String,
    pub policy: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlacementGroups {
    #[serde(rename = "placementGroups")]
    pub placement_groups: Vec<PlacementGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlacementGroupCreate {
    pub name: String,
    pub policy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlacementGroupServer {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SppPlacementGroups {
    #[serde(rename = "sppPlacementGroups")]
    pub spp_placement_groups: Vec<PlacementGroup>,
}

// Shared processor pools

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SharedProcessorPool {
    pub id: String,
    pub name: String,
    pub host_group: String,
    pub reserved_cores: i64,
    pub allocated_cores: f64,
    pub available_cores: f64,
    #[serde(rename = "hostID")]
    pub host_id: i64,
    pub status: String,
    pub status_detail: String,
    #[serde(rename = "sharedProcessorPoolPlacementGroups")]
    pub spp_placement_groups: Vec<PlacementGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SharedProcessorPoolDetail {
    pub shared_processor_pool: SharedProcessorPool,
    pub servers: Vec<SharedProcessorPoolServer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SharedProcessorPoolServer {
    pub id: String,
    pub name: String,
    pub cpus: f64,
    pub uncapped: bool,
    pub vcpus: f64,
    pub memory: i64,
    pub availability_zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SharedProcessorPools {
    #[serde(rename = "sharedProcessorPools")]
    pub shared_processor_pools: Vec<SharedProcessorPool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SharedProcessorPoolCreate {
    pub name: String,
    pub host_group: String,
    pub reserved_cores: i64,
    #[serde(rename = "placementGroupID", skip_serializing_if = "Option::is_none")]
    pub placement_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SharedProcessorPoolUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_cores: Option<i64>,
}

// Network security groups

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSecurityGroup {
    pub id: String,
    pub name: String,
    pub crn: String,
    pub members: Vec<NetworkSecurityGroupMember>,
    pub rules: Vec<NetworkSecurityGroupRule>,
    pub user_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSecurityGroupMember {
    pub id: String,
    pub mac_address: String,
    pub target: String,
    #[serde(rename = "type")]
    pub member_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSecurityGroupRule {
    pub id: String,
    pub name: String,
    pub action: String,
    pub protocol: NetworkSecurityGroupRuleProtocol,
    pub remote: NetworkSecurityGroupRuleRemote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_port: Option<NetworkSecurityGroupRulePort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<NetworkSecurityGroupRulePort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSecurityGroupRuleProtocol {
    #[serde(rename = "type")]
    pub protocol_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp_code: Option<i64>,
    #[serde(rename = "tcpFlags", skip_serializing_if = "Vec::is_empty")]
    pub tcp_flags: Vec<NetworkSecurityGroupRuleTcpFlag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkSecurityGroupRuleTcpFlag {
    pub flag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkSecurityGroupRuleRemote {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub remote_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NetworkSecurityGroupRulePort {
    pub minimum: i64,
    pub maximum: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSecurityGroupAddRule {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub protocol: NetworkSecurityGroupRuleProtocol,
    pub remote: NetworkSecurityGroupRuleRemote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_ports: Option<NetworkSecurityGroupRulePort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ports: Option<NetworkSecurityGroupRulePort>,
}

// Virtual serial numbers

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualSerialNumber {
    pub serial: String,
    pub description: String,
    #[serde(rename = "pvmInstanceID")]
    pub pvm_instance_id: Option<String>,
    pub software_tier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AddServerVirtualSerialNumber {
    pub serial: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServerVirtualSerialNumber {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_tier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpdateVirtualSerialNumber {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeleteServerVirtualSerialNumber {
    #[serde(rename = "retainVSN")]
    pub retain_vsn: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn pvm_instance_tolerates_missing_fields() {
        let pvm: PvmInstance = serde_json::from_value(json!({
            "pvmInstanceID": "pvm-1",
            "serverName": "lpar",
            "status": "ACTIVE",
            "health": { "status": "OK" },
            "networks": [{ "networkID": "net", "ipAddress": "10.0.0.2", "type": "fixed" }],
            "placementGroup": "none",
        }))
        .unwrap();
        assert_eq!(pvm.pvm_instance_id, "pvm-1");
        assert_eq!(pvm.health_status(), "OK");
        assert_eq!(pvm.networks[0].network_type, "fixed");
        assert_eq!(pvm.placement_group.as_deref(), Some("none"));
        assert_eq!(pvm.memory, 0.0);
        assert!(pvm.virtual_cores.is_none());
    }

    #[test]
    fn update_only_sends_given_fields() {
        let update = PvmInstanceUpdate {
            storage_pool_affinity: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            json!({ "storagePoolAffinity": false })
        );
    }

    #[test]
    fn add_rule_wire_names() {
        let rule = NetworkSecurityGroupAddRule {
            action: "allow".into(),
            name: None,
            protocol: NetworkSecurityGroupRuleProtocol {
                protocol_type: "tcp".into(),
                tcp_flags: vec![NetworkSecurityGroupRuleTcpFlag { flag: "syn".into() }],
                ..Default::default()
            },
            remote: NetworkSecurityGroupRuleRemote {
                id: String::new(),
                remote_type: "default-network-address-group".into(),
            },
            destination_ports: Some(NetworkSecurityGroupRulePort {
                minimum: 22,
                maximum: 22,
            }),
            source_ports: None,
        };
        assert_eq!(
            serde_json::to_value(rule).unwrap(),
            json!({
                "action": "allow",
                "protocol": { "type": "tcp", "tcpFlags": [{ "flag": "syn" }] },
                "remote": { "type": "default-network-address-group" },
                "destinationPorts": { "minimum": 22, "maximum": 22 },
            })
        );
    }
}
