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

//! Network security groups: `ibm_pi_network_security_group_rule` resource and
//! `ibm_pi_network_security_group` data source

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock,
};
use tf_provider::value::{Value, ValueList, ValueNumber, ValueString};

use crate::client::models::{
    NetworkSecurityGroup, NetworkSecurityGroupMember, NetworkSecurityGroupRule,
    NetworkSecurityGroupRulePort, NetworkSecurityGroupRuleProtocol,
    NetworkSecurityGroupRuleRemote, NetworkSecurityGroupRuleTcpFlag,
};
use crate::utils::{attribute, value_opt_string, value_string, value_string_list};

mod data_source;
mod rule;

pub use data_source::{NsgDataSource, NsgDataState};
pub use rule::{NsgRuleResource, NsgRuleState};

pub const ACTIONS: &[&str] = &["allow", "deny"];
pub const PROTOCOLS: &[&str] = &["all", "icmp", "tcp", "udp"];
pub const REMOTE_TYPES: &[&str] = &[
    "default-network-address-group",
    "network-address-group",
    "network-security-group",
];
pub const TCP_FLAGS: &[&str] = &["ack", "fin", "psh", "rst", "syn", "urg"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgTcpFlag<'a> {
    #[serde(borrow = "'a")]
    pub flag: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgProtocol<'a> {
    #[serde(borrow = "'a", rename = "type")]
    pub protocol_type: ValueString<'a>,
    pub icmp_type: ValueNumber,
    pub icmp_code: ValueNumber,
    pub tcp_flags: ValueList<Value<NsgTcpFlag<'a>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgRemote<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(rename = "type")]
    pub remote_type: ValueString<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgPort {
    pub minimum: ValueNumber,
    pub maximum: ValueNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgMember<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub mac_address: ValueString<'a>,
    pub target: ValueString<'a>,
    #[serde(rename = "type")]
    pub member_type: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgRule<'a> {
    #[serde(borrow = "'a")]
    pub action: ValueString<'a>,
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub protocol: Value<NsgProtocol<'a>>,
    pub remote: Value<NsgRemote<'a>>,
    pub destination_port: Value<NsgPort>,
    pub source_port: Value<NsgPort>,
}

impl NsgProtocol<'_> {
    pub(crate) fn block() -> Block {
        use AttributeConstraint::{Optional, Required};
        use AttributeType::{Number, String};
        Block {
            attributes: map! {
                "type" => attribute(String, Required, "Protocol of the traffic: all, icmp, tcp or udp"),
                "icmp_type" => attribute(Number, Optional, "ICMP packet type matched by the rule"),
                "icmp_code" => attribute(Number, Optional, "ICMP packet code matched by the rule"),
            },
            blocks: map! {
                "tcp_flags" => NestedBlock::List(Block {
                    attributes: map! {
                        "flag" => attribute(String, Required, "TCP flag"),
                    },
                    description: Description::plain("TCP flags matched by the rule"),
                    ..Default::default()
                }),
            },
            description: Description::plain("Protocol of the network traffic"),
            ..Default::default()
        }
    }

    fn attributes() -> HashMap<String, Attribute> {
        use AttributeConstraint::Computed;
        use AttributeType::{AttributeList, Number, String};
        map! {
            "type" => attribute(String, Computed, "Protocol of the traffic"),
            "icmp_type" => attribute(Number, Computed, "ICMP packet type"),
            "icmp_code" => attribute(Number, Computed, "ICMP packet code"),
            "tcp_flags" => attribute(
                AttributeList(map! { "flag" => attribute(String, Computed, "TCP flag") }),
                Computed,
                "TCP flags",
            ),
        }
    }

    pub(crate) fn to_api(&self) -> NetworkSecurityGroupRuleProtocol {
        NetworkSecurityGroupRuleProtocol {
            protocol_type: self.protocol_type.as_str().to_owned(),
            icmp_type: self.icmp_type.as_option(),
            icmp_code: self.icmp_code.as_option(),
            tcp_flags: self
                .tcp_flags
                .iter()
                .flatten()
                .flatten()
                .map(|flag| NetworkSecurityGroupRuleTcpFlag {
                    flag: flag.flag.as_str().to_owned(),
                })
                .collect(),
        }
    }

    pub(crate) fn from_api(protocol: &NetworkSecurityGroupRuleProtocol) -> Self {
        Self {
            protocol_type: value_string(protocol.protocol_type.as_str()),
            icmp_type: protocol.icmp_type.into(),
            icmp_code: protocol.icmp_code.into(),
            tcp_flags: Value::Value(
                protocol
                    .tcp_flags
                    .iter()
                    .map(|flag| {
                        Value::Value(NsgTcpFlag {
                            flag: value_string(flag.flag.as_str()),
                        })
                    })
                    .collect(),
            ),
        }
    }
}

impl NsgRemote<'_> {
    pub(crate) fn block() -> Block {
        use AttributeConstraint::{Optional, Required};
        use AttributeType::String;
        Block {
            attributes: map! {
                "id" => attribute(String, Optional, "ID of the remote network address group or network security group"),
                "type" => attribute(String, Required, "Type of the remote group"),
            },
            description: Description::plain("Originators of the traffic matched by the rule"),
            ..Default::default()
        }
    }

    fn attributes() -> HashMap<String, Attribute> {
        use AttributeConstraint::Computed;
        use AttributeType::String;
        map! {
            "id" => attribute(String, Computed, "ID of the remote group"),
            "type" => attribute(String, Computed, "Type of the remote group"),
        }
    }

    pub(crate) fn to_api(&self) -> NetworkSecurityGroupRuleRemote {
        NetworkSecurityGroupRuleRemote {
            id: self.id.as_str().to_owned(),
            remote_type: self.remote_type.as_str().to_owned(),
        }
    }

    pub(crate) fn from_api(remote: &NetworkSecurityGroupRuleRemote) -> Self {
        Self {
            id: value_opt_string(Some(remote.id.clone())),
            remote_type: value_opt_string(Some(remote.remote_type.clone())),
        }
    }
}

impl NsgPort {
    pub(crate) fn block(description: &str) -> Block {
        use AttributeConstraint::Required;
        use AttributeType::Number;
        Block {
            attributes: map! {
                "minimum" => attribute(Number, Required, "Start of the port range"),
                "maximum" => attribute(Number, Required, "End of the port range"),
            },
            description: Description::plain(description),
            ..Default::default()
        }
    }

    fn attributes() -> HashMap<String, Attribute> {
        use AttributeConstraint::Computed;
        use AttributeType::Number;
        map! {
            "minimum" => attribute(Number, Computed, "Start of the port range"),
            "maximum" => attribute(Number, Computed, "End of the port range"),
        }
    }

    pub(crate) fn to_api(self) -> NetworkSecurityGroupRulePort {
        NetworkSecurityGroupRulePort {
            minimum: self.minimum.unwrap_or_default(),
            maximum: self.maximum.unwrap_or_default(),
        }
    }

    pub(crate) fn from_api(port: Option<NetworkSecurityGroupRulePort>) -> Value<Self> {
        port.map(|port| Self {
            minimum: Value::Value(port.minimum),
            maximum: Value::Value(port.maximum),
        })
        .into()
    }
}

impl<'a> NsgRule<'a> {
    fn from_api(rule: &NetworkSecurityGroupRule) -> Self {
        Self {
            action: value_string(rule.action.as_str()),
            id: value_string(rule.id.as_str()),
            name: value_string(rule.name.as_str()),
            protocol: Value::Value(NsgProtocol::from_api(&rule.protocol)),
            remote: Value::Value(NsgRemote::from_api(&rule.remote)),
            destination_port: NsgPort::from_api(rule.destination_port),
            source_port: NsgPort::from_api(rule.source_port),
        }
    }
}

impl<'a> NsgMember<'a> {
    fn from_api(member: &NetworkSecurityGroupMember) -> Self {
        Self {
            id: value_string(member.id.as_str()),
            mac_address: value_opt_string(Some(member.mac_address.clone())),
            target: value_string(member.target.as_str()),
            member_type: value_string(member.member_type.as_str()),
        }
    }
}

/// Schema of the attributes flattened from a network security group
pub(crate) fn nsg_attributes() -> HashMap<String, Attribute> {
    use AttributeConstraint::Computed;
    use AttributeType::{AttributeList, AttributeSingle, List, Number, String};
    let port = || AttributeSingle(NsgPort::attributes());
    map! {
        "crn" => attribute(String, Computed, "CRN of the network security group"),
        "name" => attribute(String, Computed, "Name of the network security group"),
        "user_tags" => attribute(List(String.into()), Computed, "User tags of the network security group"),
        "members" => attribute(
            AttributeList(map! {
                "id" => attribute(String, Computed, "ID of the member"),
                "mac_address" => attribute(String, Computed, "MAC address of the network interface"),
                "target" => attribute(String, Computed, "IPv4 address or network interface ID"),
                "type" => attribute(String, Computed, "Type of the member"),
            }),
            Computed,
            "Members of the network security group",
        ),
        "rules" => attribute(
            AttributeList(map! {
                "action" => attribute(String, Computed, "Action taken when the rule matches"),
                "id" => attribute(String, Computed, "ID of the rule"),
                "name" => attribute(String, Computed, "Name of the rule"),
                "protocol" => attribute(AttributeSingle(NsgProtocol::attributes()), Computed, "Protocol of the traffic"),
                "remote" => attribute(AttributeSingle(NsgRemote::attributes()), Computed, "Originators of the traffic"),
                "destination_port" => attribute(port(), Computed, "Destination port range"),
                "source_port" => attribute(port(), Computed, "Source port range"),
            }),
            Computed,
            "Rules of the network security group",
        ),
    }
}

/// Computed view of a network security group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct FlatNsg<'a> {
    pub crn: ValueString<'a>,
    pub name: ValueString<'a>,
    pub user_tags: ValueList<ValueString<'a>>,
    pub members: ValueList<Value<NsgMember<'a>>>,
    pub rules: ValueList<Value<NsgRule<'a>>>,
}

impl<'a> FlatNsg<'a> {
    pub(crate) fn unknown() -> Self {
        Self {
            crn: Value::Unknown,
            name: Value::Unknown,
            user_tags: Value::Unknown,
            members: Value::Unknown,
            rules: Value::Unknown,
        }
    }

    pub(crate) fn from_api(nsg: &NetworkSecurityGroup) -> Self {
        Self {
            crn: value_opt_string(Some(nsg.crn.clone())),
            name: value_string(nsg.name.as_str()),
            user_tags: value_string_list(nsg.user_tags.iter().map(String::as_str)),
            members: Value::Value(
                nsg.members
                    .iter()
                    .map(|member| Value::Value(NsgMember::from_api(member)))
                    .collect(),
            ),
            rules: Value::Value(
                nsg.rules
                    .iter()
                    .map(|rule| Value::Value(NsgRule::from_api(rule)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn nsg() -> NetworkSecurityGroup {
        NetworkSecurityGroup {
            id: "nsg".into(),
            name: "web".into(),
            crn: "crn:v1:nsg".into(),
            members: vec![NetworkSecurityGroupMember {
                id: "member".into(),
                mac_address: String::new(),
                target: "10.0.0.4".into(),
                member_type: "ipv4-address".into(),
            }],
            rules: vec![NetworkSecurityGroupRule {
                id: "rule".into(),
                name: "ssh".into(),
                action: "allow".into(),
                protocol: NetworkSecurityGroupRuleProtocol {
                    protocol_type: "tcp".into(),
                    tcp_flags: vec![NetworkSecurityGroupRuleTcpFlag { flag: "syn".into() }],
                    ..Default::default()
                },
                remote: NetworkSecurityGroupRuleRemote {
                    id: String::new(),
                    remote_type: "default-network-address-group".into(),
                },
                destination_port: Some(NetworkSecurityGroupRulePort {
                    minimum: 22,
                    maximum: 22,
                }),
                source_port: None,
            }],
            user_tags: vec!["env:test".into()],
        }
    }

    #[test]
    fn flatten_group() {
        let flat = FlatNsg::from_api(&nsg());
        assert_eq!(flat.crn.as_str(), "crn:v1:nsg");
        let members = flat.members.as_ref_option().unwrap();
        assert!(members[0].as_ref_option().unwrap().mac_address.is_null());
        let rules = flat.rules.as_ref_option().unwrap();
        let rule = rules[0].as_ref_option().unwrap();
        assert_eq!(rule.id.as_str(), "rule");
        assert!(rule.source_port.is_null());
        assert_eq!(
            rule.destination_port,
            Value::Value(NsgPort {
                minimum: Value::Value(22),
                maximum: Value::Value(22),
            })
        );
        assert!(rule.remote.as_ref_option().unwrap().id.is_null());
    }

    #[test]
    fn protocol_to_api_keeps_flags() {
        let protocol = NsgProtocol::from_api(&nsg().rules[0].protocol);
        assert_eq!(protocol.to_api(), nsg().rules[0].protocol);
    }
}
