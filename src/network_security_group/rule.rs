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

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{map, value, AttributePath, Diagnostics, Resource};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueEmpty, ValueList, ValueString};
use tracing::{info, warn};

use crate::client::models::{NetworkSecurityGroup, NetworkSecurityGroupAddRule};
use crate::client::NsgClient;
use crate::powervs_provider::ProviderHandle;
use crate::state_change::StateChangeConf;
use crate::timeouts::{DefaultTimeouts, Timeouts, TimeoutsExt};
use crate::utils::{
    attribute, changed, join_id, non_empty, split_id, validate_conflict, validate_one_of,
    value_string, WithSchema, WithValidate,
};

use super::{
    nsg_attributes, FlatNsg, NsgMember, NsgPort, NsgProtocol, NsgRemote, NsgRule, ACTIONS,
    PROTOCOLS, REMOTE_TYPES, TCP_FLAGS,
};

pub const RULE_TIMEOUTS: DefaultTimeouts = DefaultTimeouts::all(Duration::from_secs(10 * 60));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NsgRuleState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_network_security_group_id: ValueString<'a>,
    pub pi_network_security_group_rule_id: ValueString<'a>,
    pub pi_action: ValueString<'a>,
    pub pi_name: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub pi_protocol: Value<NsgProtocol<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub pi_remote: Value<NsgRemote<'a>>,
    #[serde(with = "value::serde_as_vec")]
    pub pi_destination_port: Value<NsgPort>,
    #[serde(with = "value::serde_as_vec")]
    pub pi_source_port: Value<NsgPort>,

    pub crn: ValueString<'a>,
    pub name: ValueString<'a>,
    pub user_tags: ValueList<ValueString<'a>>,
    pub members: ValueList<Value<NsgMember<'a>>>,
    pub rules: ValueList<Value<NsgRule<'a>>>,

    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

impl WithSchema for NsgRuleState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, Required};
        let string = || AttributeType::String;
        let own: HashMap<String, Attribute> = map! {
            "id" => attribute(string(), Computed, "`<cloud_instance_id>/<nsg_id>/<rule_id>` when adding a rule, `<cloud_instance_id>/<nsg_id>` when removing one"),
            "pi_cloud_instance_id" => attribute(string(), Required, "ID of the PowerVS workspace"),
            "pi_network_security_group_id" => attribute(string(), Required, "ID of the network security group"),
            "pi_network_security_group_rule_id" => attribute(string(), Optional, "ID of the rule to remove; a rule is added when unset"),
            "pi_action" => attribute(string(), Optional, "Action taken when the rule matches: allow or deny"),
            "pi_name" => attribute(string(), Optional, "Name of the rule to add"),
        };
        let mut attributes = nsg_attributes();
        attributes.extend(own);
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes,
                blocks: map! {
                    "pi_protocol" => NestedBlock::Optional(NsgProtocol::block()),
                    "pi_remote" => NestedBlock::Optional(NsgRemote::block()),
                    "pi_destination_port" => NestedBlock::Optional(NsgPort::block("Destination port range of the rule")),
                    "pi_source_port" => NestedBlock::Optional(NsgPort::block("Source port range of the rule")),
                    "timeouts" => RULE_TIMEOUTS.block(),
                },
                description: Description::plain(
                    "Add a rule to, or remove a rule from, an IBM PowerVS network security group",
                ),
                ..Default::default()
            },
        }
    }
}

fn validate_port(diags: &mut Diagnostics, port: &Value<NsgPort>, attr_path: AttributePath) {
    let Value::Value(NsgPort {
        minimum: Value::Value(min),
        maximum: Value::Value(max),
    }) = port
    else {
        return;
    };
    if !(1 <= *min && min <= max && *max <= 65535) {
        diags.error(
            "Invalid port range",
            format!("Port ranges must satisfy 1 <= minimum <= maximum <= 65535, got {min}-{max}."),
            attr_path,
        );
    }
}

impl WithValidate for NsgRuleState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        let path = |name: &'static str| attr_path.clone().attribute(name);

        if !self.pi_network_security_group_rule_id.is_null() {
            let rule_id = ("pi_network_security_group_rule_id", &self.pi_network_security_group_rule_id);
            validate_conflict(diags, ("pi_action", &self.pi_action), rule_id, attr_path.clone());
            validate_conflict(diags, ("pi_name", &self.pi_name), rule_id, attr_path.clone());
            validate_conflict(diags, ("pi_protocol", &self.pi_protocol), rule_id, attr_path.clone());
            validate_conflict(diags, ("pi_remote", &self.pi_remote), rule_id, attr_path.clone());
            validate_conflict(
                diags,
                ("pi_destination_port", &self.pi_destination_port),
                rule_id,
                attr_path.clone(),
            );
            validate_conflict(
                diags,
                ("pi_source_port", &self.pi_source_port),
                rule_id,
                attr_path.clone(),
            );
        } else {
            if self.pi_action.is_null() {
                diags.error_short("`pi_action` is required when adding a rule", path("pi_action"));
            }
            if self.pi_protocol.is_null() {
                diags.error_short("`pi_protocol` is required when adding a rule", path("pi_protocol"));
            }
        }

        validate_one_of(diags, &self.pi_action, ACTIONS, path("pi_action"));

        if let Value::Value(protocol) = &self.pi_protocol {
            let protocol_path = path("pi_protocol");
            validate_one_of(
                diags,
                &protocol.protocol_type,
                PROTOCOLS,
                protocol_path.clone().attribute("type"),
            );
            if let Value::Value(protocol_type) = &protocol.protocol_type {
                if protocol_type != "icmp" {
                    for (name, value) in [("icmp_type", &protocol.icmp_type), ("icmp_code", &protocol.icmp_code)] {
                        if value.is_value() {
                            diags.error_short(
                                format!("`{name}` only applies to the icmp protocol"),
                                protocol_path.clone().attribute(name),
                            );
                        }
                    }
                }
                let has_flags = protocol
                    .tcp_flags
                    .as_ref_option()
                    .is_some_and(|flags| !flags.is_empty());
                if protocol_type != "tcp" && has_flags {
                    diags.error_short(
                        "`tcp_flags` only applies to the tcp protocol",
                        protocol_path.clone().attribute("tcp_flags"),
                    );
                }
            }
            for (i, flag) in protocol.tcp_flags.iter().flatten().enumerate() {
                if let Value::Value(flag) = flag {
                    validate_one_of(
                        diags,
                        &flag.flag,
                        TCP_FLAGS,
                        protocol_path.clone().attribute("tcp_flags").index(i as i64).attribute("flag"),
                    );
                }
            }
        }

        if let Value::Value(remote) = &self.pi_remote {
            validate_one_of(
                diags,
                &remote.remote_type,
                REMOTE_TYPES,
                path("pi_remote").attribute("type"),
            );
        }
        validate_port(diags, &self.pi_destination_port, path("pi_destination_port"));
        validate_port(diags, &self.pi_source_port, path("pi_source_port"));

        if let Value::Value(timeouts) = &self.timeouts {
            timeouts.validate(diags, path("timeouts"));
        }
    }
}

impl<'a> NsgRuleState<'a> {
    fn set_flat(&mut self, flat: FlatNsg<'a>) {
        self.crn = flat.crn;
        self.name = flat.name;
        self.user_tags = flat.user_tags;
        self.members = flat.members;
        self.rules = flat.rules;
    }

    /// Rebuild the arguments of an added rule, used after an import
    fn set_rule_arguments(&mut self, nsg: &NetworkSecurityGroup, rule_id: &str) {
        let Some(rule) = nsg.rules.iter().find(|rule| rule.id == rule_id) else {
            return;
        };
        self.pi_action = value_string(rule.action.as_str());
        self.pi_name = value_string(rule.name.as_str());
        self.pi_protocol = Value::Value(NsgProtocol::from_api(&rule.protocol));
        self.pi_remote = Value::Value(NsgRemote::from_api(&rule.remote));
        self.pi_destination_port = NsgPort::from_api(rule.destination_port);
        self.pi_source_port = NsgPort::from_api(rule.source_port);
    }

    fn add_rule_body(&self) -> NetworkSecurityGroupAddRule {
        NetworkSecurityGroupAddRule {
            action: self.pi_action.as_str().to_owned(),
            name: non_empty(&self.pi_name).map(str::to_owned),
            protocol: self
                .pi_protocol
                .as_ref_option()
                .map(NsgProtocol::to_api)
                .unwrap_or_default(),
            remote: self
                .pi_remote
                .as_ref_option()
                .map(NsgRemote::to_api)
                .unwrap_or_default(),
            destination_ports: self.pi_destination_port.as_option().map(NsgPort::to_api),
            source_ports: self.pi_source_port.as_option().map(NsgPort::to_api),
        }
    }
}

/// Wait until the rule shows up in the network security group
async fn wait_rule_added(
    client: &NsgClient,
    nsg_id: &str,
    rule_id: &str,
    timeout: Duration,
) -> Result<NetworkSecurityGroup> {
    info!(nsg_id, rule_id, "waiting for the network security group rule to be added");
    StateChangeConf::new(&["pending"], &["available"], timeout)
        .delay(Duration::from_secs(10))
        .min_timeout(Duration::from_secs(10))
        .wait_for_state(|| async move {
            let nsg = client.get(nsg_id).await?;
            let state = if nsg.rules.iter().any(|rule| rule.id == rule_id) {
                "available"
            } else {
                "pending"
            };
            Ok::<_, anyhow::Error>((Some(nsg), state.to_owned()))
        })
        .await?
        .ok_or_else(|| anyhow!("network security group {nsg_id} disappeared"))
}

/// Wait until the rule is gone from the network security group
async fn wait_rule_removed(
    client: &NsgClient,
    nsg_id: &str,
    rule_id: &str,
    timeout: Duration,
) -> Result<NetworkSecurityGroup> {
    info!(nsg_id, rule_id, "waiting for the network security group rule to be removed");
    StateChangeConf::new(&["pending"], &["removed"], timeout)
        .delay(Duration::from_secs(10))
        .min_timeout(Duration::from_secs(10))
        .wait_for_state(|| async move {
            let nsg = client.get(nsg_id).await?;
            let state = if nsg.rules.iter().any(|rule| rule.id == rule_id) {
                "pending"
            } else {
                "removed"
            };
            Ok::<_, anyhow::Error>((Some(nsg), state.to_owned()))
        })
        .await?
        .ok_or_else(|| anyhow!("network security group {nsg_id} disappeared"))
}

#[derive(Debug, Default, Clone)]
pub struct NsgRuleResource {
    handle: ProviderHandle,
}

impl NsgRuleResource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Resource for NsgRuleResource {
    type State<'a> = NsgRuleState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(NsgRuleState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default());
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let id = state.id.as_str().to_owned();
        let ids = match split_id(&id, 3).or_else(|_| split_id(&id, 2)) {
            Ok(ids) => ids,
            Err(err) => {
                diags.root_error("Invalid network security group rule id", err.to_string());
                return None;
            }
        };
        let (cloud_instance_id, nsg_id) = (ids[0], ids[1]);
        let rule_id = ids.get(2).copied();
        info!(cloud_instance_id, nsg_id, rule_id, "reading ibm_pi_network_security_group_rule");

        let nsg = match client.network_security_groups(cloud_instance_id).get(nsg_id).await {
            Ok(nsg) => nsg,
            Err(err) if err.is_not_found() => {
                warn!(cloud_instance_id, nsg_id, "network security group not found, removing the rule from state");
                return None;
            }
            Err(err) => {
                diags.root_error("Failed to read the network security group", err.to_string());
                return None;
            }
        };

        let mut state = state;
        state.pi_cloud_instance_id = value_string(cloud_instance_id);
        state.pi_network_security_group_id = value_string(nsg_id);
        if let Some(rule_id) = rule_id {
            if !nsg.rules.iter().any(|rule| rule.id == rule_id) {
                warn!(cloud_instance_id, nsg_id, rule_id, "rule not found, removing it from state");
                return None;
            }
            if state.pi_action.is_null() {
                state.set_rule_arguments(&nsg, rule_id);
            }
        }
        state.set_flat(FlatNsg::from_api(&nsg));
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Unknown;
        state.set_flat(FlatNsg::unknown());
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let trigger_replace = changed([
            (
                "pi_cloud_instance_id",
                prior_state.pi_cloud_instance_id != proposed_state.pi_cloud_instance_id,
            ),
            (
                "pi_network_security_group_id",
                prior_state.pi_network_security_group_id
                    != proposed_state.pi_network_security_group_id,
            ),
            (
                "pi_network_security_group_rule_id",
                prior_state.pi_network_security_group_rule_id
                    != proposed_state.pi_network_security_group_rule_id,
            ),
            ("pi_action", prior_state.pi_action != proposed_state.pi_action),
            ("pi_name", prior_state.pi_name != proposed_state.pi_name),
            ("pi_protocol", prior_state.pi_protocol != proposed_state.pi_protocol),
            ("pi_remote", prior_state.pi_remote != proposed_state.pi_remote),
            (
                "pi_destination_port",
                prior_state.pi_destination_port != proposed_state.pi_destination_port,
            ),
            (
                "pi_source_port",
                prior_state.pi_source_port != proposed_state.pi_source_port,
            ),
        ]);
        Some((proposed_state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let mut state = planned_state;
        let cloud_instance_id = state.pi_cloud_instance_id.as_str().to_owned();
        let nsg_id = state.pi_network_security_group_id.as_str().to_owned();
        let nsgs = client.network_security_groups(&cloud_instance_id);
        let timeout = state.timeouts.create_or(&RULE_TIMEOUTS);

        let result = if let Some(rule_id) = non_empty(&state.pi_network_security_group_rule_id) {
            let rule_id = rule_id.to_owned();
            info!(cloud_instance_id = %cloud_instance_id, nsg_id = %nsg_id, rule_id = %rule_id, "removing network security group rule");
            match nsgs.remove_rule(&nsg_id, &rule_id).await {
                Ok(()) => {
                    state.id = value_string(join_id([cloud_instance_id.as_str(), &nsg_id]));
                    wait_rule_removed(&nsgs, &nsg_id, &rule_id, timeout).await
                }
                Err(err) => Err(err.into()),
            }
        } else {
            let body = state.add_rule_body();
            info!(cloud_instance_id = %cloud_instance_id, nsg_id = %nsg_id, action = %body.action, "adding network security group rule");
            match nsgs.add_rule(&nsg_id, &body).await {
                Ok(rule) => {
                    state.id = value_string(join_id([cloud_instance_id.as_str(), &nsg_id, &rule.id]));
                    wait_rule_added(&nsgs, &nsg_id, &rule.id, timeout).await
                }
                Err(err) => Err(err.into()),
            }
        };

        match result {
            Ok(nsg) => {
                state.set_flat(FlatNsg::from_api(&nsg));
                Some((state, planned_private_state))
            }
            Err(err) => {
                diags.root_error(
                    "Failed to update the network security group",
                    format!("{err:#}"),
                );
                // The rule change went through: keep it in state so that it gets tainted
                if state.id.is_value() {
                    state.set_flat(FlatNsg::default());
                    Some((state, planned_private_state))
                } else {
                    None
                }
            }
        }
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((planned_state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        // Removal rules only leave the state
        let Ok(ids) = split_id(state.id.as_str(), 3) else {
            return Some(());
        };
        let client = self.handle.client(diags).await?;
        let (cloud_instance_id, nsg_id, rule_id) = (ids[0], ids[1], ids[2]);
        info!(cloud_instance_id, nsg_id, rule_id, "deleting ibm_pi_network_security_group_rule");

        let nsgs = client.network_security_groups(cloud_instance_id);
        match nsgs.remove_rule(nsg_id, rule_id).await {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                diags.root_error("Failed to remove the network security group rule", err.to_string());
                return None;
            }
        }
        let timeout = state.timeouts.delete_or(&RULE_TIMEOUTS);
        if let Err(err) = wait_rule_removed(&nsgs, nsg_id, rule_id, timeout).await {
            diags.root_error("Failed to remove the network security group rule", format!("{err:#}"));
            return None;
        }
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = NsgRuleState {
            id: value_string(id),
            ..Default::default()
        };
        self.read(diags, state, ValueEmpty::default(), ValueEmpty::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::nsg;
    use super::*;

    fn add_mode() -> NsgRuleState<'static> {
        NsgRuleState {
            pi_cloud_instance_id: Value::from("cloud"),
            pi_network_security_group_id: Value::from("nsg"),
            pi_action: Value::from("allow"),
            pi_name: Value::from("ssh"),
            pi_protocol: Value::Value(NsgProtocol {
                protocol_type: Value::from("tcp"),
                tcp_flags: Value::Value(vec![Value::Value(super::super::NsgTcpFlag {
                    flag: Value::from("syn"),
                })]),
                ..Default::default()
            }),
            pi_remote: Value::Value(NsgRemote {
                id: Value::Null,
                remote_type: Value::from("default-network-address-group"),
            }),
            pi_destination_port: Value::Value(NsgPort {
                minimum: Value::Value(22),
                maximum: Value::Value(22),
            }),
            ..Default::default()
        }
    }

    fn errors(state: &NsgRuleState) -> usize {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default());
        diags.errors.len()
    }

    #[test]
    fn valid_add_rule() {
        assert_eq!(errors(&add_mode()), 0);
    }

    #[test]
    fn add_rule_requires_action_and_protocol() {
        let state = NsgRuleState {
            pi_action: Value::Null,
            pi_protocol: Value::Null,
            ..add_mode()
        };
        assert_eq!(errors(&state), 2);
    }

    #[test]
    fn removal_conflicts_with_rule_arguments() {
        let state = NsgRuleState {
            pi_network_security_group_rule_id: Value::from("rule"),
            ..add_mode()
        };
        assert_eq!(errors(&state), 5);

        let state = NsgRuleState {
            pi_cloud_instance_id: Value::from("cloud"),
            pi_network_security_group_id: Value::from("nsg"),
            pi_network_security_group_rule_id: Value::from("rule"),
            ..Default::default()
        };
        assert_eq!(errors(&state), 0);
    }

    #[test]
    fn protocol_specific_fields() {
        let mut state = add_mode();
        if let Value::Value(protocol) = &mut state.pi_protocol {
            protocol.protocol_type = Value::from("udp");
            protocol.icmp_type = Value::Value(8);
        }
        // icmp_type and tcp_flags both misplaced
        assert_eq!(errors(&state), 2);
    }

    #[test]
    fn port_bounds() {
        for (min, max, expected) in [(1, 65535, 0), (0, 10, 1), (30, 20, 1), (1, 65536, 1)] {
            let state = NsgRuleState {
                pi_source_port: Value::Value(NsgPort {
                    minimum: Value::Value(min),
                    maximum: Value::Value(max),
                }),
                ..add_mode()
            };
            assert_eq!(errors(&state), expected, "{min}-{max}");
        }
    }

    #[test]
    fn add_rule_body_from_state() {
        let body = add_mode().add_rule_body();
        assert_eq!(body.action, "allow");
        assert_eq!(body.name.as_deref(), Some("ssh"));
        assert_eq!(body.protocol.tcp_flags[0].flag, "syn");
        assert_eq!(body.remote.id, "");
        assert_eq!(body.destination_ports.map(|p| p.maximum), Some(22));
        assert!(body.source_ports.is_none());
    }

    #[test]
    fn import_rebuilds_rule_arguments() {
        let mut state = NsgRuleState::default();
        state.set_rule_arguments(&nsg(), "rule");
        let expected = add_mode();
        assert_eq!(state.pi_action, expected.pi_action);
        assert_eq!(state.pi_protocol, expected.pi_protocol);
        assert_eq!(state.pi_remote, expected.pi_remote);
        assert_eq!(state.pi_destination_port, expected.pi_destination_port);
        assert!(state.pi_source_port.is_null());
    }
}
