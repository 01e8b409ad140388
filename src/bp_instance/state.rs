// This file is part of the terraform-provider-cloudbolt project
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

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};

use crate::client::DeployItem;
use crate::poll::WaitConfig;
use crate::utils::{normalize_parameters, WithSchema};

pub const DEFAULT_REQUEST_TIMEOUT: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BpInstanceState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub group: ValueString<'a>,
    pub blueprint_id: ValueString<'a>,
    pub resource_name: ValueString<'a>,
    pub parameters: ValueMap<'a, ValueString<'a>>,
    pub request_timeout: ValueNumber,
    pub deployment_item: ValueList<Value<DeploymentItem<'a>>>,
    pub instance_type: ValueString<'a>,
    pub attributes: ValueMap<'a, ValueString<'a>>,
    pub servers: ValueList<Value<ServerState<'a>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeploymentItem<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub environment: ValueString<'a>,
    pub osbuild: ValueString<'a>,
    pub parameters: ValueMap<'a, ValueString<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServerState<'a> {
    #[serde(borrow = "'a")]
    pub hostname: ValueString<'a>,
    pub ip_address: ValueString<'a>,
    pub status: ValueString<'a>,
    pub mac: ValueString<'a>,
    pub power_status: ValueString<'a>,
    pub date_added_to_cloudbolt: ValueString<'a>,
    pub cpu_count: ValueNumber,
    pub memory_size_gb: ValueString<'a>,
    pub disk_size_gb: ValueNumber,
    pub notes: ValueString<'a>,
    pub os_family: ValueString<'a>,
    pub labels: ValueList<ValueString<'a>>,
    pub attributes: ValueMap<'a, ValueString<'a>>,
    pub rate_breakdown: ValueMap<'a, ValueString<'a>>,
    pub tech_specific_attributes: ValueMap<'a, ValueString<'a>>,
    pub disks: ValueList<Value<DiskState<'a>>>,
    pub networks: ValueList<ValueMap<'a, ValueString<'a>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiskState<'a> {
    #[serde(borrow = "'a")]
    pub uuid: ValueString<'a>,
    pub name: ValueString<'a>,
    pub disk_size_gb: ValueNumber,
}

/// What a blueprint deployment produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    /// A CloudBolt resource, identified by its link
    Resource,
    /// Bare servers, identified by their ids joined with `_`
    Server,
}

impl InstanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Resource => "Resource",
            InstanceType::Server => "Server",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Resource" => Some(InstanceType::Resource),
            "Server" => Some(InstanceType::Server),
            _ => None,
        }
    }
}

impl Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'a> BpInstanceState<'a> {
    pub fn instance_type(&self) -> Option<InstanceType> {
        InstanceType::parse(self.instance_type.as_deref_option()?)
    }

    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::minutes(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
    }

    pub fn deployment_items(&self) -> impl Iterator<Item = &DeploymentItem<'a>> {
        self.deployment_item
            .iter()
            .flatten()
            .filter_map(|item| item.as_ref_option())
    }

    pub fn deploy_items(&self) -> Vec<DeployItem> {
        self.deployment_items()
            .map(|item| DeployItem {
                name: item.name.as_str().to_owned(),
                environment: item
                    .environment
                    .as_deref_option()
                    .filter(|env| !env.is_empty())
                    .map(str::to_owned),
                osbuild: item
                    .osbuild
                    .as_deref_option()
                    .filter(|osbuild| !osbuild.is_empty())
                    .map(str::to_owned),
                parameters: normalize_parameters(&item.parameters),
            })
            .collect()
    }
}

impl<'a> WithSchema for BpInstanceState<'a> {
    fn schema() -> Schema {
        let computed_string = |description: &'static str| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Computed,
            ..Default::default()
        };
        let computed_number = |description: &'static str| Attribute {
            attr_type: AttributeType::Number,
            description: Description::plain(description),
            constraint: AttributeConstraint::Computed,
            ..Default::default()
        };
        let computed_map = |description: &'static str| Attribute {
            attr_type: AttributeType::Map(AttributeType::String.into()),
            description: Description::plain(description),
            constraint: AttributeConstraint::Computed,
            ..Default::default()
        };

        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => computed_string("Link of the CloudBolt resource, or ids of the deployed servers"),
                    "group" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("The relative API URL path for the CloudBolt Group"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "blueprint_id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("The global Id for the CloudBolt Blueprint"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "resource_name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("The name for the created CloudBolt Resource"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "parameters" => Attribute {
                        attr_type: AttributeType::Map(AttributeType::String.into()),
                        description: Description::plain("Parameters Name/Value pair, `[a|b]` is sent as a list"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "request_timeout" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Timeout in minutes, Default (30)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "instance_type" => computed_string("The type of deployed instance Resource or Server"),
                    "attributes" => computed_map("CloudBolt Resource attributes"),
                    "servers" => Attribute {
                        attr_type: AttributeType::AttributeList(map! {
                            "hostname" => computed_string("Server Hostname"),
                            "ip_address" => computed_string("Server IP Address"),
                            "status" => computed_string("CloudBolt Server Status"),
                            "mac" => computed_string("Server MAC Address"),
                            "power_status" => computed_string("Server Power Status"),
                            "date_added_to_cloudbolt" => computed_string("Date the server was added to CloudBolt"),
                            "cpu_count" => computed_number("CPU Count"),
                            "memory_size_gb" => computed_string("Total Memory in GB"),
                            "disk_size_gb" => computed_number("Total Disk Size in GB"),
                            "notes" => computed_string("Server Notes"),
                            "os_family" => computed_string("Server OS Family"),
                            "labels" => Attribute {
                                attr_type: AttributeType::List(AttributeType::String.into()),
                                description: Description::plain("Server Labels"),
                                constraint: AttributeConstraint::Computed,
                                ..Default::default()
                            },
                            "attributes" => computed_map("CloudBolt Server attributes"),
                            "rate_breakdown" => computed_map("Server Rate Breakdown"),
                            "tech_specific_attributes" => computed_map("Resource Handler technical specific attributes"),
                            "disks" => Attribute {
                                attr_type: AttributeType::AttributeList(map! {
                                    "uuid" => computed_string("Unique ID of Disk"),
                                    "name" => computed_string("Name of Disk"),
                                    "disk_size_gb" => computed_number("Disk Size in GB"),
                                }),
                                description: Description::plain("Server disks"),
                                constraint: AttributeConstraint::Computed,
                                ..Default::default()
                            },
                            "networks" => Attribute {
                                attr_type: AttributeType::List(
                                    AttributeType::Map(AttributeType::String.into()).into(),
                                ),
                                description: Description::plain("Server NICs"),
                                constraint: AttributeConstraint::Computed,
                                ..Default::default()
                            },
                        }),
                        description: Description::plain("Servers of the deployed instance"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "deployment_item" => NestedBlock::Set(Block {
                        attributes: map! {
                            "name" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("The reference name for the blueprint deployment item"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "environment" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("The relative API URL path for the CloudBolt Environment"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                            "osbuild" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("The relative API URL path for the CloudBolt OS Build"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                            "parameters" => Attribute {
                                attr_type: AttributeType::Map(AttributeType::String.into()),
                                description: Description::plain("Parameter Name/Value pair"),
                                constraint: AttributeConstraint::Optional,
                                ..Default::default()
                            },
                        },
                        description: Description::plain("Set of blueprint deployment items"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Blueprint deployed through a CloudBolt order"),
                deprecated: false,
            },
        }
    }
}
