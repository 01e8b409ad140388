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

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};
use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};
use tracing::debug;

use crate::client::model::{NamedValue, Server};
use crate::client::CloudBoltClient;
use crate::error::Result;
use crate::utils::{string_map, value_to_string};

use super::state::{BpInstanceState, DiskState, InstanceType, ServerState};

/// Remote view of a deployed blueprint
#[derive(Debug, Clone, Default)]
pub(super) struct Instance {
    pub servers: Vec<Server>,
    /// Attributes of the CloudBolt resource, empty for bare servers
    pub attributes: Vec<NamedValue>,
}

/// Fetch a deployed instance, `None` when it does not exist anymore
pub(super) async fn fetch_instance(
    client: &CloudBoltClient,
    id: &str,
    instance_type: InstanceType,
) -> Result<Option<Instance>> {
    match instance_type {
        InstanceType::Resource => {
            let resource = match client.get_resource(id).await {
                Ok(resource) => resource,
                Err(err) if err.is_not_found() => {
                    debug!(id, "resource not found");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            };
            if resource.status == "HISTORICAL" {
                debug!(id, "resource was deleted");
                return Ok(None);
            }

            let mut servers = Vec::with_capacity(resource.links.servers.len());
            for link in &resource.links.servers {
                let server = client
                    .get_server(&link.href)
                    .await
                    .map_err(|err| err.context("Error getting Servers for Resource"))?;
                servers.push(server);
            }

            Ok(Some(Instance {
                servers,
                attributes: resource.attributes,
            }))
        }
        InstanceType::Server => {
            let mut servers = Vec::new();
            for server_id in id.split('_') {
                let server = client
                    .get_server_by_id(server_id)
                    .await
                    .map_err(|err| err.context("Error getting Server"))?;
                servers.push(server);
            }
            Ok(Some(Instance {
                servers,
                attributes: Vec::new(),
            }))
        }
    }
}

impl Instance {
    /// Every attribute value known for the instance, by name
    ///
    /// The attributes of a lone server are included, so that parameters targeting the server can be
    /// matched. Resource attributes take precedence.
    pub fn known_attributes(&self) -> BTreeMap<String, String> {
        let mut known = BTreeMap::new();

        if let [server] = self.servers.as_slice() {
            for attribute in &server.attributes {
                known.insert(attribute.name.clone(), value_to_string(&attribute.value));
            }
            for (name, value) in &server.tech_specific_attributes {
                let value = value_to_string(value);
                if !value.is_empty() {
                    known.insert(name.clone(), value);
                }
            }
            known.insert("cpu_cnt".to_owned(), server.cpu_cnt.to_string());
            known.insert("mem_size".to_owned(), memory_size(&server.mem_size));
        }

        for attribute in &self.attributes {
            known.insert(attribute.name.clone(), value_to_string(&attribute.value));
        }

        known
    }
}

/// Memory size without insignificant decimals: `4.50` is `4.5`, `16.0` is `16`
fn memory_size(value: &JsonValue) -> String {
    let size = value_to_string(value);
    if size.contains('.') {
        size.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        size
    }
}

fn named_values<'a>(values: &[NamedValue]) -> ValueMap<'a, ValueString<'a>> {
    Value::Value(
        values
            .iter()
            .map(|attribute| {
                (
                    Cow::Owned(attribute.name.clone()),
                    ValueString::from(value_to_string(&attribute.value)),
                )
            })
            .collect(),
    )
}

fn optional_string<'a>(value: &str) -> ValueString<'a> {
    if value.is_empty() {
        ValueString::Null
    } else {
        ValueString::from(value.to_owned())
    }
}

fn number(value: &JsonValue) -> ValueNumber {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .into(),
        JsonValue::String(s) => s.parse::<i64>().ok().into(),
        _ => ValueNumber::Null,
    }
}

fn disk<'a>(disk: &Map<String, JsonValue>) -> Value<DiskState<'a>> {
    let text = |key: &str| {
        disk.get(key)
            .map(value_to_string)
            .map_or(ValueString::Null, ValueString::from)
    };
    Value::Value(DiskState {
        uuid: text("uuid"),
        name: text("name"),
        disk_size_gb: disk.get("diskSize").map_or(ValueNumber::Null, number),
    })
}

impl<'a> From<&Server> for ServerState<'a> {
    fn from(server: &Server) -> Self {
        ServerState {
            hostname: ValueString::from(server.hostname.clone()),
            ip_address: ValueString::from(server.ip.clone()),
            status: ValueString::from(server.status.clone()),
            mac: ValueString::from(server.mac.clone()),
            power_status: optional_string(&server.power_status),
            date_added_to_cloudbolt: ValueString::from(server.date_added_to_cloudbolt.clone()),
            cpu_count: Value::Value(server.cpu_cnt),
            memory_size_gb: ValueString::from(value_to_string(&server.mem_size)),
            disk_size_gb: number(&server.disk_size),
            notes: optional_string(&server.notes),
            os_family: optional_string(&server.os_family),
            labels: server.labels.as_ref().map_or(ValueList::Null, |labels| {
                Value::Value(
                    labels
                        .iter()
                        .map(|label| ValueString::from(value_to_string(label)))
                        .collect(),
                )
            }),
            attributes: named_values(&server.attributes),
            rate_breakdown: server
                .rate_breakdown
                .as_ref()
                .map_or(ValueMap::Null, |rates| string_map(rates)),
            tech_specific_attributes: if server.tech_specific_attributes.is_empty() {
                ValueMap::Null
            } else {
                string_map(&server.tech_specific_attributes)
            },
            disks: if server.disks.is_empty() {
                ValueList::Null
            } else {
                Value::Value(server.disks.iter().map(disk).collect())
            },
            networks: if server.networks.is_empty() {
                ValueList::Null
            } else {
                Value::Value(server.networks.iter().map(|nic| string_map(nic)).collect())
            },
        }
    }
}

fn reflect<'a>(
    parameters: &mut ValueMap<'a, ValueString<'a>>,
    known: &BTreeMap<String, String>,
) {
    for (name, value) in parameters.iter_mut().flatten() {
        if let Some(known) = known.get(&**name) {
            *value = ValueString::from(known.clone());
        }
    }
}

impl<'a> BpInstanceState<'a> {
    /// Copy the remote view of the instance into the computed attributes
    pub(super) fn set_instance(&mut self, instance: &Instance) {
        self.servers = Value::Value(
            instance
                .servers
                .iter()
                .map(|server| Value::Value(ServerState::from(server)))
                .collect(),
        );
        self.attributes = named_values(&instance.attributes);
    }

    /// Replace the parameters whose value is known remotely by their remote value
    ///
    /// This is how drift on blueprint parameters is detected.
    pub(super) fn reflect_parameters(&mut self, known: &BTreeMap<String, String>) {
        reflect(&mut self.parameters, known);
        for item in self.deployment_item.iter_mut().flatten() {
            if let Value::Value(item) = item {
                reflect(&mut item.parameters, known);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::state::DeploymentItem;
    use super::*;

    fn server(value: JsonValue) -> Server {
        serde_json::from_value(value).unwrap()
    }

    fn named(name: &str, value: JsonValue) -> NamedValue {
        NamedValue {
            name: name.to_owned(),
            value,
        }
    }

    fn web_server() -> Server {
        server(json!({
            "hostname": "web-01",
            "ip": "10.0.0.12",
            "mac": "00:50:56:aa:bb:cc",
            "status": "ACTIVE",
            "power-status": "POWERON",
            "date-added-to-cloudbolt": "2024-03-01 10:00:00",
            "cpu-cnt": 2,
            "mem-size": "4.0000 GB",
            "disk-size": 60,
            "labels": ["web"],
            "tech-specific-attributes": {"vmware-folder": "/prod", "template": null},
            "disks": [{"uuid": "6000c29", "name": "Hard disk 1", "diskSize": 60}],
            "networks": [{"name": "NIC 1", "network": "prod-vlan"}],
            "attributes": [{"name": "owner", "value": "ops"}]
        }))
    }

    #[test]
    fn memory_size_drops_insignificant_decimals() {
        assert_eq!(memory_size(&json!(4.5)), "4.5");
        assert_eq!(memory_size(&json!("4.50")), "4.5");
        assert_eq!(memory_size(&json!("16.0")), "16");
        assert_eq!(memory_size(&json!(40)), "40");
    }

    #[test]
    fn server_state() {
        let state = ServerState::from(&web_server());

        assert_eq!(state.hostname.as_str(), "web-01");
        assert_eq!(state.ip_address.as_str(), "10.0.0.12");
        assert_eq!(state.cpu_count, Value::Value(2));
        assert_eq!(state.disk_size_gb, Value::Value(60));
        assert_eq!(state.notes, ValueString::Null);
        assert_eq!(state.labels, Value::Value(vec![ValueString::from("web")]));
        assert_eq!(
            state.tech_specific_attributes,
            Value::Value(BTreeMap::from([(
                Cow::Borrowed("vmware-folder"),
                ValueString::from("/prod")
            )]))
        );
        assert_eq!(
            state.disks,
            Value::Value(vec![Value::Value(DiskState {
                uuid: "6000c29".into(),
                name: "Hard disk 1".into(),
                disk_size_gb: Value::Value(60),
            })])
        );
        assert_eq!(state.rate_breakdown, ValueMap::Null);
    }

    #[test]
    fn lone_server_attributes_are_known() {
        let instance = Instance {
            servers: vec![web_server()],
            attributes: vec![named("owner", json!("platform")), named("tier", json!(3))],
        };

        let known = instance.known_attributes();

        assert_eq!(known["owner"], "platform");
        assert_eq!(known["tier"], "3");
        assert_eq!(known["vmware-folder"], "/prod");
        assert_eq!(known["cpu_cnt"], "2");
        assert!(!known.contains_key("template"));
    }

    #[test]
    fn server_attributes_are_ignored_with_several_servers() {
        let instance = Instance {
            servers: vec![web_server(), web_server()],
            attributes: vec![named("owner", json!("platform"))],
        };

        let known = instance.known_attributes();

        assert_eq!(known.len(), 1);
        assert!(!known.contains_key("cpu_cnt"));
    }

    #[test]
    fn parameters_reflect_remote_values() {
        let mut state = BpInstanceState {
            parameters: Value::Value(BTreeMap::from([
                (Cow::Borrowed("cpu_cnt"), ValueString::from("4")),
                (Cow::Borrowed("app"), ValueString::from("nginx")),
            ])),
            deployment_item: Value::Value(vec![Value::Value(DeploymentItem {
                name: "vm".into(),
                parameters: Value::Value(BTreeMap::from([(
                    Cow::Borrowed("owner"),
                    ValueString::from("me"),
                )])),
                ..Default::default()
            })]),
            ..Default::default()
        };
        let known = BTreeMap::from([
            ("cpu_cnt".to_owned(), "2".to_owned()),
            ("owner".to_owned(), "ops".to_owned()),
        ]);

        state.reflect_parameters(&known);

        let parameters = state.parameters.as_ref_option().unwrap();
        assert_eq!(parameters["cpu_cnt"].as_str(), "2");
        assert_eq!(parameters["app"].as_str(), "nginx");
        let item = state.deployment_items().next().unwrap();
        assert_eq!(
            item.parameters.as_ref_option().unwrap()["owner"].as_str(),
            "ops"
        );
    }

    #[test]
    fn instance_sets_computed_attributes() {
        let mut state = BpInstanceState::default();
        state.set_instance(&Instance {
            servers: vec![web_server()],
            attributes: vec![named("owner", json!("ops"))],
        });

        assert_eq!(state.servers.as_ref_option().map(Vec::len), Some(1));
        assert_eq!(
            state.attributes,
            Value::Value(BTreeMap::from([(
                Cow::Borrowed("owner"),
                ValueString::from("ops")
            )]))
        );
    }
}
