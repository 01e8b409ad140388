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

use serde_json::{json, Map, Value as JsonValue};
use tracing::info;

use crate::client::model::{Job, Order};
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::poll::{wait_for_action, wait_for_state, JobOperation, OrderOperation};
use crate::utils::{link_id, normalize_parameters};

use super::state::{BpInstanceState, InstanceType};

/// Title prefix of the resource action applying configuration changes
pub const UPDATE_ACTION: &str = "Terraform Provider Update";
pub const DELETE_ACTION: &str = "Delete";

/// Order the blueprint and wait for its deployment
///
/// Returns the id of the deployed instance along with its type.
pub(super) async fn deploy(
    client: &CloudBoltClient,
    state: &BpInstanceState<'_>,
) -> Result<(String, InstanceType)> {
    let order = client
        .deploy_blueprint(
            state.group.as_str(),
            state.blueprint_id.as_str(),
            state.resource_name.as_str(),
            &normalize_parameters(&state.parameters),
            &state.deploy_items(),
        )
        .await?;
    info!(order = %order.id, "blueprint ordered");

    let order = wait_for_state(&OrderOperation::new(client, &order.id), &state.wait_config())
        .await
        .map_err(|err| err.context(format!("Error waiting for Order ({}) to complete", order.id)))?;

    for link in &order.links.jobs {
        let job = client.get_job(&link.href).await?;
        if job.job_type == "deploy_blueprint" {
            return deployed_instance(&order, &job);
        }
    }
    Err(no_instance(&order))
}

fn deployed_instance(order: &Order, job: &Job) -> Result<(String, InstanceType)> {
    if job.links.resource.is_set() {
        Ok((job.links.resource.href.clone(), InstanceType::Resource))
    } else if !job.links.servers.is_empty() {
        let ids = job
            .links
            .servers
            .iter()
            .map(|server| link_id(&server.href))
            .collect::<Vec<_>>();
        Ok((ids.join("_"), InstanceType::Server))
    } else {
        Err(no_instance(order))
    }
}

fn no_instance(order: &Order) -> Error {
    Error::Failed(format!(
        "Order ({}) does not have a Resource or Server",
        order.id
    ))
}

/// Link of the first action of the resource whose title matches
async fn find_action(
    client: &CloudBoltClient,
    resource_path: &str,
    matches: impl Fn(&str) -> bool,
) -> Result<Option<String>> {
    let resource = client.get_resource(resource_path).await?;
    Ok(resource
        .links
        .actions
        .into_iter()
        .find(|action| matches(&action.title))
        .map(|action| action.href))
}

/// Parameters handed to the update action, as a JSON document
///
/// Blueprint parameters are under `parameters`, and the parameters of each deployment item under
/// the name of the item.
pub(super) fn tf_config_parameters(state: &BpInstanceState<'_>) -> String {
    let mut config = Map::new();
    config.insert(
        "parameters".to_owned(),
        normalize_parameters(&state.parameters).into(),
    );
    for item in state.deployment_items() {
        config.insert(
            item.name.as_str().to_owned(),
            normalize_parameters(&item.parameters).into(),
        );
    }
    JsonValue::Object(config).to_string()
}

/// Apply the configuration of `state` through the update action of the resource
pub(super) async fn update(client: &CloudBoltClient, state: &BpInstanceState<'_>) -> Result<()> {
    let id = state.id.as_str();
    let action = find_action(client, id, |title| title.starts_with(UPDATE_ACTION))
        .await?
        .ok_or_else(|| {
            Error::Failed(format!(
                "CloudBolt blueprint does not have a management action named \"{UPDATE_ACTION}\", \
                 this action is required to apply terraform configuration changes."
            ))
        })?;

    let parameters = json!({ "tf_config_parameters": tf_config_parameters(state) });
    let result = client
        .submit_action(&action, id, parameters.as_object())
        .await?;
    info!(id, action = %action, "update action submitted");

    wait_for_action(client, &result.results, &state.wait_config())
        .await
        .map_err(|err| err.context(format!("Error waiting for the update of resource ({id})")))
}

/// Delete the instance, through the `Delete` action of a resource or by decommissioning servers
pub(super) async fn destroy(client: &CloudBoltClient, state: &BpInstanceState<'_>) -> Result<()> {
    let id = state.id.as_str();
    let config = state.wait_config();

    match state.instance_type() {
        Some(InstanceType::Resource) => {
            let action = match find_action(client, id, |title| title == DELETE_ACTION).await {
                Ok(action) => action,
                Err(err) if err.is_not_found() => {
                    info!(id, "resource already deleted");
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            let action = action
                .ok_or_else(|| Error::Failed(format!("Error deleting resource ({id}).")))?;

            let result = client.submit_action(&action, id, None).await?;
            wait_for_action(client, &result.results, &config)
                .await
                .map_err(|err| err.context(format!("Error waiting for the deletion of resource ({id})")))
        }
        Some(InstanceType::Server) => {
            for server_id in id.split('_') {
                let decom = client.decom_server(server_id).await?;
                let href = &decom.links.self_link.href;

                let waited = if decom.id.starts_with("ORD-") {
                    wait_for_state(&OrderOperation::new(client, &decom.id), &config)
                        .await
                        .map(drop)
                } else {
                    wait_for_state(&JobOperation::new(client, href), &config)
                        .await
                        .map(drop)
                };
                waited.map_err(|err| {
                    err.context(format!("Error waiting for Decom Server ({href}) to complete"))
                })?;
                info!(server_id, "server decommissioned");
            }
            Ok(())
        }
        None => Err(Error::Failed(format!(
            "Unknown instance type {:?} for {id}",
            state.instance_type.as_str()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    use serde_json::json;
    use tf_provider::value::{Value, ValueString};
    use wiremock::MockServer;

    use crate::client::mock;
    use crate::client::model::Link;

    use super::super::state::DeploymentItem;
    use super::*;

    fn link(href: &str) -> Link {
        Link {
            href: href.to_owned(),
            title: String::new(),
        }
    }

    fn order() -> Order {
        Order {
            id: "ORD-7".into(),
            ..Default::default()
        }
    }

    #[test]
    fn resource_deployment() {
        let mut job = Job::default();
        job.links.resource = link("/api/v2/resources/service/12/");

        let (id, instance_type) = deployed_instance(&order(), &job).unwrap();

        assert_eq!(id, "/api/v2/resources/service/12/");
        assert_eq!(instance_type, InstanceType::Resource);
    }

    #[test]
    fn server_deployment() {
        let mut job = Job::default();
        job.links.servers = vec![link("/api/v2/servers/41/"), link("/api/v2/servers/42/")];

        let (id, instance_type) = deployed_instance(&order(), &job).unwrap();

        assert_eq!(id, "41_42");
        assert_eq!(instance_type, InstanceType::Server);
    }

    #[test]
    fn deployment_without_instance() {
        let err = deployed_instance(&order(), &Job::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Order (ORD-7) does not have a Resource or Server"
        );
    }

    #[test]
    fn update_parameters_document() {
        let state = BpInstanceState {
            parameters: Value::Value(BTreeMap::from([(
                Cow::Borrowed("size"),
                ValueString::from("large"),
            )])),
            deployment_item: Value::Value(vec![Value::Value(DeploymentItem {
                name: "db".into(),
                parameters: Value::Value(BTreeMap::from([(
                    Cow::Borrowed("zones"),
                    ValueString::from("[a|b]"),
                )])),
                ..Default::default()
            })]),
            ..Default::default()
        };

        let document: JsonValue = serde_json::from_str(&tf_config_parameters(&state)).unwrap();

        assert_eq!(
            document,
            json!({"parameters": {"size": "large"}, "db": {"zones": ["a", "b"]}})
        );
    }

    fn instance(id: &str, instance_type: InstanceType) -> BpInstanceState<'static> {
        BpInstanceState {
            id: ValueString::from(id.to_owned()),
            instance_type: instance_type.as_str().into(),
            request_timeout: Value::Value(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn deploy_follows_the_order_to_the_deployed_resource() {
        let server = MockServer::start().await;
        mock::serve_json(&server, "POST", "/api/v2/orders/", json!({"id": "ORD-5", "status": "ACTIVE"}), 1).await;
        mock::serve_json(
            &server,
            "GET",
            "/api/v2/orders/ORD-5/",
            json!({
                "_links": {"jobs": [{"href": "/api/v2/jobs/1/"}, {"href": "/api/v2/jobs/2/"}]},
                "id": "ORD-5",
                "status": "SUCCESS"
            }),
            1,
        )
        .await;
        mock::serve_json(&server, "GET", "/api/v2/jobs/1/", json!({"type": "provision_server"}), 1).await;
        mock::serve_json(
            &server,
            "GET",
            "/api/v2/jobs/2/",
            json!({
                "_links": {"resource": {"href": "/api/v2/resources/service/12/"}},
                "type": "deploy_blueprint"
            }),
            1,
        )
        .await;
        let state = BpInstanceState {
            group: "/api/v2/groups/GRP-1/".into(),
            blueprint_id: "BP-42".into(),
            request_timeout: Value::Value(1),
            ..Default::default()
        };

        let deployed = deploy(&mock::client(&server), &state).await.unwrap();

        assert_eq!(
            deployed,
            ("/api/v2/resources/service/12/".to_owned(), InstanceType::Resource)
        );
    }

    #[tokio::test]
    async fn failed_order_is_reported_with_its_id() {
        let server = MockServer::start().await;
        mock::serve_json(&server, "POST", "/api/v2/orders/", json!({"id": "ORD-6"}), 1).await;
        mock::serve_json(&server, "GET", "/api/v2/orders/ORD-6/", json!({"status": "FAILURE"}), 1).await;
        mock::serve_json(&server, "GET", "/api/v2/orders/ORD-6/status/", json!({"status": "FAILURE"}), 1).await;

        let err = deploy(&mock::client(&server), &BpInstanceState::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error waiting for Order (ORD-6) to complete: Order ORD-6 failed."
        );
    }

    #[tokio::test]
    async fn server_decommission_polls_orders_and_jobs() {
        let server = MockServer::start().await;
        mock::serve_json(
            &server,
            "POST",
            "/api/v2/servers/7/decommission/",
            json!({"_links": {"self": {"href": "/api/v2/orders/20/"}}, "id": "ORD-20"}),
            1,
        )
        .await;
        mock::serve_json(
            &server,
            "POST",
            "/api/v2/servers/8/decommission/",
            json!({"_links": {"self": {"href": "/api/v2/jobs/31/"}}, "id": "JOB-31"}),
            1,
        )
        .await;
        mock::serve_json(&server, "GET", "/api/v2/orders/ORD-20/", json!({"status": "SUCCESS"}), 1).await;
        mock::serve_json(&server, "GET", "/api/v2/jobs/31/", json!({"status": "SUCCESS"}), 1).await;

        destroy(&mock::client(&server), &instance("7_8", InstanceType::Server))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn resource_is_deleted_through_its_delete_action() {
        let server = MockServer::start().await;
        mock::serve_json(
            &server,
            "GET",
            "/api/v2/resources/service/12/",
            json!({"_links": {"actions": [
                {"href": "/api/v2/actions/8/", "title": "Terraform Provider Update"},
                {"href": "/api/v2/actions/9/", "title": "Delete"}
            ]}}),
            1,
        )
        .await;
        mock::serve_json(
            &server,
            "POST",
            "/api/v2/actions/9/",
            json!({"results": {"job": {"_links": {"self": {"href": "/api/v2/jobs/44/"}}}}}),
            1,
        )
        .await;
        mock::serve_json(&server, "GET", "/api/v2/jobs/44/", json!({"status": "SUCCESS"}), 1).await;

        destroy(
            &mock::client(&server),
            &instance("/api/v2/resources/service/12/", InstanceType::Resource),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn deleted_resource_is_already_gone() {
        let server = MockServer::start().await;

        destroy(
            &mock::client(&server),
            &instance("/api/v2/resources/service/12/", InstanceType::Resource),
        )
        .await
        .unwrap();
    }
}
