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

use async_trait::async_trait;
use tracing::{info, warn};

use tf_provider::{AttributePath, Diagnostics, Resource};
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty, ValueString};

use crate::error::Error;
use crate::provider::ClientHandle;
use crate::utils::{guarded, WithSchema};

use super::apply::{deploy, destroy, update};
use super::read::fetch_instance;
use super::state::{BpInstanceState, InstanceType, DEFAULT_REQUEST_TIMEOUT};

#[derive(Debug, Clone, Default)]
pub struct BpInstanceResource {
    client: ClientHandle,
}

impl BpInstanceResource {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

const SERVER_UPDATE_UNSUPPORTED: &str =
    "The CloudBolt provider does not support Terraform config updates for Servers.";

fn parameters_changed(prior: &BpInstanceState, state: &BpInstanceState) -> bool {
    state.parameters != prior.parameters || state.deployment_item != prior.deployment_item
}

#[async_trait]
impl Resource for BpInstanceResource {
    type State<'a> = Value<BpInstanceState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(BpInstanceState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.validate(diags);
        }

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
        let Value::Value(mut state) = state else {
            return Some((Value::Null, private_state));
        };

        let state = guarded(diags, "read blueprint instance", async move {
            let client = self.client.get().await?;
            let instance_type = state.instance_type().ok_or_else(|| {
                Error::Failed(format!(
                    "Unknown instance type {:?}",
                    state.instance_type.as_str()
                ))
            })?;

            match fetch_instance(&client, state.id.as_str(), instance_type).await? {
                Some(instance) => {
                    state.set_instance(&instance);
                    state.reflect_parameters(&instance.known_attributes());
                    Ok(Value::Value(state))
                }
                None => {
                    warn!(id = state.id.as_str(), "instance is gone, removing it from the state");
                    Ok(Value::Null)
                }
            }
        })
        .await?;

        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state.unwrap_or_default();
        state.id = ValueString::Unknown;
        state.instance_type = ValueString::Unknown;
        state.attributes = Value::Unknown;
        state.servers = Value::Unknown;
        if state.request_timeout.is_null() {
            state.request_timeout = Value::Value(DEFAULT_REQUEST_TIMEOUT);
        }

        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let prior = prior_state.unwrap_or_default();
        let mut state = proposed_state.unwrap_or_default();
        if state.request_timeout.is_null() {
            state.request_timeout = Value::Value(DEFAULT_REQUEST_TIMEOUT);
        }

        let trigger_replace = [
            ("group", &prior.group, &state.group),
            ("blueprint_id", &prior.blueprint_id, &state.blueprint_id),
            ("resource_name", &prior.resource_name, &state.resource_name),
        ]
        .into_iter()
        .filter(|(_, before, after)| before != after)
        .map(|(name, _, _)| AttributePath::new(name))
        .collect::<Vec<_>>();

        if !trigger_replace.is_empty() {
            state.id = ValueString::Unknown;
            state.instance_type = ValueString::Unknown;
            state.attributes = Value::Unknown;
            state.servers = Value::Unknown;
        } else if parameters_changed(&prior, &state) {
            if prior.instance_type() != Some(InstanceType::Resource) {
                diags.error_short(SERVER_UPDATE_UNSUPPORTED, AttributePath::new("parameters"));
                return None;
            }
            state.id = prior.id;
            state.instance_type = prior.instance_type;
            state.attributes = Value::Unknown;
            state.servers = Value::Unknown;
        } else {
            state.id = prior.id;
            state.instance_type = prior.instance_type;
            state.attributes = prior.attributes;
            state.servers = prior.servers;
        }

        Some((Value::Value(state), prior_private_state, trigger_replace))
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
        let mut state = planned_state.unwrap_or_default();

        let (client, id, instance_type) = guarded(diags, "create blueprint instance", async {
            let client = self.client.get().await?;
            let (id, instance_type) = deploy(&client, &state).await?;
            Ok((client, id, instance_type))
        })
        .await?;
        info!(id = %id, instance_type = %instance_type, "blueprint deployed");

        // From here on, the instance exists and must be kept in the state
        state.id = ValueString::from(id);
        state.instance_type = ValueString::from(instance_type.as_str());
        state.attributes = Value::Null;
        state.servers = Value::Null;

        let instance = guarded(diags, "read deployed blueprint instance", async {
            fetch_instance(&client, state.id.as_str(), instance_type)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Deployed instance {}", state.id)))
        })
        .await;
        if let Some(instance) = instance {
            state.set_instance(&instance);
        }

        Some((Value::Value(state), planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let prior = prior_state.unwrap_or_default();
        let mut state = planned_state.unwrap_or_default();

        let state = guarded(diags, "update blueprint instance", async move {
            let client = self.client.get().await?;
            let instance_type = state.instance_type();

            if parameters_changed(&prior, &state) {
                if instance_type != Some(InstanceType::Resource) {
                    return Err(Error::Failed(SERVER_UPDATE_UNSUPPORTED.to_owned()));
                }
                update(&client, &state).await?;
            }

            let instance = match instance_type {
                Some(instance_type) => {
                    fetch_instance(&client, state.id.as_str(), instance_type).await?
                }
                None => None,
            }
            .ok_or_else(|| Error::NotFound(format!("Instance {}", state.id)))?;
            state.set_instance(&instance);

            Ok(Value::Value(state))
        })
        .await?;

        Some((state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let Value::Value(state) = prior_state else {
            return Some(());
        };

        guarded(diags, "delete blueprint instance", async move {
            let client = self.client.get().await?;
            destroy(&client, &state).await?;
            info!(id = state.id.as_str(), "blueprint instance deleted");
            Ok(())
        })
        .await
    }
}
