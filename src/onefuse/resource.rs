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
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueString};

use crate::client::model::JobStatus;
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::poll::{wait_for_state, JobStatusOperation, WaitConfig};
use crate::provider::ClientHandle;
use crate::utils::guarded;

use super::{Common, ManagedObject, DEFAULT_REQUEST_TIMEOUT};

#[derive(Debug, Default, Clone)]
pub struct OneFuseResource<T: ManagedObject> {
    client: ClientHandle,
    object: T,
}

impl<T: ManagedObject> OneFuseResource<T> {
    pub fn new(client: ClientHandle) -> Self {
        Self {
            client,
            object: T::default(),
        }
    }
}

/// Wait for a OneFuse job to succeed and return its final status
async fn wait_for_job<T: ManagedObject>(
    client: &CloudBoltClient,
    job: JobStatus,
    config: &WaitConfig,
) -> Result<JobStatus> {
    let path = job.links.self_link.href;
    if path.is_empty() {
        return Err(Error::Failed(format!(
            "{} job {} has no link to poll",
            T::NAME,
            job.id
        )));
    }

    wait_for_state(&JobStatusOperation::new(client, path.as_str()), config)
        .await
        .map_err(|err| err.context(format!("Error waiting for {} job ({path}) to complete", T::NAME)))
}

async fn workspace(client: &CloudBoltClient, requested: Option<&str>) -> Result<String> {
    match requested {
        Some(url) if !url.is_empty() => Ok(url.to_owned()),
        _ => client.default_workspace().await,
    }
}

fn plan_defaults(common: &mut Common<'_>) {
    if common.request_timeout.is_null() {
        common.request_timeout = Value::Value(DEFAULT_REQUEST_TIMEOUT);
    }
}

#[async_trait]
impl<T: ManagedObject> Resource for OneFuseResource<T> {
    type State<'a> = Value<T::State<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let mut attributes = Common::attributes();
        attributes.extend(T::attributes());

        Some(Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes,
                description: Description::plain(format!("OneFuse {}", T::NAME)),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = &config {
            config.as_ref().validate(diags);
            self.object.validate(diags, config);
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

        let state = guarded(diags, &format!("read {}", T::NAME), async move {
            let client = self.client.get().await?;
            match self.object.refresh(&client, &mut state).await {
                Ok(()) => Ok(Value::Value(state)),
                Err(err) if err.is_not_found() => {
                    warn!(
                        id = state.as_ref().id.as_str(),
                        "{} is gone, removing it from the state",
                        T::NAME
                    );
                    Ok(Value::Null)
                }
                Err(err) => Err(err),
            }
        })
        .await?;

        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state.unwrap_or_default();
        T::plan_computed(&mut state, &config_state.unwrap_or_default());

        let common = state.as_mut();
        common.id = ValueString::Unknown;
        plan_defaults(common);

        Some((Value::Value(state), Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let prior = prior_state.unwrap_or_default();
        let mut state = proposed_state.unwrap_or_default();

        let mut trigger_replace = prior.as_ref().replaced_by(state.as_ref());
        trigger_replace.extend(T::replaced_by(&prior, &state));

        if trigger_replace.is_empty() {
            T::keep_computed(&mut state, &prior);
            state.as_mut().id = prior.as_ref().id.clone();
        } else {
            T::plan_computed(&mut state, &config_state.unwrap_or_default());
            state.as_mut().id = ValueString::Unknown;
        }
        plan_defaults(state.as_mut());

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

        let state = guarded(diags, &format!("create {}", T::NAME), async move {
            let client = self.client.get().await?;
            if self.object.adopt(&client, &mut state).await? {
                info!(id = state.as_ref().id.as_str(), "existing {} adopted", T::NAME);
                return Ok(Value::Value(state));
            }

            let workspace = workspace(&client, T::workspace(&state)).await?;
            let wait = state.as_ref().wait_config();

            let job = self.object.submit(&client, &state, &workspace).await?;
            let job = wait_for_job::<T>(&client, job, &wait).await?;

            let managed_object = &job.links.managed_object.href;
            if managed_object.is_empty() {
                return Err(Error::Failed(format!(
                    "{} job {} succeeded without a managed object",
                    T::NAME,
                    job.links.self_link.href
                )));
            }

            T::submitted_to(&mut state, &workspace);
            self.object.load(&client, managed_object, &mut state).await?;
            info!(id = state.as_ref().id.as_str(), "{} created", T::NAME);

            Ok(Value::Value(state))
        })
        .await?;

        Some((state, planned_private_state))
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
        // Only request_timeout can change in place
        Some((planned_state, planned_private_state))
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

        guarded(diags, &format!("delete {}", T::NAME), async move {
            let client = self.client.get().await?;
            let job = match self.object.remove(&client, &state).await {
                Ok(job) => job,
                Err(err) if err.is_not_found() => {
                    warn!(id = state.as_ref().id.as_str(), "{} already deleted", T::NAME);
                    return Ok(());
                }
                Err(err) => return Err(err),
            };
            wait_for_job::<T>(&client, job, &state.as_ref().wait_config()).await?;
            info!(id = state.as_ref().id.as_str(), "{} deleted", T::NAME);
            Ok(())
        })
        .await
    }
}
