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

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use tf_provider::{map, Diagnostics, DynamicDataSource, DynamicResource, Provider};
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;

use crate::bp_instance::BpInstanceResource;
use crate::client::CloudBoltClient;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::onefuse::{AdComputerAccount, CustomNaming, DnsRecord, IpamRecord, OneFuseResource};
use crate::utils::WithSchema;

/// Authenticated client, available once the provider is configured
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Arc<RwLock<Option<Arc<CloudBoltClient>>>>);

impl ClientHandle {
    pub async fn set(&self, client: CloudBoltClient) {
        *self.0.write().await = Some(Arc::new(client));
    }

    pub async fn get(&self) -> Result<Arc<CloudBoltClient>> {
        self.0
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Config("the provider has not been configured".into()))
    }
}

#[derive(Debug, Default, Clone)]
pub struct CloudBoltProvider {
    client: ClientHandle,
}

#[async_trait]
impl Provider for CloudBoltProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        config.validate(diags);

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let client_config = config.client_config(diags, |var| std::env::var(var).ok())?;

        match CloudBoltClient::connect(&client_config).await {
            Ok(client) => {
                info!(
                    terraform_version = %terraform_version,
                    base_url = client.base_url(),
                    "provider configured"
                );
                self.client.set(client).await;
                Some(())
            }
            Err(err) => {
                diags.root_error("Failed to authenticate against CloudBolt", err.to_string());
                None
            }
        }
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "bp_instance" => BpInstanceResource::new(self.client.clone()),
            "1f_naming" => OneFuseResource::<CustomNaming>::new(self.client.clone()),
            "1f_dns_record" => OneFuseResource::<DnsRecord>::new(self.client.clone()),
            "1f_ipam_record" => OneFuseResource::<IpamRecord>::new(self.client.clone()),
            "1f_microsoft_ad_computer_account" => OneFuseResource::<AdComputerAccount>::new(self.client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_is_an_error() {
        let handle = ClientHandle::default();
        let err = handle.get().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid provider configuration: the provider has not been configured"
        );
    }

    #[tokio::test]
    async fn configured_client_is_shared() {
        let handle = ClientHandle::default();
        let resource_handle = handle.clone();

        handle
            .set(CloudBoltClient::new(&Default::default()).unwrap())
            .await;

        let client = resource_handle.get().await.unwrap();
        assert_eq!(client.base_url(), "https://:443");
    }

    #[test]
    fn resources_are_registered() {
        let provider = CloudBoltProvider::default();
        let mut diags = Diagnostics::default();

        let resources = provider.get_resources(&mut diags).unwrap();

        let mut names = resources.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort();
        assert_eq!(
            names,
            [
                "1f_dns_record",
                "1f_ipam_record",
                "1f_microsoft_ad_computer_account",
                "1f_naming",
                "bp_instance"
            ]
        );
    }
}
