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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::{map, AttributePath};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueNumber, ValueString};

use crate::client::model::{CustomName, CustomNameRequest, JobStatus};
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::utils::normalize_parameters;

use super::{keep_optional, plan_optional, replaced_if_set, Common, ManagedObject};

/// Name generated by a OneFuse naming policy
#[derive(Debug, Default, Clone)]
pub struct CustomNaming;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CustomNamingState<'a> {
    #[serde(borrow = "'a")]
    #[serde(flatten)]
    pub common: Common<'a>,
    pub naming_policy_id: ValueString<'a>,
    pub workspace_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub dns_suffix: ValueString<'a>,
    pub custom_name_id: ValueNumber,
}

impl<'a> AsRef<Common<'a>> for CustomNamingState<'a> {
    fn as_ref(&self) -> &Common<'a> {
        &self.common
    }
}

impl<'a> AsMut<Common<'a>> for CustomNamingState<'a> {
    fn as_mut(&mut self) -> &mut Common<'a> {
        &mut self.common
    }
}

impl<'a> CustomNamingState<'a> {
    /// The id is the FQDN, which stays stable when the record is recreated with the same name
    fn set_custom_name(&mut self, custom_name: CustomName) {
        self.common.id = ValueString::from(format!(
            "{}.{}",
            custom_name.name, custom_name.dns_suffix
        ));
        self.name = ValueString::from(custom_name.name);
        self.dns_suffix = ValueString::from(custom_name.dns_suffix);
        self.custom_name_id = Value::Value(custom_name.id);
    }

    fn custom_name_id(&self) -> Result<i64> {
        self.custom_name_id.as_ref_option().copied().ok_or_else(|| {
            Error::NotFound(format!("Custom name id of {}", self.common.id.as_str()))
        })
    }
}

#[async_trait]
impl ManagedObject for CustomNaming {
    const NAME: &'static str = "Custom Name";
    type State<'a> = CustomNamingState<'a>;

    fn attributes() -> HashMap<String, Attribute> {
        map! {
            "naming_policy_id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Id of the OneFuse naming policy"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "workspace_id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("OneFuse workspace link, the `Default` workspace when omitted"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Generated name"),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
            "dns_suffix" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("DNS suffix appended to the generated name"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
            "custom_name_id" => Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("Id of the OneFuse custom name, set to adopt an existing name"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
        }
    }

    fn replaced_by<'a>(prior: &Self::State<'a>, proposed: &Self::State<'a>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        if proposed.naming_policy_id != prior.naming_policy_id {
            paths.push(AttributePath::new("naming_policy_id"));
        }
        if proposed.workspace_id != prior.workspace_id {
            paths.push(AttributePath::new("workspace_id"));
        }
        replaced_if_set(
            &mut paths,
            "custom_name_id",
            &prior.custom_name_id,
            &proposed.custom_name_id,
        );
        paths
    }

    fn plan_computed<'a>(state: &mut Self::State<'a>, config: &Self::State<'a>) {
        state.name = Value::Unknown;
        plan_optional(&mut state.dns_suffix, &config.dns_suffix);
        plan_optional(&mut state.custom_name_id, &config.custom_name_id);
    }

    fn keep_computed<'a>(state: &mut Self::State<'a>, prior: &Self::State<'a>) {
        state.name = prior.name.clone();
        keep_optional(&mut state.dns_suffix, &prior.dns_suffix);
        keep_optional(&mut state.custom_name_id, &prior.custom_name_id);
    }

    fn workspace<'s>(state: &'s Self::State<'_>) -> Option<&'s str> {
        state.workspace_id.as_deref_option()
    }

    async fn adopt<'a>(&self, client: &CloudBoltClient, state: &mut Self::State<'a>) -> Result<bool> {
        if !state.custom_name_id.is_value() {
            return Ok(false);
        }
        self.refresh(client, state).await?;
        Ok(true)
    }

    async fn submit<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
        workspace: &str,
    ) -> Result<JobStatus> {
        client
            .create_custom_name(&CustomNameRequest {
                naming_policy: CloudBoltClient::naming_policy_path(state.naming_policy_id.as_str()),
                workspace: workspace.to_owned(),
                template_properties: normalize_parameters(&state.common.template_properties),
            })
            .await
    }

    async fn load<'a>(
        &self,
        client: &CloudBoltClient,
        href: &str,
        state: &mut Self::State<'a>,
    ) -> Result<()> {
        state.set_custom_name(client.get_custom_name(href).await?);
        Ok(())
    }

    async fn refresh<'a>(
        &self,
        client: &CloudBoltClient,
        state: &mut Self::State<'a>,
    ) -> Result<()> {
        let id = state.custom_name_id()?;
        state.set_custom_name(client.get_custom_name_by_id(id).await?);
        Ok(())
    }

    async fn remove<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
    ) -> Result<JobStatus> {
        client.delete_custom_name(state.custom_name_id()?).await
    }
}
