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

//! OneFuse managed objects
//!
//! Every OneFuse record follows the same lifecycle: the create or delete call answers with a
//! job status, polled until it settles, and a successful create links the managed object.
//! [`ManagedObject`] describes one kind of record, [`OneFuseResource`] drives its lifecycle.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tf_provider::{map, AttributePath, Diagnostics};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueMap, ValueNumber, ValueString};

use crate::client::model::{JobStatus, PolicyLinks};
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::poll::WaitConfig;
use crate::utils::link_id;

mod ad;
mod dns;
mod ipam;
mod naming;
mod resource;

pub use ad::{AdComputerAccount, AdComputerAccountState};
pub use dns::{DnsRecord, DnsRecordState};
pub use ipam::{IpamRecord, IpamRecordState};
pub use naming::{CustomNaming, CustomNamingState};
pub use resource::OneFuseResource;

pub const DEFAULT_REQUEST_TIMEOUT: i64 = 25;

/// Attributes shared by every OneFuse record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Common<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub template_properties: ValueMap<'a, ValueString<'a>>,
    pub request_timeout: ValueNumber,
}

impl<'a> Common<'a> {
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::minutes(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
    }

    pub fn validate(&self, diags: &mut Diagnostics) {
        if let Some(timeout) = self.request_timeout.as_ref_option() {
            if *timeout <= 0 {
                diags.error(
                    "Invalid request timeout",
                    format!("request_timeout must be a positive number of minutes, got {timeout}"),
                    AttributePath::new("request_timeout"),
                );
            }
        }
    }

    /// Inputs whose change requires a new record
    fn replaced_by(&self, proposed: &Self) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        if proposed.template_properties != self.template_properties {
            paths.push(AttributePath::new("template_properties"));
        }
        paths
    }

    fn attributes() -> HashMap<String, Attribute> {
        map! {
            "id" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Identifier of the OneFuse record"),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
            "template_properties" => Attribute {
                attr_type: AttributeType::Map(AttributeType::String.into()),
                description: Description::plain("Template properties rendered by the OneFuse policy"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
            "request_timeout" => Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain("Timeout in minutes, Default (25)"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
        }
    }
}

/// Workspace and policy of a record created from a OneFuse policy
///
/// Both are read back from the links of the record, so a record moved to another workspace or
/// policy shows up as a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PolicyRecord<'a> {
    pub workspace_url: ValueString<'a>,
    pub policy_id: ValueNumber,
}

impl<'a> PolicyRecord<'a> {
    pub fn attributes(policy: &str) -> HashMap<String, Attribute> {
        map! {
            "workspace_url" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("OneFuse workspace link, the `Default` workspace when omitted"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
            "policy_id" => Attribute {
                attr_type: AttributeType::Number,
                description: Description::plain(format!("Id of the OneFuse {policy} policy")),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
        }
    }

    pub fn policy_id(&self) -> Result<i64> {
        self.policy_id
            .as_ref_option()
            .copied()
            .ok_or_else(|| Error::Config("policy_id is required".into()))
    }

    pub fn workspace(&self) -> Option<&str> {
        self.workspace_url.as_deref_option()
    }

    fn replaced_by(&self, proposed: &Self, paths: &mut Vec<AttributePath>) {
        if proposed.policy_id != self.policy_id {
            paths.push(AttributePath::new("policy_id"));
        }
        replaced_if_set(paths, "workspace_url", &self.workspace_url, &proposed.workspace_url);
    }

    fn plan(&mut self, config: &Self) {
        plan_optional(&mut self.workspace_url, &config.workspace_url);
    }

    fn keep(&mut self, prior: &Self) {
        keep_optional(&mut self.workspace_url, &prior.workspace_url);
    }

    /// Read the workspace and the policy from the links of the record
    pub fn set_links(&mut self, links: &PolicyLinks) {
        if links.workspace.is_set() {
            self.workspace_url = ValueString::from(links.workspace.href.clone());
        }
        if let Ok(policy_id) = link_id(&links.policy.href).parse::<i64>() {
            self.policy_id = Value::Value(policy_id);
        }
    }
}

/// Optional attribute filled by the API when the configuration leaves it out
fn plan_optional<T>(planned: &mut Value<T>, config: &Value<T>) {
    if config.is_null() {
        *planned = Value::Unknown;
    }
}

fn keep_optional<T: Clone>(planned: &mut Value<T>, prior: &Value<T>) {
    if !planned.is_value() {
        *planned = prior.clone();
    }
}

/// Optional attributes only force a new record when the configuration sets them
fn replaced_if_set<T: PartialEq>(
    paths: &mut Vec<AttributePath>,
    name: &'static str,
    prior: &Value<T>,
    proposed: &Value<T>,
) {
    if proposed.is_value() && proposed != prior {
        paths.push(AttributePath::new(name));
    }
}

/// Kind of record managed through the OneFuse API
#[async_trait]
pub trait ManagedObject: Debug + Default + Clone + Send + Sync + 'static {
    /// Name of the record in messages
    const NAME: &'static str;
    type State<'a>: Debug
        + Clone
        + Default
        + Send
        + Sync
        + Serialize
        + Deserialize<'a>
        + AsRef<Common<'a>>
        + AsMut<Common<'a>>;

    /// Attributes specific to the record
    fn attributes() -> HashMap<String, Attribute>;

    fn validate(&self, _diags: &mut Diagnostics, _state: &Self::State<'_>) {}

    /// Record inputs whose change requires a new record
    fn replaced_by<'a>(prior: &Self::State<'a>, proposed: &Self::State<'a>) -> Vec<AttributePath>;

    /// Mark the attributes the API fills for a new record as unknown
    fn plan_computed<'a>(state: &mut Self::State<'a>, config: &Self::State<'a>);

    /// Carry the attributes filled by the API over from the prior state
    fn keep_computed<'a>(state: &mut Self::State<'a>, prior: &Self::State<'a>);

    /// Workspace link requested by the configuration
    fn workspace<'s>(state: &'s Self::State<'_>) -> Option<&'s str>;

    /// Record the workspace the record was submitted to
    fn submitted_to(_state: &mut Self::State<'_>, _workspace: &str) {}

    /// Fill the state from an existing record named by the configuration
    ///
    /// Returns false when the record must be created.
    async fn adopt<'a>(&self, _client: &CloudBoltClient, _state: &mut Self::State<'a>) -> Result<bool> {
        Ok(false)
    }

    /// Submit the creation of the record
    async fn submit<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
        workspace: &str,
    ) -> Result<JobStatus>;

    /// Fill the state from the record linked by `href`
    async fn load<'a>(
        &self,
        client: &CloudBoltClient,
        href: &str,
        state: &mut Self::State<'a>,
    ) -> Result<()>;

    /// Fill the state from the record it identifies
    async fn refresh<'a>(&self, client: &CloudBoltClient, state: &mut Self::State<'a>)
        -> Result<()>;

    /// Submit the deletion of the record
    async fn remove<'a>(&self, client: &CloudBoltClient, state: &Self::State<'a>)
        -> Result<JobStatus>;
}
