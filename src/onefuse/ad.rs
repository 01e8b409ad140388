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
use tf_provider::value::{Value, ValueString};

use crate::client::model::{JobStatus, MicrosoftAdComputerAccount, MicrosoftAdComputerAccountRequest};
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::utils::normalize_parameters;

use super::{keep_optional, plan_optional, replaced_if_set, Common, ManagedObject, PolicyRecord};

/// Computer account created through a OneFuse Microsoft AD policy
#[derive(Debug, Default, Clone)]
pub struct AdComputerAccount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdComputerAccountState<'a> {
    #[serde(borrow = "'a")]
    #[serde(flatten)]
    pub common: Common<'a>,
    #[serde(flatten)]
    pub policy: PolicyRecord<'a>,
    pub name: ValueString<'a>,
    pub final_ou: ValueString<'a>,
}

impl<'a> AsRef<Common<'a>> for AdComputerAccountState<'a> {
    fn as_ref(&self) -> &Common<'a> {
        &self.common
    }
}

impl<'a> AsMut<Common<'a>> for AdComputerAccountState<'a> {
    fn as_mut(&mut self) -> &mut Common<'a> {
        &mut self.common
    }
}

/// Active Directory names are case-insensitive
fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl<'a> AdComputerAccountState<'a> {
    fn account_id(&self) -> Result<i64> {
        self.common.id.as_str().parse::<i64>().map_err(|_| {
            Error::NotFound(format!("Microsoft AD computer account {:?}", self.common.id.as_str()))
        })
    }

    fn set_account(&mut self, account: MicrosoftAdComputerAccount) {
        self.common.id = ValueString::from(account.id.to_string());
        self.policy.set_links(&account.links);
        let renamed = match self.name.as_deref_option() {
            Some(name) => !same_name(name, &account.name),
            None => true,
        };
        if renamed {
            self.name = ValueString::from(account.name);
        }
        self.final_ou = ValueString::from(account.final_ou);
    }
}

#[async_trait]
impl ManagedObject for AdComputerAccount {
    const NAME: &'static str = "Microsoft AD Computer Account";
    type State<'a> = AdComputerAccountState<'a>;

    fn attributes() -> HashMap<String, Attribute> {
        let mut attributes = map! {
            "name" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Name of the computer account, generated by the policy when omitted"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
            "final_ou" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Organizational unit the account ends up in"),
                constraint: AttributeConstraint::OptionalComputed,
                ..Default::default()
            },
        };
        attributes.extend(PolicyRecord::attributes("Microsoft AD"));
        attributes
    }

    fn replaced_by<'a>(prior: &Self::State<'a>, proposed: &Self::State<'a>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        if let Some(name) = proposed.name.as_deref_option() {
            if !prior.name.as_deref_option().is_some_and(|prior| same_name(prior, name)) {
                paths.push(AttributePath::new("name"));
            }
        }
        prior.policy.replaced_by(&proposed.policy, &mut paths);
        replaced_if_set(&mut paths, "final_ou", &prior.final_ou, &proposed.final_ou);
        paths
    }

    fn plan_computed<'a>(state: &mut Self::State<'a>, config: &Self::State<'a>) {
        state.policy.plan(&config.policy);
        plan_optional(&mut state.name, &config.name);
        plan_optional(&mut state.final_ou, &config.final_ou);
    }

    fn keep_computed<'a>(state: &mut Self::State<'a>, prior: &Self::State<'a>) {
        state.policy.keep(&prior.policy);
        keep_optional(&mut state.name, &prior.name);
        keep_optional(&mut state.final_ou, &prior.final_ou);
        // A name differing only by case is the same account
        let same = matches!(
            (&state.name, &prior.name),
            (Value::Value(planned), Value::Value(known)) if same_name(planned, known)
        );
        if same {
            state.name = prior.name.clone();
        }
    }

    fn workspace<'s>(state: &'s Self::State<'_>) -> Option<&'s str> {
        state.policy.workspace()
    }

    fn submitted_to(state: &mut Self::State<'_>, workspace: &str) {
        state.policy.workspace_url = ValueString::from(workspace.to_owned());
    }

    async fn submit<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
        workspace: &str,
    ) -> Result<JobStatus> {
        client
            .create_microsoft_ad_computer_account(&MicrosoftAdComputerAccountRequest {
                name: state.name.as_str().to_owned(),
                final_ou: state.final_ou.as_str().to_owned(),
                policy: CloudBoltClient::microsoft_ad_policy_path(state.policy.policy_id()?),
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
        state.set_account(client.get_microsoft_ad_computer_account(href).await?);
        Ok(())
    }

    async fn refresh<'a>(
        &self,
        client: &CloudBoltClient,
        state: &mut Self::State<'a>,
    ) -> Result<()> {
        let account = client
            .get_microsoft_ad_computer_account_by_id(state.account_id()?)
            .await?;
        state.set_account(account);
        Ok(())
    }

    async fn remove<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
    ) -> Result<JobStatus> {
        client
            .delete_microsoft_ad_computer_account(state.account_id()?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn account() -> AdComputerAccountState<'static> {
        AdComputerAccountState {
            common: Common {
                id: "12".into(),
                ..Default::default()
            },
            policy: PolicyRecord {
                workspace_url: "/api/v3/onefuse/workspaces/2/".into(),
                policy_id: Value::Value(3),
            },
            name: "WEB01".into(),
            final_ou: "OU=Servers,DC=example,DC=com".into(),
        }
    }

    fn read(document: serde_json::Value) -> MicrosoftAdComputerAccount {
        serde_json::from_value(document).unwrap()
    }

    #[test]
    fn name_case_is_not_a_change() {
        let proposed = AdComputerAccountState {
            name: "web01".into(),
            ..account()
        };

        assert!(AdComputerAccount::replaced_by(&account(), &proposed).is_empty());

        let mut planned = proposed.clone();
        AdComputerAccount::keep_computed(&mut planned, &account());
        assert_eq!(planned.name.as_str(), "WEB01");
    }

    #[test]
    fn renaming_forces_a_new_account() {
        let proposed = AdComputerAccountState {
            name: "web02".into(),
            final_ou: Value::Null,
            ..account()
        };

        assert_eq!(
            AdComputerAccount::replaced_by(&account(), &proposed),
            vec![AttributePath::new("name")]
        );
    }

    #[test]
    fn read_keeps_the_configured_spelling() {
        let mut state = account();

        state.set_account(read(json!({
            "_links": {"policy": {"href": "/api/v3/onefuse/microsoftADPolicies/3/"}},
            "id": 12,
            "name": "web01",
            "finalOu": "OU=Moved,DC=example,DC=com"
        })));

        assert_eq!(state.name.as_str(), "WEB01");
        assert_eq!(state.final_ou.as_str(), "OU=Moved,DC=example,DC=com");
        assert_eq!(state.policy.policy_id, Value::Value(3));

        state.set_account(read(json!({"id": 12, "name": "web03"})));
        assert_eq!(state.name.as_str(), "web03");
    }

    #[test]
    fn generated_name_is_planned_as_unknown() {
        let config = AdComputerAccountState {
            policy: PolicyRecord {
                policy_id: Value::Value(3),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut state = config.clone();

        AdComputerAccount::plan_computed(&mut state, &config);

        assert!(state.name.is_unknown());
        assert!(state.final_ou.is_unknown());
        assert!(state.policy.workspace_url.is_unknown());
    }

    #[test]
    fn account_id_comes_from_the_state_id() {
        assert_eq!(account().account_id().unwrap(), 12);
        assert!(AdComputerAccountState::default()
            .account_id()
            .unwrap_err()
            .is_not_found());
    }
}
