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

use tf_provider::{map, AttributePath, Diagnostics};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description};
use tf_provider::value::{Value, ValueList, ValueString};

use crate::client::model::{DnsReservation, DnsReservationRequest, JobStatus};
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::utils::normalize_parameters;

use super::{Common, ManagedObject, PolicyRecord};

/// DNS record reserved through a OneFuse DNS policy
#[derive(Debug, Default, Clone)]
pub struct DnsRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DnsRecordState<'a> {
    #[serde(borrow = "'a")]
    #[serde(flatten)]
    pub common: Common<'a>,
    #[serde(flatten)]
    pub policy: PolicyRecord<'a>,
    pub name: ValueString<'a>,
    pub value: ValueString<'a>,
    pub zones: ValueList<ValueString<'a>>,
}

impl<'a> AsRef<Common<'a>> for DnsRecordState<'a> {
    fn as_ref(&self) -> &Common<'a> {
        &self.common
    }
}

impl<'a> AsMut<Common<'a>> for DnsRecordState<'a> {
    fn as_mut(&mut self) -> &mut Common<'a> {
        &mut self.common
    }
}

impl<'a> DnsRecordState<'a> {
    fn zones(&self) -> Vec<String> {
        self.zones
            .iter()
            .flatten()
            .filter_map(|zone| zone.as_deref_option())
            .map(str::to_owned)
            .collect()
    }

    fn reservation_id(&self) -> Result<i64> {
        self.common
            .id
            .as_str()
            .parse::<i64>()
            .map_err(|_| Error::NotFound(format!("DNS reservation {:?}", self.common.id.as_str())))
    }

    fn set_reservation(&mut self, reservation: DnsReservation) {
        self.common.id = ValueString::from(reservation.id.to_string());
        self.policy.set_links(&reservation.links);
        self.name = ValueString::from(reservation.name);
        self.value = ValueString::from(reservation.value);
        self.zones = Value::Value(reservation.zones.into_iter().map(ValueString::from).collect());
    }
}

#[async_trait]
impl ManagedObject for DnsRecord {
    const NAME: &'static str = "DNS Reservation";
    type State<'a> = DnsRecordState<'a>;

    fn attributes() -> HashMap<String, Attribute> {
        let required = |attr_type: AttributeType, description: &'static str| Attribute {
            attr_type,
            description: Description::plain(description),
            constraint: AttributeConstraint::Required,
            ..Default::default()
        };

        let mut attributes = map! {
            "name" => required(AttributeType::String, "Name of the DNS record"),
            "value" => required(AttributeType::String, "Value of the DNS record, usually an IP address"),
            "zones" => required(
                AttributeType::List(AttributeType::String.into()),
                "DNS zones in which the record is created",
            ),
        };
        attributes.extend(PolicyRecord::attributes("DNS"));
        attributes
    }

    fn validate(&self, diags: &mut Diagnostics, state: &Self::State<'_>) {
        if let Some(zones) = state.zones.as_ref_option() {
            if zones.is_empty() {
                diags.error_short("At least one DNS zone is required", AttributePath::new("zones"));
            }
        }
    }

    fn replaced_by<'a>(prior: &Self::State<'a>, proposed: &Self::State<'a>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        if proposed.name != prior.name {
            paths.push(AttributePath::new("name"));
        }
        prior.policy.replaced_by(&proposed.policy, &mut paths);
        if proposed.value != prior.value {
            paths.push(AttributePath::new("value"));
        }
        if proposed.zones != prior.zones {
            paths.push(AttributePath::new("zones"));
        }
        paths
    }

    fn plan_computed<'a>(state: &mut Self::State<'a>, config: &Self::State<'a>) {
        state.policy.plan(&config.policy);
    }

    fn keep_computed<'a>(state: &mut Self::State<'a>, prior: &Self::State<'a>) {
        state.policy.keep(&prior.policy);
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
            .create_dns_reservation(&DnsReservationRequest {
                name: state.name.as_str().to_owned(),
                policy: CloudBoltClient::dns_policy_path(state.policy.policy_id()?),
                workspace: workspace.to_owned(),
                value: state.value.as_str().to_owned(),
                zones: state.zones(),
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
        state.set_reservation(client.get_dns_reservation(href).await?);
        Ok(())
    }

    async fn refresh<'a>(
        &self,
        client: &CloudBoltClient,
        state: &mut Self::State<'a>,
    ) -> Result<()> {
        let reservation = client.get_dns_reservation_by_id(state.reservation_id()?).await?;
        state.set_reservation(reservation);
        Ok(())
    }

    async fn remove<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
    ) -> Result<JobStatus> {
        client.delete_dns_reservation(state.reservation_id()?).await
    }
}
