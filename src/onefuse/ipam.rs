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
use tf_provider::value::{Value, ValueList, ValueString};

use crate::client::model::{IpamReservation, IpamReservationRequest, JobStatus};
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::utils::normalize_parameters;

use super::{keep_optional, plan_optional, replaced_if_set, Common, ManagedObject, PolicyRecord};

/// IP address reserved through a OneFuse IPAM policy
#[derive(Debug, Default, Clone)]
pub struct IpamRecord;

/// Settings the policy assigns unless the configuration sets them
const ASSIGNED: [(&str, &str); 9] = [
    ("ip_address", "IP address reserved for the host"),
    ("netmask", "Netmask of the network"),
    ("gateway", "Gateway of the network"),
    ("network", "Network the address belongs to"),
    ("subnet", "Subnet of the address"),
    ("primary_dns", "Primary DNS server"),
    ("secondary_dns", "Secondary DNS server"),
    ("nic_label", "Label of the network interface"),
    ("dns_suffix", "DNS suffix of the host"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IpamRecordState<'a> {
    #[serde(borrow = "'a")]
    #[serde(flatten)]
    pub common: Common<'a>,
    #[serde(flatten)]
    pub policy: PolicyRecord<'a>,
    pub hostname: ValueString<'a>,
    /// The policy may override the requested hostname
    pub computed_hostname: ValueString<'a>,
    pub ip_address: ValueString<'a>,
    pub netmask: ValueString<'a>,
    pub gateway: ValueString<'a>,
    pub network: ValueString<'a>,
    pub subnet: ValueString<'a>,
    pub primary_dns: ValueString<'a>,
    pub secondary_dns: ValueString<'a>,
    pub nic_label: ValueString<'a>,
    pub dns_suffix: ValueString<'a>,
    pub dns_search_suffix: ValueList<ValueString<'a>>,
}

impl<'a> AsRef<Common<'a>> for IpamRecordState<'a> {
    fn as_ref(&self) -> &Common<'a> {
        &self.common
    }
}

impl<'a> AsMut<Common<'a>> for IpamRecordState<'a> {
    fn as_mut(&mut self) -> &mut Common<'a> {
        &mut self.common
    }
}

impl<'a> IpamRecordState<'a> {
    /// Assigned settings, in the order of [`ASSIGNED`]
    fn assigned(&self) -> [&ValueString<'a>; 9] {
        [
            &self.ip_address,
            &self.netmask,
            &self.gateway,
            &self.network,
            &self.subnet,
            &self.primary_dns,
            &self.secondary_dns,
            &self.nic_label,
            &self.dns_suffix,
        ]
    }

    fn assigned_mut(&mut self) -> [&mut ValueString<'a>; 9] {
        [
            &mut self.ip_address,
            &mut self.netmask,
            &mut self.gateway,
            &mut self.network,
            &mut self.subnet,
            &mut self.primary_dns,
            &mut self.secondary_dns,
            &mut self.nic_label,
            &mut self.dns_suffix,
        ]
    }

    fn dns_search_suffixes(&self) -> Vec<String> {
        self.dns_search_suffix
            .iter()
            .flatten()
            .filter_map(|suffix| suffix.as_deref_option())
            .map(str::to_owned)
            .collect()
    }

    fn reservation_id(&self) -> Result<i64> {
        self.common
            .id
            .as_str()
            .parse::<i64>()
            .map_err(|_| Error::NotFound(format!("IPAM reservation {:?}", self.common.id.as_str())))
    }

    fn set_reservation(&mut self, reservation: IpamReservation) {
        self.common.id = ValueString::from(reservation.id.to_string());
        self.policy.set_links(&reservation.links);
        self.computed_hostname = ValueString::from(reservation.hostname);

        let values = [
            reservation.ip_address,
            reservation.netmask,
            reservation.gateway,
            reservation.network,
            reservation.subnet,
            reservation.primary_dns,
            reservation.secondary_dns,
            reservation.nic_label,
            reservation.dns_suffix,
        ];
        for (field, value) in self.assigned_mut().into_iter().zip(values) {
            *field = ValueString::from(value);
        }
    }
}

#[async_trait]
impl ManagedObject for IpamRecord {
    const NAME: &'static str = "IPAM Reservation";
    type State<'a> = IpamRecordState<'a>;

    fn attributes() -> HashMap<String, Attribute> {
        let mut attributes = map! {
            "hostname" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Hostname the address is reserved for"),
                constraint: AttributeConstraint::Required,
                ..Default::default()
            },
            "computed_hostname" => Attribute {
                attr_type: AttributeType::String,
                description: Description::plain("Hostname of the reservation, after the overrides of the policy"),
                constraint: AttributeConstraint::Computed,
                ..Default::default()
            },
            "dns_search_suffix" => Attribute {
                attr_type: AttributeType::List(AttributeType::String.into()),
                description: Description::plain("DNS search suffixes of the host"),
                constraint: AttributeConstraint::Optional,
                ..Default::default()
            },
        };
        attributes.extend(ASSIGNED.iter().map(|(name, description)| {
            (
                name.to_string(),
                Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain(*description),
                    constraint: AttributeConstraint::OptionalComputed,
                    ..Default::default()
                },
            )
        }));
        attributes.extend(PolicyRecord::attributes("IPAM"));
        attributes
    }

    fn replaced_by<'a>(prior: &Self::State<'a>, proposed: &Self::State<'a>) -> Vec<AttributePath> {
        let mut paths = Vec::new();
        if proposed.hostname != prior.hostname {
            paths.push(AttributePath::new("hostname"));
        }
        prior.policy.replaced_by(&proposed.policy, &mut paths);
        for (((name, _), prior), proposed) in ASSIGNED
            .iter()
            .zip(prior.assigned())
            .zip(proposed.assigned())
        {
            replaced_if_set(&mut paths, name, prior, proposed);
        }
        if proposed.dns_search_suffix != prior.dns_search_suffix {
            paths.push(AttributePath::new("dns_search_suffix"));
        }
        paths
    }

    fn plan_computed<'a>(state: &mut Self::State<'a>, config: &Self::State<'a>) {
        state.policy.plan(&config.policy);
        state.computed_hostname = Value::Unknown;
        for (planned, config) in state.assigned_mut().into_iter().zip(config.assigned()) {
            plan_optional(planned, config);
        }
    }

    fn keep_computed<'a>(state: &mut Self::State<'a>, prior: &Self::State<'a>) {
        state.policy.keep(&prior.policy);
        state.computed_hostname = prior.computed_hostname.clone();
        for (planned, prior) in state.assigned_mut().into_iter().zip(prior.assigned()) {
            keep_optional(planned, prior);
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
        let [ip_address, netmask, gateway, network, subnet, primary_dns, secondary_dns, nic_label, dns_suffix] =
            state.assigned().map(|value| value.as_str().to_owned());

        client
            .create_ipam_reservation(&IpamReservationRequest {
                hostname: state.hostname.as_str().to_owned(),
                policy: CloudBoltClient::ipam_policy_path(state.policy.policy_id()?),
                workspace: workspace.to_owned(),
                ip_address,
                netmask,
                gateway,
                network,
                subnet,
                primary_dns,
                secondary_dns,
                dns_suffix,
                dns_search_suffix: state.dns_search_suffixes(),
                nic_label,
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
        state.set_reservation(client.get_ipam_reservation(href).await?);
        Ok(())
    }

    async fn refresh<'a>(
        &self,
        client: &CloudBoltClient,
        state: &mut Self::State<'a>,
    ) -> Result<()> {
        let reservation = client.get_ipam_reservation_by_id(state.reservation_id()?).await?;
        state.set_reservation(reservation);
        Ok(())
    }

    async fn remove<'a>(
        &self,
        client: &CloudBoltClient,
        state: &Self::State<'a>,
    ) -> Result<JobStatus> {
        client.delete_ipam_reservation(state.reservation_id()?).await
    }
}
