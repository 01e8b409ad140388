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

//! Documents exchanged with the CloudBolt `/api/v2` and OneFuse `/api/v3/onefuse` endpoints
//!
//! Only the fields consumed by the provider are modeled.
//! Every field defaults when absent: the API omits empty links and messages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// HAL link
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub href: String,
    pub title: String,
}

impl Link {
    pub fn is_set(&self) -> bool {
        !self.href.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelfLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub jobs: Vec<Link>,
}

/// Blueprint deployment or decommission request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(rename = "_links")]
    pub links: OrderLinks,
    pub id: String,
    pub name: String,
    pub status: String,
}

/// Detailed progress of an order, only fetched once the order failed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OrderStatus {
    pub status: String,
    pub output_messages: Vec<String>,
    pub error_messages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub resource: Link,
    pub servers: Vec<Link>,
}

/// Unit of execution of an order or of a resource action
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Job {
    #[serde(rename = "_links")]
    pub links: JobLinks,
    pub id: String,
    pub status: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub output: String,
    pub errors: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub servers: Vec<Link>,
    pub actions: Vec<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamedValue {
    pub name: String,
    pub value: JsonValue,
}

/// Deployed blueprint instance
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Resource {
    #[serde(rename = "_links")]
    pub links: ResourceLinks,
    pub id: String,
    pub name: String,
    pub status: String,
    pub attributes: Vec<NamedValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Server {
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    pub hostname: String,
    pub ip: String,
    pub mac: String,
    pub status: String,
    pub power_status: String,
    pub date_added_to_cloudbolt: String,
    pub cpu_cnt: i64,
    pub mem_size: JsonValue,
    pub disk_size: JsonValue,
    pub notes: String,
    pub os_family: String,
    pub labels: Option<Vec<JsonValue>>,
    pub rate_breakdown: Option<Map<String, JsonValue>>,
    pub tech_specific_attributes: Map<String, JsonValue>,
    pub disks: Vec<Map<String, JsonValue>>,
    pub networks: Vec<Map<String, JsonValue>>,
    pub attributes: Vec<NamedValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionOrder {
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionJob {
    #[serde(rename = "_links")]
    pub links: SelfLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ActionResults {
    /// Set when the action ran synchronously
    pub status: String,
    pub error_message: String,
    pub output_message: String,
    pub job: ActionJob,
    pub order: ActionOrder,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunActionResult {
    pub results: ActionResults,
}

/// Answer to a server decommission: either an order (`ORD-` id) or a job
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DecomResult {
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobStatusLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub managed_object: Link,
}

/// OneFuse asynchronous operation record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(rename = "_links")]
    pub links: JobStatusLinks,
    pub id: i64,
    pub job_state: String,
    pub job_type: String,
    pub error_details: JsonValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    pub workspace: Link,
    pub policy: Link,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomName {
    #[serde(rename = "_links")]
    pub links: PolicyLinks,
    pub id: i64,
    pub name: String,
    pub dns_suffix: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomNameRequest {
    pub naming_policy: String,
    pub workspace: String,
    pub template_properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DnsReservation {
    #[serde(rename = "_links")]
    pub links: PolicyLinks,
    pub id: i64,
    pub name: String,
    pub value: String,
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsReservationRequest {
    pub name: String,
    pub policy: String,
    pub workspace: String,
    pub value: String,
    pub zones: Vec<String>,
    pub template_properties: Map<String, JsonValue>,
}

/// IP address reserved through a OneFuse IPAM policy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IpamReservation {
    #[serde(rename = "_links")]
    pub links: PolicyLinks,
    pub id: i64,
    pub hostname: String,
    pub ip_address: String,
    pub netmask: String,
    pub gateway: String,
    pub network: String,
    pub subnet: String,
    pub primary_dns: String,
    pub secondary_dns: String,
    pub dns_suffix: String,
    pub nic_label: String,
}

/// Empty fields are left for the policy to fill
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpamReservationRequest {
    pub hostname: String,
    pub policy: String,
    pub workspace: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub netmask: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub gateway: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subnet: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub primary_dns: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secondary_dns: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dns_suffix: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns_search_suffix: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nic_label: String,
    pub template_properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MicrosoftAdComputerAccount {
    #[serde(rename = "_links")]
    pub links: PolicyLinks,
    pub id: i64,
    pub name: String,
    pub final_ou: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrosoftAdComputerAccountRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub final_ou: String,
    pub policy: String,
    pub workspace: String,
    pub template_properties: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Workspace {
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Embedded<T> {
    #[serde(rename = "_embedded", default = "Vec::new")]
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failed_job() {
        let job: Job = serde_json::from_str(
            r#"{
                "_links": {"self": {"href": "/api/v2/jobs/1204/", "title": "Job 1204"}},
                "id": "JOB-1204",
                "status": "FAILURE",
                "type": "deploy_blueprint",
                "output": "starting\n",
                "errors": "quota exceeded\nrollback done\n"
            }"#,
        )
        .unwrap();
        assert_eq!(job.links.self_link.href, "/api/v2/jobs/1204/");
        assert_eq!(job.job_type, "deploy_blueprint");
        assert!(!job.links.resource.is_set());
        assert!(job.links.servers.is_empty());
    }

    #[test]
    fn decode_job_status_with_managed_object() {
        let status: JobStatus = serde_json::from_str(
            r#"{
                "_links": {
                    "self": {"href": "/api/v3/onefuse/jobMetadata/88/"},
                    "managedObject": {"href": "/api/v3/onefuse/customNames/17/"}
                },
                "id": 88,
                "jobState": "Successful"
            }"#,
        )
        .unwrap();
        assert_eq!(status.job_state, "Successful");
        assert_eq!(
            status.links.managed_object.href,
            "/api/v3/onefuse/customNames/17/"
        );
        assert!(status.error_details.is_null());
    }

    #[test]
    fn decode_immediate_action_result() {
        let result: RunActionResult = serde_json::from_str(
            r#"{"results": {"status": "FAILURE", "error-message": "boom", "output-message": ""}}"#,
        )
        .unwrap();
        assert_eq!(result.results.status, "FAILURE");
        assert_eq!(result.results.error_message, "boom");
        assert!(!result.results.job.links.self_link.is_set());
    }
}
