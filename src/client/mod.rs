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

//! CloudBolt and OneFuse REST client
//!
//! The client is built once, when the provider is configured, and is never mutated afterwards.
//! Requests that need a longer timeout than the configured one set it on the request itself.

use std::time::Duration;

use reqwest::{header::ACCEPT, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::error::{Error, Result};

pub mod model;

#[cfg(test)]
pub(crate) mod mock;

use model::{
    CustomName, CustomNameRequest, DecomResult, DnsReservation, DnsReservationRequest, Embedded,
    IpamReservation, IpamReservationRequest, Job, JobStatus, MicrosoftAdComputerAccount,
    MicrosoftAdComputerAccountRequest, Order, OrderStatus, Resource, RunActionResult, Server,
    Workspace,
};

const AUTH_PATH: &str = "/api/v2/api-token-auth/";
const ORDERS_PATH: &str = "/api/v2/orders/";
const SERVERS_PATH: &str = "/api/v2/servers/";
const ONEFUSE_PATH: &str = "/api/v3/onefuse";

/// Blueprint orders are validated synchronously by CloudBolt and are much slower to answer
const DEPLOY_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings, resolved from the provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub protocol: String,
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: String,
    pub domain: String,
    pub timeout: Duration,
    pub insecure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: "https".into(),
            host: Default::default(),
            port: "443".into(),
            username: Default::default(),
            password: Default::default(),
            domain: Default::default(),
            timeout: Duration::from_secs(10),
            insecure: true,
        }
    }
}

/// Deployment item of a blueprint order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeployItem {
    pub name: String,
    pub environment: Option<String>,
    pub osbuild: Option<String>,
    pub parameters: Map<String, JsonValue>,
}

#[derive(Clone)]
pub struct CloudBoltClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for CloudBoltClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudBoltClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
}

#[derive(Deserialize)]
struct Token {
    token: String,
}

impl CloudBoltClient {
    /// Build an unauthenticated client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|err| Error::Config(format!("cannot build the HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: format!("{}://{}:{}", config.protocol, config.host, config.port),
            token: String::new(),
        })
    }

    /// Build a client and authenticate it against the API
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        let url = client.url(AUTH_PATH);
        let request = client.http.post(&url).json(&Credentials {
            username: &config.username,
            password: &config.password,
            domain: Some(config.domain.as_str()).filter(|domain| !domain.is_empty()),
        });

        let token: Token = match client.execute(request, url).await {
            Ok(token) => token,
            Err(Error::Http { status, body, .. }) => {
                return Err(Error::Auth(format!("HTTP {status}: {body}")))
            }
            Err(err) => return Err(err),
        };
        if token.token.is_empty() {
            return Err(Error::Auth("the API answered with an empty token".into()));
        }
        client.token = token.token;

        debug!(base_url = %client.base_url, "authenticated against CloudBolt");
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL from either an API path or an already absolute link
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, url: String) -> Result<T> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| Error::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| Error::Transport {
            url: url.clone(),
            source,
        })?;
        debug!(%url, status = status.as_u16(), "CloudBolt API response");

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url));
        }
        if !status.is_success() {
            return Err(Error::Http {
                url,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| Error::Decode { url, source })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let request = self.http.get(&url).bearer_auth(&self.token);
        self.execute(request, url).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, timeout: Option<Duration>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.http.post(&url).bearer_auth(&self.token).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        self.execute(request, url).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let request = self.http.delete(&url).bearer_auth(&self.token);
        self.execute(request, url).await
    }

    // CloudBolt

    pub async fn deploy_blueprint(
        &self,
        group: &str,
        blueprint: &str,
        resource_name: &str,
        parameters: &Map<String, JsonValue>,
        items: &[DeployItem],
    ) -> Result<Order> {
        let payload = deploy_payload(group, blueprint, resource_name, parameters, items);
        self.post(ORDERS_PATH, &payload, Some(DEPLOY_TIMEOUT)).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.get(&format!("{ORDERS_PATH}{order_id}/")).await
    }

    pub async fn get_order_status(&self, order_id: &str) -> Result<OrderStatus> {
        self.get(&format!("{ORDERS_PATH}{order_id}/status/")).await
    }

    pub async fn get_job(&self, job_path: &str) -> Result<Job> {
        self.get(job_path).await
    }

    pub async fn get_resource(&self, resource_path: &str) -> Result<Resource> {
        self.get(resource_path).await
    }

    pub async fn get_server(&self, server_path: &str) -> Result<Server> {
        self.get(server_path).await
    }

    pub async fn get_server_by_id(&self, server_id: &str) -> Result<Server> {
        self.get(&format!("{SERVERS_PATH}{server_id}/")).await
    }

    /// Run a resource action; the answer is either an immediate result or a job/order to wait for
    pub async fn submit_action(
        &self,
        action_path: &str,
        resource_path: &str,
        parameters: Option<&Map<String, JsonValue>>,
    ) -> Result<RunActionResult> {
        let payload = json!({
            "resource": resource_path,
            "parameters": parameters.cloned().unwrap_or_default(),
        });
        self.post(action_path, &payload, None).await
    }

    pub async fn decom_server(&self, server_id: &str) -> Result<DecomResult> {
        self.post(
            &format!("{SERVERS_PATH}{server_id}/decommission/"),
            &json!({}),
            None,
        )
        .await
    }

    // OneFuse

    pub async fn get_job_status(&self, job_status_path: &str) -> Result<JobStatus> {
        self.get(job_status_path).await
    }

    /// Link of the workspace named `Default`, used when a record does not name one
    pub async fn default_workspace(&self) -> Result<String> {
        let workspaces: Embedded<Workspace> = self
            .get(&format!(
                "{ONEFUSE_PATH}/workspaces/?filter=name.exact:Default"
            ))
            .await?;
        workspaces
            .items
            .into_iter()
            .map(|workspace| workspace.links.self_link.href)
            .find(|href| !href.is_empty())
            .ok_or_else(|| Error::NotFound("OneFuse Default workspace".into()))
    }

    pub fn naming_policy_path(policy_id: &str) -> String {
        format!("{ONEFUSE_PATH}/namingPolicies/{policy_id}/")
    }

    pub fn dns_policy_path(policy_id: i64) -> String {
        format!("{ONEFUSE_PATH}/dnsPolicies/{policy_id}/")
    }

    pub fn ipam_policy_path(policy_id: i64) -> String {
        format!("{ONEFUSE_PATH}/ipamPolicies/{policy_id}/")
    }

    pub fn microsoft_ad_policy_path(policy_id: i64) -> String {
        format!("{ONEFUSE_PATH}/microsoftADPolicies/{policy_id}/")
    }

    pub async fn create_custom_name(&self, request: &CustomNameRequest) -> Result<JobStatus> {
        self.post(&format!("{ONEFUSE_PATH}/customNames/"), request, None)
            .await
    }

    pub async fn get_custom_name(&self, path: &str) -> Result<CustomName> {
        self.get(path).await
    }

    pub async fn get_custom_name_by_id(&self, id: i64) -> Result<CustomName> {
        self.get(&format!("{ONEFUSE_PATH}/customNames/{id}/")).await
    }

    pub async fn delete_custom_name(&self, id: i64) -> Result<JobStatus> {
        self.delete(&format!("{ONEFUSE_PATH}/customNames/{id}/"))
            .await
    }

    pub async fn create_dns_reservation(
        &self,
        request: &DnsReservationRequest,
    ) -> Result<JobStatus> {
        self.post(&format!("{ONEFUSE_PATH}/dnsReservations/"), request, None)
            .await
    }

    pub async fn get_dns_reservation(&self, path: &str) -> Result<DnsReservation> {
        self.get(path).await
    }

    pub async fn get_dns_reservation_by_id(&self, id: i64) -> Result<DnsReservation> {
        self.get(&format!("{ONEFUSE_PATH}/dnsReservations/{id}/"))
            .await
    }

    pub async fn delete_dns_reservation(&self, id: i64) -> Result<JobStatus> {
        self.delete(&format!("{ONEFUSE_PATH}/dnsReservations/{id}/"))
            .await
    }

    pub async fn create_ipam_reservation(
        &self,
        request: &IpamReservationRequest,
    ) -> Result<JobStatus> {
        self.post(&format!("{ONEFUSE_PATH}/ipamReservations/"), request, None)
            .await
    }

    pub async fn get_ipam_reservation(&self, path: &str) -> Result<IpamReservation> {
        self.get(path).await
    }

    pub async fn get_ipam_reservation_by_id(&self, id: i64) -> Result<IpamReservation> {
        self.get(&format!("{ONEFUSE_PATH}/ipamReservations/{id}/"))
            .await
    }

    pub async fn delete_ipam_reservation(&self, id: i64) -> Result<JobStatus> {
        self.delete(&format!("{ONEFUSE_PATH}/ipamReservations/{id}/"))
            .await
    }

    pub async fn create_microsoft_ad_computer_account(
        &self,
        request: &MicrosoftAdComputerAccountRequest,
    ) -> Result<JobStatus> {
        self.post(
            &format!("{ONEFUSE_PATH}/microsoftADComputerAccounts/"),
            request,
            None,
        )
        .await
    }

    pub async fn get_microsoft_ad_computer_account(
        &self,
        path: &str,
    ) -> Result<MicrosoftAdComputerAccount> {
        self.get(path).await
    }

    pub async fn get_microsoft_ad_computer_account_by_id(
        &self,
        id: i64,
    ) -> Result<MicrosoftAdComputerAccount> {
        self.get(&format!("{ONEFUSE_PATH}/microsoftADComputerAccounts/{id}/"))
            .await
    }

    pub async fn delete_microsoft_ad_computer_account(&self, id: i64) -> Result<JobStatus> {
        self.delete(&format!("{ONEFUSE_PATH}/microsoftADComputerAccounts/{id}/"))
            .await
    }
}

/// Body of a blueprint order: a single deploy item carrying the arguments of every blueprint item
pub fn deploy_payload(
    group: &str,
    blueprint: &str,
    resource_name: &str,
    parameters: &Map<String, JsonValue>,
    items: &[DeployItem],
) -> JsonValue {
    let arguments = items
        .iter()
        .map(|item| {
            let mut argument = Map::new();
            argument.insert("parameters".into(), item.parameters.clone().into());
            if let Some(environment) = &item.environment {
                argument.insert("environment".into(), environment.as_str().into());
            }
            if let Some(osbuild) = &item.osbuild {
                argument.insert("os-build".into(), osbuild.as_str().into());
            }
            (item.name.clone(), JsonValue::Object(argument))
        })
        .collect::<Map<_, _>>();

    let mut deploy_item = json!({
        "blueprint": blueprint,
        "blueprint-items-arguments": arguments,
        "resource-parameters": parameters,
    });
    if !resource_name.is_empty() {
        deploy_item["resource-name"] = resource_name.into();
    }

    json!({
        "group": group,
        "items": {
            "deploy-items": [deploy_item],
        },
        "submit-now": "true",
    })
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client() -> CloudBoltClient {
        CloudBoltClient::new(&ClientConfig {
            host: "cloudbolt.example.com".into(),
            port: "8443".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn url_joins_paths_and_keeps_absolute_links() {
        let client = client();
        assert_eq!(client.base_url(), "https://cloudbolt.example.com:8443");
        assert_eq!(
            client.url("/api/v2/jobs/3/"),
            "https://cloudbolt.example.com:8443/api/v2/jobs/3/"
        );
        assert_eq!(
            client.url("api/v2/jobs/3/"),
            "https://cloudbolt.example.com:8443/api/v2/jobs/3/"
        );
        assert_eq!(
            client.url("http://other:80/api/v2/jobs/3/"),
            "http://other:80/api/v2/jobs/3/"
        );
    }

    #[test]
    fn debug_does_not_leak_the_token() {
        let mut client = client();
        client.token = "secret-token".into();
        assert!(!format!("{client:?}").contains("secret-token"));
    }

    #[test]
    fn deploy_payload_groups_items_under_one_deploy_item() {
        let mut params = Map::new();
        params.insert("owner".into(), "ops".into());
        let items = vec![
            DeployItem {
                name: "build-item-Server".into(),
                environment: Some("/api/v2/environments/ENV-1/".into()),
                osbuild: None,
                parameters: params.clone(),
            },
            DeployItem {
                name: "plugin-item-Tag".into(),
                ..Default::default()
            },
        ];

        let payload = deploy_payload(
            "/api/v2/groups/GRP-1/",
            "BP-7",
            "web",
            &params,
            &items,
        );

        assert_eq!(payload["group"], "/api/v2/groups/GRP-1/");
        assert_eq!(payload["submit-now"], "true");
        let deploy_items = payload["items"]["deploy-items"].as_array().unwrap();
        assert_eq!(deploy_items.len(), 1);
        let deploy_item = &deploy_items[0];
        assert_eq!(deploy_item["blueprint"], "BP-7");
        assert_eq!(deploy_item["resource-name"], "web");
        assert_eq!(deploy_item["resource-parameters"]["owner"], "ops");
        let server = &deploy_item["blueprint-items-arguments"]["build-item-Server"];
        assert_eq!(server["environment"], "/api/v2/environments/ENV-1/");
        assert!(server.get("os-build").is_none());
        assert_eq!(server["parameters"]["owner"], "ops");
        assert!(deploy_item["blueprint-items-arguments"]["plugin-item-Tag"]["parameters"]
            .as_object()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn deploy_payload_omits_empty_resource_name() {
        let payload = deploy_payload("g", "b", "", &Map::new(), &[]);
        assert!(payload["items"]["deploy-items"][0]
            .get("resource-name")
            .is_none());
    }

    async fn answer(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn connect_authenticates_later_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .and(body_json(json!({"username": "admin", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/orders/ORD-1/"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "ORD-1", "status": "ACTIVE"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CloudBoltClient::connect(&mock::config(&server)).await.unwrap();
        let order = client.get_order("ORD-1").await.unwrap();

        assert_eq!(order.id, "ORD-1");
        assert_eq!(order.status, "ACTIVE");
    }

    #[tokio::test]
    async fn empty_token_is_an_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": ""})))
            .mount(&server)
            .await;

        let err = CloudBoltClient::connect(&mock::config(&server))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth(_)), "{err:?}");
    }

    #[tokio::test]
    async fn rejected_credentials_are_an_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(AUTH_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let err = CloudBoltClient::connect(&mock::config(&server))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "authentication failed: HTTP 400: bad credentials"
        );
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let server = MockServer::start().await;
        answer(&server, "/api/v2/orders/ORD-9/", ResponseTemplate::new(404)).await;

        let err = mock::client(&server).get_order("ORD-9").await.unwrap_err();

        assert!(err.is_not_found());
        assert!(matches!(&err, Error::NotFound(url) if url.ends_with("/api/v2/orders/ORD-9/")));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let server = MockServer::start().await;
        answer(
            &server,
            "/api/v2/servers/7/",
            ResponseTemplate::new(503).set_body_string("busy"),
        )
        .await;

        let err = mock::client(&server).get_server_by_id("7").await.unwrap_err();

        match err {
            Error::Http { url, status, body } => {
                assert!(url.ends_with("/api/v2/servers/7/"));
                assert_eq!(status, 503);
                assert_eq!(body, "busy");
            }
            err => panic!("unexpected error {err:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_document_is_a_decode_error() {
        let server = MockServer::start().await;
        answer(
            &server,
            "/api/v2/jobs/3/",
            ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
        )
        .await;

        let err = mock::client(&server).get_job("/api/v2/jobs/3/").await.unwrap_err();

        assert!(matches!(err, Error::Decode { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn default_workspace_is_looked_up_by_name() {
        let server = MockServer::start().await;
        answer(
            &server,
            "/api/v3/onefuse/workspaces/",
            ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": [
                    {"_links": {"self": {"href": "/api/v3/onefuse/workspaces/2/"}}, "id": 2, "name": "Default"}
                ]
            })),
        )
        .await;

        let workspace = mock::client(&server).default_workspace().await.unwrap();

        assert_eq!(workspace, "/api/v3/onefuse/workspaces/2/");
    }
}
