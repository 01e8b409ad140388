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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use tf_provider::{map, AttributePath, Diagnostics};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{ValueBool, ValueNumber, ValueString};

use crate::client::ClientConfig;
use crate::utils::WithSchema;

pub const USERNAME_ENV: &str = "CB_USERNAME";
pub const PASSWORD_ENV: &str = "CB_PASSWORD";
pub const DOMAIN_ENV: &str = "CB_DOMAIN";

/// Content of the `provider "cloudbolt"` block
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub cb_protocol: ValueString<'a>,
    pub cb_host: ValueString<'a>,
    pub cb_port: ValueString<'a>,
    pub cb_timeout: ValueNumber,
    pub cb_insecure: ValueBool,
    pub cb_username: ValueString<'a>,
    pub cb_password: ValueString<'a>,
    pub cb_domain: ValueString<'a>,
}

impl<'a> WithSchema for ProviderConfig<'a> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "cb_protocol" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("CloudBolt API Protocol, Default (https)"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "cb_host" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("CloudBolt API Host"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "cb_port" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("CloudBolt API Port, Default (443)"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "cb_timeout" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Timeout in seconds, Default (10)"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "cb_insecure" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Disable SSL Verification, Default (true)"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "cb_username" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "CloudBolt API Username, required if not provided in environment variable CB_USERNAME",
                        ),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "cb_password" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "CloudBolt API Password, required if not provided in environment variable CB_PASSWORD",
                        ),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "cb_domain" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(
                            "CloudBolt API Domain, can also be set using environment variable CB_DOMAIN",
                        ),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::plain("CloudBolt and OneFuse provider"),
                ..Default::default()
            },
        }
    }
}

impl<'a> ProviderConfig<'a> {
    /// Check the values known at validation time
    ///
    /// Unknown values are accepted: they are checked again when the provider is configured.
    pub fn validate(&self, diags: &mut Diagnostics) {
        if let Some(protocol) = self.cb_protocol.as_deref_option() {
            if protocol != "http" && protocol != "https" {
                diags.error(
                    "Invalid protocol",
                    format!("\"cb_protocol\" must be either \"https\" or \"http\", got {protocol:?}"),
                    AttributePath::new("cb_protocol"),
                );
            }
        }
        if self.cb_host.as_deref_option() == Some("") {
            diags.error_short(
                "\"cb_host\" is required and must not be empty",
                AttributePath::new("cb_host"),
            );
        }
        if let Some(timeout) = self.cb_timeout.as_ref_option() {
            if *timeout <= 0 {
                diags.error_short(
                    "\"cb_timeout\" must be a positive number of seconds",
                    AttributePath::new("cb_timeout"),
                );
            }
        }
        for (name, value) in [
            ("cb_username", &self.cb_username),
            ("cb_password", &self.cb_password),
        ] {
            if value.as_deref_option() == Some("") {
                diags.error_short(
                    format!("\"{name}\" is required and must not be empty"),
                    AttributePath::new(name),
                );
            }
        }
    }

    /// Resolve the connection settings, falling back to `env` for the credentials
    pub fn client_config(
        &self,
        diags: &mut Diagnostics,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<ClientConfig> {
        self.validate(diags);

        let defaults = ClientConfig::default();
        let resolve = |value: &ValueString<'a>, var: &str| {
            value
                .as_deref_option()
                .map(str::to_owned)
                .or_else(|| env(var))
                .unwrap_or_default()
        };

        let config = ClientConfig {
            protocol: self
                .cb_protocol
                .as_deref_option()
                .map_or(defaults.protocol, str::to_owned),
            host: self.cb_host.as_str().to_owned(),
            port: self
                .cb_port
                .as_deref_option()
                .map_or(defaults.port, str::to_owned),
            username: resolve(&self.cb_username, USERNAME_ENV),
            password: resolve(&self.cb_password, PASSWORD_ENV),
            domain: resolve(&self.cb_domain, DOMAIN_ENV),
            timeout: self
                .cb_timeout
                .as_ref_option()
                .map_or(defaults.timeout, |secs| {
                    Duration::from_secs((*secs).max(0) as u64)
                }),
            insecure: self.cb_insecure.unwrap_or(defaults.insecure),
        };

        if config.host.is_empty() {
            diags.error_short("\"cb_host\" must be known", AttributePath::new("cb_host"));
        }
        if config.username.is_empty() {
            diags.error_short(
                format!("\"cb_username\" must be set or {USERNAME_ENV} environment variable must be set"),
                AttributePath::new("cb_username"),
            );
        }
        if config.password.is_empty() {
            diags.error_short(
                format!("\"cb_password\" must be set or {PASSWORD_ENV} environment variable must be set"),
                AttributePath::new("cb_password"),
            );
        }

        if diags.errors.is_empty() {
            Some(config)
        } else {
            None
        }
    }
}
