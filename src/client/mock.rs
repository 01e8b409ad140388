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

//! Mock CloudBolt API for the tests

use std::time::Duration;

use serde_json::Value as JsonValue;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::poll::WaitConfig;

use super::{ClientConfig, CloudBoltClient};

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        protocol: "http".into(),
        host: server.address().ip().to_string(),
        port: server.address().port().to_string(),
        username: "admin".into(),
        password: "secret".into(),
        ..Default::default()
    }
}

pub fn client(server: &MockServer) -> CloudBoltClient {
    CloudBoltClient::new(&config(server)).unwrap()
}

/// Poll fast enough to go through several states within a test
pub fn fast_polling() -> WaitConfig {
    WaitConfig {
        delay: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

/// Answer every `verb` request on `route` with `body`, exactly `times` times
pub async fn serve_json(server: &MockServer, verb: &str, route: &str, body: JsonValue, times: u64) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Answer the first `verb` request on `route` with `body`, leaving the next ones to other mocks
pub async fn serve_json_once(server: &MockServer, verb: &str, route: &str, body: JsonValue) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}
