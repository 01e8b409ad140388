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

//! Error type shared by the API client, the state poller and the resources

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or its response could not be received
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("{url} returned HTTP {status}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body is not the expected JSON document
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid provider configuration: {0}")]
    Config(String),

    /// The remote operation reached a failure state
    #[error("{0}")]
    Failed(String),

    /// The remote operation did not reach a terminal state in time
    #[error("timeout while waiting for {kind} ({reference}) after {}s", elapsed.as_secs())]
    Timeout {
        kind: &'static str,
        reference: String,
        elapsed: Duration,
    },

    /// The remote operation kept reporting a state outside of its vocabulary
    #[error("{kind} ({reference}) reported unexpected state {state:?} {count} times in a row")]
    UnexpectedState {
        kind: &'static str,
        reference: String,
        state: String,
        count: usize,
    },

    /// An error annotated with the step that produced it
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, without the context annotations
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            err => err,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self.root() {
            Error::NotFound(_) => true,
            Error::Http { status, .. } => *status == 404,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Error::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
