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

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::client::model::JobStatus;
use crate::client::CloudBoltClient;
use crate::error::Result;

use super::{Report, StatusSource, Vocabulary};

pub const JOB_STATUS_STATES: Vocabulary = Vocabulary {
    pending: &["Initialized", "In_Progress"],
    target: &["Successful"],
    failure: &["Failed", "Canceled"],
};

/// OneFuse job, polled by link
#[derive(Debug)]
pub struct JobStatusOperation<'a> {
    client: &'a CloudBoltClient,
    path: String,
}

impl<'a> JobStatusOperation<'a> {
    pub fn new(client: &'a CloudBoltClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

#[async_trait]
impl StatusSource for JobStatusOperation<'_> {
    type Status = JobStatus;

    fn kind(&self) -> &'static str {
        "OneFuse job"
    }

    fn reference(&self) -> &str {
        &self.path
    }

    fn vocabulary(&self) -> &Vocabulary {
        &JOB_STATUS_STATES
    }

    async fn fetch(&self) -> Result<JobStatus> {
        self.client.get_job_status(&self.path).await
    }

    fn state<'s>(&self, status: &'s JobStatus) -> &'s str {
        &status.job_state
    }

    async fn failure_report(&self, status: &JobStatus) -> String {
        job_status_failure_report(&self.path, status)
    }
}

pub(crate) fn job_status_failure_report(path: &str, status: &JobStatus) -> String {
    let report = Report::new(format!("Job {path} failed to reach target state."));
    match &status.error_details {
        JsonValue::Null => report,
        JsonValue::String(details) => report.text("Errors", details),
        details => report.lines("Errors", [details.to_string()]),
    }
    .finish()
}
