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

use crate::client::model::Job;
use crate::client::CloudBoltClient;
use crate::error::Result;

use super::{Report, StatusSource, Vocabulary};

pub const JOB_STATES: Vocabulary = Vocabulary {
    pending: &["INIT", "QUEUED", "PENDING", "RUNNING", "TO_CANCEL"],
    target: &["SUCCESS"],
    failure: &["FAILURE", "WARNING", "CANCELED"],
};

/// CloudBolt job, polled by link
#[derive(Debug)]
pub struct JobOperation<'a> {
    client: &'a CloudBoltClient,
    job_path: String,
}

impl<'a> JobOperation<'a> {
    pub fn new(client: &'a CloudBoltClient, job_path: impl Into<String>) -> Self {
        Self {
            client,
            job_path: job_path.into(),
        }
    }
}

#[async_trait]
impl StatusSource for JobOperation<'_> {
    type Status = Job;

    fn kind(&self) -> &'static str {
        "Job"
    }

    fn reference(&self) -> &str {
        &self.job_path
    }

    fn vocabulary(&self) -> &Vocabulary {
        &JOB_STATES
    }

    async fn fetch(&self) -> Result<Job> {
        self.client.get_job(&self.job_path).await
    }

    fn state<'s>(&self, status: &'s Job) -> &'s str {
        &status.status
    }

    async fn failure_report(&self, job: &Job) -> String {
        job_failure_report(&self.job_path, job)
    }
}

pub(crate) fn job_failure_report(job_path: &str, job: &Job) -> String {
    let reference = if job.id.is_empty() {
        job_path
    } else {
        job.id.as_str()
    };
    Report::new(format!("Job {reference} failed to reach target state."))
        .text("Errors", &job.errors)
        .text("Outputs", &job.output)
        .finish()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::MockServer;

    use super::*;
    use crate::client::mock;
    use crate::error::Error;
    use crate::poll::{wait_for_state, StateClass};

    #[test]
    fn job_vocabulary() {
        for state in ["INIT", "QUEUED", "PENDING", "RUNNING", "TO_CANCEL"] {
            assert_eq!(JOB_STATES.classify(state), StateClass::Pending);
        }
        for state in ["FAILURE", "WARNING", "CANCELED"] {
            assert_eq!(JOB_STATES.classify(state), StateClass::Failure);
        }
        assert_eq!(JOB_STATES.classify("SUCCESS"), StateClass::Target);
    }

    #[test]
    fn report_splits_errors_and_output() {
        let job = Job {
            id: "JOB-1204".into(),
            status: "FAILURE".into(),
            errors: "quota exceeded\nrollback done\n".into(),
            output: "starting\n".into(),
            ..Default::default()
        };
        assert_eq!(
            job_failure_report("/api/v2/jobs/1204/", &job),
            "Job JOB-1204 failed to reach target state.\n\n\
             Errors:\n  • quota exceeded\n  • rollback done\n\n\
             Outputs:\n  • starting"
        );
    }

    #[test]
    fn report_falls_back_to_link() {
        let job = Job {
            status: "CANCELED".into(),
            ..Default::default()
        };
        assert_eq!(
            job_failure_report("/api/v2/jobs/7/", &job),
            "Job /api/v2/jobs/7/ failed to reach target state."
        );
    }

    #[tokio::test]
    async fn failed_job_is_reported_from_its_last_status() {
        let server = MockServer::start().await;
        mock::serve_json_once(&server, "GET", "/api/v2/jobs/12/", json!({"status": "RUNNING"})).await;
        mock::serve_json(
            &server,
            "GET",
            "/api/v2/jobs/12/",
            json!({"id": "JOB-12", "status": "WARNING", "errors": "disk busy\n"}),
            1,
        )
        .await;
        let client = mock::client(&server);

        let err = wait_for_state(&JobOperation::new(&client, "/api/v2/jobs/12/"), &mock::fast_polling())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Job JOB-12 failed to reach target state.\n\nErrors:\n  • disk busy"
        );
    }
}
