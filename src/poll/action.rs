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

use tracing::debug;

use crate::client::model::ActionResults;
use crate::client::CloudBoltClient;
use crate::error::{Error, Result};
use crate::utils::link_id;

use super::{wait_for_state, JobOperation, OrderOperation, Report, WaitConfig};

/// Wait for the completion of a resource action
///
/// An action either ran synchronously and carries its own status, or answers with a job or an
/// order that is polled until completion. The job is preferred when both are given.
pub async fn wait_for_action(
    client: &CloudBoltClient,
    results: &ActionResults,
    config: &WaitConfig,
) -> Result<()> {
    if let Some(report) = immediate_failure_report(results) {
        return Err(Error::Failed(report));
    }

    let job = &results.job.links.self_link;
    let order = &results.order.links.self_link;
    if job.is_set() {
        wait_for_state(&JobOperation::new(client, &job.href), config).await?;
    } else if order.is_set() {
        let order_id = match results.order.id.as_str() {
            "" => link_id(&order.href),
            id => id,
        };
        wait_for_state(&OrderOperation::new(client, order_id), config).await?;
    } else {
        debug!(status = %results.status, "action completed synchronously");
    }
    Ok(())
}

fn immediate_failure_report(results: &ActionResults) -> Option<String> {
    if results.status.is_empty() || results.status == "SUCCESS" {
        return None;
    }
    Some(
        Report::new(format!("Action failed (status={}).", results.status))
            .text("Errors", &results.error_message)
            .text("Output", &results.output_message)
            .finish(),
    )
}
