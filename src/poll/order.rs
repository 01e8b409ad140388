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

use crate::client::model::{Order, OrderStatus};
use crate::client::CloudBoltClient;
use crate::error::Result;

use super::{Report, StatusSource, Vocabulary};

pub const ORDER_STATES: Vocabulary = Vocabulary {
    pending: &["ACTIVE"],
    target: &["SUCCESS"],
    failure: &["FAILURE"],
};

/// CloudBolt order, polled by id
#[derive(Debug)]
pub struct OrderOperation<'a> {
    client: &'a CloudBoltClient,
    order_id: String,
}

impl<'a> OrderOperation<'a> {
    pub fn new(client: &'a CloudBoltClient, order_id: impl Into<String>) -> Self {
        Self {
            client,
            order_id: order_id.into(),
        }
    }
}

#[async_trait]
impl StatusSource for OrderOperation<'_> {
    type Status = Order;

    fn kind(&self) -> &'static str {
        "Order"
    }

    fn reference(&self) -> &str {
        &self.order_id
    }

    fn vocabulary(&self) -> &Vocabulary {
        &ORDER_STATES
    }

    async fn fetch(&self) -> Result<Order> {
        self.client.get_order(&self.order_id).await
    }

    fn state<'s>(&self, status: &'s Order) -> &'s str {
        &status.status
    }

    async fn failure_report(&self, _: &Order) -> String {
        order_failure_report(
            &self.order_id,
            self.client.get_order_status(&self.order_id).await,
        )
    }
}

pub(crate) fn order_failure_report(order_id: &str, details: Result<OrderStatus>) -> String {
    match details {
        Ok(details) => Report::new(format!("Order {order_id} failed."))
            .lines("Outputs", &details.output_messages)
            .lines("Errors", &details.error_messages)
            .finish(),
        Err(err) => {
            format!("Order {order_id} failed, but status details could not be retrieved: {err}")
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::MockServer;

    use super::*;
    use crate::client::mock;
    use crate::error::Error;
    use crate::poll::wait_for_state;

    #[test]
    fn report_lists_outputs_and_errors() {
        let details = OrderStatus {
            status: "FAILURE".into(),
            output_messages: vec!["Creating vm-1".into()],
            error_messages: vec!["disk allocation failed".into()],
        };
        assert_eq!(
            order_failure_report("ORD-12", Ok(details)),
            "Order ORD-12 failed.\n\n\
             Outputs:\n  • Creating vm-1\n\n\
             Errors:\n  • disk allocation failed"
        );
    }

    #[test]
    fn report_without_messages_is_headline_only() {
        let details = OrderStatus {
            status: "FAILURE".into(),
            ..Default::default()
        };
        assert_eq!(
            order_failure_report("ORD-12", Ok(details)),
            "Order ORD-12 failed."
        );
    }

    #[test]
    fn report_when_details_are_unavailable() {
        let report = order_failure_report(
            "ORD-12",
            Err(Error::NotFound("/api/v2/orders/ORD-12/status/".into())),
        );
        assert_eq!(
            report,
            "Order ORD-12 failed, but status details could not be retrieved: \
             /api/v2/orders/ORD-12/status/ not found"
        );
    }

    #[tokio::test]
    async fn failed_order_is_reported_from_its_status_details() {
        let server = MockServer::start().await;
        mock::serve_json_once(&server, "GET", "/api/v2/orders/ORD-12/", json!({"status": "ACTIVE"})).await;
        mock::serve_json(
            &server,
            "GET",
            "/api/v2/orders/ORD-12/",
            json!({"id": "ORD-12", "status": "FAILURE"}),
            1,
        )
        .await;
        mock::serve_json(
            &server,
            "GET",
            "/api/v2/orders/ORD-12/status/",
            json!({"status": "FAILURE", "error-messages": ["disk allocation failed"]}),
            1,
        )
        .await;
        let client = mock::client(&server);

        let err = wait_for_state(&OrderOperation::new(&client, "ORD-12"), &mock::fast_polling())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Order ORD-12 failed.\n\nErrors:\n  • disk allocation failed"
        );
    }
}
