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

use std::collections::BTreeSet;

use tf_provider::{AttributePath, Diagnostics};
use tf_provider::value::Value;

use super::state::BpInstanceState;

impl<'a> BpInstanceState<'a> {
    pub fn validate(&self, diags: &mut Diagnostics) {
        match &self.deployment_item {
            Value::Null => diags.error_short(
                "At least one `deployment_item` is required",
                AttributePath::new("deployment_item"),
            ),
            Value::Value(items) if items.is_empty() => diags.error_short(
                "At least one `deployment_item` is required",
                AttributePath::new("deployment_item"),
            ),
            _ => (),
        }

        let mut names = BTreeSet::new();
        for item in self.deployment_items() {
            if let Some(name) = item.name.as_deref_option() {
                if !names.insert(name) {
                    diags.error(
                        "Duplicate deployment item",
                        format!("The deployment item {name:?} is defined several times"),
                        AttributePath::new("deployment_item"),
                    );
                }
            }
        }

        if let Value::Value(timeout) = self.request_timeout {
            if timeout <= 0 {
                diags.error_short(
                    "`request_timeout` must be a positive number of minutes",
                    AttributePath::new("request_timeout"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::state::DeploymentItem;
    use super::*;

    fn item(name: &str) -> Value<DeploymentItem<'_>> {
        Value::Value(DeploymentItem {
            name: name.into(),
            ..Default::default()
        })
    }

    #[test]
    fn deployment_item_is_required() {
        let mut diags = Diagnostics::default();
        BpInstanceState::default().validate(&mut diags);

        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("deployment_item"));
    }

    #[test]
    fn unknown_items_are_accepted() {
        let state = BpInstanceState {
            deployment_item: Value::Unknown,
            request_timeout: Value::Unknown,
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        state.validate(&mut diags);

        assert!(diags.errors.is_empty());
    }

    #[test]
    fn duplicate_items_and_bad_timeout() {
        let state = BpInstanceState {
            deployment_item: Value::Value(vec![item("vm"), item("db"), item("vm")]),
            request_timeout: Value::Value(0),
            ..Default::default()
        };

        let mut diags = Diagnostics::default();
        state.validate(&mut diags);

        let summaries = diags
            .errors
            .iter()
            .map(|diag| &*diag.summary)
            .collect::<Vec<_>>();
        assert_eq!(
            summaries,
            [
                "Duplicate deployment item",
                "`request_timeout` must be a positive number of minutes"
            ]
        );
    }
}
