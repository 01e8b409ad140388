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

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::{Map, Value as JsonValue};
use tf_provider::Diagnostics;
use tf_provider::schema::Schema;
use tf_provider::value::{ValueMap, ValueString};
use tracing::{error, warn};

use crate::error::{Error, Result};

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

/// Run one resource operation and convert its outcome into diagnostics
///
/// Errors become a diagnostic whose summary is the outermost context of the error.
/// A panic is caught here and reported as a crash of the provider instead of aborting the plugin.
pub(crate) async fn guarded<T, F>(diags: &mut Diagnostics, operation: &str, action: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(action).catch_unwind().await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            error!(operation, "{err}");
            report(diags, operation, err);
            None
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(operation, panic = message, "recovered from a panic");
            diags.root_error(
                "CloudBolt provider crashed",
                format!("panic during {operation}: {message}"),
            );
            None
        }
    }
}

pub(crate) fn report(diags: &mut Diagnostics, operation: &str, err: Error) {
    match err {
        Error::Context { context, source } => diags.root_error(context, source.to_string()),
        err => diags.root_error(format!("Failed to {operation}"), err.to_string()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    // `panic!` payloads are either static or formatted strings
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Convert Terraform string parameters into API parameters
///
/// A value written `[a|b|c]` is sent as the list `["a", "b", "c"]`.
pub(crate) fn normalize_parameters<'a>(
    parameters: &ValueMap<'a, ValueString<'a>>,
) -> Map<String, JsonValue> {
    parameters
        .iter()
        .flatten()
        .filter_map(|(name, value)| {
            let value = value.as_deref_option()?;
            let value = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                Some(list) => list.split('|').map(JsonValue::from).collect::<JsonValue>(),
                None => JsonValue::from(value),
            };
            Some((name.to_string(), value))
        })
        .collect()
}

/// Render an API value the way it is written in Terraform parameters
///
/// Lists are rendered `[a|b]`, and values without a textual form (null, objects) are empty.
pub(crate) fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(values) => {
            let values = values.iter().map(value_to_string).collect::<Vec<_>>();
            format!("[{}]", values.join("|"))
        }
        JsonValue::Null | JsonValue::Object(_) => String::new(),
    }
}

/// Stringify every value of `values`, dropping the ones without a textual form
pub(crate) fn string_map<'a, 'b>(
    values: impl IntoIterator<Item = (&'b String, &'b JsonValue)>,
) -> ValueMap<'a, ValueString<'a>> {
    ValueMap::Value(
        values
            .into_iter()
            .filter_map(|(name, value)| {
                let value = value_to_string(value);
                (!value.is_empty()).then(|| (Cow::Owned(name.clone()), ValueString::from(value)))
            })
            .collect(),
    )
}

/// Last segment of an API link: `/api/v2/servers/42/` is `42`
pub(crate) fn link_id(href: &str) -> &str {
    let href = href.trim_end_matches('/');
    href.rsplit('/').next().unwrap_or(href)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;
    use tf_provider::value::Value;

    use super::*;

    #[test]
    fn bracketed_parameters_become_lists() {
        let parameters = Value::Value(BTreeMap::from([
            (Cow::Borrowed("disks"), ValueString::from("[10|20]")),
            (Cow::Borrowed("name"), ValueString::from("web")),
            (Cow::Borrowed("empty"), ValueString::from("[]")),
            (Cow::Borrowed("unset"), ValueString::Null),
        ]));

        let normalized = normalize_parameters(&parameters);

        assert_eq!(
            JsonValue::Object(normalized),
            json!({"disks": ["10", "20"], "name": "web", "empty": [""]})
        );
    }

    #[test]
    fn null_parameters_are_empty() {
        assert!(normalize_parameters(&ValueMap::Null).is_empty());
    }

    #[test]
    fn values_are_stringified() {
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&json!(4)), "4");
        assert_eq!(value_to_string(&json!(4.0)), "4");
        assert_eq!(value_to_string(&json!(1.5)), "1.5");
        assert_eq!(value_to_string(&json!("web")), "web");
        assert_eq!(value_to_string(&json!(["a", 2, false])), "[a|2|false]");
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!({"a": 1})), "");
    }

    #[test]
    fn string_map_drops_empty_values() {
        let values = serde_json::from_value::<Map<String, JsonValue>>(
            json!({"cpu": 2, "owner": null, "pool": "gold"}),
        )
        .unwrap();

        let map = string_map(&values);

        assert_eq!(
            map,
            Value::Value(BTreeMap::from([
                (Cow::Borrowed("cpu"), ValueString::from("2")),
                (Cow::Borrowed("pool"), ValueString::from("gold")),
            ]))
        );
    }

    #[test]
    fn link_ids() {
        assert_eq!(link_id("/api/v2/servers/42/"), "42");
        assert_eq!(link_id("/api/v2/servers/42"), "42");
        assert_eq!(link_id("42"), "42");
    }

    #[tokio::test]
    async fn errors_are_reported_with_their_context() {
        let mut diags = Diagnostics::default();
        let result: Option<()> = guarded(&mut diags, "read", async {
            Err(Error::Failed("Order ORD-1 failed.".into()).context("Error waiting for Order (ORD-1) to complete"))
        })
        .await;

        assert!(result.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(
            diags.errors[0].summary,
            "Error waiting for Order (ORD-1) to complete"
        );
        assert!(diags.errors[0].detail.starts_with("Order ORD-1 failed."));
    }

    #[tokio::test]
    async fn panics_are_reported_as_crash() {
        let mut diags = Diagnostics::default();
        let servers: Vec<u32> = Vec::new();
        let result = guarded(&mut diags, "create", async move { Ok(servers[3]) }).await;

        assert!(result.is_none());
        assert_eq!(diags.errors[0].summary, "CloudBolt provider crashed");
        assert!(diags.errors[0]
            .detail
            .starts_with("panic during create: index out of bounds"));
    }
}
