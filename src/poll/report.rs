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

use std::fmt::Display;

/// Failure report of a remote operation
///
/// A headline followed by titled sections of bulleted lines:
///
/// ```text
/// Order ORD-12 failed.
///
/// Errors:
///   • disk allocation failed
/// ```
///
/// Blank lines are dropped, and sections without any line are omitted.
#[derive(Debug, Clone, Default)]
pub struct Report {
    text: String,
}

impl Report {
    pub fn new(headline: impl Display) -> Self {
        Self {
            text: headline.to_string(),
        }
    }

    /// Append a section listing `lines`
    pub fn lines<I, S>(mut self, title: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut section = String::new();
        for line in lines {
            let line = line.as_ref().trim_end();
            if !line.trim().is_empty() {
                section.push_str("\n  • ");
                section.push_str(line);
            }
        }
        if !section.is_empty() {
            self.text.push_str("\n\n");
            self.text.push_str(title);
            self.text.push(':');
            self.text.push_str(&section);
        }
        self
    }

    /// Append a section listing the lines of a multi-line `text`
    pub fn text(self, title: &str, text: &str) -> Self {
        self.lines(title, text.lines())
    }

    pub fn finish(self) -> String {
        self.text.trim_end().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_are_bulleted() {
        let report = Report::new("Job JOB-7 failed to reach target state.")
            .text("Errors", "quota exceeded\nrollback done\n")
            .lines("Outputs", ["provisioning vm-1"])
            .finish();
        assert_eq!(
            report,
            "Job JOB-7 failed to reach target state.\n\n\
             Errors:\n  • quota exceeded\n  • rollback done\n\n\
             Outputs:\n  • provisioning vm-1"
        );
    }

    #[test]
    fn empty_sections_are_omitted() {
        let report = Report::new("Order ORD-3 failed.")
            .lines("Outputs", Vec::<String>::new())
            .text("Errors", "\n  \n")
            .finish();
        assert_eq!(report, "Order ORD-3 failed.");
    }
}
