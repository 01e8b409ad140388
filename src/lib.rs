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

//! Terraform provider for CloudBolt and OneFuse
//!
//! Every mutating call against CloudBolt or OneFuse starts a long-running order or job.
//! The resources submit the call, then wait for the operation through the [`poll`] module.

pub mod bp_instance;
pub mod client;
pub mod config;
pub mod error;
pub mod onefuse;
pub mod poll;
pub mod provider;

mod utils;

pub use error::{Error, Result};
pub use provider::CloudBoltProvider;
