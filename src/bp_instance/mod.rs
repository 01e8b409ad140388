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

//! `cloudbolt_bp_instance`: a blueprint deployed through a CloudBolt order
//!
//! The deployment yields either a CloudBolt resource, identified by its link, or bare servers,
//! identified by their ids. Configuration changes are applied through the resource action titled
//! `Terraform Provider Update`.

mod apply;
mod read;
mod resource;
mod state;
mod validate;

pub use resource::BpInstanceResource;
