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

use anyhow::Result;

use terraform_provider_cloudbolt::CloudBoltProvider;
use tf_provider::serve;

#[tokio::main]
async fn main() -> Result<()> {
    // tf-provider installs its own subscriber when PLUGIN_LOG_FILE is set
    if std::env::var_os("PLUGIN_LOG_FILE").is_none() {
        let _ = tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    }

    serve("cloudbolt", CloudBoltProvider::default()).await
}
