// This file is part of the terraform-provider-powervs project
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

//! Log subscriber of the provider process
//!
//! When Terraform sets `PLUGIN_LOG_FILE`, the plugin server installs its own
//! subscriber writing to that file and nothing is done here. Otherwise logs go
//! to stderr, where Terraform forwards them with `TF_LOG`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";

/// Filter directives from `TF_LOG_PROVIDER`, then `RUST_LOG`
fn filter_directives(env: impl Fn(&str) -> Option<String>) -> String {
    ["TF_LOG_PROVIDER", "RUST_LOG"]
        .iter()
        .find_map(|var| env(var).filter(|s| !s.trim().is_empty()))
        .map(|s| match s.to_ascii_lowercase().as_str() {
            // Terraform levels are not tracing directives
            "json" => "trace".to_owned(),
            level @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => level.to_owned(),
            _ => s,
        })
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}

/// Install the stderr subscriber unless the plugin server logs to a file
///
/// Initialization errors, such as an already installed subscriber, are ignored.
pub fn init() {
    if std::env::var_os("PLUGIN_LOG_FILE").is_some() {
        return;
    }
    let directives = filter_directives(|var| std::env::var(var).ok());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr);
    let _ = if std::env::var_os("TF_LOG_PROVIDER_JSON").is_some() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directives(vars: &[(&str, &str)]) -> String {
        filter_directives(|name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn default_is_warn() {
        assert_eq!(directives(&[]), "warn");
        assert_eq!(directives(&[("TF_LOG_PROVIDER", " ")]), "warn");
    }

    #[test]
    fn terraform_levels_are_mapped() {
        assert_eq!(directives(&[("TF_LOG_PROVIDER", "DEBUG")]), "debug");
        assert_eq!(directives(&[("TF_LOG_PROVIDER", "JSON")]), "trace");
    }

    #[test]
    fn provider_variable_wins_over_rust_log() {
        assert_eq!(
            directives(&[("RUST_LOG", "info"), ("TF_LOG_PROVIDER", "error")]),
            "error"
        );
        assert_eq!(
            directives(&[("RUST_LOG", "terraform_provider_powervs=debug")]),
            "terraform_provider_powervs=debug"
        );
    }
}
