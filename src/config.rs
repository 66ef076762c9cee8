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

//! Provider configuration block and its resolution against the environment

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tf_provider::{map, AttributePath, Diagnostics};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueNumber, ValueString};

use crate::client::{ClientOptions, Credentials};
use crate::utils::{validate_one_of, WithSchema, WithValidate};

pub const DEFAULT_REGION: &str = "us-south";
pub const DEFAULT_TIMEOUT_SECS: i64 = 60;
pub const DEFAULT_MAX_RETRIES: i64 = 10;
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";
pub const VISIBILITIES: &[&str] = &["public", "private", "public-and-private"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub ibmcloud_api_key: ValueString<'a>,
    pub iam_token: ValueString<'a>,
    pub iam_refresh_token: ValueString<'a>,
    pub region: ValueString<'a>,
    pub zone: ValueString<'a>,
    pub ibmcloud_timeout: ValueNumber,
    pub max_retries: ValueNumber,
    pub visibility: ValueString<'a>,
}

impl WithSchema for ProviderConfig<'_> {
    fn schema() -> Schema {
        let string = |description: &str, sensitive: bool| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Optional,
            sensitive,
            ..Default::default()
        };
        let number = |description: &str| Attribute {
            attr_type: AttributeType::Number,
            description: Description::plain(description),
            constraint: AttributeConstraint::Optional,
            ..Default::default()
        };
        Schema {
            version: 1,
            block: Block {
                description: Description::plain("IBM Power Systems Virtual Server provider"),
                attributes: map! {
                    "ibmcloud_api_key" => string("The IBM Cloud API key (env: IC_API_KEY, IBMCLOUD_API_KEY)", true),
                    "iam_token" => string("The IBM Cloud IAM token (env: IC_IAM_TOKEN, IBMCLOUD_IAM_TOKEN)", true),
                    "iam_refresh_token" => string("The IBM Cloud IAM refresh token (env: IC_IAM_REFRESH_TOKEN, IBMCLOUD_IAM_REFRESH_TOKEN)", true),
                    "region" => string("The IBM Cloud region (default: us-south)", false),
                    "zone" => string("The IBM Cloud zone (default: the region)", false),
                    "ibmcloud_timeout" => number("Timeout in seconds of the API requests (default: 60)"),
                    "max_retries" => number("Maximum number of retries of transient API errors (default: 10)"),
                    "visibility" => string("Visibility of the endpoints: public, private or public-and-private (default: public)", false),
                },
                ..Default::default()
            },
        }
    }
}

impl WithValidate for ProviderConfig<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_one_of(
            diags,
            &self.visibility,
            VISIBILITIES,
            attr_path.clone().attribute("visibility"),
        );
        if let Value::Value(timeout) = self.ibmcloud_timeout {
            if timeout <= 0 {
                diags.error(
                    "Invalid timeout",
                    "`ibmcloud_timeout` must be a positive number of seconds.",
                    attr_path.clone().attribute("ibmcloud_timeout"),
                );
            }
        }
        if let Value::Value(retries) = self.max_retries {
            if retries < 0 {
                diags.error(
                    "Invalid retry count",
                    "`max_retries` must not be negative.",
                    attr_path.attribute("max_retries"),
                );
            }
        }
    }
}

/// First non-empty value among the configuration and the environment variables
fn lookup(
    value: &ValueString<'_>,
    vars: &[&str],
    env: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    value
        .as_deref_option()
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .or_else(|| vars.iter().find_map(|var| env(var).filter(|s| !s.is_empty())))
}

fn lookup_number(
    value: &ValueNumber,
    vars: &[&str],
    env: &impl Fn(&str) -> Option<String>,
    default: i64,
) -> Result<i64> {
    if let Value::Value(n) = value {
        return Ok(*n);
    }
    match vars.iter().find_map(|var| env(var).map(|s| (*var, s))) {
        Some((var, s)) => s
            .trim()
            .parse()
            .with_context(|| format!("invalid number in environment variable {var}: `{s}`")),
        None => Ok(default),
    }
}

impl ProviderConfig<'_> {
    /// Resolve every setting: configuration first, then environment, then default
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<ClientOptions> {
        let api_key = lookup(&self.ibmcloud_api_key, &["IC_API_KEY", "IBMCLOUD_API_KEY"], &env);
        let iam_token = lookup(&self.iam_token, &["IC_IAM_TOKEN", "IBMCLOUD_IAM_TOKEN"], &env);
        let refresh_token = lookup(
            &self.iam_refresh_token,
            &["IC_IAM_REFRESH_TOKEN", "IBMCLOUD_IAM_REFRESH_TOKEN"],
            &env,
        );
        let credentials = match (api_key, iam_token) {
            (Some(api_key), _) => Credentials::ApiKey(api_key),
            (None, Some(access_token)) => Credentials::Token {
                access_token,
                refresh_token,
            },
            (None, None) => bail!(
                "either `ibmcloud_api_key` or `iam_token` must be set, in the provider configuration or in the environment"
            ),
        };

        let region = lookup(
            &self.region,
            &["IC_REGION", "IBMCLOUD_REGION", "BM_REGION", "BLUEMIX_REGION"],
            &env,
        )
        .unwrap_or_else(|| DEFAULT_REGION.to_owned());
        let zone = lookup(&self.zone, &["IC_ZONE", "IBMCLOUD_ZONE"], &env)
            .unwrap_or_else(|| region.clone());
        let visibility = lookup(&self.visibility, &["IC_VISIBILITY", "IBMCLOUD_VISIBILITY"], &env)
            .unwrap_or_else(|| "public".to_owned());
        if !VISIBILITIES.contains(&visibility.as_str()) {
            bail!("invalid visibility `{visibility}`");
        }

        let timeout = lookup_number(
            &self.ibmcloud_timeout,
            &["IC_TIMEOUT", "IBMCLOUD_TIMEOUT"],
            &env,
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout <= 0 {
            bail!("the API timeout must be positive, got {timeout}");
        }
        let max_retries = lookup_number(&self.max_retries, &["MAX_RETRIES"], &env, DEFAULT_MAX_RETRIES)?;
        let max_retries =
            u32::try_from(max_retries).with_context(|| format!("invalid max_retries {max_retries}"))?;

        let endpoint = env("IBMCLOUD_PI_API_ENDPOINT")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| pi_endpoint(&region, &visibility));
        let iam_endpoint = env("IBMCLOUD_IAM_API_ENDPOINT")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_IAM_ENDPOINT.to_owned());

        Ok(ClientOptions {
            endpoint,
            iam_endpoint,
            zone,
            credentials,
            timeout: Duration::from_secs(timeout as u64),
            max_retries,
        })
    }
}

fn pi_endpoint(region: &str, visibility: &str) -> String {
    if visibility == "private" {
        format!("https://private.{region}.power-iaas.cloud.ibm.com")
    } else {
        format!("https://{region}.power-iaas.cloud.ibm.com")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ProviderConfig {
            ibmcloud_api_key: Value::from("key"),
            ..Default::default()
        };
        let options = config.resolve(env(&[])).unwrap();
        assert_eq!(options.credentials, Credentials::ApiKey("key".into()));
        assert_eq!(options.zone, "us-south");
        assert_eq!(options.endpoint, "https://us-south.power-iaas.cloud.ibm.com");
        assert_eq!(options.iam_endpoint, DEFAULT_IAM_ENDPOINT);
        assert_eq!(options.timeout, Duration::from_secs(60));
        assert_eq!(options.max_retries, 10);
    }

    #[test]
    fn environment_fallbacks() {
        let config = ProviderConfig {
            region: Value::from("dal"),
            ..Default::default()
        };
        let options = config
            .resolve(env(&[
                ("IBMCLOUD_API_KEY", "env-key"),
                ("IC_REGION", "ignored"),
                ("IC_ZONE", "dal12"),
                ("IC_VISIBILITY", "private"),
                ("IBMCLOUD_TIMEOUT", "120"),
                ("MAX_RETRIES", "3"),
            ]))
            .unwrap();
        assert_eq!(options.credentials, Credentials::ApiKey("env-key".into()));
        assert_eq!(options.zone, "dal12");
        assert_eq!(options.endpoint, "https://private.dal.power-iaas.cloud.ibm.com");
        assert_eq!(options.timeout, Duration::from_secs(120));
        assert_eq!(options.max_retries, 3);
    }

    #[test]
    fn endpoint_overrides() {
        let config = ProviderConfig {
            iam_token: Value::from("token"),
            iam_refresh_token: Value::from("refresh"),
            ..Default::default()
        };
        let options = config
            .resolve(env(&[
                ("IBMCLOUD_PI_API_ENDPOINT", "http://localhost:8080"),
                ("IBMCLOUD_IAM_API_ENDPOINT", "http://localhost:8081"),
            ]))
            .unwrap();
        assert_eq!(options.endpoint, "http://localhost:8080");
        assert_eq!(options.iam_endpoint, "http://localhost:8081");
        assert_eq!(
            options.credentials,
            Credentials::Token {
                access_token: "token".into(),
                refresh_token: Some("refresh".into()),
            }
        );
    }

    #[test]
    fn missing_credentials() {
        let err = ProviderConfig::default().resolve(env(&[])).unwrap_err();
        assert!(err.to_string().contains("ibmcloud_api_key"));
    }

    #[test]
    fn invalid_values() {
        let config = ProviderConfig {
            visibility: Value::from("internal"),
            ibmcloud_timeout: Value::Value(0),
            max_retries: Value::Value(-1),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        config.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 3);
    }
}
