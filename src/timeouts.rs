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

//! `timeouts` block shared by long running resources

use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tf_provider::{map, AttributePath, Diagnostics};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock,
};
use tf_provider::value::{Value, ValueString};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Timeouts<'a> {
    #[serde(borrow = "'a")]
    pub create: ValueString<'a>,
    pub update: ValueString<'a>,
    pub delete: ValueString<'a>,
}

/// Default durations of a resource
#[derive(Debug, Clone, Copy)]
pub struct DefaultTimeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl DefaultTimeouts {
    pub const fn all(d: Duration) -> Self {
        Self {
            create: d,
            update: d,
            delete: d,
        }
    }

    pub fn block(&self) -> NestedBlock {
        let attr = |name: &str, d: Duration| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(format!(
                "Timeout of the {name} operation (default: {})",
                format_duration(d)
            )),
            constraint: AttributeConstraint::Optional,
            ..Default::default()
        };
        NestedBlock::Optional(Block {
            attributes: map! {
                "create" => attr("create", self.create),
                "update" => attr("update", self.update),
                "delete" => attr("delete", self.delete),
            },
            description: Description::plain("Operation timeouts"),
            ..Default::default()
        })
    }
}

impl<'a> Timeouts<'a> {
    pub fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        for (name, value) in [
            ("create", &self.create),
            ("update", &self.update),
            ("delete", &self.delete),
        ] {
            if let Value::Value(s) = value {
                if let Err(err) = parse_duration(s) {
                    diags.error(
                        "Invalid timeout",
                        err.to_string(),
                        attr_path.clone().attribute(name),
                    );
                }
            }
        }
    }
}

pub trait TimeoutsExt {
    fn create_or(&self, default: &DefaultTimeouts) -> Duration;
    fn update_or(&self, default: &DefaultTimeouts) -> Duration;
    fn delete_or(&self, default: &DefaultTimeouts) -> Duration;
}

impl TimeoutsExt for Value<Timeouts<'_>> {
    fn create_or(&self, default: &DefaultTimeouts) -> Duration {
        pick(self.as_ref_option().map(|t| &t.create), default.create)
    }
    fn update_or(&self, default: &DefaultTimeouts) -> Duration {
        pick(self.as_ref_option().map(|t| &t.update), default.update)
    }
    fn delete_or(&self, default: &DefaultTimeouts) -> Duration {
        pick(self.as_ref_option().map(|t| &t.delete), default.delete)
    }
}

fn pick(value: Option<&ValueString<'_>>, default: Duration) -> Duration {
    value
        .and_then(|v| v.as_deref_option())
        .and_then(|s| parse_duration(s).ok())
        .unwrap_or(default)
}

/// Parse a duration such as `90s`, `45m` or `1h30m`
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty duration");
    }
    let mut total = 0u64;
    let mut digits = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let factor = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => bail!("invalid unit `{c}` in duration `{s}`"),
        };
        if digits.is_empty() {
            bail!("missing value before `{c}` in duration `{s}`");
        }
        let n: u64 = digits
            .parse()
            .map_err(|err| anyhow!("invalid duration `{s}`: {err}"))?;
        total += n * factor;
        digits.clear();
    }
    if !digits.is_empty() {
        bail!("missing unit in duration `{s}`");
    }
    Ok(Duration::from_secs(total))
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, s) => format!("{s}s"),
        (0, m, 0) => format!("{m}m"),
        (h, 0, 0) => format!("{h}h"),
        (h, m, 0) => format!("{h}h{m}m"),
        (h, m, s) => format!("{h}h{m}m{s}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("45m").unwrap(), Duration::from_secs(45 * 60));
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::from_secs(90 * 60)
        );
        assert_eq!(
            parse_duration("2h0m5s").unwrap(),
            Duration::from_secs(7205)
        );
    }

    #[test]
    fn parse_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("10d").is_err());
    }

    #[test]
    fn format() {
        assert_eq!(format_duration(Duration::from_secs(45 * 60)), "45m");
        assert_eq!(format_duration(Duration::from_secs(2 * 3600)), "2h");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(5400)), "1h30m");
    }

    #[test]
    fn fallback_to_defaults() {
        let defaults = DefaultTimeouts {
            create: Duration::from_secs(120 * 60),
            update: Duration::from_secs(60 * 60),
            delete: Duration::from_secs(60 * 60),
        };
        let timeouts: Value<Timeouts> = Value::Value(Timeouts {
            create: Value::from("10m"),
            update: Value::from("garbage"),
            delete: Value::Null,
        });
        assert_eq!(timeouts.create_or(&defaults), Duration::from_secs(600));
        assert_eq!(timeouts.update_or(&defaults), defaults.update);
        assert_eq!(timeouts.delete_or(&defaults), defaults.delete);

        let none: Value<Timeouts> = Value::Null;
        assert_eq!(none.create_or(&defaults), defaults.create);
    }
}
