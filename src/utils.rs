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

use std::borrow::Cow;
use std::collections::BTreeSet;

use tf_provider::{AttributePath, Diagnostics};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType, Description, Schema};
use tf_provider::value::{Value, ValueList, ValueSet, ValueString};

use crate::client::ClientError;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

pub(crate) trait WithValidate {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn sensitive_attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        sensitive: true,
        ..attribute(attr_type, constraint, description)
    }
}

/// Split a composite resource id of the form `a/b[/c...]`
///
/// Every part must be non-empty and the number of parts must be exactly `n`.
pub fn split_id(id: &str, n: usize) -> Result<Vec<&str>, ClientError> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() != n || parts.iter().any(|p| p.is_empty()) {
        return Err(ClientError::InvalidId {
            id: id.to_owned(),
            expected: n,
        });
    }
    Ok(parts)
}

pub fn join_id<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|s| s.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn value_string<'a, S: Into<String>>(s: S) -> ValueString<'a> {
    Value::Value(Cow::Owned(s.into()))
}

/// Empty strings are reported as null
pub(crate) fn value_opt_string<'a>(s: Option<String>) -> ValueString<'a> {
    match s {
        Some(s) if !s.is_empty() => value_string(s),
        _ => Value::Null,
    }
}

pub(crate) fn value_string_list<'a, I, S>(items: I) -> ValueList<ValueString<'a>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Value(items.into_iter().map(value_string).collect())
}

pub(crate) fn value_string_set<'a, I, S>(items: I) -> ValueSet<ValueString<'a>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Value(items.into_iter().map(value_string).collect::<BTreeSet<_>>())
}

pub(crate) fn string_list(values: &ValueList<ValueString<'_>>) -> Vec<String> {
    values
        .iter()
        .flatten()
        .filter_map(|v| v.as_deref_option().map(str::to_owned))
        .collect()
}

pub(crate) fn string_set(values: &ValueSet<ValueString<'_>>) -> Vec<String> {
    values
        .iter()
        .flatten()
        .filter_map(|v| v.as_deref_option().map(str::to_owned))
        .collect()
}

/// Non-empty string content of a value
pub(crate) fn non_empty<'b>(value: &'b ValueString<'_>) -> Option<&'b str> {
    value.as_deref_option().filter(|s| !s.is_empty())
}

/// Store a value reported by the API
///
/// Outside of `overwrite` mode, only unknown values are filled so that the
/// planned values stay untouched.
pub(crate) fn set_value<T>(field: &mut Value<T>, value: Value<T>, overwrite: bool) {
    if overwrite || field.is_unknown() {
        *field = value;
    }
}

/// Fill a value left null by the practitioner with its default
pub(crate) fn default_if_null<T>(value: &mut Value<T>, default: T) {
    if value.is_null() {
        *value = Value::Value(default);
    }
}

/// Mark a value unknown if it has not been set by the practitioner
pub(crate) fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

pub(crate) fn validate_one_of(
    diags: &mut Diagnostics,
    value: &ValueString<'_>,
    allowed: &[&str],
    attr_path: AttributePath,
) {
    if let Value::Value(v) = value {
        if !allowed.contains(&v.as_ref()) {
            diags.error(
                "Invalid value",
                format!("Expected one of [{}], got `{v}`.", allowed.join(", ")),
                attr_path,
            );
        }
    }
}

/// Error if both attributes are given
pub(crate) fn validate_conflict<A, B>(
    diags: &mut Diagnostics,
    a: (&str, &Value<A>),
    b: (&str, &Value<B>),
    attr_path: AttributePath,
) {
    if !a.1.is_null() && !b.1.is_null() {
        diags.error(
            "Conflicting attributes",
            format!("`{}` conflicts with `{}`.", a.0, b.0),
            attr_path.attribute(a.0.to_owned()),
        );
    }
}

/// Attributes whose value changed between two states, among the given candidates
pub(crate) fn changed<'p>(
    candidates: impl IntoIterator<Item = (&'p str, bool)>,
) -> Vec<AttributePath> {
    candidates
        .into_iter()
        .filter(|(_, differs)| *differs)
        .map(|(name, _)| AttributePath::new(name.to_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_id_accepts_exact_parts() {
        let parts = split_id("cloud/pvm", 2).unwrap();
        assert_eq!(parts, vec!["cloud", "pvm"]);

        let parts = split_id("cloud/nsg/rule", 3).unwrap();
        assert_eq!(parts, vec!["cloud", "nsg", "rule"]);
    }

    #[test]
    fn split_id_rejects_wrong_shape() {
        assert!(split_id("cloud", 2).is_err());
        assert!(split_id("cloud/pvm/extra", 2).is_err());
        assert!(split_id("cloud/", 2).is_err());
        assert!(split_id("/pvm", 2).is_err());
    }

    #[test]
    fn join_id_uses_slash() {
        assert_eq!(join_id(["a", "b", "c"]), "a/b/c");
    }

    #[test]
    fn opt_string_maps_empty_to_null() {
        assert!(value_opt_string(Some(String::new())).is_null());
        assert!(value_opt_string(None).is_null());
        assert_eq!(value_opt_string(Some("x".into())).as_str(), "x");
    }

    #[test]
    fn one_of_reports_invalid_values() {
        let mut diags = Diagnostics::default();
        validate_one_of(
            &mut diags,
            &Value::from("tcp"),
            &["all", "icmp", "tcp", "udp"],
            AttributePath::new("type"),
        );
        assert!(diags.errors.is_empty());

        validate_one_of(
            &mut diags,
            &Value::from("sctp"),
            &["all", "icmp", "tcp", "udp"],
            AttributePath::new("type"),
        );
        assert_eq!(diags.errors.len(), 1);
    }

    #[test]
    fn set_value_keeps_planned_values() {
        let mut planned: ValueString = Value::from("planned");
        set_value(&mut planned, Value::from("api"), false);
        assert_eq!(planned.as_str(), "planned");
        set_value(&mut planned, Value::from("api"), true);
        assert_eq!(planned.as_str(), "api");

        let mut unknown: ValueString = Value::Unknown;
        set_value(&mut unknown, Value::Null, false);
        assert!(unknown.is_null());
    }

    #[test]
    fn conflicts_need_both_values() {
        let mut diags = Diagnostics::default();
        let a: ValueString = Value::from("vol");
        let b: ValueString = Value::Null;
        validate_conflict(&mut diags, ("a", &a), ("b", &b), AttributePath::default());
        assert!(diags.errors.is_empty());

        let b: ValueString = Value::from("pvm");
        validate_conflict(&mut diags, ("a", &a), ("b", &b), AttributePath::default());
        assert_eq!(diags.errors.len(), 1);
    }
}
