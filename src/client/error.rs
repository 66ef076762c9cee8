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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("PowerVS API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("IAM authentication failed: {0}")]
    Auth(String),

    #[error("invalid id `{id}`: expected {expected} parts separated by `/`")]
    InvalidId { id: String, expected: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Build the error matching a non-success response
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        if status == 404 || message.to_lowercase().contains("not found") {
            ClientError::NotFound(message)
        } else {
            ClientError::Api { status, message }
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

fn extract_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_owned();
    };
    ["description", "message", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(|v| v.as_str()))
        .map(str::to_owned)
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_from_status() {
        let err = ClientError::from_response(404, r#"{"description":"pvm-instance does not exist"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "resource not found: pvm-instance does not exist");
    }

    #[test]
    fn not_found_from_message() {
        let err = ClientError::from_response(400, r#"{"error":"virtual serial number not found"}"#);
        assert!(err.is_not_found());
    }

    #[test]
    fn api_error_keeps_status() {
        let err = ClientError::from_response(409, r#"{"description":"server is not part of placement-group"}"#);
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "server is not part of placement-group");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn raw_body_is_kept() {
        let err = ClientError::from_response(500, "internal failure\n");
        assert_eq!(err.to_string(), "PowerVS API error (500): internal failure");
    }
}
