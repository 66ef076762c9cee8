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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{map, AttributePath, DataSource, Diagnostics};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{ValueEmpty, ValueString};
use tracing::info;

use crate::client::models::Job;
use crate::powervs_provider::ProviderHandle;
use crate::utils::{attribute, value_opt_string, value_string, WithSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_job_id: ValueString<'a>,
    pub operation_action: ValueString<'a>,
    pub operation_id: ValueString<'a>,
    pub operation_target: ValueString<'a>,
    pub progress: ValueString<'a>,
    pub status: ValueString<'a>,
    pub status_message: ValueString<'a>,
    pub start_time: ValueString<'a>,
}

impl WithSchema for JobDataState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::String;
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "ID of the job"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_job_id" => attribute(String, Required, "ID of the job"),
                    "operation_action" => attribute(String, Computed, "Action performed by the job"),
                    "operation_id" => attribute(String, Computed, "ID of the object the job works on"),
                    "operation_target" => attribute(String, Computed, "Kind of object the job works on"),
                    "progress" => attribute(String, Computed, "Progress of the job"),
                    "status" => attribute(String, Computed, "State of the job"),
                    "status_message" => attribute(String, Computed, "Message of the job status"),
                    "start_time" => attribute(String, Computed, "Creation time of the job"),
                },
                description: Description::plain("Look up an IBM PowerVS job"),
                ..Default::default()
            },
        }
    }
}

impl JobDataState<'_> {
    fn fill(&mut self, job: &Job) {
        self.id = value_string(job.id.as_str());
        self.operation_action = value_string(job.operation.action.as_str());
        self.operation_id = value_string(job.operation.id.as_str());
        self.operation_target = value_string(job.operation.target.as_str());
        self.progress = value_string(job.status.progress.as_str());
        self.status = value_string(job.status.state.as_str());
        self.status_message = value_opt_string(Some(job.status.message.clone()));
        self.start_time = value_opt_string(Some(job.creation_timestamp.clone()));
    }
}

#[derive(Debug, Default, Clone)]
pub struct JobDataSource {
    handle: ProviderHandle,
}

impl JobDataSource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl DataSource for JobDataSource {
    type State<'a> = JobDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(JobDataState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.handle.client(diags).await?;
        let cloud_instance_id = config.pi_cloud_instance_id.as_str().to_owned();
        let job_id = config.pi_job_id.as_str().to_owned();
        info!(cloud_instance_id = %cloud_instance_id, job_id = %job_id, "reading data.ibm_pi_job");

        match client.jobs(&cloud_instance_id).get(&job_id).await {
            Ok(job) => {
                let mut state = config;
                state.fill(&job);
                Some(state)
            }
            Err(err) => {
                diags.error(
                    "Failed to read the job",
                    err.to_string(),
                    AttributePath::new("pi_job_id"),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fill_outputs_from_api_job() {
        let job: Job = serde_json::from_value(json!({
            "id": "job-1",
            "operation": {"action": "imageExport", "id": "image-1", "target": "image"},
            "status": {"state": "running", "progress": "40%"},
            "creationTimestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        let mut state = JobDataState::default();
        state.fill(&job);
        assert_eq!(state.id.as_str(), "job-1");
        assert_eq!(state.operation_action.as_str(), "imageExport");
        assert_eq!(state.operation_target.as_str(), "image");
        assert_eq!(state.progress.as_str(), "40%");
        assert_eq!(state.status.as_str(), "running");
        assert!(state.status_message.is_null());
        assert_eq!(state.start_time.as_str(), "2024-05-01T10:00:00Z");
    }
}
