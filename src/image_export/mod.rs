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

//! `ibm_pi_image_export` resource and `ibm_pi_job` data source
//!
//! An export copies an image into a COS bucket through an asynchronous job.
//! The exported object is owned by COS: reading and deleting the resource
//! only touch the Terraform state.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{map, value, AttributePath, Diagnostics, Resource};
use tf_provider::schema::{AttributeConstraint, AttributeType, Block, Description, Schema};
use tf_provider::value::{Value, ValueEmpty, ValueString};
use tracing::info;

use crate::client::models::{ExportImage, Job};
use crate::client::JobClient;
use crate::powervs_provider::ProviderHandle;
use crate::state_change::StateChangeConf;
use crate::timeouts::{DefaultTimeouts, Timeouts, TimeoutsExt};
use crate::utils::{
    attribute, changed, join_id, sensitive_attribute, value_string, WithSchema, WithValidate,
};

mod data_source;

pub use data_source::{JobDataSource, JobDataState};

pub const EXPORT_TIMEOUTS: DefaultTimeouts = DefaultTimeouts::all(Duration::from_secs(60 * 60));

const JOB_PENDING: &[&str] = &["queued", "readyForProcessing", "inProgress", "running", "waiting"];
const JOB_COMPLETED: &str = "completed";
const JOB_FAILED: &str = "failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImageExportState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub pi_cloud_instance_id: ValueString<'a>,
    pub pi_image_id: ValueString<'a>,
    pub pi_image_bucket_name: ValueString<'a>,
    pub pi_image_bucket_region: ValueString<'a>,
    pub pi_image_access_key: ValueString<'a>,
    pub pi_image_secret_key: ValueString<'a>,

    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

impl WithSchema for ImageExportState<'_> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Required};
        use AttributeType::String;
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => attribute(String, Computed, "`<cloud_instance_id>/<image_id>/<bucket_name>`"),
                    "pi_cloud_instance_id" => attribute(String, Required, "ID of the PowerVS workspace"),
                    "pi_image_id" => attribute(String, Required, "ID of the image to export"),
                    "pi_image_bucket_name" => attribute(String, Required, "Name of the COS bucket receiving the image"),
                    "pi_image_bucket_region" => attribute(String, Required, "Region of the COS bucket"),
                    "pi_image_access_key" => sensitive_attribute(String, Required, "HMAC access key of the COS bucket"),
                    "pi_image_secret_key" => sensitive_attribute(String, Required, "HMAC secret key of the COS bucket"),
                },
                blocks: map! {
                    "timeouts" => EXPORT_TIMEOUTS.block(),
                },
                description: Description::plain("Export an IBM PowerVS image to a COS bucket"),
                ..Default::default()
            },
        }
    }
}

impl WithValidate for ImageExportState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(timeouts) = &self.timeouts {
            timeouts.validate(diags, attr_path.attribute("timeouts"));
        }
    }
}

/// State of a job as seen by the poller
///
/// A failed job is an error carrying its message.
fn job_state(job: &Job) -> Result<String> {
    if job.status.state == JOB_FAILED {
        return Err(anyhow!("job {} failed: {}", job.id, job.status.message));
    }
    Ok(job.status.state.clone())
}

/// Wait until the job completes
pub async fn wait_job_completed(jobs: &JobClient, job_id: &str, timeout: Duration) -> Result<Job> {
    info!(job_id, "waiting for the job to complete");
    StateChangeConf::new(JOB_PENDING, &[JOB_COMPLETED], timeout)
        .delay(Duration::from_secs(10))
        .min_timeout(Duration::from_secs(10))
        .wait_for_state(|| async move {
            let job = jobs.get(job_id).await?;
            let state = job_state(&job)?;
            Ok::<_, anyhow::Error>((Some(job), state))
        })
        .await?
        .ok_or_else(|| anyhow!("job {job_id} disappeared"))
}

#[derive(Debug, Default, Clone)]
pub struct ImageExportResource {
    handle: ProviderHandle,
}

impl ImageExportResource {
    pub fn new(handle: ProviderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl Resource for ImageExportResource {
    type State<'a> = ImageExportState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ImageExportState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default());
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        _diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        Some((state, private_state))
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.id = Value::Unknown;
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let trigger_replace = changed([
            (
                "pi_cloud_instance_id",
                prior_state.pi_cloud_instance_id != proposed_state.pi_cloud_instance_id,
            ),
            ("pi_image_id", prior_state.pi_image_id != proposed_state.pi_image_id),
            (
                "pi_image_bucket_name",
                prior_state.pi_image_bucket_name != proposed_state.pi_image_bucket_name,
            ),
            (
                "pi_image_bucket_region",
                prior_state.pi_image_bucket_region != proposed_state.pi_image_bucket_region,
            ),
            (
                "pi_image_access_key",
                prior_state.pi_image_access_key != proposed_state.pi_image_access_key,
            ),
            (
                "pi_image_secret_key",
                prior_state.pi_image_secret_key != proposed_state.pi_image_secret_key,
            ),
        ]);
        Some((proposed_state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.handle.client(diags).await?;
        let mut state = planned_state;
        let cloud_instance_id = state.pi_cloud_instance_id.as_str().to_owned();
        let image_id = state.pi_image_id.as_str().to_owned();
        let bucket = state.pi_image_bucket_name.as_str().to_owned();
        info!(
            cloud_instance_id = %cloud_instance_id,
            image_id = %image_id,
            bucket = %bucket,
            "creating ibm_pi_image_export"
        );

        let body = ExportImage {
            bucket_name: bucket.clone(),
            region: state.pi_image_bucket_region.as_str().to_owned(),
            access_key: state.pi_image_access_key.as_str().to_owned(),
            secret_key: state.pi_image_secret_key.as_deref_option().map(str::to_owned),
        };
        let job = match client.images(&cloud_instance_id).export(&image_id, &body).await {
            Ok(job) => job,
            Err(err) => {
                diags.root_error("Failed to export the image", err.to_string());
                return None;
            }
        };

        let timeout = state.timeouts.create_or(&EXPORT_TIMEOUTS);
        if let Err(err) = wait_job_completed(&client.jobs(&cloud_instance_id), &job.id, timeout).await {
            diags.root_error("Failed to export the image", format!("{err:#}"));
            return None;
        }

        state.id = value_string(join_id([&cloud_instance_id, &image_id, &bucket]));
        Some((state, planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // Only the timeouts can change in place
        Some((planned_state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use crate::client::models::JobStatus;

    use super::*;

    fn job(state: &str, message: &str) -> Job {
        Job {
            id: "job".into(),
            status: JobStatus {
                state: state.into(),
                message: message.into(),
                progress: String::new(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn failed_job_reports_message() {
        assert_eq!(job_state(&job("running", "")).unwrap(), "running");
        let err = job_state(&job(JOB_FAILED, "bucket not found")).unwrap_err();
        assert!(err.to_string().contains("bucket not found"));
    }

    #[tokio::test]
    async fn every_argument_forces_replacement() {
        let prior = ImageExportState {
            id: "cloud/image/bucket".into(),
            pi_cloud_instance_id: "cloud".into(),
            pi_image_id: "image".into(),
            pi_image_bucket_name: "bucket".into(),
            pi_image_bucket_region: "us-east".into(),
            pi_image_access_key: "access".into(),
            pi_image_secret_key: "secret".into(),
            ..Default::default()
        };
        let proposed = ImageExportState {
            pi_image_bucket_region: "eu-de".into(),
            pi_image_secret_key: "rotated".into(),
            ..prior.clone()
        };
        let mut diags = Diagnostics::default();
        let (_, _, replace) = ImageExportResource::default()
            .plan_update(
                &mut diags,
                prior,
                proposed.clone(),
                proposed,
                ValueEmpty::default(),
                ValueEmpty::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            replace,
            vec![
                AttributePath::new("pi_image_bucket_region"),
                AttributePath::new("pi_image_secret_key"),
            ]
        );
    }
}
