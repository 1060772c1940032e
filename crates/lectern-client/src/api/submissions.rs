//! Student submissions API.

use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, ResourceKind};
use crate::error::Result;
use crate::types::Submission;
use crate::wire::{SubmissionsPage, WireSubmission};

/// Student submissions API client.
pub struct SubmissionsApi {
    client: ClassroomClient,
}

impl SubmissionsApi {
    pub(crate) fn new(client: ClassroomClient) -> Self {
        Self { client }
    }

    /// List the signed-in user's submissions for one piece of coursework.
    pub async fn list(
        &self,
        course_id: &str,
        course_work_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Submission>> {
        self.client
            .cached_list::<SubmissionsPage, Submission>(
                ResourceKind::Submissions,
                &format!(
                    "courses/{}/courseWork/{}/studentSubmissions",
                    course_id, course_work_id
                ),
                &[course_id, course_work_id],
                cancel,
            )
            .await
    }

    /// Get one submission.
    pub async fn get(
        &self,
        course_id: &str,
        course_work_id: &str,
        submission_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Submission> {
        self.client
            .cached_get::<WireSubmission, Submission>(
                ResourceKind::Submissions,
                &format!(
                    "courses/{}/courseWork/{}/studentSubmissions/{}",
                    course_id, course_work_id, submission_id
                ),
                &[course_id, course_work_id, submission_id],
                cancel,
            )
            .await
    }

    /// Turn a submission in for grading. Never cached; the cached
    /// submission list for the coursework is invalidated so the next read
    /// reflects the new state.
    pub async fn turn_in(
        &self,
        course_id: &str,
        course_work_id: &str,
        submission_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.client
            .mutate(
                &format!(
                    "courses/{}/courseWork/{}/studentSubmissions/{}:turnIn",
                    course_id, course_work_id, submission_id
                ),
                cancel,
            )
            .await?;

        self.client
            .cache_invalidate(ResourceKind::Submissions, &[course_id, course_work_id])
            .await?;
        self.client
            .cache_invalidate(
                ResourceKind::Submissions,
                &[course_id, course_work_id, submission_id],
            )
            .await
    }
}
