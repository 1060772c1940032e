//! Coursework API.

use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, ResourceKind};
use crate::error::Result;
use crate::types::CourseWork;
use crate::wire::{CourseWorkPage, WireCourseWork};

/// Coursework API client.
pub struct CourseWorkApi {
    client: ClassroomClient,
}

impl CourseWorkApi {
    pub(crate) fn new(client: ClassroomClient) -> Self {
        Self { client }
    }

    /// List all coursework in a course.
    pub async fn list(
        &self,
        course_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CourseWork>> {
        self.client
            .cached_list::<CourseWorkPage, CourseWork>(
                ResourceKind::CourseWork,
                &format!("courses/{}/courseWork", course_id),
                &[course_id],
                cancel,
            )
            .await
    }

    /// Get one piece of coursework.
    pub async fn get(
        &self,
        course_id: &str,
        course_work_id: &str,
        cancel: &CancellationToken,
    ) -> Result<CourseWork> {
        self.client
            .cached_get::<WireCourseWork, CourseWork>(
                ResourceKind::CourseWork,
                &format!("courses/{}/courseWork/{}", course_id, course_work_id),
                &[course_id, course_work_id],
                cancel,
            )
            .await
    }
}
