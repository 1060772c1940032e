//! Courses API.

use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, ResourceKind};
use crate::error::Result;
use crate::types::Course;
use crate::wire::{CoursesPage, WireCourse};

/// Courses API client.
pub struct CoursesApi {
    client: ClassroomClient,
}

impl CoursesApi {
    pub(crate) fn new(client: ClassroomClient) -> Self {
        Self { client }
    }

    /// List every course the signed-in user can see.
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<Course>> {
        self.client
            .cached_list::<CoursesPage, Course>(ResourceKind::Courses, "courses", &[], cancel)
            .await
    }

    /// Get one course by id.
    pub async fn get(&self, course_id: &str, cancel: &CancellationToken) -> Result<Course> {
        self.client
            .cached_get::<WireCourse, Course>(
                ResourceKind::Courses,
                &format!("courses/{}", course_id),
                &[course_id],
                cancel,
            )
            .await
    }
}
