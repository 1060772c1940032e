//! Course roster API.

use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, ResourceKind};
use crate::error::Result;
use crate::types::Person;
use crate::wire::{StudentsPage, TeachersPage};

/// Roster API client.
pub struct RosterApi {
    client: ClassroomClient,
}

impl RosterApi {
    pub(crate) fn new(client: ClassroomClient) -> Self {
        Self { client }
    }

    /// List the students enrolled in a course.
    pub async fn students(
        &self,
        course_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Person>> {
        self.client
            .cached_list::<StudentsPage, Person>(
                ResourceKind::Roster,
                &format!("courses/{}/students", course_id),
                &[course_id, "students"],
                cancel,
            )
            .await
    }

    /// List the teachers of a course.
    pub async fn teachers(
        &self,
        course_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Person>> {
        self.client
            .cached_list::<TeachersPage, Person>(
                ResourceKind::Roster,
                &format!("courses/{}/teachers", course_id),
                &[course_id, "teachers"],
                cancel,
            )
            .await
    }
}
