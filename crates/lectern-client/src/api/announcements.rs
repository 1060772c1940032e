//! Announcements API.
//!
//! Announcements are their own resource kind with their own endpoint and
//! TTL; the remote keeps them off the coursework endpoint.

use tokio_util::sync::CancellationToken;

use crate::client::{ClassroomClient, ResourceKind};
use crate::error::Result;
use crate::types::Announcement;
use crate::wire::AnnouncementsPage;

/// Announcements API client.
pub struct AnnouncementsApi {
    client: ClassroomClient,
}

impl AnnouncementsApi {
    pub(crate) fn new(client: ClassroomClient) -> Self {
        Self { client }
    }

    /// List all announcements in a course.
    pub async fn list(
        &self,
        course_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Announcement>> {
        self.client
            .cached_list::<AnnouncementsPage, Announcement>(
                ResourceKind::Announcements,
                &format!("courses/{}/announcements", course_id),
                &[course_id],
                cancel,
            )
            .await
    }
}
