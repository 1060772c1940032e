//! Remote schema payloads and their conversion into domain records.
//!
//! Conversion is an explicit field-by-field mapping per resource kind.
//! A record missing its identifying fields is a typed [`ApiError::Decode`]
//! failure, never a panic; cosmetic fields default to empty like the
//! remote's own sparse responses.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::types::{Announcement, Course, CourseWork, Person, Submission};

/// One page of a collection response.
pub(crate) trait Page: DeserializeOwned {
    type Item;

    /// Split into the page's items and the continuation token, `None` when
    /// the remote reports no further pages.
    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

fn token(next_page_token: String) -> Option<String> {
    if next_page_token.is_empty() {
        None
    } else {
        Some(next_page_token)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Courses
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCourse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub description_heading: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub enrollment_code: String,
    #[serde(default)]
    pub course_state: String,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub update_time: String,
}

impl TryFrom<WireCourse> for Course {
    type Error = ApiError;

    fn try_from(wire: WireCourse) -> Result<Self, Self::Error> {
        if wire.id.is_empty() {
            return Err(ApiError::Decode("course is missing 'id'".to_string()));
        }
        Ok(Course {
            id: wire.id,
            name: wire.name,
            section: wire.section,
            description_heading: wire.description_heading,
            room: wire.room,
            owner_id: wire.owner_id,
            enrollment_code: wire.enrollment_code,
            course_state: wire.course_state,
            creation_time: wire.creation_time,
            update_time: wire.update_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CoursesPage {
    #[serde(default)]
    pub courses: Vec<WireCourse>,
    #[serde(default)]
    pub next_page_token: String,
}

impl Page for CoursesPage {
    type Item = WireCourse;

    fn into_parts(self) -> (Vec<WireCourse>, Option<String>) {
        (self.courses, token(self.next_page_token))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Coursework
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireDate {
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
}

impl WireDate {
    fn format(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireTimeOfDay {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
}

impl WireTimeOfDay {
    fn format(&self) -> String {
        format!("{:02}:{:02}", self.hours, self.minutes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCourseWork {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub work_type: String,
    #[serde(default)]
    pub state: String,
    pub due_date: Option<WireDate>,
    pub due_time: Option<WireTimeOfDay>,
    pub max_points: Option<f64>,
    #[serde(default)]
    pub creator_user_id: String,
    #[serde(default)]
    pub update_time: String,
}

impl TryFrom<WireCourseWork> for CourseWork {
    type Error = ApiError;

    fn try_from(wire: WireCourseWork) -> Result<Self, Self::Error> {
        if wire.id.is_empty() {
            return Err(ApiError::Decode("coursework is missing 'id'".to_string()));
        }
        Ok(CourseWork {
            id: wire.id,
            course_id: wire.course_id,
            title: wire.title,
            description: wire.description,
            work_type: wire.work_type,
            state: wire.state,
            due_date: wire.due_date.map(|d| d.format()),
            due_time: wire.due_time.map(|t| t.format()),
            max_points: wire.max_points,
            creator_user_id: wire.creator_user_id,
            update_time: wire.update_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseWorkPage {
    #[serde(default)]
    pub course_work: Vec<WireCourseWork>,
    #[serde(default)]
    pub next_page_token: String,
}

impl Page for CourseWorkPage {
    type Item = WireCourseWork;

    fn into_parts(self) -> (Vec<WireCourseWork>, Option<String>) {
        (self.course_work, token(self.next_page_token))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Submissions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireSubmission {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub course_work_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub state: String,
    pub assigned_grade: Option<f64>,
    pub draft_grade: Option<f64>,
    #[serde(default)]
    pub late: bool,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub update_time: String,
}

impl TryFrom<WireSubmission> for Submission {
    type Error = ApiError;

    fn try_from(wire: WireSubmission) -> Result<Self, Self::Error> {
        if wire.id.is_empty() {
            return Err(ApiError::Decode("submission is missing 'id'".to_string()));
        }
        Ok(Submission {
            id: wire.id,
            course_id: wire.course_id,
            course_work_id: wire.course_work_id,
            user_id: wire.user_id,
            state: wire.state,
            assigned_grade: wire.assigned_grade,
            draft_grade: wire.draft_grade,
            late: wire.late,
            creation_time: wire.creation_time,
            update_time: wire.update_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionsPage {
    #[serde(default)]
    pub student_submissions: Vec<WireSubmission>,
    #[serde(default)]
    pub next_page_token: String,
}

impl Page for SubmissionsPage {
    type Item = WireSubmission;

    fn into_parts(self) -> (Vec<WireSubmission>, Option<String>) {
        (self.student_submissions, token(self.next_page_token))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Announcements
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireAnnouncement {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub creator_user_id: String,
    #[serde(default)]
    pub creation_time: String,
    #[serde(default)]
    pub update_time: String,
}

impl TryFrom<WireAnnouncement> for Announcement {
    type Error = ApiError;

    fn try_from(wire: WireAnnouncement) -> Result<Self, Self::Error> {
        if wire.id.is_empty() {
            return Err(ApiError::Decode("announcement is missing 'id'".to_string()));
        }
        Ok(Announcement {
            id: wire.id,
            course_id: wire.course_id,
            text: wire.text,
            state: wire.state,
            creator_user_id: wire.creator_user_id,
            creation_time: wire.creation_time,
            update_time: wire.update_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnnouncementsPage {
    #[serde(default)]
    pub announcements: Vec<WireAnnouncement>,
    #[serde(default)]
    pub next_page_token: String,
}

impl Page for AnnouncementsPage {
    type Item = WireAnnouncement;

    fn into_parts(self) -> (Vec<WireAnnouncement>, Option<String>) {
        (self.announcements, token(self.next_page_token))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rosters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProfile {
    #[serde(default)]
    pub name: WireName,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub photo_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireName {
    #[serde(default)]
    pub full_name: String,
}

/// Students and teachers share one wire shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRosterMember {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub course_id: String,
    /// Absent when the caller lacks the profile scopes.
    pub profile: Option<WireProfile>,
}

impl TryFrom<WireRosterMember> for Person {
    type Error = ApiError;

    fn try_from(wire: WireRosterMember) -> Result<Self, Self::Error> {
        if wire.user_id.is_empty() {
            return Err(ApiError::Decode(
                "roster member is missing 'userId'".to_string(),
            ));
        }
        let profile = wire.profile.unwrap_or_default();
        Ok(Person {
            user_id: wire.user_id,
            course_id: wire.course_id,
            full_name: profile.name.full_name,
            email: profile.email_address,
            photo_url: profile.photo_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StudentsPage {
    #[serde(default)]
    pub students: Vec<WireRosterMember>,
    #[serde(default)]
    pub next_page_token: String,
}

impl Page for StudentsPage {
    type Item = WireRosterMember;

    fn into_parts(self) -> (Vec<WireRosterMember>, Option<String>) {
        (self.students, token(self.next_page_token))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TeachersPage {
    #[serde(default)]
    pub teachers: Vec<WireRosterMember>,
    #[serde(default)]
    pub next_page_token: String,
}

impl Page for TeachersPage {
    type Item = WireRosterMember;

    fn into_parts(self) -> (Vec<WireRosterMember>, Option<String>) {
        (self.teachers, token(self.next_page_token))
    }
}
