//! Domain records.
//!
//! Immutable value snapshots converted from the remote schema at fetch
//! time. They carry no network state and no ownership of credentials or
//! cache entries; the presentation layer consumes them read-only.

use serde::{Deserialize, Serialize};

/// A Classroom course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub section: String,
    pub description_heading: String,
    pub room: String,
    pub owner_id: String,
    pub enrollment_code: String,
    pub course_state: String,
    pub creation_time: String,
    pub update_time: String,
}

/// An assignment, quiz, or material posted to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseWork {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub work_type: String,
    pub state: String,
    /// Due date formatted `YYYY-MM-DD`, if the work has one.
    pub due_date: Option<String>,
    /// Due time-of-day formatted `HH:MM`, if the work has one.
    pub due_time: Option<String>,
    pub max_points: Option<f64>,
    pub creator_user_id: String,
    pub update_time: String,
}

impl CourseWork {
    /// Human-readable due stamp combining date and time.
    pub fn due_display(&self) -> String {
        match (&self.due_date, &self.due_time) {
            (Some(date), Some(time)) => format!("{} {}", date, time),
            (Some(date), None) => date.clone(),
            _ => "no due date".to_string(),
        }
    }
}

/// A student's submission for one piece of coursework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub course_id: String,
    pub course_work_id: String,
    pub user_id: String,
    pub state: String,
    pub assigned_grade: Option<f64>,
    pub draft_grade: Option<f64>,
    pub late: bool,
    pub creation_time: String,
    pub update_time: String,
}

impl Submission {
    /// Whether the submission can still be turned in.
    pub fn is_turnable(&self) -> bool {
        matches!(self.state.as_str(), "NEW" | "CREATED" | "RECLAIMED_BY_STUDENT")
    }
}

/// A course announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub course_id: String,
    pub text: String,
    pub state: String,
    pub creator_user_id: String,
    pub creation_time: String,
    pub update_time: String,
}

/// A course roster member (student or teacher) with their profile fields
/// flattened in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub user_id: String,
    pub course_id: String,
    pub full_name: String,
    pub email: String,
    pub photo_url: String,
}
