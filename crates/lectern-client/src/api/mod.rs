//! Per-resource API surfaces.

mod announcements;
mod course_work;
mod courses;
mod roster;
mod submissions;

pub use announcements::AnnouncementsApi;
pub use course_work::CourseWorkApi;
pub use courses::CoursesApi;
pub use roster::RosterApi;
pub use submissions::SubmissionsApi;
