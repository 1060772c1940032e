//! Application state and main loop.
//!
//! Each user action dispatches at most one fetch onto a tokio task; the
//! task reports back with a discrete, immutable [`Outcome`] over a
//! channel. Navigating away cancels the in-flight fetch through its
//! cancellation token.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lectern_client::{
    Announcement, ApiError, ClassroomClient, Course, CourseWork, Person, ResourceKind, Submission,
};

use crate::events::{Event, EventHandler};
use crate::ui;
use crate::Tui;

/// Which screen is on top.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Courses,
    CourseDetail { course: Course, tab: DetailTab },
    Submissions { course: Course, work: CourseWork },
}

/// Tabs within the course detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    CourseWork,
    Announcements,
    Roster,
}

impl DetailTab {
    pub fn next(self) -> Self {
        match self {
            DetailTab::CourseWork => DetailTab::Announcements,
            DetailTab::Announcements => DetailTab::Roster,
            DetailTab::Roster => DetailTab::CourseWork,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DetailTab::CourseWork => "Coursework",
            DetailTab::Announcements => "Announcements",
            DetailTab::Roster => "Roster",
        }
    }
}

/// Result of one dispatched fetch, delivered over the outcome channel.
#[derive(Debug)]
pub enum Outcome {
    Courses(Result<Vec<Course>, ApiError>),
    CourseWork(String, Result<Vec<CourseWork>, ApiError>),
    Announcements(String, Result<Vec<Announcement>, ApiError>),
    Roster(String, Result<(Vec<Person>, Vec<Person>), ApiError>),
    Submissions(String, String, Result<Vec<Submission>, ApiError>),
    TurnedIn(String, String, Result<(), ApiError>),
}

/// One-line error display: cause plus the actionable next step.
#[derive(Debug, Clone)]
pub struct ErrorBanner {
    pub message: String,
    pub suggestion: String,
}

impl ErrorBanner {
    fn from_error(error: &ApiError) -> Self {
        Self {
            message: error.to_string(),
            suggestion: error.suggestion().to_string(),
        }
    }
}

/// Main application state.
pub struct App {
    client: ClassroomClient,
    /// View stack; the last entry is rendered.
    views: Vec<View>,
    pub list_state: ListState,
    pub should_quit: bool,
    pub loading: bool,
    pub error: Option<ErrorBanner>,
    /// Pending turn-in submission id awaiting `y` confirmation.
    pub confirm_turn_in: Option<String>,

    pub courses: Vec<Course>,
    pub course_work: Vec<CourseWork>,
    pub announcements: Vec<Announcement>,
    pub students: Vec<Person>,
    pub teachers: Vec<Person>,
    pub submissions: Vec<Submission>,

    outcomes_tx: mpsc::UnboundedSender<Outcome>,
    outcomes_rx: mpsc::UnboundedReceiver<Outcome>,
    /// Cancels the in-flight fetch when the user navigates away.
    inflight: CancellationToken,
}

impl App {
    pub fn new(client: ClassroomClient) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            client,
            views: vec![View::Courses],
            list_state,
            should_quit: false,
            loading: false,
            error: None,
            confirm_turn_in: None,
            courses: Vec::new(),
            course_work: Vec::new(),
            announcements: Vec::new(),
            students: Vec::new(),
            teachers: Vec::new(),
            submissions: Vec::new(),
            outcomes_tx,
            outcomes_rx,
            inflight: CancellationToken::new(),
        }
    }

    /// The view currently on top of the stack.
    pub fn view(&self) -> &View {
        // The stack starts with one view and pop_view never empties it.
        self.views.last().expect("view stack is never empty")
    }

    /// Run the main loop until quit.
    pub async fn run(&mut self, terminal: &mut Tui) -> anyhow::Result<()> {
        enum Step {
            Term(Option<Event>),
            Data(Option<Outcome>),
        }

        let mut events = EventHandler::new();
        self.fetch_current(false);

        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;

            let step = tokio::select! {
                event = events.next() => Step::Term(event),
                outcome = self.outcomes_rx.recv() => Step::Data(outcome),
            };

            match step {
                Step::Term(Some(Event::Key(key))) => self.handle_key(key),
                Step::Term(Some(Event::Resize(..)) | Some(Event::Tick)) => {}
                Step::Term(None) => break,
                Step::Data(Some(outcome)) => self.handle_outcome(outcome),
                Step::Data(None) => {}
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        // A pending turn-in confirmation swallows the next key.
        if let Some(submission_id) = self.confirm_turn_in.take() {
            if key.code == KeyCode::Char('y') {
                self.turn_in(submission_id);
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => self.pop_view(),
            KeyCode::Char('j') | KeyCode::Down => self.select_delta(1),
            KeyCode::Char('k') | KeyCode::Up => self.select_delta(-1),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => self.activate_selection(),
            KeyCode::Tab => self.next_tab(),
            KeyCode::Char('r') => self.fetch_current(true),
            KeyCode::Char('t') => self.request_turn_in(),
            _ => {}
        }
    }

    fn select_delta(&mut self, delta: i64) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }
        let selected = self.list_state.selected().unwrap_or(0) as i64;
        let next = (selected + delta).rem_euclid(len as i64) as usize;
        self.list_state.select(Some(next));
    }

    fn current_list_len(&self) -> usize {
        match self.view() {
            View::Courses => self.courses.len(),
            View::CourseDetail { tab, .. } => match tab {
                DetailTab::CourseWork => self.course_work.len(),
                DetailTab::Announcements => self.announcements.len(),
                DetailTab::Roster => self.teachers.len() + self.students.len(),
            },
            View::Submissions { .. } => self.submissions.len(),
        }
    }

    fn activate_selection(&mut self) {
        let selected = self.list_state.selected().unwrap_or(0);
        match self.view().clone() {
            View::Courses => {
                if let Some(course) = self.courses.get(selected).cloned() {
                    self.push_view(View::CourseDetail {
                        course,
                        tab: DetailTab::CourseWork,
                    });
                }
            }
            View::CourseDetail {
                course,
                tab: DetailTab::CourseWork,
            } => {
                if let Some(work) = self.course_work.get(selected).cloned() {
                    self.push_view(View::Submissions { course, work });
                }
            }
            _ => {}
        }
    }

    fn next_tab(&mut self) {
        if let Some(View::CourseDetail { tab, .. }) = self.views.last_mut() {
            *tab = tab.next();
            self.list_state.select(Some(0));
            self.fetch_current(false);
        }
    }

    fn push_view(&mut self, view: View) {
        self.views.push(view);
        self.list_state.select(Some(0));
        self.error = None;
        self.fetch_current(false);
    }

    fn pop_view(&mut self) {
        if self.views.len() > 1 {
            self.views.pop();
            self.list_state.select(Some(0));
            self.error = None;
            // The abandoned view's fetch is no longer wanted.
            self.inflight.cancel();
            self.loading = false;
        }
    }

    fn request_turn_in(&mut self) {
        if let View::Submissions { .. } = self.view() {
            let selected = self.list_state.selected().unwrap_or(0);
            if let Some(submission) = self.submissions.get(selected)
                && submission.is_turnable()
            {
                self.confirm_turn_in = Some(submission.id.clone());
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Data dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the data backing the current view. With `refresh`, the cached
    /// entry is invalidated first so the read goes back to the remote.
    fn fetch_current(&mut self, refresh: bool) {
        self.inflight.cancel();
        self.inflight = CancellationToken::new();
        self.loading = true;
        self.error = None;

        let client = self.client.clone();
        let tx = self.outcomes_tx.clone();
        let cancel = self.inflight.clone();

        match self.view().clone() {
            View::Courses => {
                tokio::spawn(async move {
                    if refresh {
                        let _ = client.cache_invalidate(ResourceKind::Courses, &[]).await;
                    }
                    let result = client.courses().list(&cancel).await;
                    let _ = tx.send(Outcome::Courses(result));
                });
            }
            View::CourseDetail { course, tab } => {
                let course_id = course.id;
                match tab {
                    DetailTab::CourseWork => {
                        tokio::spawn(async move {
                            if refresh {
                                let _ = client
                                    .cache_invalidate(ResourceKind::CourseWork, &[&course_id])
                                    .await;
                            }
                            let result = client.course_work().list(&course_id, &cancel).await;
                            let _ = tx.send(Outcome::CourseWork(course_id, result));
                        });
                    }
                    DetailTab::Announcements => {
                        tokio::spawn(async move {
                            if refresh {
                                let _ = client
                                    .cache_invalidate(ResourceKind::Announcements, &[&course_id])
                                    .await;
                            }
                            let result = client.announcements().list(&course_id, &cancel).await;
                            let _ = tx.send(Outcome::Announcements(course_id, result));
                        });
                    }
                    DetailTab::Roster => {
                        tokio::spawn(async move {
                            if refresh {
                                let _ = client
                                    .cache_invalidate(
                                        ResourceKind::Roster,
                                        &[&course_id, "teachers"],
                                    )
                                    .await;
                                let _ = client
                                    .cache_invalidate(
                                        ResourceKind::Roster,
                                        &[&course_id, "students"],
                                    )
                                    .await;
                            }
                            let teachers = client.roster().teachers(&course_id, &cancel).await;
                            let result = match teachers {
                                Ok(teachers) => client
                                    .roster()
                                    .students(&course_id, &cancel)
                                    .await
                                    .map(|students| (teachers, students)),
                                Err(e) => Err(e),
                            };
                            let _ = tx.send(Outcome::Roster(course_id, result));
                        });
                    }
                }
            }
            View::Submissions { course, work } => {
                let course_id = course.id;
                let work_id = work.id;
                tokio::spawn(async move {
                    if refresh {
                        let _ = client
                            .cache_invalidate(
                                ResourceKind::Submissions,
                                &[&course_id, &work_id],
                            )
                            .await;
                    }
                    let result = client
                        .submissions()
                        .list(&course_id, &work_id, &cancel)
                        .await;
                    let _ = tx.send(Outcome::Submissions(course_id, work_id, result));
                });
            }
        }
    }

    fn turn_in(&mut self, submission_id: String) {
        let View::Submissions { course, work } = self.view().clone() else {
            return;
        };
        self.loading = true;

        let client = self.client.clone();
        let tx = self.outcomes_tx.clone();
        let cancel = self.inflight.clone();
        tokio::spawn(async move {
            let result = client
                .submissions()
                .turn_in(&course.id, &work.id, &submission_id, &cancel)
                .await;
            let _ = tx.send(Outcome::TurnedIn(course.id, work.id, result));
        });
    }

    // ─────────────────────────────────────────────────────────────────────
    // Outcomes
    // ─────────────────────────────────────────────────────────────────────

    fn handle_outcome(&mut self, outcome: Outcome) {
        self.loading = false;
        match outcome {
            Outcome::Courses(Ok(courses)) => self.courses = courses,
            Outcome::CourseWork(course_id, Ok(work)) => {
                if self.is_current_course(&course_id) {
                    self.course_work = work;
                }
            }
            Outcome::Announcements(course_id, Ok(announcements)) => {
                if self.is_current_course(&course_id) {
                    self.announcements = announcements;
                }
            }
            Outcome::Roster(course_id, Ok((teachers, students))) => {
                if self.is_current_course(&course_id) {
                    self.teachers = teachers;
                    self.students = students;
                }
            }
            Outcome::Submissions(course_id, work_id, Ok(submissions)) => {
                if self.is_current_work(&course_id, &work_id) {
                    self.submissions = submissions;
                }
            }
            Outcome::TurnedIn(course_id, work_id, Ok(())) => {
                // Refetch so the view shows the new submission state.
                if self.is_current_work(&course_id, &work_id) {
                    self.fetch_current(false);
                }
            }
            Outcome::Courses(Err(e))
            | Outcome::CourseWork(_, Err(e))
            | Outcome::Announcements(_, Err(e))
            | Outcome::Roster(_, Err(e))
            | Outcome::Submissions(_, _, Err(e))
            | Outcome::TurnedIn(_, _, Err(e)) => {
                if !matches!(e, ApiError::Cancelled) {
                    self.error = Some(ErrorBanner::from_error(&e));
                }
            }
        }

        let len = self.current_list_len();
        if len > 0 && self.list_state.selected().unwrap_or(0) >= len {
            self.list_state.select(Some(len - 1));
        }
    }

    fn is_current_course(&self, course_id: &str) -> bool {
        matches!(self.view(), View::CourseDetail { course, .. } if course.id == course_id)
    }

    fn is_current_work(&self, course_id: &str, work_id: &str) -> bool {
        matches!(
            self.view(),
            View::Submissions { course, work }
                if course.id == course_id && work.id == work_id
        )
    }
}
