//! Rendering.

mod courses;
mod detail;
mod submissions;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, View};

/// Draw the whole screen.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(2),
    ])
    .areas(frame.area());

    draw_header(frame, header, app);

    match app.view().clone() {
        View::Courses => courses::draw(frame, body, app),
        View::CourseDetail { course, tab } => detail::draw(frame, body, app, &course, tab),
        View::Submissions { course, work } => submissions::draw(frame, body, app, &course, &work),
    }

    draw_footer(frame, footer, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = match app.view() {
        View::Courses => "lectern — courses".to_string(),
        View::CourseDetail { course, tab } => {
            format!("lectern — {} — {}", course.name, tab.title())
        }
        View::Submissions { work, .. } => format!("lectern — {}", work.title),
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if app.loading {
        spans.push(Span::styled(
            "  loading…",
            Style::default().fg(Color::Yellow),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = if app.confirm_turn_in.is_some() {
        Line::from(Span::styled(
            "Turn in this submission? y to confirm, any other key to abort",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = &app.error {
        Line::from(vec![
            Span::styled(
                format!("{} ", error.message),
                Style::default().fg(Color::Red),
            ),
            Span::styled(
                error.suggestion.clone(),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        Line::from(Span::styled(
            key_hints(app.view()),
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(view: &View) -> &'static str {
    match view {
        View::Courses => "j/k move · Enter open · r refresh · q quit",
        View::CourseDetail { .. } => {
            "j/k move · Enter open · Tab next tab · Esc back · r refresh · q quit"
        }
        View::Submissions { .. } => "j/k move · t turn in · Esc back · r refresh · q quit",
    }
}
