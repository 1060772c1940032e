//! Course detail view: coursework, announcements, and roster tabs.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use lectern_client::Course;

use crate::app::{App, DetailTab};

pub fn draw(frame: &mut Frame, area: Rect, app: &mut App, course: &Course, tab: DetailTab) {
    let items = match tab {
        DetailTab::CourseWork => course_work_items(app),
        DetailTab::Announcements => announcement_items(app),
        DetailTab::Roster => roster_items(app),
    };

    let title = format!("{} — {}", course.name, tab.title());
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn course_work_items(app: &App) -> Vec<ListItem<'static>> {
    app.course_work
        .iter()
        .map(|work| {
            let mut spans = vec![Span::raw(work.title.clone())];
            spans.push(Span::styled(
                format!("  due {}", work.due_display()),
                Style::default().fg(Color::DarkGray),
            ));
            if let Some(points) = work.max_points {
                spans.push(Span::styled(
                    format!("  {} pts", points),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect()
}

fn announcement_items(app: &App) -> Vec<ListItem<'static>> {
    app.announcements
        .iter()
        .map(|announcement| {
            // First line of the text, clipped for the list row.
            let mut text = announcement
                .text
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            if text.len() > 100 {
                text.truncate(100);
                text.push('…');
            }
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}  ", announcement.creation_time),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(text),
            ]))
        })
        .collect()
}

fn roster_items(app: &App) -> Vec<ListItem<'static>> {
    let teachers = app.teachers.iter().map(|person| (person, "teacher"));
    let students = app.students.iter().map(|person| (person, "student"));

    teachers
        .chain(students)
        .map(|(person, role)| {
            let name = if person.full_name.is_empty() {
                person.user_id.clone()
            } else {
                person.full_name.clone()
            };
            let mut spans = vec![
                Span::styled(format!("[{}] ", role), Style::default().fg(Color::Cyan)),
                Span::raw(name),
            ];
            if !person.email.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", person.email),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect()
}
