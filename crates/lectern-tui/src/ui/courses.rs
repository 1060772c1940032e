//! Course list view.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use crate::app::App;

pub fn draw(frame: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .courses
        .iter()
        .map(|course| {
            let mut spans = vec![Span::raw(course.name.clone())];
            if !course.section.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", course.section),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if course.course_state != "ACTIVE" {
                spans.push(Span::styled(
                    format!("  [{}]", course.course_state),
                    Style::default().fg(Color::Yellow),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Courses"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}
