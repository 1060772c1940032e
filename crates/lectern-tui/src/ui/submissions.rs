//! Submissions view for one piece of coursework.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use lectern_client::{Course, CourseWork, Submission};

use crate::app::App;

pub fn draw(
    frame: &mut Frame,
    area: Rect,
    app: &mut App,
    course: &Course,
    work: &CourseWork,
) {
    let items: Vec<ListItem> = app.submissions.iter().map(submission_item).collect();

    let title = format!("{} — {} — submissions", course.name, work.title);
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn submission_item(submission: &Submission) -> ListItem<'static> {
    let state_color = match submission.state.as_str() {
        "TURNED_IN" => Color::Green,
        "RETURNED" => Color::Cyan,
        _ => Color::Yellow,
    };

    let mut spans = vec![Span::styled(
        format!("{:<22}", submission.state),
        Style::default().fg(state_color),
    )];

    match submission.assigned_grade {
        Some(grade) => spans.push(Span::raw(format!("grade {}", grade))),
        None => spans.push(Span::styled(
            "ungraded",
            Style::default().fg(Color::DarkGray),
        )),
    }

    if submission.late {
        spans.push(Span::styled("  LATE", Style::default().fg(Color::Red)));
    }

    ListItem::new(Line::from(spans))
}
