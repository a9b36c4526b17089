//! # TUI Rendering Logic
//!
//! This module is responsible for drawing the entire user interface based on the
//! current application state.

use crate::{
    app::{App, InputMode},
    view_state::ConfidenceLevel,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

/// The main rendering function, which draws the unified layout.
pub fn ui(frame: &mut Frame, app: &App) {
    // 1. Header with the document and page position
    // 2. Extracted fields of the current page
    // 3. Embedded page text
    // 4. Input panel (only while editing)
    // 5. Status bar
    let input_height = if app.input_mode == InputMode::Editing { 3 } else { 0 };
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(8),
            Constraint::Length(input_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, main_layout[0]);
    render_fields(frame, app, main_layout[1]);
    render_page_text(frame, app, main_layout[2]);
    if app.input_mode == InputMode::Editing {
        render_input_panel(frame, app, main_layout[3]);
    }
    render_status_bar(frame, app, main_layout[4]);
}

pub fn level_color(level: ConfidenceLevel) -> Color {
    match level {
        ConfidenceLevel::High => Color::Green,
        ConfidenceLevel::Medium => Color::Yellow,
        ConfidenceLevel::Low => Color::Red,
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let view = &app.view;
    let title = Line::from(vec![
        Span::styled(
            view.filename.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  ({})", view.doc_id)),
    ]);
    let position = Paragraph::new(format!(
        "Page {} of {}   ←/→ navigate   r re-extract   q quit",
        view.current_page(),
        view.total_pages
    ))
    .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(position, area);
}

/// Renders the extracted fields of the current page, colored by confidence.
fn render_fields(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!("Fields (page {})", app.view.current_page()))
        .borders(Borders::ALL);

    let Some(page) = app.view.current() else {
        let empty = Paragraph::new("This page has not been extracted.").block(block);
        frame.render_widget(empty, area);
        return;
    };

    let header_cells = ["Field", "Value", "Confidence"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let found = page.extracted_fields.iter().map(|field| {
        let level = ConfidenceLevel::from(field.confidence);
        Row::new(vec![
            Cell::from(field.field_name.clone()),
            Cell::from(field.value.clone()),
            Cell::from(format!("{:.2} {}", field.confidence, level.label()))
                .style(Style::default().fg(level_color(level))),
        ])
    });
    let missing = app.view.missing_fields().into_iter().map(|name| {
        Row::new(vec![
            Cell::from(name.to_string()),
            Cell::from("not found"),
            Cell::from("-"),
        ])
        .style(Style::default().fg(Color::DarkGray))
    });

    let table = Table::new(
        found.chain(missing),
        [
            Constraint::Percentage(30),
            Constraint::Percentage(50),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(block);

    frame.render_widget(table, area);
}

fn render_page_text(frame: &mut Frame, app: &App, area: Rect) {
    let text = app
        .view
        .current()
        .and_then(|page| page.text_content.as_deref())
        .unwrap_or("(no embedded text)");
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().title("Page text").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

/// Renders the input panel for the re-extraction field list.
fn render_input_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title("FIELDS (comma-separated)")
        .borders(Borders::ALL);
    let inner_area = block.inner(area);
    let input = Paragraph::new(app.input_text.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(block);
    frame.render_widget(input, area);
    frame.set_cursor_position((
        inner_area.x + app.input_text.chars().count() as u16,
        inner_area.y,
    ));
}

/// Renders the bottom status bar.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(app.status.as_str())
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(status, area);
}
