use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::app::{App, Field};
use crate::config::{Backend, Mode};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(Field::ALL.len() as u16 + 1),
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_banner(f, app, chunks[0]);
    draw_form(f, app, chunks[1]);
    draw_buttons(f, app, chunks[2]);
    draw_test_pad(f, app, chunks[3]);

    let status = Paragraph::new(Line::from(Span::styled(
        app.status.as_str(),
        Style::default().fg(Color::Cyan),
    )));
    f.render_widget(status, chunks[4]);
}

fn draw_banner(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let (label, bg) = if !app.is_running() {
        ("IDLE", Color::DarkGray)
    } else if app.can_stop() {
        ("RUNNING", Color::Green)
    } else {
        ("STOPPING...", Color::Yellow)
    };
    let mut spans = vec![
        Span::styled(
            format!(" {label} "),
            Style::default().fg(Color::Black).bg(bg).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" choose  "),
        Span::styled("F9", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh windows  "),
        Span::styled("Ctrl+L", Style::default().fg(Color::Yellow)),
        Span::raw(" clear pad  "),
        Span::styled("Ctrl+Q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ];
    if let Some(hotkey) = app.hotkey_active() {
        spans.push(Span::styled(
            format!("  [{hotkey}]"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_form(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let form = &app.form;
    let lines: Vec<Line> = Field::ALL
        .iter()
        .filter(|field| **field != Field::TestPad)
        .map(|&field| {
            let value = match field {
                Field::Mode => match form.mode {
                    Mode::Key => "< key >".to_string(),
                    Mode::Click => "< click >".to_string(),
                },
                Field::Key => form.key.clone(),
                Field::Button => form.button.clone(),
                Field::Interval => form.interval.clone(),
                Field::Duration => form.duration.clone(),
                Field::StartDelay => form.start_delay.clone(),
                Field::Hold => form.hold.clone(),
                Field::Backend => match form.backend {
                    Backend::Primary if app.caps.alternate_backend => "< primary >".to_string(),
                    Backend::Primary => "primary".to_string(),
                    Backend::Alternate => "< alternate >".to_string(),
                },
                Field::TargetWindow => {
                    if app.windows.is_empty() {
                        form.target_window.clone()
                    } else {
                        format!("{}  ({} open)", form.target_window, app.windows.len())
                    }
                }
                Field::ForceFocus => (if form.force_focus { "[x]" } else { "[ ]" }).to_string(),
                Field::Hotkey => form.hotkey.clone(),
                Field::TestPad => String::new(),
            };

            let focused = app.focus == field;
            let enabled = app.field_enabled(field);
            let label_style = match (focused, enabled) {
                (true, _) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                (false, true) => Style::default().fg(Color::White),
                (false, false) => Style::default().fg(Color::DarkGray),
            };
            let value_style = if enabled {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let cursor = if focused && enabled { "_" } else { "" };

            Line::from(vec![
                Span::raw(if focused { "> " } else { "  " }),
                Span::styled(format!("{:<28}", field.label()), label_style),
                Span::styled(format!("{value}{cursor}"), value_style),
            ])
        })
        .collect();

    let block = Block::default().borders(Borders::TOP).title(" Settings ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_buttons(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let button = |label: &str, enabled: bool, color: Color| {
        let style = if enabled {
            Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(format!("[ {label} ]"), style)
    };

    let line = Line::from(vec![
        Span::raw("  "),
        button("Start (F5)", app.can_start(), Color::Green),
        Span::raw("   "),
        button("Stop (F6)", app.can_stop(), Color::Red),
    ]);
    f.render_widget(
        Paragraph::new(vec![Line::from(""), line]).block(Block::default()),
        area,
    );
}

fn draw_test_pad(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let focused = app.focus == Field::TestPad;
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(" Test pad (Ctrl+X to leave) ");

    // Show the tail so new input stays visible.
    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<&str> = app.test_pad.split('\n').collect();
    let start = lines.len().saturating_sub(height.max(1));
    let mut text = lines[start..].join("\n");
    if focused {
        text.push('_');
    }

    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
