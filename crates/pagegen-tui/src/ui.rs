use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use pagegen_core::{Category, GenerationState, PreviewLine, SpanStyle};
use crate::app::{App, Focus, Notice};

fn border_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn preview_span_style(style: SpanStyle) -> Style {
    match style {
        SpanStyle::Plain => Style::default(),
        SpanStyle::Heading => Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        SpanStyle::Emphasis => Style::default().add_modifier(Modifier::BOLD),
        SpanStyle::Link => Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        SpanStyle::Button => Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD),
    }
}

/// Convert sanitized preview lines into styled terminal lines
fn preview_text(lines: &[PreviewLine]) -> Text<'static> {
    let lines: Vec<Line<'static>> = lines
        .iter()
        .map(|line| {
            Line::from(
                line.spans
                    .iter()
                    .map(|span| Span::styled(span.text.clone(), preview_span_style(span.style)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    Text::from(lines)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if let Some(notice) = &app.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let key_status = match app.key_source {
        Some(source) => Span::styled(format!(" key: {} ", source), Style::default().fg(Color::Green)),
        None => Span::styled(" no API key ", Style::default().fg(Color::Red)),
    };

    let title = Line::from(vec![
        Span::styled(" AI Landing Page Generator ", Style::default().fg(Color::Magenta).bold()),
        Span::styled(format!(" {} ", app.client.model()), Style::default().fg(Color::Gray)),
        key_status,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    let [idea_area, category_area, button_area, status_area, result_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    render_idea_input(app, frame, idea_area);
    render_category_selector(app, frame, category_area);
    render_generate_button(app, frame, button_area);
    render_status(app, frame, status_area);

    if app.view.has_result() {
        render_results(app, frame, result_area);
    } else {
        let hint = Paragraph::new(Span::styled(
            "Describe your product, pick a category, and press Enter to generate a landing page.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
        frame.render_widget(hint, result_area);
    }
}

fn render_idea_input(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Idea))
        .title(" Product idea ");

    let text = if app.view.idea().is_empty() && app.focus != Focus::Idea {
        Span::styled(
            "Enter your product idea (eg: Travel Planner, E-Commerce)",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::raw(app.view.idea())
    };

    // Scroll horizontally so the cursor stays inside the box
    let inner = block.inner(area);
    let cursor_col = idea_cursor_column(app);
    let offset = cursor_col.saturating_sub(inner.width.saturating_sub(1));
    frame.render_widget(Paragraph::new(text).scroll((0, offset)).block(block), area);

    if app.focus == Focus::Idea && app.notice.is_none() {
        frame.set_cursor_position((inner.x + cursor_col - offset, inner.y));
    }
}

/// Display column of the cursor; wide characters take two cells.
fn idea_cursor_column(app: &App) -> u16 {
    let before: String = app.view.idea().chars().take(app.idea_cursor).collect();
    Span::raw(before).width().min(u16::MAX as usize) as u16
}

fn render_category_selector(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Category))
        .title(" Category (←/→) ");

    let mut spans = Vec::new();
    for category in Category::all() {
        let style = if category == app.view.category() {
            Style::default().fg(Color::Black).bg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", category.label()), style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_generate_button(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Generate;
    let style = if app.view.is_busy() {
        Style::default().fg(Color::White).bg(Color::DarkGray).add_modifier(Modifier::ITALIC)
    } else if focused {
        Style::default().fg(Color::White).bg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    };

    let button = Paragraph::new(Line::from(app.button_label()).centered())
        .style(style)
        .block(Block::default().borders(Borders::ALL).border_style(border_style(app, Focus::Generate)));
    frame.render_widget(button, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = match (app.view.state(), app.view.last_error()) {
        (_, Some(err)) => Line::from(Span::styled(
            format!(" ✗ Generation failed: {}", err),
            Style::default().fg(Color::Red),
        )),
        (GenerationState::InFlight, None) => {
            let label = match app.view.outstanding() {
                1 => "Waiting for the model".to_string(),
                n => format!("{} requests in flight", n),
            };
            Line::from(vec![
                Span::styled(format!(" {} ", app.spinner()), Style::default().fg(Color::Magenta)),
                Span::styled(label, Style::default().fg(Color::DarkGray)),
            ])
        }
        (GenerationState::Completed(_), None) => Line::from(Span::styled(
            format!(" ✓ Generated {} bytes", app.view.result_text().len()),
            Style::default().fg(Color::Green),
        )),
        _ => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    let [preview_area, source_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(area);

    let preview = Paragraph::new(preview_text(&app.preview_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, Focus::Preview))
                .title(" Live Preview (sanitized) "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll, 0));
    frame.render_widget(preview, preview_area);

    let source = Paragraph::new(Text::raw(app.view.result_text()))
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, Focus::Source))
                .title(" HTML Code (c to copy) "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.source_scroll, 0));
    frame.render_widget(source, source_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
    ];

    match app.focus {
        Focus::Idea => hints.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" generate ", label_style),
            Span::styled(" ^Y ", key_style),
            Span::styled(" copy ", label_style),
            Span::styled(" ^C ", key_style),
            Span::styled(" quit ", label_style),
        ]),
        Focus::Category => hints.extend(vec![
            Span::styled(" ←/→ ", key_style),
            Span::styled(" choose ", label_style),
        ]),
        Focus::Generate => hints.extend(vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" generate ", label_style),
        ]),
        Focus::Preview | Focus::Source => hints.extend(vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
        ]),
    }

    if app.focus != Focus::Idea {
        hints.extend(vec![
            Span::styled(" c ", key_style),
            Span::styled(" copy ", label_style),
            Span::styled(" e ", key_style),
            Span::styled(" export ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_notice(notice: &Notice, frame: &mut Frame, area: Rect) {
    let color = match notice {
        Notice::Error(_) => Color::Red,
        _ => Color::Green,
    };

    // Calculate popup size and position (centered)
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 6.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height).intersection(area);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(notice.title());

    let text = Text::from(vec![
        Line::from(notice.message()),
        Line::default(),
        Line::from(Span::styled("Press any key to continue", Style::default().fg(Color::DarkGray))),
    ]);

    let popup = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(popup, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{test_app, RecordingClipboard};
    use pagegen_core::GenerationOutcome;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &mut App) -> String {
        draw_sized(app, 100, 30)
    }

    fn draw_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(app, f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_idle_screen_shows_form_without_result_panes() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        let screen = draw(&mut app);
        assert!(screen.contains("Generate Landing Page"));
        assert!(screen.contains("AI SaaS"));
        assert!(screen.contains("Productivity Tool"));
        assert!(!screen.contains("Live Preview"));
    }

    #[test]
    fn test_result_shows_preview_and_source() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        let ticket = app.view.begin();
        app.on_generation(GenerationOutcome {
            ticket,
            result: Ok("<div>Hello<script>evil()</script></div>".to_string()),
        });
        let screen = draw(&mut app);
        assert!(screen.contains("Live Preview"));
        assert!(screen.contains("HTML Code"));
        assert!(screen.contains("<div>Hello<script>"));
    }

    #[test]
    fn test_failure_line_is_visible() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        let ticket = app.view.begin();
        app.on_generation(GenerationOutcome {
            ticket,
            result: Err(pagegen_core::GenerateError::MalformedResponse("no choices".to_string())),
        });
        let screen = draw(&mut app);
        assert!(screen.contains("Generation failed"));
        assert!(screen.contains("Generate Landing Page"));
    }

    #[test]
    fn test_busy_label_and_notice_popup() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        app.view.begin();
        app.notice = Some(Notice::Copied);
        let screen = draw(&mut app);
        assert!(screen.contains("Generating..."));
        assert!(screen.contains("Waiting for the model"));
        assert!(screen.contains("Copied to clipboard!"));
    }

    #[test]
    fn test_notice_popup_fits_short_terminal() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        app.notice = Some(Notice::Copied);
        draw_sized(&mut app, 80, 4);
        draw_sized(&mut app, 80, 1);

        app.notice = Some(Notice::Error("clipboard unavailable".to_string()));
        draw_sized(&mut app, 3, 2);
    }

    #[test]
    fn test_cursor_column_counts_wide_characters() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        app.set_idea("日本a");
        assert_eq!(idea_cursor_column(&app), 5);
        app.cursor_left();
        assert_eq!(idea_cursor_column(&app), 4);
    }

    #[test]
    fn test_long_idea_scrolls_to_keep_cursor_visible() {
        let (mut app, _rx) = test_app(RecordingClipboard::default());
        app.set_idea(format!("{}END", "x".repeat(150)));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("END"));
        let cursor = terminal.get_cursor_position().unwrap();
        assert!(cursor.x < 100);
    }
}
