use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode};
use testpilot_core::panel::ResultBlock;
use testpilot_core::{FeatureKey, Panel, Provider};

const SIDEBAR_WIDTH: u16 = 32;

/// Parse a line of text and convert **bold** and `code` markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut bold_text = String::new();
                let mut found_close = false;

                while let Some(c) = chars.next() {
                    if c == '*' && chars.peek() == Some(&'*') {
                        chars.next();
                        found_close = true;
                        break;
                    }
                    bold_text.push(c);
                }

                if found_close && !bold_text.is_empty() {
                    if !current_text.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current_text)));
                    }
                    spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
                } else {
                    // No closing **, treat as literal
                    current_text.push_str("**");
                    current_text.push_str(&bold_text);
                }
            }
            '`' => {
                let mut code_text = String::new();
                let mut found_close = false;
                for c in chars.by_ref() {
                    if c == '`' {
                        found_close = true;
                        break;
                    }
                    code_text.push(c);
                }

                if found_close {
                    if !current_text.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current_text)));
                    }
                    spans.push(Span::styled(code_text, Style::default().fg(Color::Yellow)));
                } else {
                    current_text.push('`');
                    current_text.push_str(&code_text);
                }
            }
            _ => current_text.push(c),
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Line and column of a char cursor inside `value`
fn cursor_line_col(value: &str, cursor: usize) -> (usize, usize) {
    let before: String = value.chars().take(cursor).collect();
    let line = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);
    (line, col)
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
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

    let [sidebar_area, main_area] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)]).areas(body_area);

    render_header(app, frame, header_area);
    render_sidebar(app, frame, sidebar_area);
    render_panel(app, frame, main_area);
    render_notice(app, frame, main_area);
    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    } else if app.show_provider_picker {
        render_provider_picker(app, frame, area);
    } else if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" TestPilot AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {}: {} ", app.current_provider.short_name(), app.selected_model),
            Style::default().fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, about_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(5)]).areas(area);
    app.sidebar_area = Some(list_area);

    let focused = app.focus == FocusPane::Sidebar;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let items: Vec<ListItem> = FeatureKey::all()
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let feature = key.feature();
            let busy = if app.panels[key.index()].is_submitting() { " …" } else { "" };
            let style = if *key == app.active {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {} {}{}", i + 1, feature.icon, feature.label, busy)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Features "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.sidebar_state);

    // Description of the feature under the cursor
    let hovered = app
        .sidebar_state
        .selected()
        .and_then(|i| FeatureKey::all().get(i).copied())
        .unwrap_or(app.active);
    let about = Paragraph::new(hovered.feature().description)
        .style(Style::default().fg(Color::DarkGray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    frame.render_widget(about, about_area);
}

fn render_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let feature = app.panel().feature();

    let field_heights: Vec<Constraint> = feature
        .inputs
        .iter()
        .map(|input| Constraint::Length(if input.multiline { 7 } else { 3 }))
        .collect();
    let form_height: u16 = feature.inputs.iter().map(|i| if i.multiline { 7 } else { 3 }).sum();

    let [intro_area, form_area, submit_area, result_area] = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(form_height),
        Constraint::Length(1),
        Constraint::Min(3),
    ])
    .areas(area);

    // Title and intro
    let intro = Paragraph::new(feature.intro)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(
                    format!(" {} {} ", feature.icon, feature.title),
                    Style::default().fg(Color::Cyan).bold(),
                )),
        );
    frame.render_widget(intro, intro_area);

    let field_areas = Layout::vertical(field_heights).split(form_area);
    for (idx, field_area) in field_areas.iter().enumerate() {
        render_field(app, frame, *field_area, idx);
    }

    render_submit_line(app, frame, submit_area);
    render_result(app, frame, result_area);
}

fn render_field(app: &App, frame: &mut Frame, area: Rect, idx: usize) {
    let panel = app.panel();
    let Some(input) = panel.feature().inputs.get(idx) else {
        return;
    };
    let value = panel.inputs().get(idx).map(String::as_str).unwrap_or_default();

    let selected = app.focus == FocusPane::Form && app.field_idx == idx;
    let editing = selected && app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if selected {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", input.label));
    let inner = block.inner(area);

    let (cursor_line, cursor_col) = cursor_line_col(value, app.cursor);
    let scroll = if editing {
        cursor_line.saturating_sub(inner.height.saturating_sub(1) as usize) as u16
    } else {
        0
    };

    let text = if value.is_empty() && !editing {
        Text::from(Span::styled(input.placeholder, Style::default().fg(Color::DarkGray)))
    } else {
        Text::from(value.to_string())
    };

    let paragraph = Paragraph::new(text).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);

    if editing {
        let x = inner.x + (cursor_col as u16).min(inner.width.saturating_sub(1));
        let y = inner.y + (cursor_line as u16).saturating_sub(scroll);
        frame.set_cursor_position((x, y));
    }
}

fn render_submit_line(app: &App, frame: &mut Frame, area: Rect) {
    let feature = app.panel().feature();

    let line = if app.is_loading() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        Line::from(Span::styled(
            format!(" Working{:<3}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(vec![
            Span::styled(format!(" {} ", feature.submit_label), Style::default().bg(Color::Blue).fg(Color::White).bold()),
            Span::styled("  s / Ctrl-S", Style::default().fg(Color::DarkGray)),
        ])
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn result_lines(panel: &Panel) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for block in panel.result_blocks() {
        match block {
            ResultBlock::Field { view, value } => {
                lines.push(Line::from(Span::styled(
                    view.label,
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                )));
                for text in value.lines() {
                    if view.code {
                        lines.push(Line::from(Span::styled(
                            format!("  {}", text),
                            Style::default().fg(Color::Green),
                        )));
                    } else {
                        lines.push(parse_markdown_line(text));
                    }
                }
                lines.push(Line::default());
            }
            ResultBlock::Fallback(text) => {
                lines.push(Line::from(Span::styled(
                    text,
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines
}

fn render_result(app: &mut App, frame: &mut Frame, area: Rect) {
    app.result_area = Some(area);
    app.result_height = area.height.saturating_sub(2);

    let feature = app.panel().feature();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", feature.results_heading));

    let lines = if app.panel().result().is_some() {
        result_lines(app.panel())
    } else if app.is_loading() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        vec![Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ))]
    } else {
        vec![Line::from(Span::styled(
            format!("Fill in the form and press s to run {}.", feature.submit_label),
            Style::default().fg(Color::DarkGray),
        ))]
    };

    app.result_scroll = app.result_scroll.min(lines.len().saturating_sub(1) as u16);

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_notice(app: &App, frame: &mut Frame, area: Rect) {
    let Some(notice) = app.panel().notice() else {
        return;
    };

    let width = area.width.saturating_sub(4).min(70);
    let height = 6u16.min(area.height);
    let notice_area = Rect::new(
        area.x + area.width.saturating_sub(width + 2),
        area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    );

    frame.render_widget(Clear, notice_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Span::styled(format!(" {} ", notice.title), Style::default().fg(Color::Red).bold()))
        .title_bottom(Line::from(" Esc to dismiss ").right_aligned());

    let message = Paragraph::new(notice.message.as_str())
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(message, notice_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        (InputMode::Normal, FocusPane::Sidebar) => (" FEATURES ", Style::default().bg(Color::Blue).fg(Color::White)),
        (InputMode::Normal, FocusPane::Form) => (" FORM ", Style::default().bg(Color::Blue).fg(Color::White)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [
            Span::styled(format!(" {} ", key), key_style),
            Span::styled(format!(" {} ", label), label_style),
        ]
    };

    let pairs: Vec<(&'static str, &'static str)> = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) if app.editing_multiline() => {
            vec![("Esc", "done"), ("Enter", "newline"), ("Ctrl-S", "submit")]
        }
        (InputMode::Editing, _) => vec![("Esc/Enter", "done"), ("Ctrl-S", "submit")],
        (InputMode::Normal, FocusPane::Sidebar) => vec![
            ("j/k", "nav"),
            ("Enter", "open"),
            ("1-5", "jump"),
            ("Tab", "focus"),
            ("P", "provider"),
            ("m", "model"),
            ("q", "quit"),
        ],
        (InputMode::Normal, FocusPane::Form) => vec![
            ("j/k", "field"),
            ("Enter", "edit"),
            ("s", "submit"),
            ("^d/^u", "scroll"),
            ("Tab", "focus"),
            ("P", "provider"),
            ("m", "model"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.extend(hint(key, label));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let popup_area = popup_area(area, 40, app.available_models.len() as u16 + 2);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Model (Enter to select, Esc to cancel) ");

    let items: Vec<ListItem> = app
        .available_models
        .iter()
        .map(|model| {
            let style = if model == &app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup_area = popup_area(area, 45, providers.len() as u16 + 2);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Provider ");

    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let key_source = app.get_key_source(*provider);
            let is_current = *provider == app.current_provider;

            let status = key_source.map(|s| format!("({})", s)).unwrap_or_else(|| "(needs key)".to_string());
            let prefix = if is_current { "* " } else { "  " };

            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if key_source.is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{}{} {}", prefix, provider.display_name(), status)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.provider_picker_state);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let provider_name = app
        .api_key_target_provider
        .map(|p| p.display_name())
        .unwrap_or("Provider");

    let popup_area = popup_area(area, 60, 7);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Enter API Key for {} ", provider_name));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Paste your API key below. Press Enter to save, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);

    // Mask the key, showing only the last 4 chars
    let char_count = app.api_key_input.chars().count();
    let display_text = if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let masked_len = char_count - 4;
        let last_four: String = app.api_key_input.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    };
    frame.render_widget(Paragraph::new(display_text).style(Style::default().fg(Color::Cyan)), input_area);

    let cursor_x = app.api_key_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let status = Paragraph::new(format!("{} characters", char_count)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_bold_and_code() {
        let line = parse_markdown_line("use **await** on `page.click()` first");
        let texts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["use ", "await", " on ", "page.click()", " first"]);
    }

    #[test]
    fn test_unclosed_markers_stay_literal() {
        let line = parse_markdown_line("a ** b `c");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "a ** b `c");
    }

    #[test]
    fn test_cursor_line_col() {
        assert_eq!(cursor_line_col("ab\ncd", 4), (1, 1));
        assert_eq!(cursor_line_col("ab\ncd", 2), (0, 2));
        assert_eq!(cursor_line_col("", 0), (0, 0));
    }
}
