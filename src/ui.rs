use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    draw_title(f, chunks[0], app);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20), Constraint::Percentage(80)])
        .split(chunks[1]);

    draw_styles(f, app, main_chunks[0]);
    draw_toast_area(f, app, main_chunks[1]);
    draw_status(f, app, chunks[2]);

    if app.state == AppState::Input {
        draw_input_popup(f, app);
    } else if app.show_help {
        draw_help_popup(f);
    }
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let time_str = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let host = if app.host_attached() { "attached" } else { "detached" };
    let header = format!(
        "toaster | {} | #{}: {} | showing: {} | timers: {}",
        time_str,
        app.area_id(),
        host,
        app.toasts().len(),
        app.pending_removals()
    );

    let title = Paragraph::new(header)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn draw_styles(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .styles
        .iter()
        .enumerate()
        .map(|(i, style_class)| {
            let style = if i == app.selected_style {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(swatch(style_class))),
                Span::raw(format!("{} {}", i + 1, style_class)),
            ]))
            .style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Style")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(list, area);
}

fn swatch(style_class: &str) -> Color {
    match style_class {
        "bg-success" => Color::Green,
        "bg-danger" => Color::Red,
        "bg-warning" => Color::Yellow,
        "bg-info" => Color::Cyan,
        "bg-primary" => Color::Blue,
        "bg-secondary" => Color::Gray,
        _ => Color::DarkGray,
    }
}

fn draw_toast_area(f: &mut Frame, app: &App, area: Rect) {
    let title = format!("#{} (x: dismiss newest, t: markup)", app.area_id());
    if !app.host_attached() {
        let empty = Paragraph::new(format!("#{} is not in the document. Press h to attach it.", app.area_id()))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let toasts = app.toasts();
    if toasts.is_empty() {
        let empty = Paragraph::new("No toasts. Press s for a sample or i to write one.")
            .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    }

    let now = chrono::Local::now();
    let items: Vec<ListItem> = toasts
        .iter()
        .map(|toast| {
            let style_class = toast
                .classes()
                .iter()
                .find(|c| c.starts_with("bg-"))
                .map(String::as_str)
                .unwrap_or("");
            let left = app
                .remaining(toast, now)
                .map(|d| format!("{:>4.1}s", d.as_secs_f32()))
                .unwrap_or_else(|| "  --".to_string());
            let mut lines = vec![Line::from(vec![
                Span::styled("■ ", Style::default().fg(swatch(style_class))),
                Span::styled(format!("[{}] ", left), Style::default().fg(Color::DarkGray)),
                Span::raw(toast.text_content()),
                Span::styled(
                    format!("  {}", toast.id().unwrap_or("")),
                    Style::default().fg(Color::DarkGray),
                ),
            ])];
            if app.show_detail {
                lines.push(Line::from(Span::styled(
                    toast.outer_html().split_whitespace().collect::<Vec<_>>().join(" "),
                    Style::default().fg(Color::Gray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(list, area);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.state {
        AppState::Normal => "q: Quit | i: Write | s: Sample | Tab/1-9: Style | x: Dismiss | h: Host | t: Markup | ?: Help",
        AppState::Input => "Enter: Send | Esc: Cancel | Type your message",
    };

    let status = Paragraph::new(vec![
        Line::from(app.status_message.as_str()),
        Line::from(help_text),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}

fn draw_input_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, f.area());
    let input = Paragraph::new(app.input_buffer.as_str())
        .block(
            Block::default()
                .title(format!("Message [{}]", app.current_style()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(70, 70, f.area());
    let help = "toaster Help\n\nKeys:\n  q / Ctrl-C: Quit\n  i: Write a message, Enter to send, Esc to cancel\n  s: Send a sample toast\n  Tab / Shift-Tab: Next / previous style\n  1-9: Pick a style\n  x: Dismiss the newest toast\n  h: Detach / attach the toast area\n  t: Show rendered markup\n  ?: Toggle this help\n\nToasts are removed automatically once their timer runs out.";

    let paragraph = Paragraph::new(help)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}
