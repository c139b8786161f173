use crate::app::focus::Element;
use crate::app::state::AppState;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

const CONTROLS: [(&str, &str); 9] = [
    ("Tab", "Next element"),
    ("Ctrl+N", "New channel"),
    ("Ctrl+O", "Join channel"),
    ("Ctrl+L", "Leave channel"),
    ("Ctrl+P", "Channel info"),
    ("Ctrl+J", "New line"),
    ("↑/↓", "Switch chat"),
    ("PgUp/Dn", "Scroll feed"),
    ("Ctrl+C", "Quit"),
];

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(" Speakeasy ")
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Theme::border());

    let key = Style::default()
        .fg(Theme::ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let heading = Style::default()
        .fg(Theme::ACCENT_LAVENDER)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::from(Span::styled("Controls", heading))];
    for (k, what) in CONTROLS {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<8}", k), key),
            Span::styled(what, Theme::value()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Channel Info", heading)));
    match state.current_session() {
        Some(session) => {
            let identity = session.identity();
            for (label, value) in [
                ("Name", identity.name.as_str()),
                ("Description", identity.description.as_str()),
                ("ID", identity.reception_id.as_str()),
            ] {
                lines.push(Line::from(vec![
                    Span::styled(format!("{}: ", label), Theme::label()),
                    Span::styled(value.to_string(), Theme::value()),
                ]));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "No channel selected",
            Style::default().fg(Theme::TEXT_MUTED),
        ))),
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

pub fn render_admin_toggle(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus.focused() == Element::AdminToggle;
    let (border_style, border_type, bg) = Theme::panel(focused);
    let block = Block::default()
        .title(" [F6] ")
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .style(bg);

    let (mark, style) = if state.admin_mode {
        ("☑", Theme::admin_text())
    } else {
        ("☐", Theme::label())
    };
    let paragraph = Paragraph::new(Span::styled(format!("{} Send as Admin", mark), style))
        .block(block);
    frame.render_widget(paragraph, area);
}
