use crate::app::focus::Element;
use crate::app::state::{AppState, InputState};
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::block::Padding;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus.focused() == Element::MessageInput;
    let (border_style, border_type, bg) = Theme::panel(focused);

    let sender = if state.admin_mode {
        "ADMIN"
    } else {
        state.username.as_str()
    };
    let title = format!(" Sending Message as \"{}\" [F5] ", sender);

    let block = Block::default()
        .title(title)
        .title_style(if focused {
            Theme::title()
        } else {
            Theme::border()
        })
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .padding(Padding::horizontal(1))
        .style(bg);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    render_text_field(
        frame,
        inner,
        &state.input,
        state.focus.cursor_visible(Element::MessageInput),
        Theme::input_text(),
    );
}

/// "used/max" counter shown beside the input.
pub fn render_counter(frame: &mut Frame, area: Rect, state: &AppState) {
    let (text, style) = match state.message_limit() {
        Some(max) => {
            let used = state.input.text.len();
            let style = if used >= max {
                Theme::counter_full()
            } else {
                Theme::counter()
            };
            (format!("{}/{}", used, max), style)
        }
        None => ("-/-".to_string(), Theme::counter()),
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(text, style)))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

pub fn render_send_button(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus.focused() == Element::SendButton;
    render_button(frame, area, "Send", focused);
}

/// A bordered one-word button.
pub fn render_button(frame: &mut Frame, area: Rect, label: &str, focused: bool) {
    let (border_style, border_type, _) = Theme::panel(focused);
    let style = if focused {
        Theme::button_focused()
    } else {
        Theme::button()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);
    let paragraph = Paragraph::new(Span::styled(label.to_string(), style))
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Draw editable text, scrolled so the cursor stays inside `area`.
pub fn render_text_field(
    frame: &mut Frame,
    area: Rect,
    input: &InputState,
    show_cursor: bool,
    style: Style,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let (row, col) = cursor_offset(input);
    let v_scroll = row.saturating_sub(area.height as usize - 1);
    let h_scroll = (col + 1).saturating_sub(area.width as usize);

    let paragraph = Paragraph::new(input.text.as_str())
        .style(style)
        .scroll((v_scroll as u16, h_scroll as u16));
    frame.render_widget(paragraph, area);

    if show_cursor {
        let x = area.x + (col - h_scroll) as u16;
        let y = area.y + (row - v_scroll) as u16;
        frame.set_cursor_position((x.min(area.right() - 1), y.min(area.bottom() - 1)));
    }
}

/// Row and display column of the cursor.
fn cursor_offset(input: &InputState) -> (usize, usize) {
    let before = &input.text[..input.cursor.min(input.text.len())];
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (row, before[line_start..].width())
}
