//! Popups drawn over the chat screen.
//!
//! Geometry lives in [`dialog_layout`] so that drawing and mouse hit testing
//! agree on where every control sits.

use crate::app::focus::{Element, SubViewKind};
use crate::app::state::{AppState, ErrorInfo, InputState};
use crate::ui::channel_feed::wrap_text;
use crate::ui::input_box::render_text_field;
use crate::ui::layout::{centered, inner};
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

pub struct DialogLayout {
    pub popup: Rect,
    /// Inside the border, above the button row.
    pub body: Rect,
    pub elements: Vec<(Element, Rect)>,
}

impl DialogLayout {
    pub fn rect(&self, element: Element) -> Option<Rect> {
        self.elements
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, r)| *r)
    }
}

fn popup_size(kind: SubViewKind, state: &AppState, screen: Rect) -> (u16, u16) {
    match kind {
        SubViewKind::NewChannelDialog => (60, 12),
        SubViewKind::JoinChannelDialog => (70, 11),
        SubViewKind::LeaveChannelConfirm => (60, 9),
        SubViewKind::ChannelInfoPanel if state.info_expanded => (screen.width, screen.height),
        SubViewKind::ChannelInfoPanel => (70, 14),
        SubViewKind::ErrorDialog => (60, 10),
        SubViewKind::Main => (0, 0),
    }
}

fn button_label(element: Element, kind: SubViewKind, state: &AppState) -> &'static str {
    match element {
        Element::CancelButton => "Cancel",
        Element::SubmitButton if kind == SubViewKind::NewChannelDialog => "New",
        Element::SubmitButton => "Join",
        Element::YesButton => "Yes",
        Element::NoButton => "No",
        Element::ExpandButton if state.info_expanded => "Contract",
        Element::ExpandButton => "Expand",
        Element::CopyButton => "Copy",
        Element::CloseButton => "Close",
        Element::BackButton => "Back",
        _ => "",
    }
}

/// Right-aligned buttons on the last row of `area`.
fn button_row(area: Rect, labels: &[(Element, &str)]) -> Vec<(Element, Rect)> {
    let y = area.bottom().saturating_sub(1);
    let mut x = area.right();
    let mut out = Vec::with_capacity(labels.len());
    for (element, label) in labels.iter().rev() {
        let width = label.len() as u16 + 4;
        x = x.saturating_sub(width).max(area.x);
        out.push((*element, Rect::new(x, y, width.min(area.right() - x), 1)));
        x = x.saturating_sub(1);
    }
    out.reverse();
    out
}

pub fn dialog_layout(kind: SubViewKind, state: &AppState, screen: Rect) -> DialogLayout {
    let (w, h) = popup_size(kind, state, screen);
    let popup = centered(screen, w, h);
    let area = inner(popup);
    let body = Rect::new(area.x, area.y, area.width, area.height.saturating_sub(2));

    let buttons: Vec<Element> = state
        .focus
        .current()
        .elements()
        .iter()
        .copied()
        .filter(|e| !e.is_text_input())
        .collect();
    // Only the active view's focus list is known, so covered dialogs fall
    // back to their fixed button sets.
    let buttons = if state.view_kind() == kind {
        buttons
    } else {
        default_buttons(kind, state)
    };
    let labels: Vec<(Element, &str)> = buttons
        .iter()
        .map(|e| (*e, button_label(*e, kind, state)))
        .collect();
    let mut elements = button_row(area, &labels);

    match kind {
        SubViewKind::NewChannelDialog => {
            let name = Rect::new(area.x, area.y, area.width, 3u16.min(area.height));
            let description = Rect::new(
                area.x,
                area.y.saturating_add(3),
                area.width,
                3u16.min(area.height.saturating_sub(3)),
            );
            elements.insert(0, (Element::DescriptionInput, description));
            elements.insert(0, (Element::NameInput, name));
        }
        SubViewKind::JoinChannelDialog => {
            let field = Rect::new(
                area.x,
                area.y.saturating_add(1),
                area.width,
                6u16.min(area.height.saturating_sub(1)),
            );
            elements.insert(0, (Element::PrettyPrintInput, field));
        }
        _ => {}
    }

    DialogLayout {
        popup,
        body,
        elements,
    }
}

fn default_buttons(kind: SubViewKind, state: &AppState) -> Vec<Element> {
    match kind {
        SubViewKind::NewChannelDialog | SubViewKind::JoinChannelDialog => {
            vec![Element::CancelButton, Element::SubmitButton]
        }
        SubViewKind::LeaveChannelConfirm => vec![Element::YesButton, Element::NoButton],
        SubViewKind::ChannelInfoPanel if state.clipboard_available => vec![
            Element::ExpandButton,
            Element::CopyButton,
            Element::CloseButton,
        ],
        SubViewKind::ChannelInfoPanel => vec![Element::ExpandButton, Element::CloseButton],
        SubViewKind::ErrorDialog => vec![Element::BackButton, Element::CloseButton],
        SubViewKind::Main => Vec::new(),
    }
}

/// Draw every open dialog, outermost first.
pub fn render(frame: &mut Frame, state: &AppState) {
    let mut kinds: Vec<SubViewKind> = state
        .modal_stack
        .iter()
        .skip(1)
        .map(|v| v.kind())
        .collect();
    kinds.push(state.view_kind());

    let mut error_index = 0;
    for kind in kinds {
        let error = if kind == SubViewKind::ErrorDialog {
            error_index += 1;
            state.errors.get(error_index - 1)
        } else {
            None
        };
        render_one(frame, kind, state, error);
    }
}

fn render_one(frame: &mut Frame, kind: SubViewKind, state: &AppState, error: Option<&ErrorInfo>) {
    if !kind.is_dialog() {
        return;
    }
    let active = kind == state.view_kind();
    let layout = dialog_layout(kind, state, frame.area());

    frame.render_widget(Clear, layout.popup);

    let (title, accent) = match kind {
        SubViewKind::NewChannelDialog => (" New Channel ".to_string(), Theme::ACCENT_TEAL),
        SubViewKind::JoinChannelDialog => (" Join Channel ".to_string(), Theme::ACCENT_TEAL),
        SubViewKind::LeaveChannelConfirm => (" Leave Channel ".to_string(), Theme::ACCENT_AMBER),
        SubViewKind::ChannelInfoPanel => (" Channel Info ".to_string(), Theme::ACCENT_LAVENDER),
        SubViewKind::ErrorDialog => (
            format!(" {} ", error.map(|e| e.title.as_str()).unwrap_or("Error")),
            Theme::ACCENT_ROSE,
        ),
        SubViewKind::Main => return,
    };

    let block = Block::default()
        .title(title)
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Style::default().fg(accent))
        .style(Style::default().bg(Theme::BG_SURFACE));
    frame.render_widget(block, layout.popup);

    match kind {
        SubViewKind::NewChannelDialog => {
            for (element, label, input) in [
                (Element::NameInput, "Name", &state.name_input),
                (Element::DescriptionInput, "Description", &state.description_input),
            ] {
                if let Some(rect) = layout.rect(element) {
                    render_field(frame, rect, label, input, state, element, active);
                }
            }
            let hint_y = layout.body.y.saturating_add(6);
            if hint_y < layout.body.bottom() {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        "Both a name and a description are required.",
                        Style::default().fg(Theme::TEXT_MUTED),
                    )),
                    Rect::new(layout.body.x, hint_y, layout.body.width, 1),
                );
            }
        }
        SubViewKind::JoinChannelDialog => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "Paste the channel's pretty print:",
                    Theme::label(),
                )),
                Rect::new(layout.body.x, layout.body.y, layout.body.width, 1),
            );
            if let Some(rect) = layout.rect(Element::PrettyPrintInput) {
                render_wrapped_field(frame, rect, &state.pretty_print_input, state, active);
            }
        }
        SubViewKind::LeaveChannelConfirm => {
            let (name, id) = state
                .leave_target
                .and_then(|h| state.registry.get(h))
                .map(|s| (s.name().to_string(), s.identity().reception_id.clone()))
                .unwrap_or_default();
            let text = vec![
                Line::from("Are you sure you want to leave"),
                Line::from(Span::styled(format!("\"{}\"?", name), Theme::title())),
                Line::from(Span::styled(format!("ID: {}", id), Theme::value())),
            ];
            frame.render_widget(
                Paragraph::new(text).alignment(Alignment::Center),
                layout.body,
            );
        }
        SubViewKind::ChannelInfoPanel => {
            frame.render_widget(
                Paragraph::new(info_lines(state)).wrap(Wrap { trim: false }),
                layout.body,
            );
        }
        SubViewKind::ErrorDialog => {
            let message = error.map(|e| e.message.clone()).unwrap_or_default();
            let text = vec![
                Line::from(Span::styled(message, Theme::error_message())),
                Line::from(""),
                Line::from(Span::styled(
                    "This error is also recorded in the log.",
                    Style::default().fg(Theme::TEXT_MUTED),
                )),
            ];
            frame.render_widget(
                Paragraph::new(text).wrap(Wrap { trim: false }),
                layout.body,
            );
        }
        SubViewKind::Main => {}
    }

    for (element, rect) in &layout.elements {
        if element.is_text_input() {
            continue;
        }
        let focused = active && state.focus.focused() == *element;
        let style = match element {
            Element::YesButton if focused => Theme::button_danger_focused(),
            _ if focused => Theme::button_focused(),
            _ => Theme::button(),
        };
        let label = format!("  {}  ", button_label(*element, kind, state));
        frame.render_widget(Paragraph::new(Span::styled(label, style)), *rect);
    }
}

fn info_lines(state: &AppState) -> Vec<Line<'static>> {
    let Some(session) = state.current_session() else {
        return vec![Line::from(Span::styled(
            "No channel selected",
            Style::default().fg(Theme::TEXT_MUTED),
        ))];
    };
    let identity = session.identity().clone();
    let admin_len = session
        .admin_max_payload_len()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let mut lines: Vec<Line> = [
        ("Name", identity.name),
        ("Description", identity.description),
        ("ID", identity.reception_id),
        ("Max message length", session.max_payload_len().to_string()),
        ("Max admin message length", admin_len),
    ]
    .into_iter()
    .map(|(label, value)| {
        Line::from(vec![
            Span::styled(format!("{}: ", label), Theme::label()),
            Span::styled(value, Theme::value()),
        ])
    })
    .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Pretty print:", Theme::label())));
    lines.push(Line::from(Span::styled(
        identity.pretty_print,
        Style::default().fg(Theme::ACCENT_TEAL),
    )));
    lines
}

fn field_block(title: &str, focused: bool) -> Block<'static> {
    let (border_style, border_type, bg) = Theme::panel(focused);
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .style(bg)
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    input: &InputState,
    state: &AppState,
    element: Element,
    active: bool,
) {
    let focused = active && state.focus.focused() == element;
    let block = field_block(title, focused);
    let field = block.inner(area);
    frame.render_widget(block, area);
    let show_cursor = active && state.focus.cursor_visible(element);
    render_text_field(frame, field, input, show_cursor, Theme::input_text());
}

/// The pretty print is one long token, so it wraps instead of scrolling.
fn render_wrapped_field(
    frame: &mut Frame,
    area: Rect,
    input: &InputState,
    state: &AppState,
    active: bool,
) {
    let focused = active && state.focus.focused() == Element::PrettyPrintInput;
    let block = field_block("Pretty print", focused);
    let field = block.inner(area);
    frame.render_widget(block, area);
    if field.width == 0 || field.height == 0 {
        return;
    }

    let rows = wrap_text(&input.text, field.width as usize);
    let skip = rows.len().saturating_sub(field.height as usize);
    let visible: Vec<Line> = rows
        .iter()
        .skip(skip)
        .map(|r| Line::from(Span::styled(r.clone(), Theme::input_text())))
        .collect();
    frame.render_widget(Paragraph::new(visible), field);

    if active && state.focus.cursor_visible(Element::PrettyPrintInput) {
        // Greedy wrapping makes the prefix wrap the same way as the whole text.
        let before = wrap_text(&input.text[..input.cursor.min(input.text.len())], field.width as usize);
        let row = before.len().saturating_sub(1);
        if row >= skip {
            let col = before.last().map(|r| r.width()).unwrap_or(0);
            let x = field.x + (col as u16).min(field.width - 1);
            let y = field.y + (row - skip) as u16;
            frame.set_cursor_position((x, y.min(field.bottom() - 1)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_row_right_aligned() {
        let area = Rect::new(10, 5, 40, 6);
        let row = button_row(
            area,
            &[(Element::CancelButton, "Cancel"), (Element::SubmitButton, "New")],
        );
        assert_eq!(row[0].0, Element::CancelButton);
        assert_eq!(row[1].1.right(), area.right());
        assert_eq!(row[1].1.width, 7);
        assert_eq!(row[0].1.right() + 1, row[1].1.x);
        assert!(row.iter().all(|(_, r)| r.y == area.bottom() - 1));
    }
}
