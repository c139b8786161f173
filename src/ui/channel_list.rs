use crate::app::focus::Element;
use crate::app::state::AppState;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem};

/// First visible row so that the selected channel stays on screen.
pub fn list_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return selected;
    }
    (selected + 1).saturating_sub(height)
}

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus.focused() == Element::ChatList;
    let (border_style, border_type, bg) = Theme::panel(focused);

    let block = Block::default()
        .title(" Chats [F3] ")
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .style(bg);

    let rows = state.registry.snapshot();
    let current = state.registry.current_handle();
    let height = block.inner(area).height as usize;
    let selected = rows
        .iter()
        .position(|r| Some(r.handle) == current)
        .unwrap_or(0);
    let offset = list_offset(selected, height);

    let mut items: Vec<ListItem> = rows
        .iter()
        .skip(offset)
        .map(|row| {
            let is_active = Some(row.handle) == current;
            let style = if is_active {
                Theme::channel_active()
            } else if row.unread {
                Theme::channel_unread()
            } else {
                Theme::channel_normal()
            };
            let marker = if row.unread && !is_active {
                Span::styled("● ", Style::default().fg(Theme::ACCENT_AMBER))
            } else {
                Span::raw("  ")
            };
            ListItem::new(Line::from(vec![marker, Span::styled(row.name.clone(), style)]))
        })
        .collect();

    if items.is_empty() {
        items.push(ListItem::new(Span::styled(
            " No channels",
            Style::default().fg(Theme::TEXT_MUTED),
        )));
    }

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_offset_keeps_selection_visible() {
        assert_eq!(list_offset(0, 5), 0);
        assert_eq!(list_offset(4, 5), 0);
        assert_eq!(list_offset(5, 5), 1);
        assert_eq!(list_offset(9, 5), 5);
    }
}
