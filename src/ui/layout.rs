use crate::app::focus::{Element, SubViewKind};
use crate::app::state::AppState;
use crate::ui::{channel_list, dialogs};
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};

pub struct AppLayout {
    pub chat_list: Rect,
    pub channel_feed: Rect,
    pub info_box: Rect,
    pub admin_toggle: Option<Rect>,
    pub message_input: Rect,
    pub counter: Rect,
    pub send_button: Rect,
    pub status_bar: Rect,
}

pub fn compute_layout(area: Rect, admin: bool) -> AppLayout {
    // Main vertical split: content | status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let content = main_chunks[0];
    let status_bar = main_chunks[1];

    // Horizontal: chat list | feed and input | info column
    let h_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(22),
            Constraint::Min(30),
            Constraint::Length(26),
        ])
        .split(content);

    let chat_list = h_chunks[0];
    let center = h_chunks[1];
    let right = h_chunks[2];

    let center_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Feed
            Constraint::Length(5), // Input row
        ])
        .split(center);

    let channel_feed = center_chunks[0];

    let input_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(10)])
        .split(center_chunks[1]);

    let message_input = input_chunks[0];
    let controls = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(3)])
        .split(input_chunks[1]);

    let (info_box, admin_toggle) = if admin {
        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(right);
        (right_chunks[0], Some(right_chunks[1]))
    } else {
        (right, None)
    };

    AppLayout {
        chat_list,
        channel_feed,
        info_box,
        admin_toggle,
        message_input,
        counter: controls[0],
        send_button: controls[1],
        status_bar,
    }
}

/// Target of a pointer click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub element: Element,
    /// Channel index when the click landed on a chat list row.
    pub row: Option<usize>,
}

impl Hit {
    fn on(element: Element) -> Self {
        Self { element, row: None }
    }
}

/// Find what is drawn at (`column`, `row`) in the active view.
pub fn hit_test(state: &AppState, column: u16, row: u16) -> Option<Hit> {
    let (w, h) = state.terminal_size;
    let screen = Rect::new(0, 0, w, h);
    let pos = Position::new(column, row);

    if state.view_kind() != SubViewKind::Main {
        let dialog = dialogs::dialog_layout(state.view_kind(), state, screen);
        return dialog
            .elements
            .iter()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(element, _)| Hit::on(*element));
    }

    let layout = compute_layout(screen, state.admin_available);
    if layout.chat_list.contains(pos) {
        let inner = inner(layout.chat_list);
        let index = inner.contains(pos).then(|| {
            let offset = channel_list::list_offset(
                state.registry.current_index().unwrap_or(0),
                inner.height as usize,
            );
            offset + (row - inner.y) as usize
        });
        let index = index.filter(|i| *i < state.registry.len());
        return Some(Hit {
            element: Element::ChatList,
            row: index,
        });
    }

    let mut targets = vec![
        (layout.channel_feed, Element::ChannelFeed),
        (layout.message_input, Element::MessageInput),
        (layout.send_button, Element::SendButton),
    ];
    if let Some(admin) = layout.admin_toggle {
        targets.push((admin, Element::AdminToggle));
    }
    targets
        .into_iter()
        .find(|(rect, _)| rect.contains(pos))
        .map(|(_, element)| Hit::on(element))
}

/// Area inside a one-cell border.
pub fn inner(area: Rect) -> Rect {
    Rect::new(
        area.x.saturating_add(1),
        area.y.saturating_add(1),
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

/// A `width` x `height` rectangle centred in `area`, clipped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(2)).max(1);
    let h = height.min(area.height.saturating_sub(2)).max(1);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fills_screen() {
        let area = Rect::new(0, 0, 120, 40);
        let layout = compute_layout(area, false);
        assert_eq!(layout.status_bar.y, 39);
        assert_eq!(layout.chat_list.width, 22);
        assert_eq!(layout.info_box.width, 26);
        assert!(layout.admin_toggle.is_none());
        assert_eq!(layout.message_input.bottom(), 39);
        assert_eq!(layout.send_button.height, 3);
    }

    #[test]
    fn test_layout_admin_toggle() {
        let layout = compute_layout(Rect::new(0, 0, 120, 40), true);
        let toggle = layout.admin_toggle.unwrap();
        assert_eq!(toggle.height, 3);
        assert_eq!(toggle.y, layout.info_box.bottom());
    }

    #[test]
    fn test_centered_clips() {
        let r = centered(Rect::new(0, 0, 40, 10), 60, 20);
        assert!(r.width <= 38 && r.height <= 8);
        let r = centered(Rect::new(0, 0, 100, 50), 60, 20);
        assert_eq!(r, Rect::new(20, 15, 60, 20));
    }
}
