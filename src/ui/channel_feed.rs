use crate::app::focus::Element;
use crate::app::state::AppState;
use crate::client::tag::Tag;
use crate::session::{ChannelSession, TranscriptEntry};
use crate::ui::layout;
use crate::ui::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use unicode_width::UnicodeWidthChar;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.focus.focused() == Element::ChannelFeed;
    let (border_style, border_type, bg) = Theme::panel(focused);

    let session = state.current_session();
    let title = match &session {
        Some(s) => format!(" Channel Feed for \"{}\" [F4] ", s.name()),
        None => " Channel Feed [F4] ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .title_style(Theme::title())
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .style(bg);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(session) = session else {
        frame.render_widget(Paragraph::new(welcome_lines()), inner);
        return;
    };

    let lines = feed_lines(state, &session, inner.width);

    let available_height = inner.height as usize;
    let total = lines.len();
    let max_scroll = total.saturating_sub(available_height);
    let scroll = state.feed_scroll.min(max_scroll);

    let end = total - scroll;
    let start = end.saturating_sub(available_height);

    let visible: Vec<Line> = lines.into_iter().skip(start).take(end - start).collect();
    frame.render_widget(Paragraph::new(visible), inner);

    if total > available_height {
        let mut scrollbar_state = ScrollbarState::new(max_scroll).position(start);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("┃")
            .track_symbol(Some("│"))
            .thumb_style(Theme::scrollbar_thumb())
            .track_style(Theme::scrollbar_track());
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}

/// How far the current channel's feed can scroll back at the current
/// terminal size.
pub fn max_scroll(state: &AppState) -> usize {
    let Some(session) = state.current_session() else {
        return 0;
    };
    let (width, height) = state.terminal_size;
    let area = layout::compute_layout(Rect::new(0, 0, width, height), state.admin_available);
    let inner = layout::inner(area.channel_feed);
    feed_lines(state, &session, inner.width)
        .len()
        .saturating_sub(inner.height as usize)
}

/// One column is kept for the scrollbar.
fn feed_lines(state: &AppState, session: &ChannelSession, inner_width: u16) -> Vec<Line<'static>> {
    let width = inner_width.saturating_sub(1) as usize;
    session
        .transcript()
        .iter()
        .flat_map(|entry| format_entry(entry, &state.username, &state.timestamp_format, width))
        .collect()
}

fn welcome_lines() -> Vec<Line<'static>> {
    let key = Style::default()
        .fg(Theme::ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let text = Style::default().fg(Theme::TEXT_SECONDARY);
    vec![
        Line::from(Span::styled(
            "You have not joined any channels yet.",
            Style::default().fg(Theme::TEXT_MUTED),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Ctrl+N ", key),
            Span::styled("Create a new channel", text),
        ]),
        Line::from(vec![
            Span::styled("  Ctrl+O ", key),
            Span::styled("Join a channel from its pretty print", text),
        ]),
    ]
}

/// Lines for one transcript entry, ending with a blank separator.
fn format_entry(
    entry: &TranscriptEntry,
    our_name: &str,
    timestamp_format: &str,
    width: usize,
) -> Vec<Line<'static>> {
    let ts = Span::styled(entry.timestamps(timestamp_format), Theme::timestamp());

    let name = match entry.tag {
        Tag::Admin => Span::styled(entry.display_name().to_string(), Theme::admin_badge()),
        _ if entry.username == our_name => {
            Span::styled(entry.display_name().to_string(), Theme::nick_self())
        }
        _ => Span::styled(entry.display_name().to_string(), Theme::nick_other()),
    };

    let mut header = vec![name];
    if let Some(notice) = entry.notice() {
        header.push(Span::styled(format!(" {}", notice), Theme::notice_text()));
    }
    header.push(Span::raw(" "));
    header.push(ts);

    let mut lines = vec![Line::from(header)];
    if let Some(body) = entry.body() {
        let style = if entry.tag == Tag::Admin {
            Theme::admin_text()
        } else {
            Theme::message_text()
        };
        lines.extend(
            wrap_text(body, width)
                .into_iter()
                .map(|l| Line::from(Span::styled(l, style))),
        );
    }
    lines.push(Line::from(""));
    lines
}

/// Split `text` into rows no wider than `width` columns. Embedded newlines
/// always start a new row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut used = 0;
        for c in paragraph.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(c);
            used += w;
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("ab\ncd", 10), vec!["ab", "cd"]);
        assert_eq!(wrap_text("", 10), vec![""]);
        // wide characters take two columns
        assert_eq!(wrap_text("日本語", 4), vec!["日本", "語"]);
    }

    #[test]
    fn test_format_join_has_no_body() {
        let entry = TranscriptEntry {
            tag: Tag::Join,
            username: "bob".into(),
            sent: Utc::now(),
            received: Utc::now(),
            text: String::new(),
        };
        let lines = format_entry(&entry, "alice", "%H:%M", 40);
        assert_eq!(lines.len(), 2);
        let header: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(header.starts_with("bob has joined the channel."));
    }

    #[test]
    fn test_format_admin_uses_badge() {
        let entry = TranscriptEntry {
            tag: Tag::Admin,
            username: "root".into(),
            sent: Utc::now(),
            received: Utc::now(),
            text: "maintenance".into(),
        };
        let lines = format_entry(&entry, "alice", "%H:%M", 40);
        assert_eq!(lines[0].spans[0].content, "[ADMIN]");
        assert_eq!(lines[0].spans[0].style, Theme::admin_badge());
        assert_eq!(lines[1].spans[0].content, "maintenance");
    }
}
