use crate::app::focus::{FocusStateMachine, SubView, SubViewKind};
use crate::config::AppConfig;
use crate::session::{ChannelSession, SessionHandle, SessionRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a status bar notice stays up.
const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub struct InputState {
    pub text: String,
    pub cursor: usize,
    pub history: Vec<String>,
    pub history_index: Option<usize>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert `c` unless that would push the text past `max` bytes.
    pub fn insert_char_bounded(&mut self, c: char, max: usize) -> bool {
        if self.text.len() + c.len_utf8() > max {
            return false;
        }
        self.insert_char(c);
        true
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Empty the input, remembering non-blank text in the history.
    pub fn take_text(&mut self) -> String {
        let text = std::mem::take(&mut self.text);
        self.cursor = 0;
        self.history_index = None;
        if !text.trim().is_empty() {
            self.history.push(text.clone());
        }
        text
    }

    /// Put text back after a failed send.
    pub fn restore(&mut self, text: String) {
        self.cursor = text.len();
        self.text = text;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.history_index = None;
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            Some(i) if i > 0 => i - 1,
            Some(_) => return,
            None => self.history.len() - 1,
        };
        self.history_index = Some(idx);
        self.text = self.history[idx].clone();
        self.cursor = self.text.len();
    }

    pub fn history_down(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => {
                let idx = i + 1;
                self.history_index = Some(idx);
                self.text = self.history[idx].clone();
                self.cursor = self.text.len();
            }
            Some(_) => self.clear(),
            None => {}
        }
    }

    pub fn delete_word_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut pos = self.cursor;
        while pos > 0 && self.text.as_bytes().get(pos - 1) == Some(&b' ') {
            pos -= 1;
        }
        while pos > 0 && self.text.as_bytes().get(pos - 1) != Some(&b' ') {
            pos -= 1;
        }
        self.text.drain(pos..self.cursor);
        self.cursor = pos;
    }
}

/// Text shown by an error dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub title: String,
    pub message: String,
}

pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<SessionRegistry>,
    pub username: String,
    pub timestamp_format: String,
    pub admin_available: bool,
    pub clipboard_available: bool,

    pub focus: FocusStateMachine,
    /// Views covered by open dialogs, innermost last.
    pub modal_stack: Vec<SubView>,
    /// One entry per open error dialog, innermost last.
    pub errors: Vec<ErrorInfo>,

    pub input: InputState,
    pub name_input: InputState,
    pub description_input: InputState,
    pub pretty_print_input: InputState,
    pub leave_target: Option<SessionHandle>,
    pub info_expanded: bool,
    pub admin_mode: bool,
    /// Feed lines scrolled up from the newest entry.
    pub feed_scroll: usize,

    pub terminal_size: (u16, u16),
    pub status_message: Option<(String, Instant)>,
    pub should_quit: bool,
    pub dirty: bool,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        registry: Arc<SessionRegistry>,
        admin_available: bool,
        clipboard_available: bool,
    ) -> Self {
        Self {
            username: config.username.clone(),
            timestamp_format: config.ui.timestamp_format.clone(),
            config,
            registry,
            admin_available,
            clipboard_available,
            focus: FocusStateMachine::new(SubView::main(admin_available)),
            modal_stack: Vec::new(),
            errors: Vec::new(),
            input: InputState::new(),
            name_input: InputState::new(),
            description_input: InputState::new(),
            pretty_print_input: InputState::new(),
            leave_target: None,
            info_expanded: false,
            admin_mode: false,
            feed_scroll: 0,
            terminal_size: (80, 24),
            status_message: None,
            should_quit: false,
            dirty: true,
        }
    }

    pub fn current_session(&self) -> Option<Arc<ChannelSession>> {
        self.registry.current()
    }

    /// Body limit for the input box under the current admin setting.
    pub fn message_limit(&self) -> Option<usize> {
        let session = self.current_session()?;
        if self.admin_mode {
            session.admin_max_payload_len()
        } else {
            Some(session.max_payload_len())
        }
    }

    pub fn view_kind(&self) -> SubViewKind {
        self.focus.kind()
    }

    pub fn open_dialog(&mut self, view: SubView) {
        let covered = self.focus.enter(view);
        self.modal_stack.push(covered);
        self.dirty = true;
    }

    /// Close the innermost dialog and restore whatever it covered.
    pub fn close_dialog(&mut self) {
        let Some(covered) = self.modal_stack.pop() else {
            return;
        };
        let closed = self.focus.exit(covered);
        match closed.kind() {
            SubViewKind::NewChannelDialog => {
                self.name_input.clear();
                self.description_input.clear();
            }
            SubViewKind::JoinChannelDialog => self.pretty_print_input.clear(),
            SubViewKind::LeaveChannelConfirm => self.leave_target = None,
            SubViewKind::ChannelInfoPanel => self.info_expanded = false,
            SubViewKind::ErrorDialog => {
                self.errors.pop();
            }
            SubViewKind::Main => {}
        }
        self.dirty = true;
    }

    /// Show an error on top of the current view. The error is logged too.
    pub fn open_error(&mut self, title: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}: {}", title, message);
        self.errors.push(ErrorInfo {
            title: title.to_string(),
            message,
        });
        self.open_dialog(SubView::error());
    }

    /// Back: return to the view the error was raised from.
    pub fn error_back(&mut self) {
        if self.view_kind() == SubViewKind::ErrorDialog {
            self.close_dialog();
        }
    }

    /// Close: also dismiss the dialog the error was raised from.
    pub fn error_close(&mut self) {
        self.error_back();
        if self.view_kind().is_dialog() {
            self.close_dialog();
        }
    }

    #[cfg(test)]
    pub fn current_error(&self) -> Option<&ErrorInfo> {
        self.errors.last()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
        self.dirty = true;
    }

    pub fn expire_status(&mut self) {
        if let Some((_, at)) = &self.status_message {
            if at.elapsed() >= STATUS_TTL {
                self.status_message = None;
                self.dirty = true;
            }
        }
    }

    pub fn status_line(&self) -> String {
        if let Some((message, _)) = &self.status_message {
            return message.clone();
        }
        let count = self.registry.len();
        let mut line = format!("{} | Channels: {}", self.username, count);
        if let Some(session) = self.current_session() {
            let dropped = session.queue().dropped();
            if dropped > 0 {
                line.push_str(&format!(" | Dropped: {}", dropped));
            }
        }
        if self.admin_mode {
            line.push_str(" | ADMIN");
        }
        line
    }

    /// Scroll back towards older entries, no further than `max`.
    pub fn scroll_feed_up(&mut self, lines: usize, max: usize) {
        self.feed_scroll = self.feed_scroll.saturating_add(lines).min(max);
        self.dirty = true;
    }

    pub fn scroll_feed_down(&mut self, lines: usize) {
        self.feed_scroll = self.feed_scroll.saturating_sub(lines);
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::focus::Element;
    use crate::session::RedrawSignal;

    fn state() -> AppState {
        let (redraw, _rx) = RedrawSignal::channel();
        AppState::new(
            AppConfig::default(),
            Arc::new(SessionRegistry::new(redraw)),
            false,
            true,
        )
    }

    #[test]
    fn test_input_editing() {
        let mut input = InputState::new();
        for c in "héllo world".chars() {
            input.insert_char(c);
        }
        input.delete_word_back();
        assert_eq!(input.text, "héllo ");
        input.move_home();
        input.move_right();
        input.move_right();
        input.delete_back();
        assert_eq!(input.text, "hllo ");
        input.delete_forward();
        assert_eq!(input.text, "hlo ");
    }

    #[test]
    fn test_input_bounded() {
        let mut input = InputState::new();
        assert!(input.insert_char_bounded('a', 2));
        assert!(input.insert_char_bounded('b', 2));
        assert!(!input.insert_char_bounded('c', 2));
        assert!(!input.insert_char_bounded('é', 3));
        assert_eq!(input.text, "ab");
    }

    #[test]
    fn test_input_history() {
        let mut input = InputState::new();
        input.restore("first".into());
        input.take_text();
        input.restore("second".into());
        input.take_text();
        input.history_up();
        assert_eq!(input.text, "second");
        input.history_up();
        assert_eq!(input.text, "first");
        input.history_down();
        assert_eq!(input.text, "second");
        input.history_down();
        assert_eq!(input.text, "");
    }

    #[test]
    fn test_dialog_stack_restores_focus() {
        let mut state = state();
        state.focus.focus_element(Element::ChatList);
        state.open_dialog(SubView::new_channel());
        state.name_input.restore("draft".into());
        state.focus.next_focus();
        state.close_dialog();

        assert_eq!(state.view_kind(), SubViewKind::Main);
        assert_eq!(state.focus.focused(), Element::ChatList);
        assert!(state.name_input.text.is_empty());
        assert!(state.modal_stack.is_empty());
    }

    #[test]
    fn test_error_back_and_close() {
        let mut state = state();
        state.open_dialog(SubView::join_channel());
        state.open_error("Failed to join channel", "bad pretty print");
        assert_eq!(state.view_kind(), SubViewKind::ErrorDialog);
        assert_eq!(state.current_error().unwrap().message, "bad pretty print");

        state.error_back();
        assert_eq!(state.view_kind(), SubViewKind::JoinChannelDialog);
        assert!(state.current_error().is_none());

        state.open_error("Failed to join channel", "again");
        state.error_close();
        assert_eq!(state.view_kind(), SubViewKind::Main);
        assert!(state.modal_stack.is_empty());
    }

    #[test]
    fn test_error_close_from_main() {
        let mut state = state();
        state.open_error("Failed to send message", "boom");
        state.error_close();
        assert_eq!(state.view_kind(), SubViewKind::Main);
        assert_eq!(state.focus.focused(), Element::MessageInput);
    }

    #[test]
    fn test_status_line() {
        let mut state = state();
        assert!(state.status_line().contains("Channels: 0"));
        state.set_status("copied");
        assert_eq!(state.status_line(), "copied");
    }
}
