use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::focus::{Element, SubView, SubViewKind};
use crate::app::state::*;
use crate::session::RegistryError;
use crate::ui;
use crossterm::event::{
    Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

/// Lines moved by PageUp/PageDown in the feed.
const PAGE_LINES: usize = 10;
/// Lines moved per mouse wheel notch.
const WHEEL_LINES: usize = 3;

pub fn handle_event(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::Terminal(cevent) => {
            state.dirty = true;
            handle_terminal(state, cevent)
        }
        AppEvent::Redraw => {
            state.dirty = true;
            vec![]
        }
        AppEvent::ReplayFinished { restored } => {
            if restored > 0 {
                state.set_status(format!("Rejoined {} channel(s)", restored));
            }
            vec![]
        }
        AppEvent::Tick => {
            state.expire_status();
            vec![]
        }
    }
}

fn handle_terminal(state: &mut AppState, event: CEvent) -> Vec<Action> {
    match event {
        CEvent::Key(key) if key.kind != KeyEventKind::Release => handle_key(state, key),
        CEvent::Mouse(mouse) => handle_mouse(state, mouse),
        CEvent::Resize(w, h) => {
            state.terminal_size = (w, h);
            vec![]
        }
        CEvent::Paste(text) => {
            // Dialog inputs are single line; outside dialogs text goes to the message input.
            let multiline = state.view_kind() == SubViewKind::Main;
            for c in text
                .chars()
                .filter(|&c| !c.is_control() || (multiline && c == '\n'))
            {
                type_char(state, c);
            }
            vec![]
        }
        _ => vec![],
    }
}

/// Registry refused an operation the UI believed valid.
fn registry_fault(err: RegistryError) {
    tracing::error!("registry rejected UI request: {}", err);
    debug_assert!(false, "registry rejected UI request: {}", err);
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keybindings
    if ctrl && key.code == KeyCode::Char('c') {
        return vec![Action::Quit];
    }
    match key.code {
        KeyCode::Tab => {
            state.focus.next_focus();
            return vec![];
        }
        KeyCode::BackTab => {
            state.focus.prev_focus();
            return vec![];
        }
        _ => {}
    }

    match state.view_kind() {
        SubViewKind::Main => handle_main_key(state, key),
        SubViewKind::NewChannelDialog => handle_new_channel_key(state, key),
        SubViewKind::JoinChannelDialog => handle_join_channel_key(state, key),
        SubViewKind::LeaveChannelConfirm => handle_leave_key(state, key),
        SubViewKind::ChannelInfoPanel => handle_info_key(state, key),
        SubViewKind::ErrorDialog => handle_error_key(state, key),
    }
}

fn handle_main_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        match key.code {
            KeyCode::Char('n') => {
                state.open_dialog(SubView::new_channel());
                return vec![];
            }
            KeyCode::Char('o') => {
                state.open_dialog(SubView::join_channel());
                return vec![];
            }
            KeyCode::Char('l') => {
                open_leave(state);
                return vec![];
            }
            KeyCode::Char('p') => {
                open_info(state);
                return vec![];
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::F(3) => {
            state.focus.focus_element(Element::ChatList);
            return vec![];
        }
        KeyCode::F(4) => {
            state.focus.focus_element(Element::ChannelFeed);
            return vec![];
        }
        KeyCode::F(5) => {
            state.focus.focus_element(Element::MessageInput);
            return vec![];
        }
        KeyCode::F(6) => {
            if state.admin_available {
                state.focus.focus_element(Element::AdminToggle);
                toggle_admin(state);
            }
            return vec![];
        }
        KeyCode::PageUp => {
            scroll_feed_up(state, PAGE_LINES);
            return vec![];
        }
        KeyCode::PageDown => {
            state.scroll_feed_down(PAGE_LINES);
            return vec![];
        }
        _ => {}
    }

    match state.focus.focused() {
        Element::ChatList => handle_chat_list_key(state, key),
        Element::ChannelFeed => handle_feed_key(state, key),
        Element::MessageInput => handle_message_input_key(state, key),
        Element::SendButton => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => send_message(state),
            _ => vec![],
        },
        Element::AdminToggle => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                toggle_admin(state);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_chat_list_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Up => {
            if state.registry.select_prev().is_some() {
                state.feed_scroll = 0;
            }
        }
        KeyCode::Down => {
            if state.registry.select_next().is_some() {
                state.feed_scroll = 0;
            }
        }
        KeyCode::Enter => {
            state.focus.focus_element(Element::MessageInput);
        }
        _ => {}
    }
    vec![]
}

fn scroll_feed_up(state: &mut AppState, lines: usize) {
    let max = ui::feed_max_scroll(state);
    state.scroll_feed_up(lines, max);
}

fn handle_feed_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Up => scroll_feed_up(state, 1),
        KeyCode::Down => state.scroll_feed_down(1),
        KeyCode::End => state.feed_scroll = 0,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            // Start typing: switch to input
            state.focus.focus_element(Element::MessageInput);
            type_char(state, c);
        }
        _ => {}
    }
    vec![]
}

fn handle_message_input_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Enter => return send_message(state),
        KeyCode::Backspace => {
            if key.modifiers.contains(KeyModifiers::ALT) {
                state.input.delete_word_back();
            } else {
                state.input.delete_back();
            }
        }
        KeyCode::Delete => state.input.delete_forward(),
        KeyCode::Left => state.input.move_left(),
        KeyCode::Right => state.input.move_right(),
        KeyCode::Home => state.input.move_home(),
        KeyCode::End => state.input.move_end(),
        KeyCode::Up => state.input.history_up(),
        KeyCode::Down => state.input.history_down(),
        KeyCode::Char(c) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                match c {
                    'a' => state.input.move_home(),
                    'e' => state.input.move_end(),
                    'w' => state.input.delete_word_back(),
                    'j' => type_char(state, '\n'),
                    'u' => state.input.clear(),
                    _ => {}
                }
            } else {
                type_char(state, c);
            }
        }
        _ => {}
    }
    vec![]
}

/// Type into the message input, refusing characters past the payload limit.
fn type_char(state: &mut AppState, c: char) {
    if state.view_kind() != SubViewKind::Main {
        if let Some(input) = focused_dialog_input(state) {
            input.insert_char(c);
        }
        return;
    }
    let Some(max) = state.message_limit() else {
        state.set_status("Join or create a channel first (Ctrl+N / Ctrl+O)");
        return;
    };
    if !state.input.insert_char_bounded(c, max) {
        state.set_status(format!("Message limit of {} bytes reached", max));
    }
}

fn send_message(state: &mut AppState) -> Vec<Action> {
    let Some(handle) = state.registry.current_handle() else {
        state.set_status("Join or create a channel first (Ctrl+N / Ctrl+O)");
        return vec![];
    };
    if state.input.text.trim().is_empty() {
        return vec![];
    }
    let text = state.input.take_text();
    state.feed_scroll = 0;
    vec![Action::SendMessage {
        handle,
        text,
        admin: state.admin_mode,
    }]
}

fn toggle_admin(state: &mut AppState) {
    state.admin_mode = !state.admin_mode;
    if state.admin_mode {
        if let Some(max) = state.message_limit() {
            if state.input.text.len() > max {
                state.set_status(format!("Message is longer than the {} byte admin limit", max));
            }
        }
    }
}

fn open_leave(state: &mut AppState) {
    match state.registry.current_handle() {
        Some(handle) => {
            state.leave_target = Some(handle);
            state.open_dialog(SubView::leave_confirm());
        }
        None => state.set_status("No channel to leave"),
    }
}

fn open_info(state: &mut AppState) {
    if state.registry.current_handle().is_some() {
        state.open_dialog(SubView::channel_info(state.clipboard_available));
    } else {
        state.set_status("No channel selected");
    }
}

fn focused_dialog_input(state: &mut AppState) -> Option<&mut InputState> {
    match state.focus.focused() {
        Element::NameInput => Some(&mut state.name_input),
        Element::DescriptionInput => Some(&mut state.description_input),
        Element::PrettyPrintInput => Some(&mut state.pretty_print_input),
        _ => None,
    }
}

/// Editing keys shared by every dialog text field.
fn edit_dialog_input(state: &mut AppState, key: KeyEvent) {
    let Some(input) = focused_dialog_input(state) else {
        return;
    };
    match key.code {
        KeyCode::Backspace => input.delete_back(),
        KeyCode::Delete => input.delete_forward(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            input.delete_word_back()
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => input.clear(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert_char(c),
        _ => {}
    }
}

fn handle_new_channel_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Esc => {
            state.close_dialog();
            vec![]
        }
        KeyCode::Enter => {
            let focused = state.focus.focused();
            activate(state, focused)
        }
        _ => {
            edit_dialog_input(state, key);
            vec![]
        }
    }
}

fn handle_join_channel_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Esc => {
            state.close_dialog();
            vec![]
        }
        KeyCode::Enter => {
            let focused = state.focus.focused();
            activate(state, focused)
        }
        _ => {
            edit_dialog_input(state, key);
            vec![]
        }
    }
}

fn handle_leave_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('n') => {
            state.close_dialog();
            vec![]
        }
        KeyCode::Char('y') => activate(state, Element::YesButton),
        KeyCode::Left | KeyCode::Right => {
            state.focus.next_focus();
            vec![]
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let focused = state.focus.focused();
            activate(state, focused)
        }
        _ => vec![],
    }
}

fn handle_info_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Esc => {
            state.close_dialog();
            vec![]
        }
        KeyCode::Left => {
            state.focus.prev_focus();
            vec![]
        }
        KeyCode::Right => {
            state.focus.next_focus();
            vec![]
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let focused = state.focus.focused();
            activate(state, focused)
        }
        _ => vec![],
    }
}

fn handle_error_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Esc => {
            state.error_back();
            vec![]
        }
        KeyCode::Left | KeyCode::Right => {
            state.focus.next_focus();
            vec![]
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            let focused = state.focus.focused();
            activate(state, focused)
        }
        _ => vec![],
    }
}

/// Press `element` in the active view, as Enter or a click would.
fn activate(state: &mut AppState, element: Element) -> Vec<Action> {
    match (state.view_kind(), element) {
        (SubViewKind::Main, Element::SendButton) => send_message(state),
        (SubViewKind::Main, Element::AdminToggle) => {
            toggle_admin(state);
            vec![]
        }
        (SubViewKind::NewChannelDialog, Element::NameInput) => {
            state.focus.focus_element(Element::DescriptionInput);
            vec![]
        }
        (SubViewKind::NewChannelDialog, Element::DescriptionInput | Element::SubmitButton) => {
            submit_new_channel(state)
        }
        (SubViewKind::JoinChannelDialog, Element::PrettyPrintInput | Element::SubmitButton) => {
            submit_join_channel(state)
        }
        (SubViewKind::LeaveChannelConfirm, Element::YesButton) => {
            match state.leave_target {
                Some(handle) => vec![Action::LeaveChannel { handle }],
                None => {
                    state.close_dialog();
                    vec![]
                }
            }
        }
        (SubViewKind::ChannelInfoPanel, Element::ExpandButton) => {
            state.info_expanded = !state.info_expanded;
            vec![]
        }
        (SubViewKind::ChannelInfoPanel, Element::CopyButton) => match state.current_session() {
            Some(session) => vec![Action::CopyToClipboard {
                text: session.identity().pretty_print.clone(),
            }],
            None => vec![],
        },
        (SubViewKind::ErrorDialog, Element::BackButton) => {
            state.error_back();
            vec![]
        }
        (SubViewKind::ErrorDialog, Element::CloseButton) => {
            state.error_close();
            vec![]
        }
        (_, Element::CancelButton | Element::NoButton | Element::CloseButton) => {
            state.close_dialog();
            vec![]
        }
        _ => vec![],
    }
}

fn submit_new_channel(state: &mut AppState) -> Vec<Action> {
    let name = state.name_input.text.trim().to_string();
    let description = state.description_input.text.trim().to_string();
    if name.is_empty() {
        state.focus.focus_element(Element::NameInput);
        state.set_status("A channel name is required");
        return vec![];
    }
    if description.is_empty() {
        state.focus.focus_element(Element::DescriptionInput);
        state.set_status("A channel description is required");
        return vec![];
    }
    vec![Action::CreateChannel { name, description }]
}

fn submit_join_channel(state: &mut AppState) -> Vec<Action> {
    let pretty_print = state.pretty_print_input.text.trim().to_string();
    if pretty_print.is_empty() {
        state.set_status("Paste a channel pretty print to join");
        return vec![];
    }
    vec![Action::JoinChannel { pretty_print }]
}

fn handle_mouse(state: &mut AppState, mouse: MouseEvent) -> Vec<Action> {
    match mouse.kind {
        MouseEventKind::ScrollUp if state.view_kind() == SubViewKind::Main => {
            scroll_feed_up(state, WHEEL_LINES);
            vec![]
        }
        MouseEventKind::ScrollDown if state.view_kind() == SubViewKind::Main => {
            state.scroll_feed_down(WHEEL_LINES);
            vec![]
        }
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(hit) = ui::hit_test(state, mouse.column, mouse.row) else {
                return vec![];
            };
            if !state.focus.focus_element(hit.element) {
                return vec![];
            }
            match hit.element {
                Element::ChatList => {
                    if let Some(row) = hit.row {
                        match state.registry.select_index(row) {
                            Ok(_) => state.feed_scroll = 0,
                            Err(e) => registry_fault(e),
                        }
                    }
                    vec![]
                }
                e if e.is_text_input() || e == Element::ChannelFeed => vec![],
                e => activate(state, e),
            }
        }
        _ => vec![],
    }
}
