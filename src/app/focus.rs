//! Modal focus handling.
//!
//! A [`SubView`] is one interactive context: the main chat screen or one of
//! the dialogs drawn over it. It owns the order in which Tab walks its
//! elements and which of them show a text cursor. Exactly one sub-view is
//! active in a [`FocusStateMachine`]; opening a dialog swaps the whole record
//! out and closing it swaps the captured record back in, so focus returns
//! exactly where it was.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubViewKind {
    Main,
    NewChannelDialog,
    JoinChannelDialog,
    LeaveChannelConfirm,
    ChannelInfoPanel,
    ErrorDialog,
}

impl SubViewKind {
    pub fn is_dialog(self) -> bool {
        !matches!(self, SubViewKind::Main)
    }
}

/// A focusable control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    ChatList,
    ChannelFeed,
    MessageInput,
    SendButton,
    AdminToggle,
    NameInput,
    DescriptionInput,
    PrettyPrintInput,
    CancelButton,
    SubmitButton,
    YesButton,
    NoButton,
    ExpandButton,
    CopyButton,
    CloseButton,
    BackButton,
}

impl Element {
    pub fn name(self) -> &'static str {
        match self {
            Element::ChatList => "chat_list",
            Element::ChannelFeed => "channel_feed",
            Element::MessageInput => "message_input",
            Element::SendButton => "send_button",
            Element::AdminToggle => "admin_toggle",
            Element::NameInput => "name_input",
            Element::DescriptionInput => "description_input",
            Element::PrettyPrintInput => "pretty_print_input",
            Element::CancelButton => "cancel_button",
            Element::SubmitButton => "submit_button",
            Element::YesButton => "yes_button",
            Element::NoButton => "no_button",
            Element::ExpandButton => "expand_button",
            Element::CopyButton => "copy_button",
            Element::CloseButton => "close_button",
            Element::BackButton => "back_button",
        }
    }

    pub fn is_text_input(self) -> bool {
        matches!(
            self,
            Element::MessageInput
                | Element::NameInput
                | Element::DescriptionInput
                | Element::PrettyPrintInput
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubView {
    kind: SubViewKind,
    active: usize,
    focus_list: Vec<Element>,
    cursor_set: HashSet<Element>,
}

impl SubView {
    fn build(kind: SubViewKind, focus_list: Vec<Element>, start: Element) -> Self {
        let cursor_set = focus_list
            .iter()
            .copied()
            .filter(|e| e.is_text_input())
            .collect();
        let active = focus_list.iter().position(|e| *e == start).unwrap_or(0);
        Self {
            kind,
            active,
            focus_list,
            cursor_set,
        }
    }

    /// The chat screen. The admin toggle only takes focus when an admin key
    /// is configured.
    pub fn main(admin: bool) -> Self {
        let mut list = vec![
            Element::ChatList,
            Element::ChannelFeed,
            Element::MessageInput,
            Element::SendButton,
        ];
        if admin {
            list.push(Element::AdminToggle);
        }
        Self::build(SubViewKind::Main, list, Element::MessageInput)
    }

    pub fn new_channel() -> Self {
        Self::build(
            SubViewKind::NewChannelDialog,
            vec![
                Element::NameInput,
                Element::DescriptionInput,
                Element::CancelButton,
                Element::SubmitButton,
            ],
            Element::NameInput,
        )
    }

    pub fn join_channel() -> Self {
        Self::build(
            SubViewKind::JoinChannelDialog,
            vec![
                Element::PrettyPrintInput,
                Element::CancelButton,
                Element::SubmitButton,
            ],
            Element::PrettyPrintInput,
        )
    }

    /// Starts on `No` so a stray Enter does not leave the channel.
    pub fn leave_confirm() -> Self {
        Self::build(
            SubViewKind::LeaveChannelConfirm,
            vec![Element::YesButton, Element::NoButton],
            Element::NoButton,
        )
    }

    /// The Copy button only exists when a clipboard is available.
    pub fn channel_info(clipboard: bool) -> Self {
        let mut list = vec![Element::ExpandButton];
        if clipboard {
            list.push(Element::CopyButton);
        }
        list.push(Element::CloseButton);
        Self::build(SubViewKind::ChannelInfoPanel, list, Element::CloseButton)
    }

    pub fn error() -> Self {
        Self::build(
            SubViewKind::ErrorDialog,
            vec![Element::BackButton, Element::CloseButton],
            Element::CloseButton,
        )
    }

    pub fn kind(&self) -> SubViewKind {
        self.kind
    }

    pub fn focused(&self) -> Element {
        self.focus_list[self.active]
    }

    pub fn elements(&self) -> &[Element] {
        &self.focus_list
    }

    pub fn contains(&self, element: Element) -> bool {
        self.focus_list.contains(&element)
    }
}

/// Holds the active [`SubView`].
#[derive(Debug)]
pub struct FocusStateMachine {
    current: SubView,
}

impl FocusStateMachine {
    pub fn new(initial: SubView) -> Self {
        Self { current: initial }
    }

    /// Make `view` active and hand back the one it replaced.
    pub fn enter(&mut self, view: SubView) -> SubView {
        let previous = std::mem::replace(&mut self.current, view);
        tracing::trace!(from = ?previous.kind, to = ?self.current.kind, "enter sub-view");
        previous
    }

    /// Restore a record captured by [`enter`](Self::enter), returning the one
    /// that was active.
    pub fn exit(&mut self, to: SubView) -> SubView {
        let left = std::mem::replace(&mut self.current, to);
        tracing::trace!(from = ?left.kind, to = ?self.current.kind, "exit sub-view");
        left
    }

    pub fn next_focus(&mut self) -> Element {
        let len = self.current.focus_list.len();
        self.current.active = (self.current.active + 1) % len;
        self.current.focused()
    }

    pub fn prev_focus(&mut self) -> Element {
        let len = self.current.focus_list.len();
        self.current.active = (self.current.active + len - 1) % len;
        self.current.focused()
    }

    /// Focus `element` if the active view has it.
    pub fn focus_element(&mut self, element: Element) -> bool {
        match self.current.focus_list.iter().position(|e| *e == element) {
            Some(index) => {
                self.current.active = index;
                true
            }
            None => false,
        }
    }

    /// Whether the text cursor belongs in `element` right now.
    pub fn cursor_visible(&self, element: Element) -> bool {
        self.current.focused() == element && self.current.cursor_set.contains(&element)
    }

    pub fn focused(&self) -> Element {
        self.current.focused()
    }

    pub fn kind(&self) -> SubViewKind {
        self.current.kind
    }

    pub fn current(&self) -> &SubView {
        &self.current
    }
}
