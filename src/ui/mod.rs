mod channel_feed;
mod channel_list;
mod dialogs;
mod info_box;
mod input_box;
mod layout;
mod status_bar;
mod theme;

pub use channel_feed::max_scroll as feed_max_scroll;
pub use layout::hit_test;

use crate::app::state::AppState;
use ratatui::prelude::*;

pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let app_layout = layout::compute_layout(area, state.admin_available);

    channel_list::render(frame, app_layout.chat_list, state);
    channel_feed::render(frame, app_layout.channel_feed, state);
    input_box::render(frame, app_layout.message_input, state);
    input_box::render_counter(frame, app_layout.counter, state);
    input_box::render_send_button(frame, app_layout.send_button, state);
    info_box::render(frame, app_layout.info_box, state);
    if let Some(toggle) = app_layout.admin_toggle {
        info_box::render_admin_toggle(frame, toggle, state);
    }
    status_bar::render(frame, app_layout.status_bar, state);

    if state.view_kind().is_dialog() {
        dialogs::render(frame, state);
    }
}
