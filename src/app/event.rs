use crossterm::event::Event as CrosstermEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input event
    Terminal(CrosstermEvent),

    /// A session changed and the screen is stale
    Redraw,

    /// Startup replay finished
    ReplayFinished { restored: usize },

    /// Tick for UI refresh
    Tick,
}
