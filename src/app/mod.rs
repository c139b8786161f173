//! Core application logic: focus handling, state management, event handling, and action dispatch.

pub mod action;
pub mod event;
pub mod focus;
pub mod handler;
pub mod state;
