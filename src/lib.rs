pub mod api;
pub mod clipboard;
pub mod config;
pub mod details;
pub mod display;
pub mod listing;
pub mod outcome;
pub mod submission;
pub mod terminal;
pub mod transport;
pub mod view;

#[cfg(test)]
mod testing;
