//! Rendering sinks for the two controllers.
//!
//! Controllers never draw anything themselves; they push structured updates through these
//! traits and the host decides how they look.

use crate::{
    display::{LinkRow, StatsReport},
    listing::PageStats,
};

pub trait SubmissionView: Send + Sync {
    /// Busy disables the submit affordance and shows a progress indicator.
    fn set_busy(&self, busy: bool);

    /// Hides both the previous result and the previous error.
    fn clear_outcome(&self);

    fn show_link(&self, link: &LinkRow);

    fn show_error(&self, message: &str);

    /// Empties the input fields after a successful submission.
    fn reset_form(&self);

    fn set_copied(&self, copied: bool);
}

pub trait ListingView: Send + Sync {
    /// Shows the loading indicator and hides any error or empty state.
    fn show_loading(&self);

    fn hide_loading(&self);

    fn show_error(&self, message: &str);

    fn show_empty(&self);

    fn render_rows(&self, rows: &[LinkRow]);

    fn update_stats(&self, stats: &PageStats);

    fn set_nav_enabled(&self, previous: bool, next: bool);
}

pub trait DetailsView: Send + Sync {
    fn show_link(&self, link: &LinkRow);

    fn show_deleted(&self, id: i64);

    fn show_stats(&self, id: i64, stats: &StatsReport);

    fn show_error(&self, message: &str);
}
