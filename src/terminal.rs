//! Plain-text renderer used by the command line host.

use std::{
    io::{self, Stdout, Write},
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, warn};

use crate::{
    display::{LinkRow, StatsReport},
    listing::PageStats,
    view::{DetailsView, ListingView, SubmissionView},
};

const MAX_ORIGINAL_URL_WIDTH: usize = 60;

pub struct TerminalView<W> {
    out: Mutex<W>,
    previous_enabled: AtomicBool,
    next_enabled: AtomicBool,
}

impl TerminalView<Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            previous_enabled: AtomicBool::new(false),
            next_enabled: AtomicBool::new(false),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the "previous" affordance was last left enabled.
    pub fn can_go_previous(&self) -> bool {
        self.previous_enabled.load(Ordering::Relaxed)
    }

    /// Whether the "next" affordance was last left enabled.
    pub fn can_go_next(&self) -> bool {
        self.next_enabled.load(Ordering::Relaxed)
    }

    pub fn notice(&self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    /// Lists only the navigation commands that are currently enabled.
    pub fn prompt(&self) {
        let mut commands = Vec::with_capacity(4);
        if self.can_go_previous() {
            commands.push("[p]revious");
        }
        if self.can_go_next() {
            commands.push("[n]ext");
        }
        commands.extend(["[r]eload", "[q]uit"]);
        self.write(&format!("{} > ", commands.join("  ")));
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(?err, "Failed to write to terminal");
        }
    }
}

impl<W: Write + Send> SubmissionView for TerminalView<W> {
    fn set_busy(&self, busy: bool) {
        if busy {
            self.write("Shortening...\n");
        }
    }

    fn clear_outcome(&self) {
        debug!("Clearing previous outcome");
    }

    fn show_link(&self, link: &LinkRow) {
        self.write(&link_card(link));
    }

    fn show_error(&self, message: &str) {
        self.write(&format!("Error: {message}\n"));
    }

    fn reset_form(&self) {
        debug!("Resetting input form");
    }

    fn set_copied(&self, copied: bool) {
        if copied {
            self.write("Copied to clipboard\n");
        }
    }
}

impl<W: Write + Send> ListingView for TerminalView<W> {
    fn show_loading(&self) {
        self.write("Loading...\n");
    }

    fn hide_loading(&self) {}

    fn show_error(&self, message: &str) {
        self.write(&format!("Error: {message}\n"));
    }

    fn show_empty(&self) {
        self.write("No links yet.\n");
    }

    fn render_rows(&self, rows: &[LinkRow]) {
        let code_width = rows
            .iter()
            .map(|row| row.short_code.chars().count())
            .max()
            .unwrap_or(0)
            .max("CODE".len());

        let url_width = rows
            .iter()
            .map(|row| row.short_url.chars().count())
            .max()
            .unwrap_or(0)
            .max("SHORT URL".len());

        let mut table = format!(
            "{:<code_width$}  {:>6}  {:<20}  {:<url_width$}  {}\n",
            "CODE", "CLICKS", "CREATED", "SHORT URL", "ORIGINAL URL"
        );
        for row in rows {
            table.push_str(&format!(
                "{:<code_width$}  {:>6}  {:<20}  {:<url_width$}  {}\n",
                row.short_code,
                row.clicks,
                row.created,
                row.short_url,
                truncate(&row.original_url, MAX_ORIGINAL_URL_WIDTH)
            ));
        }
        self.write(&table);
    }

    fn update_stats(&self, stats: &PageStats) {
        self.write(&format!(
            "Showing {} | {} clicks on this page\n",
            stats.range, stats.total_clicks
        ));
    }

    fn set_nav_enabled(&self, previous: bool, next: bool) {
        self.previous_enabled.store(previous, Ordering::Relaxed);
        self.next_enabled.store(next, Ordering::Relaxed);
    }
}

impl<W: Write + Send> DetailsView for TerminalView<W> {
    fn show_link(&self, link: &LinkRow) {
        let mut card = link_card(link);
        card.push_str(&format!("  target:  {}\n", link.original_url));
        self.write(&card);
    }

    fn show_deleted(&self, id: i64) {
        self.write(&format!("Deleted link {id}\n"));
    }

    fn show_stats(&self, id: i64, stats: &StatsReport) {
        let mut report = format!(
            "Stats for link {id}\n  clicks:     {}\n  unique IPs: {}\n",
            stats.total_clicks, stats.unique_ips
        );
        if !stats.clicks_by_date.is_empty() {
            report.push_str("By date:\n");
            for (date, count) in &stats.clicks_by_date {
                report.push_str(&format!("  {date}  {count:>6}\n"));
            }
        }
        if !stats.clicks_by_country.is_empty() {
            report.push_str("By country:\n");
            for (country, count) in &stats.clicks_by_country {
                report.push_str(&format!("  {country:<10}  {count:>6}\n"));
            }
        }
        if !stats.recent_clicks.is_empty() {
            report.push_str("Recent clicks:\n");
            for click in &stats.recent_clicks {
                let location = click.location.as_deref().unwrap_or("-");
                let ip_address = click.ip_address.as_deref().unwrap_or("-");
                report.push_str(&format!("  {}  {location}  {ip_address}\n", click.clicked));
            }
        }
        self.write(&report);
    }

    fn show_error(&self, message: &str) {
        self.write(&format!("Error: {message}\n"));
    }
}

fn link_card(link: &LinkRow) -> String {
    let mut card = format!(
        "Short link: {}\n  id:      {}\n  code:    {}\n  created: {}\n",
        link.short_url, link.id, link.short_code, link.created
    );
    if let Some(expires) = &link.expires {
        card.push_str(&format!("  expires: {expires}\n"));
    }
    card.push_str(&format!("  clicks:  {}\n", link.clicks));
    card
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::display::ClickRow;

    use super::*;

    fn row(code: &str, original_url: &str, clicks: u64) -> LinkRow {
        LinkRow {
            id: 1,
            short_code: code.to_owned(),
            short_url: format!("https://s.example/{code}"),
            original_url: original_url.to_owned(),
            created: "01.01.2024, 00:00:00".to_owned(),
            expires: None,
            clicks,
        }
    }

    fn output(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_show_link_card() {
        let view = TerminalView::new(Vec::new());
        SubmissionView::show_link(&view, &row("abc123", "https://example.com", 0));

        assert_eq!(
            output(view),
            "Short link: https://s.example/abc123\n  id:      1\n  code:    abc123\n  \
             created: 01.01.2024, 00:00:00\n  clicks:  0\n"
        );
    }

    #[test]
    fn test_render_rows_table() {
        let view = TerminalView::new(Vec::new());
        view.render_rows(&[
            row("a", "https://example.com/a", 3),
            row("longcode", "https://example.com/b", 12),
        ]);

        let out = output(view);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("CODE      CLICKS  CREATED"));
        assert!(lines[0].contains("SHORT URL"));
        assert!(lines[1].starts_with("a              3  01.01.2024, 00:00:00"));
        assert!(lines[1].contains("  https://s.example/a         https://example.com/a"));
        assert!(lines[2].ends_with("https://s.example/longcode  https://example.com/b"));
    }

    #[test]
    fn test_details_link_card_shows_target() {
        let view = TerminalView::new(Vec::new());
        DetailsView::show_link(&view, &row("abc123", "https://example.com", 4));

        let out = output(view);
        assert!(out.starts_with("Short link: https://s.example/abc123\n"));
        assert!(out.ends_with("  clicks:  4\n  target:  https://example.com\n"));
    }

    #[test]
    fn test_stats_report() {
        let view = TerminalView::new(Vec::new());
        view.show_stats(
            7,
            &StatsReport {
                total_clicks: 3,
                unique_ips: 2,
                clicks_by_date: vec![("2024-01-02".to_owned(), 3)],
                clicks_by_country: Vec::new(),
                recent_clicks: vec![ClickRow {
                    clicked: "02.01.2024, 11:00:00".to_owned(),
                    location: Some("Berlin, DE".to_owned()),
                    ip_address: None,
                }],
            },
        );

        assert_eq!(
            output(view),
            "Stats for link 7\n  clicks:     3\n  unique IPs: 2\nBy date:\n  2024-01-02       3\n\
             Recent clicks:\n  02.01.2024, 11:00:00  Berlin, DE  -\n"
        );
    }

    #[test]
    fn test_deleted_notice() {
        let view = TerminalView::new(Vec::new());
        view.show_deleted(7);
        assert_eq!(output(view), "Deleted link 7\n");
    }

    #[test]
    fn test_nav_flags_drive_prompt() {
        let view = TerminalView::new(Vec::new());
        view.set_nav_enabled(false, true);
        assert!(!view.can_go_previous());
        assert!(view.can_go_next());

        view.prompt();
        assert_eq!(output(view), "[n]ext  [r]eload  [q]uit > ");
    }

    #[test]
    fn test_stats_line() {
        let view = TerminalView::new(Vec::new());
        view.update_stats(&PageStats {
            range: "21-25".to_owned(),
            total_clicks: 20,
        });
        assert_eq!(output(view), "Showing 21-25 | 20 clicks on this page\n");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
