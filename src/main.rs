use std::{io::Stdout, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

use shortdeck::{
    api::CreateLinkRequest,
    config::{self, display_offset_capsule, page_size_capsule},
    details::DetailsController,
    listing::ListingController,
    outcome::RequestOutcome,
    submission::SubmissionController,
    terminal::TerminalView,
    transport::{Transport, transport_capsule},
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a short link for URL
    Shorten {
        url: String,
        /// Requested short code; validated by the server
        #[arg(short, long, default_value = "")]
        custom_code: String,
        /// Expiry as an RFC 3339 timestamp
        #[arg(long, value_parser = parse_timestamp)]
        expires_at: Option<OffsetDateTime>,
        /// Copy the short link to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Show the first page of links
    List,
    /// Page through links interactively
    Browse,
    /// Show a single link by id
    Show { id: i64 },
    /// Delete a link by id
    Delete { id: i64 },
    /// Show click statistics for a link
    Stats { id: i64 },
}

fn exit_code<T>(outcome: &RequestOutcome<T>) -> ExitCode {
    if outcome.failure().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let container = config::init_container();
    let (transport, page_size, display_offset) = container.read((
        transport_capsule,
        page_size_capsule,
        display_offset_capsule,
    ));
    let view = Arc::new(TerminalView::stdout());

    match cli.command {
        Command::Shorten {
            url,
            custom_code,
            expires_at,
            copy,
        } => {
            let request =
                CreateLinkRequest::new(url, Some(custom_code.as_str())).with_expiry(expires_at);
            shorten(transport, view, display_offset, request, copy).await
        }
        Command::List => {
            let mut listing = ListingController::new(transport, view, page_size)
                .with_display_offset(display_offset);
            Ok(exit_code(&listing.activate().await))
        }
        Command::Browse => {
            let listing = ListingController::new(transport, Arc::<TerminalView<_>>::clone(&view), page_size)
                .with_display_offset(display_offset);
            browse(listing, &view).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { id } => {
            let details =
                DetailsController::new(transport, view).with_display_offset(display_offset);
            Ok(exit_code(&details.show(id).await))
        }
        Command::Delete { id } => {
            let details = DetailsController::new(transport, view);
            Ok(exit_code(&details.delete(id).await))
        }
        Command::Stats { id } => {
            let details =
                DetailsController::new(transport, view).with_display_offset(display_offset);
            Ok(exit_code(&details.stats(id).await))
        }
    }
}

#[instrument(skip(transport, view))]
async fn shorten(
    transport: Arc<dyn Transport>,
    view: Arc<TerminalView<Stdout>>,
    display_offset: UtcOffset,
    request: CreateLinkRequest,
    copy: bool,
) -> anyhow::Result<ExitCode> {
    let mut submission =
        SubmissionController::new(transport, view).with_display_offset(display_offset);

    if submission.submit_request(request).await.failure().is_some() {
        return Ok(ExitCode::FAILURE);
    }

    if copy {
        if let Some(acknowledgement) = submission.copy_short_url() {
            acknowledgement.await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn browse(
    mut listing: ListingController,
    view: &TerminalView<Stdout>,
) -> anyhow::Result<()> {
    listing.activate().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        view.prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "n" if view.can_go_next() => {
                listing.next_page().await;
            }
            "p" if view.can_go_previous() => {
                listing.previous_page().await;
            }
            "n" | "p" => view.notice("No page in that direction"),
            "r" => {
                listing.reload().await;
            }
            "q" => break,
            "" => {}
            other => view.notice(&format!("Unknown command: {other}")),
        }
    }

    info!(cursor = ?listing.cursor(), "Leaving browser");
    Ok(())
}
