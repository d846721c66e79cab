//! Live progress lines for fetch events

use bulkget_core::FetchEvent;
use console::style;
use human_bytes::human_bytes;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Print each task lifecycle event as it happens.
/// Returns once every event sender is gone.
pub async fn print_events(mut events: broadcast::Receiver<FetchEvent>) {
    loop {
        match events.recv().await {
            Ok(FetchEvent::TaskStarted { url, destination }) => {
                println!(
                    "{} {} {}",
                    style("→").cyan().bold(),
                    style(&destination).bold(),
                    style(format!("({})", url)).dim()
                );
            }
            Ok(FetchEvent::TaskCompleted {
                destination,
                bytes,
                copies,
                ..
            }) => {
                let copies_note = if copies > 0 {
                    format!(" (+{} copies)", copies)
                } else {
                    String::new()
                };
                println!(
                    "{} {} {}{}",
                    style("✓").green().bold(),
                    destination,
                    human_bytes(bytes as f64),
                    copies_note
                );
            }
            Ok(FetchEvent::TaskFailed {
                destination, error, ..
            }) => {
                println!(
                    "{} {} {}",
                    style("✗").red().bold(),
                    destination,
                    style(error).red()
                );
            }
            Err(RecvError::Closed) => break,
            Err(RecvError::Lagged(skipped)) => {
                eprintln!("Progress lagged, {} events skipped", skipped);
            }
        }
    }
}
