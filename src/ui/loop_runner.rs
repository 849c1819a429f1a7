//! Main event loop.
//!
//! Multiplexes user input lines, background events (submission results and
//! poll results) and shutdown signals. All state mutation happens here, on
//! one task.

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::input::{handle_command, parse_command};
use super::render::Renderer;
use crate::app::{App, AppEvent};

/// Result of handling a command.
pub enum Action {
    /// Keep processing input and events.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Runs the loop until `quit`, SIGINT or SIGTERM.
///
/// When `input` reaches end of file the loop keeps running, so the program
/// can be used as an unattended watcher (`rsswatch <url>... < /dev/null`).
pub async fn run<R, W>(
    app: &mut App,
    mut event_rx: mpsc::Receiver<AppEvent>,
    input: R,
    renderer: &Renderer,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = async {
            let _ = tokio::signal::ctrl_c().await;
            Some(())
        };

        tokio::select! {
            biased;

            _ = sigterm_fut => {
                tracing::info!("SIGTERM received, leaving event loop");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("SIGINT received, leaving event loop");
                break;
            }

            Some(event) = event_rx.recv() => {
                let changes = app.handle_event(event);
                renderer.render(out, app.state(), app.locale, changes)?;
            }

            line = lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        if let Some(command) = parse_command(&line) {
                            if let Action::Quit = handle_command(app, command, renderer, out)? {
                                break;
                            }
                        }
                    }
                    None => {
                        tracing::debug!("Input closed, continuing to poll until interrupted");
                        input_open = false;
                    }
                }
            }
        }
    }

    Ok(())
}
