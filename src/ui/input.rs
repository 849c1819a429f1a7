//! Command parsing and dispatch for line input.

use std::io::{self, Write};

use super::loop_runner::Action;
use super::render::{Renderer, Tone};
use crate::app::{App, Command};
use crate::i18n::{t, Locale};
use crate::state::{Changes, PostId};
use crate::util::validate_url_for_open;

/// Parses one input line.
///
/// Returns `None` for blank lines. Anything that is not a recognized command
/// is treated as a URL submission, so invalid input reaches validation and is
/// reported like any other bad URL.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match (word.to_ascii_lowercase().as_str(), rest) {
        ("quit" | "exit" | "q", "") => Command::Quit,
        ("list" | "ls", "") => Command::List,
        ("help" | "?", "") => Command::Help,
        ("add", url) => Command::Submit(url.to_string()),
        ("read", id) => match id.parse::<PostId>() {
            Ok(id) => Command::Read(id),
            Err(_) => Command::Submit(line.to_string()),
        },
        ("open", id) => match id.parse::<PostId>() {
            Ok(id) => Command::Open(id),
            Err(_) => Command::Submit(line.to_string()),
        },
        ("lang", code) => match Locale::from_code(code) {
            Some(locale) => Command::Language(locale),
            None => Command::Help,
        },
        _ => Command::Submit(line.to_string()),
    };
    Some(command)
}

/// Applies a command to the app and draws the result.
pub fn handle_command(
    app: &mut App,
    command: Command,
    renderer: &Renderer,
    out: &mut impl Write,
) -> io::Result<Action> {
    let locale = app.locale;
    match command {
        Command::Quit => return Ok(Action::Quit),
        Command::Help => renderer.message(out, t(locale, "help"), Tone::Plain)?,
        Command::List => renderer.render_all(out, app.state(), locale)?,
        Command::Language(locale) => {
            app.locale = locale;
            tracing::debug!(locale = %locale, "Language changed");
            renderer.message(
                out,
                &format!("{}: {}", t(locale, "language"), locale),
                Tone::Plain,
            )?;
            renderer.render(out, app.state(), locale, Changes::FORM)?;
        }
        Command::Submit(input) => {
            let changes = app.submit(&input);
            if changes.is_empty() {
                renderer.message(out, t(locale, "busy"), Tone::Error)?;
            } else {
                renderer.render(out, app.state(), locale, changes)?;
            }
        }
        Command::Read(id) => {
            let Some(post) = app.state().post(id).cloned() else {
                return unknown_post(renderer, out, locale);
            };
            let changes = app.mark_viewed(id);
            renderer.preview(out, &post, locale)?;
            renderer.render(out, app.state(), locale, changes)?;
        }
        Command::Open(id) => {
            let Some(link) = app.state().post(id).map(|p| p.link.clone()) else {
                return unknown_post(renderer, out, locale);
            };
            let changes = app.mark_viewed(id);
            match validate_url_for_open(&link) {
                Ok(url) => {
                    if let Err(e) = open::that_detached(url.as_str()) {
                        tracing::warn!(link = %url, error = %e, "Failed to open browser");
                        renderer.message(out, &url.to_string(), Tone::Plain)?;
                    }
                }
                Err(e) => {
                    tracing::warn!(link = %link, error = %e, "Refusing to open link");
                    renderer.message(out, t(locale, "unsafeLink"), Tone::Error)?;
                }
            }
            renderer.render(out, app.state(), locale, changes)?;
        }
    }
    Ok(Action::Continue)
}

fn unknown_post(renderer: &Renderer, out: &mut impl Write, locale: Locale) -> io::Result<Action> {
    renderer.message(out, t(locale, "unknownPost"), Tone::Error)?;
    Ok(Action::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_ignored() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("   \t"), None);
    }

    #[test]
    fn test_bare_input_is_submission() {
        assert_eq!(
            parse_command(" https://example.com/rss.xml "),
            Some(Command::Submit("https://example.com/rss.xml".to_string()))
        );
        assert_eq!(
            parse_command("не-ссылка"),
            Some(Command::Submit("не-ссылка".to_string()))
        );
    }

    #[test]
    fn test_add_command() {
        assert_eq!(
            parse_command("add https://example.com/rss.xml"),
            Some(Command::Submit("https://example.com/rss.xml".to_string()))
        );
        assert_eq!(parse_command("add"), Some(Command::Submit(String::new())));
    }

    #[test]
    fn test_post_commands() {
        let id: PostId = "42".parse().unwrap();
        assert_eq!(parse_command("read 42"), Some(Command::Read(id)));
        assert_eq!(parse_command("OPEN #42"), Some(Command::Open(id)));
        assert_eq!(
            parse_command("read later"),
            Some(Command::Submit("read later".to_string()))
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("ls"), Some(Command::List));
        assert_eq!(parse_command("help"), Some(Command::Help));
        assert_eq!(parse_command("lang en"), Some(Command::Language(Locale::En)));
        assert_eq!(parse_command("lang xx"), Some(Command::Help));
    }
}
