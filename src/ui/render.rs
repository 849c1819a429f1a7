//! Text rendering of the application state.
//!
//! Only the regions flagged in [`Changes`] are redrawn. Feed-supplied text is
//! sanitized before it reaches the terminal, and styling is applied only when
//! stdout is a terminal.

use crossterm::style::{style, Stylize};
use std::io::{self, IsTerminal, Write};

use crate::i18n::{error_message, t, Locale};
use crate::state::{AppState, Changes, Post, Process};
use crate::util::{sanitize_line, truncate_to_width};

const DEFAULT_WIDTH: usize = 80;

/// How a piece of text is emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    /// Unviewed post titles.
    Strong,
    /// Viewed post titles.
    Dim,
    Success,
    Error,
}

pub struct Renderer {
    styled: bool,
    width: usize,
}

impl Renderer {
    /// Renderer for the process stdout.
    pub fn for_stdout() -> Self {
        let width = crossterm::terminal::size()
            .map(|(w, _)| usize::from(w))
            .unwrap_or(DEFAULT_WIDTH);
        Self {
            styled: io::stdout().is_terminal(),
            width: width.max(20),
        }
    }

    /// Unstyled renderer with a fixed width.
    pub fn plain(width: usize) -> Self {
        Self {
            styled: false,
            width,
        }
    }

    pub fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.styled {
            return text.to_string();
        }
        match tone {
            Tone::Plain => text.to_string(),
            Tone::Heading => style(text).bold().underlined().to_string(),
            Tone::Strong => style(text).bold().to_string(),
            Tone::Dim => style(text).dim().to_string(),
            Tone::Success => style(text).green().to_string(),
            Tone::Error => style(text).red().to_string(),
        }
    }

    /// Redraws the regions in `changes`.
    pub fn render(
        &self,
        out: &mut impl Write,
        state: &AppState,
        locale: Locale,
        changes: Changes,
    ) -> io::Result<()> {
        if changes.form {
            self.render_form(out, state, locale)?;
        }
        if changes.feeds {
            self.render_feeds(out, state, locale)?;
        }
        if changes.posts || changes.viewed {
            self.render_posts(out, state, locale)?;
        }
        out.flush()
    }

    /// Redraws every region.
    pub fn render_all(&self, out: &mut impl Write, state: &AppState, locale: Locale) -> io::Result<()> {
        self.render(
            out,
            state,
            locale,
            Changes::FEEDS | Changes::POSTS | Changes::FORM,
        )
    }

    pub fn message(&self, out: &mut impl Write, text: &str, tone: Tone) -> io::Result<()> {
        writeln!(out, "{}", self.paint(text, tone))?;
        out.flush()
    }

    /// Full title, description and link of one post.
    pub fn preview(&self, out: &mut impl Write, post: &Post, locale: Locale) -> io::Result<()> {
        writeln!(out, "{}", self.paint(t(locale, "preview"), Tone::Heading))?;
        writeln!(out, "{}", self.paint(&sanitize_line(&post.title), Tone::Strong))?;
        let description = sanitize_line(&post.description);
        if !description.is_empty() {
            writeln!(out, "{description}")?;
        }
        writeln!(out, "{}", sanitize_line(&post.link))?;
        out.flush()
    }

    fn render_form(&self, out: &mut impl Write, state: &AppState, locale: Locale) -> io::Result<()> {
        let form = state.form();
        match (form.process, form.error) {
            (Process::Sending, _) => writeln!(out, "{}", t(locale, "loading")),
            (Process::Success, _) => {
                writeln!(out, "{}", self.paint(t(locale, "success"), Tone::Success))
            }
            (Process::Error, Some(kind)) => {
                writeln!(out, "{}", self.paint(error_message(locale, kind), Tone::Error))
            }
            (Process::Error, None) | (Process::Filling, _) => Ok(()),
        }
    }

    fn render_feeds(&self, out: &mut impl Write, state: &AppState, locale: Locale) -> io::Result<()> {
        writeln!(out, "{}", self.paint(t(locale, "feeds"), Tone::Heading))?;
        if state.feeds().is_empty() {
            return writeln!(out, "  {}", t(locale, "empty"));
        }
        for feed in state.feeds() {
            let title = sanitize_line(&feed.title);
            let description = sanitize_line(&feed.description);
            let line = if description.is_empty() {
                title.into_owned()
            } else {
                format!("{title} - {description}")
            };
            let line = truncate_to_width(&line, self.width.saturating_sub(2));
            writeln!(out, "  {}", self.paint(&line, Tone::Plain))?;
        }
        Ok(())
    }

    fn render_posts(&self, out: &mut impl Write, state: &AppState, locale: Locale) -> io::Result<()> {
        writeln!(out, "{}", self.paint(t(locale, "posts"), Tone::Heading))?;
        if state.posts().is_empty() {
            return writeln!(out, "  {}", t(locale, "empty"));
        }
        for post in state.posts() {
            let label = format!("  [{}] ", post.id);
            let title = sanitize_line(&post.title);
            let title = truncate_to_width(&title, self.width.saturating_sub(label.len()));
            let tone = if state.is_viewed(post.id) {
                Tone::Dim
            } else {
                Tone::Strong
            };
            writeln!(out, "{label}{}", self.paint(&title, tone))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parse_feed;
    use crate::state::Submission;
    use crate::error::ErrorKind;

    const URL: &str = "https://example.com/rss.xml";
    const DOC: &str = r#"<rss><channel>
  <title>Тестовый фид</title>
  <description>Тестовое описание</description>
  <item><title>Тестовый пост</title><link>https://example.com/test</link><description>Текст</description></item>
</channel></rss>"#;

    fn loaded_state() -> AppState {
        let mut state = AppState::new();
        let (submission, _) = state.begin_submit(URL);
        assert!(matches!(submission, Submission::Accepted(_)));
        state.complete_submit(URL, parse_feed(URL, DOC).unwrap());
        state
    }

    fn render(state: &AppState, locale: Locale, changes: Changes) -> String {
        let mut out = Vec::new();
        Renderer::plain(80)
            .render(&mut out, state, locale, changes)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_only_dirty_regions_drawn() {
        let state = loaded_state();
        let text = render(&state, Locale::Ru, Changes::FORM);
        assert_eq!(text, "RSS успешно загружен\n");

        assert!(render(&state, Locale::Ru, Changes::NONE).is_empty());
    }

    #[test]
    fn test_feeds_and_posts() {
        let state = loaded_state();
        let text = render(&state, Locale::En, Changes::FEEDS | Changes::POSTS);
        let post_id = state.posts()[0].id;
        assert_eq!(
            text,
            format!("Feeds\n  Тестовый фид - Тестовое описание\nPosts\n  [{post_id}] Тестовый пост\n")
        );
    }

    #[test]
    fn test_error_feedback() {
        let mut state = AppState::new();
        state.begin_submit("не-ссылка");
        assert_eq!(state.form().error, Some(ErrorKind::InvalidUrl));
        let text = render(&state, Locale::Ru, Changes::FORM);
        assert_eq!(text, "Ссылка должна быть валидным URL\n");
    }

    #[test]
    fn test_empty_lists() {
        let state = AppState::new();
        let text = render(&state, Locale::En, Changes::FEEDS | Changes::POSTS);
        assert_eq!(text, "Feeds\n  Nothing here yet\nPosts\n  Nothing here yet\n");
    }

    #[test]
    fn test_feed_text_is_sanitized() {
        let mut state = AppState::new();
        state.begin_submit(URL);
        let doc = "<rss><channel><title>Evil\u{1b}[2J title</title></channel></rss>";
        state.complete_submit(URL, parse_feed(URL, doc).unwrap());

        let text = render(&state, Locale::En, Changes::FEEDS);
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("Evil title"));
    }

    #[test]
    fn test_styled_titles_reflect_viewed() {
        let mut state = loaded_state();
        let renderer = Renderer {
            styled: true,
            width: 80,
        };
        let id = state.posts()[0].id;

        let mut before = Vec::new();
        renderer.render(&mut before, &state, Locale::En, Changes::POSTS).unwrap();
        state.mark_viewed(id);
        let mut after = Vec::new();
        renderer.render(&mut after, &state, Locale::En, Changes::VIEWED).unwrap();

        let bold = renderer.paint("Тестовый пост", Tone::Strong);
        let dim = renderer.paint("Тестовый пост", Tone::Dim);
        assert!(String::from_utf8(before).unwrap().contains(&bold));
        assert!(String::from_utf8(after).unwrap().contains(&dim));
    }

    #[test]
    fn test_preview() {
        let state = loaded_state();
        let mut out = Vec::new();
        Renderer::plain(80)
            .preview(&mut out, &state.posts()[0], Locale::En)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Preview\nТестовый пост\nТекст\nhttps://example.com/test\n"
        );
    }
}
