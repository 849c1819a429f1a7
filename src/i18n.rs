//! User-facing strings.
//!
//! The core only produces [`ErrorKind`] values and form states; this module
//! turns them into text for the active [`Locale`]. Russian is the default,
//! matching the widget's original audience.

use serde::Deserialize;
use std::fmt;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Locale::Ru),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Looks up a translation key. Unknown keys are returned unchanged.
pub fn t(locale: Locale, key: &str) -> &str {
    let text = match locale {
        Locale::Ru => ru(key),
        Locale::En => en(key),
    };
    text.unwrap_or(key)
}

/// Display text for a classified error.
pub fn error_message(locale: Locale, kind: ErrorKind) -> &'static str {
    let key = kind.translation_key();
    match locale {
        Locale::Ru => ru(key),
        Locale::En => en(key),
    }
    .unwrap_or(key)
}

fn ru(key: &str) -> Option<&'static str> {
    Some(match key {
        "errors.required" => "Не должно быть пустым",
        "errors.url" => "Ссылка должна быть валидным URL",
        "errors.notOneOf" => "RSS уже существует",
        "errors.invalidRss" => "Ресурс не содержит валидный RSS",
        "errors.network" => "Ошибка сети",
        "errors.timeout" => "Превышено время ожидания ответа",
        "success" => "RSS успешно загружен",
        "loading" => "Загрузка...",
        "busy" => "Дождитесь окончания загрузки",
        "feeds" => "Фиды",
        "posts" => "Посты",
        "empty" => "Пока ничего нет",
        "preview" => "Просмотр",
        "unknownPost" => "Нет поста с таким номером",
        "unsafeLink" => "Ссылка не может быть открыта",
        "language" => "Язык",
        "help" => "Команды: <url> | add <url> | read <id> | open <id> | list | lang <ru|en> | help | quit",
        _ => return None,
    })
}

fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        "errors.required" => "Should not be empty",
        "errors.url" => "Invalid URL",
        "errors.notOneOf" => "RSS already exists",
        "errors.invalidRss" => "Resource does not contain valid RSS",
        "errors.network" => "Network error",
        "errors.timeout" => "Request timed out",
        "success" => "RSS successfully loaded",
        "loading" => "Loading...",
        "busy" => "Wait for the current request to finish",
        "feeds" => "Feeds",
        "posts" => "Posts",
        "empty" => "Nothing here yet",
        "preview" => "Preview",
        "unknownPost" => "No post with that number",
        "unsafeLink" => "Link cannot be opened",
        "language" => "Language",
        "help" => "Commands: <url> | add <url> | read <id> | open <id> | list | lang <ru|en> | help | quit",
        _ => return None,
    })
}
