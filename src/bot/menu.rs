// src/bot/menu.rs

//! Localized screens and the button payloads they carry.

use rust_i18n::t;
use std::str::FromStr;
use strum::IntoEnumIterator;

use crate::bot::session::Tool;
use crate::bot::transport::{Button, Keyboard};

/// A selectable interface language.
pub struct Language {
    pub code: &'static str,
    pub label: &'static str,
}

/// The first entry is the fallback.
pub const LANGUAGES: &[Language] = &[
    Language { code: "en", label: "English 🇬🇧" },
    Language { code: "ar", label: "العربية 🇸🇦" },
];

/// Maps a requested language code onto a supported one, falling back to the default.
pub fn resolve_language(code: &str) -> &'static str {
    let code = code.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|l| l.code == code)
        .unwrap_or(&LANGUAGES[0])
        .code
}

const TOOL_SUFFIX: &str = "_tool";
const CHANGE_LANGUAGE: &str = "change_lang";
const SET_LANGUAGE_PREFIX: &str = "set_lang_";

/// What a button press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Tool(Tool),
    ChangeLanguage,
    SetLanguage(String),
}

impl Callback {
    pub fn parse(data: &str) -> Option<Self> {
        if data == CHANGE_LANGUAGE {
            return Some(Callback::ChangeLanguage);
        }
        if let Some(code) = data.strip_prefix(SET_LANGUAGE_PREFIX) {
            return Some(Callback::SetLanguage(code.to_string()));
        }
        data.strip_suffix(TOOL_SUFFIX)
            .and_then(|name| Tool::from_str(name).ok())
            .map(Callback::Tool)
    }

    pub fn data(&self) -> String {
        match self {
            Callback::Tool(tool) => format!("{}{}", tool, TOOL_SUFFIX),
            Callback::ChangeLanguage => CHANGE_LANGUAGE.to_string(),
            Callback::SetLanguage(code) => format!("{}{}", SET_LANGUAGE_PREFIX, code),
        }
    }
}

fn callback_button(label: impl Into<String>, callback: Callback) -> Button {
    Button::Callback {
        label: label.into(),
        data: callback.data(),
    }
}

fn tool_button_label(tool: Tool, lang: &str) -> String {
    match tool {
        Tool::Scan => t!("scan_button", locale = lang),
        Tool::Ip => t!("ip_button", locale = lang),
        Tool::Info => t!("info_button", locale = lang),
        Tool::Ports => t!("ports_button", locale = lang),
    }
    .to_string()
}

/// The welcome text with one button per tool and a language button.
pub fn main_menu(lang: &str) -> (String, Keyboard) {
    let buttons = Tool::iter()
        .map(|tool| callback_button(tool_button_label(tool, lang), Callback::Tool(tool)))
        .chain(std::iter::once(callback_button(
            t!("language_button", locale = lang),
            Callback::ChangeLanguage,
        )));
    (t!("welcome", locale = lang).to_string(), Keyboard::single_column(buttons))
}

pub fn language_picker(lang: &str) -> (String, Keyboard) {
    let buttons = LANGUAGES
        .iter()
        .map(|l| callback_button(l.label, Callback::SetLanguage(l.code.to_string())));
    (t!("language_prompt", locale = lang).to_string(), Keyboard::single_column(buttons))
}

/// The force-subscribe text with a link to the group.
pub fn join_prompt(lang: &str, join_url: &str) -> (String, Keyboard) {
    let button = Button::Url {
        label: t!("join_channel_button", locale = lang).to_string(),
        url: join_url.to_string(),
    };
    (
        t!("force_subscribe_message", locale = lang).to_string(),
        Keyboard::single_column([button]),
    )
}

/// Asks for the argument of `tool`.
pub fn prompt(tool: Tool, lang: &str) -> String {
    match tool {
        Tool::Scan => t!("scan_prompt", locale = lang),
        Tool::Ip => t!("ip_prompt", locale = lang),
        Tool::Info => t!("info_prompt", locale = lang),
        Tool::Ports => t!("ports_prompt", locale = lang),
    }
    .to_string()
}

/// Explains how to call `tool`.
pub fn usage(tool: Tool, lang: &str) -> String {
    match tool {
        Tool::Scan => t!("scan_usage", locale = lang),
        Tool::Ip => t!("ip_usage", locale = lang),
        Tool::Info => t!("info_usage", locale = lang),
        Tool::Ports => t!("ports_usage", locale = lang),
    }
    .to_string()
}
