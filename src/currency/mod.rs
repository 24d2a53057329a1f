//! Currency and date display strings.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::ledger::DisplayedMonth;

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("ARS")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Language used for month and weekday names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Spanish,
    English,
}

/// Locale-aware formatting preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub language: Language,
    pub decimal_separator: char,
    pub grouping_separator: char,
    /// Space between the currency symbol and the digits.
    pub symbol_spacing: bool,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::es_ar()
    }
}

impl LocaleConfig {
    pub const SUPPORTED: [&'static str; 2] = ["es-AR", "en-US"];

    pub fn es_ar() -> Self {
        Self {
            language_tag: "es-AR".into(),
            language: Language::Spanish,
            decimal_separator: ',',
            grouping_separator: '.',
            symbol_spacing: true,
        }
    }

    pub fn en_us() -> Self {
        Self {
            language_tag: "en-US".into(),
            language: Language::English,
            decimal_separator: '.',
            grouping_separator: ',',
            symbol_spacing: false,
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, LedgerError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "es-ar" | "es" => Ok(Self::es_ar()),
            "en-us" | "en" => Ok(Self::en_us()),
            other => Err(LedgerError::Config(format!(
                "unsupported locale `{}` (expected one of {})",
                other,
                Self::SUPPORTED.join(", ")
            ))),
        }
    }
}

pub fn symbol_for(code: &str) -> String {
    match code {
        "ARS" | "USD" | "MXN" | "CLP" => "$".into(),
        "EUR" => "€".into(),
        "GBP" => "£".into(),
        "JPY" => "¥".into(),
        "BRL" => "R$".into(),
        _ => code.into(),
    }
}

pub fn minor_units_for(code: &str) -> u8 {
    match code {
        "JPY" | "CLP" => 0,
        _ => 2,
    }
}

/// Renders `value` with up to `max_fraction` decimals, trailing zeros
/// trimmed, and the locale's separators.
pub fn format_number(locale: &LocaleConfig, value: f64, max_fraction: u8) -> String {
    let rendered = format!("{:.*}", max_fraction as usize, value.abs());
    let (int_part, fraction) = match rendered.split_once('.') {
        Some((int_part, fraction)) => (int_part, fraction.trim_end_matches('0')),
        None => (rendered.as_str(), ""),
    };
    let mut body = group_digits(int_part, locale.grouping_separator);
    if !fraction.is_empty() {
        body.push(locale.decimal_separator);
        body.push_str(fraction);
    }
    if value < 0.0 && body.chars().any(|ch| ch.is_ascii_digit() && ch != '0') {
        body.insert(0, '-');
    }
    body
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

/// `$ 1.250,5` for es-AR, `$1,250.5` for en-US.
pub fn format_currency(amount: f64, code: &CurrencyCode, locale: &LocaleConfig) -> String {
    let precision = minor_units_for(code.as_str());
    let body = format_number(locale, amount.abs(), precision);
    let symbol = symbol_for(code.as_str());
    let sign = if amount < 0.0 && body.chars().any(|ch| ch != '0' && ch.is_ascii_digit()) {
        "-"
    } else {
        ""
    };
    if locale.symbol_spacing {
        format!("{}{} {}", sign, symbol, body)
    } else {
        format!("{}{}{}", sign, symbol, body)
    }
}

/// Day and abbreviated month: `5 feb` or `Feb 5`.
pub fn format_date(locale: &LocaleConfig, date: NaiveDate) -> String {
    match locale.language {
        Language::Spanish => format!("{} {}", date.day(), &month_name(locale.language, date.month())[..3]),
        Language::English => format!("{} {}", &month_name(locale.language, date.month())[..3], date.day()),
    }
}

/// `jueves, 5 de febrero de 2026` or `Thursday, February 5, 2026`.
pub fn format_date_full(locale: &LocaleConfig, date: NaiveDate) -> String {
    let weekday = weekday_name(locale.language, date.weekday());
    let month = month_name(locale.language, date.month());
    match locale.language {
        Language::Spanish => format!("{}, {} de {} de {}", weekday, date.day(), month, date.year()),
        Language::English => format!("{}, {} {}, {}", weekday, month, date.day(), date.year()),
    }
}

/// Calendar header such as `marzo 2024`.
pub fn format_month(locale: &LocaleConfig, month: DisplayedMonth) -> String {
    format!("{} {}", month_name(locale.language, month.month()), month.year())
}

/// Two-letter weekday headers starting on Sunday.
pub fn weekday_headers(locale: &LocaleConfig) -> [&'static str; 7] {
    match locale.language {
        Language::Spanish => ["do", "lu", "ma", "mi", "ju", "vi", "sá"],
        Language::English => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
    }
}

fn month_name(language: Language, month: u32) -> &'static str {
    const SPANISH: [&str; 12] = [
        "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
        "septiembre", "octubre", "noviembre", "diciembre",
    ];
    const ENGLISH: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August",
        "September", "October", "November", "December",
    ];
    let index = (month.clamp(1, 12) - 1) as usize;
    match language {
        Language::Spanish => SPANISH[index],
        Language::English => ENGLISH[index],
    }
}

fn weekday_name(language: Language, weekday: Weekday) -> &'static str {
    let index = weekday.num_days_from_monday() as usize;
    match language {
        Language::Spanish => {
            ["lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo"][index]
        }
        Language::English => [
            "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
        ][index],
    }
}
