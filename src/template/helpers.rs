//! Built-in template helpers
//!
//! Four helpers are registered with every renderer: `format_date`,
//! `format_time`, `format_currency` and `capitalize`. All of them are
//! lenient to match the engine's best-effort substitution semantics: a
//! missing argument renders as empty string and an unparseable value passes
//! through unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, JsonRender, Output, RenderContext,
};

pub(crate) fn register_helpers(registry: &mut Handlebars<'_>) {
    registry.register_helper("format_date", Box::new(format_date));
    registry.register_helper("format_time", Box::new(format_time));
    registry.register_helper("format_currency", Box::new(format_currency));
    registry.register_helper("capitalize", Box::new(capitalize));
}

/// Long date, e.g. `January 2, 2026`
fn format_date(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = match h.param(0) {
        Some(p) => p.value().render(),
        None => return Ok(()),
    };

    let formatted = parse_date(&raw)
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or(raw);
    out.write(&formatted)?;
    Ok(())
}

/// Short time, e.g. `3:04 PM`
fn format_time(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = match h.param(0) {
        Some(p) => p.value().render(),
        None => return Ok(()),
    };

    let formatted = parse_time(&raw)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or(raw);
    out.write(&formatted)?;
    Ok(())
}

/// Currency with symbol, thousands separators and two decimals,
/// e.g. `$1,234.56`
fn format_currency(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = match h.param(0) {
        Some(p) => p,
        None => return Ok(()),
    };

    let amount = param
        .value()
        .as_f64()
        .or_else(|| param.value().as_str().and_then(|s| s.parse().ok()));

    match amount {
        Some(v) => out.write(&format_currency_value(v))?,
        None => out.write(&param.value().render())?,
    }
    Ok(())
}

/// Uppercase the first code point; empty or absent input yields empty string
fn capitalize(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let raw = match h.param(0) {
        Some(p) => p.value().render(),
        None => return Ok(()),
    };

    let mut chars = raw.chars();
    if let Some(first) = chars.next() {
        out.write(&first.to_uppercase().collect::<String>())?;
        out.write(chars.as_str())?;
    }
    Ok(())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.time());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.time());
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn format_currency_value(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    // A value that rounds to zero gets no sign
    let negative = amount < 0.0 && fixed != "0.00";
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    format!(
        "{}${}.{}",
        if negative { "-" } else { "" },
        int_grouped,
        frac_part
    )
}
