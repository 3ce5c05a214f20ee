//! Chat message rendering (Telegram HTML subset).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{InlineKeyboard, Message};
use crate::providers::{DailyPrice, NewsItem};

/// Volume is reported in shares; Taiwan quotes it in lots of 1000
const SHARES_PER_LOT: i64 = 1000;

/// Longest button caption Telegram renders without truncation on mobile
const MAX_BUTTON_CHARS: usize = 40;

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Percentage change against the previous close, if it can be derived
pub fn change_percent(close: Decimal, spread: Decimal) -> Option<Decimal> {
    let previous = close - spread;
    if previous.is_zero() {
        return None;
    }
    Some((spread / previous * dec!(100)).round_dp(2))
}

fn trend_marker(spread: Decimal) -> &'static str {
    if spread.is_sign_positive() && !spread.is_zero() {
        "🔺"
    } else if spread.is_sign_negative() {
        "🔻"
    } else {
        "➖"
    }
}

fn signed(value: Decimal) -> String {
    if value.is_sign_positive() && !value.is_zero() {
        format!("+{}", value.normalize())
    } else {
        value.normalize().to_string()
    }
}

fn change_line(price: &DailyPrice) -> String {
    match change_percent(price.close, price.spread) {
        Some(pct) => format!(
            "{} {} ({}%)",
            trend_marker(price.spread),
            signed(price.spread),
            signed(pct)
        ),
        None => format!("{} {}", trend_marker(price.spread), signed(price.spread)),
    }
}

fn title(code: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{} {}", escape_html(code), escape_html(name)),
        _ => escape_html(code),
    }
}

/// Daily price card for one symbol
pub fn price_summary(code: &str, name: Option<&str>, price: &DailyPrice) -> String {
    format!(
        "<b>{}</b> {}\n\
         Close: <b>{}</b> {}\n\
         Open: {} / High: {} / Low: {}\n\
         Volume: {} lots",
        title(code, name),
        price.date.format("%Y-%m-%d"),
        price.close.normalize(),
        change_line(price),
        price.open.normalize(),
        price.high.normalize(),
        price.low.normalize(),
        price.volume / SHARES_PER_LOT,
    )
}

/// Headline digest with one link button per article
pub fn news_digest(code: &str, name: Option<&str>, news: &[NewsItem], limit: usize) -> Message {
    let shown: Vec<&NewsItem> = news.iter().take(limit).collect();

    let mut text = format!("📰 <b>{}</b> news", title(code, name));
    for (index, item) in shown.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", index + 1, escape_html(&item.title)));
    }

    let keyboard = InlineKeyboard::from_links(
        shown
            .iter()
            .enumerate()
            .map(|(index, item)| (button_caption(index + 1, &item.title), item.link.clone())),
    );

    Message::with_keyboard(text, keyboard)
}

fn button_caption(position: usize, headline: &str) -> String {
    let mut caption: String = headline.chars().take(MAX_BUTTON_CHARS).collect();
    if headline.chars().count() > MAX_BUTTON_CHARS {
        caption.push('…');
    }
    format!("{}. {}", position, caption)
}

/// Index summary broadcast to daily market subscribers
pub fn market_summary(index: &DailyPrice) -> String {
    format!(
        "📊 <b>TAIEX</b> {}\n\
         Close: <b>{}</b> {}\n\
         Open: {} / High: {} / Low: {}\n\
         Turnover: {} NTD (100M)",
        index.date.format("%Y-%m-%d"),
        index.close.normalize(),
        change_line(index),
        index.open.normalize(),
        index.high.normalize(),
        index.low.normalize(),
        (Decimal::from(index.turnover) / dec!(100_000_000)).round_dp(2),
    )
}

/// Ranking of the most traded instruments by volume
///
/// `prices` does not need to be sorted; ties keep upstream order.
pub fn top_volume_table(prices: &[DailyPrice], limit: usize) -> String {
    let mut ranked: Vec<&DailyPrice> = prices.iter().collect();
    ranked.sort_by(|a, b| b.volume.cmp(&a.volume));

    let date = ranked
        .first()
        .map(|p| p.date.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let mut text = format!("🔥 <b>Top {} by volume</b> {}", limit, date);
    for (rank, price) in ranked.into_iter().take(limit).enumerate() {
        text.push_str(&format!(
            "\n{:>2}. {} {} {} ({} lots)",
            rank + 1,
            escape_html(&price.stock_id),
            price.close.normalize(),
            trend_marker(price.spread),
            price.volume / SHARES_PER_LOT,
        ));
    }
    text
}
