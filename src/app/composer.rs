//! Message composition for deal posts.
//!
//! Pure functions producing both a plain-text fallback and a MarkdownV2
//! body. The two forms convey the same information - transports may
//! display either. All user-derived strings are escaped before they land
//! in the markup; pre-joined price strings are treated as opaque display
//! values and wrapped in code spans.

use crate::domain::{Candidate, Category, DiscountOffer, FreeOffer, Offer};
use crate::port::outbound::OutboundMessage;

/// Pre-joined multi-currency display strings for a discount offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLines {
    pub sale: String,
    pub normal: String,
}

/// Render a candidate (plus its classifier result) into both message forms.
///
/// `prices` applies to discount offers; without it the raw USD amounts are
/// shown.
#[must_use]
pub fn compose(
    candidate: &Candidate,
    is_historical_low: bool,
    prices: Option<&PriceLines>,
) -> OutboundMessage {
    match &candidate.offer {
        Offer::Discount(offer) => compose_discount(candidate, offer, is_historical_low, prices),
        Offer::Free(offer) => compose_free(candidate, offer),
    }
}

/// Render the fixed root message for a category thread.
#[must_use]
pub fn compose_thread_root(category: Category) -> OutboundMessage {
    let label = category.label();
    let description = category.description();

    OutboundMessage {
        plain: format!("{label}\n{description}"),
        markup: format!(
            "*{}*\n_{}_",
            escape_markdown(label),
            escape_markdown(description)
        ),
    }
}

fn compose_discount(
    candidate: &Candidate,
    offer: &DiscountOffer,
    is_historical_low: bool,
    prices: Option<&PriceLines>,
) -> OutboundMessage {
    let fallback = PriceLines {
        sale: format!("${:.2}", offer.sale_usd),
        normal: format!("${:.2}", offer.normal_usd),
    };
    let prices = prices.unwrap_or(&fallback);

    let mut markup = format!(
        "🎮 *\\[DEAL\\] {}*\n\
         \n\
         📉 `{}% off` on {} \\(was `{}`\\)\n\
         💰 `{}`",
        escape_markdown(&candidate.title),
        offer.cut,
        escape_markdown(&offer.shop),
        prices.normal,
        prices.sale,
    );
    let mut plain = format!(
        "🎮 [DEAL] {}\n  {}% off on {} (was {})\n  💰 {}",
        candidate.title, offer.cut, offer.shop, prices.normal, prices.sale,
    );

    if is_historical_low {
        markup.push_str("\n🏆 _All\\-time low\\!_");
        plain.push_str("\n  🏆 All-time low!");
    }

    if !candidate.url.is_empty() {
        markup.push_str(&format!(
            "\n🔗 [View Deal]({})",
            escape_markdown_url(&candidate.url)
        ));
        plain.push_str(&format!("\n  🔗 {}", candidate.url));
    }

    OutboundMessage { plain, markup }
}

fn compose_free(candidate: &Candidate, offer: &FreeOffer) -> OutboundMessage {
    let (tag, blurb, link_label) = if offer.upcoming {
        ("UPCOMING FREE", "Coming soon on the Epic Games Store", "Store Page")
    } else {
        ("FREE", "Free on the Epic Games Store", "Claim Now")
    };
    let emoji = if offer.upcoming { "📢" } else { "🆓" };

    let mut markup = format!(
        "{} *\\[{}\\] {}*\n\n{}",
        emoji,
        escape_markdown(tag),
        escape_markdown(&candidate.title),
        escape_markdown(blurb),
    );
    let mut plain = format!("{} [{}] {}\n  {}", emoji, tag, candidate.title, blurb);

    if let Some(until) = offer.until {
        let date = until.format("%B %-d").to_string();
        markup.push_str(&format!("\n📅 _Free until {}_", escape_markdown(&date)));
        plain.push_str(&format!("\n  📅 Free until {date}"));
    }

    if !candidate.url.is_empty() {
        markup.push_str(&format!(
            "\n🔗 [{}]({})",
            escape_markdown(link_label),
            escape_markdown_url(&candidate.url)
        ));
        plain.push_str(&format!("\n  🔗 {}", candidate.url));
    }

    OutboundMessage { plain, markup }
}

/// Escape special characters for Telegram MarkdownV2.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}

/// Escape characters special inside a MarkdownV2 inline-link URL.
fn escape_markdown_url(url: &str) -> String {
    let mut result = String::with_capacity(url.len() * 2);
    for c in url.chars() {
        if c == ')' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result
}
