//! Preflight checks - validate configuration and connectivity before the
//! scheduler starts.
//!
//! Each upstream gets a reachability probe and the Telegram token gets an
//! auth check. Failures print a colored report; the caller decides whether
//! to exit.

use std::time::Duration;

use owo_colors::OwoColorize;
use reqwest::Client as HttpClient;
use teloxide::prelude::*;

use crate::adapter::outbound::cheapshark;
use crate::adapter::outbound::epic;
use crate::adapter::outbound::frankfurter;
use crate::adapter::outbound::itad;
use crate::config::Config;

fn pass(label: &str, detail: &str) -> bool {
    let suffix = if detail.is_empty() {
        String::new()
    } else {
        format!(" — {detail}")
    };
    println!("  {} {label}{suffix}", "✓".green());
    true
}

fn fail(label: &str, detail: &str) -> bool {
    let suffix = if detail.is_empty() {
        String::new()
    } else {
        format!(" — {detail}")
    };
    println!("  {} {label}{suffix}", "✗".red());
    false
}

fn skip(label: &str, detail: &str) -> bool {
    println!("  {} {label} — {detail}", "–".yellow());
    // Skips don't count as failures.
    true
}

/// Run all preflight checks. Returns true if everything critical passes.
pub async fn run_preflight(config: &Config) -> bool {
    println!("\n{}\n", "dealhound — preflight checks".bold());
    let mut all_ok = true;

    let http = HttpClient::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|_| HttpClient::new());

    println!("{}", "Telegram".bold());
    all_ok &= check_telegram(config).await;

    println!("\n{}", "CheapShark".bold());
    all_ok &= check_cheapshark(&http).await;

    println!("\n{}", "Epic Games Store".bold());
    all_ok &= check_epic(&http).await;

    println!("\n{}", "Frankfurter (exchange rates)".bold());
    all_ok &= check_frankfurter(&http, config).await;

    println!("\n{}", "IsThereAnyDeal".bold());
    all_ok &= check_itad(&http, &config.secrets.itad_api_key).await;

    println!();
    if all_ok {
        println!(
            "{} The bot is ready to run.",
            "All checks passed.".green().bold()
        );
    } else {
        println!(
            "{} Review the errors above before starting the bot.",
            "Some checks failed.".red().bold()
        );
    }
    println!();

    all_ok
}

/// Verify the bot token authenticates against the Telegram API.
async fn check_telegram(config: &Config) -> bool {
    let bot = Bot::new(&config.secrets.telegram_bot_token);
    match bot.get_me().await {
        Ok(me) => pass(
            "Authentication",
            &format!("logged in as @{}", me.username()),
        ),
        Err(e) => fail("Authentication", &e.to_string()),
    }
}

/// Hit the CheapShark deals endpoint to confirm it's reachable.
async fn check_cheapshark(http: &HttpClient) -> bool {
    let result = async {
        let deals: Vec<serde_json::Value> = http
            .get(format!("{}/deals", cheapshark::BASE_URL))
            .query(&[("pageSize", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok::<_, reqwest::Error>(deals.len())
    }
    .await;

    match result {
        Ok(count) => pass("API reachable", &format!("{count} deal(s) in response")),
        Err(e) => fail("API reachable", &e.to_string()),
    }
}

/// Hit the Epic free-games endpoint.
async fn check_epic(http: &HttpClient) -> bool {
    let result = async {
        let data: serde_json::Value = http
            .get(epic::FREE_GAMES_URL)
            .query(&[("locale", "en-US")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let count = data["data"]["Catalog"]["searchStore"]["elements"]
            .as_array()
            .map_or(0, Vec::len);
        Ok::<_, reqwest::Error>(count)
    }
    .await;

    match result {
        Ok(count) => pass("API reachable", &format!("{count} game(s) in catalog")),
        Err(e) => fail("API reachable", &e.to_string()),
    }
}

/// Fetch exchange rates to confirm Frankfurter is reachable.
async fn check_frankfurter(http: &HttpClient, config: &Config) -> bool {
    let symbols = config.currency.targets.join(",");
    let result = async {
        let data: serde_json::Value = http
            .get(frankfurter::FRANKFURTER_URL)
            .query(&[("base", config.currency.base.as_str()), ("symbols", &symbols)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok::<_, reqwest::Error>(data["rates"].as_object().map_or(0, |r| r.len()))
    }
    .await;

    match result {
        Ok(0) => fail("API reachable", "response contained no rates"),
        Ok(count) => pass("API reachable", &format!("{count} rate(s) returned")),
        Err(e) => fail("API reachable", &e.to_string()),
    }
}

/// Verify the ITAD API key works (skipped if no key is set).
async fn check_itad(http: &HttpClient, api_key: &str) -> bool {
    if api_key.is_empty() {
        return skip("Skipped", "no ITAD_API_KEY configured (optional)");
    }

    let response = http
        .get(format!("{}/games/lookup/v1", itad::BASE_URL))
        .query(&[("key", api_key), ("appid", "220")])
        .send()
        .await;

    match response {
        Ok(resp) if resp.status() == 401 || resp.status() == 403 => {
            fail("API key", "rejected by ITAD (401/403)")
        }
        Ok(resp) => match resp.error_for_status() {
            Ok(_) => pass("API key valid", "ITAD responded successfully"),
            Err(e) => fail("API reachable", &e.to_string()),
        },
        Err(e) => fail("API reachable", &e.to_string()),
    }
}
