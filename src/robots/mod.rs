//! Robots.txt handling module
//!
//! Each crawl fetches its seed site's robots.txt once and checks every
//! frontier URL against it before fetching.

mod parser;

pub use parser::ParsedRobots;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const ROBOTS_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the robots.txt URL for the site of `seed`
pub fn robots_url(seed: &Url) -> Option<Url> {
    let mut url = seed.clone();
    url.set_path("/robots.txt");
    url.set_query(None);
    url.set_fragment(None);
    url.host_str()?;
    Some(url)
}

/// Returns the product token of a user agent string ("HarvesterBot/1.0" -> "HarvesterBot")
pub fn agent_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .filter(|token| !token.is_empty())
        .unwrap_or(user_agent)
}

/// Fetches robots.txt for the site of `seed`
///
/// Anything other than a 200 response with a readable body yields
/// [`ParsedRobots::allow_all`]; a missing robots.txt never blocks a crawl.
pub async fn fetch_robots(client: &Client, seed: &Url) -> ParsedRobots {
    let Some(url) = robots_url(seed) else {
        return ParsedRobots::allow_all();
    };

    let response = match client.get(url.clone()).timeout(ROBOTS_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not fetch {}: {} (proceeding without it)", url, e);
            return ParsedRobots::allow_all();
        }
    };

    if response.status() != StatusCode::OK {
        tracing::debug!("No robots.txt at {} (HTTP {})", url, response.status());
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::info!("Loaded robots.txt from {}", url);
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::warn!("Could not read {}: {}", url, e);
            ParsedRobots::allow_all()
        }
    }
}
