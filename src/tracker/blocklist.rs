// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Site blocklist and the interstitial page shown in place of blocked sites.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Installed on first run and restored on logout.
pub const DEFAULT_BLOCKED_SITES: [&str; 15] = [
    "facebook.com",
    "youtube.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "tiktok.com",
    "reddit.com",
    "netflix.com",
    "hulu.com",
    "disneyplus.com",
    "amazon.com/prime",
    "twitch.tv",
    "discord.com",
    "snapchat.com",
    "pinterest.com",
];

pub const QUOTES: [&str; 5] = [
    "The only way to do great work is to love what you do. - Steve Jobs",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. - Winston Churchill",
    "Don't watch the clock; do what it does. Keep going. - Sam Levenson",
    "The future depends on what you do today. - Mahatma Gandhi",
    "It always seems impossible until it's done. - Nelson Mandela",
];

/// Ordered set of hostname patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockList {
    patterns: Vec<String>,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_SITES.iter().map(|s| s.to_string()))
    }
}

impl BlockList {
    /// Build from `patterns`, dropping blanks and duplicates.
    pub fn new(patterns: impl IntoIterator<Item = String>) -> Self {
        let mut list = Self {
            patterns: Vec::new(),
        };
        for p in patterns {
            list.add(&p);
        }
        list
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Append `site` unless it is blank or already present.
    pub fn add(&mut self, site: &str) -> bool {
        let site = site.trim();
        if site.is_empty() || self.patterns.iter().any(|p| p == site) {
            return false;
        }
        self.patterns.push(site.to_string());
        true
    }

    /// Remove `site`, matched after the same trimming `add` applies.
    pub fn remove(&mut self, site: &str) -> bool {
        let site = site.trim();
        let before = self.patterns.len();
        self.patterns.retain(|p| p != site);
        self.patterns.len() != before
    }

    /// First pattern matching `hostname`.
    ///
    /// A pattern matches on equality, as a parent domain, or as any substring
    /// of the hostname. The substring rule also catches unrelated hosts that
    /// happen to contain the pattern ("notfacebook.com" for "facebook.com").
    pub fn matching(&self, hostname: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| {
                hostname == p.as_str()
                    || hostname.ends_with(&format!(".{}", p))
                    || hostname.contains(p.as_str())
            })
            .map(String::as_str)
    }

    pub fn is_blocked(&self, hostname: &str) -> bool {
        self.matching(hostname).is_some()
    }
}

pub fn random_quote() -> &'static str {
    QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUOTES[0])
}

/// The interstitial as a self-contained `data:` URL.
pub fn interstitial_url(quote: &str) -> String {
    format!(
        "data:text/html;charset=utf-8,{}",
        urlencoding::encode(&interstitial_html(quote))
    )
}

fn interstitial_html(quote: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Stay Focused - Productivity Tracker</title>
<style>
body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center; text-align: center; }}
.container {{ max-width: 600px; padding: 40px 20px; background: rgba(255, 255, 255, 0.1); border-radius: 20px; }}
.quote {{ font-size: 18px; line-height: 1.6; margin-bottom: 30px; font-style: italic; }}
.button {{ background: rgba(255, 255, 255, 0.2); color: white; padding: 12px 24px; border-radius: 8px; text-decoration: none; display: inline-block; margin: 5px; }}
</style>
</head>
<body>
<div class="container">
<h1>Stay Focused!</h1>
<div class="quote">"{}"</div>
<div class="message">This site has been blocked to help you stay productive. Use this time to work on something meaningful instead.</div>
<a href="https://www.google.com" class="button">Go to Google</a>
<a href="https://github.com" class="button">Go to GitHub</a>
</div>
</body>
</html>"#,
        escape_html(quote)
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(patterns: &[&str]) -> BlockList {
        BlockList::new(patterns.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_exact_and_subdomain_match() {
        let blocked = list(&["facebook.com"]);
        assert_eq!(blocked.matching("facebook.com"), Some("facebook.com"));
        assert_eq!(blocked.matching("m.facebook.com"), Some("facebook.com"));
        assert!(!blocked.is_blocked("github.com"));
    }

    #[test]
    fn test_substring_rule_over_matches() {
        // Current behavior: any host containing the pattern is blocked.
        let blocked = list(&["facebook.com", "x.com"]);
        assert!(blocked.is_blocked("notfacebook.com"));
        assert!(blocked.is_blocked("example.com"));
    }

    #[test]
    fn test_first_match_wins() {
        let blocked = list(&["book.com", "facebook.com"]);
        assert_eq!(blocked.matching("facebook.com"), Some("book.com"));
    }

    #[test]
    fn test_path_pattern_never_matches_a_hostname() {
        let blocked = list(&["amazon.com/prime"]);
        assert!(!blocked.is_blocked("amazon.com"));
        assert!(!blocked.is_blocked("www.amazon.com"));
    }

    #[test]
    fn test_add_and_remove() {
        let mut blocked = list(&[]);
        assert!(blocked.add("news.com"));
        assert!(!blocked.add("news.com"));
        assert!(!blocked.add("   "));
        assert_eq!(blocked.patterns(), ["news.com".to_string()]);

        assert!(blocked.remove("news.com"));
        assert!(!blocked.remove("news.com"));
        assert!(!blocked.is_blocked("anything.com"));
    }

    #[test]
    fn test_remove_trims_like_add() {
        let mut blocked = list(&[]);
        assert!(blocked.add(" news.com "));
        assert!(blocked.remove(" news.com "));
        assert!(blocked.patterns().is_empty());
        assert!(!blocked.remove("\tnews.com\n"));
    }

    #[test]
    fn test_defaults() {
        let blocked = BlockList::default();
        assert_eq!(blocked.patterns().len(), DEFAULT_BLOCKED_SITES.len());
        assert!(blocked.is_blocked("www.youtube.com"));
    }

    #[test]
    fn test_interstitial_url_embeds_quote() {
        let url = interstitial_url(QUOTES[2]);
        assert!(url.starts_with("data:text/html;charset=utf-8,"));
        let decoded = urlencoding::decode(&url["data:text/html;charset=utf-8,".len()..]).unwrap();
        assert!(decoded.contains("Keep going."));
        assert!(QUOTES.contains(&random_quote()));
    }
}
