//! The weather extraction pipeline: ordered selector fallback, keyword scan,
//! title parse, and the final match verdict.

use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::Result;
use crate::page::Page;

/// How a selector locates the condition element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Id,
    Css,
    XPath,
}

impl Strategy {
    fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::XPath => "xpath",
        }
    }
}

/// Ordered selectors for the condition element on a search results page.
/// Earlier entries are strictly preferred; the first one that yields
/// non-empty text wins. Tuned for the Google weather widget, with broader
/// fallbacks at the tail for layout variants.
pub const CONDITION_SELECTORS: &[(Strategy, &str)] = &[
    (Strategy::Id, "wob_dc"),
    (Strategy::Css, ".wob_dc"),
    (Strategy::XPath, "//span[@id='wob_dc']"),
    (Strategy::XPath, "//div[@id='wob_dcp']//span"),
    (Strategy::Css, "[data-attrid='wob_dc']"),
    (Strategy::XPath, "//div[contains(@class,'vk_gy')]//span"),
];

/// Known condition keywords, in priority order. Multi-word phrases come
/// before their single-word suffixes so "partly cloudy" is not reported as
/// "cloudy"; "clear" sits last because it is the most collision-prone.
pub const WEATHER_KEYWORDS: &[&str] = &[
    "sunny",
    "partly cloudy",
    "mostly cloudy",
    "cloudy",
    "overcast",
    "thunderstorm",
    "drizzle",
    "showers",
    "rain",
    "snow",
    "sleet",
    "hail",
    "storm",
    "windy",
    "fog",
    "mist",
    "haze",
    "clear",
];

/// Outcome of one weather check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the extracted text contained the expected condition.
    pub matched: bool,
    /// The extracted condition text, when any strategy produced one.
    pub actual: Option<String>,
}

impl Verdict {
    /// A verdict for a run where no strategy produced any text.
    pub fn no_extraction() -> Self {
        Self {
            matched: false,
            actual: None,
        }
    }
}

/// Search URL for a city's weather, spaces encoded as `+`.
pub fn search_url(city: &str) -> String {
    format!(
        "https://www.google.com/search?q=weather+{}",
        city.trim().replace(' ', "+")
    )
}

/// Screenshot file name derived from the city, e.g. `New_York_weather.png`.
pub fn screenshot_name(city: &str, suffix: &str) -> String {
    format!("{}_{suffix}.png", city.trim().replace(' ', "_"))
}

/// Case-insensitive substring test of the expected condition within the
/// extracted text.
pub fn condition_matches(actual: &str, expected: &str) -> bool {
    actual.to_lowercase().contains(&expected.to_lowercase())
}

/// First dictionary keyword present in the given text, in dictionary
/// priority order, not order of appearance on the page.
pub fn first_keyword(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    WEATHER_KEYWORDS.iter().copied().find(|k| lower.contains(k))
}

/// The first text block containing the keyword, trimmed. This is the
/// "nearby text-bearing element" of the keyword scan.
pub fn block_containing(blocks: &[String], keyword: &str) -> Option<String> {
    blocks
        .iter()
        .find(|b| b.to_lowercase().contains(keyword))
        .map(|b| b.trim().to_string())
}

/// Last-resort parse of the page title: when it mentions weather and has a
/// `-` separated tail, the segment before the first `-` is the best
/// remaining guess. An undelimited title carries no extractable segment.
pub fn title_condition(title: &str) -> Option<String> {
    if !title.to_lowercase().contains("weather") {
        return None;
    }
    let mut parts = title.split('-');
    let first = parts.next()?.trim();
    if parts.next().is_none() || first.is_empty() {
        return None;
    }
    Some(first.to_string())
}

/// Run every extraction stage in order against an already-navigated page
/// and return the first non-empty condition text, if any.
///
/// Per-selector timeouts are expected for layouts a strategy does not apply
/// to; they are logged and never escalate. Only page-level failures (a dead
/// session, JS evaluation breaking) surface as errors.
pub async fn extract_condition(
    page: &Page,
    city: &str,
    config: &BrowserConfig,
) -> Result<Option<String>> {
    // Stage 2: ordered selector fallback, first non-empty text wins.
    for (strategy, locator) in CONDITION_SELECTORS {
        debug!(strategy = strategy.as_str(), locator, "trying selector");

        let text = match strategy {
            Strategy::Id | Strategy::Css => {
                let css = match strategy {
                    Strategy::Id => format!("#{locator}"),
                    _ => (*locator).to_string(),
                };
                match page.wait_for_selector(&css, Some(config.selector_timeout)).await {
                    Ok(el) => match el.inner_text().await {
                        Ok(text) => text,
                        Err(e) => {
                            debug!(strategy = strategy.as_str(), locator, "text read failed: {e}");
                            continue;
                        }
                    },
                    Err(e) => {
                        debug!(strategy = strategy.as_str(), locator, "selector gave nothing: {e}");
                        continue;
                    }
                }
            }
            Strategy::XPath => {
                match page.wait_for_xpath_text(locator, Some(config.selector_timeout)).await {
                    Ok(text) => text,
                    Err(e) => {
                        debug!(strategy = strategy.as_str(), locator, "selector gave nothing: {e}");
                        continue;
                    }
                }
            }
        };

        let text = text.trim();
        if text.is_empty() {
            debug!(strategy = strategy.as_str(), locator, "element had no text");
            continue;
        }

        info!(strategy = strategy.as_str(), locator, text, "condition extracted");
        return Ok(Some(text.to_string()));
    }

    // Stage 3: scan the visible page text for known condition keywords.
    info!("no selector matched, scanning page text for weather keywords");
    let page_text = page.body_text().await?;
    if let Some(keyword) = first_keyword(&page_text) {
        debug!(keyword, "keyword found in page text");

        let debug_shot = screenshot_name(city, "debug");
        if let Err(e) = page.screenshot_to_file(&debug_shot).await {
            warn!("debug screenshot failed: {e}");
        }

        let blocks = page.visible_text_blocks().await?;
        if let Some(text) = block_containing(&blocks, keyword) {
            info!(keyword, %text, "condition extracted via keyword scan");
            return Ok(Some(text));
        }
        debug!(keyword, "no text block carried the keyword");
    }

    // Stage 4: fall back to parsing the page title.
    let title = page.title().await?;
    if let Some(text) = title_condition(&title) {
        info!(%text, "condition extracted from page title");
        return Ok(Some(text));
    }

    info!("every extraction strategy came up empty");
    Ok(None)
}

/// Navigate to the search results for `weather <city>`, extract the
/// displayed condition and compare it to `expected`.
pub async fn check_weather(
    page: &Page,
    city: &str,
    expected: &str,
    config: &BrowserConfig,
) -> Result<Verdict> {
    let url = search_url(city);
    info!(%url, "navigating to weather search");
    page.goto(&url).await?;

    // Let client-side rendering settle before querying the DOM.
    tokio::time::sleep(config.settle_delay).await;

    let actual = extract_condition(page, city, config).await?;

    let verdict = match actual {
        Some(text) => Verdict {
            matched: condition_matches(&text, expected),
            actual: Some(text),
        },
        None => Verdict::no_extraction(),
    };

    match (&verdict.actual, verdict.matched) {
        (Some(actual), true) => info!(%actual, expected, "condition matched"),
        (Some(actual), false) => info!(%actual, expected, "condition did not match"),
        (None, _) => info!(expected, "no condition text extracted"),
    }

    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_is_case_insensitive_substring() {
        assert!(condition_matches("Sunny", "sunny"));
        assert!(condition_matches("Partly Cloudy", "CLOUDY"));
        assert!(condition_matches("Overcast skies ahead", "overcast"));
        assert!(!condition_matches("Sunny", "Rainy"));
        assert!(!condition_matches("Overcast", "rainy"));
    }

    #[test]
    fn keyword_scan_honors_dictionary_priority() {
        // "cloudy" precedes "rain" in the dictionary, so the cloudy block
        // wins even though the rain block comes first on the page.
        let page_text = "Heavy rain expected tomorrow. Cloudy this afternoon.";
        let keyword = first_keyword(page_text).unwrap();
        assert_eq!(keyword, "cloudy");

        let blocks = vec![
            "Heavy rain expected tomorrow".to_string(),
            "Cloudy this afternoon".to_string(),
        ];
        assert_eq!(
            block_containing(&blocks, keyword).as_deref(),
            Some("Cloudy this afternoon")
        );
    }

    #[test]
    fn keyword_scan_prefers_longer_phrases() {
        // The hit is on "partly cloudy", not plain "cloudy".
        assert_eq!(first_keyword("Partly Cloudy, 21°C"), Some("partly cloudy"));
        assert!(WEATHER_KEYWORDS.iter().position(|k| *k == "partly cloudy").unwrap()
            < WEATHER_KEYWORDS.iter().position(|k| *k == "cloudy").unwrap());
    }

    #[test]
    fn keyword_scan_returns_none_without_hits() {
        assert_eq!(first_keyword("Stock prices and sports results"), None);
        let blocks = vec!["Stock prices".to_string()];
        assert_eq!(block_containing(&blocks, "overcast"), None);
    }

    #[test]
    fn title_fallback_requires_weather_mention() {
        assert_eq!(
            title_condition("weather in Pune - Google Search").as_deref(),
            Some("weather in Pune")
        );
        assert_eq!(title_condition("Weather Today - Results").as_deref(), Some("Weather Today"));
        assert_eq!(title_condition("Pune - Google Search"), None);
        assert_eq!(title_condition(""), None);
    }

    #[test]
    fn title_fallback_rejects_empty_first_segment() {
        assert_eq!(title_condition("- weather report"), None);
    }

    #[test]
    fn title_fallback_requires_a_delimited_segment() {
        // A weather mention alone is not enough; without a `-` separated
        // tail there is no segment to take.
        assert_eq!(title_condition("Weather in Pune"), None);
        assert_eq!(title_condition("weather"), None);
    }

    #[test]
    fn search_url_encodes_spaces() {
        assert_eq!(
            search_url("New York"),
            "https://www.google.com/search?q=weather+New+York"
        );
        assert_eq!(search_url("  Pune "), "https://www.google.com/search?q=weather+Pune");
    }

    #[test]
    fn screenshot_names_derive_from_city() {
        assert_eq!(screenshot_name("Pune", "weather"), "Pune_weather.png");
        assert_eq!(screenshot_name("New York", "error"), "New_York_error.png");
        assert_eq!(screenshot_name("San Luis Obispo", "debug"), "San_Luis_Obispo_debug.png");
    }

    #[test]
    fn selector_table_leads_with_the_widget_id() {
        assert_eq!(CONDITION_SELECTORS[0], (Strategy::Id, "wob_dc"));
        assert!(CONDITION_SELECTORS.len() > 1);
    }

    #[test]
    fn no_extraction_verdict_never_matches() {
        let verdict = Verdict::no_extraction();
        assert!(!verdict.matched);
        assert!(verdict.actual.is_none());
    }
}
