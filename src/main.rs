use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info, warn};

use weather_check::extract::{check_weather, screenshot_name, Verdict};
use weather_check::{BrowserConfig, Page, WeatherBrowser};

#[derive(Parser, Debug)]
#[command(name = "weather-check", version)]
#[command(about = "Check a city's displayed weather condition against an expected one")]
struct Cli {
    /// City to look up
    city: String,

    /// Expected condition, matched case-insensitively as a substring
    condition: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("weather_check=info")),
        )
        .init();

    // The interface promises exit 1 on bad arguments; clap defaults to 2.
    // Help and version requests are not usage errors and keep clap's exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    std::process::exit(run(&cli).await);
}

async fn run(cli: &Cli) -> i32 {
    let config = BrowserConfig::default();

    let browser = match WeatherBrowser::launch(config).await {
        Ok(browser) => browser,
        Err(e) => {
            error!("could not start a browser session: {e}");
            return 1;
        }
    };

    // Everything fallible happens inside `check`; whatever it returns, the
    // session is released exactly once below.
    let outcome = check(&browser, cli).await;

    if let Err(e) = browser.close().await {
        warn!("browser shutdown reported an error: {e}");
    }

    match outcome {
        Ok(Verdict { matched: true, actual }) => {
            info!(actual = actual.as_deref().unwrap_or(""), "MATCH");
            0
        }
        Ok(Verdict { matched: false, actual: Some(actual) }) => {
            info!(%actual, expected = %cli.condition, "NO MATCH");
            1
        }
        Ok(Verdict { matched: false, actual: None }) => {
            error!("could not extract any weather condition for {}", cli.city);
            1
        }
        Err(e) => {
            error!("weather check failed: {e}");
            1
        }
    }
}

async fn check(browser: &WeatherBrowser, cli: &Cli) -> weather_check::Result<Verdict> {
    let page = browser.new_page("about:blank").await?;
    let config = browser.config().clone();

    let result = check_weather(&page, &cli.city, &cli.condition, &config).await;

    // A screenshot is saved on both paths; its failure never changes the
    // primary result.
    let suffix = match &result {
        Ok(verdict) if verdict.actual.is_some() => "weather",
        _ => "error",
    };
    save_screenshot(&page, &cli.city, suffix).await;

    result
}

async fn save_screenshot(page: &Page, city: &str, suffix: &str) {
    let name = screenshot_name(city, suffix);
    match page.screenshot_to_file(&name).await {
        Ok(()) => info!(file = %name, "screenshot saved"),
        Err(e) => warn!(file = %name, "screenshot failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_and_version_are_not_usage_errors() {
        let err = Cli::try_parse_from(["weather-check", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let err = Cli::try_parse_from(["weather-check", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn missing_and_extra_arguments_are_usage_errors() {
        let err = Cli::try_parse_from(["weather-check", "Pune"]).unwrap_err();
        assert!(!matches!(
            err.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        ));

        let err = Cli::try_parse_from(["weather-check", "Pune", "Sunny", "extra"]).unwrap_err();
        assert!(!matches!(
            err.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
        ));
    }

    #[test]
    fn two_positional_arguments_parse() {
        let cli = Cli::try_parse_from(["weather-check", "New York", "Partly Cloudy"]).unwrap();
        assert_eq!(cli.city, "New York");
        assert_eq!(cli.condition, "Partly Cloudy");
    }
}
