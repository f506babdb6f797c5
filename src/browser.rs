use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::{BrowserBuilder, BrowserConfig};
use crate::error::{Error, Result};
use crate::page::Page;

/// Chrome flags that improve performance without affecting functionality.
const PERF_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "metrics-recording-only",
    "mute-audio",
    "no-default-browser-check",
    "disable-client-side-phishing-detection",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
];

/// One browser session, acquired at the start of a check and released
/// exactly once via [`WeatherBrowser::close`].
pub struct WeatherBrowser {
    browser: CrBrowser,
    config: BrowserConfig,
    handler_task: tokio::task::JoinHandle<()>,
}

impl WeatherBrowser {
    /// Create a new BrowserBuilder for configuring and launching a browser.
    pub fn builder() -> BrowserBuilder {
        BrowserBuilder::new()
    }

    /// Launch a browser instance with the given configuration.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        info!(
            headless = config.headless,
            width = config.viewport_width,
            height = config.viewport_height,
            "launching browser"
        );

        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        for arg in PERF_ARGS {
            builder = builder.arg(*arg);
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder.viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        });

        let cr_config = builder
            .build()
            .map_err(|e| Error::Launch(e.to_string()))?;

        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| Error::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        info!("browser launched");

        Ok(Self {
            browser,
            config,
            handler_task,
        })
    }

    /// The configuration this session was launched with.
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Open a new page (tab) navigated to the given URL.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let cr_page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| Error::Navigation(e.to_string()))?;

        Ok(Page::new(cr_page, self.config.selector_timeout))
    }

    /// Shut the browser down. Consumes the session so the release can only
    /// happen once; callers hold exactly one `WeatherBrowser` per check.
    pub async fn close(mut self) -> Result<()> {
        info!("closing browser session");

        if let Err(e) = self.browser.close().await {
            warn!("browser close request failed: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("browser did not exit cleanly: {e}");
        }
        self.handler_task.abort();

        debug!("browser session released");
        Ok(())
    }
}
