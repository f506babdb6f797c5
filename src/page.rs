use std::path::Path;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::Page as CrPage;
use chromiumoxide::page::ScreenshotParams;

use crate::element::Element;
use crate::error::{Error, Result};

/// Wrapper around a chromiumoxide Page with the operations the extraction
/// pipeline needs: navigation, bounded element waits, text harvesting and
/// screenshots.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self {
            inner,
            default_timeout,
        }
    }

    /// Returns a reference to the underlying chromiumoxide Page.
    pub fn inner(&self) -> &CrPage {
        &self.inner
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Navigate to the given URL and wait for the page to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::Navigation(e.to_string()))?;
        Ok(())
    }

    /// Get the current page title.
    pub async fn title(&self) -> Result<String> {
        let result = self
            .inner
            .evaluate("document.title")
            .await
            .map_err(|e| Error::Js(e.to_string()))?;
        match result.into_value::<String>() {
            Ok(title) => Ok(title),
            Err(_) => Ok(String::new()),
        }
    }

    // ── Element queries ─────────────────────────────────────────────

    /// Find an element matching the given CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        let el = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(Element::new(el))
    }

    /// Get the rendered text of the first node matching an XPath expression,
    /// or None when nothing matches. XPath goes through `document.evaluate`
    /// since CDP element queries are CSS-only.
    pub async fn xpath_text(&self, xpath: &str) -> Result<Option<String>> {
        let xpath_js = serde_json::to_string(xpath).map_err(|e| Error::Js(e.to_string()))?;
        let js = format!(
            r#"
            (() => {{
                const node = document.evaluate(
                    {xpath_js}, document, null,
                    XPathResult.FIRST_ORDERED_NODE_TYPE, null
                ).singleNodeValue;
                return node ? (node.innerText || node.textContent || '') : null;
            }})()
            "#,
        );
        let result = self
            .inner
            .evaluate(js)
            .await
            .map_err(|e| Error::Js(e.to_string()))?;
        match result.into_value::<Option<String>>() {
            Ok(text) => Ok(text),
            Err(_) => Ok(None),
        }
    }

    /// Wait for an element matching the given CSS selector to appear in the
    /// DOM. Polls every 100ms up to `timeout` (or the default when None).
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let interval = Duration::from_millis(100);
        let start = std::time::Instant::now();

        loop {
            match self.find_element(selector).await {
                Ok(el) => return Ok(el),
                Err(_) if start.elapsed() < timeout => {
                    tokio::time::sleep(interval).await;
                }
                Err(_) => {
                    return Err(Error::Timeout(format!(
                        "Timed out waiting for selector: {selector}"
                    )));
                }
            }
        }
    }

    /// Wait for a node matching the given XPath expression to appear and
    /// return its text. Same bounded poll as [`Page::wait_for_selector`].
    pub async fn wait_for_xpath_text(
        &self,
        xpath: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let interval = Duration::from_millis(100);
        let start = std::time::Instant::now();

        loop {
            match self.xpath_text(xpath).await? {
                Some(text) => return Ok(text),
                None if start.elapsed() < timeout => {
                    tokio::time::sleep(interval).await;
                }
                None => {
                    return Err(Error::Timeout(format!(
                        "Timed out waiting for xpath: {xpath}"
                    )));
                }
            }
        }
    }

    // ── Text harvesting ─────────────────────────────────────────────

    /// Get the rendered text of the whole page body.
    pub async fn body_text(&self) -> Result<String> {
        let result = self
            .inner
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| Error::Js(e.to_string()))?;
        match result.into_value::<String>() {
            Ok(text) => Ok(text),
            Err(_) => Ok(String::new()),
        }
    }

    /// Collect the trimmed text of every visible leaf element on the page.
    /// Short blocks only; long runs of text are never a condition label.
    pub async fn visible_text_blocks(&self) -> Result<Vec<String>> {
        let js = r#"
            JSON.stringify(
                Array.from(document.querySelectorAll('body *'))
                    .filter(el => {
                        if (el.children.length > 0) return false;
                        const style = window.getComputedStyle(el);
                        if (style.display === 'none' || style.visibility === 'hidden') return false;
                        return true;
                    })
                    .map(el => (el.innerText || '').trim())
                    .filter(text => text.length > 0 && text.length < 200)
            )
        "#;
        let result = self
            .inner
            .evaluate(js)
            .await
            .map_err(|e| Error::Js(e.to_string()))?;
        let json_str: String = result
            .into_value()
            .map_err(|e| Error::Js(e.to_string()))?;

        let blocks: Vec<String> =
            serde_json::from_str(&json_str).map_err(|e| Error::Js(e.to_string()))?;
        Ok(blocks)
    }

    // ── Screenshots ─────────────────────────────────────────────────

    /// Take a full-page screenshot and save it to a file (PNG format).
    pub async fn screenshot_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.inner
            .save_screenshot(params, path)
            .await
            .map_err(|e| Error::Screenshot(e.to_string()))?;
        Ok(())
    }
}
