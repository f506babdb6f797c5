use chromiumoxide::element::Element as CrElement;

use crate::error::{Error, Result};

/// Wrapper around a chromiumoxide Element, providing a simplified API.
pub struct Element {
    inner: CrElement,
}

impl Element {
    pub(crate) fn new(inner: CrElement) -> Self {
        Self { inner }
    }

    /// Returns a reference to the underlying chromiumoxide Element.
    pub fn inner(&self) -> &CrElement {
        &self.inner
    }

    /// Get the rendered text of this element. An element with no text
    /// yields an empty string rather than an error; the extraction pipeline
    /// treats empty text as "this strategy did not apply".
    pub async fn inner_text(&self) -> Result<String> {
        let text = self
            .inner
            .inner_text()
            .await
            .map_err(Error::Cdp)?;
        Ok(text.unwrap_or_default())
    }
}
