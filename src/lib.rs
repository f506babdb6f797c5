pub mod browser;
pub mod config;
pub mod element;
pub mod error;
pub mod extract;
pub mod page;

pub use browser::WeatherBrowser;
pub use config::BrowserConfig;
pub use error::{Error, Result};
pub use extract::{check_weather, Verdict};
pub use page::Page;
