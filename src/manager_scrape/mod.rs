pub mod errors;

use std::env;
use std::time::Duration;
use log::debug;
use ureq::Agent;
use crate::config::{Proxy, Sources, Station};
use crate::manager_scrape::errors::ScrapeError;

/// Seconds the proxy may serve a cached copy of the page
const PROXY_CACHE_TTL: &str = "3600";

/// Struct for fetching the site's HTML page through the ScrapingBee proxy, used when direct
/// CSV downloads are blocked
pub struct Scraper {
    agent: Agent,
    api_url: String,
    api_key: String,
    target_url: String,
}

impl Scraper {
    /// Returns a new instance of the Scraper struct
    ///
    /// The api key is read from the environment variable named in the proxy configuration.
    ///
    /// # Arguments
    ///
    /// * 'proxy' - proxy configuration
    /// * 'sources' - base url and timeout
    /// * 'station' - point, prefecture and region codes for the target page
    pub fn new(proxy: &Proxy, sources: &Sources, station: &Station) -> Result<Self, ScrapeError> {
        let api_key = env::var(&proxy.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ScrapeError::Config(format!("{} environment variable is not set", proxy.api_key_env)))?;

        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(sources.timeout_secs)))
            .build();

        let agent = config.into();

        Ok(Self {
            agent,
            api_url: proxy.api_url.clone(),
            api_key,
            target_url: target_url(sources, station),
        })
    }

    /// Fetches the page through the proxy and returns the HTML
    pub fn get_page(&self) -> Result<String, ScrapeError> {
        debug!("GET {} via proxy", self.target_url);

        let html = self.agent
            .get(&self.api_url)
            .query("api_key", &self.api_key)
            .query("url", &self.target_url)
            .query("premium_proxy", "true")
            .query("country_code", "jp")
            .query("render_js", "false")
            .query("cache", "true")
            .query("cache_ttl", PROXY_CACHE_TTL)
            .call()?
            .body_mut()
            .read_to_string()?;

        Ok(html)
    }
}

/// Returns the url of the page showing the current WBGT for the station
///
/// # Arguments
///
/// * 'sources' - holds the base url
/// * 'station' - region, prefecture and point codes
pub fn target_url(sources: &Sources, station: &Station) -> String {
    format!("{}/graph_ref_td.php?region={}&prefecture={}&point={}",
            sources.base_url.trim_end_matches('/'), station.region, station.prefecture_no, station.point_code)
}
