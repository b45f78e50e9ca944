use anyhow::{Context, Result};
use url::Url;

use super::PositionStore;
use crate::models::YearMonth;

/// Prefix of the per-pane query parameter, e.g. `month_source=2024-03`.
pub const QUERY_PARAM_PREFIX: &str = "month_";

/// Reads and writes per-pane months in a URL query string.
///
/// Other query parameters are preserved on write. The host pushes
/// [`QueryPositionSource::url`] back into its history after writes.
#[derive(Debug, Clone)]
pub struct QueryPositionSource {
    url: Url,
}

impl QueryPositionSource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Failed to parse URL {url:?}"))?;
        Ok(Self::new(url))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn param_name(pane: &str) -> String {
        format!("{QUERY_PARAM_PREFIX}{pane}")
    }

    /// Raw parameter value for a pane, if present.
    pub fn raw_value(&self, pane: &str) -> Option<String> {
        let name = Self::param_name(pane);
        self.url
            .query_pairs()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl PositionStore for QueryPositionSource {
    /// Unparseable values read as absent.
    fn read(&self, pane: &str) -> Result<Option<YearMonth>> {
        Ok(self.raw_value(pane).and_then(|raw| raw.parse().ok()))
    }

    fn write(&mut self, pane: &str, ym: YearMonth) -> Result<()> {
        let name = Self::param_name(pane);
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| *key != name)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        {
            let mut pairs = self.url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(&name, &ym.key());
        }
        Ok(())
    }
}
