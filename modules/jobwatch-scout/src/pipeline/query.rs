//! Search query construction.

use url::Url;

use jobwatch_common::{JobWatchError, SortOrder};

/// Place-name substring → geographic id, matched case-insensitively. The
/// first entry whose place occurs in the location wins.
#[derive(Debug, Clone)]
pub struct GeoLookup {
    entries: Vec<(String, String)>,
}

impl GeoLookup {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(place, id)| (place.to_lowercase(), id))
            .collect();
        Self { entries }
    }

    pub fn lookup(&self, location: &str) -> Option<&str> {
        let location = location.to_lowercase();
        self.entries
            .iter()
            .find(|(place, _)| location.contains(place.as_str()))
            .map(|(_, id)| id.as_str())
    }
}

impl Default for GeoLookup {
    fn default() -> Self {
        Self::new(vec![("Berlin".to_string(), "90009712".to_string())])
    }
}

/// A fully built search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    url: Url,
    params: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Parameters in the order they appear on the URL.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base_url: Url,
    geo: GeoLookup,
}

impl QueryBuilder {
    pub fn new(base_url: &str, geo: GeoLookup) -> Result<Self, JobWatchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| JobWatchError::Config(format!("invalid search base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(JobWatchError::Config(format!(
                "search base URL {base_url} cannot carry query parameters"
            )));
        }
        Ok(Self { base_url, geo })
    }

    /// Same inputs always give the same query. Unknown locations simply omit
    /// `geoId`.
    pub fn build(
        &self,
        job_title: &str,
        location: &str,
        recency_window_secs: u64,
        sort_order: SortOrder,
    ) -> SearchQuery {
        let mut params = vec![
            ("keywords".to_string(), job_title.to_string()),
            ("location".to_string(), location.to_string()),
        ];
        if let Some(geo_id) = self.geo.lookup(location) {
            params.push(("geoId".to_string(), geo_id.to_string()));
        }
        params.push(("f_TPR".to_string(), format!("r{recency_window_secs}")));
        params.push(("sortBy".to_string(), sort_order.query_value().to_string()));

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        SearchQuery { url, params }
    }
}
