// src/fetch/urls.rs
use crate::config::URL_PREFIX;

/// Build the release URL for one month of yellow taxi trips.
///
/// The month is not validated: `month = 13` still yields a well-formed URL,
/// which then fails at download time.
pub fn build_url(year: i32, month: u32) -> String {
    build_url_with_prefix(URL_PREFIX, year, month)
}

pub fn build_url_with_prefix(prefix: &str, year: i32, month: u32) -> String {
    format!(
        "{}/yellow_tripdata_{}-{:02}.csv.gz",
        prefix.trim_end_matches('/'),
        year,
        month
    )
}
