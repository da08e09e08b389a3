//! The two reusable crawl algorithms.
//!
//! [`traverse_pages`] walks a paginated listing endpoint page by page;
//! [`traverse_range`] walks per-id detail endpoints one id at a time. Both
//! are strictly sequential, report through the injected
//! [`ProgressReporter`], and return the sum of the results of every unit
//! of work they processed.
//!
//! Error handling differs on purpose between the two:
//! - inside a range scan a failing item is logged, counted as one error and
//!   the scan continues;
//! - an error escaping a page callback charges the whole page to `errors`
//!   and aborts the traversal with a `DATABASE_ERROR`.
//!
//! `API_RATE_LIMIT` always propagates unchanged from both.

use crate::api::{FetchClient, PageResponse};
use crate::error::{FetcherError, Result};
use crate::progress::ProgressReporter;
use crate::result::DatabaseOperationResult;
use serde::de::DeserializeOwned;
use shared::config::TraversalConfig;
use std::future::Future;
use tracing::{debug, error, info};

/// Where and how to page through a listing endpoint
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Absolute listing URL without the page parameter
    pub base_url: &'a str,
    /// Stable ordering field passed as `order_by`
    pub order_by: Option<&'a str>,
    /// 1-based page to start from
    pub start_page: u32,
    /// Fetch exactly one page
    pub single_page: bool,
}

impl<'a> PageRequest<'a> {
    pub fn new(base_url: &'a str) -> Self {
        Self {
            base_url,
            order_by: Some("mal_id"),
            start_page: 1,
            single_page: false,
        }
    }

    pub fn order_by(mut self, order_by: Option<&'a str>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn start_page(mut self, page: u32) -> Self {
        self.start_page = page;
        self
    }

    pub fn single_page(mut self, single_page: bool) -> Self {
        self.single_page = single_page;
        self
    }

    fn page_url(&self, page: u32) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        match self.order_by {
            Some(order_by) => format!("{}{}page={}&order_by={}", self.base_url, separator, page, order_by),
            None => format!("{}{}page={}", self.base_url, separator, page),
        }
    }
}

/// Which ids to scan against a per-id endpoint
#[derive(Debug, Clone, Copy)]
pub struct RangeRequest<'a> {
    /// Absolute collection URL; the id is appended as a path segment
    pub base_url: &'a str,
    /// Appended after the id, e.g. `/episodes`
    pub suffix: &'a str,
    pub start_id: u32,
    /// Inclusive upper bound; `None` scans until the not-found threshold
    pub end_id: Option<u32>,
}

impl<'a> RangeRequest<'a> {
    /// Fail fast on arguments that cannot describe a range
    pub fn validate(&self) -> Result<()> {
        if let Some(end_id) = self.end_id {
            if self.start_id > end_id {
                return Err(FetcherError::validation(format!(
                    "start id {} is greater than end id {}",
                    self.start_id, end_id
                )));
            }
        }
        Ok(())
    }

    fn item_url(&self, id: u32) -> String {
        format!("{}/{}{}", self.base_url, id, self.suffix)
    }
}

/// Page through a listing endpoint, handing each page's items to
/// `process_page`.
///
/// Stops when a page or its item array is absent, when the upstream says
/// there is no next page, or after one page in single-page mode.
pub async fn traverse_pages<T, F, Fut>(
    client: &FetchClient,
    progress: &dyn ProgressReporter,
    request: PageRequest<'_>,
    mut process_page: F,
) -> Result<DatabaseOperationResult>
where
    T: DeserializeOwned,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<DatabaseOperationResult>>,
{
    let mut page = request.start_page.max(1);
    let mut total = DatabaseOperationResult::default();

    loop {
        let url = request.page_url(page);
        debug!(url = %url, page = page, "Fetching page");

        let Some(response) = client.fetch_json::<PageResponse<T>>(&url).await? else {
            info!(page = page, "Page not found, stopping");
            break;
        };

        if page == 1 {
            if let Some(items) = response.total_items() {
                progress.set_total(items);
            }
        }

        let has_next_page = response.has_next_page();
        let Some(items) = response.data else {
            info!(page = page, "Page has no data, stopping");
            break;
        };
        let count = items.len() as u64;

        match process_page(items).await {
            Ok(result) => {
                progress.advance(count, &result);
                total += result;
            }
            Err(e) if e.is_rate_limit() => return Err(e),
            Err(e) => {
                error!(page = page, items = count, error = %e, "Page processing failed, aborting");
                progress.advance(count, &DatabaseOperationResult::errors(count));
                return Err(FetcherError::database(format!("Failed to process page {}", page), e));
            }
        }

        if !has_next_page || request.single_page {
            break;
        }
        page += 1;
    }

    Ok(total)
}

/// Scan ids one at a time, handing each found record to `process_item`.
///
/// A 404 counts the id as skipped. With an open end the scan stops after
/// `settings.not_found_threshold` consecutive 404s. Any failure other than
/// rate limiting is counted as one error for its id and the scan goes on.
pub async fn traverse_range<T, F, Fut>(
    client: &FetchClient,
    progress: &dyn ProgressReporter,
    settings: &TraversalConfig,
    request: RangeRequest<'_>,
    process_item: F,
) -> Result<DatabaseOperationResult>
where
    T: DeserializeOwned,
    F: FnMut(u32, T) -> Fut,
    Fut: Future<Output = Result<DatabaseOperationResult>>,
{
    traverse_range_filtered(client, progress, settings, request, |_| Ok(true), process_item).await
}

/// [`traverse_range`] with a local check that runs before each request.
///
/// Ids rejected by `should_fetch` are skipped without a request and count
/// toward the consecutive not-found threshold like a 404.
pub async fn traverse_range_filtered<T, S, F, Fut>(
    client: &FetchClient,
    progress: &dyn ProgressReporter,
    settings: &TraversalConfig,
    request: RangeRequest<'_>,
    mut should_fetch: S,
    mut process_item: F,
) -> Result<DatabaseOperationResult>
where
    T: DeserializeOwned,
    S: FnMut(u32) -> Result<bool>,
    F: FnMut(u32, T) -> Fut,
    Fut: Future<Output = Result<DatabaseOperationResult>>,
{
    request.validate()?;

    progress.set_total(match request.end_id {
        Some(end_id) => u64::from(end_id - request.start_id) + 1,
        None => settings.open_ended_estimate,
    });

    let threshold = settings.not_found_threshold.max(1);
    let mut consecutive_not_found = 0u32;
    let mut total = DatabaseOperationResult::default();
    let mut current = Some(request.start_id);

    while let Some(id) = current {
        if request.end_id.map_or(false, |end_id| id > end_id) {
            break;
        }

        let fetched = match should_fetch(id) {
            Ok(true) => client.fetch_json::<T>(&request.item_url(id)).await,
            Ok(false) => {
                debug!(mal_id = id, "Not stored locally, no request made");
                Ok(None)
            }
            Err(e) => Err(e),
        };

        let outcome = match fetched {
            Ok(None) => {
                consecutive_not_found += 1;
                debug!(mal_id = id, consecutive = consecutive_not_found, "Not found");
                DatabaseOperationResult::skipped(id)
            }
            Ok(Some(payload)) => {
                consecutive_not_found = 0;
                match process_item(id, payload).await {
                    Ok(result) => result,
                    Err(e) if e.is_rate_limit() => return Err(e),
                    Err(e) => {
                        progress.warn(&format!("Failed to process id {}: {}", id, e));
                        DatabaseOperationResult::error(id)
                    }
                }
            }
            Err(e) if e.is_rate_limit() => return Err(e),
            Err(e) => {
                progress.warn(&format!("Failed to fetch id {}: {}", id, e));
                DatabaseOperationResult::error(id)
            }
        };

        progress.advance(1, &outcome);
        total += outcome;

        if request.end_id.is_none() && consecutive_not_found >= threshold {
            info!(
                last_id = id,
                consecutive = consecutive_not_found,
                "Consecutive not-found threshold reached, assuming end of catalog"
            );
            break;
        }
        current = id.checked_add(1);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let request = PageRequest::new("http://api/anime");
        assert_eq!(request.page_url(3), "http://api/anime?page=3&order_by=mal_id");

        let request = PageRequest::new("http://api/genres/anime?filter=themes").order_by(None);
        assert_eq!(request.page_url(1), "http://api/genres/anime?filter=themes&page=1");
    }

    #[test]
    fn test_range_validation() {
        let request = RangeRequest {
            base_url: "http://api/anime",
            suffix: "",
            start_id: 10,
            end_id: Some(2),
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::FetcherErrorKind::Validation);

        let single = RangeRequest { end_id: Some(10), ..request };
        assert!(single.validate().is_ok());

        let open = RangeRequest { end_id: None, ..request };
        assert!(open.validate().is_ok());
    }

    #[test]
    fn test_item_url() {
        let request = RangeRequest {
            base_url: "http://api/anime",
            suffix: "/episodes",
            start_id: 1,
            end_id: None,
        };
        assert_eq!(request.item_url(21), "http://api/anime/21/episodes");
    }
}
