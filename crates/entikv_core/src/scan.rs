//! Full-table scans driven to completion.

use crate::client::StoreClient;
use crate::error::CoreResult;
use entikv_codec::Item;
use entikv_store::{ExpressionNames, ExpressionValues, Filter, ScanRequest};
use tracing::debug;

/// Follows scan cursors until the store reports no further pages.
///
/// The scanner keeps no state between calls: every [`scan`](Self::scan)
/// starts from the beginning of the table. Pages are not a snapshot, so
/// rows written while a scan is in flight may or may not appear.
#[derive(Debug, Clone, Copy)]
pub struct PagedScanner<'a> {
    client: &'a StoreClient,
}

impl<'a> PagedScanner<'a> {
    /// Creates a scanner over the client's table.
    pub fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Returns every row matching `filter`, in store order.
    ///
    /// Pages that match nothing but still carry a cursor are followed like
    /// any other page.
    ///
    /// # Errors
    ///
    /// Returns the first store error; rows gathered so far are discarded.
    pub fn scan(
        &self,
        filter: Filter,
        names: ExpressionNames,
        values: ExpressionValues,
        projection: Vec<String>,
    ) -> CoreResult<Vec<Item>> {
        let config = self.client.config();
        let mut request = ScanRequest::new()
            .with_filter(filter, names, values)
            .with_projection(projection)
            .with_limit(config.scan_page_size)
            .with_consistent(config.consistent_reads);

        let mut results = Vec::new();
        let mut pages = 0usize;
        loop {
            let page = self.client.scan(&request)?;
            pages += 1;
            debug!(
                table = %self.client.table(),
                page = pages,
                matched = page.items.len(),
                scanned = page.scanned_count,
                more = page.last_evaluated.is_some(),
                "scan page"
            );
            results.extend(page.items);
            match page.last_evaluated {
                Some(cursor) => request.exclusive_start = Some(cursor),
                None => break,
            }
        }
        Ok(results)
    }
}
