//! In-memory store limits.

/// Limits enforced by [`InMemoryStore`](crate::InMemoryStore).
///
/// The defaults mirror the limits of common hosted key-value services so
/// that code tested in memory does not rely on unbounded pages or
/// transactions.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of rows evaluated per scan page.
    pub max_page_items: usize,

    /// Maximum encoded size of the rows evaluated per scan page.
    pub max_page_bytes: usize,

    /// Maximum number of operations in one transaction.
    pub max_transact_items: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_page_items: 1000,
            max_page_bytes: 1024 * 1024, // 1 MiB
            max_transact_items: 100,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum rows evaluated per scan page.
    #[must_use]
    pub const fn max_page_items(mut self, items: usize) -> Self {
        self.max_page_items = items;
        self
    }

    /// Sets the maximum encoded bytes evaluated per scan page.
    #[must_use]
    pub const fn max_page_bytes(mut self, bytes: usize) -> Self {
        self.max_page_bytes = bytes;
        self
    }

    /// Sets the maximum operations per transaction.
    #[must_use]
    pub const fn max_transact_items(mut self, items: usize) -> Self {
        self.max_transact_items = items;
        self
    }
}
