//! Client configuration.

/// Table used when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "entikv";

/// Configuration for connecting a [`StoreClient`](crate::StoreClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Table holding every entity row.
    pub table_name: String,

    /// Whether gets and scans request strongly consistent reads.
    pub consistent_reads: bool,

    /// Rows evaluated per scan page (`None` = store default).
    pub scan_page_size: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            consistent_reads: true,
            scan_page_size: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `table_name` with default values.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// Sets whether reads are strongly consistent.
    #[must_use]
    pub const fn consistent_reads(mut self, value: bool) -> Self {
        self.consistent_reads = value;
        self
    }

    /// Sets the number of rows evaluated per scan page.
    #[must_use]
    pub const fn scan_page_size(mut self, size: Option<usize>) -> Self {
        self.scan_page_size = size;
        self
    }
}
