//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Name of the shared field that receives the rating value.
    pub rating_field_name: String,
    /// Well-known name of the built-in field that receives the label.
    pub label_field_name: String,
    /// Label given to the document transaction of each batch.
    pub transaction_label: String,
    /// Interval between subscription cycles.
    pub sync_interval: Duration,
    /// Timeout for a single fetch from the record source.
    pub fetch_timeout: Duration,
    /// Base URL of the record database, when fetching over HTTP.
    pub source_url: Option<String>,
}

impl SyncConfig {
    /// Creates a new sync configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rating_field_name: "FireRating".into(),
            label_field_name: "Mark".into(),
            transaction_label: "Import Fire Rating Values".into(),
            sync_interval: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(30),
            source_url: None,
        }
    }

    /// Sets the shared rating field name.
    #[must_use]
    pub fn with_rating_field_name(mut self, name: impl Into<String>) -> Self {
        self.rating_field_name = name.into();
        self
    }

    /// Sets the label field name.
    #[must_use]
    pub fn with_label_field_name(mut self, name: impl Into<String>) -> Self {
        self.label_field_name = name.into();
        self
    }

    /// Sets the transaction label.
    #[must_use]
    pub fn with_transaction_label(mut self, label: impl Into<String>) -> Self {
        self.transaction_label = label.into();
        self
    }

    /// Sets the subscription interval.
    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the record database URL.
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
