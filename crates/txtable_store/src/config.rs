//! Store configuration.

/// Configuration for an [`InMemoryStore`](crate::InMemoryStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether puts and deletes are applied immediately.
    ///
    /// When false they queue in a client-side write buffer until
    /// [`CellStore::flush`](crate::CellStore::flush) is called or the
    /// buffer fills up.
    pub auto_flush: bool,

    /// Number of queued mutations that triggers an automatic flush.
    pub write_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auto_flush: true,
            write_buffer_size: 1024,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether mutations are applied immediately.
    #[must_use]
    pub const fn auto_flush(mut self, value: bool) -> Self {
        self.auto_flush = value;
        self
    }

    /// Sets the write buffer limit.
    #[must_use]
    pub const fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }
}
