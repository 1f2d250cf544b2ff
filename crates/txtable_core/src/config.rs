//! Table configuration.

/// Configuration for a [`TransactionAwareTable`](crate::TransactionAwareTable).
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Name reported to the coordinator. Defaults to the store's table name.
    pub name: Option<String>,

    /// Whether operations that cannot be made transactional
    /// (`check_and_*`, `append`, `increment`) pass straight to the store.
    pub allow_non_transactional: bool,

    /// Maximum versions per column captured in a delete pre-image.
    pub pre_image_max_versions: u32,

    /// Whether snapshot gets are kept in the pending log as a read set.
    pub record_reads: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: None,
            allow_non_transactional: false,
            pre_image_max_versions: u32::MAX,
            record_reads: false,
        }
    }
}

impl TableConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the participant name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets whether non-transactional operations are allowed.
    #[must_use]
    pub const fn allow_non_transactional(mut self, value: bool) -> Self {
        self.allow_non_transactional = value;
        self
    }

    /// Sets how many versions per column a delete pre-image keeps.
    #[must_use]
    pub const fn pre_image_max_versions(mut self, versions: u32) -> Self {
        self.pre_image_max_versions = versions;
        self
    }

    /// Sets whether snapshot gets are recorded.
    #[must_use]
    pub const fn record_reads(mut self, value: bool) -> Self {
        self.record_reads = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TableConfig::default();
        assert!(config.name.is_none());
        assert!(!config.allow_non_transactional);
        assert_eq!(config.pre_image_max_versions, u32::MAX);
        assert!(!config.record_reads);
    }

    #[test]
    fn builder_pattern() {
        let config = TableConfig::new()
            .name("orders")
            .allow_non_transactional(true)
            .pre_image_max_versions(3)
            .record_reads(true);

        assert_eq!(config.name.as_deref(), Some("orders"));
        assert!(config.allow_non_transactional);
        assert_eq!(config.pre_image_max_versions, 3);
        assert!(config.record_reads);
    }
}
