//! Configuration for nearest-visit matching

use std::fmt;

use crate::config::ColumnNames;
use crate::schema::DateFormatConfig;

/// Configuration for the temporal matcher
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Column names in the imaging and clinical tables
    pub columns: ColumnNames,

    /// Columns placed right after the fixed lead columns, in this order
    pub priority_columns: Vec<String>,

    /// Suffix for imaging columns whose name also occurs in the clinical table
    pub observation_suffix: String,

    /// Suffix for clinical columns whose name also occurs in the imaging table
    pub visit_suffix: String,

    /// Date formats accepted in both tables
    pub date_format_config: DateFormatConfig,

    /// Whether to use parallel processing for the match step
    pub use_parallel: bool,

    /// Minimum number of observations before the match step goes parallel
    pub parallel_threshold: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            priority_columns: vec!["SCAN".to_string(), "DX_bl".to_string()],
            observation_suffix: "_x".to_string(),
            visit_suffix: "_y".to_string(),
            date_format_config: DateFormatConfig::default(),
            use_parallel: true,
            parallel_threshold: 1000,
        }
    }
}

impl MatcherConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing matcher configuration
    #[must_use]
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::new()
    }
}

impl fmt::Display for MatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matcher Configuration:")?;
        writeln!(
            f,
            "  Subject / scan date / visit date: {} / {} -> {} / {}",
            self.columns.subject_id,
            self.columns.observation_date,
            self.columns.scan_date,
            self.columns.visit_date
        )?;
        writeln!(f, "  Priority columns: {}", self.priority_columns.join(", "))?;
        write!(
            f,
            "  Parallel: {} (threshold {})",
            self.use_parallel, self.parallel_threshold
        )
    }
}

/// Builder for constructing matcher configuration
#[derive(Debug, Clone, Default)]
pub struct MatcherConfigBuilder {
    config: MatcherConfig,
}

impl MatcherConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column names
    #[must_use]
    pub fn columns(mut self, columns: ColumnNames) -> Self {
        self.config.columns = columns;
        self
    }

    /// Set the priority columns
    #[must_use]
    pub fn priority_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.priority_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the suffixes for names shared by both tables
    #[must_use]
    pub fn suffixes(mut self, observation: &str, visit: &str) -> Self {
        self.config.observation_suffix = observation.to_string();
        self.config.visit_suffix = visit.to_string();
        self
    }

    /// Set the accepted date formats
    #[must_use]
    pub fn date_format_config(mut self, date_format_config: DateFormatConfig) -> Self {
        self.config.date_format_config = date_format_config;
        self
    }

    /// Set whether to use parallel processing
    #[must_use]
    pub fn use_parallel(mut self, parallel: bool) -> Self {
        self.config.use_parallel = parallel;
        self
    }

    /// Set the observation count at which matching goes parallel
    #[must_use]
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// Build the matcher configuration
    #[must_use]
    pub fn build(self) -> MatcherConfig {
        self.config
    }
}
