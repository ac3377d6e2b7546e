/// Default cap on distinct records held in one part.
pub const DEFAULT_LIMIT: i64 = 950;

/// Default cap, in bytes, on a single input line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Parameters for a partitioning run.
///
/// A `limit` of zero or below is accepted and makes every record flush its own,
/// empty, part.
/// ```rust
///   use querycount::config::{Config, DEFAULT_MAX_LINE_LENGTH};
///
///   let config = Config::default().with_limit(200);
///   assert_eq!(config.limit, 200);
///   assert_eq!(config.max_line_length, DEFAULT_MAX_LINE_LENGTH);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Number of distinct records at which the current part is flushed
    pub limit: i64,
    /// Longest accepted input line, in bytes, excluding the line break
    pub max_line_length: usize,
}

impl Config {
    /// Creates a config with the given part limit and the default line cap.
    pub fn new(limit: i64) -> Self {
        Config { limit, max_line_length: DEFAULT_MAX_LINE_LENGTH }
    }

    /// Replaces the part limit
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Replaces the line length cap
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_LIMIT)
    }
}
