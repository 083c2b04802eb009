// Config module - translator and scan settings with environment overrides

use log::warn;
use std::str::FromStr;

/// Rows per range read when the caller does not choose a batch size
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Function name that denotes a column reference
pub const DEFAULT_COLUMN_ACCESSOR: &str = "col";

/// Handling of calls to functions other than the column accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPolicy {
    /// Yield an absent operand and log a warning
    #[default]
    Lenient,
    /// Fail with an unsupported-construct error
    Strict,
}

impl FromStr for CallPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(CallPolicy::Lenient),
            "strict" => Ok(CallPolicy::Strict),
            other => Err(format!("unknown call policy: {}", other)),
        }
    }
}

/// How a scan decides that the table has been exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndOfTable {
    /// Stop on a short batch (or a short underlying range when capped)
    #[default]
    Heuristic,
    /// Ask the store for the row count once and stop when the offset reaches it
    RowCount,
}

impl FromStr for EndOfTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(EndOfTable::Heuristic),
            "row-count" | "row_count" | "rowcount" => Ok(EndOfTable::RowCount),
            other => Err(format!("unknown end-of-table mode: {}", other)),
        }
    }
}

/// Translator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    pub column_accessor: String,
    pub unknown_calls: CallPolicy,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            column_accessor: DEFAULT_COLUMN_ACCESSOR.to_string(),
            unknown_calls: CallPolicy::default(),
        }
    }
}

impl TranslatorConfig {
    pub fn with_column_accessor(mut self, name: impl Into<String>) -> Self {
        self.column_accessor = name.into();
        self
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.unknown_calls = policy;
        self
    }

    /// Defaults overridden by `PUSHDOWN_COLUMN_ACCESSOR` and `PUSHDOWN_CALL_POLICY`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(name) = env_string("PUSHDOWN_COLUMN_ACCESSOR") {
            config.column_accessor = name;
        }
        if let Some(policy) = env_parsed::<CallPolicy>("PUSHDOWN_CALL_POLICY") {
            config.unknown_calls = policy;
        }
        config
    }
}

/// Scan settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub default_batch_size: usize,
    pub end_of_table: EndOfTable,
    pub translator: TranslatorConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE,
            end_of_table: EndOfTable::default(),
            translator: TranslatorConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn with_default_batch_size(mut self, batch_size: usize) -> Self {
        self.default_batch_size = batch_size;
        self
    }

    pub fn with_end_of_table(mut self, mode: EndOfTable) -> Self {
        self.end_of_table = mode;
        self
    }

    pub fn with_translator(mut self, translator: TranslatorConfig) -> Self {
        self.translator = translator;
        self
    }

    /// Defaults overridden by `PUSHDOWN_BATCH_SIZE`, `PUSHDOWN_END_OF_TABLE`
    /// and the translator variables
    pub fn from_env() -> Self {
        let default_batch_size = env_parsed::<usize>("PUSHDOWN_BATCH_SIZE")
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        let end_of_table = env_parsed::<EndOfTable>("PUSHDOWN_END_OF_TABLE").unwrap_or_default();
        Self {
            default_batch_size,
            end_of_table,
            translator: TranslatorConfig::from_env(),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn env_parsed<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_string(key)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
