//! Error types for the currency dashboard

use thiserror::Error;

/// Main error type for the currency dashboard
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No currencies available from the rate source")]
    EmptyUniverse,

    #[error("No valid rate for {0}")]
    NoValidRate(String),

    #[error("Failed to write to log: {0}")]
    LogWriteFailed(String),

    #[error("Log is missing required columns: {}", missing.join(", "))]
    LogSchemaMismatch { missing: Vec<String> },

    #[error("History unavailable: {0}")]
    HistoryUnavailable(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Sheet error: {0}")]
    SheetError(String),

    #[error("Chart error: {0}")]
    ChartError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl DashboardError {
    /// Short stable name of the error kind, used to tag notices
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            DashboardError::EmptyUniverse => ErrorKind::EmptyUniverse,
            DashboardError::NoValidRate(_) => ErrorKind::NoValidRate,
            DashboardError::LogWriteFailed(_) => ErrorKind::LogWriteFailed,
            DashboardError::LogSchemaMismatch { .. } => ErrorKind::LogSchemaMismatch,
            DashboardError::HistoryUnavailable(_) => ErrorKind::HistoryUnavailable,
            DashboardError::InvalidCurrency(_) => ErrorKind::InvalidCurrency,
            DashboardError::SheetError(_)
            | DashboardError::IoError(_)
            | DashboardError::CsvError(_) => ErrorKind::Storage,
            DashboardError::ChartError(_) => ErrorKind::Chart,
            DashboardError::ConfigError(_) => ErrorKind::Config,
            DashboardError::SerdeError(_) => ErrorKind::Serialization,
        }
    }
}

/// Error kind without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceUnavailable,
    EmptyUniverse,
    NoValidRate,
    LogWriteFailed,
    LogSchemaMismatch,
    HistoryUnavailable,
    InvalidCurrency,
    Storage,
    Chart,
    Config,
    Serialization,
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
