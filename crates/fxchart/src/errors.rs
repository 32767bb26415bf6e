use thiserror::Error;

/// All errors generated while building the weekly report.
#[derive(Error, Debug)]
pub enum ErrorRepr {
    #[error("no price data available")]
    NoPriceData,
    #[error("invalid resample period, {}", .0)]
    InvalidPeriod(String),
    #[error("missing column, {}", .0)]
    MissingColumn(String),
    #[error("csv: {}", .0)]
    Csv(#[from] csv::Error),
    #[error("io: {}", .0)]
    Io(#[from] std::io::Error),
    #[error("chart serialization: {}", .0)]
    Json(#[from] serde_json::Error),
}
