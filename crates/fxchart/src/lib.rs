pub mod annotate;
pub mod chart;
pub mod config;
pub mod data;
pub mod errors;
pub mod report;
pub mod resample;
pub mod window;

pub use report::{build_charts, run, ChartWriter, HtmlFileWriter};
