pub mod json;

pub use json::{InterfaceReport, JsonFormatter, ResultSummary};
