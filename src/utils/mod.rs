pub mod reporting;
pub mod sanitize;
