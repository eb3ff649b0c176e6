pub mod status_formatter;

pub use status_formatter::{StatusFormatter, StatusScreen};
