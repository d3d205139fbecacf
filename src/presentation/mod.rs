// Presentation layer - Console output
pub mod console_reporter;
