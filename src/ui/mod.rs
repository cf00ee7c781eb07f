//! User interface module - formatting and output.
//!
//! Separates concerns:
//! - `formatter` - Styled messages on stderr
//! - This module - Writing the rendered document to stdout

use std::io::{self, Write};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{display_cause, display_error, display_success, display_warning};

/// Write a fully rendered document to stdout in one go.
pub fn print_document(document: &str) -> io::Result<()> {
    write_document(&mut io::stdout().lock(), document)
}

/// Write `document` to `out` and flush it.
pub fn write_document<W: Write>(out: &mut W, document: &str) -> io::Result<()> {
    let mut out = io::BufWriter::new(out);
    out.write_all(document.as_bytes())?;
    out.flush()
}
