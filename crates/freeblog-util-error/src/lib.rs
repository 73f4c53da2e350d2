//! Error formatting shared by the freeblog crates.
//!
//! Errors are usually nested (`FetchError` wrapping `reqwest::Error` wrapping
//! `hyper::Error` ...), and the default `Display` only prints the outermost
//! layer. [`FmtCompact`] prints the whole chain on a single line, which is what
//! we want in log fields: `err = %err.fmt_compact()`.

use std::{error, fmt};

/// Iterate over `err` and every error in its `source()` chain, outermost first.
pub fn chain<'e>(err: &'e dyn error::Error) -> impl Iterator<Item = &'e dyn error::Error> {
    std::iter::successors(Some(err), |err| err.source())
}

/// Displays an error chain as `outer: middle: inner`.
pub struct CompactError<'e>(&'e dyn error::Error);

impl fmt::Display for CompactError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in chain(self.0).enumerate() {
            if 0 < i {
                f.write_str(": ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

pub trait FmtCompact<'e> {
    fn fmt_compact(self) -> CompactError<'e>;
}

impl<'e, E> FmtCompact<'e> for &'e E
where
    E: error::Error,
{
    fn fmt_compact(self) -> CompactError<'e> {
        CompactError(self)
    }
}
