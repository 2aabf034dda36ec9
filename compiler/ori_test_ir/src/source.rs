//! Source attribution for traits, skips and issues.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// A position in a source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub const fn new(file: &'static str, line: u32, column: u32) -> Self {
        SourceLocation { file, line, column }
    }

    /// Location of the caller of the function this is invoked from.
    ///
    /// Only meaningful inside `#[track_caller]` functions; elsewhere it
    /// reports its own call site.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for SourceLocation {
    fn from(location: &'static Location<'static>) -> Self {
        SourceLocation {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Where something happened: a location and, when captured, a backtrace.
#[derive(Clone, Debug, Default)]
pub struct SourceContext {
    pub location: Option<SourceLocation>,
    pub backtrace: Option<Arc<Backtrace>>,
}

impl SourceContext {
    /// Context pointing at a known location, without a backtrace.
    pub fn at(location: SourceLocation) -> Self {
        SourceContext {
            location: Some(location),
            backtrace: None,
        }
    }

    /// Capture the caller's location and a backtrace.
    ///
    /// The backtrace is only kept when `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE`
    /// enable capturing.
    #[track_caller]
    pub fn capture() -> Self {
        let backtrace = Backtrace::capture();
        SourceContext {
            location: Some(SourceLocation::caller()),
            backtrace: (backtrace.status() == BacktraceStatus::Captured).then(|| Arc::new(backtrace)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_reports_the_tracked_call_site() {
        #[track_caller]
        fn here() -> SourceLocation {
            SourceLocation::caller()
        }

        let expected_line = line!() + 1;
        let location = here();
        assert_eq!(location.line, expected_line);
        assert!(location.file.ends_with("source.rs"));
    }

    #[test]
    fn capture_records_location() {
        let context = SourceContext::capture();
        assert!(context.location.is_some());
    }

    #[test]
    fn display_is_file_line_column() {
        let location = SourceLocation::new("lib.ori", 3, 7);
        assert_eq!(location.to_string(), "lib.ori:3:7");
    }
}
