use std::{borrow::Cow, fmt, panic::Location};

/// An error message paired with the source location that produced it.
///
/// Every error type in the operator wraps one of these so that a log line
/// such as `not found: stream PAGEVIEWS (at crates/engine/src/reconciler.rs:88)`
/// points straight at the branch that gave up. Build one with
/// [`DiagnosticMessage::new`] or the [`diag!`] macro.
#[derive(Clone, Debug)]
pub struct DiagnosticMessage {
    message: Cow<'static, str>,
    location: &'static Location<'static>,
}

impl DiagnosticMessage {
    #[track_caller]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            location: Location::caller(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl PartialEq for DiagnosticMessage {
    // Two diagnostics are the same failure regardless of where they were raised.
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{})",
            self.message,
            self.location.file(),
            self.location.line()
        )
    }
}

/// `format!`-style constructor for [`DiagnosticMessage`] that records the
/// caller's file and line.
#[macro_export]
macro_rules! diag {
    ($msg:literal $(,)?) => {
        $crate::error::diagnostics::DiagnosticMessage::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::diagnostics::DiagnosticMessage::new(format!($fmt, $($arg)*))
    };
}
