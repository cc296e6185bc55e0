//! Integer status codes for the raw, pointer-style entry points.

use std::fmt;

/// Outcome of a raw kernel call: `0` on success, `1` on failure.
///
/// The cause of a failure is logged at error level; the code carries no
/// further detail.
#[repr(i64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success = 0,
    Failure = 1,
}

impl Status {
    /// Numeric code as seen by foreign callers.
    #[inline]
    pub fn code(self) -> i64 {
        self as i64
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl<T, E> From<&Result<T, E>> for Status {
    fn from(result: &Result<T, E>) -> Self {
        if result.is_ok() {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
