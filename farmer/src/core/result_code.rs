//! Result codes the farming loop branches on.
//!
//! The service reports a numeric `EResult` with every reply. Only a handful of
//! values change control flow; everything else is carried through verbatim in
//! [`ResultCode::Transient`] so it can be logged.

use std::fmt;

/// Raw `EResult` values with a dedicated meaning.
pub mod raw {
    pub const OK: i32 = 1;
    pub const FAIL: i32 = 2;
    pub const INVALID_STATE: i32 = 11;
    pub const EXPIRED: i32 = 27;
    pub const NO_MATCH: i32 = 42;
    /// Used when the reply is missing or cannot be read.
    pub const BAD_RESPONSE: i32 = 76;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    /// The zone was captured before the join landed.
    Expired,
    /// The zone was captured before the score report landed.
    NoMatch,
    /// The boss fight no longer exists.
    InvalidState,
    /// Anything else; retry after a cooldown.
    Transient(i32),
}

impl ResultCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            raw::OK => Self::Ok,
            raw::EXPIRED => Self::Expired,
            raw::NO_MATCH => Self::NoMatch,
            raw::INVALID_STATE => Self::InvalidState,
            other => Self::Transient(other),
        }
    }

    pub fn bad_response() -> Self {
        Self::Transient(raw::BAD_RESPONSE)
    }

    pub fn raw(self) -> i32 {
        match self {
            Self::Ok => raw::OK,
            Self::Expired => raw::EXPIRED,
            Self::NoMatch => raw::NO_MATCH,
            Self::InvalidState => raw::INVALID_STATE,
            Self::Transient(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Expired => f.write_str("Expired"),
            Self::NoMatch => f.write_str("NoMatch"),
            Self::InvalidState => f.write_str("InvalidState"),
            Self::Transient(raw::FAIL) => f.write_str("Fail (2)"),
            Self::Transient(raw::BAD_RESPONSE) => f.write_str("BadResponse (76)"),
            Self::Transient(code) => write!(f, "EResult {code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branching_codes_are_recognised() {
        assert_eq!(ResultCode::from_raw(1), ResultCode::Ok);
        assert_eq!(ResultCode::from_raw(27), ResultCode::Expired);
        assert_eq!(ResultCode::from_raw(42), ResultCode::NoMatch);
        assert_eq!(ResultCode::from_raw(11), ResultCode::InvalidState);
    }

    #[test]
    fn unknown_codes_keep_their_raw_value() {
        let code = ResultCode::from_raw(84);
        assert_eq!(code, ResultCode::Transient(84));
        assert_eq!(code.raw(), 84);
        assert_eq!(code.to_string(), "EResult 84");
        assert_eq!(ResultCode::bad_response().to_string(), "BadResponse (76)");
    }
}
