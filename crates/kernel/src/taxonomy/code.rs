//! Fixed-width routing codes carried at the start of internal error messages.

use std::fmt;

/// Routing code for an internal error message.
///
/// Every code is exactly [`ErrorCode::PREFIX_LEN`] ASCII characters so the
/// dispatcher can take a fixed-length prefix and compare it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UniqueConstraint,
    PrimaryKey,
    ForeignKey,
    Validation,
    ReadonlyAccess,
    WrongPassword,
    NotFound,
    Unauthenticated,
}

impl ErrorCode {
    /// Width of every code.
    pub const PREFIX_LEN: usize = 8;

    /// All codes, in routing-table order.
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::UniqueConstraint,
        ErrorCode::PrimaryKey,
        ErrorCode::ForeignKey,
        ErrorCode::Validation,
        ErrorCode::ReadonlyAccess,
        ErrorCode::WrongPassword,
        ErrorCode::NotFound,
        ErrorCode::Unauthenticated,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UniqueConstraint => "E-UNIQUE",
            ErrorCode::PrimaryKey => "E-PKEYDU",
            ErrorCode::ForeignKey => "E-FKEYNF",
            ErrorCode::Validation => "E-VALIDN",
            ErrorCode::ReadonlyAccess => "E-RDONLY",
            ErrorCode::WrongPassword => "E-WRNGPW",
            ErrorCode::NotFound => "E-NOTFND",
            ErrorCode::Unauthenticated => "E-UNAUTH",
        }
    }

    /// Exact match of a candidate prefix against the known codes.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == prefix)
    }

    /// Split a message into its routing code and the remaining text.
    ///
    /// Returns `None` when the message is shorter than a code or its first
    /// [`Self::PREFIX_LEN`] characters are not a known code.
    pub fn split_message(message: &str) -> Option<(Self, &str)> {
        let prefix = message.get(..Self::PREFIX_LEN)?;
        let code = Self::from_prefix(prefix)?;
        Some((code, &message[Self::PREFIX_LEN..]))
    }

    /// Build an internal message routed to this code.
    pub fn tag(self, text: &str) -> String {
        format!("{}{text}", self.as_str())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
