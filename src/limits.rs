//! Hard caps on user-supplied input. Exceeding any of these is a
//! `LimitExceeded` error, never a panic or an unbounded allocation.

/// Longest accepted line on the wire, in bytes (LinesCodec cap).
pub const MAX_LINE_LEN: usize = 1024;

/// Longest accepted username, in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Longest accepted vaccine name, in bytes.
pub const MAX_VACCINE_NAME_LEN: usize = 64;

/// Largest single `add_doses` amount.
pub const MAX_DOSES_PER_ADD: u32 = 1_000_000;

/// Total registered accounts, both roles combined.
pub const MAX_ACCOUNTS: usize = 100_000;
