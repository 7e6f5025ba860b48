//! Exit codes (BSD sysexits.h compatible)

/// Command line usage error: bad flags, bad substitutions, empty input
pub const USAGE: i32 = 64;

/// The expression could not be parsed or evaluated
pub const DATAERR: i32 = 65;

/// Standard input could not be read
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
