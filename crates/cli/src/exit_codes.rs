//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, missing file) |
//! | 3       | Universal | I/O error                                |
//! | 30-39   | replay    | Edit script replay codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Cannot read input or write output.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Replay (30-39)
// =============================================================================

/// Script is not valid JSON, has an unknown step, or seeds an invalid state.
pub const EXIT_REPLAY_PARSE: u8 = 30;

/// At least one edit batch was rejected and `--strict` was given.
pub const EXIT_REPLAY_REJECTED: u8 = 31;

/// At least one queued operation failed in the stores and `--strict` was given.
pub const EXIT_REPLAY_FAILED: u8 = 32;

/// The operation queue closed before the script finished.
pub const EXIT_REPLAY_QUEUE: u8 = 33;
