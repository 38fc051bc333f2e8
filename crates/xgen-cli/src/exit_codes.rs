//! Exit codes of the `xgen` binary
//!
//! These follow Unix conventions where applicable.

/// Every resource was generated
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - invalid generate.yaml, generator.yaml or override
pub const CONFIG_ERROR: i32 = 2;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
