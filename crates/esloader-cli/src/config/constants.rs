//! CLI設定の定数定義

/// Prefix of every environment variable read by the CLI
pub const ENV_PREFIX: &str = "ESLOADER_";

/// `_type` label of `--documents` files
pub const DEFAULT_DOCUMENTS_TYPE: &str = "document";

/// `_type` label of `--secondary` files
pub const DEFAULT_SECONDARY_TYPE: &str = "secondary";

/// Exit status for configuration and usage errors
pub const EXIT_USAGE: u8 = 2;

/// Exit status for unreadable or malformed input
pub const EXIT_INPUT: u8 = 3;

/// Exit status for sink failures (retries exhausted, rejected items, index lifecycle)
pub const EXIT_SINK: u8 = 4;

/// Exit status for anything else
pub const EXIT_INTERNAL: u8 = 1;
