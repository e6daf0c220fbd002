/// Noesis system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current schema version written into every fragment.
pub const FRAGMENT_SCHEMA_VERSION: u16 = 1;

/// Number of discrete skill/difficulty levels used by user-context matching.
pub const SKILL_LEVELS: u8 = 5;

/// Maximum number of ids accepted by a single bulk operation.
pub const MAX_BULK_BATCH_SIZE: usize = 1_000;
