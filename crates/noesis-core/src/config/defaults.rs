// Single source of truth for all default values.

// --- Embedding ---
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
pub const DEFAULT_STATE_DIMENSIONS: usize = 8;
pub const DEFAULT_L1_CACHE_SIZE: u64 = 10_000;

// --- Index ---
pub const DEFAULT_DOCUMENTS_COLLECTION: &str = "documents";
pub const DEFAULT_EPISODES_COLLECTION: &str = "episodes";

// --- Ranking ---
pub const DEFAULT_WEIGHT_RELEVANCE: f64 = 0.35;
pub const DEFAULT_WEIGHT_STATE_ALIGNMENT: f64 = 0.20;
pub const DEFAULT_WEIGHT_USER_CONTEXT: f64 = 0.15;
pub const DEFAULT_WEIGHT_QUALITY: f64 = 0.15;
pub const DEFAULT_WEIGHT_RECENCY: f64 = 0.10;
pub const DEFAULT_WEIGHT_AUTHORITY: f64 = 0.05;
pub const DEFAULT_STATE_TOLERANCE: f64 = 0.3;
pub const DEFAULT_NEUTRAL_SCORE: f64 = 0.5;
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

// --- Retrieval ---
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_MIN_RELEVANCE: f64 = 0.0;
pub const DEFAULT_SEMANTIC_K: usize = 20;
pub const DEFAULT_KEYWORD_K: usize = 20;
pub const DEFAULT_PATTERN_EPISODES_K: usize = 5;
pub const DEFAULT_CROSS_REFERENCE_FAN_OUT: usize = 3;
pub const DEFAULT_CROSS_REFERENCE_SEEDS: usize = 5;
pub const DEFAULT_REASONING_SEEDS: usize = 3;

// --- Decay ---
pub const DEFAULT_RECENCY_HALF_LIFE_HOURS: f64 = 24.0 * 14.0;
pub const DEFAULT_DECAY_PROCESSING_INTERVAL_SECS: u64 = 3_600;

// --- Episodic ---
pub const DEFAULT_CONSOLIDATION_SIMILARITY: f64 = 0.85;
pub const DEFAULT_CONSOLIDATION_PROXIMITY_HOURS: f64 = 24.0;
pub const DEFAULT_CORROBORATION_BONUS: f64 = 0.05;
pub const DEFAULT_RETENTION_THRESHOLD: f64 = 0.05;
pub const DEFAULT_IMPORTANCE_HALF_LIFE_DAYS: f64 = 30.0;
pub const DEFAULT_RECENT_INTERACTIONS: usize = 5;

// --- Feedback ---
pub const DEFAULT_FEEDBACK_STEP: f64 = 0.05;
pub const DEFAULT_MAX_SIGNAL_DELTA: f64 = 0.25;
pub const DEFAULT_FEEDBACK_HISTORY: usize = 32;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_QUERY_LOG_CAPACITY: usize = 1_000;
