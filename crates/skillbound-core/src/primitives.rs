//! # Primitives
//!
//! Fixed constants of the evaluation model.

/// Number of skills in the catalog.
pub const SKILL_COUNT: usize = 4;

/// Lowest accepted raw point.
pub const MIN_POINT: u8 = 1;

/// Highest accepted raw point.
pub const MAX_POINT: u8 = 10;

/// Normalized score of a point equal to the rater's average.
/// Also the assessment of a subject nobody has rated yet.
pub const NEUTRAL_SCORE: u8 = 50;

/// Normalized points per standard deviation of distance from the average.
pub const DEVIATION_SCALE: u64 = 10;

/// Upper bound used by `NarrowingPolicy::Clamp`.
pub const MAX_NORMALIZED_SCORE: u8 = 100;

/// First identity id handed out by the default registry.
pub const FIRST_IDENTITY_ID: u64 = 1;
