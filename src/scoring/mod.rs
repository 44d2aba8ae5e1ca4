//! Health scoring
//!
//! Turns the violation set into one interpretable health signal.
//!
//! Every violation carries a penalty. Penalties are split into an
//! architecture bucket (cycles, layering, coupling) and a hygiene bucket
//! (everything else) by `PenaltyCalculator`. `ScoreCalculator` then turns
//! the two sums into scores:
//!
//! - **Weighted mode** when lines of code are known: penalty density per
//!   kLOC, architecture weighted 0.9 against hygiene 0.1
//! - **Legacy mode** otherwise: raw penalty over a module-count scaling
//!   factor
//!
//! Status bands (from the architecture score):
//!
//! | Score | Status          |
//! |-------|-----------------|
//! | ≥ 90  | Excellent       |
//! | ≥ 75  | Healthy         |
//! | ≥ 60  | Needs Attention |
//! | < 60  | Critical        |

mod calculator;
mod penalty;

pub use calculator::{legacy_scaling_factor, ScoreCalculator, ScoreResult};
pub use penalty::{PenaltyCalculator, ScoreBreakdown, ScoreBucket};
