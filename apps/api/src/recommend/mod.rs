//! Placement-recommendation pipeline: prompt assembly, generation call,
//! response extraction, and normalization.

pub mod constants;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod score;
