//! Expertise scoring derived from commit history.

mod factors;
mod scorer;

pub use factors::{FactorScores, FileActivity, FACTOR_WEIGHTS};
pub use scorer::{
    score_repository, ExpertRecommendation, ExpertiseReport, ExpertiseScore, Heatmap,
    ModuleExpertise, BUS_FACTOR_WARNING_THRESHOLD,
};
