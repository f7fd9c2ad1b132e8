pub mod aggregator;
pub mod engine;
pub mod history;
pub mod profiler;
pub mod providers;
pub mod refinement;
pub mod signals;

pub use engine::RecommendationEngine;
pub use refinement::{PreferenceUpdateCoordinator, RefinementQueue};
