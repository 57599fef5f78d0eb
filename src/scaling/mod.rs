// ABOUTME: Right-sizing advisors: instance class (vertical) and worker count (horizontal).
// ABOUTME: Also carries the informational cost model and the scaling error type.

pub mod capacity;
mod cost;
mod error;
pub mod vertical;

pub use capacity::{
    CapacityPolicy, CapacityReport, CapacityScalingAdvisor, ScalingAction, ScalingDecision,
    WorkloadSnapshot,
};
pub use cost::{BudgetStatus, CostImpact, CostModel, CostReport};
pub use error::{ScalingError, ScalingErrorKind};
pub use vertical::{VerticalOutcome, VerticalScalingAdvisor};
