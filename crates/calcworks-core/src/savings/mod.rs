pub mod projection;

pub use projection::{
    compute_projection, ContributionTiming, ProjectionInput, ProjectionOutput, ProjectionPoint,
};
