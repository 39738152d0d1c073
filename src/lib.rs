pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod schema;

pub use config::DiagnosticConfig;
pub use error::{ParseFailure, PlanError};
pub use plan::{Auth, CollectionPlan};
