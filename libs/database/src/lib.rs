pub mod pg_repository;
pub mod repository;

pub use pg_repository::{create_pool, PgRepository};
pub use repository::{AuditOutcome, DecisionWithDemographics, Repository};
