pub mod audit_log;
pub mod borrower;
pub mod credit_decision;
pub mod decision_lineage;
pub mod decision_type;
pub mod feature_vector;
pub mod loan_request;
pub mod raw_event;

pub use audit_log::AuditLogRow;
pub use borrower::Borrower;
pub use credit_decision::CreditDecisionRow;
pub use decision_lineage::DecisionLineageRow;
pub use decision_type::DecisionType;
pub use feature_vector::FeatureVectorRow;
pub use loan_request::LoanRequest;
pub use raw_event::RawEvent;
