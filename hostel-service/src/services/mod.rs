pub mod access;
pub mod billing;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod reports;
pub mod scheduler;
pub mod store;

pub use billing::{BillingService, GenerationOutcome, GenerationSummary, ManualPayment, ProofSubmission};
pub use database::MongoStore;
pub use memory::MemoryStore;
pub use scheduler::InvoiceScheduler;
pub use store::{HostelStore, Page};
