pub mod validation;

pub use validation::{validate_positive_amount, OptionalValidatedJson, ValidatedJson};
