pub mod context;

pub use context::{RequestContext, HOSTEL_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
