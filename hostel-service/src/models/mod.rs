//! Domain models for hostel-service.

mod complaint;
mod hostel;
mod payment;
mod reward;
mod role;
mod room;
mod student;
mod user;

pub use complaint::{Complaint, ComplaintCategory, ComplaintPriority, ComplaintStatus};
pub use hostel::{Hostel, HostelFilter};
pub use payment::{
    current_period, due_date_for, generate_receipt_number, NewPayment, Payment, PaymentError,
    PaymentFilter, PaymentMethod, PaymentStatus, PaymentType, PaymentUpdate,
};
pub use reward::Reward;
pub use role::Role;
pub use room::{Room, RoomType};
pub use student::{NewStudent, Student, StudentFilter};
pub use user::User;
