pub mod complaints;
pub mod hostels;
pub mod managers;
pub mod payments;
pub mod reports;
pub mod rewards;
pub mod rooms;
pub mod students;

pub use complaints::{
    ComplaintListParams, ComplaintResponse, CreateComplaintRequest, UpdateComplaintRequest,
};
pub use hostels::{CreateHostelRequest, HostelListParams, HostelResponse, UpdateHostelRequest};
pub use managers::{CreateManagerRequest, ManagerResponse};
pub use payments::{
    CreatePaymentRequest, GenerateInvoicesRequest, PaymentListParams, PaymentListResponse,
    PaymentResponse, StatusReasonRequest, SubmitProofRequest,
};
pub use reports::ReportParams;
pub use rewards::{CreateRewardRequest, RewardListParams, RewardListResponse, RewardResponse};
pub use rooms::{CreateRoomRequest, RoomResponse, UpdateRoomRequest};
pub use students::{
    AssignRoomRequest, CreateStudentRequest, StudentListParams, StudentListResponse,
    StudentResponse, UpdateStudentRequest,
};
