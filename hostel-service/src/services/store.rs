use crate::models::{
    Complaint, Hostel, HostelFilter, Payment, PaymentFilter, PaymentStatus, PaymentUpdate, Reward,
    Room, Student, StudentFilter, User,
};
use async_trait::async_trait;
use service_core::error::AppError;

/// Offset pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub skip: u64,
    pub limit: i64,
}

impl Page {
    /// Builds a window from 1-based `page` and `page_size` query params,
    /// clamping the size to 1..=100. The offset saturates at `i64::MAX`, the
    /// largest skip MongoDB accepts, so an oversized page reads as empty.
    pub fn from_params(page: Option<u64>, page_size: Option<u64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(20).clamp(1, 100);
        Self {
            skip: (page - 1).saturating_mul(page_size).min(i64::MAX as u64),
            limit: page_size as i64,
        }
    }
}

/// Persistence for every hostel-scoped collection.
///
/// Lookups by id take the hostel id as well and must filter on both, so a
/// record outside the caller's tenant reads as missing. Unique-constraint
/// violations surface as `AppError::Conflict`.
#[async_trait]
pub trait HostelStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn insert_hostel(&self, hostel: &Hostel) -> Result<(), AppError>;
    async fn get_hostel(&self, id: &str) -> Result<Option<Hostel>, AppError>;
    async fn list_hostels(&self, filter: &HostelFilter) -> Result<Vec<Hostel>, AppError>;
    async fn update_hostel(&self, hostel: &Hostel) -> Result<(), AppError>;

    async fn insert_room(&self, room: &Room) -> Result<(), AppError>;
    async fn get_room(&self, hostel_id: &str, id: &str) -> Result<Option<Room>, AppError>;
    async fn list_rooms(&self, hostel_id: &str) -> Result<Vec<Room>, AppError>;
    /// Replaces descriptive fields; `occupied` is only changed through
    /// [`reserve_bed`](Self::reserve_bed) and [`release_bed`](Self::release_bed).
    async fn update_room(&self, room: &Room) -> Result<(), AppError>;
    async fn delete_room(&self, hostel_id: &str, id: &str) -> Result<bool, AppError>;
    /// Takes one bed if the room is active and not full. Returns false otherwise.
    async fn reserve_bed(&self, hostel_id: &str, room_id: &str) -> Result<bool, AppError>;
    /// Frees one bed; never drops below zero.
    async fn release_bed(&self, hostel_id: &str, room_id: &str) -> Result<(), AppError>;

    async fn insert_student(&self, student: &Student) -> Result<(), AppError>;
    async fn get_student(&self, hostel_id: &str, id: &str) -> Result<Option<Student>, AppError>;
    async fn list_students(
        &self,
        hostel_id: &str,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, AppError>;
    async fn update_student(&self, student: &Student) -> Result<(), AppError>;

    /// Fails with `Conflict` when a RENT payment already exists for the
    /// student and period, or the receipt number is taken.
    async fn insert_payment(&self, payment: &Payment) -> Result<(), AppError>;
    async fn get_payment(&self, hostel_id: &str, id: &str) -> Result<Option<Payment>, AppError>;
    /// Newest first. Returns the page and the total match count.
    async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Payment>, u64), AppError>;
    async fn count_payments(&self, filter: &PaymentFilter) -> Result<u64, AppError>;
    /// Applies `update` only if the stored status is still `expected`.
    /// Returns the updated record, or `None` when nothing matched.
    async fn transition_payment(
        &self,
        hostel_id: &str,
        id: &str,
        expected: PaymentStatus,
        update: &PaymentUpdate,
    ) -> Result<Option<Payment>, AppError>;

    async fn insert_complaint(&self, complaint: &Complaint) -> Result<(), AppError>;
    async fn get_complaint(&self, hostel_id: &str, id: &str)
        -> Result<Option<Complaint>, AppError>;
    async fn list_complaints(
        &self,
        hostel_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<Complaint>, AppError>;
    async fn update_complaint(&self, complaint: &Complaint) -> Result<(), AppError>;

    async fn insert_reward(&self, reward: &Reward) -> Result<(), AppError>;
    async fn list_rewards(
        &self,
        hostel_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<Reward>, AppError>;

    /// Fails with `Conflict` when the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn get_user(&self, hostel_id: &str, id: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self, hostel_id: &str) -> Result<Vec<User>, AppError>;
    async fn update_user(&self, user: &User) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults() {
        let page = Page::from_params(None, None);
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 20);
    }

    #[test]
    fn test_page_clamps() {
        let page = Page::from_params(Some(0), Some(500));
        assert_eq!(page.skip, 0);
        assert_eq!(page.limit, 100);

        let page = Page::from_params(Some(3), Some(10));
        assert_eq!(page.skip, 20);
    }

    #[test]
    fn test_page_offset_saturates() {
        let page = Page::from_params(Some(u64::MAX), Some(20));
        assert_eq!(page.skip, i64::MAX as u64);
        assert_eq!(page.limit, 20);
    }
}
