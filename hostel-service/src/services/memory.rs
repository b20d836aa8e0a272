//! In-process store for local development (`STORE_BACKEND=memory`) and the
//! test suite. Mirrors the uniqueness and conditional-update rules that the
//! MongoDB indexes and filters enforce.

use crate::models::{
    Complaint, Hostel, HostelFilter, Payment, PaymentFilter, PaymentStatus, PaymentType,
    PaymentUpdate, Reward, Room, Student, StudentFilter, User,
};
use crate::services::store::{HostelStore, Page};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    hostels: HashMap<String, Hostel>,
    rooms: HashMap<String, Room>,
    students: HashMap<String, Student>,
    payments: HashMap<String, Payment>,
    complaints: HashMap<String, Complaint>,
    rewards: HashMap<String, Reward>,
    users: HashMap<String, User>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_payment(payment: &Payment, filter: &PaymentFilter) -> bool {
    if let Some(ref hostel_id) = filter.hostel_id {
        if &payment.hostel_id != hostel_id {
            return false;
        }
    }
    if let Some(ref student_id) = filter.student_id {
        if &payment.student_id != student_id {
            return false;
        }
    }
    if filter.payment_type.is_some_and(|t| t != payment.payment_type) {
        return false;
    }
    if filter.month.is_some_and(|m| m != payment.month) {
        return false;
    }
    if filter.year.is_some_and(|y| y != payment.year) {
        return false;
    }
    match filter.status {
        Some(PaymentStatus::Overdue) => {
            let today = filter.today.unwrap_or_else(|| Utc::now().date_naive());
            payment.is_overdue(today)
        }
        Some(status) => payment.status == status,
        None => true,
    }
}

#[async_trait]
impl HostelStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_hostel(&self, hostel: &Hostel) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.hostels.insert(hostel.id.clone(), hostel.clone());
        Ok(())
    }

    async fn get_hostel(&self, id: &str) -> Result<Option<Hostel>, AppError> {
        Ok(self.inner.read().await.hostels.get(id).cloned())
    }

    async fn list_hostels(&self, filter: &HostelFilter) -> Result<Vec<Hostel>, AppError> {
        let inner = self.inner.read().await;
        let mut hostels: Vec<Hostel> = inner
            .hostels
            .values()
            .filter(|h| filter.owner_id.as_ref().is_none_or(|o| &h.owner_id == o))
            .filter(|h| filter.ids.as_ref().is_none_or(|ids| ids.contains(&h.id)))
            .filter(|h| !filter.active_only || h.is_active)
            .cloned()
            .collect();
        hostels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hostels)
    }

    async fn update_hostel(&self, hostel: &Hostel) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.hostels.get_mut(&hostel.id) {
            *existing = hostel.clone();
        }
        Ok(())
    }

    async fn insert_room(&self, room: &Room) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let taken = inner
            .rooms
            .values()
            .any(|r| r.hostel_id == room.hostel_id && r.number == room.number);
        if taken {
            return Err(AppError::conflict(
                "Room number already exists in this hostel",
            ));
        }
        inner.rooms.insert(room.id.clone(), room.clone());
        Ok(())
    }

    async fn get_room(&self, hostel_id: &str, id: &str) -> Result<Option<Room>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rooms
            .get(id)
            .filter(|r| r.hostel_id == hostel_id)
            .cloned())
    }

    async fn list_rooms(&self, hostel_id: &str) -> Result<Vec<Room>, AppError> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<Room> = inner
            .rooms
            .values()
            .filter(|r| r.hostel_id == hostel_id)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| (a.floor, &a.number).cmp(&(b.floor, &b.number)));
        Ok(rooms)
    }

    async fn update_room(&self, room: &Room) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let taken = inner.rooms.values().any(|r| {
            r.id != room.id && r.hostel_id == room.hostel_id && r.number == room.number
        });
        if taken {
            return Err(AppError::conflict(
                "Room number already exists in this hostel",
            ));
        }

        let existing = inner
            .rooms
            .get_mut(&room.id)
            .filter(|r| r.hostel_id == room.hostel_id)
            .ok_or_else(|| AppError::not_found("Room not found"))?;
        if existing.occupied > room.capacity {
            return Err(AppError::conflict(
                "Capacity cannot be lower than the beds already occupied",
            ));
        }

        existing.number = room.number.clone();
        existing.floor = room.floor;
        existing.room_type = room.room_type;
        existing.capacity = room.capacity;
        existing.is_active = room.is_active;
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_room(&self, hostel_id: &str, id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let removable = inner
            .rooms
            .get(id)
            .is_some_and(|r| r.hostel_id == hostel_id && r.occupied == 0);
        if removable {
            inner.rooms.remove(id);
        }
        Ok(removable)
    }

    async fn reserve_bed(&self, hostel_id: &str, room_id: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        match inner.rooms.get_mut(room_id) {
            Some(room) if room.hostel_id == hostel_id && room.is_active && !room.is_full() => {
                room.occupied += 1;
                room.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_bed(&self, hostel_id: &str, room_id: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if let Some(room) = inner.rooms.get_mut(room_id) {
            if room.hostel_id == hostel_id && room.occupied > 0 {
                room.occupied -= 1;
                room.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn insert_student(&self, student: &Student) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.students.insert(student.id.clone(), student.clone());
        Ok(())
    }

    async fn get_student(&self, hostel_id: &str, id: &str) -> Result<Option<Student>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .students
            .get(id)
            .filter(|s| s.hostel_id == hostel_id)
            .cloned())
    }

    async fn list_students(
        &self,
        hostel_id: &str,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, AppError> {
        let inner = self.inner.read().await;
        let mut students: Vec<Student> = inner
            .students
            .values()
            .filter(|s| s.hostel_id == hostel_id)
            .filter(|s| filter.is_active.is_none_or(|a| s.is_active == a))
            .filter(|s| {
                filter
                    .room_id
                    .as_ref()
                    .is_none_or(|r| s.room_id.as_ref() == Some(r))
            })
            .filter(|s| {
                filter
                    .user_id
                    .as_ref()
                    .is_none_or(|u| s.user_id.as_ref() == Some(u))
            })
            .cloned()
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(students)
    }

    async fn update_student(&self, student: &Student) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .students
            .get_mut(&student.id)
            .filter(|s| s.hostel_id == student.hostel_id)
        {
            *existing = student.clone();
        }
        Ok(())
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let duplicate_rent = payment.payment_type == PaymentType::Rent
            && inner.payments.values().any(|p| {
                p.payment_type == PaymentType::Rent
                    && p.student_id == payment.student_id
                    && p.month == payment.month
                    && p.year == payment.year
            });
        let duplicate_receipt = inner
            .payments
            .values()
            .any(|p| p.receipt_number == payment.receipt_number);

        if duplicate_rent || duplicate_receipt {
            return Err(AppError::conflict(
                "A rent invoice already exists for this student and period",
            ));
        }
        inner.payments.insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn get_payment(&self, hostel_id: &str, id: &str) -> Result<Option<Payment>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .get(id)
            .filter(|p| p.hostel_id == hostel_id)
            .cloned())
    }

    async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Payment>, u64), AppError> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| matches_payment(p, filter))
            .cloned()
            .collect();
        payments.sort_by(|a, b| {
            (b.year, b.month, b.created_at).cmp(&(a.year, a.month, a.created_at))
        });

        let total = payments.len() as u64;
        let payments = match page {
            Some(page) => payments
                .into_iter()
                .skip(page.skip as usize)
                .take(page.limit.max(0) as usize)
                .collect(),
            None => payments,
        };
        Ok((payments, total))
    }

    async fn count_payments(&self, filter: &PaymentFilter) -> Result<u64, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .values()
            .filter(|p| matches_payment(p, filter))
            .count() as u64)
    }

    async fn transition_payment(
        &self,
        hostel_id: &str,
        id: &str,
        expected: PaymentStatus,
        update: &PaymentUpdate,
    ) -> Result<Option<Payment>, AppError> {
        let mut inner = self.inner.write().await;
        match inner.payments.get_mut(id) {
            Some(payment) if payment.hostel_id == hostel_id && payment.status == expected => {
                update.apply(payment);
                Ok(Some(payment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn insert_complaint(&self, complaint: &Complaint) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner
            .complaints
            .insert(complaint.id.clone(), complaint.clone());
        Ok(())
    }

    async fn get_complaint(
        &self,
        hostel_id: &str,
        id: &str,
    ) -> Result<Option<Complaint>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .complaints
            .get(id)
            .filter(|c| c.hostel_id == hostel_id)
            .cloned())
    }

    async fn list_complaints(
        &self,
        hostel_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<Complaint>, AppError> {
        let inner = self.inner.read().await;
        let mut complaints: Vec<Complaint> = inner
            .complaints
            .values()
            .filter(|c| c.hostel_id == hostel_id)
            .filter(|c| student_id.is_none_or(|s| c.student_id == s))
            .cloned()
            .collect();
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    async fn update_complaint(&self, complaint: &Complaint) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .complaints
            .get_mut(&complaint.id)
            .filter(|c| c.hostel_id == complaint.hostel_id)
        {
            *existing = complaint.clone();
        }
        Ok(())
    }

    async fn insert_reward(&self, reward: &Reward) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.rewards.insert(reward.id.clone(), reward.clone());
        Ok(())
    }

    async fn list_rewards(
        &self,
        hostel_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<Reward>, AppError> {
        let inner = self.inner.read().await;
        let mut rewards: Vec<Reward> = inner
            .rewards
            .values()
            .filter(|r| r.hostel_id == hostel_id)
            .filter(|r| student_id.is_none_or(|s| r.student_id == s))
            .cloned()
            .collect();
        rewards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rewards)
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::conflict("A user with this email already exists"));
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, hostel_id: &str, id: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .get(id)
            .filter(|u| u.hostel_id == hostel_id)
            .cloned())
    }

    async fn list_users(&self, hostel_id: &str) -> Result<Vec<User>, AppError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.hostel_id == hostel_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .users
            .get_mut(&user.id)
            .filter(|u| u.hostel_id == user.hostel_id)
        {
            *existing = user.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPayment, RoomType};
    use rust_decimal::Decimal;

    fn rent(hostel_id: &str, student_id: &str) -> Payment {
        Payment::new(NewPayment {
            hostel_id: hostel_id.to_string(),
            student_id: student_id.to_string(),
            amount: Decimal::from(5000),
            payment_type: PaymentType::Rent,
            month: 3,
            year: 2025,
            due_day: 10,
            notes: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_rent_rejected() {
        let store = MemoryStore::new();
        store.insert_payment(&rent("h1", "s1")).await.unwrap();
        let err = store.insert_payment(&rent("h1", "s1")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // other students are unaffected
        store.insert_payment(&rent("h1", "s2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_rent_payments_may_repeat() {
        let store = MemoryStore::new();
        let mut fine = rent("h1", "s1");
        fine.payment_type = PaymentType::Fine;
        let mut second = fine.clone();
        second.id = "another".to_string();
        second.receipt_number = "RCP-202503-OTHER".to_string();

        store.insert_payment(&fine).await.unwrap();
        store.insert_payment(&second).await.unwrap();
    }

    #[tokio::test]
    async fn test_payment_lookup_is_tenant_scoped() {
        let store = MemoryStore::new();
        let payment = rent("h1", "s1");
        store.insert_payment(&payment).await.unwrap();

        assert!(store.get_payment("h1", &payment.id).await.unwrap().is_some());
        assert!(store.get_payment("h2", &payment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_requires_expected_status() {
        let store = MemoryStore::new();
        let payment = rent("h1", "s1");
        store.insert_payment(&payment).await.unwrap();

        let update = PaymentUpdate::status(PaymentStatus::Completed);
        let result = store
            .transition_payment("h1", &payment.id, PaymentStatus::Pending, &update)
            .await
            .unwrap();
        assert!(result.is_none());

        let stored = store.get_payment("h1", &payment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PaymentStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_bed_reservation_respects_capacity() {
        let store = MemoryStore::new();
        let room = Room::new("h1".to_string(), "101".to_string(), 1, RoomType::Single, 1);
        store.insert_room(&room).await.unwrap();

        assert!(store.reserve_bed("h1", &room.id).await.unwrap());
        assert!(!store.reserve_bed("h1", &room.id).await.unwrap());

        store.release_bed("h1", &room.id).await.unwrap();
        store.release_bed("h1", &room.id).await.unwrap();
        let stored = store.get_room("h1", &room.id).await.unwrap().unwrap();
        assert_eq!(stored.occupied, 0);
    }

    #[tokio::test]
    async fn test_occupied_room_cannot_be_deleted() {
        let store = MemoryStore::new();
        let room = Room::new("h1".to_string(), "101".to_string(), 1, RoomType::Double, 2);
        store.insert_room(&room).await.unwrap();
        store.reserve_bed("h1", &room.id).await.unwrap();

        assert!(!store.delete_room("h1", &room.id).await.unwrap());
        store.release_bed("h1", &room.id).await.unwrap();
        assert!(store.delete_room("h1", &room.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_room_number() {
        let store = MemoryStore::new();
        let room = Room::new("h1".to_string(), "101".to_string(), 1, RoomType::Double, 2);
        store.insert_room(&room).await.unwrap();
        let twin = Room::new("h1".to_string(), "101".to_string(), 2, RoomType::Single, 1);
        assert!(matches!(
            store.insert_room(&twin).await,
            Err(AppError::Conflict(_))
        ));

        // same number in another hostel is fine
        let elsewhere = Room::new("h2".to_string(), "101".to_string(), 1, RoomType::Single, 1);
        store.insert_room(&elsewhere).await.unwrap();
    }

    #[tokio::test]
    async fn test_room_update_errors() {
        let store = MemoryStore::new();
        let mut room = Room::new("h1".to_string(), "101".to_string(), 1, RoomType::Double, 2);
        store.insert_room(&room).await.unwrap();
        store.reserve_bed("h1", &room.id).await.unwrap();
        store.reserve_bed("h1", &room.id).await.unwrap();

        room.capacity = 1;
        assert!(matches!(
            store.update_room(&room).await,
            Err(AppError::Conflict(_))
        ));

        let missing = Room::new("h1".to_string(), "102".to_string(), 1, RoomType::Single, 1);
        assert!(matches!(
            store.update_room(&missing).await,
            Err(AppError::NotFound(_))
        ));

        // another hostel's room reads as missing
        let mut foreign = room.clone();
        foreign.hostel_id = "h2".to_string();
        foreign.capacity = 4;
        assert!(matches!(
            store.update_room(&foreign).await,
            Err(AppError::NotFound(_))
        ));
    }
}
