use crate::models::{
    Complaint, Hostel, HostelFilter, Payment, PaymentFilter, PaymentStatus, PaymentUpdate, Reward,
    Room, Student, StudentFilter, User,
};
use crate::services::store::{HostelStore, Page};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, DateTime as BsonDateTime, Document},
    error::{ErrorKind, WriteError, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for hostel-service");

        self.hostels()
            .create_indexes([index(doc! { "owner_id": 1 }, "owner_lookup")], None)
            .await?;

        self.rooms()
            .create_indexes(
                [unique_index(
                    doc! { "hostel_id": 1, "number": 1 },
                    "hostel_room_number_unique",
                )],
                None,
            )
            .await?;

        self.students()
            .create_indexes(
                [
                    index(doc! { "hostel_id": 1, "is_active": 1 }, "hostel_active_students"),
                    index(doc! { "hostel_id": 1, "user_id": 1 }, "hostel_student_user"),
                ],
                None,
            )
            .await?;

        // One RENT invoice per student and billing month, regardless of how
        // many generator runs race on it.
        let rent_unique = IndexModel::builder()
            .keys(doc! { "student_id": 1, "month": 1, "year": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_rent_period_unique".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "payment_type": "RENT" })
                    .build(),
            )
            .build();

        self.payments()
            .create_indexes(
                [
                    rent_unique,
                    unique_index(doc! { "receipt_number": 1 }, "receipt_number_unique"),
                    index(
                        doc! { "hostel_id": 1, "year": 1, "month": 1, "payment_type": 1 },
                        "hostel_period_lookup",
                    ),
                    index(doc! { "hostel_id": 1, "status": 1 }, "hostel_status_lookup"),
                    index(doc! { "hostel_id": 1, "student_id": 1 }, "hostel_student_lookup"),
                ],
                None,
            )
            .await?;

        self.complaints()
            .create_indexes(
                [
                    index(doc! { "hostel_id": 1, "status": 1 }, "hostel_complaint_status"),
                    index(doc! { "hostel_id": 1, "student_id": 1 }, "hostel_complaint_student"),
                ],
                None,
            )
            .await?;

        self.rewards()
            .create_indexes(
                [index(doc! { "hostel_id": 1, "student_id": 1 }, "hostel_reward_student")],
                None,
            )
            .await?;

        self.users()
            .create_indexes(
                [
                    unique_index(doc! { "email": 1 }, "user_email_unique"),
                    index(doc! { "hostel_id": 1 }, "hostel_users"),
                ],
                None,
            )
            .await?;

        tracing::info!("Hostel service indexes initialized");
        Ok(())
    }

    pub fn hostels(&self) -> Collection<Hostel> {
        self.db.collection("hostels")
    }

    pub fn rooms(&self) -> Collection<Room> {
        self.db.collection("rooms")
    }

    pub fn students(&self) -> Collection<Student> {
        self.db.collection("students")
    }

    pub fn payments(&self) -> Collection<Payment> {
        self.db.collection("payments")
    }

    pub fn complaints(&self) -> Collection<Complaint> {
        self.db.collection("complaints")
    }

    pub fn rewards(&self) -> Collection<Reward> {
        self.db.collection("rewards")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

fn index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

fn unique_index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(
            IndexOptions::builder()
                .name(name.to_string())
                .unique(true)
                .build(),
        )
        .build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. })) if *code == DUPLICATE_KEY
    )
}

/// Maps a duplicate-key failure to `Conflict(message)`, anything else to a
/// database error.
fn map_write_error(err: mongodb::error::Error, message: &str) -> AppError {
    if is_duplicate_key(&err) {
        AppError::conflict(message)
    } else {
        AppError::from(err)
    }
}

fn sorted(sort: Document) -> FindOptions {
    FindOptions::builder().sort(sort).build()
}

fn payment_filter_doc(filter: &PaymentFilter) -> Result<Document, AppError> {
    let mut query = Document::new();

    if let Some(ref hostel_id) = filter.hostel_id {
        query.insert("hostel_id", hostel_id);
    }
    if let Some(ref student_id) = filter.student_id {
        query.insert("student_id", student_id);
    }
    if let Some(payment_type) = filter.payment_type {
        query.insert("payment_type", to_bson(&payment_type)?);
    }
    if let Some(month) = filter.month {
        query.insert("month", month);
    }
    if let Some(year) = filter.year {
        query.insert("year", year);
    }

    match filter.status {
        Some(PaymentStatus::Overdue) => {
            query.insert("status", to_bson(&PaymentStatus::Unpaid)?);
            let today = filter
                .today
                .unwrap_or_else(|| chrono::Utc::now().date_naive());
            // NaiveDate is stored as an ISO string, which orders correctly
            query.insert("due_date", doc! { "$lt": today.to_string() });
        }
        Some(status) => {
            query.insert("status", to_bson(&status)?);
        }
        None => {}
    }

    Ok(query)
}

fn payment_update_doc(update: &PaymentUpdate) -> Result<Document, AppError> {
    let mut set = doc! {
        "status": to_bson(&update.status)?,
        "updated_at": BsonDateTime::now(),
    };
    if let Some(method) = update.method {
        set.insert("method", to_bson(&method)?);
    }
    if let Some(ref proof) = update.proof_image {
        set.insert("proof_image", proof);
    }
    if let Some(ref reference) = update.transaction_ref {
        set.insert("transaction_ref", reference);
    }
    if let Some(verified) = update.is_verified {
        set.insert("is_verified", verified);
    }
    if let Some(ref by) = update.verified_by {
        set.insert("verified_by", by);
    }
    if let Some(at) = update.verified_at {
        set.insert("verified_at", at);
    }
    if let Some(ref reason) = update.status_reason {
        set.insert("status_reason", reason);
    }
    Ok(doc! { "$set": set })
}

#[async_trait]
impl HostelStore for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn insert_hostel(&self, hostel: &Hostel) -> Result<(), AppError> {
        self.hostels().insert_one(hostel, None).await?;
        Ok(())
    }

    async fn get_hostel(&self, id: &str) -> Result<Option<Hostel>, AppError> {
        Ok(self.hostels().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_hostels(&self, filter: &HostelFilter) -> Result<Vec<Hostel>, AppError> {
        let mut query = Document::new();
        if let Some(ref owner_id) = filter.owner_id {
            query.insert("owner_id", owner_id);
        }
        if let Some(ref ids) = filter.ids {
            query.insert("_id", doc! { "$in": ids.clone() });
        }
        if filter.active_only {
            query.insert("is_active", true);
        }

        let cursor = self
            .hostels()
            .find(query, sorted(doc! { "name": 1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_hostel(&self, hostel: &Hostel) -> Result<(), AppError> {
        self.hostels()
            .replace_one(doc! { "_id": &hostel.id }, hostel, None)
            .await?;
        Ok(())
    }

    async fn insert_room(&self, room: &Room) -> Result<(), AppError> {
        self.rooms()
            .insert_one(room, None)
            .await
            .map_err(|e| map_write_error(e, "Room number already exists in this hostel"))?;
        Ok(())
    }

    async fn get_room(&self, hostel_id: &str, id: &str) -> Result<Option<Room>, AppError> {
        Ok(self
            .rooms()
            .find_one(doc! { "_id": id, "hostel_id": hostel_id }, None)
            .await?)
    }

    async fn list_rooms(&self, hostel_id: &str) -> Result<Vec<Room>, AppError> {
        let cursor = self
            .rooms()
            .find(
                doc! { "hostel_id": hostel_id },
                sorted(doc! { "floor": 1, "number": 1 }),
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_room(&self, room: &Room) -> Result<(), AppError> {
        let result = self
            .rooms()
            .update_one(
                doc! {
                    "_id": &room.id,
                    "hostel_id": &room.hostel_id,
                    "occupied": { "$lte": room.capacity },
                },
                doc! {
                    "$set": {
                        "number": &room.number,
                        "floor": room.floor,
                        "room_type": to_bson(&room.room_type)?,
                        "capacity": room.capacity,
                        "is_active": room.is_active,
                        "updated_at": BsonDateTime::now(),
                    }
                },
                None,
            )
            .await
            .map_err(|e| map_write_error(e, "Room number already exists in this hostel"))?;

        if result.matched_count == 0 {
            let exists = self
                .rooms()
                .count_documents(doc! { "_id": &room.id, "hostel_id": &room.hostel_id }, None)
                .await?;
            if exists == 0 {
                return Err(AppError::not_found("Room not found"));
            }
            return Err(AppError::conflict(
                "Capacity cannot be lower than the beds already occupied",
            ));
        }
        Ok(())
    }

    async fn delete_room(&self, hostel_id: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .rooms()
            .delete_one(
                doc! { "_id": id, "hostel_id": hostel_id, "occupied": 0 },
                None,
            )
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn reserve_bed(&self, hostel_id: &str, room_id: &str) -> Result<bool, AppError> {
        let result = self
            .rooms()
            .update_one(
                doc! {
                    "_id": room_id,
                    "hostel_id": hostel_id,
                    "is_active": true,
                    "$expr": { "$lt": ["$occupied", "$capacity"] },
                },
                doc! {
                    "$inc": { "occupied": 1 },
                    "$set": { "updated_at": BsonDateTime::now() },
                },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn release_bed(&self, hostel_id: &str, room_id: &str) -> Result<(), AppError> {
        self.rooms()
            .update_one(
                doc! { "_id": room_id, "hostel_id": hostel_id, "occupied": { "$gt": 0 } },
                doc! {
                    "$inc": { "occupied": -1 },
                    "$set": { "updated_at": BsonDateTime::now() },
                },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_student(&self, student: &Student) -> Result<(), AppError> {
        self.students().insert_one(student, None).await?;
        Ok(())
    }

    async fn get_student(&self, hostel_id: &str, id: &str) -> Result<Option<Student>, AppError> {
        Ok(self
            .students()
            .find_one(doc! { "_id": id, "hostel_id": hostel_id }, None)
            .await?)
    }

    async fn list_students(
        &self,
        hostel_id: &str,
        filter: &StudentFilter,
    ) -> Result<Vec<Student>, AppError> {
        let mut query = doc! { "hostel_id": hostel_id };
        if let Some(active) = filter.is_active {
            query.insert("is_active", active);
        }
        if let Some(ref room_id) = filter.room_id {
            query.insert("room_id", room_id);
        }
        if let Some(ref user_id) = filter.user_id {
            query.insert("user_id", user_id);
        }

        let cursor = self
            .students()
            .find(query, sorted(doc! { "name": 1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_student(&self, student: &Student) -> Result<(), AppError> {
        self.students()
            .replace_one(
                doc! { "_id": &student.id, "hostel_id": &student.hostel_id },
                student,
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), AppError> {
        self.payments().insert_one(payment, None).await.map_err(|e| {
            map_write_error(
                e,
                "A rent invoice already exists for this student and period",
            )
        })?;
        Ok(())
    }

    async fn get_payment(&self, hostel_id: &str, id: &str) -> Result<Option<Payment>, AppError> {
        Ok(self
            .payments()
            .find_one(doc! { "_id": id, "hostel_id": hostel_id }, None)
            .await?)
    }

    async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Payment>, u64), AppError> {
        let query = payment_filter_doc(filter)?;
        let total = self.payments().count_documents(query.clone(), None).await?;

        let mut options = FindOptions::builder()
            .sort(doc! { "year": -1, "month": -1, "created_at": -1 })
            .build();
        if let Some(page) = page {
            options.skip = Some(page.skip);
            options.limit = Some(page.limit);
        }

        let cursor = self.payments().find(query, options).await?;
        let payments: Vec<Payment> = cursor.try_collect().await?;
        Ok((payments, total))
    }

    async fn count_payments(&self, filter: &PaymentFilter) -> Result<u64, AppError> {
        let query = payment_filter_doc(filter)?;
        Ok(self.payments().count_documents(query, None).await?)
    }

    async fn transition_payment(
        &self,
        hostel_id: &str,
        id: &str,
        expected: PaymentStatus,
        update: &PaymentUpdate,
    ) -> Result<Option<Payment>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .payments()
            .find_one_and_update(
                doc! {
                    "_id": id,
                    "hostel_id": hostel_id,
                    "status": to_bson(&expected)?,
                },
                payment_update_doc(update)?,
                options,
            )
            .await?)
    }

    async fn insert_complaint(&self, complaint: &Complaint) -> Result<(), AppError> {
        self.complaints().insert_one(complaint, None).await?;
        Ok(())
    }

    async fn get_complaint(
        &self,
        hostel_id: &str,
        id: &str,
    ) -> Result<Option<Complaint>, AppError> {
        Ok(self
            .complaints()
            .find_one(doc! { "_id": id, "hostel_id": hostel_id }, None)
            .await?)
    }

    async fn list_complaints(
        &self,
        hostel_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<Complaint>, AppError> {
        let mut query = doc! { "hostel_id": hostel_id };
        if let Some(student_id) = student_id {
            query.insert("student_id", student_id);
        }
        let cursor = self
            .complaints()
            .find(query, sorted(doc! { "created_at": -1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_complaint(&self, complaint: &Complaint) -> Result<(), AppError> {
        self.complaints()
            .replace_one(
                doc! { "_id": &complaint.id, "hostel_id": &complaint.hostel_id },
                complaint,
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_reward(&self, reward: &Reward) -> Result<(), AppError> {
        self.rewards().insert_one(reward, None).await?;
        Ok(())
    }

    async fn list_rewards(
        &self,
        hostel_id: &str,
        student_id: Option<&str>,
    ) -> Result<Vec<Reward>, AppError> {
        let mut query = doc! { "hostel_id": hostel_id };
        if let Some(student_id) = student_id {
            query.insert("student_id", student_id);
        }
        let cursor = self
            .rewards()
            .find(query, sorted(doc! { "created_at": -1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(|e| map_write_error(e, "A user with this email already exists"))?;
        Ok(())
    }

    async fn get_user(&self, hostel_id: &str, id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one(doc! { "_id": id, "hostel_id": hostel_id }, None)
            .await?)
    }

    async fn list_users(&self, hostel_id: &str) -> Result<Vec<User>, AppError> {
        let cursor = self
            .users()
            .find(doc! { "hostel_id": hostel_id }, sorted(doc! { "name": 1 }))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        self.users()
            .replace_one(
                doc! { "_id": &user.id, "hostel_id": &user.hostel_id },
                user,
                None,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentType;
    use chrono::NaiveDate;

    #[test]
    fn test_overdue_filter_targets_unpaid_past_due() {
        let filter = PaymentFilter {
            hostel_id: Some("h1".to_string()),
            status: Some(PaymentStatus::Overdue),
            today: NaiveDate::from_ymd_opt(2025, 3, 15),
            ..Default::default()
        };
        let query = payment_filter_doc(&filter).unwrap();
        assert_eq!(query.get_str("status").unwrap(), "UNPAID");
        assert_eq!(
            query.get_document("due_date").unwrap(),
            &doc! { "$lt": "2025-03-15" }
        );
    }

    #[test]
    fn test_period_filter() {
        let filter = PaymentFilter {
            hostel_id: Some("h1".to_string()),
            payment_type: Some(PaymentType::Rent),
            month: Some(3),
            year: Some(2025),
            ..Default::default()
        };
        let query = payment_filter_doc(&filter).unwrap();
        assert_eq!(query.get_str("payment_type").unwrap(), "RENT");
        assert_eq!(query.get_i32("month").unwrap(), 3);
        assert_eq!(query.get_i32("year").unwrap(), 2025);
        assert!(query.get("status").is_none());
    }

    #[test]
    fn test_verify_update_sets_audit_fields() {
        let mut update = PaymentUpdate::status(PaymentStatus::Completed);
        update.is_verified = Some(true);
        update.verified_by = Some("manager-1".to_string());
        update.verified_at = Some(BsonDateTime::now());

        let set = payment_update_doc(&update).unwrap();
        let set = set.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "COMPLETED");
        assert!(set.get_bool("is_verified").unwrap());
        assert_eq!(set.get_str("verified_by").unwrap(), "manager-1");
        assert!(set.get_datetime("verified_at").is_ok());
        assert!(set.get("proof_image").is_none());
    }
}
