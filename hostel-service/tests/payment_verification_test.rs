mod common;

use common::{Caller, TestApp, MANAGER_ID, OTHER_OWNER_ID, OWNER_ID};
use reqwest::Method;
use serde_json::{json, Value};

struct Billed {
    hostel_id: String,
    payment_id: String,
    student_user: String,
}

/// One hostel, one student with a login, one March invoice.
async fn billed_student(app: &TestApp) -> Billed {
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    let student_user = "student-user-1".to_string();
    app.create_student(&hostel_id, "Amina", 5000, Some(&student_user))
        .await;
    assert_eq!(app.generate(&hostel_id, 3, 2025).await.status(), 201);

    let list = app.list_payments(&hostel_id, "").await;
    let payment_id = list["payments"][0]["id"].as_str().unwrap().to_string();
    Billed {
        hostel_id,
        payment_id,
        student_user,
    }
}

fn payment_path(billed: &Billed, action: &str) -> String {
    format!(
        "/hostels/{}/payments/{}{}",
        billed.hostel_id, billed.payment_id, action
    )
}

async fn submit_proof(app: &TestApp, billed: &Billed) -> reqwest::Response {
    app.post(
        &payment_path(billed, "/proof"),
        &Caller::student(&billed.student_user, &billed.hostel_id),
        json!({
            "proof_image": "uploads/receipts/march.jpg",
            "transaction_ref": "MM-88231",
            "method": "MOBILE_MONEY",
        }),
    )
    .await
}

#[tokio::test]
async fn proof_then_verify_completes_the_payment() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;

    let response = submit_proof(&app, &billed).await;
    assert_eq!(response.status(), 200);
    let pending: Value = response.json().await.unwrap();
    assert_eq!(pending["status"], "PENDING");
    assert_eq!(pending["proof_image"], "uploads/receipts/march.jpg");
    assert_eq!(pending["is_verified"], false);

    let response = app
        .post(
            &payment_path(&billed, "/verify"),
            &Caller::manager(&billed.hostel_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 200);
    let verified: Value = response.json().await.unwrap();
    assert_eq!(verified["status"], "COMPLETED");
    assert_eq!(verified["is_verified"], true);
    assert_eq!(verified["verified_by"], MANAGER_ID);
    assert!(verified["verified_at"].is_string());
    assert_eq!(verified["student_name"], "Amina");
}

#[tokio::test]
async fn second_verification_conflicts_and_leaves_record_unchanged() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    submit_proof(&app, &billed).await;

    let manager = Caller::manager(&billed.hostel_id);
    let first: Value = app
        .post(&payment_path(&billed, "/verify"), &manager, json!({}))
        .await
        .json()
        .await
        .unwrap();

    let response = app
        .post(&payment_path(&billed, "/verify"), &manager, json!({}))
        .await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Payment is already verified");

    let current: Value = app
        .get(&payment_path(&billed, ""), &manager)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(current["verified_at"], first["verified_at"]);
    assert_eq!(current["updated_at"], first["updated_at"]);
}

#[tokio::test]
async fn unpaid_invoice_cannot_be_verified() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;

    let response = app
        .post(
            &payment_path(&billed, "/verify"),
            &Caller::manager(&billed.hostel_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 400);

    let current: Value = app
        .get(&payment_path(&billed, ""), &Caller::manager(&billed.hostel_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(current["status"], "UNPAID");
}

#[tokio::test]
async fn student_cannot_verify() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    submit_proof(&app, &billed).await;

    let response = app
        .post(
            &payment_path(&billed, "/verify"),
            &Caller::student(&billed.student_user, &billed.hostel_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn manager_of_another_hostel_gets_not_found() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    submit_proof(&app, &billed).await;
    let other_hostel = app.create_hostel(OTHER_OWNER_ID, "Elsewhere").await;

    // through their own hostel path
    let response = app
        .post(
            &format!(
                "/hostels/{}/payments/{}/verify",
                other_hostel, billed.payment_id
            ),
            &Caller::manager(&other_hostel),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 404);

    // through the payment's real hostel path
    let response = app
        .post(
            &payment_path(&billed, "/verify"),
            &Caller::manager(&other_hostel),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 404);

    // the other owner cannot see it either
    let response = app
        .get(&payment_path(&billed, ""), &Caller::owner(OTHER_OWNER_ID))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn students_only_see_their_own_payments() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    app.create_student(&billed.hostel_id, "Brian", 6000, Some("student-user-2"))
        .await;
    let outcome: Value = app
        .generate(&billed.hostel_id, 4, 2025)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(outcome["created"], 2);

    let other = Caller::student("student-user-2", &billed.hostel_id);
    let list: Value = app
        .get(&format!("/hostels/{}/payments", billed.hostel_id), &other)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 1);
    assert_eq!(list["payments"][0]["student_name"], "Brian");

    let response = app.get(&payment_path(&billed, ""), &other).await;
    assert_eq!(response.status(), 404);

    let response = app
        .post(
            &payment_path(&billed, "/proof"),
            &other,
            json!({ "proof_image": "uploads/not-mine.jpg" }),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn rejected_proof_ends_in_failed() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    submit_proof(&app, &billed).await;

    let response = app
        .post(
            &payment_path(&billed, "/reject"),
            &Caller::manager(&billed.hostel_id),
            json!({ "reason": "Transfer not received" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let failed: Value = response.json().await.unwrap();
    assert_eq!(failed["status"], "FAILED");
    assert_eq!(failed["status_reason"], "Transfer not received");
    assert_eq!(failed["is_verified"], false);

    // terminal: a new proof is not accepted
    let response = submit_proof(&app, &billed).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn reject_with_invalid_reason_body_changes_nothing() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    submit_proof(&app, &billed).await;
    let manager = Caller::manager(&billed.hostel_id);

    let response = app
        .post(
            &payment_path(&billed, "/reject"),
            &manager,
            json!({ "reason": "x".repeat(5000) }),
        )
        .await;
    assert_eq!(response.status(), 422);

    let response = app
        .request(Method::POST, &payment_path(&billed, "/reject"), &manager)
        .header("Content-Type", "application/json")
        .body("{\"reason\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = app.get(&payment_path(&billed, ""), &manager).await;
    let payment: Value = response.json().await.unwrap();
    assert_eq!(payment["status"], "PENDING");
    assert!(payment["status_reason"].is_null());
}

#[tokio::test]
async fn reject_without_body_is_accepted() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    submit_proof(&app, &billed).await;

    let response = app
        .request(
            Method::POST,
            &payment_path(&billed, "/reject"),
            &Caller::manager(&billed.hostel_id),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let failed: Value = response.json().await.unwrap();
    assert_eq!(failed["status"], "FAILED");
    assert!(failed["status_reason"].is_null());
}

#[tokio::test]
async fn oversized_page_returns_empty_list() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;

    let list = app
        .list_payments(&billed.hostel_id, &format!("?page={}", u64::MAX))
        .await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["payments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn refund_requires_owner_and_completed_payment() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;
    let owner = Caller::owner(OWNER_ID);

    let response = app
        .post(&payment_path(&billed, "/refund"), &owner, json!({}))
        .await;
    assert_eq!(response.status(), 409, "unpaid invoice cannot be refunded");

    submit_proof(&app, &billed).await;
    app.post(
        &payment_path(&billed, "/verify"),
        &Caller::manager(&billed.hostel_id),
        json!({}),
    )
    .await;

    let response = app
        .post(
            &payment_path(&billed, "/refund"),
            &Caller::manager(&billed.hostel_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 403);

    let response = app
        .post(
            &payment_path(&billed, "/refund"),
            &owner,
            json!({ "reason": "Overpaid" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let refunded: Value = response.json().await.unwrap();
    assert_eq!(refunded["status"], "REFUNDED");
}

#[tokio::test]
async fn past_due_invoice_reads_overdue() {
    let app = TestApp::spawn().await;
    let billed = billed_student(&app).await;

    // March 2025 is long past its due date
    let list = app.list_payments(&billed.hostel_id, "?status=OVERDUE").await;
    assert_eq!(list["total"], 1);
    assert_eq!(list["payments"][0]["status"], "UNPAID");
    assert_eq!(list["payments"][0]["effective_status"], "OVERDUE");

    submit_proof(&app, &billed).await;
    let list = app.list_payments(&billed.hostel_id, "?status=OVERDUE").await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn manager_records_desk_payment() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    let student_id = app.create_student(&hostel_id, "Amina", 5000, None).await;

    let response = app
        .post(
            &format!("/hostels/{}/payments", hostel_id),
            &Caller::manager(&hostel_id),
            json!({
                "student_id": student_id,
                "amount": 250,
                "payment_type": "FINE",
                "month": 3,
                "year": 2025,
                "method": "CASH",
                "paid": true,
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let payment: Value = response.json().await.unwrap();
    assert_eq!(payment["status"], "COMPLETED");
    assert_eq!(payment["is_verified"], true);
    assert_eq!(payment["amount"], "250");

    // a fine does not block rent generation for the month
    assert_eq!(app.generate(&hostel_id, 3, 2025).await.status(), 201);
}
