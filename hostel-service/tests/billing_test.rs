mod common;

use common::{Caller, TestApp, OTHER_OWNER_ID, OWNER_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn generates_one_unpaid_rent_invoice_per_active_student() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    for (name, fee) in [("Amina", 5000), ("Brian", 6000), ("Chloe", 7000)] {
        app.create_student(&hostel_id, name, fee, None).await;
    }

    let response = app.generate(&hostel_id, 3, 2025).await;
    assert_eq!(response.status(), 201);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["created"], 3);
    assert_eq!(outcome["skipped"], 0);
    assert_eq!(outcome["failed"], 0);

    let list = app.list_payments(&hostel_id, "?month=3&year=2025").await;
    assert_eq!(list["total"], 3);

    let mut amounts: Vec<String> = list["payments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            assert_eq!(p["status"], "UNPAID");
            assert_eq!(p["payment_type"], "RENT");
            assert_eq!(p["due_date"], "2025-03-10");
            assert!(p["receipt_number"].as_str().unwrap().starts_with("RCP-202503-"));
            p["amount"].as_str().unwrap().to_string()
        })
        .collect();
    amounts.sort();
    assert_eq!(amounts, vec!["5000", "6000", "7000"]);
}

#[tokio::test]
async fn second_trigger_is_rejected_and_count_is_unchanged() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    for (name, fee) in [("Amina", 5000), ("Brian", 6000), ("Chloe", 7000)] {
        app.create_student(&hostel_id, name, fee, None).await;
    }

    assert_eq!(app.generate(&hostel_id, 3, 2025).await.status(), 201);

    let response = app.generate(&hostel_id, 3, 2025).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Invoices already exist"));

    let list = app.list_payments(&hostel_id, "?month=3&year=2025").await;
    assert_eq!(list["total"], 3);
}

#[tokio::test]
async fn students_who_left_are_not_billed() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    app.create_student(&hostel_id, "Amina", 5000, None).await;
    let leaving = app.create_student(&hostel_id, "Brian", 6000, None).await;

    let response = app
        .post(
            &format!("/hostels/{}/students/{}/leave", hostel_id, leaving),
            &Caller::manager(&hostel_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), 200);

    let outcome: Value = app.generate(&hostel_id, 3, 2025).await.json().await.unwrap();
    assert_eq!(outcome["created"], 1);
}

#[tokio::test]
async fn inactive_hostel_cannot_be_billed() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    app.create_student(&hostel_id, "Amina", 5000, None).await;

    let response = app
        .delete(&format!("/hostels/{}", hostel_id), &Caller::owner(OWNER_ID))
        .await;
    assert_eq!(response.status(), 200);

    assert_eq!(app.generate(&hostel_id, 3, 2025).await.status(), 400);
    let list = app.list_payments(&hostel_id, "").await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn invalid_period_is_rejected() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;

    assert_eq!(app.generate(&hostel_id, 13, 2025).await.status(), 422);
    assert_eq!(app.generate(&hostel_id, 3, 1999).await.status(), 422);
}

#[tokio::test]
async fn student_cannot_trigger_generation() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;

    let response = app
        .post(
            &format!("/hostels/{}/payments/generate", hostel_id),
            &Caller::student("student-1", &hostel_id),
            json!({ "month": 3, "year": 2025 }),
        )
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn owner_trigger_covers_all_owned_hostels() {
    let app = TestApp::spawn().await;
    let first = app.create_hostel(OWNER_ID, "First").await;
    let second = app.create_hostel(OWNER_ID, "Second").await;
    let foreign = app.create_hostel(OTHER_OWNER_ID, "Elsewhere").await;
    app.create_student(&first, "Amina", 5000, None).await;
    app.create_student(&second, "Brian", 6000, None).await;
    app.create_student(&foreign, "Chloe", 7000, None).await;

    assert_eq!(app.generate(&first, 3, 2025).await.status(), 201);

    let response = app
        .post(
            "/payments/generate",
            &Caller::owner(OWNER_ID),
            json!({ "month": 3, "year": 2025 }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["total_created"], 1);
    assert_eq!(summary["already_generated"], json!([first]));
    assert_eq!(summary["outcomes"][0]["hostel_id"], second.as_str());

    // the other owner's hostel was not touched
    let list = app.list_payments(&foreign, "").await;
    assert_eq!(list["total"], 0);

    // everything in scope is now billed
    let response = app
        .post(
            "/payments/generate",
            &Caller::owner(OWNER_ID),
            json!({ "month": 3, "year": 2025 }),
        )
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn admin_trigger_covers_every_hostel() {
    let app = TestApp::spawn().await;
    let first = app.create_hostel(OWNER_ID, "First").await;
    let second = app.create_hostel(OTHER_OWNER_ID, "Second").await;
    app.create_student(&first, "Amina", 5000, None).await;
    app.create_student(&second, "Brian", 6000, None).await;

    let response = app
        .post(
            "/payments/generate",
            &Caller::admin(),
            json!({ "month": 4, "year": 2025 }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["total_created"], 2);
}

#[tokio::test]
async fn fee_change_only_affects_later_invoices() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    let student_id = app.create_student(&hostel_id, "Amina", 5000, None).await;

    app.generate(&hostel_id, 3, 2025).await;
    let response = app
        .patch(
            &format!("/hostels/{}/students/{}", hostel_id, student_id),
            &Caller::manager(&hostel_id),
            json!({ "monthly_fee": 5500 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    app.generate(&hostel_id, 4, 2025).await;

    let march = app.list_payments(&hostel_id, "?month=3&year=2025").await;
    let april = app.list_payments(&hostel_id, "?month=4&year=2025").await;
    assert_eq!(march["payments"][0]["amount"], "5000");
    assert_eq!(april["payments"][0]["amount"], "5500");
}
