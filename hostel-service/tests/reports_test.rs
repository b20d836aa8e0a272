mod common;

use common::{Caller, TestApp, OTHER_OWNER_ID, OWNER_ID};
use serde_json::{json, Value};

#[tokio::test]
async fn hostel_summary_rolls_up_billing_and_occupancy() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    let room_id = app.create_room(&hostel_id, "101", 4).await;
    let manager = Caller::manager(&hostel_id);

    let paying = app
        .create_student(&hostel_id, "Amina", 5000, Some("user-amina"))
        .await;
    app.create_student(&hostel_id, "Brian", 6000, None).await;
    app.post(
        &format!("/hostels/{}/students/{}/assign-room", hostel_id, paying),
        &manager,
        json!({ "room_id": room_id }),
    )
    .await;
    app.generate(&hostel_id, 3, 2025).await;

    // Amina pays and is verified
    let list = app
        .list_payments(&hostel_id, &format!("?student_id={}", paying))
        .await;
    let payment_id = list["payments"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(list["payments"][0]["room_number"], "101");
    app.post(
        &format!("/hostels/{}/payments/{}/proof", hostel_id, payment_id),
        &Caller::student("user-amina", &hostel_id),
        json!({ "proof_image": "uploads/amina-march.png" }),
    )
    .await;
    app.post(
        &format!("/hostels/{}/payments/{}/verify", hostel_id, payment_id),
        &manager,
        json!({}),
    )
    .await;

    app.post(
        &format!("/hostels/{}/complaints", hostel_id),
        &Caller::student("user-amina", &hostel_id),
        json!({
            "title": "Noise",
            "description": "Music after midnight",
            "category": "NOISE",
        }),
    )
    .await;

    let response = app
        .get(
            &format!("/hostels/{}/reports/summary?month=3&year=2025", hostel_id),
            &manager,
        )
        .await;
    assert_eq!(response.status(), 200);
    let summary: Value = response.json().await.unwrap();

    assert_eq!(summary["hostel_name"], "Green View");
    assert_eq!(summary["revenue"], "5000");
    assert_eq!(summary["pending_dues"], "6000");
    assert_eq!(summary["pending_count"], 1);
    assert_eq!(summary["overdue_count"], 1);
    assert_eq!(summary["overdue_amount"], "6000");
    assert_eq!(summary["active_students"], 2);
    assert_eq!(summary["total_rooms"], 1);
    assert_eq!(summary["total_beds"], 4);
    assert_eq!(summary["occupied_beds"], 1);
    assert_eq!(summary["occupancy_rate"], "25.00");
    assert_eq!(summary["open_complaints"], 1);
}

#[tokio::test]
async fn summary_requires_manager_and_scope() {
    let app = TestApp::spawn().await;
    let hostel_id = app.create_hostel(OWNER_ID, "Green View").await;
    let path = format!("/hostels/{}/reports/summary", hostel_id);

    let response = app
        .get(&path, &Caller::student("user-1", &hostel_id))
        .await;
    assert_eq!(response.status(), 403);

    let response = app.get(&path, &Caller::owner(OTHER_OWNER_ID)).await;
    assert_eq!(response.status(), 404);

    let response = app
        .get(&format!("{}?month=0", path), &Caller::owner(OWNER_ID))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn admin_overview_totals_every_hostel() {
    let app = TestApp::spawn().await;
    let first = app.create_hostel(OWNER_ID, "First").await;
    let second = app.create_hostel(OTHER_OWNER_ID, "Second").await;
    app.create_student(&first, "Amina", 5000, None).await;
    app.create_student(&second, "Brian", 6000, None).await;
    app.create_student(&second, "Chloe", 7000, None).await;
    app.generate(&first, 3, 2025).await;
    app.generate(&second, 3, 2025).await;

    let response = app
        .get("/admin/billing/overview?month=3&year=2025", &Caller::admin())
        .await;
    assert_eq!(response.status(), 200);
    let overview: Value = response.json().await.unwrap();
    assert_eq!(overview["hostels"].as_array().unwrap().len(), 2);
    assert_eq!(overview["totals"]["hostels"], 2);
    assert_eq!(overview["totals"]["pending_dues"], "18000");
    assert_eq!(overview["totals"]["active_students"], 3);

    let response = app
        .get("/admin/billing/overview", &Caller::owner(OWNER_ID))
        .await;
    assert_eq!(response.status(), 403);
}
