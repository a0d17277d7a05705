//! API integration tests
//!
//! These expect a server running against an empty database.

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:5000/api/v1";

fn due_in(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

async fn create_book(client: &Client, title: &str) -> i64 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": title,
            "author": "Ursula K. Le Guin",
            "isbn": "978-0441478125",
            "description": "A test copy"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

async fn create_customer(client: &Client, name: &str) -> i64 {
    let response = client
        .post(format!("{}/customers", BASE_URL))
        .json(&json!({
            "name": name,
            "email": "reader@example.org",
            "phone": "555-0100"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_book_crud() {
    let client = Client::new();
    let id = create_book(&client, "The Dispossessed").await;

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "AVAILABLE");
    assert_eq!(body["overdue"], false);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, id))
        .json(&json!({ "description": "Second printing" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["description"], "Second printing");
    assert_eq!(body["title"], "The Dispossessed");

    let response = client
        .get(format!("{}/books?title=dispossessed", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].as_i64().unwrap_or(0) >= 1);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_create_book_validation() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "ab",
            "author": "Someone",
            "isbn": "123456",
            "description": "Too short a title"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_customer_crud() {
    let client = Client::new();
    let id = create_customer(&client, "Shevek Urras").await;

    let response = client
        .put(format!("{}/customers/{}", BASE_URL, id))
        .json(&json!({ "phone": "555-0199" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["phone"], "555-0199");

    let response = client
        .get(format!("{}/customers?name=shevek", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total"].as_i64().unwrap_or(0) >= 1);

    let response = client
        .delete(format!("{}/customers/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_checkout_and_checkin_flow() {
    let client = Client::new();
    let book_id = create_book(&client, "The Left Hand of Darkness").await;
    let customer_id = create_customer(&client, "Genly Ai").await;

    let response = client
        .get(format!("{}/books/{}/next-action", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["next_action"], "CHECK_OUT");

    let due = due_in(14);
    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({
            "customerId": customer_id,
            "action": "CHECK_OUT",
            "dueDate": due
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "CHECKED_OUT");
    assert_eq!(body["due_date"], due);

    // A customer with history cannot be deleted
    let response = client
        .delete(format!("{}/customers/{}", BASE_URL, customer_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({ "customer_id": customer_id, "action": "CHECK_IN" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .get(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["book"]["status"], "AVAILABLE");
    assert!(body["book"]["due_date"].is_null());
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["action"], "CHECK_IN");
    assert_eq!(body["items"][1]["action"], "CHECK_OUT");
}

#[tokio::test]
#[ignore]
async fn test_illegal_transition_is_conflict() {
    let client = Client::new();
    let book_id = create_book(&client, "Always Coming Home").await;
    let customer_id = create_customer(&client, "Stone Telling").await;

    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({ "customer_id": customer_id, "action": "CHECK_IN" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "IllegalTransition");
}

#[tokio::test]
#[ignore]
async fn test_checkout_requires_due_date() {
    let client = Client::new();
    let book_id = create_book(&client, "The Lathe of Heaven").await;
    let customer_id = create_customer(&client, "George Orr").await;

    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({ "customer_id": customer_id, "action": "CHECK_OUT" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_idempotent_retry() {
    let client = Client::new();
    let book_id = create_book(&client, "A Wizard of Earthsea").await;
    let customer_id = create_customer(&client, "Ged Sparrowhawk").await;
    let key = format!("checkout-{}", book_id);
    let request = json!({
        "customer_id": customer_id,
        "action": "CHECK_OUT",
        "due_date": due_in(7)
    });

    let first: Value = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .header("Idempotency-Key", &key)
        .json(&request)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .header("Idempotency-Key", &key)
        .json(&request)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let second: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(first["id"], second["id"]);

    let response = client
        .get(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 1);
}

#[tokio::test]
#[ignore]
async fn test_edit_and_delete_open_tracking() {
    let client = Client::new();
    let book_id = create_book(&client, "The Word for World Is Forest").await;
    let customer_id = create_customer(&client, "Selver Thele").await;

    let record: Value = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({
            "customer_id": customer_id,
            "action": "CHECK_OUT",
            "due_date": due_in(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let tracking_id = record["id"].as_i64().expect("No id in response");

    let new_due = due_in(21);
    let response = client
        .patch(format!("{}/books/{}/tracking/{}", BASE_URL, book_id, tracking_id))
        .json(&json!({ "dueDate": new_due }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/tracking/{}", BASE_URL, tracking_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["due_date"], new_due);
    assert_eq!(body["book"]["due_date"], new_due);
    assert_eq!(body["customer"]["id"], customer_id);

    let response = client
        .delete(format!("{}/books/{}/tracking/{}", BASE_URL, book_id, tracking_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "AVAILABLE");
}

async fn post_check_in(client: &Client, book_id: i64, customer_id: i64) -> (u16, Value) {
    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({ "customer_id": customer_id, "action": "CHECK_IN" }))
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse response");
    (status, body)
}

#[tokio::test]
#[ignore]
async fn test_concurrent_check_ins_one_wins() {
    let client = Client::new();
    let book_id = create_book(&client, "The Telling").await;
    let customer_id = create_customer(&client, "Sutty Dass").await;

    let response = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({
            "customer_id": customer_id,
            "action": "CHECK_OUT",
            "due_date": due_in(7)
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let (a, b) = tokio::join!(
        post_check_in(&client, book_id, customer_id),
        post_check_in(&client, book_id, customer_id),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|(status, _)| *status == 201).count(), 1);
    let (status, body) = results
        .iter()
        .find(|(status, _)| *status != 201)
        .expect("One check-in must lose");
    assert_eq!(*status, 409);
    // Losing the version race is ConcurrentModification; a loser that only
    // read the book after the winner committed sees the new status instead
    assert!(
        body["error"] == "ConcurrentModification" || body["error"] == "IllegalTransition",
        "unexpected error body: {}",
        body
    );

    let response = client
        .get(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["action"], "CHECK_IN");
    assert_eq!(body["book"]["status"], "AVAILABLE");
    assert!(body["book"]["due_date"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_concurrent_deletes_of_one_record() {
    let client = Client::new();
    let book_id = create_book(&client, "Four Ways to Forgiveness").await;
    let customer_id = create_customer(&client, "Yeowe Solly").await;

    let record: Value = client
        .post(format!("{}/books/{}/tracking", BASE_URL, book_id))
        .json(&json!({
            "customer_id": customer_id,
            "action": "CHECK_OUT",
            "due_date": due_in(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let url = format!(
        "{}/books/{}/tracking/{}",
        BASE_URL,
        book_id,
        record["id"].as_i64().expect("No id in response")
    );

    let (a, b) = tokio::join!(client.delete(&url).send(), client.delete(&url).send());
    let mut statuses = [
        a.expect("Failed to send request").status().as_u16(),
        b.expect("Failed to send request").status().as_u16(),
    ];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 404]);

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "AVAILABLE");
}

#[tokio::test]
#[ignore]
async fn test_books_metrics() {
    let client = Client::new();

    let response = client
        .get(format!("{}/reports/books-metrics", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["available"].is_number());
    assert!(body["checkedout"].is_number());
    assert!(body["delayed"].is_number());
    assert!(body["total_books"].is_number());
}
