mod common;

use std::sync::Arc;

use mockito::Matcher;
use serde_json::json;

use estate_desk::api::ApiError;
use estate_desk::auth::MemoryStore;
use estate_desk::domain::{Agent, LeadStatus, LeadUpdate, NewLead, Property};
use estate_desk::services::{DashboardService, RecordList};

use common::{context, token_for};

fn property(id: &str, assigned_to: Option<&str>) -> serde_json::Value {
    json!({
        "_id": id,
        "title": format!("Listing {}", id),
        "price": 125000,
        "city": "Lagos",
        "createdBy": "admin-1",
        "desc": "",
        "imageURL": "",
        "assignedTo": assigned_to,
    })
}

fn admin_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_token(token_for("admin", 3600)))
}

#[tokio::test]
async fn test_lists_properties_with_bearer_credential() {
    let mut server = mockito::Server::new_async().await;
    let token = token_for("admin", 3600);
    let store = Arc::new(MemoryStore::with_token(token.clone()));

    let _list = server
        .mock("GET", "/get-property")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"properties": [property("p1", None), property("p2", Some("a1"))]}).to_string(),
        )
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), store);
    let properties = ctx.client.properties().list().await.unwrap();

    assert_eq!(properties.len(), 2);
    let unassigned = estate_desk::domain::property::unassigned(&properties);
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].id, "p1");
}

#[tokio::test]
async fn test_missing_listing_key_is_empty() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/get-leads")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"No leads yet"}"#)
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    assert!(ctx.client.leads().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unrecognised_statuses_keep_the_listing() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/get-leads")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"leads": [
                {"name": "A", "email": "a@example.com", "status": "new"},
                {"name": "B", "email": "b@example.com", "status": "lost"},
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    let leads = ctx.client.leads().list().await.unwrap();

    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].status, Some(LeadStatus::New));
    assert_eq!(leads[1].status, Some(LeadStatus::Unknown));
}

#[tokio::test]
async fn test_create_and_update_lead() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/create-lead")
        .match_body(Matcher::Json(json!({
            "name": "Kim",
            "email": "kim@example.com",
            "message": "Is it still available?",
            "propertyRef": "p1",
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"lead": {
                "_id": "l1",
                "name": "Kim",
                "email": "kim@example.com",
                "message": "Is it still available?",
                "propertyRef": "p1",
            }})
            .to_string(),
        )
        .create_async()
        .await;
    let update = server
        .mock("PATCH", "/update-lead/l1")
        .match_body(Matcher::Json(json!({"status": "contacted"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"lead": {
                "_id": "l1",
                "name": "Kim",
                "email": "kim@example.com",
                "propertyRef": "p1",
                "status": "contacted",
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    let leads = ctx.client.leads();

    let created = leads
        .create(&NewLead {
            name: "Kim".into(),
            email: "kim@example.com".into(),
            message: "Is it still available?".into(),
            property_ref: "p1".into(),
        })
        .await
        .unwrap();
    assert_eq!(created.id.as_deref(), Some("l1"));
    assert_eq!(created.effective_status(), LeadStatus::New);

    let changes = LeadUpdate {
        status: Some(LeadStatus::Contacted),
        ..LeadUpdate::default()
    };
    let updated = leads.update("l1", &changes).await.unwrap();
    assert_eq!(updated.status, Some(LeadStatus::Contacted));

    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn test_get_missing_transaction_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _get = server
        .mock("GET", "/get-transaction/t404")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Transaction not found"}"#)
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    let err = ctx.client.transactions().get("t404").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.user_message("Failed"), "Transaction not found");
}

#[tokio::test]
async fn test_delete_drops_record_and_clamps_page() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/get-property")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"properties": [
                property("p1", None),
                property("p2", None),
                property("p3", None),
            ]})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/delete-property/p3")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Property deleted successfully"}"#)
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    let mut list = RecordList::<Property>::load(&ctx.client, ctx.config.page_size)
        .await
        .unwrap();
    assert_eq!(list.pages().total_pages(), 2);
    assert!(list.pages_mut().go_to(2));

    let message = list.delete(&ctx.client, "p3").await.unwrap();
    delete.assert_async().await;

    assert_eq!(message, "Property deleted successfully");
    assert_eq!(list.pages().len(), 2);
    assert_eq!(list.pages().total_pages(), 1);
    assert_eq!(list.pages().current_page(), 1);
}

#[tokio::test]
async fn test_failed_delete_keeps_record() {
    let mut server = mockito::Server::new_async().await;
    let _delete = server
        .mock("DELETE", "/delete-agent/a1")
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"msg":"Forbidden"}"#)
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    let agent: Agent = serde_json::from_value(json!({
        "_id": "a1",
        "name": "Kim",
        "email": "kim@example.com",
    }))
    .unwrap();
    let mut list = RecordList::new(vec![agent], 5);

    let err = list.delete(&ctx.client, "a1").await.unwrap_err();
    assert!(matches!(err, ApiError::Backend { status: 403, .. }));
    assert_eq!(list.pages().len(), 1);
}

#[tokio::test]
async fn test_dashboard_degrades_failed_listing_to_empty() {
    let mut server = mockito::Server::new_async().await;
    let _properties = server
        .mock("GET", "/get-property")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"properties": [property("p1", None)]}).to_string())
        .create_async()
        .await;
    let _leads = server
        .mock("GET", "/get-leads")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"leads": [
                {"name": "A", "email": "a@example.com"},
                {"name": "B", "email": "b@example.com", "status": "qualified"},
                {"name": "C", "email": "c@example.com", "status": "lost"},
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let _agents = server
        .mock("GET", "/get-agents")
        .with_status(500)
        .create_async()
        .await;
    let _transactions = server
        .mock("GET", "/get-transactions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"transactions": [
                {"client": "u1", "agent": "a1", "propertyRef": "p1", "price": 10.0,
                 "status": "complete", "createdAt": "2025-01-05T00:00:00Z"},
                {"client": "u2", "agent": "a1", "propertyRef": "p1", "price": 20.0,
                 "status": "pending", "createdAt": "2024-11-30T00:00:00Z"},
            ]})
            .to_string(),
        )
        .create_async()
        .await;

    let (ctx, _notifier) = context(&server.url(), admin_store());
    let stats = DashboardService::new(&ctx.client).load().await;

    assert_eq!(stats.counts.properties, 1);
    assert_eq!(stats.counts.leads, 3);
    assert_eq!(stats.counts.agents, 0);
    assert_eq!(stats.counts.transactions, 2);

    let statuses: Vec<(&str, usize)> = stats
        .lead_statuses
        .iter()
        .map(|slice| (slice.name.as_str(), slice.value))
        .collect();
    assert_eq!(statuses, vec![("New", 1), ("Qualified", 1), ("Unknown", 1)]);

    let months: Vec<&str> = stats
        .transaction_trend
        .iter()
        .map(|month| month.month.as_str())
        .collect();
    assert_eq!(months, vec!["Nov 2024", "Jan 2025"]);
}
