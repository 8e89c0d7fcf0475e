mod support;

use axum::http::StatusCode;
use serde_json::json;
use support::TestApp;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_two_creators_with_earnings(app: &TestApp) {
    Mock::given(method("GET"))
        .and(path("/creators"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"uuid": "c1", "displayName": "One", "handle": "one"},
                {"uuid": "c2", "displayName": "Two", "handle": "two"}
            ]
        })))
        .mount(&app.server)
        .await;
    for creator in ["c1", "c2"] {
        Mock::given(method("GET"))
            .and(path(format!("/creators/{creator}/insights/earnings")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"date": "2025-01-01T10:00:00Z", "gross": 10.0, "net": 8.0, "source": "tip"},
                    {
                        "date": "2025-01-02T10:00:00Z",
                        "gross": 20.0,
                        "net": 16.0,
                        "source": "subscription"
                    }
                ],
                "pagination": {"hasMore": false}
            })))
            .mount(&app.server)
            .await;
    }
}

#[tokio::test]
async fn all_earnings_flattens_every_creator() {
    let app = TestApp::start().await;
    mount_two_creators_with_earnings(&app).await;

    let res = app
        .get("/api/all-earnings?startDate=2025-01-01&endDate=2025-01-31")
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalRecords"], 4);
    assert_eq!(res.body["creatorsProcessed"], 2);
    let data = res.body["data"].as_array().expect("data");
    assert_eq!(data.len(), 4);
    assert!(data.iter().any(|r| r["creatorUuid"] == "c1"));
    assert!(data.iter().any(|r| r["creatorUuid"] == "c2"));
}

#[tokio::test]
async fn repeating_an_aggregation_yields_the_same_totals() {
    let app = TestApp::start().await;
    mount_two_creators_with_earnings(&app).await;

    let first = app.get("/api/all-earnings").await;
    let second = app.get("/api/all-earnings").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["totalRecords"], second.body["totalRecords"]);
    assert_eq!(first.body["creatorsProcessed"], second.body["creatorsProcessed"]);
}

#[tokio::test]
async fn one_failing_creator_does_not_fail_the_aggregate() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/creators"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"uuid": "c1"}, {"uuid": "c2"}]
        })))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/creators/c1/followers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"uuid": "f1"}, {"uuid": "f2"}],
            "pagination": {"hasMore": false}
        })))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/creators/c2/followers"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&app.server)
        .await;

    let res = app.get("/api/all-followers").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalRecords"], 2);
    assert_eq!(res.body["creatorsProcessed"], 2);
}

#[tokio::test]
async fn failed_roster_fails_the_aggregate_with_its_status() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path("/creators"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.server)
        .await;

    let res = app.get("/api/all-subscribers").await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["code"], "UPSTREAM_STATUS");
}

async fn mount_json(app: &TestApp, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&app.server)
        .await;
}

async fn mount_status(app: &TestApp, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(&app.server)
        .await;
}

#[tokio::test]
async fn message_volume_counts_every_listed_chat() {
    let app = TestApp::start().await;
    mount_json(
        &app,
        "/creators/c1/chats",
        json!({
            "data": [{"uuid": "a"}, {"uuid": "b"}, {"uuid": "c"}],
            "pagination": {"hasMore": false}
        }),
    )
    .await;
    mount_json(
        &app,
        "/chats/a/messages",
        json!({
            "data": [
                {
                    "sentAt": "2025-01-02T10:00:00.000Z",
                    "sender": {"uuid": "fan-1", "displayName": "Fan"},
                    "recipient": {"uuid": "c1"}
                },
                {
                    "sentAt": "2025-01-02T10:05:00.000Z",
                    "sender": {"uuid": "c1"},
                    "recipient": {"uuid": "fan-1"}
                }
            ]
        }),
    )
    .await;
    mount_status(&app, "/chats/b/messages", 500).await;
    mount_status(&app, "/chats/c/messages", 404).await;

    let res = app
        .get("/api/creators/c1/message-volume?startDate=2025-01-01&endDate=2025-01-31")
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["summary"]["totalChats"], 3);
    assert_eq!(res.body["summary"]["activeFans"], 1);
    assert_eq!(res.body["totalMessages"], 2);
    assert_eq!(res.body["summary"]["responseRate"], 100.0);
    assert_eq!(res.body["dailyBreakdown"][0]["date"], "2025-01-02");
}

#[tokio::test]
async fn message_volume_chat_listing_failure_passes_through() {
    let app = TestApp::start().await;
    mount_status(&app, "/creators/c1/chats", 403).await;

    let res = app.get("/api/creators/c1/message-volume").await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["code"], "UPSTREAM_STATUS");
}

#[tokio::test]
async fn fan_engagement_skips_a_creator_whose_chats_fail() {
    let app = TestApp::start().await;
    mount_json(
        &app,
        "/creators",
        json!({"data": [{"uuid": "c1"}, {"uuid": "c2"}]}),
    )
    .await;
    mount_status(&app, "/creators/c1/chats", 503).await;
    mount_json(
        &app,
        "/creators/c2/chats",
        json!({"data": [{"uuid": "x"}, {"uuid": "y"}], "pagination": {"hasMore": false}}),
    )
    .await;
    mount_json(
        &app,
        "/chats/x/messages",
        json!({
            "data": [
                {"senderType": "fan", "senderId": "fan-1", "createdAt": "2025-01-03T10:00:00.000Z"},
                {"senderType": "fan", "senderId": "fan-1", "createdAt": "2025-01-04T10:00:00.000Z"},
                {"senderType": "creator", "createdAt": "2025-01-04T10:01:00.000Z"},
                {"senderType": "fan", "senderId": "fan-1", "createdAt": "2025-01-05T10:00:00.000Z"}
            ]
        }),
    )
    .await;
    mount_status(&app, "/chats/y/messages", 404).await;

    let res = app
        .get("/api/fan-engagement?startDate=2025-01-01&endDate=2025-01-31")
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["summary"]["totalActiveFans"], 1);
    assert_eq!(res.body["summary"]["totalMessages"], 3);
    let fan = &res.body["fanEngagement"][0];
    assert_eq!(fan["fanUuid"], "fan-1");
    assert_eq!(fan["creatorsEngaged"], json!(["c2"]));
    assert_eq!(fan["engagementScore"], 16);
    assert_eq!(fan["firstMessageDate"], "2025-01-03T10:00:00.000Z");
}

#[tokio::test]
async fn message_analytics_reads_creator_scoped_messages() {
    let app = TestApp::start().await;
    mount_json(
        &app,
        "/creators",
        json!({"data": [{"uuid": "c1", "displayName": "One"}]}),
    )
    .await;
    mount_json(
        &app,
        "/creators/c1/chats",
        json!({"data": [{"uuid": "k1"}, {"uuid": "k2"}], "pagination": {"hasMore": false}}),
    )
    .await;
    mount_json(
        &app,
        "/creators/c1/chats/k1/messages",
        json!({
            "data": [
                {
                    "uuid": "m1",
                    "senderType": "fan",
                    "senderUuid": "fan-1",
                    "createdAt": "2025-01-02T21:00:00.000Z"
                },
                {
                    "uuid": "m2",
                    "senderType": "creator",
                    "receiverUuid": "fan-1",
                    "createdAt": "2025-01-02T21:10:00.000Z"
                }
            ]
        }),
    )
    .await;
    mount_status(&app, "/creators/c1/chats/k2/messages", 404).await;

    let res = app
        .get("/api/message-analytics?startDate=2025-01-01&endDate=2025-01-31")
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["totalMessagesSent"], 1);
    assert_eq!(res.body["totalMessagesReceived"], 1);
    assert_eq!(res.body["summary"]["totalCreators"], 1);
    let creator = &res.body["messageVolumeByCreator"][0];
    assert_eq!(creator["creatorUuid"], "c1");
    assert_eq!(creator["creatorName"], "One");
    assert_eq!(creator["fanCount"], 1);
    assert_eq!(creator["peakHours"]["peakHours"], json!([21]));
    assert_eq!(res.body["messageVolumeByFan"][0]["fanUuid"], "fan-1");
}
