// HTTP client tests against a mock remote service

use chrono::{TimeZone, Utc};
use common::client::{LichessClient, TournamentApi};
use common::errors::ApiError;
use common::models::{Definition, TournamentKind};
use common::options::Cadence;
use common::payload::CreateTournamentRequest;
use common::retry::FixedDelay;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "lip_test_token";

fn client(server: &MockServer) -> LichessClient {
    LichessClient::new(server.uri(), TOKEN, 5)
        .unwrap()
        .with_retry_strategy(Arc::new(FixedDelay::new(Duration::ZERO, 2)))
}

fn definition(kind: TournamentKind) -> Definition {
    Definition::new(
        "Monday Blitz",
        kind,
        Cadence::Weekly,
        Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn test_account_username_uses_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "organizer",
            "username": "Organizer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let username = client(&server).account_username().await.unwrap();
    assert_eq!(username, "Organizer");
}

#[tokio::test]
async fn test_led_teams_filters_by_leadership() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/team/of/organizer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "club", "leaders": [{ "name": "organizer" }, { "name": "other" }] },
            { "id": "member-only", "leaders": [{ "name": "other" }] },
            { "id": "no-leaders" }
        ])))
        .mount(&server)
        .await;

    let teams = client(&server).led_teams("organizer").await.unwrap();
    assert_eq!(teams, vec!["club".to_string()]);
}

#[tokio::test]
async fn test_created_tournaments_parses_ndjson() {
    let server = MockServer::start().await;
    let body = concat!(
        r#"{"id":"a1","fullName":"Monday Blitz Arena","rated":true,"clock":{"limit":180,"increment":2},"startsAt":1710784800000,"variant":{"key":"standard"}}"#,
        "\n",
        r#"{"id":"a2","fullName":"Atomic Hour Arena","rated":false,"clock":{"limit":60,"increment":0},"startsAt":1710788400000,"variant":"atomic","conditions":{"teamMember":{"teamId":"club"}}}"#,
        "\n"
    );
    Mock::given(method("GET"))
        .and(path("/api/user/organizer/tournament/created"))
        .and(query_param("status", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let records = client(&server)
        .created_tournaments("organizer")
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "a1");
    assert_eq!(records[0].team, None);
    assert_eq!(records[1].variant, "atomic");
    assert_eq!(records[1].team.as_deref(), Some("club"));
}

#[tokio::test]
async fn test_create_arena_posts_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tournament"))
        .and(body_partial_json(json!({
            "name": "Monday Blitz",
            "clockTime": 3.0,
            "clockIncrement": 2,
            "minutes": 60,
            "conditions": { "teamMember.teamId": "club" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "new1",
            "fullName": "Monday Blitz Arena"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let def = definition(TournamentKind::Arena {
        team: Some("club".to_string()),
    });
    let start = Utc.with_ymd_and_hms(2024, 3, 18, 18, 0, 0).unwrap();
    let request = CreateTournamentRequest::from_definition(&def, "Monday Blitz", start);

    let created = client(&server)
        .create_tournament(&request, &def.kind)
        .await
        .unwrap();
    assert_eq!(created.id, "new1");
    assert_eq!(created.full_name, "Monday Blitz Arena");
}

#[tokio::test]
async fn test_create_swiss_uses_team_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/swiss/new/club"))
        .and(body_partial_json(json!({
            "name": "Monday Blitz",
            "clock": { "limit": 180, "increment": 2 },
            "nbRounds": 9,
            "startsAt": 1710784800000i64
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sw1",
            "name": "Monday Blitz"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let def = definition(TournamentKind::Swiss {
        team: Some("club".to_string()),
    });
    let start = Utc.with_ymd_and_hms(2024, 3, 18, 18, 0, 0).unwrap();
    let request = CreateTournamentRequest::from_definition(&def, "Monday Blitz", start);

    let created = client(&server)
        .create_tournament(&request, &def.kind)
        .await
        .unwrap();
    assert_eq!(created.id, "sw1");
    assert_eq!(created.full_name, "Monday Blitz");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    for arena_only in ["clockTime", "minutes", "startDate", "berserkable", "streakable"] {
        assert!(body.get(arena_only).is_none(), "{} sent to swiss", arena_only);
    }
}

#[tokio::test]
async fn test_update_team_battle_and_message_team() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tournament/team-battle/tb1"))
        .and(body_json(json!({ "teams": "alpha,beta", "nbLeaders": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "tb1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/team/alpha/pm-all"))
        .and(body_json(json!({ "message": "Starts soon" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    api.update_team_battle("tb1", &["alpha".to_string(), "beta".to_string()], 3)
        .await
        .unwrap();
    api.message_team("alpha", "Starts soon").await.unwrap();
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "organizer" })))
        .expect(1)
        .mount(&server)
        .await;

    let username = client(&server).account_username().await.unwrap();
    assert_eq!(username, "organizer");
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server).account_username().await.unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(3)));
}

#[tokio::test]
async fn test_unauthorized_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).account_username().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/team/club/pm-all"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .message_team("club", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RequestFailed { status: 500, .. }));
}

#[tokio::test]
async fn test_tournament_winner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tournament/done/results"))
        .and(query_param("nb", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{\"rank\":1,\"score\":24,\"username\":\"Champion_1\"}\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tournament/missing/results"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tournament/empty/results"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let api = client(&server);
    assert_eq!(
        api.tournament_winner("done").await.unwrap().as_deref(),
        Some("Champion_1")
    );
    assert_eq!(api.tournament_winner("missing").await.unwrap(), None);
    assert_eq!(api.tournament_winner("empty").await.unwrap(), None);
}
