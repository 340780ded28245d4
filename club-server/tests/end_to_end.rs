use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use club_client::{
    ClientConfig, ClubClient, LocalStore, MutationOutcome, PushOutcome, RefreshOutcome, SyncPhase,
};
use club_server::{Config, DocumentStore, ServerState, serve};
use shared::identity::CardId;
use shared::models::{Member, NewEvent, QuizDraft};
use shared::request::{APP_DATA_PATH, MUTATE_PATH};

struct TestServer {
    base_url: String,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start() -> Self {
        let store = DocumentStore::open_in_memory().unwrap();
        let state = ServerState::with_store(Config::with_overrides("./unused", 0), store).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = CancellationToken::new();
        let stop = shutdown.clone().cancelled_owned();
        tokio::spawn(async move {
            serve(listener, state, stop).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            shutdown,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn client(&self) -> ClubClient {
        let config = ClientConfig::new(&self.base_url).with_timeout(5);
        let client = ClubClient::connect(config, LocalStore::open_in_memory().unwrap()).unwrap();
        client
            .bootstrap(&[
                Member::new(CardId::new("S1"), "Anna Rossi"),
                Member::new(CardId::new("S2"), "Marco Bianchi"),
            ])
            .unwrap();
        client
    }

    async fn member(&self, card: &str) -> ClubClient {
        let client = self.client();
        client.refresh().await;
        client.login(card).unwrap();
        client
    }

    async fn fetch(&self) -> Value {
        reqwest::get(self.url(APP_DATA_PATH))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Admin device seeds the roster and one event, pushes it for everyone
async fn seed(server: &TestServer, capacity: u32) -> String {
    let admin = server.client();
    let console = admin.admin_login("190894").unwrap();
    let event = console
        .create_event(NewEvent {
            title: "Inter - Juventus".into(),
            date: "2026-11-23".into(),
            capacity,
            note: String::new(),
        })
        .unwrap();
    let pushed = admin.push_now().await;
    assert_eq!(pushed, PushOutcome::Pushed { version: 2 });
    event.id
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let body: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["documentVersion"], 1);
}

#[tokio::test]
async fn test_push_requires_admin_pin() {
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    for pin in ["", "000000"] {
        let response = http
            .post(server.url(APP_DATA_PATH))
            .json(&json!({ "pin": pin, "payload": { "bulletin": "hacked" } }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "E3001");
    }

    let doc = server.fetch().await;
    assert_eq!(doc["payload"]["bulletin"], "");
    assert_eq!(doc["payload"]["version"], 1);
}

#[tokio::test]
async fn test_push_replaces_and_bumps_version() {
    let server = TestServer::start().await;
    let event_id = seed(&server, 0).await;

    let doc = server.fetch().await;
    assert_eq!(doc["ok"], true);
    assert_eq!(doc["payload"]["version"], 2);
    assert_eq!(doc["payload"]["events"][0]["id"], event_id.as_str());
    assert_eq!(doc["payload"]["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_members_race_for_the_last_seat() {
    let server = TestServer::start().await;
    let event_id = seed(&server, 1).await;

    let anna = server.member("S1").await;
    let marco = server.member("S2").await;

    let first = anna.book_event(&event_id).await.unwrap();
    assert!(matches!(first, MutationOutcome::Confirmed { .. }));

    // Marco's cache still shows a free seat
    let second = marco.book_event(&event_id).await.unwrap();
    assert!(matches!(second, MutationOutcome::Rejected { .. }));

    let view = marco.local_view();
    assert_eq!(view.seats_left(&event_id), Some(0));
    assert_eq!(view.points.balance(&CardId::new("S2")), 0);
    assert_eq!(view.points.balance(&CardId::new("S1")), 10);
    assert_eq!(marco.sync_phase(), SyncPhase::Clean);
}

#[tokio::test]
async fn test_quiz_answered_once_across_devices() {
    let server = TestServer::start().await;
    seed(&server, 0).await;

    let admin = server.client();
    admin.refresh().await;
    admin
        .admin_login("190894")
        .unwrap()
        .publish_quiz(&QuizDraft {
            question: "Anno della prima Champions?".into(),
            options: ["1964".into(), "1965".into(), "2010".into(), "1910".into()],
            correct: "a".into(),
            event_id: None,
        })
        .unwrap();
    admin.push_now().await;

    let phone = server.member("S1").await;
    let tablet = server.member("S1").await;

    let answered = phone.answer_quiz("A").await.unwrap();
    assert_eq!(answered.effect().and_then(|e| e.correct), Some(true));

    let again = tablet.answer_quiz("B").await.unwrap();
    assert!(matches!(again, MutationOutcome::Rejected { .. }));
    assert_eq!(tablet.local_view().points.balance(&CardId::new("S1")), 2);
}

#[tokio::test]
async fn test_mutation_errors_use_the_envelope() {
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    let unknown = http
        .post(server.url(MUTATE_PATH))
        .json(&json!({ "type": "book", "tessera": "S1", "eventId": "EV-404" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["code"], "E1001");

    let malformed = http
        .post(server.url(MUTATE_PATH))
        .json(&json!({ "type": "teleport", "tessera": "S1" }))
        .send()
        .await
        .unwrap();
    assert!(malformed.status().is_client_error());
    let body: Value = malformed.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "E0006");

    let no_card = http
        .post(server.url(MUTATE_PATH))
        .json(&json!({ "type": "cancel", "tessera": "  ", "eventId": "EV-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(no_card.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_more_than_one_seat_is_rejected() {
    let server = TestServer::start().await;
    let event_id = seed(&server, 10).await;

    let response = reqwest::Client::new()
        .post(server.url(MUTATE_PATH))
        .json(&json!({ "type": "book", "tessera": "S1", "eventId": event_id, "seats": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "E0002");

    let doc = server.fetch().await;
    assert_eq!(doc["payload"]["version"], 2);
    assert!(doc["payload"]["bookings"][event_id.as_str()].is_null());
}

#[tokio::test]
async fn test_unreachable_server_marks_backend_down() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let config = ClientConfig::new(format!("http://{}", addr)).with_timeout(2);
    let client = ClubClient::connect(config, LocalStore::open_in_memory().unwrap()).unwrap();

    let outcome = client.refresh().await;
    assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    assert_eq!(client.sync_phase(), SyncPhase::Down);
}
