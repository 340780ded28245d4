mod common;

use std::time::Duration;

use club_client::{
    AppSignal, ClubClient, PushOutcome, RefreshOutcome, StoreKey, SyncNotice, SyncPhase,
};
use shared::document::SharedDocument;
use shared::identity::CardId;
use tokio_util::sync::CancellationToken;

use common::{FakeApi, client, config};

fn bulletin(client: &ClubClient) -> String {
    client.local_view().bulletin
}

#[tokio::test]
async fn test_pull_overwrites_every_shared_field() {
    let api = FakeApi::with_roster();
    api.edit(|doc| {
        doc.bulletin = "Trasferta a Milano".into();
        doc.points.add(&CardId::new("S1"), 40);
        doc.points_rules_text = "+5 per tutti".into();
    });
    let client = client(&api);

    let admin = client.admin_login(common::PIN).unwrap();
    admin.set_bulletin("local draft").unwrap();
    assert_eq!(client.sync_phase(), SyncPhase::Dirty);

    let outcome = client.refresh().await;
    assert_eq!(outcome, RefreshOutcome::Refreshed { version: 2 });
    assert_eq!(client.local_view(), api.document());
    assert_eq!(client.sync_phase(), SyncPhase::Clean);
}

#[tokio::test]
async fn test_pull_failure_marks_backend_down_and_keeps_cache() {
    let api = FakeApi::with_roster();
    api.edit(|doc| doc.bulletin = "v2".into());
    let client = client(&api);
    client.refresh().await;
    let mut notices = client.subscribe();

    api.set_unreachable(true);
    api.edit(|doc| doc.bulletin = "v3".into());
    let outcome = client.refresh().await;

    assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    assert_eq!(bulletin(&client), "v2");
    assert_eq!(client.sync_phase(), SyncPhase::Down);
    assert_eq!(notices.try_recv().unwrap(), SyncNotice::BackendDown);

    api.set_unreachable(false);
    client.refresh().await;
    assert_eq!(bulletin(&client), "v3");
    assert_eq!(client.sync_phase(), SyncPhase::Clean);
}

#[tokio::test]
async fn test_push_failure_does_not_set_backend_down() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    let admin = client.admin_login(common::PIN).unwrap();
    admin.set_bulletin("draft").unwrap();
    let mut notices = client.subscribe();

    api.set_unreachable(true);
    let outcome = client.push_now().await;

    assert!(matches!(outcome, PushOutcome::Failed(_)));
    assert_eq!(notices.try_recv().unwrap(), SyncNotice::SavedLocally);
    assert_eq!(client.sync_phase(), SyncPhase::Dirty);
    assert_eq!(bulletin(&client), "draft");
}

#[tokio::test]
async fn test_push_reconciles_server_copy() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    client.refresh().await;
    let admin = client.admin_login(common::PIN).unwrap();
    admin.set_bulletin("Cena sociale venerdì").unwrap();

    let outcome = client.push_now().await;

    assert_eq!(outcome, PushOutcome::Pushed { version: 2 });
    assert_eq!(api.document().bulletin, "Cena sociale venerdì");
    assert_eq!(client.local_view().version, 2);
    assert_eq!(client.sync_phase(), SyncPhase::Clean);
}

#[tokio::test]
async fn test_offline_skips_network() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    client.signal(AppSignal::Offline);

    assert_eq!(client.refresh().await, RefreshOutcome::Skipped);
    assert_eq!(client.push_now().await, PushOutcome::Skipped);
    assert_eq!(api.fetch_count(), 0);
    assert_eq!(api.push_count(), 0);
}

#[tokio::test]
async fn test_push_requires_a_credential() {
    let api = FakeApi::with_roster();
    let client = common::bare_client(&api, config());

    assert_eq!(client.push_now().await, PushOutcome::Skipped);
    assert_eq!(api.push_count(), 0);

    // admin session without a cached PIN falls back to the default one
    client.context().set_admin_session(true);
    assert!(matches!(client.push_now().await, PushOutcome::Pushed { .. }));
    assert_eq!(api.push_count(), 1);
}

#[tokio::test]
async fn test_credential_fallback_can_be_disabled() {
    let api = FakeApi::with_roster();
    let client = common::bare_client(&api, config().with_credential_fallback(false));
    client.context().set_admin_session(true);

    assert_eq!(client.push_now().await, PushOutcome::Skipped);
    assert_eq!(api.push_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_refreshes_share_one_request() {
    let api = FakeApi::with_roster();
    api.set_fetch_delay(Duration::from_millis(200));
    let client = client(&api);

    let (a, b, c) = tokio::join!(client.refresh(), client.refresh(), client.refresh());

    assert_eq!(api.fetch_count(), 1);
    assert_eq!(a, b);
    assert_eq!(b, c);

    client.refresh().await;
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_debounce_collapses_edit_bursts() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    let shutdown = CancellationToken::new();
    let worker = client.start(shutdown.clone()).unwrap();

    let admin = client.admin_login(common::PIN).unwrap();
    for i in 0..5 {
        admin.set_bulletin(&format!("draft {}", i)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(api.push_count(), 1);
    assert_eq!(api.document().bulletin, "draft 4");

    // a second burst after the window is a second push
    admin.set_bulletin("later").unwrap();
    admin.save_settings("Curva Nord", "").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(api.push_count(), 2);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_push_is_retried() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    let shutdown = CancellationToken::new();
    let worker = client.start(shutdown.clone()).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    api.set_unreachable(true);
    let admin = client.admin_login(common::PIN).unwrap();
    admin.set_bulletin("Pullman alle 14").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(api.push_count(), 1);
    assert_eq!(client.sync_phase(), SyncPhase::Dirty);

    // back before the retry, and before the next poll
    api.set_unreachable(false);
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(api.push_count(), 2);
    assert_eq!(api.document().bulletin, "Pullman alle 14");
    assert_eq!(client.sync_phase(), SyncPhase::Clean);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(api.push_count(), 2);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_poll_pauses_in_background() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    let shutdown = CancellationToken::new();
    let worker = client.start(shutdown.clone()).unwrap();

    tokio::time::sleep(Duration::from_secs(31)).await;
    let foreground_fetches = api.fetch_count();
    // startup refresh + two polls
    assert_eq!(foreground_fetches, 3);

    client.signal(AppSignal::Background);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.fetch_count(), foreground_fetches);

    client.signal(AppSignal::Foreground);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(api.fetch_count(), foreground_fetches + 1);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_pushes_offline_edits_then_pulls() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    let shutdown = CancellationToken::new();
    let worker = client.start(shutdown.clone()).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    client.signal(AppSignal::Offline);
    let admin = client.admin_login(common::PIN).unwrap();
    admin.set_bulletin("scritto offline").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(api.push_count(), 0);

    client.signal(AppSignal::Online);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(api.push_count(), 1);
    assert_eq!(api.document().bulletin, "scritto offline");
    assert_eq!(client.sync_phase(), SyncPhase::Clean);

    shutdown.cancel();
    worker.await.unwrap();
}

#[tokio::test]
async fn test_corrupt_persisted_points_read_as_empty() {
    let api = FakeApi::with_roster();
    let client = client(&api);
    client
        .context()
        .with_cache(|cache| cache.store().put_raw(StoreKey::Points, b"{\"S1\": oops"))
        .unwrap();

    let view = client.local_view();
    assert!(view.points.is_empty());
    assert_eq!(view.members.len(), 3);
}

#[tokio::test]
async fn test_empty_server_document_hardens_to_defaults() {
    let api = FakeApi::new(SharedDocument::default());
    let client = client(&api);
    client.refresh().await;

    let view = client.local_view();
    assert!(view.events.is_empty());
    assert!(view.members.is_empty());
    assert_eq!(view.version, 1);
}
