mod common;

use club_client::{AppSignal, ClientError, EventDeletion, ImportMode, SyncPhase};
use shared::identity::CardId;
use shared::models::NewEvent;

use common::{FakeApi, PIN};

fn derby() -> NewEvent {
    NewEvent {
        title: "Derby".into(),
        date: "2026-11-02".into(),
        capacity: 50,
        note: String::new(),
    }
}

#[tokio::test]
async fn test_wrong_pin_keeps_console_locked() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);

    assert!(matches!(
        client.admin_login("000000"),
        Err(ClientError::Unauthorized)
    ));
    assert!(matches!(client.admin(), Err(ClientError::Unauthorized)));

    client.admin_login(PIN).unwrap();
    assert!(client.admin().is_ok());
    client.admin_logout();
    assert!(client.admin().is_err());
}

#[tokio::test]
async fn test_reset_points_needs_every_confirmation() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();
    admin.adjust_points("S1", 25).unwrap();

    let half = admin.reset_all_points([true, true, false], PIN);
    assert!(matches!(half, Err(ClientError::Validation(_))));
    let wrong_pin = admin.reset_all_points([true; 3], "111111");
    assert!(matches!(wrong_pin, Err(ClientError::Unauthorized)));
    assert_eq!(client.local_view().points.balance(&CardId::new("S1")), 25);

    admin.reset_all_points([true; 3], PIN).unwrap();
    assert!(client.local_view().points.is_empty());
}

#[tokio::test]
async fn test_manual_adjustment_never_goes_negative() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();

    assert_eq!(admin.adjust_points("s1", 1).unwrap(), 1);
    assert_eq!(admin.adjust_points("S1", -10).unwrap(), 0);
    assert!(matches!(
        admin.adjust_points("  ", 10),
        Err(ClientError::Validation(_))
    ));
}

#[tokio::test]
async fn test_delete_event_is_shared_immediately_when_online() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    client.refresh().await;
    let admin = client.admin_login(PIN).unwrap();
    let event = admin.create_event(derby()).unwrap();
    admin.adjust_points("S1", 10).unwrap();
    client.push_now().await;

    let deletion = admin.delete_event(&event.id).await.unwrap();

    assert_eq!(deletion, EventDeletion::Shared);
    assert!(api.document().event(&event.id).is_none());
    assert_eq!(client.sync_phase(), SyncPhase::Clean);

    let missing = admin.delete_event(&event.id).await;
    assert!(matches!(missing, Err(ClientError::Domain(_))));
}

#[tokio::test]
async fn test_delete_event_offline_is_saved_locally() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();
    let event = admin.create_event(derby()).unwrap();

    client.signal(AppSignal::Offline);
    let deletion = admin.delete_event(&event.id).await.unwrap();

    assert_eq!(deletion, EventDeletion::SavedLocally);
    assert!(client.local_view().event(&event.id).is_none());
    assert_eq!(client.sync_phase(), SyncPhase::Dirty);
    assert_eq!(api.push_count(), 0);
}

#[tokio::test]
async fn test_csv_import_merges_into_roster() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();

    let csv = "Tessera;Nome;Cognome;Attivo\n\
               S2;Marco;Bianchi Jr;si\n\
               J7;Giulia;Neri;si\n\
               J8;Paolo;Gialli;no\n";
    let imported = admin.import_csv(csv, ImportMode::Merge).unwrap();
    assert_eq!(imported, 2);

    let members = client.local_view().members;
    assert_eq!(members.len(), 4);
    let marco = members
        .iter()
        .find(|m| m.card_id == CardId::new("S2"))
        .unwrap();
    assert_eq!(marco.name, "Marco Bianchi Jr");
    assert!(client.login("j7").is_ok());
    assert!(client.login("J8").is_err());
}

#[tokio::test]
async fn test_csv_replace_and_allowed_list() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();

    admin
        .import_csv("tessera,nominativo\nA1,Uno\nA2,Due\n", ImportMode::Replace)
        .unwrap();
    assert_eq!(client.local_view().members.len(), 2);

    let saved = admin.save_allowed_list("b1,Bruno\nB2\nb1,Altro\n").unwrap();
    assert_eq!(saved, 2);
    let text = admin.allowed_list_text();
    assert!(text.contains("B1"));
    assert!(text.contains("Bruno"));

    let bad = admin.import_csv("nome,cognome\nA,B\n", ImportMode::Merge);
    assert!(matches!(bad, Err(ClientError::Domain(_))));
}

#[tokio::test]
async fn test_settings_fall_back_to_defaults() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();

    let cfg = admin.save_settings("  ", "").unwrap();
    assert_eq!(cfg, Default::default());

    assert!(admin.save_points_rules("   ").is_err());
    admin.save_points_rules("+10 trasferta").unwrap();
    assert_eq!(client.local_view().points_rules_text, "+10 trasferta");
}

#[tokio::test]
async fn test_export_carries_every_section() {
    let api = FakeApi::with_roster();
    let client = common::client(&api);
    let admin = client.admin_login(PIN).unwrap();
    admin.create_event(derby()).unwrap();
    admin.adjust_points("S3", 5).unwrap();

    let snapshot = admin.export();
    let json: serde_json::Value = serde_json::from_str(&snapshot.to_pretty_json().unwrap()).unwrap();

    assert_eq!(json["members"].as_array().unwrap().len(), 3);
    assert_eq!(json["events"].as_array().unwrap().len(), 1);
    assert_eq!(json["points"]["S3"], 5);
    assert!(json["exportedAt"].as_str().unwrap().ends_with('Z'));
    assert!(json.get("ticketCfg").is_some());
}
