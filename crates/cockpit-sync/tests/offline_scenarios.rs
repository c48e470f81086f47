//! Offline queue, backup and reconciliation scenarios

use cockpit_sync::{FileStorage, LoadSource, SyncConfig, SyncService, TransportError};
use cockpit_test_utils::{memory_service, plant_cockpit, seconds_ago, ScriptedTransport};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

/// Wait until the queue is empty and no drain is running
async fn settle(service: &SyncService) {
    let mut rx = service.subscribe();
    rx.wait_for(|s| s.pending_count == 0 && !s.is_syncing).await.unwrap();
}

/// Scenario C: three offline edits collapse into one write, sent once on
/// reconnect, and the backup is cleared
#[tokio::test]
async fn offline_edits_coalesce_and_flush_on_reconnect() {
    let transport = ScriptedTransport::new();
    let (_, service) = memory_service(&transport);
    let (mut cockpit, _) = plant_cockpit();
    service.set_online(false);

    for name in ["Plant v1", "Plant v2", "Plant v3"] {
        cockpit.name = name.to_string();
        service.persist(&cockpit);
    }
    assert_eq!(service.state().pending_count, 1);
    assert!(service.backups().exists(&cockpit.id).unwrap());

    service.set_online(true);
    settle(&service).await;

    let puts = transport.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].payload.name, "Plant v3");
    assert!(!service.backups().exists(&cockpit.id).unwrap());
}

/// P5: two updates before either is sent leave one entry with the second
/// payload
#[tokio::test]
async fn coalescing_keeps_latest_payload() {
    let transport = ScriptedTransport::new();
    let (_, service) = memory_service(&transport);
    let (mut cockpit, _) = plant_cockpit();
    service.set_online(false);

    cockpit.name = "first".into();
    service.persist(&cockpit);
    cockpit.name = "second".into();
    service.persist(&cockpit);

    let pending = service.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload.name, "second");
}

/// Scenario D: 409 removes the entry and surfaces no error
#[tokio::test]
async fn conflict_is_soft_success() {
    let transport = ScriptedTransport::new();
    transport.respond_with(409, 1);
    let (_, service) = memory_service(&transport);
    let (cockpit, _) = plant_cockpit();

    service.persist(&cockpit);
    settle(&service).await;

    let state = service.state();
    assert_eq!(state.pending_count, 0);
    assert_eq!(state.last_error, None);
    assert_eq!(transport.put_count(), 1);
}

/// P6: five consecutive failures drop the write and record the error;
/// no sixth attempt
#[tokio::test(start_paused = true)]
async fn retries_stop_after_five_failures() {
    let transport = ScriptedTransport::new();
    transport.respond_with(503, 10);
    let (_, service) = memory_service(&transport);
    let (cockpit, _) = plant_cockpit();

    service.persist(&cockpit);

    // 2 + 4 + 8 + 16 seconds of backoff between the five attempts
    tokio::time::sleep(Duration::from_secs(40)).await;
    assert_eq!(transport.put_count(), 5);
    let state = service.state();
    assert_eq!(state.pending_count, 0);
    assert!(state.last_error.unwrap().contains("503"));

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(transport.put_count(), 5);
    // dropped, not delivered: the backup survives
    assert!(service.backups().exists(&cockpit.id).unwrap());
}

/// Backoff doubles between attempts
#[tokio::test(start_paused = true)]
async fn backoff_spacing() {
    let transport = ScriptedTransport::new();
    transport.respond_with(500, 2);
    let (_, service) = memory_service(&transport);
    let (cockpit, _) = plant_cockpit();

    service.persist(&cockpit);
    tokio::time::sleep(Duration::from_millis(1900)).await;
    assert_eq!(transport.put_count(), 1);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.put_count(), 2);
    tokio::time::sleep(Duration::from_millis(3800)).await;
    assert_eq!(transport.put_count(), 2);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(transport.put_count(), 3);
    assert!(service.pending().is_empty());
}

/// Network errors retry like 5xx
#[tokio::test(start_paused = true)]
async fn network_errors_are_retried() {
    let transport = ScriptedTransport::new();
    transport.script([Err(TransportError::Network("reset".into()))]);
    let (_, service) = memory_service(&transport);
    let (cockpit, _) = plant_cockpit();

    service.persist(&cockpit);
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(transport.put_count(), 2);
    assert!(service.pending().is_empty());
}

/// Writes for different cockpits go out FIFO, one at a time
#[tokio::test]
async fn fifo_across_cockpits() {
    let transport = ScriptedTransport::new();
    let (_, service) = memory_service(&transport);
    service.set_online(false);
    let (a, _) = plant_cockpit();
    let mut b = a.clone();
    b.id = "other".into();
    b.name = "Other".into();

    service.persist(&a);
    service.persist(&b);
    service.set_online(true);
    settle(&service).await;

    let order: Vec<_> = transport.puts().into_iter().map(|p| p.payload.name).collect();
    assert_eq!(order, vec!["Plant".to_string(), "Other".to_string()]);
}

/// P7: a backup newer than the server copy wins and is pushed back once
#[tokio::test]
async fn newer_backup_wins_on_load() {
    let transport = ScriptedTransport::new();
    let (mut server, _) = plant_cockpit();
    server.updated_at = Some(seconds_ago(120));
    transport.serve(server.clone());
    let (_, service) = memory_service(&transport);

    let mut local = server.clone();
    local.name = "Edited offline".into();
    service.backups().save_at(&local, seconds_ago(10)).unwrap();

    let loaded = service.reconciler().load(&server.id).await.unwrap();
    assert_eq!(loaded.source, LoadSource::Backup);
    assert_eq!(loaded.cockpit.name, "Edited offline");

    if loaded.needs_resave() {
        service.persist(&loaded.cockpit);
    }
    settle(&service).await;
    assert_eq!(transport.put_count(), 1);
    assert_eq!(transport.puts()[0].payload.name, "Edited offline");
}

/// Force sync probes health, then drains
#[tokio::test]
async fn force_sync_requires_health() {
    let transport = ScriptedTransport::new();
    let (_, service) = memory_service(&transport);
    let (cockpit, _) = plant_cockpit();
    service.set_online(false);
    service.persist(&cockpit);

    transport.set_offline(true);
    assert!(service.force_sync().await.is_err());
    assert!(!service.state().is_online);
    assert_eq!(service.state().pending_count, 1);

    transport.set_offline(false);
    let report = service.force_sync().await.unwrap();
    assert_eq!(report.sent, 1);
    assert!(service.state().is_online);
}

/// Queue and backup survive a restart on file storage
#[tokio::test]
async fn file_backed_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let transport = ScriptedTransport::new();
    let (cockpit, _) = plant_cockpit();

    {
        let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
        let service = SyncService::new(&SyncConfig::default(), storage, transport.clone()).unwrap();
        service.set_online(false);
        service.persist(&cockpit);
        service.dispose();
    }

    let storage = Arc::new(FileStorage::open(dir.path()).unwrap());
    let service = SyncService::new(&SyncConfig::default(), storage, transport.clone()).unwrap();
    assert_eq!(service.state().pending_count, 1);
    assert!(service.backups().exists(&cockpit.id).unwrap());

    service.start();
    settle(&service).await;
    assert_eq!(transport.put_count(), 1);
    assert!(!service.backups().exists(&cockpit.id).unwrap());
}

/// Subscribers see the current state first, then transitions
#[tokio::test]
async fn subscribers_get_state_immediately() {
    let transport = ScriptedTransport::new();
    let (_, service) = memory_service(&transport);
    service.set_online(false);

    let mut rx = service.subscribe();
    rx.changed().await.unwrap();
    assert!(!rx.borrow_and_update().is_online);

    let (cockpit, _) = plant_cockpit();
    service.persist(&cockpit);
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().pending_count, 1);
}
