// Tick server over a rooms directory: loading, broadcast order, downed
// players and the bounded run loop.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use delve_ai::engine::combat::CombatPolicy;
use delve_ai::engine::manager::AiManager;
use delve_ai::engine::room::Room;
use delve_ai::engine::server::{register_rooms, TickServer};

fn guard_room(name: &str, x: i32) -> String {
    format!(
        r#"{{"name": "{name}", "width": 10, "height": 3,
            "creatures": [{{"name": "warden", "pos": {{"x": {x}, "y": 0}},
                "origin": {{"x": 0, "y": 0}},
                "disposition": "friendly", "archetype": "guard"}}]}}"#
    )
}

/// Fresh directory under the system temp dir, unique per test.
fn rooms_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("delve-ai-{test}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn populate(dir: &PathBuf) {
    std::fs::write(dir.join("b.json"), guard_room("beta", 128)).unwrap();
    std::fs::write(dir.join("a.json"), guard_room("alpha", 96)).unwrap();
    std::fs::write(
        dir.join("c.json"),
        r#"{"name": "empty", "width": 2, "height": 2}"#,
    )
    .unwrap();
    std::fs::write(dir.join("junk.json"), "not json").unwrap();
    std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
}

#[test]
fn test_register_rooms_skips_bad_files() {
    let dir = rooms_dir("register");
    populate(&dir);
    let manager = AiManager::new(Some(1), CombatPolicy::default());
    let handles = register_rooms(&manager, &dir).unwrap();
    assert_eq!(handles.len(), 3);
    assert_eq!(manager.room_names(), vec!["alpha", "beta", "empty"]);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_register_rooms_missing_dir_errors() {
    let manager = AiManager::default();
    let missing = std::env::temp_dir().join("delve-ai-does-not-exist");
    assert!(register_rooms(&manager, &missing).is_err());
}

#[tokio::test]
async fn test_broadcast_one_message_per_active_room() {
    let dir = rooms_dir("broadcast");
    populate(&dir);
    let manager = Arc::new(AiManager::new(Some(6), CombatPolicy::default()));
    let _rooms = register_rooms(&manager, &dir).unwrap();
    let server = TickServer::new(Arc::clone(&manager), Duration::from_millis(5), None);
    let mut rx = server.subscribe();

    // The empty room has nothing to report
    assert_eq!(server.tick_all().await, 2);

    let first: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    let second: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(first["type"], "ai_update");
    assert_eq!(first["room"], "alpha");
    assert_eq!(first["updates"][0]["name"], "warden");
    assert_eq!(first["updates"][0]["update"]["newX"], 80);
    assert_eq!(second["room"], "beta");
    assert_eq!(second["updates"][0]["update"]["newX"], 112);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_stop_ends_the_loop() {
    let manager = Arc::new(AiManager::default());
    let server = Arc::new(TickServer::new(manager, Duration::from_millis(2), None));
    let runner = Arc::clone(&server);
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(server.is_running());
    server.stop();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(!server.is_running());
    assert!(server.tick_count() >= 1);
}

#[tokio::test]
async fn test_downed_player_published_once() {
    let manager = Arc::new(AiManager::new(Some(3), CombatPolicy::default()));
    let room = r#"{"name": "arena", "width": 6, "height": 6,
        "creatures": [{"name": "orc", "pos": {"x": 32, "y": 32}, "origin": {"x": 32, "y": 32},
            "disposition": "hostile", "archetype": "guard",
            "ratings": {"accuracy": 200, "strength": 400}}],
        "players": [{"id": 4, "name": "alice", "pos": {"x": 48, "y": 32},
            "pools": {"blood": 1, "consciousness": 100, "stamina": 100},
            "ratings": {"evasion": 0, "parry": 0}}]}"#;
    let room = Room::from_json(room).unwrap();
    manager.add_room(Arc::new(Mutex::new(room))).unwrap();
    let server = TickServer::new(Arc::clone(&manager), Duration::from_millis(5), None);
    let mut rx = server.subscribe();

    let mut downed = Vec::new();
    for _ in 0..20 {
        if server.tick_all().await == 0 {
            continue;
        }
        let msg: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        if let Some(ids) = msg["downed"].as_array() {
            downed.extend(ids.iter().filter_map(|v| v.as_u64()));
        }
    }
    assert_eq!(downed, vec![4]);
}
