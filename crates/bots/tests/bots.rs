use aussie_os_bots::*;
use aussie_os_events::{EventBus, EventKind, SystemEvent};
use aussie_os_storage::{KeyValueStore, MemoryStore};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

fn seeded(bus: EventBus) -> BotManager {
    BotManager::with_rng(bus, StdRng::seed_from_u64(42))
}

fn nba() -> BotAppConfig {
    BotAppConfig::themed("nba", "NBA Courtside", Some("bg-orange-500"))
}

#[test]
fn test_register_is_idempotent() {
    let manager = seeded(EventBus::new());
    assert!(manager.register_bot("nba-bot", "NBA", nba()));
    assert!(!manager.register_bot("nba-bot", "Other", nba()));

    let bot = manager.bot("nba-bot").unwrap();
    assert_eq!(bot.name, "NBA");
    assert_eq!(bot.status, BotStatus::Stopped);
}

#[test]
fn test_stopped_bots_never_trade() {
    let manager = seeded(EventBus::new());
    manager.register_bot("nba-bot", "NBA", nba());
    for _ in 0..50 {
        assert!(manager.tick().is_empty());
    }
    assert!(manager.bot("nba-bot").unwrap().trades.is_empty());
}

#[test]
fn test_running_bot_accumulates_consistent_stats() {
    let manager = seeded(EventBus::new());
    manager.register_bot("nba-bot", "NBA", nba());
    manager.set_status("nba-bot", BotStatus::Running).unwrap();

    let mut trades = 0;
    for _ in 0..200 {
        trades += manager.tick().len();
    }
    let bot = manager.bot("nba-bot").unwrap();

    // 0.3 per tick over 200 ticks.
    assert!(trades > 20, "only {} trades", trades);
    assert_eq!((bot.wins + bot.losses) as usize, trades);
    assert_eq!(bot.trades.len(), 20);
    let expected_roi = bot.pnl / ((bot.wins + bot.losses) as f64 * 100.0) * 100.0;
    assert!((bot.roi - expected_roi).abs() < 1e-9);
    assert!(bot.trades.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert!(bot.trades.iter().all(|t| match t.status {
        TradeStatus::Won => t.pnl > 0.0,
        TradeStatus::Lost => t.pnl < 0.0,
    }));
}

#[test]
fn test_same_seed_same_outcome() {
    let run = || {
        let manager = seeded(EventBus::new());
        manager.register_bot("nba-bot", "NBA", nba());
        manager.set_status("nba-bot", BotStatus::Running).unwrap();
        for _ in 0..30 {
            manager.tick();
        }
        let bot = manager.bot("nba-bot").unwrap();
        (bot.wins, bot.losses, bot.pnl)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_total_stats() {
    let manager = seeded(EventBus::new());
    manager.register_bot("a", "A", nba());
    manager.register_bot("b", "B", nba());
    manager.set_status("a", BotStatus::Running).unwrap();
    for _ in 0..40 {
        manager.tick();
    }

    let stats = manager.total_stats();
    let bots = manager.bots();
    assert_eq!(stats.active, 1);
    assert_eq!(stats.wins, bots.iter().map(|b| b.wins).sum::<u32>());
    assert!((stats.pnl - bots.iter().map(|b| b.pnl).sum::<f64>()).abs() < 1e-9);
}

#[test]
fn test_update_config_and_unknown_bot() {
    let bus = EventBus::new();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let u = Arc::clone(&updates);
    bus.on(EventKind::BotUpdate, move |event| {
        if let SystemEvent::BotUpdate { app_id } = event {
            u.lock().push(app_id.clone());
        }
    });

    let manager = seeded(bus);
    manager.register_bot("nba-bot", "NBA", nba());
    manager
        .update_config(
            "nba-bot",
            BotConfigPatch {
                title: Some("Courtside Pro".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let config = manager.bot("nba-bot").unwrap().config;
    assert_eq!(config.title, "Courtside Pro");
    assert_eq!(config.sport, "nba");
    assert_eq!(*updates.lock(), vec![Some("nba-bot".to_string())]);

    assert!(matches!(
        manager.set_status("ghost", BotStatus::Running),
        Err(BotError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_timer_ticks_every_period() {
    let bus = EventBus::new();
    let ticks = Arc::new(Mutex::new(0usize));
    let t = Arc::clone(&ticks);
    bus.on(EventKind::BotUpdate, move |event| {
        if let SystemEvent::BotUpdate { app_id: None } = event {
            *t.lock() += 1;
        }
    });

    let manager = Arc::new(seeded(bus));
    manager.start(Duration::from_secs(2));
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    manager.stop();
    let after_stop = *ticks.lock();
    assert_eq!(after_stop, 3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*ticks.lock(), after_stop);
}

#[test]
fn test_create_bot_app() {
    let bus = EventBus::new();
    let created = Arc::new(Mutex::new(Vec::new()));
    let c = Arc::clone(&created);
    bus.on(EventKind::AppCreated, move |event| {
        if let SystemEvent::AppCreated { id, .. } = event {
            c.lock().push(id.clone());
        }
    });

    let registry = AppRegistry::new(bus);
    let app = registry
        .create_bot_app(NewBotApp {
            name: "Cricket Oracle".to_string(),
            description: "Ball by ball".to_string(),
            sport: "cricket".to_string(),
            theme_color: Some("bg-emerald-500".to_string()),
        })
        .unwrap();

    let suffix = app.id.strip_prefix("cricket-oracle-bot-").unwrap();
    assert_eq!(suffix.len(), 4);
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    assert!(app.installed);
    let config = app.bot_config.clone().unwrap();
    assert_eq!(config.accent_color, "text-emerald-500");
    assert_eq!(registry.get(&app.id), Some(app.clone()));
    assert_eq!(*created.lock(), vec![app.id]);

    assert!(matches!(
        registry.create_bot_app(NewBotApp {
            name: "  ".to_string(),
            description: String::new(),
            sport: "afl".to_string(),
            theme_color: None,
        }),
        Err(BotError::InvalidApp(_))
    ));
}

#[test]
fn test_installed_flags_survive_restart() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let registry = AppRegistry::with_store(EventBus::new(), Arc::clone(&store));
    assert!(!registry.get("nba-bot").unwrap().installed);
    registry.set_installed("nba-bot", true).unwrap();
    let custom = registry
        .create_bot_app(NewBotApp {
            name: "AFL Tipper".to_string(),
            description: "Footy tips".to_string(),
            sport: "afl".to_string(),
            theme_color: None,
        })
        .unwrap();

    let reloaded = AppRegistry::with_store(EventBus::new(), store);
    assert!(reloaded.get("nba-bot").unwrap().installed);
    assert_eq!(reloaded.get(&custom.id), Some(custom));
    assert!(matches!(
        reloaded.set_installed("ghost", true),
        Err(BotError::AppNotFound(_))
    ));
}

#[test]
fn test_corrupt_registry_falls_back_to_defaults() {
    let store = Arc::new(MemoryStore::new());
    store.set_raw("app_registry", "{broken").unwrap();
    let registry = AppRegistry::with_store(EventBus::new(), store);
    assert_eq!(registry.apps().len(), 7);
}
