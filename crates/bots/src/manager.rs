use crate::bot::*;
use crate::BotError;
use aussie_os_events::{EventBus, SystemEvent};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const TICK_PERIOD: Duration = Duration::from_secs(2);

const TRADE_CHANCE: f64 = 0.3;
const WIN_CHANCE: f64 = 0.55;
const PAYOUT: f64 = 0.9;

/// Owns every bot and mutates them on a timer.
///
/// Randomness comes from an injected [`StdRng`] so a seeded manager replays
/// the same trades.
pub struct BotManager {
    bots: Mutex<BTreeMap<String, BotInstance>>,
    rng: Mutex<StdRng>,
    bus: EventBus,
    timer: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl BotManager {
    pub fn new(bus: EventBus) -> Self {
        Self::with_rng(bus, StdRng::from_entropy())
    }

    pub fn with_rng(bus: EventBus, rng: StdRng) -> Self {
        Self {
            bots: Mutex::new(BTreeMap::new()),
            rng: Mutex::new(rng),
            bus,
            timer: Mutex::new(None),
        }
    }

    /// Add a stopped bot. Registering an existing id is a no-op.
    pub fn register_bot(&self, app_id: &str, name: &str, config: BotAppConfig) -> bool {
        let mut bots = self.bots.lock();
        if bots.contains_key(app_id) {
            return false;
        }
        bots.insert(app_id.to_string(), BotInstance::new(app_id, name, config));
        info!("Registered bot {}", app_id);
        true
    }

    pub fn set_status(&self, app_id: &str, status: BotStatus) -> Result<(), BotError> {
        self.modify(app_id, |bot| bot.status = status)
    }

    pub fn update_config(&self, app_id: &str, patch: BotConfigPatch) -> Result<(), BotError> {
        self.modify(app_id, |bot| bot.config.apply(patch))
    }

    pub fn bot(&self, app_id: &str) -> Option<BotInstance> {
        self.bots.lock().get(app_id).cloned()
    }

    pub fn bots(&self) -> Vec<BotInstance> {
        self.bots.lock().values().cloned().collect()
    }

    pub fn total_stats(&self) -> TotalStats {
        self.bots
            .lock()
            .values()
            .fold(TotalStats::default(), |mut stats, bot| {
                stats.pnl += bot.pnl;
                stats.wins += bot.wins;
                stats.losses += bot.losses;
                if bot.status == BotStatus::Running {
                    stats.active += 1;
                }
                stats
            })
    }

    /// One simulation step. Every running bot may settle one trade.
    /// Returns the ids of bots that traded.
    pub fn tick(&self) -> Vec<String> {
        let traded: Vec<String> = {
            let mut bots = self.bots.lock();
            let mut rng = self.rng.lock();
            bots.values_mut()
                .filter(|bot| bot.status == BotStatus::Running)
                .filter_map(|bot| {
                    if rng.gen::<f64>() >= TRADE_CHANCE {
                        return None;
                    }
                    let trade = random_trade(&mut *rng, &bot.config.sport);
                    debug!("Bot {} settled {:?} for {:.2}", bot.id, trade.status, trade.pnl);
                    bot.record(trade);
                    Some(bot.id.clone())
                })
                .collect()
        };

        for app_id in &traded {
            self.bus.emit(SystemEvent::BotUpdate {
                app_id: Some(app_id.clone()),
            });
        }
        self.bus.emit(SystemEvent::BotUpdate { app_id: None });
        traded
    }

    pub fn start(self: &Arc<Self>, period: Duration) {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let child = token.clone();
        let manager = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        manager.tick();
                    }
                }
            }
        });

        info!("Bot simulation started ({:?} tick)", period);
        *timer = Some((token, handle));
    }

    pub fn stop(&self) {
        if let Some((token, _handle)) = self.timer.lock().take() {
            token.cancel();
            info!("Bot simulation stopped");
        }
    }

    fn modify<F>(&self, app_id: &str, apply: F) -> Result<(), BotError>
    where
        F: FnOnce(&mut BotInstance),
    {
        {
            let mut bots = self.bots.lock();
            let bot = bots
                .get_mut(app_id)
                .ok_or_else(|| BotError::NotFound(app_id.to_string()))?;
            apply(bot);
        }
        self.bus.emit(SystemEvent::BotUpdate {
            app_id: Some(app_id.to_string()),
        });
        Ok(())
    }
}

fn random_trade<R: Rng>(rng: &mut R, sport: &str) -> Trade {
    let amount: u32 = rng.gen_range(50..150);
    let won = rng.gen_bool(WIN_CHANCE);
    let side = if rng.gen_bool(0.5) {
        TradeSide::Buy
    } else {
        TradeSide::Sell
    };
    Trade {
        id: uuid::Uuid::new_v4().simple().to_string()[..9].to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        side,
        amount,
        asset: format!("{} Match", sport.to_uppercase()),
        pnl: if won {
            amount as f64 * PAYOUT
        } else {
            -(amount as f64)
        },
        status: if won { TradeStatus::Won } else { TradeStatus::Lost },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_trade_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let trade = random_trade(&mut rng, "nba");
            assert!((50..150).contains(&trade.amount));
            assert_eq!(trade.asset, "NBA Match");
            match trade.status {
                TradeStatus::Won => assert!((trade.pnl - trade.amount as f64 * 0.9).abs() < 1e-9),
                TradeStatus::Lost => assert_eq!(trade.pnl, -(trade.amount as f64)),
            }
        }
    }
}
