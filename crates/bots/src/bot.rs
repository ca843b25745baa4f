use serde::{Deserialize, Serialize};

/// Most recent trades kept per bot.
pub const TRADE_HISTORY: usize = 20;
/// Nominal stake used for the ROI estimate.
pub const NOMINAL_STAKE: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BotAppConfig {
    pub sport: String,
    pub title: String,
    pub theme_color: String,
    pub accent_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_feed_url: Option<String>,
}

impl BotAppConfig {
    /// Config for a custom bot; the accent follows the theme colour.
    pub fn themed(sport: &str, title: &str, theme_color: Option<&str>) -> Self {
        let theme = theme_color.unwrap_or("bg-aussie-500");
        Self {
            sport: sport.to_string(),
            title: title.to_string(),
            theme_color: theme.to_string(),
            accent_color: theme.replacen("bg-", "text-", 1),
            data_feed_url: None,
        }
    }
}

/// Partial update for [`BotAppConfig`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BotConfigPatch {
    pub sport: Option<String>,
    pub title: Option<String>,
    pub theme_color: Option<String>,
    pub accent_color: Option<String>,
    pub data_feed_url: Option<String>,
}

impl BotAppConfig {
    pub fn apply(&mut self, patch: BotConfigPatch) {
        if let Some(sport) = patch.sport {
            self.sport = sport;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(theme) = patch.theme_color {
            self.theme_color = theme;
        }
        if let Some(accent) = patch.accent_color {
            self.accent_color = accent;
        }
        if patch.data_feed_url.is_some() {
            self.data_feed_url = patch.data_feed_url;
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Trades settle the tick they are placed, so there is no open state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Won,
    Lost,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub amount: u32,
    pub asset: String,
    pub pnl: f64,
    pub status: TradeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotInstance {
    pub id: String,
    pub name: String,
    pub status: BotStatus,
    pub pnl: f64,
    pub roi: f64,
    pub wins: u32,
    pub losses: u32,
    /// Newest first, at most [`TRADE_HISTORY`] entries.
    pub trades: Vec<Trade>,
    pub config: BotAppConfig,
}

impl BotInstance {
    pub fn new(id: &str, name: &str, config: BotAppConfig) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            status: BotStatus::Stopped,
            pnl: 0.0,
            roi: 0.0,
            wins: 0,
            losses: 0,
            trades: Vec::new(),
            config,
        }
    }

    /// Fold a settled trade into the running totals.
    pub fn record(&mut self, trade: Trade) {
        self.pnl += trade.pnl;
        match trade.status {
            TradeStatus::Won => self.wins += 1,
            TradeStatus::Lost => self.losses += 1,
        }
        self.trades.insert(0, trade);
        self.trades.truncate(TRADE_HISTORY);

        let invested = (self.wins + self.losses) as f64 * NOMINAL_STAKE;
        self.roi = if invested > 0.0 {
            self.pnl / invested * 100.0
        } else {
            0.0
        };
    }
}

/// Aggregate over every registered bot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TotalStats {
    pub pnl: f64,
    /// Bots currently running.
    pub active: usize,
    pub wins: u32,
    pub losses: u32,
}
