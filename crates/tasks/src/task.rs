use chrono::{Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Longest accepted repeat period: one year.
pub const MAX_INTERVAL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// A shell command line.
    Command,
    /// An objective handed to the swarm.
    Swarm,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Once,
    Interval,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Paused,
    Completed,
}

/// A persisted job. Timestamps are unix milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub action: String,
    pub schedule: Schedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<i64>,
    pub next_run: i64,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_result: Option<String>,
}

impl ScheduledTask {
    pub fn is_due(&self, now_ms: i64) -> bool {
        self.status == TaskStatus::Active && self.next_run <= now_ms
    }

    /// Record a finished run at `now_ms` and work out what happens next.
    pub fn finish_run(&mut self, now_ms: i64, output: &str) {
        self.last_run = Some(now_ms);
        self.last_result = Some(summarize(output));

        match self.schedule {
            Schedule::Once => self.status = TaskStatus::Completed,
            Schedule::Interval => match self.interval_seconds.and_then(|s| after(now_ms, s)) {
                Some(next_run) => self.next_run = next_run,
                // Without a usable period there is no next run.
                None => self.status = TaskStatus::Completed,
            },
            Schedule::Hourly => self.next_run = now_ms + HOUR_MS,
            Schedule::Daily => self.next_run = now_ms + DAY_MS,
            Schedule::Weekly => self.next_run = now_ms + 7 * DAY_MS,
            Schedule::Monthly => self.next_run = add_month(now_ms),
        }
    }
}

/// Input for [`crate::Scheduler::add`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub action: String,
    pub schedule: Schedule,
    #[serde(default)]
    pub interval_seconds: Option<u64>,
}

impl NewTask {
    pub fn command(name: &str, action: &str, schedule: Schedule) -> Self {
        Self {
            name: name.to_string(),
            task_type: TaskType::Command,
            action: action.to_string(),
            schedule,
            interval_seconds: None,
        }
    }

    pub fn swarm(name: &str, objective: &str, schedule: Schedule) -> Self {
        Self {
            task_type: TaskType::Swarm,
            ..Self::command(name, objective, schedule)
        }
    }

    pub fn every(mut self, seconds: u64) -> Self {
        self.schedule = Schedule::Interval;
        self.interval_seconds = Some(seconds);
        self
    }
}

pub const RESULT_PREVIEW_CHARS: usize = 100;

/// First 100 characters of a run's output, with `...` when cut.
pub fn summarize(output: &str) -> String {
    let mut chars = output.chars();
    let head: String = chars.by_ref().take(RESULT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// `now_ms` plus `seconds`, or `None` for a zero or unrepresentable period.
fn after(now_ms: i64, seconds: u64) -> Option<i64> {
    if seconds == 0 {
        return None;
    }
    i64::try_from(seconds)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| now_ms.checked_add(ms))
}

fn add_month(now_ms: i64) -> i64 {
    Utc.timestamp_millis_opt(now_ms)
        .single()
        .and_then(|at| at.checked_add_months(Months::new(1)))
        .map(|at| at.timestamp_millis())
        .unwrap_or(now_ms + 30 * DAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(schedule: Schedule) -> ScheduledTask {
        ScheduledTask {
            id: "t1".to_string(),
            name: "backup".to_string(),
            task_type: TaskType::Command,
            action: "ls".to_string(),
            schedule,
            interval_seconds: None,
            last_run: None,
            next_run: 0,
            status: TaskStatus::Active,
            last_result: None,
        }
    }

    #[test]
    fn test_summarize_truncates() {
        assert_eq!(summarize("short"), "short");
        let exact = "x".repeat(100);
        assert_eq!(summarize(&exact), exact);
        let long = "y".repeat(150);
        assert_eq!(summarize(&long), format!("{}...", "y".repeat(100)));
    }

    #[test]
    fn test_reschedule_rules() {
        let now = 1_000_000;

        let mut once = task(Schedule::Once);
        once.finish_run(now, "ok");
        assert_eq!(once.status, TaskStatus::Completed);
        assert_eq!(once.last_run, Some(now));

        let mut interval = task(Schedule::Interval);
        interval.interval_seconds = Some(30);
        interval.finish_run(now, "ok");
        assert_eq!(interval.next_run, now + 30_000);
        assert_eq!(interval.status, TaskStatus::Active);

        let mut huge = task(Schedule::Interval);
        huge.interval_seconds = Some(10_000_000_000_000_000);
        huge.finish_run(now, "ok");
        assert_eq!(huge.status, TaskStatus::Completed);
        assert_eq!(huge.next_run, 0);

        let mut hourly = task(Schedule::Hourly);
        hourly.finish_run(now, "ok");
        assert_eq!(hourly.next_run, now + HOUR_MS);

        let mut weekly = task(Schedule::Weekly);
        weekly.finish_run(now, "ok");
        assert_eq!(weekly.next_run, now + 7 * DAY_MS);
    }

    #[test]
    fn test_monthly_follows_calendar() {
        // 2024-01-31T00:00:00Z -> 2024-02-29T00:00:00Z
        let jan_31 = 1_706_659_200_000;
        let mut monthly = task(Schedule::Monthly);
        monthly.finish_run(jan_31, "ok");
        assert_eq!(monthly.next_run, 1_709_164_800_000);
    }

    #[test]
    fn test_json_shape() {
        let mut t = task(Schedule::Interval);
        t.interval_seconds = Some(5);
        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["type"], "command");
        assert_eq!(value["intervalSeconds"], 5);
        assert_eq!(value["nextRun"], 0);
        assert!(value.get("lastRun").is_none());
    }
}
