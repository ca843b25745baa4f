use crate::task::{NewTask, Schedule, MAX_INTERVAL_SECONDS, ScheduledTask, TaskStatus, TaskType};
use crate::SchedulerError;
use aussie_os_events::{EventBus, Notifier, SystemEvent};
use aussie_os_shell::ShellSimulator;
use aussie_os_swarm::SwarmOrchestrator;
use aussie_os_vfs::VirtualFileSystem;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const TASKS_FILE: &str = "/workspace/system/schedule.json";

/// Owns the task list and runs whatever is due.
///
/// The list lives in the virtual filesystem so the agent can read it like
/// any other file. `tick` is safe to call by hand; `start` drives it from a
/// tokio interval until `stop`.
pub struct Scheduler {
    vfs: Arc<VirtualFileSystem>,
    shell: Arc<ShellSimulator>,
    swarm: Arc<SwarmOrchestrator>,
    bus: EventBus,
    notifier: Notifier,
    tasks: Mutex<Vec<ScheduledTask>>,
    ticking: tokio::sync::Mutex<()>,
    timer: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl Scheduler {
    pub fn new(
        vfs: Arc<VirtualFileSystem>,
        shell: Arc<ShellSimulator>,
        swarm: Arc<SwarmOrchestrator>,
        bus: EventBus,
        notifier: Notifier,
    ) -> Self {
        let tasks = load_tasks(&vfs);
        info!("Scheduler loaded {} task(s)", tasks.len());
        Self {
            vfs,
            shell,
            swarm,
            bus,
            notifier,
            tasks: Mutex::new(tasks),
            ticking: tokio::sync::Mutex::new(()),
            timer: Mutex::new(None),
        }
    }

    pub fn add(&self, new: NewTask) -> Result<ScheduledTask, SchedulerError> {
        if new.name.trim().is_empty() {
            return Err(SchedulerError::InvalidTask("name must not be empty".to_string()));
        }
        if new.action.trim().is_empty() {
            return Err(SchedulerError::InvalidTask("action must not be empty".to_string()));
        }
        if new.schedule == Schedule::Interval && !matches!(new.interval_seconds, Some(s) if s > 0) {
            return Err(SchedulerError::InvalidTask(
                "interval schedule needs a positive interval".to_string(),
            ));
        }
        if matches!(new.interval_seconds, Some(s) if s > MAX_INTERVAL_SECONDS) {
            return Err(SchedulerError::InvalidTask(format!(
                "interval must be at most {} seconds",
                MAX_INTERVAL_SECONDS
            )));
        }

        let task = ScheduledTask {
            id: short_id(),
            name: new.name,
            task_type: new.task_type,
            action: new.action,
            schedule: new.schedule,
            interval_seconds: new.interval_seconds,
            last_run: None,
            next_run: now_ms(),
            status: TaskStatus::Active,
            last_result: None,
        };

        self.tasks.lock().push(task.clone());
        self.persist()?;
        info!("Scheduled task {} ({})", task.id, task.name);
        self.notifier
            .success("Task Scheduled", &format!("Task '{}' added.", task.name));
        Ok(task)
    }

    pub fn remove(&self, id: &str) -> Result<(), SchedulerError> {
        {
            let mut tasks = self.tasks.lock();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(SchedulerError::NotFound(id.to_string()));
            }
        }
        self.persist()
    }

    pub fn pause(&self, id: &str) -> Result<(), SchedulerError> {
        self.update(id, |task| {
            if task.status == TaskStatus::Active {
                task.status = TaskStatus::Paused;
            }
        })
    }

    /// Reactivate a paused task. A completed one-shot stays completed.
    pub fn resume(&self, id: &str) -> Result<(), SchedulerError> {
        self.update(id, |task| {
            if task.status == TaskStatus::Paused {
                task.status = TaskStatus::Active;
            }
        })
    }

    pub fn tasks(&self) -> Vec<ScheduledTask> {
        self.tasks.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<ScheduledTask> {
        self.tasks.lock().iter().find(|t| t.id == id).cloned()
    }

    /// Run every active task whose `next_run` is at or before `now`.
    /// Returns the ids that ran, in list order.
    pub async fn tick(&self, now: i64) -> Vec<String> {
        // Overlapping ticks would run the same task twice.
        let _guard = self.ticking.lock().await;

        let due: Vec<ScheduledTask> = self
            .tasks
            .lock()
            .iter()
            .filter(|t| t.is_due(now))
            .cloned()
            .collect();
        if due.is_empty() {
            return Vec::new();
        }
        debug!("Scheduler tick: {} task(s) due", due.len());

        let mut ran = Vec::with_capacity(due.len());
        for task in due {
            self.run_task(&task).await;
            ran.push(task.id);
        }
        ran
    }

    async fn run_task(&self, task: &ScheduledTask) {
        self.bus.emit(SystemEvent::TaskRun {
            task_id: task.id.clone(),
            name: task.name.clone(),
        });
        self.notifier
            .info("Scheduler", &format!("Running task: {}", task.name));
        info!("Running scheduled task {} ({:?})", task.id, task.task_type);

        let output = match task.task_type {
            TaskType::Command => {
                let result = self.shell.execute(&task.action);
                if result.success() {
                    "Success".to_string()
                } else {
                    format!("Failed: {}", result.stderr)
                }
            }
            TaskType::Swarm => match self.swarm.execute(&task.action).await {
                Ok(report) => report.message,
                Err(e) => format!("Error: {}", e),
            },
        };

        // The task may have been removed or paused while it ran.
        let finished_at = now_ms();
        let updated = self.update(&task.id, |stored| stored.finish_run(finished_at, &output));
        if let Err(e) = updated {
            warn!("Task {} finished but could not be recorded: {}", task.id, e);
        }

        self.bus.emit(SystemEvent::TaskComplete {
            task_id: task.id.clone(),
            result: output,
        });
    }

    /// Start ticking every `period`. Calling it twice keeps the first timer.
    pub fn start(self: &Arc<Self>, period: Duration) {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let child = token.clone();
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = interval.tick() => {
                        scheduler.tick(now_ms()).await;
                    }
                }
            }
            debug!("Scheduler timer stopped");
        });

        info!("Scheduler started ({:?} tick)", period);
        *timer = Some((token, handle));
    }

    pub fn stop(&self) {
        if let Some((token, _handle)) = self.timer.lock().take() {
            token.cancel();
            info!("Scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    fn update<F>(&self, id: &str, apply: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&mut ScheduledTask),
    {
        {
            let mut tasks = self.tasks.lock();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| SchedulerError::NotFound(id.to_string()))?;
            apply(task);
        }
        self.persist()
    }

    fn persist(&self) -> Result<(), SchedulerError> {
        let content = serde_json::to_string_pretty(&*self.tasks.lock())?;
        self.vfs.write_file(TASKS_FILE, &content, false).map_err(|e| {
            error!("Failed to save schedule: {}", e);
            SchedulerError::from(e)
        })
    }
}

fn load_tasks(vfs: &VirtualFileSystem) -> Vec<ScheduledTask> {
    if !vfs.exists(TASKS_FILE) {
        return Vec::new();
    }
    match vfs
        .read_file(TASKS_FILE)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
    {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!("Ignoring unreadable schedule at {}: {}", TASKS_FILE, e);
            Vec::new()
        }
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..9].to_string()
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
