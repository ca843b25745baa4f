//! Line-oriented front end: agent turns, direct shell access and kernel
//! inspection commands.

use crate::bootstrap::Kernel;
use aussie_os_core::{MessageRole, TurnOutcome};
use aussie_os_interfaces::Interface;
use aussie_os_policy::KernelPermissions;
use serde::Serialize;

const HELP: &str = "\
Commands:
  <text>          talk to the agent
  !<command>      run a shell command
  /windows        list open windows
  /bots           bot performance
  /tasks          scheduled tasks
  /log            terminal scrollback
  /status         agent phase and metrics
  /sandbox on|off restrict or restore tool permissions
  /clear          forget the conversation and scrollback
  /stop           cancel a pending rate-limit retry
  /quit           exit

Ctrl-C stops a running turn; at the idle prompt it exits.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Agent(String),
    Shell(String),
    Windows,
    Bots,
    Tasks,
    Log,
    Status,
    Sandbox(bool),
    Clear,
    Stop,
    Help,
    Quit,
    Unknown(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(command) = line.strip_prefix('!') {
            return ReplCommand::Shell(command.trim().to_string());
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Agent(line.to_string());
        };

        let mut words = rest.split_whitespace();
        match (words.next().unwrap_or(""), words.next()) {
            ("windows", None) => ReplCommand::Windows,
            ("bots", None) => ReplCommand::Bots,
            ("tasks", None) => ReplCommand::Tasks,
            ("log", None) => ReplCommand::Log,
            ("status", None) => ReplCommand::Status,
            ("sandbox", Some("on")) => ReplCommand::Sandbox(true),
            ("sandbox", Some("off")) => ReplCommand::Sandbox(false),
            ("clear", None) => ReplCommand::Clear,
            ("stop", None) => ReplCommand::Stop,
            ("help", None) => ReplCommand::Help,
            ("quit" | "exit", None) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        }
    }
}

/// What a Ctrl-C does at this moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// A turn or retry was in flight and has been cancelled.
    Stopped,
    /// Nothing was running; the host should exit.
    Exit,
}

/// Cancel agent work if there is any, otherwise ask the host to exit.
pub fn interrupt(kernel: &Kernel) -> Interrupt {
    if kernel.agent.status().is_processing || kernel.agent.has_pending_retry() {
        kernel.agent.stop();
        Interrupt::Stopped
    } else {
        Interrupt::Exit
    }
}

/// Read lines from `io` until end of input or `/quit`.
pub async fn run(kernel: &Kernel, io: &dyn Interface) -> anyhow::Result<()> {
    io.send_output(&format!(
        "Aussie OS ready. Agent {} on {}. Type /help for commands.",
        kernel.agent.profile().display_name,
        kernel.agent.provider_name()
    ))
    .await;

    while let Some(line) = io.receive_input().await {
        if line.trim().is_empty() {
            continue;
        }
        match ReplCommand::parse(&line) {
            ReplCommand::Quit => break,
            command => handle(kernel, io, command).await,
        }
    }

    Ok(())
}

pub async fn handle(kernel: &Kernel, io: &dyn Interface, command: ReplCommand) {
    match command {
        ReplCommand::Agent(input) => agent_turn(kernel, io, &input).await,
        ReplCommand::Shell(line) => shell(kernel, io, &line).await,
        ReplCommand::Windows => {
            let windows = kernel.windows.windows();
            if windows.is_empty() {
                io.send_output("No open windows.").await;
            }
            for window in windows {
                let state = if window.is_minimized { " (minimized)" } else { "" };
                io.send_output(&format!(
                    "{}  {} [{}] z={}{}",
                    window.id, window.title, window.app_id, window.z_index, state
                ))
                .await;
            }
        }
        ReplCommand::Bots => {
            for bot in kernel.bots.bots() {
                io.send_output(&format!(
                    "{}  {} [{}] pnl={:.2} roi={:.1}% {}W/{}L",
                    bot.id,
                    bot.name,
                    label(&bot.status),
                    bot.pnl,
                    bot.roi,
                    bot.wins,
                    bot.losses
                ))
                .await;
            }
            let total = kernel.bots.total_stats();
            io.send_output(&format!(
                "Total: pnl={:.2}, {} active, {}W/{}L",
                total.pnl, total.active, total.wins, total.losses
            ))
            .await;
        }
        ReplCommand::Tasks => {
            let tasks = kernel.scheduler.tasks();
            if tasks.is_empty() {
                io.send_output("No scheduled tasks.").await;
            }
            for task in tasks {
                let next = chrono::DateTime::from_timestamp_millis(task.next_run)
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| task.next_run.to_string());
                io.send_output(&format!(
                    "{}  {} [{} {}, {}] next {}{}",
                    task.id,
                    task.name,
                    label(&task.task_type),
                    label(&task.schedule),
                    label(&task.status),
                    next,
                    task.last_result
                        .map(|result| format!(" -> {}", result))
                        .unwrap_or_default()
                ))
                .await;
            }
        }
        ReplCommand::Log => {
            for block in kernel.terminal.blocks() {
                io.send_output(&format!("[{}] {}", block.kind.as_str(), block.content))
                    .await;
            }
        }
        ReplCommand::Status => {
            let status = kernel.agent.status();
            let metrics = kernel.agent.metrics();
            io.show_status(&format!(
                "phase={} processing={} turns={} tools={} ({:.0}% ok) denials={}",
                status.phase,
                status.is_processing,
                metrics.turns,
                metrics.tool_executions,
                metrics.tool_success_rate() * 100.0,
                metrics.permission_denials
            ))
            .await;
        }
        ReplCommand::Sandbox(on) => {
            let permissions = if on {
                KernelPermissions::sandboxed()
            } else {
                kernel.config.permissions.clone()
            };
            kernel.registry.set_permissions(permissions);
            let notice = if on { "Sandbox enabled" } else { "Sandbox disabled" };
            kernel.terminal.system(notice);
            io.show_status(notice).await;
        }
        ReplCommand::Clear => {
            kernel.agent.clear_history().await;
            kernel.terminal.clear();
            io.show_status("Conversation cleared").await;
        }
        ReplCommand::Stop => {
            kernel.agent.stop();
            io.show_status("Stop requested").await;
        }
        ReplCommand::Help => io.send_output(HELP).await,
        ReplCommand::Quit => {}
        ReplCommand::Unknown(line) => {
            io.show_error(&format!("Unknown command: {} (try /help)", line))
                .await
        }
    }
}

async fn agent_turn(kernel: &Kernel, io: &dyn Interface, input: &str) {
    let seen = kernel.agent.messages().len();
    let outcome = kernel.agent.process_input(input).await;

    let messages = kernel.agent.messages();
    for message in messages.iter().skip(seen) {
        match message.role {
            MessageRole::User => {}
            MessageRole::Model => {
                let sender = message.sender.as_deref().unwrap_or("Agent");
                io.send_output(&format!("{}: {}", sender, message.text)).await;
            }
            MessageRole::System => io.show_status(&message.text).await,
        }
    }

    match outcome {
        TurnOutcome::Failed => io.show_error("The agent turn failed").await,
        TurnOutcome::RetryScheduled { delay, attempt } => {
            tracing::debug!("Retry {} queued in {:?}", attempt, delay);
        }
        _ => {}
    }
}

async fn shell(kernel: &Kernel, io: &dyn Interface, line: &str) {
    if line.is_empty() {
        return;
    }
    kernel.terminal.command(line);
    let result = kernel.shell.execute(line);

    if result.clear_screen {
        kernel.terminal.clear();
    }
    if !result.stdout.is_empty() {
        io.send_output(&result.stdout).await;
    }
    if !result.stderr.is_empty() {
        kernel.terminal.error(&result.stderr);
        io.show_error(&result.stderr).await;
    }
}

/// The wire name of a serde unit variant.
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::from("?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ReplCommand::parse("hello there"), ReplCommand::Agent("hello there".to_string()));
        assert_eq!(ReplCommand::parse("!ls -a /"), ReplCommand::Shell("ls -a /".to_string()));
        assert_eq!(ReplCommand::parse("/windows"), ReplCommand::Windows);
        assert_eq!(ReplCommand::parse("/sandbox on"), ReplCommand::Sandbox(true));
        assert_eq!(ReplCommand::parse("/sandbox off"), ReplCommand::Sandbox(false));
        assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Quit);
        assert_eq!(
            ReplCommand::parse("/sandbox"),
            ReplCommand::Unknown("/sandbox".to_string())
        );
        assert_eq!(ReplCommand::parse("/nope"), ReplCommand::Unknown("/nope".to_string()));
    }

    #[test]
    fn test_label() {
        assert_eq!(label(&aussie_os_tasks::Schedule::Interval), "interval");
        assert_eq!(label(&aussie_os_bots::BotStatus::Stopped), "stopped");
    }
}
