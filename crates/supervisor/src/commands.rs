//! The four supervisor commands: find, stop, start, status.
//!
//! All of them are strictly sequential and synchronous. User-facing output
//! goes to stdout in Russian, mirroring the bot's own replies; diagnostics
//! that the operator does not need go through `tracing`.

use std::{path::Path, time::Duration};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

use tracing::warn;

use {
    chrono::{Local, TimeZone},
    kartina_config::SupervisorConfig,
};

use crate::{
    error::{Context, Result},
    inspector::{ProcessInspector, ProcessRecord},
};

/// File name of the bot binary a supervised instance runs under.
const BOT_BINARY: &str = "kartina";

/// Subcommand a running bot instance carries on its command line.
const RUN_MARKER: &str = "run";

/// Grace period between the polite termination signal and the force kill.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

// ── find ─────────────────────────────────────────────────────────────────────

/// All running bot instances, excluding the calling process.
pub fn find(inspector: &mut dyn ProcessInspector) -> Vec<ProcessRecord> {
    find_with(inspector, std::process::id())
}

fn find_with(inspector: &mut dyn ProcessInspector, own_pid: u32) -> Vec<ProcessRecord> {
    inspector
        .list()
        .into_iter()
        .filter(|record| record.pid != own_pid && is_bot_instance(record))
        .collect()
}

/// Whether a command line looks like `kartina run`, with any path prefix
/// and extra flags allowed.
fn is_bot_instance(record: &ProcessRecord) -> bool {
    let Some(argv0) = record.cmdline.first() else {
        return false;
    };
    let name = Path::new(argv0)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(argv0);
    name.contains(BOT_BINARY) && record.cmdline.iter().skip(1).any(|arg| arg == RUN_MARKER)
}

// ── stop ─────────────────────────────────────────────────────────────────────

/// Terminate every running instance: polite signal first, a fixed grace
/// period, then a force kill for whatever survived. A missing instance is
/// not an error; per-process failures are logged and skipped.
pub fn stop(inspector: &mut dyn ProcessInspector) {
    stop_with(inspector, std::process::id(), TERMINATE_GRACE);
}

fn stop_with(inspector: &mut dyn ProcessInspector, own_pid: u32, grace: Duration) {
    let instances = find_with(inspector, own_pid);
    if instances.is_empty() {
        println!("Не найдено запущенных экземпляров бота.");
        return;
    }

    println!("Найдено {} запущенных экземпляров бота.", instances.len());

    for record in &instances {
        println!("Останавливаю процесс с PID {}...", record.pid);
        if !inspector.terminate(record.pid) {
            warn!(pid = record.pid, "termination signal was not delivered");
        }
    }

    std::thread::sleep(grace);

    for record in &instances {
        if inspector.is_running(record.pid) {
            println!(
                "Процесс {} все еще работает. Принудительное завершение...",
                record.pid
            );
            if !inspector.kill(record.pid) {
                warn!(pid = record.pid, "force kill was not delivered");
            }
        }
    }

    println!("Все экземпляры бота остановлены.");
}

// ── start ────────────────────────────────────────────────────────────────────

/// Launch one detached `kartina run` instance with its output appended to
/// the configured log file. When instances are already running, `prompt` is
/// asked for a y/n confirmation to stop them first; declining cancels the
/// start without an error.
pub fn start(
    inspector: &mut dyn ProcessInspector,
    config: &SupervisorConfig,
    prompt: &mut dyn FnMut(&str) -> std::io::Result<String>,
) -> Result<()> {
    start_with(
        inspector,
        std::process::id(),
        TERMINATE_GRACE,
        Path::new(&config.log_file),
        prompt,
        &mut spawn_detached,
    )
}

fn start_with(
    inspector: &mut dyn ProcessInspector,
    own_pid: u32,
    grace: Duration,
    log_file: &Path,
    prompt: &mut dyn FnMut(&str) -> std::io::Result<String>,
    spawn: &mut dyn FnMut(&Path) -> Result<u32>,
) -> Result<()> {
    let instances = find_with(inspector, own_pid);
    if !instances.is_empty() {
        println!("Обнаружено {} запущенных экземпляров бота.", instances.len());
        let choice = prompt("Остановить существующие экземпляры и запустить новый? (y/n): ")?;
        if choice.trim().eq_ignore_ascii_case("y") {
            stop_with(inspector, own_pid, grace);
        } else {
            println!("Запуск отменен.");
            return Ok(());
        }
    }

    let pid = spawn(log_file)?;
    println!(
        "Бот запущен с PID {pid}. Вывод перенаправлен в {}",
        log_file.display()
    );
    Ok(())
}

/// Spawn `kartina run` in its own process group so it survives the
/// supervisor's terminal going away. Stdout and stderr are appended to
/// `log_file`.
fn spawn_detached(log_file: &Path) -> Result<u32> {
    let exe = std::env::current_exe().context("resolving the bot executable path")?;
    let log = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file.display()))?;
    let errors = log.try_clone().context("duplicating the log file handle")?;

    let mut command = std::process::Command::new(exe);
    command
        .arg(RUN_MARKER)
        .stdin(std::process::Stdio::null())
        .stdout(log)
        .stderr(errors);
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().context("spawning the bot process")?;
    Ok(child.id())
}

// ── status ───────────────────────────────────────────────────────────────────

/// Report pid, start time, CPU and memory usage for every running instance.
pub fn status(inspector: &mut dyn ProcessInspector) {
    status_with(inspector, std::process::id());
}

fn status_with(inspector: &mut dyn ProcessInspector, own_pid: u32) {
    let instances = find_with(inspector, own_pid);
    if instances.is_empty() {
        println!("Не найдено запущенных экземпляров бота.");
        return;
    }

    println!("Найдено {} запущенных экземпляров бота:", instances.len());
    for (index, record) in instances.iter().enumerate() {
        println!("Экземпляр {}:", index + 1);
        println!("  PID: {}", record.pid);
        println!("  Время запуска: {}", format_start_time(record.started_at));
        println!("  Использование CPU: {:.1}%", record.cpu_percent);
        println!("  Использование памяти: {:.2}%", record.memory_percent);
    }
}

fn format_start_time(epoch_secs: u64) -> String {
    Local
        .timestamp_opt(epoch_secs as i64, 0)
        .single()
        .map_or_else(
            || "-".into(),
            |started| started.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}
