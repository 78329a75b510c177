//! Message bridge daemon - CLI entry point
//!
//! Subcommands manage the daemon lifecycle; the hidden `run` subcommand
//! is the daemon itself, launched by `start` with output redirected to
//! the log file.

use clap::{Parser, Subcommand};
use message_bridge_rs::config::Config;
use message_bridge_rs::scheduler::Scheduler;
use message_bridge_rs::server::{self, AppState};
use message_bridge_rs::store::ScheduleStore;
use message_bridge_rs::transport::{HttpGateway, MessageTransport};
use message_bridge_rs::Result;
use std::fs;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Message bridge - authenticated send API with scheduled delivery
#[derive(Parser)]
#[command(name = "message-bridge-rs")]
#[command(about = "Manage the message bridge daemon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start,

    /// Stop the daemon
    Stop,

    /// Restart the daemon
    Restart,

    /// Show daemon status
    Status,

    /// Tail the log file
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: u32,

        /// Don't follow the log
        #[arg(long = "no-follow")]
        no_follow: bool,
    },

    /// Run the daemon (internal)
    #[command(hide = true)]
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::default();

    match cli.command {
        Commands::Start => cmd_start(&config),
        Commands::Stop => cmd_stop(&config),
        Commands::Restart => cmd_restart(&config),
        Commands::Status => cmd_status(&config),
        Commands::Logs { lines, no_follow } => cmd_logs(&config, lines, !no_follow),
        Commands::Run => cmd_run(config).await,
    }
}

// ============================================================================
// CLI Commands
// ============================================================================

fn get_pid(config: &Config) -> Option<u32> {
    let pid_file = config.state_dir.join("daemon.pid");
    if !pid_file.exists() {
        return None;
    }

    let content = fs::read_to_string(&pid_file).ok()?;
    let pid: u32 = content.trim().parse().ok()?;

    // Check if process is running
    let status = Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status();

    if status.map(|s| s.success()).unwrap_or(false) {
        Some(pid)
    } else {
        // PID file exists but process is dead
        let _ = fs::remove_file(&pid_file);
        None
    }
}

fn is_running(config: &Config) -> bool {
    get_pid(config).is_some()
}

fn cmd_start(config: &Config) -> Result<()> {
    if let Some(pid) = get_pid(config) {
        println!("Daemon already running (PID {})", pid);
        return Ok(());
    }

    // Ensure directories exist
    fs::create_dir_all(&config.state_dir)?;
    fs::create_dir_all(&config.logs_dir)?;

    let log_file = config.logs_dir.join("bridge.log");
    let log = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    // Get current executable path
    let exe = std::env::current_exe()?;

    // Start the daemon
    let child = Command::new(&exe)
        .arg("run")
        .stdout(Stdio::from(log.try_clone()?))
        .stderr(Stdio::from(log))
        .spawn()?;

    // Write PID file
    let pid_file = config.state_dir.join("daemon.pid");
    fs::write(&pid_file, child.id().to_string())?;

    println!("Daemon started (PID {})", child.id());
    println!("Logs: {}", log_file.display());

    Ok(())
}

fn cmd_stop(config: &Config) -> Result<()> {
    let pid = match get_pid(config) {
        Some(p) => p,
        None => {
            println!("Daemon not running");
            return Ok(());
        }
    };

    println!("Stopping daemon (PID {})...", pid);

    // Send SIGTERM
    let _ = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status();

    // Wait for it to die
    for _ in 0..10 {
        std::thread::sleep(Duration::from_millis(500));
        let status = Command::new("kill")
            .args(["-0", &pid.to_string()])
            .status();
        if !status.map(|s| s.success()).unwrap_or(false) {
            break;
        }
    }

    // Force kill if still running
    let status = Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status();
    if status.map(|s| s.success()).unwrap_or(false) {
        println!("Force killing...");
        let _ = Command::new("kill")
            .args(["-KILL", &pid.to_string()])
            .status();
    }

    let pid_file = config.state_dir.join("daemon.pid");
    let _ = fs::remove_file(&pid_file);

    println!("Daemon stopped");
    Ok(())
}

fn cmd_restart(config: &Config) -> Result<()> {
    if is_running(config) {
        cmd_stop(config)?;
        std::thread::sleep(Duration::from_secs(1));
    }
    cmd_start(config)
}

fn cmd_status(config: &Config) -> Result<()> {
    if let Some(pid) = get_pid(config) {
        // Get uptime
        let result = Command::new("ps")
            .args(["-p", &pid.to_string(), "-o", "etime="])
            .output();

        if let Ok(output) = result {
            let uptime = String::from_utf8_lossy(&output.stdout);
            println!("Daemon running (PID {}, uptime {})", pid, uptime.trim());
        } else {
            println!("Daemon running (PID {})", pid);
        }

        println!("Listening on {}", config.listen_addr);
    } else {
        println!("Daemon not running");
    }

    // Show schedule progress
    if let Some((pending, total)) = schedule_summary(config) {
        println!("Schedule: {} of {} entries pending", pending, total);
    }

    Ok(())
}

fn cmd_logs(config: &Config, lines: u32, follow: bool) -> Result<()> {
    let log_file = config.logs_dir.join("bridge.log");
    if !log_file.exists() {
        println!("Log file not found: {}", log_file.display());
        return Ok(());
    }

    let mut cmd = Command::new("tail");
    if follow {
        cmd.arg("-f");
    }
    cmd.args(["-n", &lines.to_string()]);
    cmd.arg(&log_file);

    let _ = cmd.status();
    Ok(())
}

// ============================================================================
// Daemon
// ============================================================================

async fn cmd_run(config: Config) -> Result<()> {
    info!("message bridge starting");

    let bridge = message_bridge_rs::bootstrap(&config)?;

    let transport: Arc<dyn MessageTransport> =
        Arc::new(HttpGateway::new(&config.gateway_url));

    // The scheduler walks its file independently of the HTTP surface
    tokio::spawn(Scheduler::new(bridge.schedule, Arc::clone(&transport)).run());

    let state = AppState {
        auth: Arc::new(bridge.auth),
        transport,
        network_domain: Arc::from(config.network_domain.as_str()),
    };

    server::serve(config.listen_addr, state).await
}

// ============================================================================
// Helper Functions
// ============================================================================

fn schedule_summary(config: &Config) -> Option<(usize, usize)> {
    let mut store = ScheduleStore::new(config);
    store.load().ok()?;
    Some((store.pending(), store.len()))
}
