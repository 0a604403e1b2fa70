//! Run command — the host loop.
//!
//! Loads the watched directory once, then multiplexes two inputs on a
//! single task: a periodic tick that applies archive changes, and an
//! operator console on stdin exposing the registry's id-keyed and bulk
//! operations. One task owns the registry, so the synchronous extension
//! core needs no locks.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use exthost::extensions::{ExtensionRegistry, UpdateReport};
use exthost::Config;

/// Parse interval string like "1h", "30m", "15m", "60s" into seconds.
pub fn parse_interval(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();
    if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().with_context(|| "Invalid hours value")?;
        Ok(n * 3600)
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().with_context(|| "Invalid minutes value")?;
        Ok(n * 60)
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().with_context(|| "Invalid seconds value")?;
        Ok(n)
    } else {
        s.parse::<u64>()
            .with_context(|| "Invalid interval. Use formats like 1h, 30m, or 60s")
    }
}

pub(crate) async fn cmd_run(
    dir: Option<PathBuf>,
    interval: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let dir = dir.unwrap_or_else(|| config.extensions_dir());
    let interval_secs = match interval {
        Some(s) => parse_interval(&s)?,
        None => config.update_interval_secs,
    };

    let mut registry = ExtensionRegistry::native(&dir);
    registry
        .init()
        .with_context(|| format!("Failed to load extensions from {:?}", dir))?;

    println!(
        "ExtHost watching {} ({} extension(s) loaded)",
        dir.display(),
        registry.size()
    );
    println!(
        "Rescanning every {}s. Type 'help' for commands, 'quit' to stop.",
        interval_secs
    );
    println!();

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    // The first tick fires immediately; init already covered it.
    ticker.tick().await;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match registry.update_extensions() {
                    Ok(report) => print_report(&report),
                    Err(e) => eprintln!(
                        "[{}] Update failed: {}",
                        chrono::Local::now().format("%H:%M"),
                        e
                    ),
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_command(&mut registry, line.trim()) {
                            break;
                        }
                    }
                    None => {
                        // EOF
                        println!();
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Print what a periodic update changed; quiet updates stay quiet.
fn print_report(report: &UpdateReport) {
    if report.is_quiet() {
        return;
    }
    println!(
        "[{}] {} loaded, {} reloaded, {} removed",
        chrono::Local::now().format("%H:%M"),
        report.loaded.len(),
        report.reloaded.len(),
        report.removed.len()
    );
}

/// Dispatch one console command. Returns `false` when the host should stop.
fn handle_command(registry: &mut ExtensionRegistry, input: &str) -> bool {
    let (command, arg) = match input.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (input, ""),
    };

    match command {
        "" => {}
        "quit" | "exit" => {
            println!("Goodbye!");
            return false;
        }
        "help" => {
            println!("Commands:");
            println!("  list                 loaded extensions with id and status");
            println!("  size                 number of loaded extensions");
            println!("  update               rescan the directory and apply changes");
            println!("  reload <id>          reload one extension if its archive changed");
            println!("  enable <id>          enable one extension");
            println!("  disable <id>         disable one extension");
            println!("  unload <id>          unload one extension");
            println!("  enable-all           enable every loaded extension");
            println!("  disable-all          disable every loaded extension");
            println!("  quit                 stop the host");
        }
        "list" => {
            if registry.size() == 0 {
                println!("No extensions loaded.");
            }
            for record in registry.extensions() {
                println!("  {}  {:<24} {}", record.id(), record.name(), record.status());
            }
        }
        "size" => println!("{} extension(s) loaded", registry.size()),
        "update" => match registry.update_extensions() {
            Ok(report) if report.is_quiet() => println!("No changes."),
            Ok(report) => print_report(&report),
            Err(e) => eprintln!("Update failed: {}", e),
        },
        "reload" => {
            if let Some(id) = parse_id(arg) {
                match registry.update_extension_by_id(id) {
                    Ok(()) => println!("Done."),
                    Err(e) => eprintln!("Reload failed: {}", e),
                }
            }
        }
        "enable" => {
            if let Some(id) = parse_id(arg) {
                if let Err(e) = registry.enable_by_id(id) {
                    eprintln!("Enable failed: {}", e);
                }
            }
        }
        "disable" => {
            if let Some(id) = parse_id(arg) {
                if let Err(e) = registry.disable_by_id(id) {
                    eprintln!("Disable failed: {}", e);
                }
            }
        }
        "unload" => {
            if let Some(id) = parse_id(arg) {
                registry.unload(id);
                println!("{} extension(s) loaded", registry.size());
            }
        }
        "enable-all" => registry.enable_all(),
        "disable-all" => registry.disable_all(),
        _ => println!("Unknown command '{}'. Type 'help' for commands.", command),
    }

    true
}

fn parse_id(arg: &str) -> Option<Uuid> {
    match Uuid::parse_str(arg) {
        Ok(id) => Some(id),
        Err(_) => {
            eprintln!("Expected an extension id, got '{}'", arg);
            None
        }
    }
}
