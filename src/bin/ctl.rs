//! Tabshare control CLI - the user-facing control surface
//!
//! Thin synchronous client for the daemon's control socket: triggers shares,
//! toggles auto-share, and renders status including the last share time.

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabshare::prefs::{PrefStore, Preferences};
use tabshare::timefmt;
use tabshare::Config;

const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

fn print_help() {
    println!(
        r#"Tabshare control - talk to the tabshare daemon

USAGE:
    tabshare-ctl [--socket <PATH>] <COMMAND>

COMMANDS:
    status        Show auto-share mode and the last share time
    share         Share all open tabs now
    auto on|off   Enable or disable automatic sharing
    peek          Show a summary of the foreground tab

OPTIONS:
    -h, --help      Show this help message
    --socket <PATH> Control socket path (default: from config)
"#
    );
}

/// Send one request line and read one response line.
fn send_request(socket_path: &Path, request: &serde_json::Value) -> io::Result<serde_json::Value> {
    let mut stream = UnixStream::connect(socket_path)?;
    stream.set_read_timeout(Some(SOCKET_TIMEOUT))?;
    stream.set_write_timeout(Some(SOCKET_TIMEOUT))?;

    let body = serde_json::to_string(request)?;
    stream.write_all(body.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    serde_json::from_str(&line)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

fn show_status(socket_path: &Path) -> io::Result<()> {
    let response = send_request(socket_path, &serde_json::json!({ "action": "getAutoShareStatus" }))?;
    let enabled = response["autoShareEnabled"].as_bool().unwrap_or(false);

    println!("Auto-share: {}", if enabled { "enabled" } else { "disabled" });
    if enabled {
        println!("The assistant automatically receives content from your open tabs.");
    } else {
        println!("Run `tabshare-ctl share` to share tabs, or `tabshare-ctl auto on` to share automatically.");
    }

    // The last share time lives in the preference file, next to the flag
    let prefs = Preferences::load_from_path(&PrefStore::default_path());
    if let Some(when) = prefs.last_shared_time() {
        println!(
            "Last shared: {}",
            timefmt::format_relative(when, chrono::Utc::now())
        );
    }

    Ok(())
}

fn share(socket_path: &Path) -> io::Result<bool> {
    println!("Sharing all tabs...");
    let response = send_request(socket_path, &serde_json::json!({ "action": "shareAllTabs" }))?;

    let success = response["success"].as_bool().unwrap_or(false);
    let message = response["message"].as_str().unwrap_or("no response");
    if success {
        println!("{}", message);
    } else {
        eprintln!("{}", message);
    }

    Ok(success)
}

fn set_auto_share(socket_path: &Path, enabled: bool) -> io::Result<()> {
    let response = send_request(
        socket_path,
        &serde_json::json!({ "action": "setAutoShare", "enabled": enabled }),
    )?;

    let enabled = response["autoShareEnabled"].as_bool().unwrap_or(enabled);
    if enabled {
        println!("Auto-sharing enabled. Open tabs are shared on navigation and tab switches.");
        println!("Manual sharing is unnecessary while auto-share is on.");
    } else {
        println!("Auto-sharing disabled.");
    }

    Ok(())
}

fn peek(socket_path: &Path) -> io::Result<bool> {
    let response = send_request(socket_path, &serde_json::json!({ "action": "getPageInfo" }))?;

    if let Some(message) = response["message"].as_str() {
        eprintln!("{}", message);
        return Ok(false);
    }

    println!("{}", response["title"].as_str().unwrap_or("(untitled)"));
    println!("{}", response["url"].as_str().unwrap_or(""));
    let text = response["textContent"].as_str().unwrap_or("");
    if !text.is_empty() {
        println!();
        println!("{}", text);
    }

    Ok(true)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut socket_path: Option<PathBuf> = None;
    let mut command: Vec<&str> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return;
            }
            "--socket" => {
                i += 1;
                if i < args.len() {
                    socket_path = Some(PathBuf::from(&args[i]));
                }
            }
            arg => command.push(arg),
        }
        i += 1;
    }

    let socket_path = socket_path.unwrap_or_else(|| Config::load().general.socket_path);

    let result = match command.as_slice() {
        ["status"] => show_status(&socket_path).map(|_| true),
        ["share"] => share(&socket_path),
        ["auto", "on"] => set_auto_share(&socket_path, true).map(|_| true),
        ["auto", "off"] => set_auto_share(&socket_path, false).map(|_| true),
        ["peek"] => peek(&socket_path),
        [] => {
            print_help();
            return;
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!("Use --help for usage information.");
            std::process::exit(1);
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Cannot reach the tabshare daemon at {:?}: {}", socket_path, e);
            eprintln!("Is tabshared running?");
            std::process::exit(1);
        }
    }
}
