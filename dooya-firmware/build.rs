//! Build script for dooya-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates cover.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate cover.toml at compile time
///
/// The firmware parses the same file at boot; catching mistakes here keeps
/// a bad address or typo from shipping silently with defaults.
fn validate_config() {
    println!("cargo:rerun-if-changed=cover.toml");

    let config_path = Path::new("cover.toml");

    if !config_path.exists() {
        fail(
            "cover.toml not found!",
            &["The firmware requires a cover.toml configuration file".to_string()],
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read cover.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in cover.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_cover(&config, &mut errors);
    validate_uart(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in cover.toml", &errors);
    }

    println!("cargo:warning=cover.toml validated successfully");
}

/// Validate the [cover] section
fn validate_cover(config: &toml::Value, errors: &mut Vec<String>) {
    let cover = match config.get("cover") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[cover] must be a table".to_string());
            return;
        }
        None => {
            errors.push("Missing [cover] section".to_string());
            return;
        }
    };

    match cover.get("address") {
        Some(toml::Value::Integer(addr)) if (0..=0xFFFF).contains(addr) => {}
        Some(_) => errors.push("[cover] address must be 0x0000-0xFFFF".to_string()),
        None => errors.push("[cover] missing 'address'".to_string()),
    }

    if let Some(value) = cover.get("poll_interval_ms") {
        match value {
            toml::Value::Integer(ms) if *ms > 0 && *ms <= u32::MAX as i64 => {}
            _ => errors.push("[cover] poll_interval_ms must be a positive integer".to_string()),
        }
    }

    for key in ["position_refresh_polls", "stale_after_polls"] {
        if let Some(value) = cover.get(key) {
            match value {
                toml::Value::Integer(n) if (0..=255).contains(n) => {}
                _ => errors.push(format!("[cover] {} must be 0-255", key)),
            }
        }
    }

    if let Some(value) = cover.get("unknown_position") {
        match value.as_str() {
            Some("midpoint") | Some("keep") => {}
            _ => errors.push("[cover] unknown_position must be 'midpoint' or 'keep'".to_string()),
        }
    }

    for key in cover.keys() {
        if ![
            "address",
            "poll_interval_ms",
            "position_refresh_polls",
            "stale_after_polls",
            "unknown_position",
        ]
        .contains(&key.as_str())
        {
            errors.push(format!("[cover] unknown key '{}'", key));
        }
    }
}

/// Validate the optional [uart] section
fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    let uart = match config.get("uart") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[uart] must be a table".to_string());
            return;
        }
        None => return,
    };

    if let Some(value) = uart.get("baudrate") {
        match value {
            toml::Value::Integer(baud) if (1200..=115_200).contains(baud) => {}
            _ => errors.push("[uart] baudrate must be 1200-115200".to_string()),
        }
    }

    if let Some(value) = uart.get("parity") {
        match value.as_str() {
            Some("none") | Some("even") | Some("odd") => {}
            _ => errors.push("[uart] parity must be 'none', 'even', or 'odd'".to_string()),
        }
    }

    if let Some(value) = uart.get("stop_bits") {
        match value {
            toml::Value::Integer(1) | toml::Value::Integer(2) => {}
            _ => errors.push("[uart] stop_bits must be 1 or 2".to_string()),
        }
    }
}

/// Abort the build with a boxed error report
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
