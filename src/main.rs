// Network Manager - Dispatcher Command-Line Tool
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # nm-dispatch
//!
//! Sends one dispatcher action for an interface, as the daemon would.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use nm_dispatch::models::{DeviceInfo, DeviceSnapshot};
use nm_dispatch::network_utils;
use nm_dispatch::services::DispatchCallback;
use nm_dispatch::{
    init_monitor, DispatchCompletion, Dispatcher, DispatcherAction, DispatcherConfig, Error,
    Result, Transport, ZbusTransport, VERSION,
};
use tokio::sync::oneshot;
use tokio::task::LocalSet;

/// Human-readable program name.
const APP_NAME: &str = "nm-dispatch";

/// Print version information and exit.
fn print_version() {
    println!("{} {}", APP_NAME, VERSION);
    println!("Copyright (C) 2026 Christos A. Daggas");
    println!("License: MIT");
}

/// Print help information and exit.
fn print_help() {
    println!(
        "Usage: {} [OPTIONS] ACTION [INTERFACE]",
        env::args().next().unwrap_or_else(|| APP_NAME.to_string())
    );
    println!();
    println!("Announce a network action to the installed dispatcher scripts.");
    println!();
    println!("Actions:");
    println!("  hostname, pre-up, up, pre-down, down, dhcp4-change, dhcp6-change");
    println!();
    println!("Options:");
    println!("  -h, --help           Show this help message and exit");
    println!("  -v, --version        Show version information and exit");
    println!("  -d, --debug          Enable debug logging");
    println!("  -s, --sync           Block until the scripts have run");
    println!("  -l, --list           List network interfaces and exit");
    println!("  -c, --config PATH    Read configuration from PATH");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG             Set log level (trace, debug, info, warn, error)");
}

/// Parsed command line.
#[derive(Debug, Default)]
struct Options {
    debug: bool,
    sync: bool,
    list: bool,
    config: Option<PathBuf>,
    action: Option<DispatcherAction>,
    interface: Option<String>,
}

enum Parsed {
    Run(Options),
    Exit(ExitCode),
}

fn parse_args(args: &[String]) -> Result<Parsed> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            "-v" | "--version" => {
                print_version();
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            "-d" | "--debug" => options.debug = true,
            "-s" | "--sync" => options.sync = true,
            "-l" | "--list" => options.list = true,
            "-c" | "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| Error::InvalidArgument(format!("{} needs a path", arg)))?;
                options.config = Some(PathBuf::from(path));
            }
            _ if arg.starts_with('-') => {
                return Err(Error::InvalidArgument(format!("unknown option: {}", arg)));
            }
            _ if options.action.is_none() => {
                let action: DispatcherAction = arg.parse()?;
                if action.is_vpn() {
                    return Err(Error::InvalidArgument(format!(
                        "'{}' can only be sent by the VPN service",
                        action
                    )));
                }
                options.action = Some(action);
            }
            _ if options.interface.is_none() => options.interface = Some(arg.clone()),
            _ => {
                return Err(Error::InvalidArgument(format!("unexpected argument: {}", arg)));
            }
        }
    }

    if options.list {
        if options.action.is_some() {
            return Err(Error::InvalidArgument("--list takes no ACTION".to_string()));
        }
        return Ok(Parsed::Run(options));
    }

    let action = options
        .action
        .ok_or_else(|| Error::InvalidArgument("missing ACTION".to_string()))?;
    if action.requires_device() && options.interface.is_none() {
        return Err(Error::InvalidArgument(format!("'{}' needs an INTERFACE", action)));
    }
    Ok(Parsed::Run(options))
}

/// Level for the default log directive: `--debug` wins over the config.
fn log_level(debug: bool, config: &DispatcherConfig) -> Result<tracing::Level> {
    if debug {
        return Ok(tracing::Level::DEBUG);
    }
    config
        .log_level
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("invalid log_level '{}'", config.log_level)))
}

/// One line per interface under `root`: name, device type and state.
fn interface_lines(root: &Path) -> Vec<String> {
    network_utils::list_interfaces(root)
        .into_iter()
        .filter_map(|name| match network_utils::device_snapshot_in(root, &name) {
            Ok(device) => {
                let kind = format!("{:?}", device.device_type);
                Some(format!("{:<16} {:<10} {:?}", name, kind, device.state))
            }
            Err(e) => {
                tracing::warn!("Skipping interface {}: {}", name, e);
                None
            }
        })
        .collect()
}

async fn run(options: Options, config: DispatcherConfig) -> Result<DispatchCompletion> {
    let action = options
        .action
        .ok_or_else(|| Error::InvalidArgument("missing ACTION".to_string()))?;
    let device: Option<DeviceSnapshot> = options
        .interface
        .as_deref()
        .map(network_utils::device_snapshot)
        .transpose()?;

    let monitor = init_monitor(&config)?;
    let transport: Rc<dyn Transport> = Rc::new(ZbusTransport::connect_system(&config)?);
    let dispatcher = Dispatcher::new(Rc::clone(&monitor), transport);
    let device_ref = device.as_ref().map(|d| d as &dyn DeviceInfo);

    let completion = if options.sync {
        dispatcher.dispatch_sync(action, None, device_ref)?
    } else {
        let (tx, rx) = oneshot::channel();
        let callback: DispatchCallback = Box::new(move |id, completion| {
            tracing::debug!("Dispatcher request {} finished", id);
            let _ = tx.send(completion);
        });
        dispatcher.dispatch(action, None, device_ref, Some(callback))?;
        rx.await
            .map_err(|_| Error::Internal("dispatch completion was dropped".to_string()))?
    };

    monitor.shutdown();
    Ok(completion)
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Parsed::Run(options)) => options,
        Ok(Parsed::Exit(code)) => return code,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            eprintln!("Try '--help' for more information.");
            return ExitCode::FAILURE;
        }
    };

    let config = match DispatcherConfig::load(options.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging with appropriate level
    let log_level = match log_level(options.debug, &config) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}: {}", APP_NAME, e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    tracing::debug!("Starting {} v{}", APP_NAME, VERSION);

    if options.list {
        for line in interface_lines(Path::new(network_utils::SYSFS_NET)) {
            println!("{}", line);
        }
        return ExitCode::SUCCESS;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}: failed to start runtime: {}", APP_NAME, e);
            return ExitCode::FAILURE;
        }
    };

    let local = LocalSet::new();
    match local.block_on(&runtime, run(options, config)) {
        Ok(DispatchCompletion::Failed(reason)) => {
            tracing::error!("Dispatch failed: {}", reason);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_action_and_interface() {
        let Ok(Parsed::Run(options)) = parse_args(&args(&["-s", "up", "eth0"])) else {
            panic!("expected options");
        };
        assert!(options.sync);
        assert_eq!(options.action, Some(DispatcherAction::Up));
        assert_eq!(options.interface.as_deref(), Some("eth0"));
    }

    #[test]
    fn test_hostname_needs_no_interface() {
        assert!(matches!(
            parse_args(&args(&["hostname"])),
            Ok(Parsed::Run(_))
        ));
        assert!(parse_args(&args(&["down"])).is_err());
    }

    #[test]
    fn test_rejects_vpn_and_unknown_input() {
        assert!(parse_args(&args(&["vpn-up", "tun0"])).is_err());
        assert!(parse_args(&args(&["sideways", "eth0"])).is_err());
        assert!(parse_args(&args(&["--frobnicate", "up", "eth0"])).is_err());
        assert!(parse_args(&args(&["up", "eth0", "extra"])).is_err());
        assert!(parse_args(&args(&["-c"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }

    #[test]
    fn test_config_path() {
        let Ok(Parsed::Run(options)) =
            parse_args(&args(&["--config", "/tmp/nm.toml", "hostname"]))
        else {
            panic!("expected options");
        };
        assert_eq!(options.config, Some(PathBuf::from("/tmp/nm.toml")));
    }

    #[test]
    fn test_list_needs_no_action() {
        let Ok(Parsed::Run(options)) = parse_args(&args(&["--list"])) else {
            panic!("expected options");
        };
        assert!(options.list);
        assert!(parse_args(&args(&["-l", "up", "eth0"])).is_err());
    }

    #[test]
    fn test_log_level_from_config() {
        let mut config = DispatcherConfig::default();
        assert_eq!(log_level(false, &config).unwrap(), tracing::Level::INFO);

        config.log_level = "warn".to_string();
        assert_eq!(log_level(false, &config).unwrap(), tracing::Level::WARN);
        assert_eq!(log_level(true, &config).unwrap(), tracing::Level::DEBUG);

        config.log_level = "loud".to_string();
        assert!(log_level(false, &config).is_err());
    }

    #[test]
    fn test_interface_lines() {
        let root = tempfile::tempdir().unwrap();
        for (name, kind) in [("eth10", "1"), ("lo", "772"), ("eth2", "1")] {
            let path = root.path().join(name);
            std::fs::create_dir(&path).unwrap();
            std::fs::write(path.join("type"), kind).unwrap();
            std::fs::write(path.join("operstate"), "up").unwrap();
        }

        let lines = interface_lines(root.path());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("eth2 "));
        assert!(lines[1].starts_with("eth10 "));
        assert!(lines[1].contains("Ethernet"));
        assert!(lines[1].ends_with("Activated"));
    }
}
