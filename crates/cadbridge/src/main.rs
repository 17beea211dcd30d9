//! Entry point for `cadbridged`, the command bridge running against the
//! in-memory host.

use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;

use cadbridge::shutdown::{self, ShutdownFlag};
use cadbridge::{
    Bridge, BridgeSettings, EventRelay, InMemoryHost, StructuredBridgeReporter, handlers,
    telemetry,
};
use cadbridge_config::{BridgePaths, Config, ConfigError};
use tracing::{error, info};

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::main");

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(ConfigError::Arguments(error)) => error.exit(),
        Err(config_error) => {
            if telemetry::initialise(&Config::default()).is_ok() {
                error!(target: MAIN_TARGET, error = %config_error, "invalid configuration");
            }
            return ExitCode::FAILURE;
        }
    };
    if telemetry::initialise(&config).is_err() {
        return ExitCode::FAILURE;
    }
    run(&config)
}

fn run(config: &Config) -> ExitCode {
    let paths = match BridgePaths::from_config(config) {
        Ok(paths) => paths,
        Err(paths_error) => {
            error!(target: MAIN_TARGET, error = %paths_error, "cannot prepare bridge directory");
            return ExitCode::FAILURE;
        }
    };

    let host = Rc::new(InMemoryHost::new());
    if let Some(name) = config.open_design.as_deref() {
        let design = host.open_design(name);
        info!(target: MAIN_TARGET, design = %design.name(), "opened design");
    }

    let relay = Rc::new(EventRelay::new());
    let mut bridge = Bridge::new(
        host,
        Rc::clone(&relay),
        paths,
        Rc::new(handlers::registry()),
        BridgeSettings::from_config(config),
        Arc::new(StructuredBridgeReporter::new()),
    );
    // The reporter has already logged the cause.
    if bridge.start().is_err() {
        bridge.stop();
        return ExitCode::FAILURE;
    }

    let flag = ShutdownFlag::new();
    if let Err(signal_error) = shutdown::listen(flag.clone()) {
        error!(target: MAIN_TARGET, error = %signal_error, "cannot watch for shutdown signals");
        bridge.stop();
        return ExitCode::FAILURE;
    }

    let delivered = relay.run_until(flag.as_atomic());
    info!(target: MAIN_TARGET, delivered, "host event loop finished");
    bridge.stop();
    relay.shutdown();
    ExitCode::SUCCESS
}
