//! log4rs setup: a rolling `app.log` for everything and a rolling `audit.log`
//! for store writes (target [`AUDIT_TARGET`]).

use crate::config::OdmConfig;
use crate::errors::OdmError;
use log::LevelFilter;
use log4rs::Handle;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

pub const AUDIT_TARGET: &str = "odm_lite::audit";

const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_RETENTION: u32 = 7;
const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";

// Later calls swap the config of the installed logger instead of failing.
static HANDLE: Mutex<Option<Handle>> = Mutex::new(None);

fn config_err(e: impl std::fmt::Display) -> OdmError {
    OdmError::Configuration(format!("logging: {e}"))
}

/// `error|warn|info|debug|trace|off`; anything else is `info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, OdmError> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)
        .map_err(config_err)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))
        .map_err(|e| OdmError::Io(format!("opening {stem}.log in {}: {e}", base.display())))
}

/// Route logging to `dir` (current directory when `None`), keeping `retention` rolled files per log.
///
/// # Errors
/// `Io` if the directory or files cannot be created, `Configuration` if log4rs rejects the setup.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>, retention: Option<usize>) -> Result<(), OdmError> {
    let base = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&base).map_err(|e| OdmError::Io(format!("creating {}: {e}", base.display())))?;
    let keep = retention.map_or(DEFAULT_RETENTION, |r| u32::try_from(r.max(1)).unwrap_or(u32::MAX));
    let lvl = parse_level(level);

    let config = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(&base, "audit", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, lvl))
        .build(Root::builder().appender("app").build(lvl))
        .map_err(config_err)?;
    install(config)
}

/// Configure from `ODM_LOG_DIR`, `ODM_LOG_LEVEL` and `ODM_LOG_RETENTION`.
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), OdmError> {
    let dir = std::env::var("ODM_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("ODM_LOG_LEVEL").ok();
    let retention = std::env::var("ODM_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    configure_logging(dir.as_deref(), level.as_deref(), retention)
}

/// Configure from the logging settings of a resolved [`OdmConfig`].
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from(config: &OdmConfig) -> Result<(), OdmError> {
    configure_logging(config.log_dir.as_deref(), config.log_level.as_deref(), None)
}

/// Load a log4rs YAML configuration file. Has to be the first logging setup of the process.
///
/// # Errors
/// `Configuration` if the file cannot be read or parsed, or a logger is already installed.
pub fn init_file(path: &Path) -> Result<(), OdmError> {
    if HANDLE.lock().is_some() {
        return Err(config_err("already configured programmatically"));
    }
    log4rs::init_file(path, log4rs::config::Deserializers::default()).map_err(config_err)
}

fn install(config: Config) -> Result<(), OdmError> {
    let mut handle = HANDLE.lock();
    match handle.as_ref() {
        Some(h) => h.set_config(config),
        None => *handle = Some(log4rs::init_config(config).map_err(config_err)?),
    }
    Ok(())
}
