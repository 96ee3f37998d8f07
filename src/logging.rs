// Logging
// One timestamped file per session plus a console layer, filtered by RUST_LOG

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub const LOG_PREFIX: &str = "voxpopuli_";
pub const LOGS_TO_KEEP: usize = 30;

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub file_log: bool,
    pub cleanup: bool,
    pub dir: PathBuf,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| matches!(lookup(name).as_deref(), Some("1") | Some("true") | Some("TRUE"));
        let dir = lookup("VOXPOPULI_LOG_DIR")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_logs_dir);

        Self {
            file_log: !flag("VOXPOPULI_DISABLE_FILE_LOG"),
            cleanup: !flag("VOXPOPULI_DISABLE_LOG_CLEANUP"),
            dir,
        }
    }
}

fn default_logs_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("logs")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_local_dir()
            .map(|d| d.join("voxpopuli").join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }
}

/// Install the global subscriber. Returns the session log file, if one was opened.
pub fn init(settings: &LogSettings) -> Option<PathBuf> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = if settings.file_log {
        match fs::create_dir_all(&settings.dir) {
            Ok(()) => {
                let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
                Some(settings.dir.join(format!("{}{}.log", LOG_PREFIX, stamp)))
            }
            Err(e) => {
                eprintln!("Failed to create logs directory {}: {}", settings.dir.display(), e);
                None
            }
        }
    } else {
        None
    };

    let file_layer = log_file.as_ref().and_then(|path| {
        let name = path.file_name()?;
        let (writer, guard) = tracing_appender::non_blocking(rolling::never(&settings.dir, name));
        let _ = LOG_GUARD.set(guard);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(cfg!(debug_assertions));

    // Someone else (a test harness) may own the global subscriber already.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    match &log_file {
        Some(path) => {
            info!("=== VoxPopuli Started ===");
            info!(path = %path.display(), version = env!("CARGO_PKG_VERSION"), "logging.file_opened");
            if settings.cleanup {
                let dir = settings.dir.clone();
                std::thread::spawn(move || cleanup_old_logs(&dir, LOGS_TO_KEEP));
            }
        }
        None if !settings.file_log => info!("File logging disabled via VOXPOPULI_DISABLE_FILE_LOG"),
        None => info!("Falling back to console-only logging (log dir not writable)"),
    }

    log_file
}

/// Delete all but the `keep` most recently modified session logs.
pub fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.starts_with(LOG_PREFIX) && name.ends_with(".log")
            })
            .collect(),
        Err(_) => return,
    };

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len() - keep;
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}
