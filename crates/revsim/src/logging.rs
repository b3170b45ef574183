use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// File name of the log inside `--log-dir`
pub const LOG_FILE_NAME: &str = "revsim.log";
const TRIM_MARKER: &[u8] = b"--- Log rotated (older entries removed) ---\n";

/// How large the log may grow and how much survives a trim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Retention {
    max_bytes: u64,
    keep_bytes: u64,
}

/// 5 MB cap, trimmed to the most recent 1 MB
const RETENTION: Retention = Retention {
    max_bytes: 5 * 1024 * 1024,
    keep_bytes: 1024 * 1024,
};

impl Retention {
    /// Trim `path` to its newest whole lines once it outgrows `max_bytes`.
    /// Returns whether the file was trimmed.
    fn enforce(&self, path: &Path) -> io::Result<bool> {
        let len = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if len <= self.max_bytes {
            return Ok(false);
        }

        let content = fs::read(path)?;
        let cut = content.len().saturating_sub(self.keep_bytes as usize);
        let tail = &content[cut..];
        // Drop the partial line at the cut
        let tail = tail
            .iter()
            .position(|&b| b == b'\n')
            .map_or(tail, |i| &tail[i + 1..]);

        let mut trimmed = Vec::with_capacity(TRIM_MARKER.len() + tail.len());
        trimmed.extend_from_slice(TRIM_MARKER);
        trimmed.extend_from_slice(tail);
        fs::write(path, trimmed)?;
        Ok(true)
    }
}

/// Create `log_dir`, apply retention and open the log for appending
fn open_log_file(log_dir: &Path, retention: Retention) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(LOG_FILE_NAME);

    if let Err(e) = retention.enforce(&log_path) {
        eprintln!("Warning: Failed to rotate log file: {e}");
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    Ok((log_path, file))
}

fn env_filter(level: &str) -> EnvFilter {
    let default_filter = format!("revsim={level},revsim_core={level}");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize logging.
///
/// Without `log_dir`, logs go to stderr so stdout stays clean for JSON
/// output. With `log_dir`, logs are appended to `{log_dir}/revsim.log`; once
/// that file exceeds 5MB it is trimmed to its most recent 1MB. `RUST_LOG`
/// takes precedence over `level`.
///
/// Returns the log file path when logging to a file.
pub fn init_logging(log_dir: Option<&Path>, level: &str) -> color_eyre::Result<Option<PathBuf>> {
    let env_filter = env_filter(level);

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()?;
        return Ok(None);
    };

    let (log_path, file) = open_log_file(log_dir, RETENTION)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false),
        )
        .try_init()?;

    tracing::info!(log_path = %log_path.display(), "revsim logging initialized");
    Ok(Some(log_path))
}
