//! Subscriber with the JSONL file layer.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::json_layer::JsonLayer;
use crate::LogConfig;

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".highpoint/logs/dev.jsonl"))
}

/// Shared append handle on the log file. Each clone writes through the same
/// line-buffered file, so lines from concurrent events never interleave.
#[derive(Clone)]
pub struct AppendFile(Arc<Mutex<LineWriter<File>>>);

impl AppendFile {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self(Arc::new(Mutex::new(LineWriter::new(file)))))
    }
}

impl Write for AppendFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for AppendFile {
    type Writer = AppendFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// A log file that cannot be opened costs the JSONL layer, not the process.
pub fn init_dev_subscriber(config: &LogConfig) {
    let path = config.log_path.clone().or_else(default_log_path);

    let file_layer = path.as_deref().and_then(|path| match AppendFile::open(path) {
        Ok(file) => Some(
            JsonLayer::new(config.service_name.clone(), file)
                .with_filter(filter(&config.default_level)),
        ),
        Err(e) => {
            eprintln!("observability: cannot open {}: {e}", path.display());
            None
        }
    });

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(service = %config.service_name, log_path = ?path, "logging ready");
    }
}
