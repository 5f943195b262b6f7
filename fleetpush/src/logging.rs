//! Run event log.
//!
//! Dispatch components report status through an [`EventLog`] handle handed
//! to them at construction. The binary builds one at startup (console plus
//! `ssh_executions.log`) and flushes it at shutdown; library users and tests
//! can plug in any [`EventSink`].

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::Level;

/// Destination for run events. Implementations must accept concurrent calls
/// and write each event as one unbroken line.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn record(&self, level: Level, message: &str);

    /// Flush buffered events.
    fn flush(&self) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default)]
pub struct FacadeSink;

impl EventSink for FacadeSink {
    fn record(&self, level: Level, message: &str) {
        log::log!(target: "fleetpush::run", level, "{}", message);
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

/// Appends `<timestamp> - <LEVEL> - <message>` lines to a file.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl FileSink {
    /// Open (append) the log file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileSink {
    fn record(&self, level: Level, message: &str) {
        let line = format!(
            "{} - {} - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level,
            message
        );
        // A poisoned lock only means another writer panicked mid-call; the
        // file itself is still usable.
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.write_all(line.as_bytes()) {
            log::warn!("Failed to write run log {}: {}", self.path.display(), e);
        }
    }

    fn flush(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}

/// Fans events out to several sinks.
struct Tee(Vec<Arc<dyn EventSink>>);

impl EventSink for Tee {
    fn record(&self, level: Level, message: &str) {
        for sink in &self.0 {
            sink.record(level, message);
        }
    }

    fn flush(&self) {
        for sink in &self.0 {
            sink.flush();
        }
    }
}

/// Cloneable handle to the run's event sink.
#[derive(Clone)]
pub struct EventLog {
    sink: Arc<dyn EventSink>,
}

impl EventLog {
    pub fn new(sink: impl EventSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Log through the `log` facade only.
    pub fn facade() -> Self {
        Self::new(FacadeSink)
    }

    /// Log to the console facade and to `path`.
    pub fn with_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let console: Arc<dyn EventSink> = Arc::new(FacadeSink);
        let file: Arc<dyn EventSink> = Arc::new(FileSink::open(path)?);
        Ok(Self::tee(vec![console, file]))
    }

    /// Combine several sinks into one handle.
    pub fn tee(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self {
            sink: Arc::new(Tee(sinks)),
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.sink.record(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.sink.record(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.sink.record(Level::Error, message.as_ref());
    }

    pub fn flush(&self) {
        self.sink.flush();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::facade()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Collects events in memory.
    #[derive(Default)]
    pub struct MemorySink(pub Mutex<Vec<(Level, String)>>);

    impl EventSink for MemorySink {
        fn record(&self, level: Level, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    impl MemorySink {
        pub fn contains(&self, level: Level, needle: &str) -> bool {
            self.0
                .lock()
                .unwrap()
                .iter()
                .any(|(l, m)| *l == level && m.contains(needle))
        }
    }

    pub fn memory_log() -> (EventLog, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        (EventLog::tee(vec![sink.clone() as Arc<dyn EventSink>]), sink)
    }
}
