//! Decoupled logging pipeline for the pre-build steps.
//!
//! ```text
//! log::info!() / warn!() ...
//!     |
//! [LogCollector] (log::Log impl, non-blocking send)
//!     | (crossbeam channel)
//!     v
//! [writer thread] --> stderr
//!                 \-> optional log file (append)
//! ```
//!
//! stdout is never written here: `pio-prebuild flags` prints its flags there
//! and PlatformIO reads them back.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker with channel sender to signal completion
    Flush(std::sync::mpsc::Sender<()>),
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    /// Wall-clock time the line was recorded (`HH:MM:SS.mmm`)
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    /// Console rendering: the message, prefixed only for warnings and errors.
    pub fn console_format(&self) -> String {
        match self.level {
            Level::Error => format!("ERROR: {}", self.message),
            Level::Warn => format!("WARNING: {}", self.message),
            _ => self.message.clone(),
        }
    }

    /// Log file rendering: timestamped and levelled.
    pub fn file_format(&self) -> String {
        format!("[{}] [{:<5}] {}", self.timestamp, self.level, self.message)
    }
}

/// Logger that hands lines to a background writer thread.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    level: LevelFilter,
}

impl LogCollector {
    /// Log to stderr and, when given, append to `log_file`.
    pub fn new(log_file: Option<PathBuf>, level: LevelFilter) -> Result<Self, String> {
        Self::with_console(io::stderr(), log_file, level)
    }

    /// Log to an arbitrary console writer and, when given, append to `log_file`.
    pub fn with_console<W>(console: W, log_file: Option<PathBuf>, level: LevelFilter) -> Result<Self, String>
    where
        W: Write + Send + 'static,
    {
        let mut file = match log_file {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| format!("Failed to create log directory: {}", e))?;
                    }
                }
                let handle = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path.display(), e))?;
                Some(handle)
            }
            None => None,
        };

        let (tx, rx) = unbounded::<LogMessage>();
        let mut console = console;

        std::thread::spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let _ = writeln!(console, "{}", line.console_format());
                        if let Some(f) = file.as_mut() {
                            let _ = writeln!(f, "{}", line.file_format());
                        }
                    }
                    LogMessage::Flush(done) => {
                        let _ = console.flush();
                        if let Some(f) = file.as_mut() {
                            let _ = f.flush();
                        }
                        let _ = done.send(());
                    }
                }
            }
        });

        Ok(LogCollector { tx, level })
    }

    /// Register as the global `log` backend.
    pub fn install(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(self.level);
        Ok(())
    }

    pub fn send(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Block until every line sent so far has been written.
    pub fn wait_for_empty(&self) -> Result<(), String> {
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        self.tx
            .send(LogMessage::Flush(done_tx))
            .map_err(|_| "Log writer thread is gone".to_string())?;
        done_rx
            .recv()
            .map_err(|_| "Log writer thread stopped before flushing".to_string())
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.send(LogLine::new(record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {
        let _ = self.wait_for_empty();
    }
}
