use chrono::Local;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum number of log entries to keep in memory
const MAX_LOG_ENTRIES: usize = 500;

/// A log entry with timestamp and message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S.%3f").to_string(),
            level: level.to_string().to_uppercase(),
            target: target.to_string(),
            message,
        }
    }

    /// Format for display in the log panel
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}] {} [{}] {}",
            self.timestamp, self.level, self.target, self.message
        )
    }
}

/// Thread-safe ring buffer for log entries
#[derive(Clone)]
pub struct LogRingBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl Default for LogRingBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }
}

impl LogRingBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Most recent entries, oldest first
    pub fn recent(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap();
        let skip = entries.len().saturating_sub(count);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split a compact fmt line ("LEVEL target: message") into its parts
fn parse_compact_line(line: &str) -> (Level, &str, &str) {
    let line = line.trim();
    let (level, rest) = match line.split_once(' ') {
        Some(("TRACE", rest)) => (Level::TRACE, rest),
        Some(("DEBUG", rest)) => (Level::DEBUG, rest),
        Some(("INFO", rest)) => (Level::INFO, rest),
        Some(("WARN", rest)) => (Level::WARN, rest),
        Some(("ERROR", rest)) => (Level::ERROR, rest),
        _ => return (Level::INFO, "general", line),
    };

    match rest.split_once(": ") {
        // A target never contains spaces
        Some((target, message)) if !target.contains(' ') => (level, target, message.trim()),
        _ => (level, "general", rest.trim()),
    }
}

/// Writer that feeds the ring buffer and, when open, the log file
#[derive(Clone)]
pub struct TeeWriter {
    buffer: LogRingBuffer,
    file: Arc<Mutex<Option<File>>>,
}

impl TeeWriter {
    pub fn new(buffer: LogRingBuffer, file: Option<File>) -> Self {
        Self {
            buffer,
            file: Arc::new(Mutex::new(file)),
        }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(message) = std::str::from_utf8(buf) {
            for line in message.lines().filter(|l| !l.trim().is_empty()) {
                let (level, target, msg) = parse_compact_line(line);
                self.buffer
                    .push(LogEntry::new(level, target, msg.to_string()));
            }
        }

        if let Ok(mut file_opt) = self.file.lock() {
            if let Some(ref mut file) = *file_opt {
                let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f ");
                let _ = file.write_all(stamp.to_string().as_bytes());
                let _ = file.write_all(buf);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Ok(mut file_opt) = self.file.lock() {
            if let Some(ref mut file) = *file_opt {
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for TeeWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// What the caller needs after logging is up
pub struct LoggingHandle {
    pub buffer: LogRingBuffer,
    pub log_path: Option<PathBuf>,
}

/// Open a timestamped log file in `log_dir` and point latest.log at it
fn open_log_file(log_dir: &Path) -> Option<(File, PathBuf)> {
    std::fs::create_dir_all(log_dir).ok()?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("table-filter_{}.log", timestamp));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok()?;

    #[cfg(unix)]
    {
        let latest = log_dir.join("latest.log");
        let _ = std::fs::remove_file(&latest);
        let _ = std::os::unix::fs::symlink(&log_path, &latest);
    }

    Some((file, log_path))
}

/// Initialize tracing into the ring buffer and an optional log file.
///
/// The terminal UI owns stdout, so nothing is written to the console.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(log_dir: Option<&Path>) -> LoggingHandle {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let buffer = LogRingBuffer::default();
    let (file, log_path) = match log_dir.and_then(open_log_file) {
        Some((file, path)) => (Some(file), Some(path)),
        None => (None, None),
    };

    let fmt_layer = fmt::layer()
        .with_writer(TeeWriter::new(buffer.clone(), file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .without_time()
        .compact();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!(target: "table_filter", "Logging initialized");
    LoggingHandle { buffer, log_path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_line() {
        let (level, target, msg) =
            parse_compact_line(" INFO table_filter::filter::controller: Initialized 3 column filters");
        assert_eq!(level, Level::INFO);
        assert_eq!(target, "table_filter::filter::controller");
        assert_eq!(msg, "Initialized 3 column filters");

        let (level, target, msg) = parse_compact_line("WARN something went: odd");
        assert_eq!(level, Level::WARN);
        assert_eq!(target, "general");
        assert_eq!(msg, "something went: odd");

        let (level, target, _) = parse_compact_line("no level here");
        assert_eq!(level, Level::INFO);
        assert_eq!(target, "general");
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let buffer = LogRingBuffer::with_capacity(3);
        for i in 0..5 {
            buffer.push(LogEntry::new(Level::INFO, "t", format!("m{}", i)));
        }
        assert_eq!(buffer.len(), 3);
        let messages: Vec<String> = buffer.recent(2).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["m3", "m4"]);
    }

    #[test]
    fn test_tee_writer_feeds_buffer_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let file = File::create(&path).unwrap();
        let buffer = LogRingBuffer::default();
        let mut writer = TeeWriter::new(buffer.clone(), Some(file));

        writer.write_all(b"DEBUG redraw: 2 rows\n").unwrap();
        writer.flush().unwrap();

        let entries = buffer.recent(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, "DEBUG");
        assert_eq!(entries[0].target, "redraw");
        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents.lines().next().unwrap();
        assert!(line.ends_with("DEBUG redraw: 2 rows"));
        // The writer stamps each file line itself
        assert!(chrono::NaiveDateTime::parse_from_str(&line[..23], "%Y-%m-%d %H:%M:%S%.3f").is_ok());
    }
}
