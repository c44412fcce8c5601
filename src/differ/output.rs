//! Output sinks for change events.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::error;

/// Output abstracts a straightforward way to write change events.
pub trait Output: Send + Sync {
    fn write_added(&self, name: &str, namespace: &str, kind: &str);
    fn write_deleted(&self, name: &str, namespace: &str, kind: &str);
    fn write_updated(&self, name: &str, namespace: &str, kind: &str, diffs: &[String]);
}

/// Rendering used by [`StreamOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line of plain text per event.
    Text,
    /// One JSON object per line.
    #[default]
    Json,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: &'a str,
    verb: &'a str,
    kind: &'a str,
    name: &'a str,
    namespace: &'a str,
    notes: &'a str,
}

/// Writes change events as text or JSON lines to any byte sink.
///
/// Whether added/deleted events are written at all is decided here, from
/// configuration threaded in at construction. Write failures are logged
/// and dropped; an output problem never aborts a dispatcher.
pub struct StreamOutput {
    format: OutputFormat,
    log_added: bool,
    log_deleted: bool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl StreamOutput {
    pub fn new(
        format: OutputFormat,
        log_added: bool,
        log_deleted: bool,
        sink: Box<dyn Write + Send>,
    ) -> Self {
        StreamOutput {
            format,
            log_added,
            log_deleted,
            sink: Mutex::new(sink),
        }
    }

    /// A stdout-backed output.
    pub fn stdout(format: OutputFormat, log_added: bool, log_deleted: bool) -> Self {
        StreamOutput::new(format, log_added, log_deleted, Box::new(std::io::stdout()))
    }

    fn write(&self, name: &str, namespace: &str, verb: &str, kind: &str, diffs: &[String]) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = render_line(self.format, &timestamp, verb, namespace, name, kind, diffs);

        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(error = %err, "failed to encode output record");
                return;
            }
        };

        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(sink, "{}", line) {
            error!(error = %err, "failed to write output record");
        }
    }
}

/// Renders one output line. Factored out of [`StreamOutput`] so the exact
/// wire form can be tested with a fixed timestamp.
fn render_line(
    format: OutputFormat,
    timestamp: &str,
    verb: &str,
    namespace: &str,
    name: &str,
    kind: &str,
    diffs: &[String],
) -> Result<String, serde_json::Error> {
    let notes = diffs.join(", ");
    match format {
        OutputFormat::Text => Ok(format!(
            "{} {} : {} {} ({}) {}",
            timestamp, verb, namespace, name, kind, notes
        )),
        OutputFormat::Json => serde_json::to_string(&JsonRecord {
            timestamp,
            verb,
            kind,
            name,
            namespace,
            notes: &notes,
        }),
    }
}

impl Output for StreamOutput {
    fn write_added(&self, name: &str, namespace: &str, kind: &str) {
        if !self.log_added {
            return;
        }
        self.write(name, namespace, "added", kind, &[]);
    }

    fn write_deleted(&self, name: &str, namespace: &str, kind: &str) {
        if !self.log_deleted {
            return;
        }
        self.write(name, namespace, "deleted", kind, &[]);
    }

    fn write_updated(&self, name: &str, namespace: &str, kind: &str, diffs: &[String]) {
        self.write(name, namespace, "updated", kind, diffs);
    }
}
