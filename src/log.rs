//! The execution log (§4.7): a structured, node-scoped event sink the
//! engine writes to but never depends on. Three implementations ship here:
//! [`TracingLog`], which simply emits `tracing` events; [`RecordingLog`],
//! which buffers events off-thread for tests; and [`IndicatifLog`], a
//! per-node spinner display for interactive terminals.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::JoinHandle;

use console::style;
use crossbeam::channel::{Receiver, Sender};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// One structured event the engine can emit about a node (§4.7).
#[derive(Clone, Debug, PartialEq)]
pub enum LogEvent {
    Info { node: String, message: String },
    Error { node: String, message: String },
    TableHeader {
        node: String,
        columns: Vec<String>,
        sample_rows: Vec<Vec<String>>,
    },
}

/// Where the engine's node-scoped progress and error events go. The engine
/// never branches on what an implementation does with an event - it may
/// drop it, persist it, or stream it elsewhere (§4.7).
pub trait ExecutionLog: Send + Sync {
    fn node_info(&self, node: &str, message: &str);
    fn node_error(&self, node: &str, message: &str);
    fn node_table_header(&self, node: &str, columns: &[&str], sample_rows: &[Vec<String>]);
}

/// Emits every event straight to `tracing`, tagged with the node name. The
/// engine's default log; never installs a subscriber itself (§10.1) - only
/// the demo binary does that.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ExecutionLog for TracingLog {
    fn node_info(&self, node: &str, message: &str) {
        tracing::info!(node, "{message}");
    }

    fn node_error(&self, node: &str, message: &str) {
        tracing::error!(node, "{message}");
    }

    fn node_table_header(&self, node: &str, columns: &[&str], sample_rows: &[Vec<String>]) {
        tracing::debug!(node, columns = ?columns, rows = sample_rows.len(), "fetched table");
    }
}

/// Buffers every event on a single background thread behind a bounded
/// channel, so logging from concurrent fetch workers never blocks the
/// fetch itself - the same `channel + single consumer thread` shape as this
/// codebase's `Consumer<T>`, built on `crossbeam` instead of `flume` (§10.1).
pub struct RecordingLog {
    sender: Sender<LogEvent>,
    handle: Option<JoinHandle<Vec<LogEvent>>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver): (Sender<LogEvent>, Receiver<LogEvent>) =
            crossbeam::channel::bounded(capacity);

        let handle = std::thread::spawn(move || {
            let mut events = Vec::new();
            while let Ok(event) = receiver.recv() {
                events.push(event);
            }
            events
        });

        RecordingLog {
            sender,
            handle: Some(handle),
        }
    }

    /// Closes the channel and joins the background thread, returning every
    /// event recorded so far in emission order. Consumes the log, since
    /// nothing can be recorded into it afterward.
    pub fn finish(mut self) -> Vec<LogEvent> {
        let sender = std::mem::replace(&mut self.sender, crossbeam::channel::bounded(0).0);
        drop(sender);
        self.handle
            .take()
            .expect("handle only taken here")
            .join()
            .expect("recording thread panicked")
    }
}

impl Default for RecordingLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordingLog {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Close the channel first: the recording thread's `recv()` loop
            // only returns once every sender is gone, and our own `sender`
            // field otherwise outlives this method body.
            self.sender = crossbeam::channel::bounded(0).0;
            let _ = handle.join();
        }
    }
}

impl ExecutionLog for RecordingLog {
    fn node_info(&self, node: &str, message: &str) {
        let _ = self.sender.send(LogEvent::Info {
            node: node.to_string(),
            message: message.to_string(),
        });
    }

    fn node_error(&self, node: &str, message: &str) {
        let _ = self.sender.send(LogEvent::Error {
            node: node.to_string(),
            message: message.to_string(),
        });
    }

    fn node_table_header(&self, node: &str, columns: &[&str], sample_rows: &[Vec<String>]) {
        let _ = self.sender.send(LogEvent::TableHeader {
            node: node.to_string(),
            columns: columns.iter().map(|s| s.to_string()).collect(),
            sample_rows: sample_rows.to_vec(),
        });
    }
}

/// One spinner per node, shown and torn down the way the teacher's own
/// `Progressor` handles a build step: a spinner while the node is in
/// flight, a green `[OK]` line once its table lands, a red `[FAIL]` line
/// if it errors. Built for the demo binary's interactive terminal; a
/// library embedder wanting machine-readable output should reach for
/// [`RecordingLog`] instead.
pub struct IndicatifLog {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl IndicatifLog {
    pub fn new() -> Self {
        IndicatifLog {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner_for(&self, node: &str) -> ProgressBar {
        let mut bars = self.bars.lock().expect("mutex never poisoned");
        bars.entry(node.to_string())
            .or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.green} {msg}")
                        .expect("static template is well-formed"),
                );
                bar.enable_steady_tick(std::time::Duration::from_millis(100));
                bar.set_message(node.to_string());
                bar
            })
            .clone()
    }
}

impl Default for IndicatifLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionLog for IndicatifLog {
    fn node_info(&self, node: &str, message: &str) {
        self.spinner_for(node).set_message(format!("{node}: {message}"));
    }

    fn node_error(&self, node: &str, message: &str) {
        let bar = self.spinner_for(node);
        bar.finish_and_clear();
        self.multi
            .println(format!("{node} {} {message}", style("[FAIL]").red().bold()))
            .ok();
    }

    fn node_table_header(&self, node: &str, columns: &[&str], sample_rows: &[Vec<String>]) {
        let bar = self.spinner_for(node);
        bar.finish_and_clear();
        self.multi
            .println(format!(
                "{node} {} {} columns, {} sample rows",
                style("[OK]").green().bold(),
                columns.len(),
                sample_rows.len(),
            ))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_events_in_order() {
        let log = RecordingLog::new();
        log.node_info("root", "starting fetch");
        log.node_error("child", "boom");

        let events = log.finish();
        assert_eq!(
            events,
            vec![
                LogEvent::Info {
                    node: "root".into(),
                    message: "starting fetch".into()
                },
                LogEvent::Error {
                    node: "child".into(),
                    message: "boom".into()
                },
            ]
        );
    }

    #[test]
    fn indicatif_log_reuses_one_bar_per_node() {
        let log = IndicatifLog::new();
        log.node_info("root", "fetching");
        log.node_info("root", "still fetching");
        log.node_table_header("root", &["id"], &[]);

        assert_eq!(log.bars.lock().unwrap().len(), 1);
    }
}
