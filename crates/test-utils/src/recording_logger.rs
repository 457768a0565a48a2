use shtask::exec::{LogStart, OutputLine, ScriptLogger};
use shtask::script::Script;

/// Everything a [`RecordingLogger`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    StartScript(String),
    Start {
        headline: String,
        subject: String,
        line_number: Option<usize>,
        ignore_error: bool,
        index: usize,
        total: usize,
    },
    Output {
        text: String,
        is_error: bool,
    },
    Wait,
    Success,
    Failure,
    Warning(String),
    FinishScript(String),
}

/// A logger that records events instead of printing them.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: Vec<LogEvent>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Stdout/stderr lines in the order they were logged.
    pub fn output(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LogEvent::Output { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Subjects of every `log_start`, in order.
    pub fn started(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LogEvent::Start { subject, .. } => Some(subject.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &LogEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    /// Compact rendering used by ordering assertions:
    /// `start:<subject>`, `out:<text>`, `wait`, `success`, `failure`, ...
    pub fn timeline(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|e| match e {
                LogEvent::StartScript(name) => format!("start-script:{name}"),
                LogEvent::Start { subject, .. } => format!("start:{subject}"),
                LogEvent::Output { text, .. } => format!("out:{text}"),
                LogEvent::Wait => "wait".to_string(),
                LogEvent::Success => "success".to_string(),
                LogEvent::Failure => "failure".to_string(),
                LogEvent::Warning(message) => format!("warning:{message}"),
                LogEvent::FinishScript(name) => format!("finish-script:{name}"),
            })
            .collect()
    }
}

impl ScriptLogger for RecordingLogger {
    fn start_script(&mut self, script: &Script) {
        self.events.push(LogEvent::StartScript(script.qualified_name()));
    }

    fn log_start(&mut self, entry: &LogStart<'_>) {
        self.events.push(LogEvent::Start {
            headline: entry.headline.to_string(),
            subject: entry.subject.to_string(),
            line_number: entry.line_number,
            ignore_error: entry.ignore_error,
            index: entry.index,
            total: entry.total,
        });
    }

    fn log(&mut self, line: &OutputLine) {
        self.events.push(LogEvent::Output {
            text: line.text.clone(),
            is_error: line.is_error,
        });
    }

    fn log_wait(&mut self) {
        self.events.push(LogEvent::Wait);
    }

    fn log_success(&mut self) {
        self.events.push(LogEvent::Success);
    }

    fn log_failure(&mut self) {
        self.events.push(LogEvent::Failure);
    }

    fn warn(&mut self, message: &str) {
        self.events.push(LogEvent::Warning(message.to_string()));
    }

    fn finish_script(&mut self, script: &Script) {
        self.events.push(LogEvent::FinishScript(script.qualified_name()));
    }
}
