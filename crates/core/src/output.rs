use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use powertools_errors::PowertoolsResult;

/// Destination for newline-delimited JSON emitted by the logger and metrics.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    #[default]
    Stdout,
    Stderr,
    Memory(MemoryOutput),
}

impl OutputSink {
    /// A sink that records lines in memory, plus a handle to read them back.
    pub fn memory() -> (Self, MemoryOutput) {
        let output = MemoryOutput::new();
        (Self::Memory(output.clone()), output)
    }

    pub fn write_line(&self, line: &str) -> PowertoolsResult<()> {
        match self {
            OutputSink::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()?;
            }
            OutputSink::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{line}")?;
            }
            OutputSink::Memory(output) => output.push(line),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drains the recorded lines.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn json_lines(&self) -> PowertoolsResult<Vec<serde_json::Value>> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_lines() {
        let (sink, output) = OutputSink::memory();
        sink.write_line(r#"{"a":1}"#).unwrap();
        sink.write_line(r#"{"b":2}"#).unwrap();

        assert_eq!(output.len(), 2);
        let values = output.json_lines().unwrap();
        assert_eq!(values[0]["a"], 1);
        assert_eq!(values[1]["b"], 2);

        assert_eq!(output.take().len(), 2);
        assert!(output.is_empty());
    }

    #[test]
    fn test_json_lines_rejects_garbage() {
        let (sink, output) = OutputSink::memory();
        sink.write_line("not json").unwrap();
        assert!(output.json_lines().is_err());
    }

    #[test]
    fn test_default_sink_is_stdout() {
        assert!(matches!(OutputSink::default(), OutputSink::Stdout));
    }
}
