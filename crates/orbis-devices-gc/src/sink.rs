use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// End-of-pipe event attached to a `SubmitEop` submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndOfPipe {
    pub value: u64,
    pub wait: bool,
}

/// One submission as handed to the command processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GcSubmission {
    pub pid: u32,
    /// Command words exactly as the guest laid them out, uninterpreted.
    pub commands: Vec<u64>,
    pub end_of_pipe: Option<EndOfPipe>,
}

/// Boundary between the `/dev/gc` device model and the GPU command processor.
///
/// Called synchronously from the guest thread issuing the `ioctl`; implementations queue the
/// work and return.
pub trait GcCommandSink: Send + Sync {
    fn submit(&self, submission: GcSubmission);
}

/// Drops every submission.
#[derive(Debug, Default)]
pub struct NullGcCommandSink;

impl NullGcCommandSink {
    pub fn new() -> Self {
        Self
    }
}

impl GcCommandSink for NullGcCommandSink {
    fn submit(&self, _submission: GcSubmission) {}
}

/// Keeps the most recent submissions for inspection (tests, tracing tools).
#[derive(Debug)]
pub struct RecordingGcCommandSink {
    keep_last: usize,
    submissions: Mutex<VecDeque<GcSubmission>>,
}

impl RecordingGcCommandSink {
    pub fn new(keep_last: usize) -> Self {
        Self {
            keep_last,
            submissions: Mutex::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain everything recorded so far, oldest first.
    pub fn take(&self) -> Vec<GcSubmission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

impl GcCommandSink for RecordingGcCommandSink {
    fn submit(&self, submission: GcSubmission) {
        if self.keep_last == 0 {
            return;
        }
        let mut queue = self
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while queue.len() >= self.keep_last {
            queue.pop_front();
        }
        queue.push_back(submission);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(pid: u32) -> GcSubmission {
        GcSubmission {
            pid,
            commands: vec![u64::from(pid)],
            end_of_pipe: None,
        }
    }

    #[test]
    fn recording_sink_keeps_only_the_newest() {
        let sink = RecordingGcCommandSink::new(2);
        for pid in 1..=3 {
            sink.submit(submission(pid));
        }
        let got: Vec<u32> = sink.take().iter().map(|s| s.pid).collect();
        assert_eq!(got, vec![2, 3]);

        // Drain semantics.
        assert!(sink.is_empty());
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let sink = RecordingGcCommandSink::new(0);
        sink.submit(submission(1));
        assert!(sink.is_empty());
        NullGcCommandSink::new().submit(submission(1));
    }
}
