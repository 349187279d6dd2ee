//! Best-effort progress observer threaded through conversion calls.

/// Receives coarse progress milestones in `0.0..=1.0`.
///
/// Reports are synchronous and advisory: a sink cannot cancel a
/// conversion, and pipelines only report a handful of milestones.
pub trait ProgressSink {
    /// Called with the completed fraction.
    fn report(&self, fraction: f32);
}

impl<F: Fn(f32)> ProgressSink for F {
    fn report(&self, fraction: f32) {
        self(fraction)
    }
}

/// Sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _fraction: f32) {}
}

/// Report `fraction` to `sink` if one was supplied, clamped to `0.0..=1.0`.
pub fn report(sink: Option<&dyn ProgressSink>, fraction: f32) {
    if let Some(sink) = sink {
        sink.report(fraction.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_closure_sink_receives_clamped_values() {
        let seen = RefCell::new(Vec::new());
        let sink = |f: f32| seen.borrow_mut().push(f);
        report(Some(&sink), 0.5);
        report(Some(&sink), 1.5);
        report(None, 0.7);
        assert_eq!(*seen.borrow(), vec![0.5, 1.0]);
    }

    #[test]
    fn test_no_progress_is_silent() {
        report(Some(&NoProgress), 0.3);
    }
}
