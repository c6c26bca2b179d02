use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Deadline for external provider calls (extractor, embedding, semantic
/// search). A call that overruns is treated as a best-effort failure.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `f` on a worker thread, waiting at most `timeout` for its result.
/// Returns `None` on timeout; the worker is left to finish and its late
/// result is discarded.
pub fn call_bounded<T, F>(label: &'static str, timeout: Duration, f: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    match rx.recv_timeout(timeout) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(provider = label, timeout_secs = timeout.as_secs(), "provider call timed out");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_value_within_deadline() {
        let out = call_bounded("fast", Duration::from_secs(1), || 41 + 1);
        assert_eq!(out, Some(42));
    }

    #[test]
    fn times_out_on_slow_calls() {
        let out = call_bounded("slow", Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            7
        });
        assert_eq!(out, None);
    }
}
