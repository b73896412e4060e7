use tokio::time::{Duration, Instant};

/// Fixed period during which the panel shows a loading state.
///
/// There is no way to end a running window early, and starting it again while it runs
/// does not extend it.
#[derive(Debug, Clone)]
pub struct BusyWindow {
    length: Duration,
    until: Option<Instant>,
}

impl BusyWindow {
    pub fn new(length: Duration) -> Self {
        BusyWindow { length, until: None }
    }

    /// Returns false if a window was already running.
    pub fn start(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }

        self.until = Some(Instant::now() + self.length);
        true
    }

    pub fn remaining(&self) -> Option<Duration> {
        let until = self.until?;
        let remaining = until.saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }

    pub fn is_busy(&self) -> bool {
        self.remaining().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_window_runs_to_completion() {
        let mut busy = BusyWindow::new(Duration::from_secs(40));
        assert!(!busy.is_busy());

        assert!(busy.start());
        assert!(busy.is_busy());

        advance(Duration::from_secs(39)).await;
        assert!(busy.is_busy());
        assert_eq!(busy.remaining(), Some(Duration::from_secs(1)));

        advance(Duration::from_secs(1)).await;
        assert!(!busy.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_extend() {
        let mut busy = BusyWindow::new(Duration::from_secs(40));
        busy.start();

        advance(Duration::from_secs(30)).await;
        assert!(!busy.start());

        advance(Duration::from_secs(10)).await;
        assert!(!busy.is_busy());
        assert!(busy.start());
    }
}
