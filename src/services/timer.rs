use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::debug_if_enabled;
use crate::events::ShellEvent;

/// Идентификатор отложенного commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// One-shot timers delivered back to the shell loop.
///
/// A scheduled timer fires at most once by posting
/// [`ShellEvent::CommitDue`]; there are no repeating timers. Cancelling before
/// the deadline guarantees the event is never posted.
pub trait TimerService: Send {
    fn schedule_once(&mut self, delay: Duration, event_time: u32) -> TimerId;
    fn cancel(&mut self, timer: TimerId);
}

/// Timer service backed by sleeping tokio tasks
pub struct TokioTimer {
    events: UnboundedSender<ShellEvent>,
    next_id: u64,
    pending: Arc<DashMap<TimerId, JoinHandle<()>>>,
}

impl TokioTimer {
    pub fn new(events: UnboundedSender<ShellEvent>) -> Self {
        Self {
            events,
            next_id: 0,
            pending: Arc::new(DashMap::new()),
        }
    }
}

impl TimerService for TokioTimer {
    fn schedule_once(&mut self, delay: Duration, event_time: u32) -> TimerId {
        self.next_id += 1;
        let timer = TimerId(self.next_id);

        // Завершившиеся задачи, которые не успели удалить себя сами
        self.pending.retain(|_, handle| !handle.is_finished());

        let events = self.events.clone();
        let pending = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            pending.remove(&timer);
            let _ = events.send(ShellEvent::CommitDue { timer, event_time });
        });

        self.pending.insert(timer, handle);
        debug_if_enabled!("Запланирован {} через {}мс", timer, delay.as_millis());
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some((_, handle)) = self.pending.remove(&timer) {
            handle.abort();
            debug_if_enabled!("{} отменён", timer);
        }
    }
}

#[cfg(test)]
impl TokioTimer {
    fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        let id = timer.schedule_once(Duration::from_millis(250), 42);
        tokio::time::sleep(Duration::from_millis(249)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(
            rx.recv().await,
            Some(ShellEvent::CommitDue { timer: id, event_time: 42 })
        );
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TokioTimer::new(tx);

        let first = timer.schedule_once(Duration::from_millis(250), 1);
        timer.cancel(first);
        let second = timer.schedule_once(Duration::from_millis(250), 2);
        assert_ne!(first, second);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            ShellEvent::CommitDue { timer: second, event_time: 2 }
        );
        assert!(rx.try_recv().is_err());
    }
}
