//! services/api/src/web/quiz_timer.rs
//!
//! The quiz countdown. A timer is a spawned task that ticks once per second
//! and reports `Expired` when it reaches zero. It is owned by a `TimerSlot`,
//! which holds at most one live timer; arming the slot again, disarming it or
//! dropping it cancels whatever was running.

use edusync_core::quiz::QuizDuration;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { remaining_secs: u32 },
    Expired,
}

pub struct QuizTimer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl QuizTimer {
    pub fn start(duration: QuizDuration, events: mpsc::Sender<TimerEvent>) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(countdown(duration.secs(), events, token.clone()));
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for QuizTimer {
    fn drop(&mut self) {
        self.token.cancel();
        if !self.handle.is_finished() {
            self.handle.abort();
        }
    }
}

async fn countdown(secs: u32, events: mpsc::Sender<TimerEvent>, token: CancellationToken) {
    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut remaining = secs;
    while remaining > 0 {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        remaining -= 1;
        let event = if remaining == 0 {
            TimerEvent::Expired
        } else {
            TimerEvent::Tick {
                remaining_secs: remaining,
            }
        };
        if events.send(event).await.is_err() {
            return;
        }
    }
}

//=========================================================================================
// TimerSlot
//=========================================================================================

/// Each armed timer gets its own channel, so events from a replaced timer
/// can never reach the new quiz.
#[derive(Default)]
pub struct TimerSlot {
    live: Option<(QuizTimer, mpsc::Receiver<TimerEvent>)>,
}

impl TimerSlot {
    pub fn arm(&mut self, duration: QuizDuration) {
        self.disarm();
        let (tx, rx) = mpsc::channel(4);
        self.live = Some((QuizTimer::start(duration, tx), rx));
    }

    pub fn disarm(&mut self) {
        if let Some((timer, _)) = self.live.take() {
            timer.cancel();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.live.is_some()
    }

    /// Waits for the next event of the live timer. Never resolves while the
    /// slot is empty or once the timer has finished.
    pub async fn next(&mut self) -> TimerEvent {
        let event = match self.live.as_mut() {
            Some((_, rx)) => rx.recv().await,
            None => None,
        };
        match event {
            Some(event) => event,
            None => {
                self.live = None;
                std::future::pending().await
            }
        }
    }
}
