use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ping/pong bookkeeping for the open connection.
///
/// The ticking itself is a task owned by the client; this holds its cancellation token and the
/// outstanding ping, so both are torn down in the same step as the rest of the session.
#[derive(Debug, Default)]
pub(crate) struct Keepalive {
    timer: Option<CancellationToken>,
    epoch: u64,
    last_ping_seq: Option<u64>,
    pong_deadline: Option<Instant>,
}

impl Keepalive {
    /// Replaces the ticking task, cancelling the previous one. Returns the epoch the new task
    /// must present on every tick.
    pub(crate) fn arm(&mut self, timer: CancellationToken) -> u64 {
        self.disarm();
        self.epoch += 1;
        self.timer = Some(timer);
        self.epoch
    }

    pub(crate) fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.last_ping_seq = None;
        self.pong_deadline = None;
    }

    /// Whether the task armed at `epoch` is still the live one.
    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub(crate) fn ping_sent(&mut self, seq: u64, deadline: Instant) {
        self.last_ping_seq = Some(seq);
        self.pong_deadline = Some(deadline);
    }

    /// Clears the outstanding ping if `seq_reply` acknowledges it.
    pub(crate) fn pong_received(&mut self, seq_reply: u64) -> bool {
        if self.pong_deadline.is_some() && self.last_ping_seq == Some(seq_reply) {
            self.pong_deadline = None;
            return true;
        }
        false
    }

    /// True when the last ping was never acknowledged.
    pub(crate) fn awaiting_pong(&self) -> bool {
        self.pong_deadline.is_some()
    }

    /// True when the last ping is still unacknowledged at `now`, its deadline included.
    pub(crate) fn pong_overdue(&self, now: Instant) -> bool {
        self.pong_deadline.is_some_and(|deadline| now >= deadline)
    }
}
