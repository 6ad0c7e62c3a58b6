use std::time::{Duration, Instant};

use log::debug;

/// "Run at most once every `interval`", driven by an external refresh signal
/// (display frames, a fixed-rate clock) rather than its own timer.
#[derive(Clone, Debug)]
pub struct FrameThrottle {
    interval: Duration,
    last_run: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.last_run = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_run = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Proof that a cycle was issued. Completing with a ticket from an older
/// generation is rejected, which is how cancelled cycles get discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleTicket {
    generation: u64,
}

/// Scheduling state for detection cycles.
///
/// At most one cycle is in flight. Every cancellation bumps the generation,
/// so whatever was in flight at the time can no longer complete.
#[derive(Debug)]
pub struct DetectionLoop {
    state: LoopState,
    generation: u64,
    in_flight: bool,
    throttle: FrameThrottle,
}

impl DetectionLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: LoopState::Idle,
            generation: 0,
            in_flight: false,
            throttle: FrameThrottle::new(interval),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn start(&mut self) {
        if self.state == LoopState::Idle {
            debug!("Detection loop running");
            self.state = LoopState::Running;
        }
    }

    /// Back to idle; any in-flight cycle is cancelled.
    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            debug!("Detection loop idle");
            self.state = LoopState::Idle;
        }
        self.cancel();
        self.throttle.reset();
    }

    /// Invalidates the in-flight cycle, if any, without changing state.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = false;
    }

    /// Refresh tick. Issues a ticket only when running, idle between cycles,
    /// past the interval and with a frame available.
    pub fn on_refresh(&mut self, now: Instant, frame_ready: bool) -> Option<CycleTicket> {
        if self.state != LoopState::Running
            || self.in_flight
            || !frame_ready
            || !self.throttle.is_due(now)
        {
            return None;
        }
        self.throttle.record(now);
        Some(self.issue())
    }

    /// A single out-of-band cycle (still images). Supersedes anything in flight.
    pub fn issue_once(&mut self) -> CycleTicket {
        self.cancel();
        self.issue()
    }

    /// Marks the cycle finished. Returns `false` for a stale ticket, whose
    /// result must then be dropped.
    pub fn complete(&mut self, ticket: CycleTicket) -> bool {
        if ticket.generation != self.generation {
            debug!("Discarding stale detection result");
            return false;
        }
        self.in_flight = false;
        true
    }

    fn issue(&mut self) -> CycleTicket {
        self.in_flight = true;
        CycleTicket {
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::DETECTION_INTERVAL;
    use rstest::rstest;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn running_loop() -> (DetectionLoop, Instant) {
        let mut dl = DetectionLoop::new(DETECTION_INTERVAL);
        dl.start();
        (dl, Instant::now())
    }

    #[test]
    fn test_throttle_first_tick_is_due() {
        let throttle = FrameThrottle::new(ms(100));
        assert!(throttle.is_due(Instant::now()));
    }

    #[rstest]
    #[case(ms(0), false)]
    #[case(ms(99), false)]
    #[case(ms(100), true)]
    #[case(ms(250), true)]
    fn test_throttle_interval(#[case] elapsed: Duration, #[case] due: bool) {
        let t0 = Instant::now();
        let mut throttle = FrameThrottle::new(ms(100));
        throttle.record(t0);
        assert_eq!(throttle.is_due(t0 + elapsed), due);
    }

    #[test]
    fn test_idle_never_issues() {
        let mut dl = DetectionLoop::new(ms(100));
        assert_eq!(dl.state(), LoopState::Idle);
        assert!(dl.on_refresh(Instant::now(), true).is_none());
    }

    #[test]
    fn test_no_frame_no_cycle() {
        let (mut dl, t0) = running_loop();
        assert!(dl.on_refresh(t0, false).is_none());
        assert!(dl.on_refresh(t0, true).is_some());
    }

    #[test]
    fn test_one_cycle_in_flight() {
        let (mut dl, t0) = running_loop();
        let ticket = dl.on_refresh(t0, true).unwrap();
        assert!(dl.is_in_flight());
        assert!(dl.on_refresh(t0 + ms(500), true).is_none());
        assert!(dl.complete(ticket));
        assert!(dl.on_refresh(t0 + ms(500), true).is_some());
    }

    #[test]
    fn test_cycles_never_closer_than_interval() {
        let (mut dl, t0) = running_loop();
        let mut issued = Vec::new();
        // 60 Hz refresh for one second, inference completes immediately
        for i in 0..60u64 {
            let now = t0 + ms(i * 1000 / 60);
            if let Some(ticket) = dl.on_refresh(now, true) {
                issued.push(now);
                assert!(dl.complete(ticket));
            }
        }
        assert!(issued.windows(2).all(|w| w[1] - w[0] >= DETECTION_INTERVAL));
        assert!(issued.len() >= 9);
    }

    #[test]
    fn test_stop_discards_in_flight_result() {
        let (mut dl, t0) = running_loop();
        let ticket = dl.on_refresh(t0, true).unwrap();
        dl.stop();
        assert_eq!(dl.state(), LoopState::Idle);
        assert!(!dl.complete(ticket));
    }

    #[test]
    fn test_restart_does_not_revive_old_ticket() {
        let (mut dl, t0) = running_loop();
        let old = dl.on_refresh(t0, true).unwrap();
        dl.stop();
        dl.start();
        let new = dl.on_refresh(t0 + ms(1), true).unwrap();
        assert!(!dl.complete(old));
        assert!(dl.complete(new));
    }

    #[test]
    fn test_issue_once_supersedes_previous() {
        let mut dl = DetectionLoop::new(ms(100));
        let first = dl.issue_once();
        let second = dl.issue_once();
        assert!(!dl.complete(first));
        assert!(dl.complete(second));
        assert!(!dl.is_in_flight());
    }
}
