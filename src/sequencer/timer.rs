// Tick schedulers - periodic drivers for the tempo clock

use crate::sequencer::clock::{ClockError, TempoClock, TickScheduler};
use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, error};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum TimerCommand {
    Arm { generation: u64, period: Duration },
    Retime { generation: u64, period: Duration },
    Disarm,
}

/// Scheduler backed by a dedicated timer thread
///
/// Commands are processed in order by a single thread, so a re-time is an
/// atomic cancel-and-rearm.
pub struct ThreadScheduler {
    commands: Sender<TimerCommand>,
}

/// Receiving half of a [`ThreadScheduler`], run with [`TimerLoop::spawn`]
pub struct TimerLoop {
    commands: Receiver<TimerCommand>,
}

impl ThreadScheduler {
    pub fn channel() -> (ThreadScheduler, TimerLoop) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (ThreadScheduler { commands: tx }, TimerLoop { commands: rx })
    }

    fn send(&self, command: TimerCommand) -> Result<(), ClockError> {
        self.commands
            .send(command)
            .map_err(|_| ClockError::TimerUnavailable)
    }
}

impl TickScheduler for ThreadScheduler {
    fn arm(&self, generation: u64, period: Duration) -> Result<(), ClockError> {
        self.send(TimerCommand::Arm { generation, period })
    }

    fn retime(&self, generation: u64, period: Duration) -> Result<(), ClockError> {
        self.send(TimerCommand::Retime { generation, period })
    }

    fn disarm(&self) -> Result<(), ClockError> {
        self.send(TimerCommand::Disarm)
    }
}

#[derive(Debug, Clone, Copy)]
struct ArmedRun {
    generation: u64,
    period: Duration,
    last_tick: Instant,
    deadline: Instant,
}

impl ArmedRun {
    fn new(generation: u64, period: Duration, now: Instant) -> Self {
        Self {
            generation,
            period,
            last_tick: now,
            deadline: now + period,
        }
    }

    fn retime(&mut self, period: Duration) {
        // An overdue deadline fires immediately, once
        self.period = period;
        self.deadline = self.last_tick + period;
    }

    fn advance(&mut self, now: Instant) {
        self.last_tick = self.deadline;
        self.deadline += self.period;

        // Far behind (suspended process, debugger): restart the phase instead of bursting
        if self.deadline <= now {
            self.last_tick = now;
            self.deadline = now + self.period;
        }
    }
}

impl TimerLoop {
    /// Run the timer on its own thread until the clock is dropped
    pub fn spawn(self, clock: Weak<TempoClock>) -> Result<(), ClockError> {
        thread::Builder::new()
            .name("tempo-clock".to_string())
            .spawn(move || self.run(clock))
            .map(|_| ())
            .map_err(|e| {
                error!("Failed to spawn sequencer timer thread: {}", e);
                ClockError::TimerUnavailable
            })
    }

    fn run(self, clock: Weak<TempoClock>) {
        let mut armed: Option<ArmedRun> = None;

        loop {
            let timeout = match &armed {
                Some(run) => crossbeam_channel::at(run.deadline),
                None => crossbeam_channel::never(),
            };

            select! {
                recv(self.commands) -> command => {
                    let Ok(command) = command else { break };
                    let now = Instant::now();
                    match command {
                        TimerCommand::Arm { generation, period } => {
                            armed = Some(ArmedRun::new(generation, period, now));
                        }
                        TimerCommand::Retime { generation, period } => {
                            if let Some(run) = armed.as_mut()
                                && run.generation == generation
                            {
                                run.retime(period);
                            }
                        }
                        TimerCommand::Disarm => armed = None,
                    }
                },
                recv(timeout) -> _ => {
                    let Some(run) = armed.as_mut() else { continue };
                    let Some(clock) = clock.upgrade() else { break };
                    clock.on_tick(run.generation);
                    run.advance(Instant::now());
                },
            }
        }

        debug!("Sequencer timer thread finished");
    }
}

#[derive(Debug, Default)]
struct ManualTimer {
    now: Duration,
    armed: Option<ManualRun>,
    arm_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct ManualRun {
    generation: u64,
    period: Duration,
    last_tick: Duration,
    next_due: Duration,
}

/// Scheduler driven by virtual time, for tests and simulations
///
/// Clones share the same timer, keep one to drive a clock that owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualTimer>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualTimer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance virtual time, firing every tick that falls due
    /// Returns the number of ticks the clock accepted
    pub fn advance(&self, clock: &TempoClock, elapsed: Duration) -> usize {
        let target = self.lock().now + elapsed;
        let mut fired = 0;

        loop {
            // The timer lock is released before calling into the clock
            let due = {
                let mut timer = self.lock();
                match timer.armed {
                    Some(mut run) if run.next_due <= target => {
                        timer.now = run.next_due;
                        run.last_tick = run.next_due;
                        run.next_due += run.period;
                        timer.armed = Some(run);
                        Some(run.generation)
                    }
                    _ => None,
                }
            };

            match due {
                Some(generation) => {
                    if clock.on_tick(generation).is_some() {
                        fired += 1;
                    }
                }
                None => break,
            }
        }

        self.lock().now = target;
        fired
    }

    /// Period of the armed run, if any
    pub fn armed_period(&self) -> Option<Duration> {
        self.lock().armed.map(|run| run.period)
    }

    /// Virtual time until the next tick, if armed
    pub fn time_to_next_tick(&self) -> Option<Duration> {
        let timer = self.lock();
        timer
            .armed
            .map(|run| run.next_due.saturating_sub(timer.now))
    }

    pub fn is_armed(&self) -> bool {
        self.lock().armed.is_some()
    }

    /// How many times a fresh run was armed
    pub fn arm_count(&self) -> usize {
        self.lock().arm_count
    }
}

impl TickScheduler for ManualScheduler {
    fn arm(&self, generation: u64, period: Duration) -> Result<(), ClockError> {
        let mut timer = self.lock();
        let now = timer.now;
        timer.armed = Some(ManualRun {
            generation,
            period,
            last_tick: now,
            next_due: now + period,
        });
        timer.arm_count += 1;
        Ok(())
    }

    fn retime(&self, generation: u64, period: Duration) -> Result<(), ClockError> {
        let mut timer = self.lock();
        let now = timer.now;
        if let Some(run) = timer.armed.as_mut()
            && run.generation == generation
        {
            run.period = period;
            run.next_due = (run.last_tick + period).max(now);
        }
        Ok(())
    }

    fn disarm(&self) -> Result<(), ClockError> {
        self.lock().armed = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{EventBus, Notification, NotificationKind};
    use crate::sequencer::tempo::Tempo;

    #[test]
    fn test_armed_run_retime_keeps_phase() {
        let start = Instant::now();
        let mut run = ArmedRun::new(1, Duration::from_millis(500), start);
        run.retime(Duration::from_millis(250));
        assert_eq!(run.deadline, start + Duration::from_millis(250));
        assert_eq!(run.last_tick, start);
    }

    #[test]
    fn test_armed_run_advance_resyncs_when_far_behind() {
        let start = Instant::now();
        let mut run = ArmedRun::new(1, Duration::from_millis(10), start);
        let late = start + Duration::from_millis(100);
        run.advance(late);
        assert_eq!(run.deadline, late + Duration::from_millis(10));
    }

    #[test]
    fn test_manual_retime_overdue_fires_once() {
        let bus = EventBus::new();
        let scheduler = ManualScheduler::new();
        let clock = TempoClock::new(
            bus.clone(),
            8,
            Tempo::new(60).unwrap(),
            Box::new(scheduler.clone()),
        );
        clock.start().unwrap();

        // 800ms into a 1000ms step, switch to 500ms steps: the step is overdue
        scheduler.advance(&clock, Duration::from_millis(800));
        clock.set_tempo(120).unwrap();
        assert_eq!(scheduler.time_to_next_tick(), Some(Duration::ZERO));

        assert_eq!(scheduler.advance(&clock, Duration::ZERO), 1);
        assert_eq!(clock.position(), 1);
        assert_eq!(scheduler.time_to_next_tick(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_thread_scheduler_ticks() {
        let bus = EventBus::new();
        let sub = bus.subscribe(&[NotificationKind::PositionChanged]);
        // 6000 BPM = 10ms steps
        let clock = TempoClock::spawn(bus, 8, Tempo::new(6000).unwrap()).unwrap();

        clock.start().unwrap();
        let mut positions = Vec::new();
        while positions.len() < 4 {
            match sub.receiver().recv_timeout(Duration::from_secs(2)) {
                Ok(Notification::PositionChanged(step)) => positions.push(step),
                _ => break,
            }
        }
        clock.stop().unwrap();

        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_thread_scheduler_no_tick_after_stop() {
        let bus = EventBus::new();
        let clock = TempoClock::spawn(bus.clone(), 8, Tempo::new(6000).unwrap()).unwrap();
        clock.start().unwrap();
        thread::sleep(Duration::from_millis(35));
        clock.stop().unwrap();

        let sub = bus.subscribe_all();
        thread::sleep(Duration::from_millis(50));
        assert!(sub.drain().is_empty());
    }
}
