//! Deferred-callback scheduling contracts and a deterministic manual scheduler.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{subscription::Subscription, time::ManualClock, Clock};

/// Host service for one-shot and repeating timers.
///
/// Returned handles cancel the timer when dropped; call [`Subscription::detach`] for
/// fire-and-forget timers.
pub trait Scheduler {
    /// Runs `callback` once after `delay_ms` milliseconds.
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> Subscription;

    /// Runs `callback` every `period_ms` milliseconds until cancelled.
    fn set_interval(&self, period_ms: u64, callback: Rc<dyn Fn()>) -> Subscription;
}

#[derive(Debug, Clone, Copy, Default)]
/// Scheduler that never fires, for hosts without timer support.
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn set_timeout(&self, _delay_ms: u64, _callback: Box<dyn FnOnce()>) -> Subscription {
        Subscription::noop()
    }

    fn set_interval(&self, _period_ms: u64, _callback: Rc<dyn Fn()>) -> Subscription {
        Subscription::noop()
    }
}

enum TimerCallback {
    Once(Box<dyn FnOnce()>),
    Repeat(Rc<dyn Fn()>),
}

struct PendingTimer {
    id: u64,
    due_ms: u64,
    period_ms: Option<u64>,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualSchedulerState {
    next_id: u64,
    timers: Vec<PendingTimer>,
}

#[derive(Clone, Default)]
/// Scheduler driven by simulated time.
///
/// Timers fire only from [`ManualScheduler::advance`], in due-time order (ties in registration
/// order), with the shared [`ManualClock`] set to each timer's due time while it runs.
pub struct ManualScheduler {
    clock: ManualClock,
    state: Rc<RefCell<ManualSchedulerState>>,
}

impl ManualScheduler {
    /// Creates a scheduler that reads and advances `clock`.
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            state: Rc::default(),
        }
    }

    /// Returns the clock driven by this scheduler.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Returns the number of timers still pending.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Advances simulated time by `delta_ms`, firing every timer that falls due.
    pub fn advance(&self, delta_ms: u64) {
        let target = self.clock.now_ms().saturating_add(delta_ms);
        while let Some(timer) = self.take_next_due(target) {
            self.clock.set(timer.due_ms.max(self.clock.now_ms()));
            match timer.callback {
                TimerCallback::Once(callback) => callback(),
                TimerCallback::Repeat(callback) => callback(),
            }
        }
        self.clock.set(target);
    }

    fn take_next_due(&self, target: u64) -> Option<PendingTimer> {
        let mut state = self.state.borrow_mut();
        let index = state
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= target)
            .min_by_key(|(_, timer)| (timer.due_ms, timer.id))
            .map(|(index, _)| index)?;
        let timer = state.timers.remove(index);

        if let (Some(period), TimerCallback::Repeat(callback)) = (timer.period_ms, &timer.callback)
        {
            let next = PendingTimer {
                id: timer.id,
                due_ms: timer.due_ms.saturating_add(period.max(1)),
                period_ms: Some(period),
                callback: TimerCallback::Repeat(Rc::clone(callback)),
            };
            state.timers.push(next);
        }
        Some(timer)
    }

    fn register(&self, delay_ms: u64, period_ms: Option<u64>, callback: TimerCallback) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.timers.push(PendingTimer {
                id,
                due_ms: self.clock.now_ms().saturating_add(delay_ms),
                period_ms,
                callback,
            });
            id
        };

        let weak: Weak<RefCell<ManualSchedulerState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().timers.retain(|timer| timer.id != id);
            }
        })
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> Subscription {
        self.register(delay_ms, None, TimerCallback::Once(callback))
    }

    fn set_interval(&self, period_ms: u64, callback: Rc<dyn Fn()>) -> Subscription {
        self.register(period_ms, Some(period_ms), TimerCallback::Repeat(callback))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn timeout_fires_once_at_due_time() {
        let scheduler = ManualScheduler::new(ManualClock::starting_at(0));
        let fired_at = Rc::new(Cell::new(None));
        let sink = Rc::clone(&fired_at);
        let clock = scheduler.clock();
        scheduler
            .set_timeout(500, Box::new(move || sink.set(Some(clock.now_ms()))))
            .detach();

        scheduler.advance(499);
        assert_eq!(fired_at.get(), None);
        scheduler.advance(1);
        assert_eq!(fired_at.get(), Some(500));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn interval_repeats_until_cancelled() {
        let scheduler = ManualScheduler::new(ManualClock::starting_at(0));
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let handle = scheduler.set_interval(100, Rc::new(move || counter.set(counter.get() + 1)));

        scheduler.advance(350);
        assert_eq!(count.get(), 3);
        handle.cancel();
        scheduler.advance(1_000);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn dropping_timeout_handle_cancels_it() {
        let scheduler = ManualScheduler::new(ManualClock::starting_at(0));
        let fired = Rc::new(Cell::new(false));
        let sink = Rc::clone(&fired);
        drop(scheduler.set_timeout(10, Box::new(move || sink.set(true))));

        scheduler.advance(100);
        assert!(!fired.get());
    }

    #[test]
    fn timers_fire_in_due_order_and_may_schedule_more() {
        let scheduler = ManualScheduler::new(ManualClock::starting_at(0));
        let order = Rc::new(RefCell::new(Vec::new()));

        let late = Rc::clone(&order);
        scheduler
            .set_timeout(30, Box::new(move || late.borrow_mut().push("late")))
            .detach();

        let early = Rc::clone(&order);
        let nested_scheduler = scheduler.clone();
        scheduler
            .set_timeout(
                10,
                Box::new(move || {
                    early.borrow_mut().push("early");
                    let nested = Rc::clone(&early);
                    nested_scheduler
                        .set_timeout(5, Box::new(move || nested.borrow_mut().push("nested")))
                        .detach();
                }),
            )
            .detach();

        scheduler.advance(40);
        assert_eq!(*order.borrow(), vec!["early", "nested", "late"]);
        assert_eq!(scheduler.clock().now_ms(), 40);
    }
}
