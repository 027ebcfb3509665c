//! Browser timer adapter backed by `gloo-timers` (`setTimeout` / `setInterval`).

use std::rc::Rc;

use platform_host::{Scheduler, Subscription};

#[derive(Debug, Clone, Copy, Default)]
/// Browser scheduler. On non-wasm targets timers are accepted but never fire.
pub struct WebScheduler;

#[cfg(target_arch = "wasm32")]
fn clamp_delay(delay_ms: u64) -> u32 {
    u32::try_from(delay_ms).unwrap_or(u32::MAX)
}

impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay_ms: u64, callback: Box<dyn FnOnce()>) -> Subscription {
        #[cfg(target_arch = "wasm32")]
        {
            use std::cell::RefCell;

            use gloo_timers::callback::Timeout;

            let slot = Rc::new(RefCell::new(Some(Timeout::new(
                clamp_delay(delay_ms),
                callback,
            ))));
            let detach_slot = Rc::clone(&slot);
            Subscription::new(move || {
                if let Some(timeout) = slot.borrow_mut().take() {
                    timeout.cancel();
                }
            })
            .on_detach(move || {
                if let Some(timeout) = detach_slot.borrow_mut().take() {
                    timeout.forget();
                }
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (delay_ms, callback);
            Subscription::noop()
        }
    }

    fn set_interval(&self, period_ms: u64, callback: Rc<dyn Fn()>) -> Subscription {
        #[cfg(target_arch = "wasm32")]
        {
            use std::cell::RefCell;

            use gloo_timers::callback::Interval;

            let slot = Rc::new(RefCell::new(Some(Interval::new(
                clamp_delay(period_ms),
                move || callback(),
            ))));
            let detach_slot = Rc::clone(&slot);
            Subscription::new(move || {
                if let Some(interval) = slot.borrow_mut().take() {
                    interval.cancel();
                }
            })
            .on_detach(move || {
                if let Some(interval) = detach_slot.borrow_mut().take() {
                    interval.forget();
                }
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (period_ms, callback);
            Subscription::noop()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_wasm_timers_never_fire() {
        let fired = Rc::new(Cell::new(false));
        let sink = Rc::clone(&fired);
        WebScheduler
            .set_timeout(0, Box::new(move || sink.set(true)))
            .detach();
        let sink = Rc::clone(&fired);
        WebScheduler
            .set_interval(1, Rc::new(move || sink.set(true)))
            .cancel();
        assert!(!fired.get());
    }
}
