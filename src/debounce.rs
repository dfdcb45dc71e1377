use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::SiteConfig;

pub trait TimerBackend {
    type Handle;

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<Self::Handle>;

    fn clear_timeout(&self, handle: Self::Handle);
}

pub struct Debouncer<B: TimerBackend> {
    backend: B,
    wait: Duration,
    pending: Option<B::Handle>,
    armed: Rc<Cell<bool>>,
}

impl<B: TimerBackend> Debouncer<B> {
    pub fn new(backend: B, wait: Duration) -> Self {
        Self {
            backend,
            wait,
            pending: None,
            armed: Rc::new(Cell::new(false)),
        }
    }

    /// Reschedules `callback` and reports whether this call opened a new
    /// burst (nothing was pending).
    pub fn schedule<F>(&mut self, callback: F) -> bool
    where
        F: FnOnce() + 'static,
    {
        let leading = !self.armed.get();
        self.cancel();

        let armed = self.armed.clone();
        let handle = self.backend.set_timeout(
            self.wait,
            Box::new(move || {
                armed.set(false);
                callback();
            }),
        );

        self.armed.set(handle.is_some());
        self.pending = handle;
        leading
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.backend.clear_timeout(handle);
        }
        self.armed.set(false);
    }

    pub fn is_pending(&self) -> bool {
        self.armed.get()
    }
}

impl<B: TimerBackend> Drop for Debouncer<B> {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct ScrollOrchestrator<B: TimerBackend> {
    scroll: Debouncer<B>,
    resize: Debouncer<B>,
}

impl<B: TimerBackend + Clone> ScrollOrchestrator<B> {
    pub fn new(backend: B, config: &SiteConfig) -> Self {
        Self {
            scroll: Debouncer::new(backend.clone(), config.scroll_debounce),
            resize: Debouncer::new(backend, config.resize_debounce),
        }
    }
}

impl<B: TimerBackend> ScrollOrchestrator<B> {
    pub fn on_scroll<L, T>(&mut self, offset: f64, leading: L, trailing: T)
    where
        L: FnOnce(f64),
        T: FnOnce(f64) + 'static,
    {
        if self.scroll.schedule(move || trailing(offset)) {
            leading(offset);
        }
    }

    pub fn on_resize<T>(&mut self, width: f64, trailing: T)
    where
        T: FnOnce(f64) + 'static,
    {
        self.resize.schedule(move || trailing(width));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    struct ScheduledTimer {
        id: u64,
        due: Duration,
        callback: Box<dyn FnOnce()>,
    }

    #[derive(Default)]
    struct ManualState {
        now: Duration,
        next_id: u64,
        queue: Vec<ScheduledTimer>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct ManualTimers {
        state: Rc<RefCell<ManualState>>,
    }

    impl ManualTimers {
        pub(crate) fn advance(&self, by: Duration) {
            let target = self.state.borrow().now + by;

            loop {
                let next = {
                    let mut state = self.state.borrow_mut();
                    let due_index = state
                        .queue
                        .iter()
                        .enumerate()
                        .filter(|(_, timer)| timer.due <= target)
                        .min_by_key(|(_, timer)| (timer.due, timer.id))
                        .map(|(index, _)| index);

                    due_index.map(|index| {
                        let timer = state.queue.remove(index);
                        state.now = timer.due;
                        timer.callback
                    })
                };

                match next {
                    Some(callback) => callback(),
                    None => break,
                }
            }

            self.state.borrow_mut().now = target;
        }

        pub(crate) fn pending(&self) -> usize {
            self.state.borrow().queue.len()
        }
    }

    impl TimerBackend for ManualTimers {
        type Handle = u64;

        fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Option<u64> {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            let due = state.now + delay;
            state.queue.push(ScheduledTimer { id, due, callback });
            Some(id)
        }

        fn clear_timeout(&self, handle: u64) {
            self.state.borrow_mut().queue.retain(|timer| timer.id != handle);
        }
    }
}
