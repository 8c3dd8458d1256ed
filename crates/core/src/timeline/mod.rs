use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Flag raised from outside the loop (typically a Ctrl-C handler) to ask it
/// to stop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Source of blocking delays for the alert loop.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

impl<S: Sleeper + ?Sized> Sleeper for Box<S> {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Sleeps the current thread. When attached to a [`ShutdownSignal`] the
/// sleep is cut short once the signal fires.
#[derive(Debug, Default, Clone)]
pub struct ThreadSleeper {
    shutdown: Option<ShutdownSignal>,
}

impl ThreadSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interruptible(shutdown: ShutdownSignal) -> Self {
        Self {
            shutdown: Some(shutdown),
        }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        let Some(shutdown) = &self.shutdown else {
            std::thread::sleep(duration);
            return;
        };

        // A deadline past what `Instant` can represent means sleep until shutdown.
        let deadline = Instant::now().checked_add(duration);
        loop {
            if shutdown.is_triggered() {
                return;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    SLEEP_SLICE.min(deadline - now)
                }
                None => SLEEP_SLICE,
            };
            std::thread::sleep(slice);
        }
    }
}
