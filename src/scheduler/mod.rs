use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_YIELD_INTERVAL};
use crate::definitions::{Word, KBD};
use crate::keyboard::KeyMap;
use crate::memory::{SharedMemory, WordMemory};
pub use error::{RenderError, SchedulerError};

use log::{debug, info, warn};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub mod error;
pub mod render;

pub type SchedulerResult<T = ()> = Result<T, SchedulerError>;
pub type StepResult = Result<(), Box<dyn Error + Send + Sync>>;

/// The operation the scheduler drives: execute one instruction of whatever machine is
/// attached to the memory.
pub trait Step: Send {
    fn step(&mut self, memory: &mut WordMemory) -> StepResult;
}

impl<F> Step for F
where
    F: FnMut(&mut WordMemory) -> StepResult + Send,
{
    fn step(&mut self, memory: &mut WordMemory) -> StepResult {
        self(memory)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// steps executed before yielding
    pub batch_size: usize,
    pub yield_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            yield_interval: DEFAULT_YIELD_INTERVAL,
        }
    }
}

// the data in these mutexes stays consistent even if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    state: Mutex<SchedulerState>,
    fault: Mutex<Option<SchedulerError>>,
    stop: AtomicBool,
    steps: Mutex<u64>,
    stepped: Condvar,
}

impl Shared {
    fn state(&self) -> SchedulerState {
        *lock(&self.state)
    }

    fn set_state(&self, state: SchedulerState) {
        *lock(&self.state) = state;
    }

    fn record_fault(&self, error: SchedulerError) {
        *lock(&self.fault) = Some(error);
        self.set_state(SchedulerState::Faulted);
        // wake up observers, there won't be any more steps
        let _steps = lock(&self.steps);
        self.stepped.notify_all();
    }

    fn notify_step(&self) {
        *lock(&self.steps) += 1;
        self.stepped.notify_all();
    }
}

/// Writes key events into the keyboard register. Can be cloned and moved to the thread
/// that receives the platform's input events.
#[derive(Clone)]
pub struct Keyboard {
    memory: SharedMemory,
    keymap: Arc<KeyMap>,
    shared: Arc<Shared>,
}

impl Keyboard {
    pub fn on_key_down(&self, raw: u16) -> SchedulerResult {
        self.set_key(self.keymap.translate(raw))
    }

    pub fn on_key_up(&self) -> SchedulerResult {
        self.set_key(0)
    }

    fn set_key(&self, code: Word) -> SchedulerResult {
        if self.shared.state() == SchedulerState::Faulted {
            debug!("ignoring key {} while the machine is faulted", code);
            return Ok(());
        }

        debug!("keyboard register = {}", code);
        self.memory.write()?.write(KBD, code)?;
        Ok(())
    }
}

/// Runs a `Step` on its own thread, in batches of `batch_size` steps with a short sleep in
/// between, so the render loop and input handling never starve.
pub struct Scheduler {
    memory: SharedMemory,
    config: SchedulerConfig,
    keyboard: Keyboard,
    shared: Arc<Shared>,
    hook: Option<Box<dyn Step>>,
    thread: Option<JoinHandle<Box<dyn Step>>>,
}

impl Scheduler {
    pub fn new(
        memory: SharedMemory,
        hook: impl Step + 'static,
        config: SchedulerConfig,
        keymap: KeyMap,
    ) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState::Idle),
            fault: Mutex::new(None),
            stop: AtomicBool::new(false),
            steps: Mutex::new(0),
            stepped: Condvar::new(),
        });

        let keyboard = Keyboard {
            memory: memory.clone(),
            keymap: Arc::new(keymap),
            shared: Arc::clone(&shared),
        };

        Self {
            memory,
            config,
            keyboard,
            shared,
            hook: Some(Box::new(hook)),
            thread: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    /// The error that moved the scheduler into the faulted state.
    pub fn fault(&self) -> Option<SchedulerError> {
        lock(&self.shared.fault).clone()
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn keyboard(&self) -> Keyboard {
        self.keyboard.clone()
    }

    pub fn on_key_down(&self, raw: u16) -> SchedulerResult {
        self.keyboard.on_key_down(raw)
    }

    pub fn on_key_up(&self) -> SchedulerResult {
        self.keyboard.on_key_up()
    }

    /// Total number of steps executed so far.
    pub fn steps(&self) -> u64 {
        *lock(&self.shared.steps)
    }

    /// Blocks until more than `seen` steps were executed or the timeout elapsed and returns
    /// the current step count.
    pub fn wait_for_step(&self, seen: u64, timeout: Duration) -> u64 {
        let steps = lock(&self.shared.steps);
        let (steps, _) = self
            .shared
            .stepped
            .wait_timeout_while(steps, timeout, |steps| {
                *steps <= seen && self.shared.state() == SchedulerState::Running
            })
            .unwrap_or_else(PoisonError::into_inner);
        *steps
    }

    pub fn start(&mut self) -> SchedulerResult {
        if self.state() == SchedulerState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }

        // a faulted thread exits on its own, but still owns the hook until joined
        self.join()?;
        let hook = self.hook.take().ok_or(SchedulerError::MissingStep)?;

        *lock(&self.shared.fault) = None;
        self.shared.stop.store(false, Ordering::Release);
        self.shared.set_state(SchedulerState::Running);

        let memory = self.memory.clone();
        let shared = Arc::clone(&self.shared);
        let config = self.config;

        let spawned = thread::Builder::new()
            .name("execution".to_owned())
            .spawn(move || run(hook, memory, shared, config));

        match spawned {
            Ok(handle) => {
                info!(
                    "execution started ({} steps per {:?} yield)",
                    config.batch_size, config.yield_interval
                );
                self.thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                let error = SchedulerError::Thread(e.to_string());
                self.shared.record_fault(error.clone());
                Err(error)
            }
        }
    }

    /// Asks the execution thread to exit at its next yield and waits for it.
    pub fn stop(&mut self) -> SchedulerResult {
        self.shared.stop.store(true, Ordering::Release);
        if let Some(handle) = &self.thread {
            handle.thread().unpark();
        }

        self.join()?;

        if self.state() == SchedulerState::Running {
            self.shared.set_state(SchedulerState::Stopped);
        }
        info!("execution stopped after {} steps", self.steps());
        Ok(())
    }

    fn join(&mut self) -> SchedulerResult {
        if let Some(handle) = self.thread.take() {
            match handle.join() {
                Ok(hook) => self.hook = Some(hook),
                Err(_) => {
                    let error = SchedulerError::Thread("the execution thread panicked".to_owned());
                    self.shared.record_fault(error.clone());
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.thread.is_some() {
            if let Err(e) = self.stop() {
                warn!("could not stop execution: {}", e);
            }
        }
    }
}

fn run(
    mut hook: Box<dyn Step>,
    memory: SharedMemory,
    shared: Arc<Shared>,
    config: SchedulerConfig,
) -> Box<dyn Step> {
    while !shared.stop.load(Ordering::Acquire) {
        for _ in 0..config.batch_size {
            // the lock is only held for a single step, so key events and the renderer
            // can get in between any two steps
            let result = match memory.write() {
                Ok(mut memory) => hook
                    .step(&mut memory)
                    .map_err(|e| SchedulerError::StepFailure(e.to_string())),
                Err(e) => Err(e.into()),
            };

            if let Err(e) = result {
                warn!("halting execution: {}", e);
                shared.record_fault(e);
                return hook;
            }

            shared.notify_step();
        }

        thread::park_timeout(config.yield_interval);
    }

    shared.set_state(SchedulerState::Stopped);
    hook
}
