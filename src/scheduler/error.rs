use crate::memory::MemoryError;
use crate::screen::ScreenError;
use std::{error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    AlreadyRunning,
    StepFailure(String),
    // the step hook was lost together with a thread that could not be spawned or panicked
    MissingStep,
    Thread(String),
    Memory(MemoryError),
}

impl From<MemoryError> for SchedulerError {
    fn from(e: MemoryError) -> Self {
        SchedulerError::Memory(e)
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "The scheduler is already running"),
            Self::StepFailure(e) => write!(f, "Executing a step failed: {}", e),
            Self::MissingStep => write!(f, "There is no step operation left to execute"),
            Self::Thread(e) => write!(f, "Execution thread error: {}", e),
            Self::Memory(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for SchedulerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Memory(MemoryError),
    Screen(ScreenError),
    Display(String),
    Thread(String),
}

impl From<MemoryError> for RenderError {
    fn from(e: MemoryError) -> Self {
        RenderError::Memory(e)
    }
}

impl From<ScreenError> for RenderError {
    fn from(e: ScreenError) -> Self {
        RenderError::Screen(e)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Memory(e) => write!(f, "{}", e),
            Self::Screen(e) => write!(f, "{}", e),
            Self::Display(e) => write!(f, "Could not present frame: {}", e),
            Self::Thread(e) => write!(f, "Render thread error: {}", e),
        }
    }
}

impl error::Error for RenderError {}
