use super::error::RenderError;
use crate::config::{DEFAULT_ANIMATION_INTERVAL, DEFAULT_STATIC_INTERVAL};
use crate::definitions::{Address, Word};
use crate::memory::{Region, SharedMemory};
use crate::screen::{Bitmap, ScreenCodec, ScreenResult};

use log::{debug, error, trace};
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub type RenderResult<T = ()> = Result<T, RenderError>;

/// Whatever shows the screen to the user.
pub trait Display {
    fn present(&mut self, bitmap: &Bitmap) -> Result<(), Box<dyn Error>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Static,
    Animation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub static_interval: Duration,
    pub animation_interval: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            static_interval: DEFAULT_STATIC_INTERVAL,
            animation_interval: DEFAULT_ANIMATION_INTERVAL,
        }
    }
}

impl RenderConfig {
    pub fn interval(&self, mode: RenderMode) -> Duration {
        match mode {
            RenderMode::Static => self.static_interval,
            RenderMode::Animation => self.animation_interval,
        }
    }
}

/// Switches the render rate from any thread.
#[derive(Clone, Default)]
pub struct RenderControl {
    animating: Arc<AtomicBool>,
}

impl RenderControl {
    pub fn start_animation(&self) {
        debug!("render mode: animation");
        self.animating.store(true, Ordering::Release);
    }

    pub fn stop_animation(&self) {
        debug!("render mode: static");
        self.animating.store(false, Ordering::Release);
    }

    pub fn mode(&self) -> RenderMode {
        if self.animating.load(Ordering::Acquire) {
            RenderMode::Animation
        } else {
            RenderMode::Static
        }
    }
}

/// The decoded screen, double buffered.
///
/// A full refresh decodes into the back buffer and swaps it to the front once it is
/// complete, so the presented bitmap is never half decoded.
pub struct Frame {
    codec: ScreenCodec,
    region: Region,
    front: Bitmap,
    back: Bitmap,
    // the words the front buffer was decoded from
    words: Vec<Word>,
    scratch: Vec<Word>,
    dirty: bool,
}

impl Frame {
    pub fn new(codec: ScreenCodec, region: Region) -> ScreenResult<Self> {
        let words = vec![0; region.len()];
        let front = codec.decode(&words)?;
        let back = front.clone();
        Ok(Self {
            codec,
            region,
            front,
            back,
            scratch: words.clone(),
            words,
            dirty: true,
        })
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.front
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clears the redraw flag and returns its old value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Decodes the whole screen region again if it changed since the last refresh.
    pub fn refresh(&mut self, memory: &SharedMemory) -> RenderResult<bool> {
        {
            // only copy while holding the lock, decoding happens afterwards
            let memory = memory.read()?;
            self.scratch.clear();
            self.scratch.extend_from_slice(memory.slice(self.region)?);
        }

        if self.scratch == self.words {
            return Ok(false);
        }

        self.codec.decode_into(&self.scratch, &mut self.back)?;
        std::mem::swap(&mut self.front, &mut self.back);
        std::mem::swap(&mut self.words, &mut self.scratch);
        self.dirty = true;
        Ok(true)
    }

    /// Applies a single word write to the front buffer. Writes outside of the screen region
    /// are ignored.
    pub fn patch(&mut self, address: Address, value: Word) -> ScreenResult<bool> {
        if !self.region.contains(address) {
            return Ok(false);
        }

        let index = address - self.region.start;
        self.codec.decode_one(&mut self.front, index, value)?;
        self.words[index] = value;
        self.dirty = true;
        Ok(true)
    }
}

pub struct Renderer {
    memory: SharedMemory,
    frame: Frame,
    config: RenderConfig,
    control: RenderControl,
    frames: u64,
}

impl Renderer {
    pub fn new(
        memory: SharedMemory,
        codec: ScreenCodec,
        region: Region,
        config: RenderConfig,
    ) -> RenderResult<Self> {
        Ok(Self {
            memory,
            frame: Frame::new(codec, region)?,
            config,
            control: RenderControl::default(),
            frames: 0,
        })
    }

    pub fn control(&self) -> RenderControl {
        self.control.clone()
    }

    pub fn mode(&self) -> RenderMode {
        self.control.mode()
    }

    pub fn interval(&self) -> Duration {
        self.config.interval(self.mode())
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Number of frames handed to the display so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn patch(&mut self, address: Address, value: Word) -> RenderResult<bool> {
        Ok(self.frame.patch(address, value)?)
    }

    /// Picks up changes of the screen memory and presents the frame if anything changed.
    pub fn tick(&mut self, display: &mut dyn Display) -> RenderResult<bool> {
        self.frame.refresh(&self.memory)?;
        if !self.frame.take_dirty() {
            return Ok(false);
        }

        display
            .present(self.frame.bitmap())
            .map_err(|e| RenderError::Display(e.to_string()))?;
        self.frames += 1;
        trace!("presented frame {}", self.frames);
        Ok(true)
    }

    /// Moves the render loop to its own thread.
    pub fn spawn<D>(mut self, mut display: D) -> RenderResult<RenderHandle<D>>
    where
        D: Display + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("render".to_owned())
            .spawn(move || {
                let mut result = Ok(());
                while !thread_stop.load(Ordering::Acquire) {
                    if let Err(e) = self.tick(&mut display) {
                        error!("rendering stopped: {}", e);
                        result = Err(e);
                        break;
                    }
                    thread::park_timeout(self.interval());
                }
                (self, display, result)
            })
            .map_err(|e| RenderError::Thread(e.to_string()))?;

        Ok(RenderHandle { stop, thread })
    }
}

pub struct RenderHandle<D> {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<(Renderer, D, RenderResult)>,
}

impl<D> RenderHandle<D> {
    /// Stops the render thread and gives back the renderer and the display.
    pub fn stop(self) -> RenderResult<(Renderer, D)> {
        self.stop.store(true, Ordering::Release);
        self.thread.thread().unpark();

        let (renderer, display, result) = self
            .thread
            .join()
            .map_err(|_| RenderError::Thread("the render thread panicked".to_owned()))?;
        result.map(|_| (renderer, display))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::SCREEN_START;
    use crate::memory::{RegionKind, WordMemory};
    use crate::screen::ScreenError;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Bitmap>,
    }

    impl Display for Recorder {
        fn present(&mut self, bitmap: &Bitmap) -> Result<(), Box<dyn Error>> {
            self.frames.push(bitmap.clone());
            Ok(())
        }
    }

    fn small_region() -> Region {
        Region::new(RegionKind::Screen, 4, 8)
    }

    fn small_renderer(memory: &SharedMemory) -> Renderer {
        Renderer::new(
            memory.clone(),
            ScreenCodec::new(2),
            small_region(),
            RenderConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_tick_only_presents_changes() {
        let memory = SharedMemory::new(WordMemory::new(8));
        let mut renderer = small_renderer(&memory);
        let mut display = Recorder::default();

        // the first frame is always shown
        assert!(renderer.tick(&mut display).unwrap());
        assert!(!renderer.tick(&mut display).unwrap());

        memory.write().unwrap().write(5, 0x0003).unwrap();
        assert!(renderer.tick(&mut display).unwrap());
        assert!(!renderer.tick(&mut display).unwrap());

        assert_eq!(2, display.frames.len());
        assert_eq!(2, renderer.frames());
        let last = &display.frames[1];
        assert_eq!(Some(true), last.get(16, 0));
        assert_eq!(Some(true), last.get(17, 0));
        assert_eq!(2, last.count_on());
    }

    #[test]
    fn test_patch_matches_refresh() {
        let memory = SharedMemory::new(WordMemory::new(8));
        let mut renderer = small_renderer(&memory);
        let mut display = Recorder::default();
        renderer.tick(&mut display).unwrap();

        memory.write().unwrap().write(7, -1).unwrap();
        assert_eq!(Ok(true), renderer.patch(7, -1));
        assert_eq!(Ok(false), renderer.patch(2, -1));

        // the patch already shows the write, so refreshing finds nothing new
        assert!(renderer.tick(&mut display).unwrap());
        assert!(!renderer.tick(&mut display).unwrap());

        let mut full = Frame::new(ScreenCodec::new(2), small_region()).unwrap();
        full.refresh(&memory).unwrap();
        assert_eq!(full.bitmap(), renderer.frame().bitmap());
    }

    #[test]
    fn test_malformed_screen_region() {
        let memory = SharedMemory::default();
        let region = Region::new(RegionKind::Screen, SCREEN_START, SCREEN_START + 33);
        let renderer = Renderer::new(memory, ScreenCodec::new(32), region, RenderConfig::default());
        assert!(matches!(
            renderer,
            Err(RenderError::Screen(ScreenError::MalformedRegion { len: 33, .. }))
        ));
    }

    #[test]
    fn test_render_modes() {
        let memory = SharedMemory::default();
        let renderer = Renderer::new(
            memory,
            ScreenCodec::default(),
            Region::SCREEN,
            RenderConfig::default(),
        )
        .unwrap();

        assert_eq!(RenderMode::Static, renderer.mode());
        assert_eq!(Duration::from_millis(500), renderer.interval());

        let control = renderer.control();
        control.start_animation();
        assert_eq!(RenderMode::Animation, renderer.mode());
        assert_eq!(Duration::from_millis(50), renderer.interval());

        control.stop_animation();
        assert_eq!(Duration::from_millis(500), renderer.interval());
    }

    #[test]
    fn test_spawned_renderer() {
        let memory = SharedMemory::new(WordMemory::new(8));
        let renderer = Renderer::new(
            memory.clone(),
            ScreenCodec::new(2),
            small_region(),
            RenderConfig {
                static_interval: Duration::from_millis(1),
                animation_interval: Duration::from_millis(1),
            },
        )
        .unwrap();

        let handle = renderer.spawn(Recorder::default()).unwrap();
        memory.write().unwrap().write(4, 1).unwrap();
        thread::sleep(Duration::from_millis(50));
        let (renderer, display) = handle.stop().unwrap();

        assert!(renderer.frames() >= 1);
        let last = display.frames.last().unwrap();
        assert_eq!(Some(true), last.get(0, 0));
    }
}
