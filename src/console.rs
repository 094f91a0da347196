use hack_console::config::{
    Config, DEFAULT_ANIMATION_INTERVAL, DEFAULT_BATCH_SIZE, DEFAULT_STATIC_INTERVAL,
    DEFAULT_YIELD_INTERVAL,
};
use hack_console::definitions::MEM_SIZE;
use hack_console::image;
use hack_console::memory::{Region, SharedMemory, WordMemory};
use hack_console::programs::Fill;
use hack_console::scheduler::render::Renderer;
use hack_console::scheduler::Scheduler;
use hack_console::screen::ScreenCodec;

use clap::{arg, command, value_parser, ArgAction};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

#[cfg(feature = "desktop")]
mod desktop {
    use hack_console::scheduler::render::Display;
    use hack_console::screen::Bitmap;
    use sdl2::render::{Canvas, Texture};
    use sdl2::video::Window;
    use std::error::Error;

    pub struct SdlDisplay<'t> {
        pub canvas: Canvas<Window>,
        pub texture: Texture<'t>,
    }

    impl Display for SdlDisplay<'_> {
        fn present(&mut self, bitmap: &Bitmap) -> Result<(), Box<dyn Error>> {
            let width = bitmap.width();
            self.texture
                .with_lock(None, |buffer: &mut [u8], pitch: usize| {
                    for (i, on) in bitmap.pixels().iter().enumerate() {
                        let offset = (i / width) * pitch + (i % width) * 3;
                        let color = if *on { 0 } else { 255 };
                        buffer[offset..offset + 3].fill(color);
                    }
                })?;

            self.canvas.clear();
            self.canvas.copy(&self.texture, None, None)?;
            self.canvas.present();
            Ok(())
        }
    }
}

#[cfg(feature = "desktop")]
fn run(
    scheduler: &mut Scheduler,
    mut renderer: Renderer,
    _: Duration,
) -> Result<(), Box<dyn Error>> {
    use hack_console::definitions::{SCREEN_HEIGHT, SCREEN_WIDTH};
    use hack_console::keyboard::raw_key_code;
    use hack_console::scheduler::SchedulerState;
    use sdl2::event::Event;
    use sdl2::pixels::{Color, PixelFormatEnum};

    let logical_width = SCREEN_WIDTH as u32;
    let logical_height = SCREEN_HEIGHT as u32;
    let scale = 2;

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;

    let window = video_subsystem
        .window(
            "Nand to Tetris CPU Emulator",
            logical_width * scale,
            logical_height * scale,
        )
        .position_centered()
        .resizable()
        .build()?;

    let mut canvas = window.into_canvas().build()?;

    // only scale by integers instead of fractions to keep everything crisp
    canvas.set_integer_scale(true)?;
    canvas.set_logical_size(logical_width, logical_height)?;
    canvas.set_draw_color(Color::RGB(255, 255, 255));

    let texture_creator = canvas.texture_creator();
    let texture = texture_creator.create_texture_streaming(
        PixelFormatEnum::RGB24,
        logical_width,
        logical_height,
    )?;
    let mut display = desktop::SdlDisplay { canvas, texture };

    let keyboard = scheduler.keyboard();
    let control = renderer.control();
    control.start_animation();
    scheduler.start()?;

    let mut event_pump = sdl_context.event_pump()?;
    let mut reported_fault = false;
    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'running,
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(code) = raw_key_code(&keycode.to_string()) {
                        keyboard.on_key_down(code)?;
                    }
                }
                Event::KeyUp { .. } => keyboard.on_key_up()?,
                _ => {}
            }
        }

        renderer.tick(&mut display)?;

        if scheduler.state() == SchedulerState::Faulted && !reported_fault {
            // keep showing the last frame, but there is nothing to animate anymore
            if let Some(fault) = scheduler.fault() {
                error!("{}", fault);
            }
            control.stop_animation();
            reported_fault = true;
        }

        std::thread::sleep(renderer.interval());
    }

    control.stop_animation();
    scheduler.stop()?;
    Ok(())
}

#[cfg(not(feature = "desktop"))]
struct LogDisplay;

#[cfg(not(feature = "desktop"))]
impl hack_console::scheduler::render::Display for LogDisplay {
    fn present(&mut self, bitmap: &hack_console::screen::Bitmap) -> Result<(), Box<dyn Error>> {
        log::debug!("frame with {} pixels set", bitmap.count_on());
        Ok(())
    }
}

#[cfg(not(feature = "desktop"))]
fn run(
    scheduler: &mut Scheduler,
    renderer: Renderer,
    run_for: Duration,
) -> Result<(), Box<dyn Error>> {
    info!("You are running in headless mode!");
    info!("If you want to see the program being executed,");
    info!("you will need to compile the application with the desktop feature enabled");

    let control = renderer.control();
    control.start_animation();
    let render = renderer.spawn(LogDisplay)?;

    scheduler.start()?;
    std::thread::sleep(run_for);
    scheduler.stop()?;

    control.stop_animation();
    let (renderer, _) = render.stop()?;
    info!(
        "executed {} steps, rendered {} frames",
        scheduler.steps(),
        renderer.frames()
    );

    match scheduler.fault() {
        Some(fault) => Err(fault.into()),
        None => Ok(()),
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let image_arg = arg!([image] "A RAM image (.16b or .8b) to load before starting")
        .value_parser(value_parser!(PathBuf));

    let step_arg = arg!(-s --steps <STEPS> "How many steps should be executed between yields")
        .value_parser(value_parser!(usize))
        .default_value("1000");

    let yield_arg = arg!(--"yield-ms" <MS> "How long the execution thread yields after each batch")
        .value_parser(value_parser!(u64))
        .default_value("1");

    let static_arg = arg!(--"static-ms" <MS> "Screen refresh interval while idle")
        .value_parser(value_parser!(u64))
        .default_value("500");

    let animation_arg = arg!(--"animation-ms" <MS> "Screen refresh interval while running")
        .value_parser(value_parser!(u64))
        .default_value("50");

    let remap_arg = arg!(--remap <REMAP> "Map a raw key code to another value, e.g. 37=130")
        .action(ArgAction::Append);

    let save_arg = arg!(--save <FILE> "Save the RAM to a .16b or .8b file on exit")
        .value_parser(value_parser!(PathBuf));

    let run_for_arg = arg!(--"run-for" <MS> "How long to run without a window")
        .value_parser(value_parser!(u64))
        .default_value("1000");

    let matches = command!()
        .arg(image_arg)
        .arg(step_arg)
        .arg(yield_arg)
        .arg(static_arg)
        .arg(animation_arg)
        .arg(remap_arg)
        .arg(save_arg)
        .arg(run_for_arg)
        .get_matches();

    let millis = |name: &str| matches.get_one::<u64>(name).copied().map(Duration::from_millis);

    let mut config = Config {
        batch_size: matches
            .get_one::<usize>("steps")
            .copied()
            .unwrap_or(DEFAULT_BATCH_SIZE),
        yield_interval: millis("yield-ms").unwrap_or(DEFAULT_YIELD_INTERVAL),
        static_interval: millis("static-ms").unwrap_or(DEFAULT_STATIC_INTERVAL),
        animation_interval: millis("animation-ms").unwrap_or(DEFAULT_ANIMATION_INTERVAL),
        ..Config::default()
    };
    if let Some(remaps) = matches.get_many::<String>("remap") {
        config.apply_remaps(remaps.map(String::as_str))?;
    }
    config.validate()?;

    let mut memory = WordMemory::new(MEM_SIZE);
    if let Some(path) = matches.get_one::<PathBuf>("image") {
        info!("Loading RAM image {}", path.display());
        memory.bulk_replace(image::load_file(path, memory.capacity())?)?;
    }
    let memory = SharedMemory::new(memory);

    let renderer = Renderer::new(
        memory.clone(),
        ScreenCodec::default(),
        Region::SCREEN,
        config.render_config(),
    )?;
    let mut scheduler = Scheduler::new(
        memory.clone(),
        Fill::new(),
        config.scheduler_config(),
        config.keymap.clone(),
    );

    let run_for = millis("run-for").unwrap_or(Duration::from_secs(1));
    let result = run(&mut scheduler, renderer, run_for);

    // the image is worth saving even if the machine faulted
    if let Some(path) = matches.get_one::<PathBuf>("save") {
        info!("Saving RAM image {}", path.display());
        image::save_file(path, memory.read()?.words())?;
    }

    result
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = try_main() {
        error!("{}", e);
        exit(1);
    }
}
