use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use pixgridlib::backend::open_backend;
use pixgridlib::render::RenderApp;
use pixgridlib::{constants, Config};

#[derive(Parser, Debug)]
#[command(name = "pixgrid")]
#[command(about = "Shared pixel canvas with pan, zoom and rate-limited placement", long_about = None)]
struct Args {
    /// JSON file used to persist pixels and session state (in-memory if omitted)
    #[arg(short, long)]
    store: Option<String>,

    /// Attribute placements to this user id instead of "anonymous"
    #[arg(short, long)]
    user: Option<String>,

    /// Window width in pixels
    #[arg(long, default_value_t = constants::DEFAULT_WIDTH)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = constants::DEFAULT_HEIGHT)]
    height: u32,

    /// Start in fullscreen mode
    #[arg(short, long)]
    fullscreen: bool,

    /// Start with the grid overlay hidden
    #[arg(long)]
    no_grid: bool,

    /// Minimum time between placements in milliseconds
    #[arg(long, default_value_t = constants::COOLDOWN_TIME_MS)]
    cooldown_ms: u64,

    /// Quiet period before a placement is written to the store, in milliseconds
    #[arg(long, default_value_t = constants::CACHE_DEBOUNCE_TIME_MS)]
    debounce_ms: u64,

    /// Cells per chunk edge
    #[arg(long, default_value_t = constants::CHUNK_SIZE)]
    chunk_size: u32,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            width: args.width,
            height: args.height,
            fullscreen: args.fullscreen,
            show_grid: !args.no_grid,
            cooldown_ms: args.cooldown_ms,
            debounce_ms: args.debounce_ms,
            chunk_size: args.chunk_size,
            store_path: args.store,
            owner_id: args.user,
            ..Config::default()
        }
    }
}

fn main() {
    env_logger::init();
    let config = Config::from(Args::parse());

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    log::info!("{}", config.help_text());

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let backend = open_backend(config.store_path.as_deref());
    let mut app = match pollster::block_on(RenderApp::new(config, backend)) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop terminated with error: {}", e);
    }
}
