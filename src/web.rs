// Web-specific entry point and JavaScript controls
use std::sync::{Mutex, MutexGuard};
use wasm_bindgen::prelude::*;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::backend::MemoryBackend;
use crate::color::Color;
use crate::engine::CanvasEngine;
use crate::notify::Session;
use crate::{render::RenderApp, Config};

/// Id of the `<canvas>` element the app draws into
pub(crate) const CANVAS_ID: &str = "pixgrid-canvas";

/// Requests from JavaScript, applied on the next redraw
#[derive(Debug, Clone)]
pub(crate) enum WebCommand {
    SetColor(Color),
    ToggleGrid,
    ResetViewport,
    SetOnlineUsers(u32),
    UserJoined,
    UserLeft,
    SetSession(Session),
}

static COMMANDS: Mutex<Vec<WebCommand>> = Mutex::new(Vec::new());

// State exposed to JavaScript (status bar, colour swatch)
static STATUS: Mutex<String> = Mutex::new(String::new());
static SELECTED_COLOR: Mutex<String> = Mutex::new(String::new());

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn push(command: WebCommand) {
    lock(&COMMANDS).push(command);
}

pub(crate) fn drain_commands() -> Vec<WebCommand> {
    std::mem::take(&mut *lock(&COMMANDS))
}

pub(crate) fn apply_command(engine: &mut CanvasEngine, command: WebCommand) {
    match command {
        WebCommand::SetColor(color) => engine.set_selected_color(color),
        WebCommand::ToggleGrid => engine.toggle_grid(),
        WebCommand::ResetViewport => engine.reset_viewport(),
        WebCommand::SetOnlineUsers(count) => engine.presence_mut().sync(count),
        WebCommand::UserJoined => engine.presence_mut().join(),
        WebCommand::UserLeft => engine.presence_mut().leave(),
        WebCommand::SetSession(session) => engine.set_session(session),
    }
}

pub(crate) fn publish_status(engine: &CanvasEngine, now: u64) {
    *lock(&STATUS) = engine.status_line(now);
    *lock(&SELECTED_COLOR) = engine.selected_color().to_hex();
}

/// Select the drawing colour (`#RGB` or `#RRGGBB`)
#[wasm_bindgen]
pub fn set_color(hex: &str) -> Result<(), JsValue> {
    let color: Color = hex.parse().map_err(|e| JsValue::from_str(&format!("{}", e)))?;
    push(WebCommand::SetColor(color));
    Ok(())
}

#[wasm_bindgen]
pub fn toggle_grid() {
    push(WebCommand::ToggleGrid);
}

/// Request a viewport reset (called from JavaScript)
#[wasm_bindgen]
pub fn reset_viewport() {
    push(WebCommand::ResetViewport);
}

/// Presence sync: authoritative number of connected sessions
#[wasm_bindgen]
pub fn set_online_users(count: u32) {
    push(WebCommand::SetOnlineUsers(count));
}

#[wasm_bindgen]
pub fn user_joined() {
    push(WebCommand::UserJoined);
}

#[wasm_bindgen]
pub fn user_left() {
    push(WebCommand::UserLeft);
}

/// Sign in as `user_id`, or pass `undefined` to become anonymous
#[wasm_bindgen]
pub fn set_user(user_id: Option<String>) {
    let session = match user_id {
        Some(id) if !id.trim().is_empty() => Session::signed_in(id),
        _ => Session::anonymous(),
    };
    push(WebCommand::SetSession(session));
}

/// Coordinates, cooldown timer, online count and latest notification
#[wasm_bindgen]
pub fn get_status() -> String {
    lock(&STATUS).clone()
}

#[wasm_bindgen]
pub fn get_selected_color() -> String {
    lock(&SELECTED_COLOR).clone()
}

#[wasm_bindgen]
pub fn help_text() -> String {
    Config::default().help_text()
}

/// Initialize the web application with default settings
#[wasm_bindgen]
pub async fn start() -> Result<(), JsValue> {
    start_with_params(None, true).await
}

/// Start the application for an optional signed-in user
#[wasm_bindgen]
pub async fn start_with_params(user_id: Option<String>, show_grid: bool) -> Result<(), JsValue> {
    // Set up panic hook and logger only once (ignore errors if already initialized)
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
        let _ = console_log::init_with_level(log::Level::Info);
    });

    log::info!("Starting pixgrid (user: {})", user_id.as_deref().unwrap_or("anonymous"));

    // Drop anything queued by a previous run
    drain_commands();

    let config = Config {
        owner_id: user_id.filter(|id| !id.trim().is_empty()),
        show_grid,
        ..Config::default()
    };

    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return Err(JsValue::from_str(&e.to_string()));
    }

    let event_loop = EventLoop::new()
        .map_err(|e| JsValue::from_str(&format!("Failed to create event loop: {:?}", e)))?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let app = RenderApp::new(config, Box::new(MemoryBackend::new()))
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    // On web, run_app doesn't return - it transfers control to the browser
    let _ = event_loop.run_app(&mut { app });

    Ok(())
}
