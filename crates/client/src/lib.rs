// WASM client entry point for circle-io
//
// Wires the DOM (canvas, keyboard, join screen) to the `Game` orchestrator
// and runs two animation-frame loops: motion (which also drains the network
// inbox) and render.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use protocol::Color;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, HtmlCanvasElement, HtmlInputElement, KeyboardEvent, Window};

mod camera;
mod config;
mod dom;
mod error;
mod game;
mod input;
mod join;
mod motion;
mod network;
mod render;
mod ui;
mod utils;
mod world;

pub use config::ClientConfig;
pub use error::ClientError;
pub use game::{Game, Notice};

use dom::{EventListener, FrameLoop};
use join::PALETTE;
use network::{Session, SessionEvent, WebSocketTransport, new_inbox};
use render::{Canvas2dSurface, Renderer};
use ui::Ui;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Handle JS holds on the running client. `destroy()` (or `free()`) tears
/// everything down.
#[wasm_bindgen]
pub struct GameClientWrapper {
    app: Option<App>,
}

#[wasm_bindgen]
impl GameClientWrapper {
    /// `config` is a plain object (`serverUrl`, `canvasId`, `logLevel`);
    /// missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<GameClientWrapper, JsValue> {
        init();
        let config = ClientConfig::from_js(config)?;
        utils::init_logging(config.level());
        let app = App::mount(&config)?;
        Ok(GameClientWrapper { app: Some(app) })
    }

    /// Submit the join form programmatically. `color` is `#rrggbb`.
    pub fn join(&self, name: &str, color: &str) -> Result<(), JsValue> {
        let app = self.app.as_ref().ok_or(ClientError::Disconnected)?;
        let color = Color::from_hex(color).map_err(ClientError::from)?;
        let result = app.game.borrow_mut().submit_join(name, color);
        app.flush_notices();
        result.map_err(Into::into)
    }

    pub fn is_connected(&self) -> bool {
        self.app.as_ref().is_some_and(|app| app.connected.get())
    }

    pub fn is_joined(&self) -> bool {
        self.app
            .as_ref()
            .and_then(|app| app.game.try_borrow().ok().map(|game| game.is_joined()))
            .unwrap_or(false)
    }

    /// Milliseconds since the last world snapshot arrived.
    pub fn snapshot_age_ms(&self) -> Option<f64> {
        let app = self.app.as_ref()?;
        let updated_at = app.game.try_borrow().ok()?.world().updated_at()?;
        Some((utils::now() - updated_at).max(0.0))
    }

    /// Number of world snapshots applied so far.
    pub fn snapshot_revision(&self) -> u64 {
        self.app
            .as_ref()
            .and_then(|app| app.game.try_borrow().ok().map(|game| game.world().revision()))
            .unwrap_or(0)
    }

    /// Stop both loops, remove every listener and close the socket.
    pub fn destroy(&mut self) {
        if let Some(app) = self.app.take() {
            app.teardown();
        }
    }
}

impl Drop for GameClientWrapper {
    fn drop(&mut self) {
        self.destroy();
    }
}

struct App {
    game: Rc<RefCell<Game>>,
    ui: Rc<Ui>,
    connected: Rc<Cell<bool>>,
    loops: Vec<FrameLoop>,
    listeners: Vec<EventListener>,
}

impl App {
    fn mount(config: &ClientConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;

        let canvas = document
            .get_element_by_id(&config.canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("#{} not found", config.canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()?;
        let surface = Rc::new(RefCell::new(Canvas2dSurface::new(canvas)?));
        fit_to_window(&window, &surface.borrow());

        let inbox = new_inbox();
        let transport = WebSocketTransport::connect(&config.server_url, Rc::clone(&inbox))?;
        let mut session = Session::new(Box::new(transport), inbox);

        let connected = Rc::new(Cell::new(false));
        {
            let connected = Rc::clone(&connected);
            session.subscribe(move |event| match event {
                SessionEvent::Connected => connected.set(true),
                SessionEvent::Disconnected => connected.set(false),
                _ => {}
            });
        }

        let game = Rc::new(RefCell::new(Game::new(session)));
        let ui = Rc::new(Ui::new(document)?);
        ui.set_connected(false);
        if let Some(color) = utils::random_choice(&PALETTE) {
            ui.set_color(color);
        }

        let listeners = install_listeners(&window, &game, &ui, &surface)?;

        let motion = {
            let game = Rc::clone(&game);
            let ui = Rc::clone(&ui);
            FrameLoop::start("motion", move |timestamp| {
                let notices = {
                    let mut game = game.borrow_mut();
                    game.tick(timestamp);
                    game.take_notices()
                };
                for notice in &notices {
                    ui.apply(notice);
                }
            })?
        };

        let render = {
            let game = Rc::clone(&game);
            let renderer = Renderer::new();
            FrameLoop::start("render", move |_timestamp| {
                let _ = game.borrow().draw(&renderer, &mut *surface.borrow_mut());
            })?
        };

        tracing::info!("client mounted on #{}", config.canvas_id);
        Ok(Self {
            game,
            ui,
            connected,
            loops: vec![motion, render],
            listeners,
        })
    }

    fn flush_notices(&self) {
        let notices = match self.game.try_borrow_mut() {
            Ok(mut game) => game.take_notices(),
            Err(_) => return,
        };
        for notice in &notices {
            self.ui.apply(notice);
        }
    }

    fn teardown(self) {
        let App {
            game,
            loops,
            listeners,
            ..
        } = self;
        drop(loops);
        drop(listeners);
        match game.try_borrow_mut() {
            Ok(mut game) => game.shutdown(),
            Err(_) => tracing::warn!("game busy during teardown; socket closes on drop"),
        }
        tracing::info!("client destroyed");
    }
}

fn install_listeners(
    window: &Window,
    game: &Rc<RefCell<Game>>,
    ui: &Rc<Ui>,
    surface: &Rc<RefCell<Canvas2dSurface>>,
) -> Result<Vec<EventListener>, JsValue> {
    let target: &EventTarget = window.as_ref();
    let input = game.borrow().input_state();
    let mut listeners = Vec::with_capacity(6);

    {
        let input = Rc::clone(&input);
        listeners.push(EventListener::new(target, "keydown", move |event: KeyboardEvent| {
            if is_text_input_focused() {
                return; // typing a name
            }
            let key = event.key();
            if input::is_movement_key(&key) {
                event.prevent_default();
            }
            input.borrow_mut().on_key_down(&key);
        })?);
    }

    {
        let input = Rc::clone(&input);
        listeners.push(EventListener::new(target, "keyup", move |event: KeyboardEvent| {
            input.borrow_mut().on_key_up(&event.key());
        })?);
    }

    {
        let input = Rc::clone(&input);
        listeners.push(EventListener::new(target, "blur", move |_: Event| {
            input.borrow_mut().release_all();
        })?);
    }

    {
        let surface = Rc::clone(surface);
        let resize_window = window.clone();
        listeners.push(EventListener::new(target, "resize", move |_: Event| {
            fit_to_window(&resize_window, &surface.borrow());
        })?);
    }

    {
        let game = Rc::clone(game);
        let ui_ref = Rc::clone(ui);
        listeners.push(EventListener::new(
            ui.join_button().as_ref(),
            "click",
            move |_: Event| submit_form(&game, &ui_ref),
        )?);
    }

    {
        let game = Rc::clone(game);
        let ui_ref = Rc::clone(ui);
        listeners.push(EventListener::new(
            ui.name_input().as_ref(),
            "keydown",
            move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    event.prevent_default();
                    submit_form(&game, &ui_ref);
                }
            },
        )?);
    }

    Ok(listeners)
}

fn submit_form(game: &RefCell<Game>, ui: &Ui) {
    let (name, color) = ui.form(PALETTE[0]);
    let Ok(mut game) = game.try_borrow_mut() else {
        return;
    };
    // Failures come back as notices.
    let _ = game.submit_join(&name, color);
    for notice in game.take_notices() {
        ui.apply(&notice);
    }
}

fn fit_to_window(window: &Window, surface: &Canvas2dSurface) {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
    };
    surface.resize(dimension(window.inner_width()), dimension(window.inner_height()));
}

/// Returns true when a text field has focus (the name field).
/// Used to suppress movement keys while the user is typing; the color
/// picker does not count.
fn is_text_input_focused() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .is_some_and(|input| ui::is_text_input_type(&input.type_()))
}
