// DOM lifecycle helpers: listeners that detach on drop, cancellable frame loops
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget};

/// An event listener that is removed from its target when dropped.
pub struct EventListener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new<E, F>(target: &EventTarget, event: &'static str, mut handler: F) -> Result<Self, JsValue>
    where
        E: JsCast,
        F: FnMut(E) + 'static,
    {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            handler(event.unchecked_into::<E>());
        });
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Run/stop bookkeeping for one frame loop, independent of the browser.
#[derive(Debug)]
pub struct LoopControl {
    running: Cell<bool>,
    pending: Cell<Option<i32>>,
}

impl LoopControl {
    pub fn new() -> Self {
        Self {
            running: Cell::new(true),
            pending: Cell::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Called when a frame fires. Runs `frame` only while the loop is live
    /// and returns whether another frame should be requested.
    pub fn run_frame(&self, frame: impl FnOnce()) -> bool {
        self.pending.set(None);
        if !self.running.get() {
            return false;
        }
        frame();
        self.running.get()
    }

    pub fn set_pending(&self, handle: i32) {
        self.pending.set(Some(handle));
    }

    /// Stop the loop. Returns the outstanding request, if any, so the caller
    /// can cancel it.
    pub fn halt(&self) -> Option<i32> {
        self.running.set(false);
        self.pending.take()
    }
}

impl Default for LoopControl {
    fn default() -> Self {
        Self::new()
    }
}

struct FrameState {
    control: LoopControl,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameState {
    fn request(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return Ok(());
        };
        let handle = window.request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.control.set_pending(handle);
        Ok(())
    }
}

/// A `requestAnimationFrame` loop that stops scheduling itself once
/// stopped or dropped. The callback receives the frame timestamp in ms.
pub struct FrameLoop {
    name: &'static str,
    state: Rc<FrameState>,
}

impl FrameLoop {
    pub fn start<F>(name: &'static str, mut frame: F) -> Result<Self, JsValue>
    where
        F: FnMut(f64) + 'static,
    {
        let state = Rc::new(FrameState {
            control: LoopControl::new(),
            callback: RefCell::new(None),
        });

        // Weak so the closure does not keep its own loop alive.
        let weak = Rc::downgrade(&state);
        let closure = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if state.control.run_frame(|| frame(timestamp)) {
                if let Err(e) = state.request() {
                    tracing::error!("{name}: failed to request next frame: {e:?}");
                }
            }
        });
        *state.callback.borrow_mut() = Some(closure);
        state.request()?;

        tracing::debug!("{name}: frame loop started");
        Ok(Self { name, state })
    }

    /// Stop scheduling frames and cancel the outstanding request.
    pub fn stop(&self) {
        if !self.state.control.is_running() {
            return;
        }
        if let Some(handle) = self.state.control.halt() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
        tracing::debug!("{}: frame loop stopped", self.name);
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
        self.state.callback.borrow_mut().take();
    }
}
