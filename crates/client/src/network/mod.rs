// Connection manager: one session to the server over a binary WebSocket
//
// Socket callbacks never touch game state. They only push `Inbound` items
// into a shared inbox; the motion loop drains it once per frame through
// `Session::poll`, which decodes frames and fans the resulting events out.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use js_sys::{ArrayBuffer, Uint8Array};
use protocol::packets::{ClientMessage, ServerMessage, ServerOpcode};
use protocol::{Color, Player, Snapshot};
use wasm_bindgen::prelude::*;
use web_sys::{BinaryType, CloseEvent, MessageEvent, WebSocket};

use crate::error::ClientError;

/// Raw transport happenings, queued in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Opened,
    Frame(Vec<u8>),
    Closed,
}

/// Shared queue between transport callbacks and the session.
pub type Inbox = Rc<RefCell<VecDeque<Inbound>>>;

pub fn new_inbox() -> Inbox {
    Rc::new(RefCell::new(VecDeque::new()))
}

/// Queue a received frame. A world snapshot overwrites a snapshot still
/// waiting at the back of the queue: only the newest one is ever applied,
/// and frames are not drained while the page is hidden.
pub fn enqueue_frame(inbox: &Inbox, data: Vec<u8>) {
    let mut queue = inbox.borrow_mut();
    if is_state_update(&data) {
        if let Some(Inbound::Frame(last)) = queue.back_mut() {
            if is_state_update(last) {
                *last = data;
                return;
            }
        }
    }
    queue.push_back(Inbound::Frame(data));
}

fn is_state_update(frame: &[u8]) -> bool {
    frame.first() == Some(&(ServerOpcode::StateUpdate as u8))
}

/// Correlates a `checkName` query with its reply.
pub type RequestId = u32;

/// Typed session events, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connected,
    Joined(Player),
    WorldUpdated(Snapshot),
    NameChecked { request: RequestId, available: bool },
    Disconnected,
}

/// Outbound byte pipe. The browser uses `WebSocketTransport`.
pub trait Transport {
    fn send(&self, frame: &[u8]) -> Result<(), ClientError>;
    fn is_open(&self) -> bool;
    fn close(&self);
}

type Observer = Box<dyn FnMut(&SessionEvent)>;

pub struct Session {
    transport: Box<dyn Transport>,
    inbox: Inbox,
    connected: bool,
    next_request: RequestId,
    observers: Vec<Observer>,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, inbox: Inbox) -> Self {
        Self {
            transport,
            inbox,
            connected: false,
            next_request: 1,
            observers: Vec::new(),
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Register a callback that sees every event `poll` produces.
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Drain the inbox, decode frames and notify observers.
    ///
    /// Frames that fail to decode are logged and skipped.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let inbound: Vec<Inbound> = self.inbox.borrow_mut().drain(..).collect();
        let mut events = Vec::with_capacity(inbound.len());

        for item in inbound {
            let event = match item {
                Inbound::Opened => {
                    if self.connected {
                        continue;
                    }
                    self.connected = true;
                    tracing::info!("session established");
                    SessionEvent::Connected
                }
                Inbound::Closed => {
                    if !self.connected {
                        continue;
                    }
                    self.connected = false;
                    tracing::warn!("session lost");
                    SessionEvent::Disconnected
                }
                Inbound::Frame(data) => match ServerMessage::decode(&data) {
                    Ok(ServerMessage::Joined(player)) => SessionEvent::Joined(player),
                    Ok(ServerMessage::StateUpdate(snapshot)) => SessionEvent::WorldUpdated(snapshot),
                    Ok(ServerMessage::NameStatus { request, available }) => {
                        SessionEvent::NameChecked { request, available }
                    }
                    Err(e) => {
                        tracing::warn!("dropping undecodable frame ({} bytes): {e}", data.len());
                        continue;
                    }
                },
            };
            for observer in &mut self.observers {
                observer(&event);
            }
            events.push(event);
        }

        events
    }

    fn send(&self, message: &ClientMessage) -> Result<(), ClientError> {
        if !self.connected || !self.transport.is_open() {
            return Err(ClientError::Disconnected);
        }
        self.transport.send(&message.encode())
    }

    /// Ask the server whether `name` is free. The answer arrives later as
    /// `SessionEvent::NameChecked` carrying the returned id.
    pub fn check_name(&mut self, name: &str) -> Result<RequestId, ClientError> {
        let request = self.next_request;
        self.send(&ClientMessage::CheckName {
            request,
            name: name.to_string(),
        })?;
        self.next_request = self.next_request.wrapping_add(1);
        tracing::debug!("checkName #{request} for {name:?}");
        Ok(request)
    }

    pub fn request_join(&self, name: &str, color: Color) -> Result<(), ClientError> {
        tracing::info!("joining as {name:?} ({color})");
        self.send(&ClientMessage::Join {
            name: name.to_string(),
            color,
        })
    }

    pub fn report_move(&self, x: f32, y: f32) -> Result<(), ClientError> {
        self.send(&ClientMessage::Move { x, y })
    }

    /// Close the transport. No further events are produced for it.
    pub fn shutdown(&mut self) {
        self.transport.close();
        self.inbox.borrow_mut().clear();
        self.connected = false;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.transport.close();
    }
}

/// Build a `ws://`/`wss://` URL. Bare `host:port` follows the page scheme.
pub fn websocket_url(url: &str, page_is_https: bool) -> String {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws{}://{}", if page_is_https { "s" } else { "" }, url)
    }
}

/// Browser WebSocket in `ArrayBuffer` mode. Owns its callbacks and detaches
/// them when closed or dropped.
pub struct WebSocketTransport {
    ws: WebSocket,
    handlers: RefCell<Option<SocketHandlers>>,
}

struct SocketHandlers {
    _onopen: Closure<dyn FnMut(JsValue)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onerror: Closure<dyn FnMut(JsValue)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
}

impl WebSocketTransport {
    pub fn connect(url: &str, inbox: Inbox) -> Result<Self, JsValue> {
        let is_https = web_sys::window()
            .and_then(|w| w.location().protocol().ok())
            .map(|p| p == "https:")
            .unwrap_or(false);
        let ws_url = websocket_url(url, is_https);

        tracing::info!("connecting to {ws_url}");
        let ws = WebSocket::new(&ws_url)?;
        ws.set_binary_type(BinaryType::Arraybuffer);

        let open_inbox = Rc::clone(&inbox);
        let onopen = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
            open_inbox.borrow_mut().push_back(Inbound::Opened);
        });
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let message_inbox = Rc::clone(&inbox);
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match event.data().dyn_into::<ArrayBuffer>() {
                Ok(buffer) => enqueue_frame(&message_inbox, Uint8Array::new(&buffer).to_vec()),
                Err(data) => tracing::debug!("dropping non-binary frame: {data:?}"),
            }
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let onerror = Closure::<dyn FnMut(JsValue)>::new(move |e: JsValue| {
            tracing::error!("WebSocket error: {e:?}");
        });
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let close_inbox = inbox;
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            tracing::info!("WebSocket closed: {}", event.code());
            close_inbox.borrow_mut().push_back(Inbound::Closed);
        });
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        Ok(Self {
            ws,
            handlers: RefCell::new(Some(SocketHandlers {
                _onopen: onopen,
                _onmessage: onmessage,
                _onerror: onerror,
                _onclose: onclose,
            })),
        })
    }
}

impl Transport for WebSocketTransport {
    fn send(&self, frame: &[u8]) -> Result<(), ClientError> {
        if !self.is_open() {
            return Err(ClientError::Disconnected);
        }
        self.ws.send_with_u8_array(frame).map_err(ClientError::transport)
    }

    fn is_open(&self) -> bool {
        self.ws.ready_state() == WebSocket::OPEN
    }

    fn close(&self) {
        let Some(handlers) = self.handlers.borrow_mut().take() else {
            return;
        };
        // Detach first so no callback fires into a torn-down client.
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();
        drop(handlers);
    }
}
