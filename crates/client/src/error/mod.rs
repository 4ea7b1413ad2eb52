// Client error taxonomy
use protocol::ProtocolError;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Blank or whitespace-only name. Never reaches the server.
    #[error("Please enter a name")]
    EmptyName,

    /// The server reported the name as already in use.
    #[error("That name is taken, pick another one")]
    NameTaken,

    #[error("Not connected to the server")]
    Disconnected,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Wrap a JS exception raised by the DOM or the socket.
    pub fn transport(err: JsValue) -> Self {
        ClientError::Transport(format!("{err:?}"))
    }
}

impl From<ClientError> for JsValue {
    fn from(err: ClientError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
