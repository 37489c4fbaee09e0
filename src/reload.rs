//! Live-reload signaling over WebSocket.
//!
//! The serve orchestrator owns a [`LiveReload`] broadcaster and injects it
//! into task runs; tasks never touch a global. Connected browsers receive
//! one of two notifications per change, never both:
//!
//! - `inject`: swap a stylesheet in place, no page reload
//! - `reload`: reload the whole page
//!
//! The client counterpart lives in `embed/serve/livereload.js` and is
//! injected into HTML responses by the dev server.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    net::{IpAddr, SocketAddr, TcpListener, TcpStream},
    sync::Arc,
    thread,
};
use tungstenite::{Message, WebSocket};

/// Notification pushed to connected browsers.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ReloadMessage<'a> {
    /// Replace the stylesheet at `path` in place.
    Inject { path: &'a str },
    /// Reload the full page.
    Reload,
}

/// WebSocket broadcaster for reload notifications.
pub struct LiveReload {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
    port: u16,
}

impl LiveReload {
    /// Bind the WebSocket listener and spawn the acceptor thread.
    pub fn start(interface: IpAddr, port: u16) -> Result<Arc<Self>> {
        let addr = SocketAddr::new(interface, port);
        let listener = TcpListener::bind(addr)
            .with_context(|| format!("Failed to bind live-reload socket on {addr}"))?;

        let reload = Arc::new(Self {
            clients: Mutex::new(Vec::new()),
            port,
        });

        let acceptor = Arc::clone(&reload);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                if let Ok(socket) = tungstenite::accept(stream) {
                    acceptor.clients.lock().push(socket);
                }
            }
        });

        Ok(reload)
    }

    /// Port the WebSocket listener is bound to.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Hot-inject an updated stylesheet, `path` relative to the doc root.
    pub fn inject_css(&self, path: &str) {
        self.broadcast(&ReloadMessage::Inject { path });
    }

    /// Trigger a full page reload.
    pub fn reload(&self) {
        self.broadcast(&ReloadMessage::Reload);
    }

    /// Send a message to every connected client, dropping dead sockets.
    fn broadcast(&self, message: &ReloadMessage) {
        let Ok(payload) = serde_json::to_string(message) else {
            return;
        };

        let mut clients = self.clients.lock();
        clients.retain_mut(|socket| {
            socket
                .send(Message::Text(payload.clone().into()))
                .is_ok()
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
