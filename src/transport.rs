//! Out-of-band channel requests
//!
//! The transport layer hands each session a stream of typed requests
//! (`pty-req`, `shell`, ...) that each need an explicit accept or reject.

use std::fmt;

use tokio::sync::oneshot;

/// Request type tag, as sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Start an interactive shell
    Shell,
    /// Allocate a pseudo-terminal
    PtyReq,
    /// Set an environment variable
    Env,
    /// Terminal was resized
    WindowChange,
    /// Deliver a signal
    Signal,
    /// Anything this server does not understand
    Other(String),
}

impl RequestKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "shell" => RequestKind::Shell,
            "pty-req" => RequestKind::PtyReq,
            "env" => RequestKind::Env,
            "window-change" => RequestKind::WindowChange,
            "signal" => RequestKind::Signal,
            other => RequestKind::Other(other.to_string()),
        }
    }

    /// Terminal-capability requests that are acknowledged but not acted on
    pub fn is_terminal_capability(&self) -> bool {
        matches!(
            self,
            RequestKind::PtyReq | RequestKind::Env | RequestKind::WindowChange | RequestKind::Signal
        )
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            RequestKind::Shell => "shell",
            RequestKind::PtyReq => "pty-req",
            RequestKind::Env => "env",
            RequestKind::WindowChange => "window-change",
            RequestKind::Signal => "signal",
            RequestKind::Other(tag) => tag.as_str(),
        };
        f.write_str(tag)
    }
}

/// A pending out-of-band request awaiting a reply
#[derive(Debug)]
pub struct ChannelRequest {
    pub kind: RequestKind,
    reply: oneshot::Sender<bool>,
}

impl ChannelRequest {
    /// Create a request and the receiver its reply is delivered on
    pub fn new(tag: &str) -> (Self, oneshot::Receiver<bool>) {
        let (reply, rx) = oneshot::channel();
        let request = Self {
            kind: RequestKind::parse(tag),
            reply,
        };
        (request, rx)
    }

    pub fn accept(self) {
        self.respond(true);
    }

    pub fn reject(self) {
        self.respond(false);
    }

    fn respond(self, ok: bool) {
        // The requester may have stopped listening; nothing to do then
        let _ = self.reply.send(ok);
    }
}
