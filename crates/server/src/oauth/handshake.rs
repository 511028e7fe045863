//! Popup ↔ opener handshake that hands the access token to the CMS window.
//!
//! The popup cannot know when the opener is listening, so it announces itself with
//! `authorizing:<provider>` (to any origin, no secrets involved), waits for the opener
//! to answer, and only then posts the token, restricted to the origin that answered.
//! After that single delivery the popup closes.
//!
//! [`Handshake`] models the same protocol on the Rust side; [`Handshake::render_page`]
//! emits the browser implementation of it.

use crate::github::AccessToken;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// `authorization:<provider>:success:{"token":...,"provider":...}`
#[derive(Clone)]
pub struct HandshakeMessage {
    provider: String,
    message: String,
}

impl HandshakeMessage {
    /// The only constructor: a message always follows a successful exchange.
    pub fn success(provider: &str, token: &AccessToken) -> Self {
        let payload = format!(
            r#"{{"token":{},"provider":{}}}"#,
            Value::from(token.token.as_str()),
            Value::from(provider)
        );
        Self {
            provider: provider.to_string(),
            message: format!("authorization:{provider}:success:{payload}"),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn as_str(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for HandshakeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeMessage")
            .field("provider", &self.provider)
            .field("message", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    AwaitingAck,
    Sent,
}

impl HandshakePhase {
    /// Name used for the phase variable in the emitted script.
    pub fn as_str(self) -> &'static str {
        match self {
            HandshakePhase::AwaitingAck => "awaiting_ack",
            HandshakePhase::Sent => "sent",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("handshake already delivered")]
    AlreadySent,
    #[error("refusing to deliver to origin {0:?}")]
    UntrustedOrigin(String),
}

/// Origins the token is never posted to: empty, wildcard and opaque.
pub const UNTRUSTED_ORIGINS: [&str; 3] = ["", "*", "null"];

/// One `postMessage` from popup to opener.
#[derive(Debug, PartialEq, Eq)]
pub struct Delivery<'a> {
    pub target_origin: &'a str,
    pub payload: &'a str,
}

#[derive(Debug)]
pub struct Handshake {
    message: HandshakeMessage,
    phase: HandshakePhase,
}

impl Handshake {
    pub fn new(message: HandshakeMessage) -> Self {
        Self {
            message,
            phase: HandshakePhase::AwaitingAck,
        }
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// What the popup posts (to `*`) before it has heard from the opener.
    pub fn readiness_signal(&self) -> String {
        format!("authorizing:{}", self.message.provider())
    }

    /// The opener answered from `origin`: deliver the token there, exactly once.
    ///
    /// Wildcard, opaque (`null`) and empty origins are refused without consuming the
    /// handshake.
    pub fn acknowledge<'a>(&'a mut self, origin: &'a str) -> Result<Delivery<'a>, HandshakeError> {
        if self.phase == HandshakePhase::Sent {
            return Err(HandshakeError::AlreadySent);
        }
        if UNTRUSTED_ORIGINS.contains(&origin) {
            return Err(HandshakeError::UntrustedOrigin(origin.to_string()));
        }
        self.phase = HandshakePhase::Sent;
        Ok(Delivery {
            target_origin: origin,
            payload: self.message.as_str(),
        })
    }

    /// HTML page running this handshake in the popup.
    pub fn render_page(&self) -> String {
        let ready = script_string(&self.readiness_signal());
        let untrusted = UNTRUSTED_ORIGINS
            .iter()
            .map(|origin| script_string(origin))
            .collect::<Vec<_>>()
            .join(", ");
        let message = script_string(self.message.as_str());
        let awaiting = script_string(HandshakePhase::AwaitingAck.as_str());
        let sent = script_string(HandshakePhase::Sent.as_str());
        format!(
            r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Signing in</title>
</head>
<body>
  <p id="status">Completing sign-in&hellip;</p>
  <script>
    (function () {{
      var ready = {ready};
      var untrusted = [{untrusted}];
      var message = {message};
      var phase = {awaiting};
      var opener = window.opener;
      if (!opener) {{
        document.getElementById("status").textContent =
          "Sign-in finished, but the window that started it is gone. You can close this window.";
        return;
      }}
      function receiveMessage(event) {{
        if (phase !== {awaiting} || event.source !== opener) {{
          return;
        }}
        if (untrusted.indexOf(event.origin || "") !== -1) {{
          return;
        }}
        phase = {sent};
        window.removeEventListener("message", receiveMessage, false);
        opener.postMessage(message, event.origin);
        window.close();
      }}
      window.addEventListener("message", receiveMessage, false);
      opener.postMessage(ready, "*");
    }})();
  </script>
</body>
</html>
"#
        )
    }
}

/// JSON string literal that is also safe inside an HTML `<script>` element.
///
/// serde_json already escapes quotes, backslashes and control characters; on top of
/// that `<`, `>`, `&` and the JS line terminators U+2028/U+2029 become `\uXXXX`
/// escapes, which decode to the same string.
pub fn script_string(value: &str) -> String {
    let json = Value::from(value).to_string();
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}
