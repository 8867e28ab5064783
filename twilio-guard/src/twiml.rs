//! TwiML response builder.
//!
//! A [`TwimlResponse`] is an ordered list of verbs rendered as the XML
//! document Twilio expects back from a webhook:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?><Response><Say>Hi</Say></Response>
//! ```

use std::fmt;

/// XML prolog emitted before the `<Response>` element.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A single TwiML verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Read text aloud
    Say(String),
    /// Play an audio file from a URL
    Play(String),
    /// Legacy SMS reply
    Sms(String),
    /// Messaging reply
    Message(String),
    /// Connect the caller to another number
    Dial(String),
    /// Fetch the next TwiML document from another URL
    Redirect(String),
    /// Wait silently for a number of seconds
    Pause(u32),
    /// End the call
    Hangup,
    /// Refuse the call without answering it
    Reject,
}

impl Verb {
    fn name(&self) -> &'static str {
        match self {
            Verb::Say(_) => "Say",
            Verb::Play(_) => "Play",
            Verb::Sms(_) => "Sms",
            Verb::Message(_) => "Message",
            Verb::Dial(_) => "Dial",
            Verb::Redirect(_) => "Redirect",
            Verb::Pause(_) => "Pause",
            Verb::Hangup => "Hangup",
            Verb::Reject => "Reject",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Verb::Say(text)
            | Verb::Play(text)
            | Verb::Sms(text)
            | Verb::Message(text)
            | Verb::Dial(text)
            | Verb::Redirect(text) => write!(f, "<{name}>{}</{name}>", escape_xml(text)),
            Verb::Pause(seconds) => write!(f, r#"<{name} length="{seconds}"/>"#),
            Verb::Hangup | Verb::Reject => write!(f, "<{name}/>"),
        }
    }
}

/// Builder for a TwiML `<Response>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwimlResponse {
    verbs: Vec<Verb>,
}

impl TwimlResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verb(mut self, verb: Verb) -> Self {
        self.verbs.push(verb);
        self
    }

    pub fn say(self, text: impl Into<String>) -> Self {
        self.verb(Verb::Say(text.into()))
    }

    pub fn play(self, url: impl Into<String>) -> Self {
        self.verb(Verb::Play(url.into()))
    }

    pub fn sms(self, text: impl Into<String>) -> Self {
        self.verb(Verb::Sms(text.into()))
    }

    pub fn message(self, text: impl Into<String>) -> Self {
        self.verb(Verb::Message(text.into()))
    }

    pub fn dial(self, number: impl Into<String>) -> Self {
        self.verb(Verb::Dial(number.into()))
    }

    pub fn redirect(self, url: impl Into<String>) -> Self {
        self.verb(Verb::Redirect(url.into()))
    }

    pub fn pause(self, seconds: u32) -> Self {
        self.verb(Verb::Pause(seconds))
    }

    pub fn hangup(self) -> Self {
        self.verb(Verb::Hangup)
    }

    pub fn reject(self) -> Self {
        self.verb(Verb::Reject)
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }
}

impl fmt::Display for TwimlResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(XML_DECLARATION)?;
        if self.verbs.is_empty() {
            return f.write_str("<Response/>");
        }
        f.write_str("<Response>")?;
        for verb in &self.verbs {
            write!(f, "{verb}")?;
        }
        f.write_str("</Response>")
    }
}

/// Escape text for use inside an XML element.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
