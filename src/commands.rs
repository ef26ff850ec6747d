//! overpass/src/commands.rs
//! Slash-command resolution against proxy state.

use crate::protocol::{self, MAX_TEXT_LEN};
use crate::registry::SessionRegistry;

/// What the relay should do with a sniffed slash command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Framed chat reply to send back to the client; the original message
    /// is not forwarded upstream.
    Reply(Vec<u8>),
    /// Not a command the proxy answers; the original bytes continue toward
    /// the upstream server unchanged.
    Passthrough,
}

/// Resolves a command name against the registry.
///
/// `list` answers with the online usernames, joined with `"; "` in sorted
/// order so the enumeration is deterministic. Anything else passes through.
pub fn resolve(name: &str, registry: &SessionRegistry) -> Outcome {
    match name {
        "list" => {
            let text = format!("Online: {}", registry.usernames().join("; "));
            Outcome::Reply(protocol::encode_chat(clamp_text(&text)))
        }
        _ => Outcome::Passthrough,
    }
}

/// A reply longer than the one-byte length prefix allows is truncated at
/// the last UTF-8 boundary that still fits.
fn clamp_text(text: &str) -> &[u8] {
    if text.len() <= MAX_TEXT_LEN {
        return text.as_bytes();
    }
    let mut end = MAX_TEXT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text.as_bytes()[..end]
}
