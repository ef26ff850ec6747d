//! overpass/src/protocol.rs
//! Game protocol classification and framing utilities.

/// Connection request tag, client to server.
pub const TAG_CONNECT: [u8; 2] = [0x02, 0x00];
/// Chat message tag, either direction.
pub const TAG_CHAT: [u8; 2] = [0x03, 0x00];

/// Fixed reply the server sends to accept a connection request.
pub const CONNECT_ACCEPT: [u8; 4] = [0x02, 0x00, 0x01, 0x2D];

/// The one-byte length prefix caps chat text at 255 bytes.
pub const MAX_TEXT_LEN: usize = 255;

/// A classified view into a raw message buffer. Borrows from the buffer;
/// classification never copies or rewrites.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Connection request carrying the player's username.
    Handshake { username: &'a [u8] },
    /// Chat line; `text` is clamped to the declared length and buffer end.
    Chat { text: &'a [u8] },
    /// Anything the proxy does not inspect; forwarded untouched.
    Other,
}

/// Classifies a raw message by its two-byte tag.
///
/// Buffers shorter than a tagged header match no tag and come back as
/// [`Frame::Other`]. Zero-length buffers never reach this function; a
/// zero-length read is the disconnect signal and is handled by the session
/// directly.
pub fn classify(buf: &[u8]) -> Frame<'_> {
    if buf.len() < 3 {
        return Frame::Other;
    }
    match [buf[0], buf[1]] {
        TAG_CONNECT => Frame::Handshake {
            username: &buf[3..],
        },
        TAG_CHAT => {
            let declared = buf[2] as usize;
            let end = buf.len().min(3 + declared);
            Frame::Chat {
                text: &buf[3..end],
            }
        }
        _ => Frame::Other,
    }
}

/// Returns the command name (bytes after the slash) when chat text is a
/// slash command.
pub fn command_name(text: &[u8]) -> Option<&[u8]> {
    match text.split_first() {
        Some((b'/', rest)) => Some(rest),
        _ => None,
    }
}

/// Frames chat text as `03 00 <len> <text>`. Callers keep `text` within
/// [`MAX_TEXT_LEN`].
pub fn encode_chat(text: &[u8]) -> Vec<u8> {
    debug_assert!(text.len() <= MAX_TEXT_LEN);
    let mut frame = Vec::with_capacity(3 + text.len());
    frame.extend_from_slice(&TAG_CHAT);
    frame.push(text.len() as u8);
    frame.extend_from_slice(text);
    frame
}

/// Frames a connection request as `02 00 <len> <username>`.
pub fn encode_connect(username: &[u8]) -> Vec<u8> {
    debug_assert!(username.len() <= MAX_TEXT_LEN);
    let mut frame = Vec::with_capacity(3 + username.len());
    frame.extend_from_slice(&TAG_CONNECT);
    frame.push(username.len() as u8);
    frame.extend_from_slice(username);
    frame
}
