//! The binary frame format spoken over raw TCP.
//!
//! Every frame starts with a big-endian u32 length covering everything after
//! it, so a reader can pull exactly one frame off the stream before parsing.
//!
//! Request frame, after the length prefix:
//!
//! ```text
//! [1B opcode][4B pathLen][path bytes][4B payloadLen][payload bytes]
//! ```
//!
//! The payload block is present only for verbs that carry one; a get or
//! payload-less delete frame ends after the path bytes.
//!
//! Response frame, after the length prefix:
//!
//! ```text
//! [1B status][4B jsonLen][json bytes]
//! ```
//!
//! The status byte is advisory (the JSON envelope's success flag is
//! authoritative); it lets a reader fail fast without parsing JSON.

use thiserror::Error;

/// Upper bound on a declared frame length. A peer announcing more than this
/// is treated as malformed rather than trusted with the allocation.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Response status byte for a success envelope.
pub const STATUS_OK: u8 = 0;
/// Response status byte for a failure envelope.
pub const STATUS_ERROR: u8 = 1;

/// Errors produced while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Malformed frame: {reason}")]
    Malformed { reason: String },

    #[error("Frame length {len} exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Unknown opcode {opcode}")]
    UnknownOpcode { opcode: u8 },
}

impl WireError {
    fn malformed(reason: impl Into<String>) -> Self {
        WireError::Malformed {
            reason: reason.into(),
        }
    }
}

/// The verb a request frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Get = 0,
    Set = 1,
    Create = 2,
    Invoke = 3,
    Delete = 4,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Result<Self, WireError> {
        match byte {
            0 => Ok(Opcode::Get),
            1 => Ok(Opcode::Set),
            2 => Ok(Opcode::Create),
            3 => Ok(Opcode::Invoke),
            4 => Ok(Opcode::Delete),
            opcode => Err(WireError::UnknownOpcode { opcode }),
        }
    }
}

/// A decoded request frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFrame {
    pub opcode: Opcode,
    pub path: String,
    /// JSON bytes of the verb's payload, when the verb carries one.
    pub payload: Option<Vec<u8>>,
}

/// A decoded response frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFrame {
    pub status: u8,
    /// JSON bytes of the envelope.
    pub body: Vec<u8>,
}

/// Encodes a request frame, length prefix included.
pub fn encode_request(frame: &RequestFrame) -> Vec<u8> {
    let path = frame.path.as_bytes();
    let inner_len = 1 + 4 + path.len() + frame.payload.as_ref().map_or(0, |p| 4 + p.len());

    let mut buf = Vec::with_capacity(4 + inner_len);
    buf.extend_from_slice(&(inner_len as u32).to_be_bytes());
    buf.push(frame.opcode as u8);
    buf.extend_from_slice(&(path.len() as u32).to_be_bytes());
    buf.extend_from_slice(path);
    if let Some(payload) = &frame.payload {
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);
    }
    buf
}

/// Encodes a response frame, length prefix included.
pub fn encode_response(frame: &ResponseFrame) -> Vec<u8> {
    let inner_len = 1 + 4 + frame.body.len();
    let mut buf = Vec::with_capacity(4 + inner_len);
    buf.extend_from_slice(&(inner_len as u32).to_be_bytes());
    buf.push(frame.status);
    buf.extend_from_slice(&(frame.body.len() as u32).to_be_bytes());
    buf.extend_from_slice(&frame.body);
    buf
}

/// Decodes a request frame body, i.e. the bytes after the length prefix.
pub fn decode_request(buf: &[u8]) -> Result<RequestFrame, WireError> {
    let mut cursor = Cursor::new(buf);
    let opcode = Opcode::from_byte(cursor.take_byte("opcode")?)?;
    let path_len = cursor.take_len("path")?;
    let path_bytes = cursor.take_bytes(path_len, "path")?;
    let path = String::from_utf8(path_bytes.to_vec())
        .map_err(|_| WireError::malformed("path is not valid UTF-8"))?;

    // Remaining bytes, if any, are the payload block.
    let payload = if cursor.is_empty() {
        None
    } else {
        let payload_len = cursor.take_len("payload")?;
        let payload = cursor.take_bytes(payload_len, "payload")?.to_vec();
        cursor.expect_empty()?;
        Some(payload)
    };

    Ok(RequestFrame {
        opcode,
        path,
        payload,
    })
}

/// Decodes a response frame body, i.e. the bytes after the length prefix.
pub fn decode_response(buf: &[u8]) -> Result<ResponseFrame, WireError> {
    let mut cursor = Cursor::new(buf);
    let status = cursor.take_byte("status")?;
    let body_len = cursor.take_len("body")?;
    let body = cursor.take_bytes(body_len, "body")?.to_vec();
    cursor.expect_empty()?;
    Ok(ResponseFrame { status, body })
}

/// Validates a declared frame length before the buffer is allocated.
pub fn check_frame_len(len: usize) -> Result<(), WireError> {
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(())
}

struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn take_byte(&mut self, field: &str) -> Result<u8, WireError> {
        let (&byte, rest) = self
            .buf
            .split_first()
            .ok_or_else(|| WireError::malformed(format!("frame truncated before {field}")))?;
        self.buf = rest;
        Ok(byte)
    }

    fn take_len(&mut self, field: &str) -> Result<usize, WireError> {
        let bytes = self.take_bytes(4, field)?;
        let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        check_frame_len(len)?;
        Ok(len)
    }

    fn take_bytes(&mut self, len: usize, field: &str) -> Result<&'a [u8], WireError> {
        if self.buf.len() < len {
            return Err(WireError::malformed(format!(
                "frame truncated inside {field}: declared {len} bytes, {} remain",
                self.buf.len()
            )));
        }
        let (taken, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(taken)
    }

    fn expect_empty(&self) -> Result<(), WireError> {
        if !self.buf.is_empty() {
            return Err(WireError::malformed(format!(
                "{} trailing bytes after frame",
                self.buf.len()
            )));
        }
        Ok(())
    }
}
