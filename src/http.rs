//! HTTP command boundary.
//!
//! Turns `GET /mouse?x=..&y=..&click=..` request lines into
//! [`MoveCommand`]s and renders the fixed acknowledgement. Malformed
//! parameters never reject a request: they fall back to zero.
//!
//! Parameter rules:
//! - `x`, `y`: leading whitespace and sign, then decimal digits; parsing
//!   stops at the first non-digit and the result wraps into `i8`.
//! - `click`: exactly `true` presses the left button.
//! - Values longer than [`MAX_VALUE_LEN`] bytes are ignored.

use core::fmt::Write;

use crate::command::MoveCommand;
use crate::config::{HTTP_ACK_BODY, HTTP_MOVE_PATH};
use crate::hid::report::BUTTON_LEFT;

/// Longest accepted parameter value.
pub const MAX_VALUE_LEN: usize = 7;

/// Room for the status line, two headers and the acknowledgement body.
pub const MAX_RESPONSE_LEN: usize = 160;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Not `<method> <target> HTTP/x.y`.
    Malformed,
    MethodNotAllowed,
    NotFound,
}

/// Split a request line and return the query of a `GET` on the move path.
///
/// `Ok(None)` means the path matched but carried no query.
pub fn parse_request_line(line: &str) -> Result<Option<&str>, RequestError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut parts = line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::Malformed);
    };
    if !version.starts_with("HTTP/") || target.is_empty() {
        return Err(RequestError::Malformed);
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    if path != HTTP_MOVE_PATH {
        return Err(RequestError::NotFound);
    }
    if method != "GET" {
        return Err(RequestError::MethodNotAllowed);
    }
    Ok(query.filter(|q| !q.is_empty()))
}

/// Value of the first `key=value` pair for `key`.
pub fn query_value<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    let value = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find_map(|(k, v)| (k == key).then_some(v))?;
    (value.len() <= MAX_VALUE_LEN).then_some(value)
}

/// C `atoi`: optional whitespace and sign, then digits. Overflow wraps.
pub fn atoi(s: &str) -> i32 {
    let s = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i32, |acc, d| acc.wrapping_mul(10).wrapping_add((d - b'0') as i32));
    if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

/// Build the move a query asks for. Unknown keys are ignored.
pub fn parse_query(query: &str) -> MoveCommand {
    let mut cmd = MoveCommand::default();
    if let Some(x) = query_value(query, "x") {
        cmd.dx = atoi(x) as i8;
    }
    if let Some(y) = query_value(query, "y") {
        cmd.dy = atoi(y) as i8;
    }
    if query_value(query, "click") == Some("true") {
        cmd.button = BUTTON_LEFT;
    }
    cmd
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub body: &'static str,
}

impl Response {
    pub const ACK: Self = Self {
        status: 200,
        reason: "OK",
        body: HTTP_ACK_BODY,
    };

    pub const fn for_error(err: RequestError) -> Self {
        match err {
            RequestError::Malformed => Self {
                status: 400,
                reason: "Bad Request",
                body: "Bad Request",
            },
            RequestError::MethodNotAllowed => Self {
                status: 405,
                reason: "Method Not Allowed",
                body: "Method Not Allowed",
            },
            RequestError::NotFound => Self {
                status: 404,
                reason: "Not Found",
                body: "Not Found",
            },
        }
    }

    pub fn render(&self) -> Result<heapless::String<MAX_RESPONSE_LEN>, core::fmt::Error> {
        let mut out = heapless::String::new();
        write!(
            out,
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
            self.status,
            self.reason,
            self.body.len(),
            self.body
        )?;
        Ok(out)
    }
}

/// Outcome of one request line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handled {
    /// Move to enqueue, if the request carried a query.
    pub command: Option<MoveCommand>,
    pub response: Response,
}

pub fn handle_request_line(line: &str) -> Handled {
    match parse_request_line(line) {
        Ok(query) => {
            let command = query.map(parse_query);
            if let Some(cmd) = &command {
                debug!("http: move {} {} button {}", cmd.dx, cmd.dy, cmd.button);
            }
            Handled {
                command,
                response: Response::ACK,
            }
        }
        Err(e) => {
            debug!("http: request rejected: {:?}", e);
            Handled {
                command: None,
                response: Response::for_error(e),
            }
        }
    }
}

/// Assembles request lines from a byte stream.
///
/// Lines longer than `N` bytes or not valid UTF-8 are dropped whole.
pub struct LineBuffer<const N: usize> {
    buf: heapless::Vec<u8, N>,
    overflowed: bool,
    complete: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
            complete: false,
        }
    }

    /// Feed one byte. Returns the finished line, without its terminator,
    /// when `byte` ends a non-empty line.
    pub fn push(&mut self, byte: u8) -> Option<&str> {
        if self.complete {
            self.buf.clear();
            self.complete = false;
        }

        match byte {
            b'\n' => {
                self.complete = true;
                if core::mem::replace(&mut self.overflowed, false) {
                    warn!("http: request line longer than {} bytes dropped", N);
                    return None;
                }
                let line = core::str::from_utf8(&self.buf).ok()?.trim_end_matches('\r');
                (!line.is_empty()).then_some(line)
            }
            _ if self.overflowed => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
