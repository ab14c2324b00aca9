//! Acknowledgment inspection for probe replies
//!
//! A compensation push is confirmed by querying the value back. Replies look
//! like `?T,23.45` or `?S,35.00,ppt`. The structured form is parsed first and
//! compared numerically; replies that do not parse fall back to searching for
//! the two-decimal text of the pushed value.

use crate::command::format_compensation;
use crate::constants::protocol::{ACK_VALUE_TOLERANCE, CALIBRATION_CONFIRMED_MARKER, QUERY_REPLY_PREFIX};
use crate::errors::CompensationAxis;

/// How a reply was judged
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acknowledgment {
    /// Structured reply carrying the pushed value
    Confirmed(f32),
    /// Structured reply carrying a different value
    Mismatch(f32),
    /// Unstructured reply that contains the pushed text
    ConfirmedByText,
    /// Unstructured reply without the pushed text
    Unconfirmed,
}

impl Acknowledgment {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Acknowledgment::Confirmed(_) | Acknowledgment::ConfirmedByText)
    }
}

/// Extract the numeric field of a `?KEY,value[,...]` reply
pub fn parse_query_reply(response: &str, key: &str) -> Option<f32> {
    let body = response.trim().trim_end_matches('\0');
    let body = body.strip_prefix(QUERY_REPLY_PREFIX).unwrap_or(body);

    let mut fields = body.split(',');
    let head = fields.next()?.trim();
    if !head.eq_ignore_ascii_case(key) {
        return None;
    }
    fields.next()?.trim().parse::<f32>().ok()
}

/// Judge the reply to a compensation query
pub fn inspect_compensation(response: &str, axis: CompensationAxis, expected: f32) -> Acknowledgment {
    let pushed_text = format_compensation(expected);
    // Value as the probe received it
    let pushed = pushed_text.parse::<f32>().unwrap_or(expected);

    match parse_query_reply(response, axis.key()) {
        Some(echoed) if libm::fabsf(echoed - pushed) <= ACK_VALUE_TOLERANCE => Acknowledgment::Confirmed(echoed),
        Some(echoed) => Acknowledgment::Mismatch(echoed),
        None if response.contains(pushed_text.as_str()) => Acknowledgment::ConfirmedByText,
        None => Acknowledgment::Unconfirmed,
    }
}

/// True when a calibration status reply carries the confirmation marker
pub fn calibration_confirmed(response: &str) -> bool {
    response.contains(CALIBRATION_CONFIRMED_MARKER)
}
