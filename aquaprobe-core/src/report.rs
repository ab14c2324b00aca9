//! Diagnostic Reporting
//!
//! ## Overview
//!
//! A diagnostic is a short human-readable message tied to one reading slot
//! (channel index) of the sensor that detected the problem. It complements the
//! `Copy` [`SensorError`](crate::SensorError): the error says *what* failed,
//! the diagnostic carries the detail (expected value, raw probe response).
//!
//! Diagnostics are recorded exactly once, at the point of detection, by the
//! component that detected them. Callers propagating a [`SensorResult`]
//! upwards never report again.
//!
//! ## Reporters
//!
//! - [`DiagnosticLog`]: bounded in-memory log (oldest entry dropped when full)
//!   that also forwards each message to `log` at warn level
//! - [`NullReporter`]: discards everything
//!
//! Messages are passed as [`core::fmt::Arguments`] so formatting happens
//! directly into the reporter's own storage.
//!
//! [`SensorResult`]: crate::SensorResult

use core::fmt::{self, Write};

use crate::constants::buffers::{DIAGNOSTIC_CAPACITY, DIAGNOSTIC_MESSAGE_LEN};

/// Sink for diagnostic messages
pub trait ErrorReporter {
    /// Record a diagnostic for reading slot `channel`
    fn report(&mut self, channel: u8, message: fmt::Arguments<'_>);
}

impl<R: ErrorReporter + ?Sized> ErrorReporter for &mut R {
    fn report(&mut self, channel: u8, message: fmt::Arguments<'_>) {
        (**self).report(channel, message)
    }
}

/// Reporter that drops every diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ErrorReporter for NullReporter {
    fn report(&mut self, _channel: u8, _message: fmt::Arguments<'_>) {}
}

/// One recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub channel: u8,
    /// Message text, truncated to [`DIAGNOSTIC_MESSAGE_LEN`] bytes
    pub message: heapless::String<DIAGNOSTIC_MESSAGE_LEN>,
}

impl Diagnostic {
    pub fn text(&self) -> &str {
        self.message.as_str()
    }
}

/// Writer that keeps as much text as fits and silently drops the rest
struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Bounded diagnostic log
pub struct DiagnosticLog<const N: usize = DIAGNOSTIC_CAPACITY> {
    entries: heapless::Deque<Diagnostic, N>,
    dropped: u32,
}

impl<const N: usize> DiagnosticLog<N> {
    pub const fn new() -> Self {
        Self {
            entries: heapless::Deque::new(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped because the log was full
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Diagnostic> {
        self.entries.back()
    }

    /// Entries recorded for one reading slot
    pub fn for_channel(&self, channel: u8) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.channel == channel)
    }

    /// True if any entry contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.text().contains(needle))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> Default for DiagnosticLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for DiagnosticLog<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("len", &self.entries.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl<const N: usize> ErrorReporter for DiagnosticLog<N> {
    fn report(&mut self, channel: u8, message: fmt::Arguments<'_>) {
        let mut text = heapless::String::new();
        let _ = Truncating(&mut text).write_fmt(message);

        log_warn!("channel {}: {}", channel, text.as_str());

        if self.entries.is_full() {
            self.entries.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Space was made above
        let _ = self.entries.push_back(Diagnostic { channel, message: text });
    }
}
