//! Incremental ANSI decoder for emulator console output.
//!
//! Bytes arrive in arbitrary chunks. Escape sequences may be cut anywhere, so
//! the escape-parsing state and the current style live in the decoder and
//! carry over from one [`TerminalDecoder::decode`] call to the next. Only
//! Select Graphic Rendition (`CSI ... m`) changes the style. Every other
//! sequence is consumed and dropped.

use std::iter::FusedIterator;

use elmos_common::types::{Style, StyledRun};
use tracing::{debug, trace};
use vte::{Params, Perform};

/// Stateful byte-stream interpreter that turns console bytes into styled runs.
pub struct TerminalDecoder {
    parser: vte::Parser,
    state: TerminalState,
}

/// Style and pending text, driven by the `vte` parser.
#[derive(Debug, Default)]
struct TerminalState {
    style: Style,
    pending: String,
    ready: Option<StyledRun>,
    long_sgr: LongSgr,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    #[default]
    Idle,
    Escape,
    Params,
}

/// Applies CSI parameters as they arrive, in parallel with `vte`.
///
/// `vte` keeps at most 32 parameters and flags the rest as ignored. This
/// shadow sees every one of them, so an overlong SGR still lands on the
/// style it spells out.
#[derive(Debug, Default)]
struct LongSgr {
    tracking: Tracking,
    style: Style,
    code: u16,
    in_subparams: bool,
}

impl LongSgr {
    fn track(&mut self, byte: u8, current: Style) {
        match (self.tracking, byte) {
            (_, 0x1b) => self.tracking = Tracking::Escape,
            (_, 0x18 | 0x1a) => self.tracking = Tracking::Idle,
            (Tracking::Escape, b'[') => {
                self.tracking = Tracking::Params;
                self.style = current;
                self.code = 0;
                self.in_subparams = false;
            }
            (Tracking::Escape, _) => self.tracking = Tracking::Idle,
            (Tracking::Params, b'0'..=b'9') => {
                self.code = self
                    .code
                    .saturating_mul(10)
                    .saturating_add(u16::from(byte - b'0'));
            }
            (Tracking::Params, b':') => {
                // Only the leading code of `38:5:n` style groups counts
                self.end_param();
                self.in_subparams = true;
            }
            (Tracking::Params, b';') => {
                self.end_param();
                self.in_subparams = false;
            }
            (Tracking::Params, 0x40..=0x7e) => {
                self.end_param();
                self.tracking = Tracking::Idle;
            }
            (Tracking::Params, _) | (Tracking::Idle, _) => {}
        }
    }

    fn end_param(&mut self) {
        if !self.in_subparams {
            self.style.apply_sgr(self.code);
        }
        self.code = 0;
    }
}

impl TerminalState {
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        debug_assert!(self.ready.is_none());
        self.ready = Some(StyledRun::new(text, self.style));
    }

    fn apply_sgr(&mut self, params: &Params, truncated: bool) {
        let next = if truncated {
            self.long_sgr.style
        } else {
            let mut next = self.style;
            for param in params.iter() {
                // Sub-parameters (`38:5:n`) are not supported, only the leading code counts
                if let Some(&code) = param.first() {
                    next.apply_sgr(code);
                }
            }
            next
        };
        if next != self.style {
            self.flush();
            self.style = next;
        }
    }
}

impl Perform for TerminalState {
    fn print(&mut self, c: char) {
        self.pending.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\r' | b'\t' | 0x08 => self.pending.push(char::from(byte)),
            _ => trace!("Dropping control byte 0x{:02x}", byte),
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        // `ignore` on a dispatched CSI means vte ran out of parameter slots
        if action == 'm' && intermediates.is_empty() {
            self.apply_sgr(params, ignore);
        } else {
            trace!(
                "Discarding CSI {:?} intermediates={:?} ignore={}",
                action,
                intermediates,
                ignore
            );
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        trace!("Discarding ESC {:?} {:?}", intermediates, byte as char);
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        trace!("Discarding OSC with {} params", params.len());
    }
}

impl TerminalDecoder {
    pub fn new() -> Self {
        Self {
            parser: vte::Parser::new(),
            state: TerminalState::default(),
        }
    }

    /// Decode one chunk. Runs are produced lazily, in input order.
    ///
    /// Any text still pending when the chunk ends is emitted with the current
    /// style. A partially received escape sequence is kept for the next call.
    pub fn decode<'a>(&'a mut self, bytes: &'a [u8]) -> Runs<'a> {
        trace!("Decoding {} bytes", bytes.len());
        Runs {
            decoder: self,
            bytes,
            pos: 0,
            flushed: false,
        }
    }

    /// Style that the next printed character will carry.
    pub fn style(&self) -> Style {
        self.state.style
    }

    /// Forget all state. Called when a new console session starts.
    pub fn reset(&mut self) {
        debug!("Resetting terminal decoder");
        self.parser = vte::Parser::new();
        self.state = TerminalState::default();
    }

    fn advance(&mut self, byte: u8) {
        self.state.long_sgr.track(byte, self.state.style);
        self.parser.advance(&mut self.state, byte);
    }
}

impl Default for TerminalDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy sequence of runs for one chunk, returned by [`TerminalDecoder::decode`].
///
/// Dropping it early still feeds the rest of the chunk through the parser, so
/// the decoder state stays in step with the byte stream. The runs that were
/// not pulled are lost.
pub struct Runs<'a> {
    decoder: &'a mut TerminalDecoder,
    bytes: &'a [u8],
    pos: usize,
    flushed: bool,
}

impl Iterator for Runs<'_> {
    type Item = StyledRun;

    fn next(&mut self) -> Option<StyledRun> {
        loop {
            if let Some(run) = self.decoder.state.ready.take() {
                return Some(run);
            }
            if let Some(&byte) = self.bytes.get(self.pos) {
                self.pos += 1;
                self.decoder.advance(byte);
            } else if !self.flushed {
                self.flushed = true;
                self.decoder.state.flush();
            } else {
                return None;
            }
        }
    }
}

impl FusedIterator for Runs<'_> {}

impl Drop for Runs<'_> {
    fn drop(&mut self) {
        while let Some(&byte) = self.bytes.get(self.pos) {
            self.pos += 1;
            self.decoder.advance(byte);
            self.decoder.state.ready = None;
        }
        self.decoder.state.pending.clear();
        self.decoder.state.ready = None;
    }
}
