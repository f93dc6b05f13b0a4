//! Stream framing for the bridge protocol
//!
//! ## Overview
//!
//! The bridge interleaves the fragments we care about with boot banners,
//! status chatter, and whatever else firmware feels like printing. Fragments
//! have no length prefix and no byte-count terminator — the only boundary is
//! textual: a line that exactly equals a recognized open tag starts one, and
//! the matching close tag ends it.
//!
//! The framer is a two-state machine:
//!
//! ```text
//!            open tag line
//!   Idle ──────────────────→ Accumulating
//!    ↑                            │
//!    └────────────────────────────┘
//!          matching close tag
//! ```
//!
//! While `Idle`, every non-tag line is discarded as noise. While
//! `Accumulating`, every line is appended verbatim — including lines that
//! look like tags of the *other* kind — until the close tag recorded at open
//! time appears. A fragment is emitted whole or not at all.
//!
//! Malformed input that never reaches its close tag blocks indefinitely by
//! design: timeout policy belongs to the [`LineSource`] owner, not here.

use crate::errors::SourceError;
use crate::source::LineSource;

/// The two fragment kinds the bridge emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentTag {
    /// Frequent instantaneous-rate fragment (every few seconds).
    InstantaneousDemand,
    /// Sparse authoritative cumulative-energy fragment (every few minutes).
    CurrentSummationDelivered,
}

impl FragmentTag {
    /// Element name, without angle brackets.
    pub const fn name(&self) -> &'static str {
        match self {
            FragmentTag::InstantaneousDemand => "InstantaneousDemand",
            FragmentTag::CurrentSummationDelivered => "CurrentSummationDelivered",
        }
    }

    /// The exact line that opens a fragment of this kind.
    pub const fn open_tag(&self) -> &'static str {
        match self {
            FragmentTag::InstantaneousDemand => "<InstantaneousDemand>",
            FragmentTag::CurrentSummationDelivered => "<CurrentSummationDelivered>",
        }
    }

    /// The exact line that closes a fragment of this kind.
    pub const fn close_tag(&self) -> &'static str {
        match self {
            FragmentTag::InstantaneousDemand => "</InstantaneousDemand>",
            FragmentTag::CurrentSummationDelivered => "</CurrentSummationDelivered>",
        }
    }

    /// Recognize an open-tag line.
    pub fn from_open_line(line: &str) -> Option<Self> {
        match line {
            "<InstantaneousDemand>" => Some(FragmentTag::InstantaneousDemand),
            "<CurrentSummationDelivered>" => Some(FragmentTag::CurrentSummationDelivered),
            _ => None,
        }
    }
}

/// One complete open-tag-to-close-tag unit of the protocol text.
///
/// Lines are kept verbatim, open and close tags included, in original order.
/// Created by the [`Framer`]; consumed (and discarded) by the decoder within
/// one pipeline iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment {
    tag: FragmentTag,
    lines: Vec<String>,
}

impl RawFragment {
    /// Assemble a fragment from captured lines.
    ///
    /// Intended for tests and captured-traffic replay; the decoder still
    /// validates the markup shape.
    pub fn from_lines<I, S>(tag: FragmentTag, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Which kind of fragment this is.
    pub const fn tag(&self) -> FragmentTag {
        self.tag
    }

    /// The raw lines, open tag through close tag inclusive.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Framing counters.
#[derive(Debug, Default, Clone)]
pub struct FramerStats {
    /// Total lines consumed from the source.
    pub lines_read: usize,
    /// Lines discarded while waiting for an open tag.
    pub noise_discarded: usize,
    /// Complete fragments emitted.
    pub fragments_emitted: usize,
}

/// Extracts complete fragments from an unbounded line stream.
pub struct Framer<S> {
    source: S,
    stats: FramerStats,
}

impl<S: LineSource> Framer<S> {
    /// Frame fragments out of `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            stats: FramerStats::default(),
        }
    }

    /// Framing counters so far.
    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    /// Block until the next complete fragment.
    ///
    /// Never returns a partial fragment: if the source dies mid-fragment the
    /// accumulated lines are discarded (decoding is side-effect-free, so
    /// nothing downstream can have observed them).
    pub fn next_fragment(&mut self) -> Result<RawFragment, SourceError> {
        let mut opened: Option<FragmentTag> = None;
        let mut lines: Vec<String> = Vec::new();

        loop {
            let line = self.source.next_line()?;
            self.stats.lines_read += 1;

            match opened {
                None => match FragmentTag::from_open_line(&line) {
                    Some(tag) => {
                        log::trace!("open tag {}", tag.name());
                        opened = Some(tag);
                        lines.push(line);
                    }
                    None => {
                        log::trace!("noise: {line:?}");
                        self.stats.noise_discarded += 1;
                    }
                },
                Some(tag) => {
                    // Only the close tag recorded at open time terminates the
                    // fragment; a close tag of the other kind is payload.
                    let complete = line == tag.close_tag();
                    lines.push(line);
                    if complete {
                        self.stats.fragments_emitted += 1;
                        return Ok(RawFragment { tag, lines });
                    }
                }
            }
        }
    }
}
