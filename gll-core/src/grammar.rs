//! Parser graph construction and evaluation.
//!
//! Parsers are nodes in a composition graph, stored in an index-based
//! arena so that a back-edge assigned after construction (to close a
//! recursive cycle) never creates an ownership cycle. Kinds:
//!
//! - `Literal` - matches exact text. Terminal.
//! - `TerminalSeq` - sequence of two terminal parsers. Terminal.
//! - `Seq` - sequence with at least one non-terminal operand.
//! - `Alt` - disjunction of two parsers. Always non-terminal.
//!
//! Terminal parsers evaluate by direct recursive descent and yield a
//! single result. Non-terminal parsers evaluate on the worklist
//! scheduler in `trampoline` and yield an ordered sequence of results -
//! several on an ambiguous grammar, none or only failures when no
//! derivation exists.

use std::fmt;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::result::{ResultData, ResultId, ResultTable, ResultView};
use crate::stream::{StreamId, StreamTable};
use crate::trampoline::Trampoline;
use crate::value::{ValueId, ValueTable};

// ============================================================================
// Core Types
// ============================================================================

/// Index into the grammar's parser arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParserId(u32);

impl ParserId {
    fn new(index: usize) -> Self {
        ParserId(index as u32)
    }

    /// Arena index of this parser.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of parser node.
#[derive(Debug)]
enum ParserKind {
    /// Exact text match. The success value is interned at construction.
    Literal { text: Box<str>, value: ValueId },
    /// Sequence of two terminal parsers; evaluated by direct descent.
    TerminalSeq { first: ParserId, next: ParserId },
    /// Sequence with a non-terminal operand; evaluated on the trampoline.
    Seq { first: ParserId, next: ParserId },
    /// Disjunction; evaluated on the trampoline.
    Alt { first: ParserId, next: ParserId },
}

/// Evaluation shape of a node, for the scheduler's dispatch.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape {
    Terminal,
    Seq { first: ParserId, next: ParserId },
    Alt,
}

/// Error from grammar construction misuse. Distinct from a parse
/// `Failure`, which is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarError {
    /// The parser is a literal; it has no child slots to re-point.
    NotComposite(ParserId),
    /// The parser is a terminal sequence. Its operands' terminality is
    /// recorded at construction, so its children cannot be re-pointed.
    FrozenTerminalSequence(ParserId),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::NotComposite(p) => {
                write!(f, "parser #{} is a literal with no child parsers", p.index())
            }
            GrammarError::FrozenTerminalSequence(p) => {
                write!(
                    f,
                    "parser #{} is a terminal sequence; children are fixed at construction",
                    p.index()
                )
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// Output of a top-level parse.
///
/// Terminal parsers produce exactly one result; non-terminal parsers
/// produce an ordered sequence with zero or more entries, in delivery
/// order. Callers distinguish "no derivation" from "ambiguous success" by
/// inspecting the contents, not via a separate error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// Single result from direct descent on a terminal parser.
    One(ResultId),
    /// Result sequence from a trampoline run on a non-terminal parser.
    Many(Vec<ResultId>),
}

impl Parsed {
    /// All results, for either variant.
    pub fn results(&self) -> &[ResultId] {
        match self {
            Parsed::One(result) => std::slice::from_ref(result),
            Parsed::Many(results) => results,
        }
    }

    /// All results, owned.
    pub fn into_results(self) -> Vec<ResultId> {
        match self {
            Parsed::One(result) => vec![result],
            Parsed::Many(results) => results,
        }
    }

    /// The result, if there is exactly one.
    pub fn single(&self) -> Option<ResultId> {
        match self.results() {
            [result] => Some(*result),
            _ => None,
        }
    }
}

// ============================================================================
// Grammar
// ============================================================================

/// A parser composition graph together with the canonicalization tables
/// its evaluations share.
///
/// Build parsers with [`literal`], [`followed_by`] and [`alternately`],
/// close recursive cycles with [`set_first`]/[`set_next`], then call
/// [`parse`]. Graphs are reusable: tables are append-only and later
/// `parse` calls replay canonical IDs from earlier ones.
///
/// [`literal`]: Grammar::literal
/// [`followed_by`]: Grammar::followed_by
/// [`alternately`]: Grammar::alternately
/// [`set_first`]: Grammar::set_first
/// [`set_next`]: Grammar::set_next
/// [`parse`]: Grammar::parse
#[derive(Debug, Default)]
pub struct Grammar {
    parsers: Vec<ParserKind>,
    streams: StreamTable,
    values: ValueTable,
    results: ResultTable,
}

impl Grammar {
    /// Create an empty grammar.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    /// A parser matching exactly `text`.
    pub fn literal(&mut self, text: &str) -> ParserId {
        let value = self.values.text(text);
        self.push(ParserKind::Literal { text: text.into(), value })
    }

    /// Sequence: `first` then `next`. Terminal when both operands are
    /// terminal, otherwise evaluated on the trampoline.
    pub fn followed_by(&mut self, first: ParserId, next: ParserId) -> ParserId {
        if self.is_terminal(first) && self.is_terminal(next) {
            self.push(ParserKind::TerminalSeq { first, next })
        } else {
            self.push(ParserKind::Seq { first, next })
        }
    }

    /// Disjunction: `first` or `next`. Always non-terminal.
    pub fn alternately(&mut self, first: ParserId, next: ParserId) -> ParserId {
        self.push(ParserKind::Alt { first, next })
    }

    fn push(&mut self, kind: ParserKind) -> ParserId {
        let id = ParserId::new(self.parsers.len());
        self.parsers.push(kind);
        id
    }

    /// Re-point the `first` child of a `Seq` or `Alt` node, closing a
    /// recursive cycle.
    pub fn set_first(&mut self, parser: ParserId, child: ParserId) -> Result<(), GrammarError> {
        match &mut self.parsers[parser.index()] {
            ParserKind::Seq { first, .. } | ParserKind::Alt { first, .. } => {
                *first = child;
                Ok(())
            }
            ParserKind::Literal { .. } => Err(GrammarError::NotComposite(parser)),
            ParserKind::TerminalSeq { .. } => Err(GrammarError::FrozenTerminalSequence(parser)),
        }
    }

    /// Re-point the `next` child of a `Seq` or `Alt` node, closing a
    /// recursive cycle.
    pub fn set_next(&mut self, parser: ParserId, child: ParserId) -> Result<(), GrammarError> {
        match &mut self.parsers[parser.index()] {
            ParserKind::Seq { next, .. } | ParserKind::Alt { next, .. } => {
                *next = child;
                Ok(())
            }
            ParserKind::Literal { .. } => Err(GrammarError::NotComposite(parser)),
            ParserKind::TerminalSeq { .. } => Err(GrammarError::FrozenTerminalSequence(parser)),
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// True if the parser evaluates by direct descent, with no
    /// trampoline suspension.
    pub fn is_terminal(&self, parser: ParserId) -> bool {
        matches!(
            self.parsers[parser.index()],
            ParserKind::Literal { .. } | ParserKind::TerminalSeq { .. }
        )
    }

    pub(crate) fn shape(&self, parser: ParserId) -> Shape {
        match self.parsers[parser.index()] {
            ParserKind::Literal { .. } | ParserKind::TerminalSeq { .. } => Shape::Terminal,
            ParserKind::Seq { first, next } => Shape::Seq { first, next },
            ParserKind::Alt { .. } => Shape::Alt,
        }
    }

    /// The distinct non-disjunctive alternatives reachable from `parser`,
    /// in depth-first traversal order.
    ///
    /// Computed by traversal on every call, never cached: back-edges may
    /// be re-pointed after construction. A disjunction reachable from
    /// itself is not re-expanded, so cyclic graphs flatten to a finite
    /// set.
    pub fn alternatives(&self, parser: ParserId) -> SmallVec<[ParserId; 4]> {
        let mut seen = FxHashSet::default();
        let mut out = SmallVec::new();
        self.gather(parser, &mut seen, &mut out);
        out
    }

    fn gather(
        &self,
        parser: ParserId,
        seen: &mut FxHashSet<ParserId>,
        out: &mut SmallVec<[ParserId; 4]>,
    ) {
        match self.parsers[parser.index()] {
            ParserKind::Alt { first, next } => {
                if seen.insert(parser) {
                    self.gather(first, seen, out);
                    self.gather(next, seen, out);
                }
            }
            _ => {
                if !out.contains(&parser) {
                    out.push(parser);
                }
            }
        }
    }

    /// The stream table shared by this grammar's parses.
    #[inline]
    pub fn streams(&self) -> &StreamTable {
        &self.streams
    }

    #[inline]
    pub(crate) fn streams_mut(&mut self) -> &mut StreamTable {
        &mut self.streams
    }

    /// The value table shared by this grammar's parses.
    #[inline]
    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    /// The result table shared by this grammar's parses.
    #[inline]
    pub fn results(&self) -> &ResultTable {
        &self.results
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Parse `input` with `parser` from the start of the buffer.
    pub fn parse(&mut self, parser: ParserId, input: &str) -> Parsed {
        let buffer = self.streams.buffer(input);
        let stream = self.streams.stream(buffer, 0);
        self.parse_at(parser, stream)
    }

    /// Parse from an existing stream position.
    ///
    /// Terminal parsers run by direct descent. Non-terminal parsers get a
    /// fresh trampoline, discarded once its worklist drains; the
    /// canonicalization tables persist in the grammar.
    pub fn parse_at(&mut self, parser: ParserId, stream: StreamId) -> Parsed {
        if self.is_terminal(parser) {
            Parsed::One(self.parse_terminal(parser, stream))
        } else {
            Parsed::Many(Trampoline::new().collect(self, parser, stream))
        }
    }

    /// Direct recursive descent over terminal kinds. Single-valued: no
    /// ambiguity is possible among pure terminal compositions.
    pub(crate) fn parse_terminal(&mut self, parser: ParserId, stream: StreamId) -> ResultId {
        match &self.parsers[parser.index()] {
            ParserKind::Literal { text, value } => {
                let text = text.clone();
                let value = *value;
                let rest = self.streams.rest(stream);
                if rest.len() < text.len() {
                    let reason = self.results.reason("unexpected end of input");
                    self.results.failure(reason, stream)
                } else if rest.as_bytes().starts_with(text.as_bytes()) {
                    let after = self.streams.advance(stream, text.len());
                    self.results.success(value, after)
                } else {
                    // Round the mismatching prefix up to a character
                    // boundary so the message shows whole characters.
                    let mut end = text.len();
                    while end < rest.len() && !rest.is_char_boundary(end) {
                        end += 1;
                    }
                    let message = format!("expected '{}', but got '{}'", text, &rest[..end]);
                    let reason = self.results.reason(&message);
                    self.results.failure(reason, stream)
                }
            }
            ParserKind::TerminalSeq { first, next } => {
                let (first, next) = (*first, *next);
                let r1 = self.parse_terminal(first, stream);
                match self.results.get(r1) {
                    ResultData::Success { value: v1, rest } => {
                        let r2 = self.parse_terminal(next, rest);
                        match self.results.get(r2) {
                            ResultData::Success { value: v2, rest } => {
                                self.pair_success(v1, v2, rest)
                            }
                            ResultData::Failure { .. } => r2,
                        }
                    }
                    ResultData::Failure { .. } => r1,
                }
            }
            ParserKind::Seq { .. } | ParserKind::Alt { .. } => {
                unreachable!("non-terminal parser reached terminal descent")
            }
        }
    }

    /// Canonical success pairing two child values.
    pub(crate) fn pair_success(
        &mut self,
        first: ValueId,
        second: ValueId,
        rest: StreamId,
    ) -> ResultId {
        let value = self.values.pair(first, second);
        self.results.success(value, rest)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Resolve a result to its view: discriminant plus payload and
    /// remainder text.
    pub fn view(&self, result: ResultId) -> ResultView<'_> {
        match self.results.get(result) {
            ResultData::Success { value, rest } => ResultView::Success {
                value: self.values.resolve(value),
                rest: self.streams.rest(rest),
            },
            ResultData::Failure { reason, rest } => ResultView::Failure {
                reason: self.results.reason_text(reason),
                rest: self.streams.rest(rest),
            },
        }
    }

    /// Resolve every result in a parse output.
    pub fn views(&self, parsed: &Parsed) -> Vec<ResultView<'_>> {
        parsed.results().iter().map(|&r| self.view(r)).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
