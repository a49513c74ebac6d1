//! Canonical parse outcomes.
//!
//! A parse produces `Success { value, rest }` or `Failure { reason, rest }`.
//! Results are interned per `(variant, payload, rest)` key: the factories
//! `success` and `failure` return the unique `ResultId` for their
//! arguments. Ambiguous-result deduplication is set membership on that
//! identity.
//!
//! A failure's `rest` is the unconsumed stream - the position does not
//! advance past a non-match. Failure reasons mention what was expected and
//! what was found; they are interned strings so results stay `Copy`.

use rustc_hash::FxHashMap;

use crate::stream::StreamId;
use crate::value::ValueId;

/// Index into the reason arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReasonId(u32);

impl ReasonId {
    fn new(index: usize) -> Self {
        ReasonId(index as u32)
    }

    /// Arena index of this reason.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the result arena. The canonical identity of an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultId(u32);

impl ResultId {
    fn new(index: usize) -> Self {
        ResultId(index as u32)
    }

    /// Arena index of this result.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parse outcome, by ID. `Copy`, and usable as a table key directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultData {
    /// The parser matched; `rest` is the input after the match.
    Success { value: ValueId, rest: StreamId },
    /// The parser did not match; `rest` is the unconsumed input.
    Failure { reason: ReasonId, rest: StreamId },
}

impl ResultData {
    /// True for the `Success` variant.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ResultData::Success { .. })
    }

    /// The remainder stream, for either variant.
    #[inline]
    pub fn rest(&self) -> StreamId {
        match self {
            ResultData::Success { rest, .. } | ResultData::Failure { rest, .. } => *rest,
        }
    }
}

/// Interning table for results and failure reasons.
#[derive(Debug, Default)]
pub struct ResultTable {
    results: Vec<ResultData>,
    result_ids: FxHashMap<ResultData, ResultId>,
    reasons: Vec<Box<str>>,
    reason_ids: FxHashMap<Box<str>, ReasonId>,
}

impl ResultTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a failure reason by content.
    pub fn reason(&mut self, text: &str) -> ReasonId {
        if let Some(&id) = self.reason_ids.get(text) {
            return id;
        }
        let id = ReasonId::new(self.reasons.len());
        let owned: Box<str> = text.into();
        self.reasons.push(owned.clone());
        self.reason_ids.insert(owned, id);
        id
    }

    /// Text of an interned reason.
    #[inline]
    pub fn reason_text(&self, id: ReasonId) -> &str {
        &self.reasons[id.index()]
    }

    /// Canonical success for `(value, rest)`.
    pub fn success(&mut self, value: ValueId, rest: StreamId) -> ResultId {
        self.intern(ResultData::Success { value, rest })
    }

    /// Canonical failure for `(reason, rest)`.
    pub fn failure(&mut self, reason: ReasonId, rest: StreamId) -> ResultId {
        self.intern(ResultData::Failure { reason, rest })
    }

    fn intern(&mut self, data: ResultData) -> ResultId {
        if let Some(&id) = self.result_ids.get(&data) {
            return id;
        }
        let id = ResultId::new(self.results.len());
        self.results.push(data);
        self.result_ids.insert(data, id);
        id
    }

    /// Look up a result by ID.
    #[inline]
    pub fn get(&self, id: ResultId) -> ResultData {
        self.results[id.index()]
    }

    /// True if the result is a success.
    #[inline]
    pub fn is_success(&self, id: ResultId) -> bool {
        self.get(id).is_success()
    }

    /// Number of interned results.
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// True if no results have been interned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// A resolved parse outcome for consumers: discriminant plus payload and
/// remainder text, with no interner details attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView<'a> {
    /// The parser matched.
    Success {
        value: crate::value::Value<'a>,
        rest: &'a str,
    },
    /// The parser did not match.
    Failure { reason: &'a str, rest: &'a str },
}

impl<'a> ResultView<'a> {
    /// True for the `Success` variant.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, ResultView::Success { .. })
    }

    /// The remainder text, for either variant.
    #[inline]
    pub fn rest(&self) -> &'a str {
        match self {
            ResultView::Success { rest, .. } | ResultView::Failure { rest, .. } => rest,
        }
    }

    /// The success value, if any.
    #[inline]
    pub fn value(&self) -> Option<&crate::value::Value<'a>> {
        match self {
            ResultView::Success { value, .. } => Some(value),
            ResultView::Failure { .. } => None,
        }
    }

    /// The failure reason, if any.
    #[inline]
    pub fn reason(&self) -> Option<&'a str> {
        match self {
            ResultView::Failure { reason, .. } => Some(reason),
            ResultView::Success { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamTable;
    use crate::value::ValueTable;

    #[test]
    fn test_success_identity() {
        let mut streams = StreamTable::new();
        let mut values = ValueTable::new();
        let mut results = ResultTable::new();

        let buf = streams.buffer("bird");
        let rest = streams.stream(buf, 4);
        let value = values.text("bird");

        let a = results.success(value, rest);
        let b = results.success(value, rest);
        assert_eq!(a, b);
        assert!(results.is_success(a));
    }

    #[test]
    fn test_failure_identity() {
        let mut streams = StreamTable::new();
        let mut results = ResultTable::new();

        let buf = streams.buffer("notbird");
        let at = streams.stream(buf, 0);
        let reason = results.reason("expected 'bird', but got 'notb'");

        let a = results.failure(reason, at);
        let b = results.failure(reason, at);
        assert_eq!(a, b);
        assert!(!results.is_success(a));
    }

    #[test]
    fn test_variants_do_not_collide() {
        let mut streams = StreamTable::new();
        let mut values = ValueTable::new();
        let mut results = ResultTable::new();

        let buf = streams.buffer("x");
        let at = streams.stream(buf, 0);
        let value = values.text("x");
        let reason = results.reason("x");

        let ok = results.success(value, at);
        let err = results.failure(reason, at);
        assert_ne!(ok, err);
    }

    #[test]
    fn test_reason_identity() {
        let mut results = ResultTable::new();
        let a = results.reason("unexpected end of input");
        let b = results.reason("unexpected end of input");
        assert_eq!(a, b);
        assert_eq!(results.reason_text(a), "unexpected end of input");
    }
}
