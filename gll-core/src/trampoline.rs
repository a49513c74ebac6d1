//! Worklist scheduler for non-terminal parsers.
//!
//! The trampoline replaces native recursion with cooperative continuation
//! registration: `chain` returns immediately after registering interest,
//! and results are delivered later by the scheduler's own loop. One
//! trampoline is created per top-level parse and discarded when its
//! worklist drains.
//!
//! Scheduling state, keyed on canonical `(StreamId, ParserId)` pairs:
//!
//! - `worklist` - pending work items, popped LIFO. Pop order affects
//!   exploration order but not final membership.
//! - `continuations` - backlinks interested in results for a pair.
//! - `dispatched` - pairs already pushed once. Each pair's `chain` runs
//!   at most once per trampoline; later interest is served by replay.
//! - `results_so_far` - memoized successes per pair. Failures are
//!   delivered at production time but never memoized.
//! - `delivered` - `(result, backlink)` pairs already sent, so a
//!   re-registered backlink never sees the same result twice.
//!
//! Continuations are plain data (the `Backlink` enum) held in an arena,
//! not closures: the scheduler applies them by pattern matching, and
//! applying one may re-enter `add`/`chain` on the same state.
//!
//! A pair re-entered while its own first dispatch is still executing is
//! registered but receives only what that dispatch later produces,
//! possibly nothing. This under-approximates left-recursive grammars
//! that consume no input; it is the intended behavior, not a gap to fix.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::grammar::{Grammar, ParserId, Shape};
use crate::result::{ResultData, ResultId};
use crate::stream::StreamId;

/// Index into the trampoline's backlink arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BacklinkId(u32);

impl BacklinkId {
    fn new(index: usize) -> Self {
        BacklinkId(index as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the arena of per-disjunction dedup sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DedupId(u32);

impl DedupId {
    fn new(index: usize) -> Self {
        DedupId(index as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A registered continuation, applied by the scheduler when a result
/// arrives for it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Backlink {
    /// Top-level sink: append to the collected output sequence.
    Root,
    /// Per-dispatch sink: memoize successes for the pair and fan out to
    /// every backlink registered under it.
    Produce { parser: ParserId, stream: StreamId },
    /// Waiting on a sequence's `first`. A success suspends on `next` at
    /// the success's remainder; a failure is forwarded unchanged.
    SeqFirst { next: ParserId, target: BacklinkId },
    /// Waiting on a sequence's `next`. A success pairs the two values; a
    /// failure is forwarded unchanged.
    SeqRest {
        first_value: crate::value::ValueId,
        target: BacklinkId,
    },
    /// Forwards an alternative's results, deduplicated per disjunction
    /// expansion: the same canonical result reached through two
    /// alternatives is forwarded once.
    AltForward { dedup: DedupId, target: BacklinkId },
}

type PairKey = (StreamId, ParserId);

/// The scheduler. One instance per top-level parse of a non-terminal
/// parser.
#[derive(Debug, Default)]
pub(crate) struct Trampoline {
    worklist: Vec<(ParserId, StreamId)>,
    continuations: FxHashMap<PairKey, SmallVec<[BacklinkId; 2]>>,
    dispatched: FxHashSet<PairKey>,
    results_so_far: FxHashMap<PairKey, Vec<ResultId>>,
    delivered: FxHashSet<(ResultId, BacklinkId)>,
    backlinks: Vec<Backlink>,
    dedups: Vec<FxHashSet<ResultId>>,
    collected: Vec<ResultId>,
}

impl Trampoline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Seed the root continuation, run the worklist to exhaustion, and
    /// return every delivered result in delivery order.
    pub(crate) fn collect(
        mut self,
        g: &mut Grammar,
        parser: ParserId,
        stream: StreamId,
    ) -> Vec<ResultId> {
        let root = self.backlink(Backlink::Root);
        self.chain(g, parser, stream, root);
        self.run(g);
        debug!(
            results = self.collected.len(),
            dispatched = self.dispatched.len(),
            "trampoline drained"
        );
        self.collected
    }

    fn backlink(&mut self, backlink: Backlink) -> BacklinkId {
        let id = BacklinkId::new(self.backlinks.len());
        self.backlinks.push(backlink);
        id
    }

    fn new_dedup(&mut self) -> DedupId {
        let id = DedupId::new(self.dedups.len());
        self.dedups.push(FxHashSet::default());
        id
    }

    /// Register `backlink` under `(stream, parser)`. Memoized successes
    /// are replayed to it immediately; otherwise the pair is scheduled on
    /// first registration.
    fn add(&mut self, g: &mut Grammar, parser: ParserId, stream: StreamId, backlink: BacklinkId) {
        let key = (stream, parser);
        self.continuations.entry(key).or_default().push(backlink);

        let cached: SmallVec<[ResultId; 4]> = self
            .results_so_far
            .get(&key)
            .map(|memo| memo.iter().copied().collect())
            .unwrap_or_default();
        if !cached.is_empty() {
            trace!(
                parser = parser.index(),
                offset = g.streams().offset(stream),
                hits = cached.len(),
                "replay"
            );
            for result in cached {
                self.offer(g, result, backlink);
            }
        } else if self.dispatched.insert(key) {
            trace!(
                parser = parser.index(),
                offset = g.streams().offset(stream),
                "schedule"
            );
            self.worklist.push((parser, stream));
        }
    }

    /// Evaluate one step of `parser` at `stream`, sending results to
    /// `target`. Terminal parsers finish synchronously; a sequence
    /// suspends on its `first`; a disjunction registers every flattened
    /// alternative with the scheduler.
    fn chain(&mut self, g: &mut Grammar, parser: ParserId, stream: StreamId, target: BacklinkId) {
        match g.shape(parser) {
            Shape::Terminal => {
                let result = g.parse_terminal(parser, stream);
                self.offer(g, result, target);
            }
            Shape::Seq { first, next } => {
                let cont = self.backlink(Backlink::SeqFirst { next, target });
                self.chain(g, first, stream, cont);
            }
            Shape::Alt => {
                let alternatives = g.alternatives(parser);
                let dedup = self.new_dedup();
                for alternative in alternatives {
                    let forward = self.backlink(Backlink::AltForward { dedup, target });
                    self.add(g, alternative, stream, forward);
                }
            }
        }
    }

    /// Drain the worklist. Each popped pair gets its `chain` invoked
    /// exactly once, with the pair's producing sink as target.
    fn run(&mut self, g: &mut Grammar) {
        while let Some((parser, stream)) = self.worklist.pop() {
            trace!(
                parser = parser.index(),
                offset = g.streams().offset(stream),
                "dispatch"
            );
            let sink = self.backlink(Backlink::Produce { parser, stream });
            self.chain(g, parser, stream, sink);
        }
    }

    /// Deliver `result` to `backlink` unless that exact pair was already
    /// sent.
    fn offer(&mut self, g: &mut Grammar, result: ResultId, backlink: BacklinkId) {
        if self.delivered.insert((result, backlink)) {
            self.deliver(g, result, backlink);
        }
    }

    fn deliver(&mut self, g: &mut Grammar, result: ResultId, backlink: BacklinkId) {
        match self.backlinks[backlink.index()] {
            Backlink::Root => {
                trace!(result = result.index(), "collect");
                self.collected.push(result);
            }
            Backlink::Produce { parser, stream } => self.produce(g, parser, stream, result),
            Backlink::SeqFirst { next, target } => match g.results().get(result) {
                ResultData::Success { value, rest } => {
                    let cont = self.backlink(Backlink::SeqRest {
                        first_value: value,
                        target,
                    });
                    self.chain(g, next, rest, cont);
                }
                ResultData::Failure { .. } => self.offer(g, result, target),
            },
            Backlink::SeqRest { first_value, target } => match g.results().get(result) {
                ResultData::Success { value, rest } => {
                    let paired = g.pair_success(first_value, value, rest);
                    self.offer(g, paired, target);
                }
                ResultData::Failure { .. } => self.offer(g, result, target),
            },
            Backlink::AltForward { dedup, target } => {
                if self.dedups[dedup.index()].insert(result) {
                    self.offer(g, result, target);
                }
            }
        }
    }

    /// Record a produced result for its pair and fan it out.
    ///
    /// Fan-out reads the registration list by index because delivering
    /// may register further backlinks under the same pair; those are
    /// visited too. The `delivered` set keeps every (result, backlink)
    /// pair at-most-once across production and replay.
    fn produce(&mut self, g: &mut Grammar, parser: ParserId, stream: StreamId, result: ResultId) {
        let key = (stream, parser);
        if g.results().is_success(result) {
            let memo = self.results_so_far.entry(key).or_default();
            if !memo.contains(&result) {
                memo.push(result);
            }
        }
        let mut i = 0;
        loop {
            let backlink = match self.continuations.get(&key).and_then(|list| list.get(i)) {
                Some(&backlink) => backlink,
                None => break,
            };
            i += 1;
            self.offer(g, result, backlink);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
