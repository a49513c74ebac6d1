//! GLL Combinator Engine
//!
//! Composable parser primitives (literal match, sequence, disjunction)
//! evaluated either by direct recursive descent, for unambiguous
//! terminal compositions, or by an explicit worklist scheduler that
//! supports ambiguity and self-referential grammars without unbounded
//! call-stack growth or re-exploration of already-solved subproblems.
//!
//! # Architecture
//!
//! - **stream.rs** - interned input cursors; one `StreamId` per
//!   `(buffer, offset)`
//! - **value.rs** - interned parse values (text leaves, pairs)
//! - **result.rs** - canonical Success/Failure outcomes and views
//! - **grammar.rs** - the parser graph arena, combinators, terminal
//!   descent, and the top-level `parse` entry
//! - **trampoline.rs** - the worklist scheduler with memoization and
//!   delivery deduplication
//!
//! # Example
//!
//! ```
//! use gll_core::{Grammar, ResultView};
//!
//! let mut g = Grammar::new();
//! let bird = g.literal("bird");
//! let word = g.literal("istheword");
//! let both = g.followed_by(bird, word);
//!
//! let parsed = g.parse(both, "birdistheword");
//! match g.view(parsed.single().unwrap()) {
//!     ResultView::Success { value, rest } => {
//!         assert_eq!(value.leaves(), vec!["bird", "istheword"]);
//!         assert_eq!(rest, "");
//!     }
//!     failure => panic!("unexpected: {:?}", failure),
//! }
//! ```

pub mod grammar;
pub mod result;
pub mod stream;
pub(crate) mod trampoline;
pub mod value;

pub use grammar::{Grammar, GrammarError, Parsed, ParserId};
pub use result::{ReasonId, ResultData, ResultId, ResultTable, ResultView};
pub use stream::{BufferId, StreamId, StreamTable};
pub use value::{Value, ValueId, ValueTable};
