//! Document-number sequences.
//!
//! One [`SequenceState`] row exists per document-type code (e.g. `"invoice"`).
//! Allocation is monotonic in date, gap-free, and resets yearly when the
//! format template carries a year placeholder. The read-increment-write is
//! the only shared mutable resource of the booking engine and runs as a
//! single atomic unit behind [`SequenceStore`].

pub mod sequence;
pub mod store;

pub use sequence::{COUNTER_PLACEHOLDER, SequenceState, YEAR_PLACEHOLDER};
pub use store::{InMemorySequenceStore, SequenceAllocator, SequenceStore};
