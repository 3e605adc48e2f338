use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::info;

use billcraft_core::{BookingError, BookingResult};

use crate::sequence::SequenceState;

/// Persistence seam for numbering state.
///
/// `with_sequence` is the transactional unit: implementations must run `f`
/// against the stored state for `code` as a single atomic, serializable
/// section, so that concurrent callers for the same code observe strictly
/// increasing counters with no duplicate or skipped numbers. A
/// database-backed store should hold a row-level lock (or a serializable
/// transaction) on the sequence row for the duration of `f`; an in-process
/// mutex only suffices for a single-process deployment. When `f` fails, no
/// state change may be persisted.
pub trait SequenceStore: Send + Sync {
    /// Install or replace the sequence row for a code (operator setup).
    fn install(&self, state: SequenceState) -> BookingResult<()>;

    /// Snapshot of the current state for a code, if configured.
    fn sequence(&self, code: &str) -> BookingResult<Option<SequenceState>>;

    /// Run `f` atomically against the state for `code`.
    ///
    /// Fails with a `Configuration` error when no sequence exists for
    /// `code`. State mutations made by `f` are persisted only when `f`
    /// returns `Ok`.
    fn with_sequence(
        &self,
        code: &str,
        f: &mut dyn FnMut(&mut SequenceState) -> BookingResult<String>,
    ) -> BookingResult<String>;
}

impl<S> SequenceStore for std::sync::Arc<S>
where
    S: SequenceStore + ?Sized,
{
    fn install(&self, state: SequenceState) -> BookingResult<()> {
        (**self).install(state)
    }

    fn sequence(&self, code: &str) -> BookingResult<Option<SequenceState>> {
        (**self).sequence(code)
    }

    fn with_sequence(
        &self,
        code: &str,
        f: &mut dyn FnMut(&mut SequenceState) -> BookingResult<String>,
    ) -> BookingResult<String> {
        (**self).with_sequence(code, f)
    }
}

/// In-memory sequence store.
///
/// A single mutex serializes all allocations, which satisfies the atomicity
/// contract for one process. Intended for tests/dev and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    sequences: Mutex<HashMap<String, SequenceState>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn install(&self, state: SequenceState) -> BookingResult<()> {
        let mut sequences = self
            .sequences
            .lock()
            .map_err(|_| BookingError::storage("sequence store lock poisoned"))?;
        sequences.insert(state.code().to_string(), state);
        Ok(())
    }

    fn sequence(&self, code: &str) -> BookingResult<Option<SequenceState>> {
        let sequences = self
            .sequences
            .lock()
            .map_err(|_| BookingError::storage("sequence store lock poisoned"))?;
        Ok(sequences.get(code).cloned())
    }

    fn with_sequence(
        &self,
        code: &str,
        f: &mut dyn FnMut(&mut SequenceState) -> BookingResult<String>,
    ) -> BookingResult<String> {
        let mut sequences = self
            .sequences
            .lock()
            .map_err(|_| BookingError::storage("sequence store lock poisoned"))?;
        let state = sequences
            .get_mut(code)
            .ok_or_else(|| BookingError::MissingSequence {
                code: code.to_string(),
            })?;

        // Work on a scratch copy so a failed `f` persists nothing.
        let mut scratch = state.clone();
        let number = f(&mut scratch)?;
        *state = scratch;
        Ok(number)
    }
}

/// Allocates formatted document numbers.
///
/// The sole writer of [`SequenceState`]: all counter mutations go through
/// `allocate`, inside the store's atomic section.
#[derive(Debug)]
pub struct SequenceAllocator<S> {
    store: S,
}

impl<S> SequenceAllocator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: SequenceStore> SequenceAllocator<S> {
    /// Allocate the next formatted number for `code` at `date`.
    pub fn allocate(&self, code: &str, date: NaiveDate) -> BookingResult<String> {
        let number = self
            .store
            .with_sequence(code, &mut |state| state.allocate(date))?;
        info!(code, %number, %date, "document number allocated");
        Ok(number)
    }
}
