use crate::error::Error;

/// A store of per-event records addressable by event index.
pub trait RecordStore {
    type Record;

    /// Number of records in the store.
    fn count(&self) -> usize;
    /// Decode record `index` into a freshly owned value.
    fn decode(&self, index: usize) -> Result<Self::Record, Error>;
}

impl<T: Clone> RecordStore for Vec<T> {
    type Record = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn decode(&self, index: usize) -> Result<T, Error> {
        self.get(index).cloned().ok_or(Error::OutOfRange {
            collection: "memory",
            index,
            count: self.len(),
        })
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    type Record = S::Record;

    fn count(&self) -> usize {
        (**self).count()
    }

    fn decode(&self, index: usize) -> Result<S::Record, Error> {
        (**self).decode(index)
    }
}

/// Walks a DAQ store and a truth store in lockstep.
///
/// The two stores are only related by position: entry `i` of one describes
/// the same event as entry `i` of the other. Iteration covers the shorter of
/// the two, and a warning is logged on construction if their lengths differ.
#[derive(Debug)]
pub struct DualStreamCursor<D, T> {
    daq: D,
    truth: T,
    daq_count: usize,
    truth_count: usize,
    next: usize,
}

impl<D, T> DualStreamCursor<D, T>
where
    D: RecordStore,
    T: RecordStore,
{
    pub fn new(daq: D, truth: T) -> Self {
        let daq_count = daq.count();
        let truth_count = truth.count();
        if daq_count != truth_count {
            tracing::warn!(
                daq_count,
                truth_count,
                "different number of entries in input streams, processing the first {}",
                daq_count.min(truth_count)
            );
        }

        Self {
            daq,
            truth,
            daq_count,
            truth_count,
            next: 0,
        }
    }
    /// Number of events this cursor yields in total.
    pub fn len(&self) -> usize {
        self.daq_count.min(self.truth_count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns `true` if both stores have the same number of entries.
    pub fn is_aligned(&self) -> bool {
        self.daq_count == self.truth_count
    }
}

impl<D, T> Iterator for DualStreamCursor<D, T>
where
    D: RecordStore,
    T: RecordStore,
{
    type Item = Result<(usize, D::Record, T::Record), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let step = self
            .daq
            .decode(index)
            .and_then(|daq| Ok((index, daq, self.truth.decode(index)?)));
        if step.is_err() {
            // A failed decode ends the walk.
            self.next = self.len();
        }

        Some(step)
    }
}
