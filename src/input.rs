use crate::cursor::RecordStore;
use crate::daq::DaqRecord;
use crate::error::Error;
use crate::truth::TruthRecord;
use crate::volumes::ParseError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::marker::PhantomData;
use std::path::Path;

const DAQ_COLLECTION: &str = "daq_events";
const TRUTH_COLLECTION: &str = "truth_events";

#[derive(Deserialize)]
struct Document {
    daq_events: Option<Vec<Box<RawValue>>>,
    truth_events: Option<Vec<Box<RawValue>>>,
}

/// One collection of a JSON input file.
///
/// Entries are kept as raw JSON text and only decoded when requested.
#[derive(Debug)]
pub struct JsonStore<R> {
    collection: &'static str,
    entries: Vec<Box<RawValue>>,
    record: PhantomData<fn() -> R>,
}

impl<R> JsonStore<R> {
    fn new(collection: &'static str, entries: Vec<Box<RawValue>>) -> Self {
        Self {
            collection,
            entries,
            record: PhantomData,
        }
    }
}

impl<R: DeserializeOwned> RecordStore for JsonStore<R> {
    type Record = R;

    fn count(&self) -> usize {
        self.entries.len()
    }

    fn decode(&self, index: usize) -> Result<R, Error> {
        let entry = self.entries.get(index).ok_or(Error::OutOfRange {
            collection: self.collection,
            index,
            count: self.entries.len(),
        })?;
        serde_json::from_str(entry.get()).map_err(|error| Error::Entry {
            collection: self.collection,
            index,
            source: ParseError::from_json(entry.get(), &error),
        })
    }
}

/// The DAQ stream: every entry is the list of DAQ records of one event.
pub type DaqStore = JsonStore<Vec<DaqRecord>>;
/// The truth stream: every entry is the truth record of one event.
pub type TruthStore = JsonStore<TruthRecord>;

/// Split a JSON input document into its DAQ and truth streams.
///
/// # Examples
///
/// ```
/// use edep::cursor::RecordStore;
///
/// let (daq, truth) = edep::input::from_str(r#"{"daq_events": [[]], "truth_events": [{}, {}]}"#)?;
/// assert_eq!(daq.count(), 1);
/// assert_eq!(truth.count(), 2);
/// # Ok::<(), edep::Error>(())
/// ```
pub fn from_str(text: &str) -> Result<(DaqStore, TruthStore), Error> {
    let document: Document = serde_json::from_str(text)
        .map_err(|error| Error::Document(ParseError::from_json(text, &error)))?;
    let daq = document
        .daq_events
        .ok_or(Error::MissingCollection(DAQ_COLLECTION))?;
    let truth = document
        .truth_events
        .ok_or(Error::MissingCollection(TRUTH_COLLECTION))?;

    Ok((
        JsonStore::new(DAQ_COLLECTION, daq),
        JsonStore::new(TRUTH_COLLECTION, truth),
    ))
}

/// Read a JSON input file. See [`from_str`].
pub fn open(path: impl AsRef<Path>) -> Result<(DaqStore, TruthStore), Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;

    from_str(&text)
}
