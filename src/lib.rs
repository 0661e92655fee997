use crate::cursor::{DualStreamCursor, RecordStore};
use crate::daq::{DaqRecord, WaveformReducer};
use crate::record::OutputRecord;
use crate::sink::RecordSink;
use crate::truth::TruthRecord;
use crate::volumes::VolumeFilterSet;
use bon::bon;

pub use crate::error::Error;

/// Lockstep iteration over the two input streams.
pub mod cursor;
/// Digitizer records and waveform integration.
pub mod daq;
mod error;
/// JSON input files.
pub mod input;
/// The flat per-event output record.
pub mod record;
/// Destinations for output records.
pub mod sink;
/// Simulation truth records and their reduction.
pub mod truth;
/// Volume name selection.
pub mod volumes;

/// Flattens events into [`OutputRecord`]s and hands them to a sink.
///
/// A single record buffer is reused for the whole run. Every event starts by
/// resetting it, so no value can leak from one event into the next. The only
/// state carried between events is the channel count of the waveform
/// reducer.
pub struct Aggregator<S> {
    volumes: VolumeFilterSet,
    sink: S,
    waveforms: WaveformReducer,
    record: OutputRecord,
}

#[bon]
impl<S> Aggregator<S> {
    #[builder]
    pub fn new(#[builder(field)] volumes: VolumeFilterSet, sink: S) -> Self {
        let record = OutputRecord::new(&volumes);

        Self {
            volumes,
            sink,
            waveforms: WaveformReducer::new(),
            record,
        }
    }
}

impl<S, St: aggregator_builder::State> AggregatorBuilder<S, St> {
    /// Track the energy deposit of one more volume.
    pub fn add_volume(mut self, name: impl Into<String>) -> Self {
        self.volumes.insert(name);
        self
    }
    /// Track the energy deposit of every volume in the set, after any volume
    /// already added.
    pub fn volumes(mut self, volumes: &VolumeFilterSet) -> Self {
        for name in volumes.iter() {
            self.volumes.insert(name);
        }
        self
    }
}

impl<S> Aggregator<S> {
    /// Volumes with an energy deposit column.
    pub fn tracked_volumes(&self) -> &VolumeFilterSet {
        &self.volumes
    }
    /// Flatten the event at `index`.
    ///
    /// Fails if a waveform addresses a channel beyond
    /// [`daq::MAX_CHANNELS`].
    pub fn process(
        &mut self,
        index: usize,
        daq: &[DaqRecord],
        truth: &TruthRecord,
    ) -> Result<&OutputRecord, Error> {
        self.reset(index);
        self.populate(daq, truth)?;

        Ok(&self.record)
    }

    fn reset(&mut self, index: usize) {
        let record = &mut self.record;
        record.event_id = index;
        record.total_primary_energy = 0.0;
        record.volume_edep_mut().fill(0.0);
        self.waveforms.reset(&mut record.channel_integrals);
        record.n_channels = self.waveforms.n_channels();
        record.all_channel_integral = 0.0;
    }

    fn populate(&mut self, daq: &[DaqRecord], truth: &TruthRecord) -> Result<(), Error> {
        let record = &mut self.record;
        record.total_primary_energy =
            crate::truth::reduce(truth, &self.volumes, record.volume_edep_mut());
        record.all_channel_integral = self
            .waveforms
            .reduce(daq, &mut record.channel_integrals)?;
        record.n_channels = self.waveforms.n_channels();

        Ok(())
    }
}

impl<S: RecordSink> Aggregator<S> {
    /// Flatten every event of the two streams into the sink, then return the
    /// sink.
    ///
    /// Events are processed in index order up to the length of the shorter
    /// stream. Decoding, reduction and sink errors stop the run.
    pub fn run<D, T>(mut self, daq: D, truth: T) -> Result<S, Error>
    where
        D: RecordStore<Record = Vec<DaqRecord>>,
        T: RecordStore<Record = TruthRecord>,
    {
        self.sink.declare(&self.volumes)?;

        let cursor = DualStreamCursor::new(daq, truth);
        let n_events = cursor.len();
        tracing::info!(n_events, "processing events");

        for step in cursor {
            let (index, daq, truth) = step?;
            tracing::debug!(event = index, n_events, "processing event");
            self.process(index, &daq, &truth)?;
            self.sink.write_record(&self.record)?;
        }
        self.sink.flush()?;

        tracing::info!(
            events_processed = n_events,
            records_written = self.sink.count_written(),
            "processing complete"
        );
        Ok(self.sink)
    }
}
