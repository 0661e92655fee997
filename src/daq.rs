use crate::error::Error;
use num_traits::AsPrimitive;
use serde::Deserialize;

/// Largest number of channel slots an event may address. Channel identifiers
/// at or above this are rejected instead of sizing the integral array after
/// them.
pub const MAX_CHANNELS: usize = 1 << 20;

/// A digitized waveform from a single DAQ channel.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Waveform {
    /// Channel identifier.
    pub chid: u32,
    pub samples: Vec<f64>,
    /// Time between consecutive samples.
    pub sample_period: f64,
}

impl Waveform {
    /// Time-integral of the waveform. See [`integral`].
    pub fn integral(&self) -> f64 {
        integral(&self.samples, self.sample_period)
    }
}

/// Returns `sum(samples) * sample_period`.
///
/// The integral of a waveform without samples is exactly `0.0`, regardless
/// of the sample period.
///
/// # Examples
///
/// ```
/// use edep::daq::integral;
///
/// assert_eq!(integral(&[1.0, 2.0, 3.0], 0.5), 3.0);
/// assert_eq!(integral(&[512u16, 513], 2.0), 2050.0);
/// assert_eq!(integral::<f64>(&[], f64::NAN), 0.0);
/// ```
pub fn integral<S>(samples: &[S], sample_period: f64) -> f64
where
    S: AsPrimitive<f64>,
{
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| AsPrimitive::<f64>::as_(s)).sum();

    sum * sample_period
}

/// The output of one digitizer readout. An event has zero or more of these.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DaqRecord {
    #[serde(default)]
    pub waveforms: Vec<Waveform>,
}

/// Reduces the DAQ records of an event into per-channel integrals.
///
/// The number of channels is a running high-water mark across the whole run:
/// it only grows as more waveforms or larger channel identifiers are seen,
/// except that an event without any DAQ record resets it to zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct WaveformReducer {
    n_channels: usize,
}

impl WaveformReducer {
    pub fn new() -> Self {
        Self::default()
    }
    /// Current channel count.
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }
    /// Zero every channel integral. The length is kept, and grown to at least
    /// the current channel count.
    pub fn reset(&self, integrals: &mut Vec<f64>) {
        integrals.fill(0.0);
        if integrals.len() < self.n_channels {
            integrals.resize(self.n_channels, 0.0);
        }
    }
    /// Write the integral of every waveform of an event into `integrals`
    /// (indexed by channel identifier) and return their sum.
    ///
    /// `integrals` must have gone through [`WaveformReducer::reset`] for this
    /// event. A later waveform on the same channel overwrites the earlier one,
    /// but both still count towards the returned sum. Fails on a channel
    /// identifier of [`MAX_CHANNELS`] or more.
    pub fn reduce(
        &mut self,
        records: &[DaqRecord],
        integrals: &mut Vec<f64>,
    ) -> Result<f64, Error> {
        if records.is_empty() {
            self.n_channels = 0;
            integrals.clear();
            return Ok(0.0);
        }

        let mut total = 0.0;
        for record in records {
            let n_waveforms = record.waveforms.len();
            tracing::trace!(n_waveforms, "reducing DAQ record");

            if n_waveforms > self.n_channels {
                self.n_channels = n_waveforms;
            }
            grow(integrals, self.n_channels);

            for waveform in &record.waveforms {
                let integral = waveform.integral();
                let chid = waveform.chid as usize;
                if chid >= MAX_CHANNELS {
                    return Err(Error::ChannelOutOfRange {
                        chid: waveform.chid,
                        limit: MAX_CHANNELS,
                    });
                }
                if chid >= self.n_channels {
                    // The reported count follows the channel identifier, not
                    // identifier + 1. Only the storage is sized to fit `chid`.
                    self.n_channels = chid;
                    grow(integrals, chid + 1);
                }
                integrals[chid] = integral;
                total += integral;
            }
        }

        Ok(total)
    }
}

fn grow(integrals: &mut Vec<f64>, len: usize) {
    if integrals.len() < len {
        integrals.resize(len, 0.0);
    }
}
