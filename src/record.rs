use crate::volumes::VolumeFilterSet;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Prefix of the per-volume energy deposit columns.
pub const EDEP_PREFIX: &str = "edep_";

/// The flat summary of a single event.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputRecord {
    pub event_id: usize,
    pub total_primary_energy: f64,
    pub n_channels: usize,
    pub all_channel_integral: f64,
    /// Waveform integral per channel, indexed by channel identifier.
    pub channel_integrals: Vec<f64>,
    volume_names: Vec<String>,
    volume_edep: Vec<f64>,
}

impl OutputRecord {
    /// An all-zero record with one energy deposit column per volume.
    pub fn new(volumes: &VolumeFilterSet) -> Self {
        Self {
            event_id: 0,
            total_primary_energy: 0.0,
            n_channels: 0,
            all_channel_integral: 0.0,
            channel_integrals: Vec::new(),
            volume_names: volumes.iter().map(String::from).collect(),
            volume_edep: vec![0.0; volumes.len()],
        }
    }
    /// Energy deposited in a volume, or `None` if the volume is not tracked.
    pub fn volume_edep(&self, name: &str) -> Option<f64> {
        self.volume_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.volume_edep[i])
    }
    /// `(volume, energy deposit)` pairs in column order.
    pub fn volume_edeps(&self) -> impl Iterator<Item = (&str, f64)> {
        self.volume_names
            .iter()
            .map(String::as_str)
            .zip(self.volume_edep.iter().copied())
    }

    pub(crate) fn volume_edep_mut(&mut self) -> &mut [f64] {
        &mut self.volume_edep
    }
}

impl Serialize for OutputRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(5 + self.volume_names.len()))?;
        map.serialize_entry("event_id", &self.event_id)?;
        map.serialize_entry("total_primary_energy", &self.total_primary_energy)?;
        map.serialize_entry("n_channels", &self.n_channels)?;
        map.serialize_entry("all_channel_integral", &self.all_channel_integral)?;
        map.serialize_entry("channel_integrals", &self.channel_integrals)?;
        for (name, edep) in self.volume_edeps() {
            map.serialize_entry(&format!("{EDEP_PREFIX}{name}"), &edep)?;
        }

        map.end()
    }
}
