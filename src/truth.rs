use crate::volumes::VolumeFilterSet;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A primary particle of the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Particle {
    /// Four-momentum `[px, py, pz, E]`.
    pub momentum: [f64; 4],
}

impl Particle {
    /// Energy component of the four-momentum.
    pub fn energy(&self) -> f64 {
        self.momentum[3]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PrimaryVertex {
    #[serde(default)]
    pub particles: Vec<Particle>,
}

/// Energy deposited by a single step inside a geometric volume.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EnergySegment {
    /// Name of the physical volume that owns the segment.
    pub volume: String,
    pub energy_deposit: f64,
}

/// Truth information of a single event.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TruthRecord {
    #[serde(default)]
    pub primaries: Vec<PrimaryVertex>,
    /// Energy segments grouped by sensitive detector name.
    #[serde(default)]
    pub segment_detectors: BTreeMap<String, Vec<EnergySegment>>,
}

/// Sum of the energy of every primary particle of every vertex.
///
/// This is a raw sum. Zero or negative energies are not filtered out. An event
/// without particles has a total of `+0.0`.
pub fn total_primary_energy(record: &TruthRecord) -> f64 {
    // `Sum for f64` starts from -0.0, which would leak into the output as
    // `-0.0` for empty events.
    record
        .primaries
        .iter()
        .flat_map(|vertex| &vertex.particles)
        .fold(0.0, |total, particle| total + particle.energy())
}

/// Add the deposit of every segment whose owning volume is in `volumes` to
/// the matching slot of `edep`.
///
/// `edep` is indexed by [`VolumeFilterSet::position`]. Attribution is by exact
/// volume name; the detector a segment is grouped under does not matter.
pub fn accumulate_volume_edep(record: &TruthRecord, volumes: &VolumeFilterSet, edep: &mut [f64]) {
    if volumes.is_empty() {
        return;
    }
    for (detector, segments) in &record.segment_detectors {
        tracing::trace!(%detector, n_segments = segments.len(), "looping through hits");
        for segment in segments {
            if let Some(position) = volumes.position(&segment.volume) {
                edep[position] += segment.energy_deposit;
            }
        }
    }
}

/// Reduce a truth record. Returns the total primary energy and adds the
/// per-volume deposits to `edep` (see [`accumulate_volume_edep`]).
pub fn reduce(record: &TruthRecord, volumes: &VolumeFilterSet, edep: &mut [f64]) -> f64 {
    accumulate_volume_edep(record, volumes, edep);

    total_primary_energy(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(energy: f64) -> Particle {
        Particle {
            momentum: [0.0, 0.0, 0.0, energy],
        }
    }

    fn segment(volume: &str, energy_deposit: f64) -> EnergySegment {
        EnergySegment {
            volume: volume.to_string(),
            energy_deposit,
        }
    }

    #[test]
    fn primary_energy_two_vertices() {
        let record = TruthRecord {
            primaries: vec![
                PrimaryVertex {
                    particles: vec![particle(2.0)],
                },
                PrimaryVertex {
                    particles: vec![particle(3.5), particle(1.5)],
                },
            ],
            ..Default::default()
        };

        assert_eq!(total_primary_energy(&record), 7.0);
    }

    #[test]
    fn primary_energy_is_raw_sum() {
        let record = TruthRecord {
            primaries: vec![PrimaryVertex {
                particles: vec![particle(-1.0), particle(0.0), particle(4.0)],
            }],
            ..Default::default()
        };

        assert_eq!(total_primary_energy(&record), 3.0);
    }

    #[test]
    fn primary_energy_without_particles_is_positive_zero() {
        let energy = total_primary_energy(&TruthRecord::default());
        assert_eq!(energy, 0.0);
        assert!(energy.is_sign_positive());

        let record = TruthRecord {
            primaries: vec![PrimaryVertex::default(), PrimaryVertex::default()],
            ..Default::default()
        };
        assert!(total_primary_energy(&record).is_sign_positive());
    }

    #[test]
    fn volume_edep_exact_match() {
        let volumes = VolumeFilterSet::from(["LArVol"]);
        let record = TruthRecord {
            segment_detectors: BTreeMap::from([(
                String::from("LArVol"),
                vec![segment("LArVol", 0.42), segment("Other", 1.0)],
            )]),
            ..Default::default()
        };
        let mut edep = vec![0.0; volumes.len()];

        accumulate_volume_edep(&record, &volumes, &mut edep);

        assert_eq!(edep, vec![0.42]);
    }

    #[test]
    fn volume_edep_ignores_substrings() {
        let volumes = VolumeFilterSet::from(["LAr"]);
        let record = TruthRecord {
            segment_detectors: BTreeMap::from([(
                String::from("LAr"),
                vec![segment("LArVol", 1.0), segment("volLAr", 2.0)],
            )]),
            ..Default::default()
        };
        let mut edep = vec![0.0; volumes.len()];

        accumulate_volume_edep(&record, &volumes, &mut edep);

        assert_eq!(edep, vec![0.0]);
    }

    #[test]
    fn volume_edep_across_detectors() {
        let volumes = VolumeFilterSet::from(["volPanel", "LArVol"]);
        let record = TruthRecord {
            segment_detectors: BTreeMap::from([
                (
                    String::from("TPC"),
                    vec![segment("LArVol", 1.0), segment("volPanel", 0.5)],
                ),
                (
                    String::from("Veto"),
                    vec![segment("volPanel", 0.25), segment("LArVol", 2.0)],
                ),
            ]),
            ..Default::default()
        };
        let mut edep = vec![0.0; volumes.len()];

        let energy = reduce(&record, &volumes, &mut edep);

        assert_eq!(edep, vec![0.75, 3.0]);
        assert_eq!(energy, 0.0);
    }

    #[test]
    fn volume_edep_empty_set() {
        let volumes = VolumeFilterSet::new();
        let record = TruthRecord {
            segment_detectors: BTreeMap::from([(
                String::from("TPC"),
                vec![segment("LArVol", 1.0)],
            )]),
            ..Default::default()
        };
        let mut edep: Vec<f64> = Vec::new();

        accumulate_volume_edep(&record, &volumes, &mut edep);

        assert!(edep.is_empty());
    }

    #[test]
    fn truth_record_deserialize() {
        let json = r#"{
            "primaries": [{"particles": [{"momentum": [0.1, 0.2, 0.3, 5.0]}]}],
            "segment_detectors": {"TPC": [{"volume": "LArVol", "energy_deposit": 0.5}]}
        }"#;
        let record: TruthRecord = serde_json::from_str(json).unwrap();

        assert_eq!(total_primary_energy(&record), 5.0);
        assert_eq!(record.segment_detectors["TPC"][0].volume, "LArVol");

        let record: TruthRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, TruthRecord::default());
    }
}
