//! Bridge between the node graph and its external collaborators
//!
//! Imports: the audio analysis side publishes whole `AudioSnapshot`s over a
//! channel at its own cadence; the editor reads whichever snapshot is newest
//! when a frame starts. Exports: output node values are written into a
//! `ParameterStore` every frame, for keys the store already knows.

use std::collections::BTreeMap;

use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, trace};

use crate::nodes::Exports;

/// Read access to external input values by binding key
pub trait ExternalInputs {
    fn lookup(&self, key: &str) -> Option<f32>;
}

/// Frequency band levels in the unit range
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioSnapshot {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl AudioSnapshot {
    pub const LOW_KEY: &'static str = "Audio Low";
    pub const MID_KEY: &'static str = "Audio Mid";
    pub const HIGH_KEY: &'static str = "Audio High";

    /// Splits byte magnitudes into low (first 10% of bins), mid (up to 50%)
    /// and high bands, each the band mean scaled to 0..=1.
    pub fn from_spectrum(bins: &[u8]) -> Self {
        let len = bins.len();
        let low_bound = len / 10;
        let mid_bound = len / 2;

        let band_mean = |range: &[u8]| -> f32 {
            if range.is_empty() {
                return 0.0;
            }
            let sum: u64 = range.iter().map(|&b| u64::from(b)).sum();
            (sum as f64 / range.len() as f64 / 255.0) as f32
        };

        Self {
            low: band_mean(&bins[..low_bound]),
            mid: band_mean(&bins[low_bound..mid_bound]),
            high: band_mean(&bins[mid_bound..]),
        }
    }

    /// Band level for a binding key
    pub fn band(&self, key: &str) -> Option<f32> {
        match key {
            Self::LOW_KEY => Some(self.low),
            Self::MID_KEY => Some(self.mid),
            Self::HIGH_KEY => Some(self.high),
            _ => None,
        }
    }
}

impl ExternalInputs for AudioSnapshot {
    fn lookup(&self, key: &str) -> Option<f32> {
        self.band(key)
    }
}

/// Producer half of an audio feed
#[derive(Debug, Clone)]
pub struct AudioSender {
    tx: Sender<AudioSnapshot>,
}

impl AudioSender {
    /// Publishes a replacement snapshot. Returns false once the feed is gone.
    pub fn publish(&self, snapshot: AudioSnapshot) -> bool {
        self.tx.send(snapshot).is_ok()
    }
}

/// Consumer half of an audio feed, owned by the editor
#[derive(Debug)]
pub struct AudioFeed {
    rx: Receiver<AudioSnapshot>,
    current: AudioSnapshot,
}

impl AudioFeed {
    /// Creates a connected sender/feed pair
    pub fn channel() -> (AudioSender, AudioFeed) {
        let (tx, rx) = unbounded();
        (
            AudioSender { tx },
            AudioFeed {
                rx,
                current: AudioSnapshot::default(),
            },
        )
    }

    /// Newest published snapshot, or the previous one if nothing new arrived
    pub fn latest(&mut self) -> AudioSnapshot {
        if let Some(snapshot) = self.rx.try_iter().last() {
            self.current = snapshot;
        }
        self.current
    }
}

/// Write-through access to the external parameter registry
pub trait ParameterStore {
    fn contains(&self, key: &str) -> bool;
    fn get(&self, key: &str) -> Option<f32>;
    fn set(&mut self, key: &str, value: f32);
}

/// Parameter registry keyed by uniform name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterRegistry {
    params: BTreeMap<String, f32>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the visualizer's uniform defaults
    pub fn with_visual_defaults() -> Self {
        const DEFAULTS: &[(&str, f32)] = &[
            // Geometry
            ("uDepthStrength", 0.5),
            ("uNoiseSpeed", 0.2),
            ("uTwistStrength", 0.0),
            ("uRippleStrength", 0.0),
            ("uRippleFreq", 10.0),
            ("uFoldStrength", 0.0),
            ("uBulgeStrength", 0.0),
            ("uSpikeStrength", 0.0),
            ("uExplode", 0.0),
            ("uMelt", 0.0),
            ("uLFO", 0.0),
            ("uJitter", 0.0),
            ("uTiles", 1.0),
            ("uMirrorX", 0.0),
            ("uMirrorY", 0.0),
            ("uPointSize", 2.0),
            ("uAudioGain", 1.0),
            ("uTimeFreeze", 0.0),
            ("uBandGeo", 1.0),
            ("uBandAction", 2.0),
            ("uBandDetail", 3.0),
            // Post-processing
            ("uColorShift", 0.0),
            ("uRGBShift", 0.0),
            ("uGlitchStrength", 0.0),
            ("uScanlineStrength", 0.0),
            ("uVignetteStrength", 0.5),
            ("uBrightness", 0.0),
            ("uContrast", 1.0),
            ("uSaturation", 1.0),
            ("uHue", 0.0),
            ("uInvert", 0.0),
            ("uPixelate", 0.0),
            ("uBandColor", 1.0),
            // Glitch
            ("uDatamosh", 0.0),
            ("uWaveDistort", 0.0),
            ("uBarrelDistort", 0.0),
            ("uKaleidoscope", 0.0),
            ("uMirrorGlitch", 0.0),
            ("uColorBleed", 0.0),
            ("uNoiseOverlay", 0.0),
            ("uCRT", 0.0),
            ("uVHS", 0.0),
            // Bloom, lens and film
            ("uBloomIntensity", 0.5),
            ("uBloomThreshold", 0.2),
            ("uChromaticAberration", 0.0),
            ("uDOF", 0.0),
            ("uFocusDistance", 0.5),
            ("uFilmGrain", 0.0),
            ("uGodRays", 0.0),
        ];
        DEFAULTS.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, f32)> for ParameterRegistry {
    fn from_iter<I: IntoIterator<Item = (&'a str, f32)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

impl ParameterStore for ParameterRegistry {
    fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<f32> {
        self.params.get(key).copied()
    }

    /// Only updates keys that are already registered
    fn set(&mut self, key: &str, value: f32) {
        if let Some(slot) = self.params.get_mut(key) {
            *slot = value;
        }
    }
}

/// One-directional adapters around the evaluator
#[derive(Debug, Default)]
pub struct Bridge {
    audio: Option<AudioFeed>,
}

impl Bridge {
    pub fn new(audio: Option<AudioFeed>) -> Self {
        Self { audio }
    }

    /// Snapshot for this frame; silence when no feed is attached
    pub fn import(&mut self) -> AudioSnapshot {
        self.audio
            .as_mut()
            .map(AudioFeed::latest)
            .unwrap_or_default()
    }

    /// Writes every output whose key the store knows. Returns the write count.
    pub fn export(&self, exports: &Exports, store: &mut impl ParameterStore) -> usize {
        let mut written = 0;
        for output in exports.iter() {
            if store.contains(&output.key) {
                store.set(&output.key, output.value);
                written += 1;
            } else {
                trace!("Skipping export of unknown parameter '{}'", output.key);
            }
        }
        written
    }

    /// Drops the audio feed. Returns false if it was already detached.
    pub fn detach(&mut self) -> bool {
        let detached = self.audio.take().is_some();
        if detached {
            debug!("Audio feed detached");
        }
        detached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_spectrum_band_split() {
        // 20 bins: low = [0, 2), mid = [2, 10), high = [10, 20)
        let mut bins = [0u8; 20];
        bins[..2].fill(255);
        bins[2..10].fill(51);
        let snapshot = AudioSnapshot::from_spectrum(&bins);
        assert_eq!(snapshot.low, 1.0);
        assert!((snapshot.mid - 0.2).abs() < 1e-6);
        assert_eq!(snapshot.high, 0.0);
    }

    #[test]
    fn test_from_spectrum_tiny_input() {
        assert_eq!(AudioSnapshot::from_spectrum(&[]), AudioSnapshot::default());
        let snapshot = AudioSnapshot::from_spectrum(&[255, 255]);
        assert_eq!(snapshot.low, 0.0);
        assert_eq!(snapshot.mid, 1.0);
        assert_eq!(snapshot.high, 1.0);
    }

    #[test]
    fn test_from_spectrum_large_input() {
        // High band holds 20M full-scale bins, past what a u32 sum can hold
        let bins = vec![255u8; 40_000_000];
        let snapshot = AudioSnapshot::from_spectrum(&bins);
        assert_eq!(snapshot.high, 1.0);
        assert_eq!(snapshot.low, 1.0);
    }

    #[test]
    fn test_band_lookup() {
        let snapshot = AudioSnapshot { low: 0.1, mid: 0.2, high: 0.3 };
        assert_eq!(snapshot.lookup("Audio Mid"), Some(0.2));
        assert_eq!(snapshot.lookup("Value"), None);
    }

    #[test]
    fn test_feed_keeps_newest_snapshot() {
        let (tx, mut feed) = AudioFeed::channel();
        assert_eq!(feed.latest(), AudioSnapshot::default());

        tx.publish(AudioSnapshot { low: 0.1, mid: 0.1, high: 0.1 });
        tx.publish(AudioSnapshot { low: 0.7, mid: 0.2, high: 0.3 });
        assert_eq!(feed.latest().low, 0.7);
        // Nothing new: previous snapshot is kept
        assert_eq!(feed.latest().low, 0.7);
    }

    #[test]
    fn test_publish_fails_after_feed_dropped() {
        let (tx, feed) = AudioFeed::channel();
        assert!(tx.publish(AudioSnapshot::default()));
        drop(feed);
        assert!(!tx.publish(AudioSnapshot::default()));
    }

    #[test]
    fn test_registry_only_updates_known_keys() {
        let mut registry = ParameterRegistry::with_visual_defaults();
        assert_eq!(registry.get("uDepthStrength"), Some(0.5));
        registry.set("uDepthStrength", 0.8);
        registry.set("uUnknown", 1.0);
        assert_eq!(registry.get("uDepthStrength"), Some(0.8));
        assert!(!registry.contains("uUnknown"));
    }

    #[test]
    fn test_export_writes_known_keys_every_time() {
        let mut registry: ParameterRegistry = [("uDepthStrength", 0.5)].into_iter().collect();
        let mut exports = Exports::new();
        exports.push(4, "uDepthStrength", 0.8);
        exports.push(5, "uNotRegistered", 1.0);

        let bridge = Bridge::new(None);
        assert_eq!(bridge.export(&exports, &mut registry), 1);
        assert_eq!(bridge.export(&exports, &mut registry), 1);
        assert_eq!(registry.get("uDepthStrength"), Some(0.8));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_import_and_detach() {
        let (tx, feed) = AudioFeed::channel();
        let mut bridge = Bridge::new(Some(feed));
        tx.publish(AudioSnapshot { low: 0.4, mid: 0.0, high: 0.0 });
        assert_eq!(bridge.import().low, 0.4);

        assert!(bridge.detach());
        assert!(!bridge.detach());
        assert_eq!(bridge.import(), AudioSnapshot::default());
        assert!(!tx.publish(AudioSnapshot::default()));
    }
}
