//! Pulsegraph editor entry point

use std::thread;
use std::time::Duration;

use eframe::egui;
use log::{debug, info};
use rand::Rng;

use pulsegraph::{AudioFeed, AudioSender, AudioSnapshot, EditorConfig, NodeEditor};

/// Bins in the synthetic spectrum, matching a 2048-point FFT
const SPECTRUM_BINS: usize = 1024;

/// Feeds a drifting random spectrum until the editor drops its feed
fn spawn_demo_audio(tx: AudioSender) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = rand::rng();
        let mut bins = vec![0u8; SPECTRUM_BINS];
        let mut level: f32 = 0.5;
        loop {
            level = (level + rng.random_range(-0.05..=0.05)).clamp(0.0, 1.0);
            for (i, bin) in bins.iter_mut().enumerate() {
                // Louder at the low end
                let tilt = 1.0 - i as f32 / SPECTRUM_BINS as f32;
                let noise: f32 = rng.random_range(0.0..0.3);
                *bin = ((level * tilt + noise).min(1.0) * 255.0) as u8;
            }
            if !tx.publish(AudioSnapshot::from_spectrum(&bins)) {
                debug!("Audio feed closed, demo producer stopping");
                break;
            }
            thread::sleep(Duration::from_millis(16));
        }
    })
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EditorConfig::load_or_default();
    let (tx, feed) = AudioFeed::channel();
    let _producer = spawn_demo_audio(tx);
    info!("Demo audio producer started");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(config.window_size),
        ..Default::default()
    };

    let editor = NodeEditor::new(&config, Some(feed));
    eframe::run_native("Pulsegraph", options, Box::new(|_cc| Ok(Box::new(editor))))
}
