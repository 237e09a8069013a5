use std::path::Path;
use std::time::Duration;

use kira::{
    manager::{AudioManager, AudioManagerSettings, backend::DefaultBackend},
    sound::{PlaybackRate, static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings}},
    tween::Tween,
    Volume,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open audio device: {0}")]
    Device(String),

    #[error("failed to load sound '{path}': {message}")]
    Load { path: String, message: String },

    #[error("failed to play sound: {0}")]
    Play(String),
}

/// Configuration for playing a sound with variation.
#[derive(Debug, Clone, Copy)]
pub struct SoundConfig {
    pub volume: f32,
    pub pitch: f32,
    /// Random pitch variation range (e.g. 0.1 = +/- 10%)
    pub pitch_variation: f32,
    /// Random volume variation range
    pub volume_variation: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self { volume: 1.0, pitch: 1.0, pitch_variation: 0.0, volume_variation: 0.0 }
    }
}

fn load_static<P: AsRef<Path>>(path: P) -> Result<StaticSoundData, AudioError> {
    let path = path.as_ref();
    StaticSoundData::from_file(path).map_err(|e| AudioError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// ── Sounds ───────────────────────────────────────────────────────────────────

/// A short sound decoded fully into memory, played once per call.
#[derive(Clone)]
pub struct SoundEffect {
    data: StaticSoundData,
}

impl SoundEffect {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        load_static(path).map(|data| Self { data })
    }

    pub fn duration(&self) -> Duration {
        self.data.duration()
    }
}

/// Background music, looped from start to end.
#[derive(Clone)]
pub struct MusicTrack {
    data: StaticSoundData,
}

impl MusicTrack {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        load_static(path).map(|data| Self { data })
    }

    pub fn duration(&self) -> Duration {
        self.data.duration()
    }
}

// ── AudioDevice ──────────────────────────────────────────────────────────────

/// The opened audio output. At most one music track plays at a time.
pub struct AudioDevice {
    manager: AudioManager,
    active_music: Option<StaticSoundHandle>,
    time_seed: u64,
}

impl AudioDevice {
    pub fn open() -> Result<Self, AudioError> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::Device(e.to_string()))?;
        log::info!("[audio] Audio device opened");
        Ok(Self { manager, active_music: None, time_seed: 0 })
    }

    /// Play `sound` once.
    pub fn play(&mut self, sound: &SoundEffect, config: SoundConfig) -> Result<(), AudioError> {
        let mut settings = StaticSoundSettings::new();

        // Advance seed independently for each random variable to avoid LCG correlation.
        self.time_seed = self.time_seed.wrapping_add(1);
        let p_offset = (pseudo_rand(self.time_seed) - 0.5) * 2.0 * config.pitch_variation;
        self.time_seed = self.time_seed.wrapping_add(1);
        let v_offset = (pseudo_rand(self.time_seed) - 0.5) * 2.0 * config.volume_variation;

        settings.playback_rate = PlaybackRate::Factor((config.pitch + p_offset) as f64).into();
        settings.volume = Volume::Amplitude((config.volume + v_offset).clamp(0.0, 2.0) as f64).into();

        self.manager
            .play(sound.data.clone().with_settings(settings))
            .map(|_| ())
            .map_err(|e| AudioError::Play(e.to_string()))
    }

    /// Start `track` looping, fading in over `fade_in_secs`. A track that is
    /// already playing is faded out first.
    pub fn play_music(&mut self, track: &MusicTrack, fade_in_secs: f32) -> Result<(), AudioError> {
        self.stop_music();

        let mut settings = StaticSoundSettings::new().loop_region(0.0..);
        settings.volume = Volume::Amplitude(0.0).into();

        let mut handle = self
            .manager
            .play(track.data.clone().with_settings(settings))
            .map_err(|e| AudioError::Play(e.to_string()))?;
        let _ = handle.set_volume(Volume::Amplitude(1.0), Tween {
            duration: Duration::from_secs_f32(fade_in_secs),
            ..Default::default()
        });
        self.active_music = Some(handle);
        Ok(())
    }

    pub fn stop_music(&mut self) {
        if let Some(mut handle) = self.active_music.take() {
            let _ = handle.stop(Tween {
                duration: Duration::from_secs_f32(0.5),
                ..Default::default()
            });
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.active_music.is_some()
    }
}

fn pseudo_rand(seed: u64) -> f32 {
    let x = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (x >> 32) as f32 / u32::MAX as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sound_file_is_a_load_error() {
        let err = SoundEffect::load("does/not/exist.ogg").err().unwrap();
        assert!(matches!(err, AudioError::Load { .. }));
    }

    #[test]
    fn pseudo_rand_stays_in_unit_range() {
        for seed in 0..1000 {
            let r = pseudo_rand(seed);
            assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn variation_offsets_go_both_ways() {
        let offsets: Vec<f32> = (0..1000).map(|seed| pseudo_rand(seed) - 0.5).collect();
        assert!(offsets.iter().any(|o| *o > 0.25));
        assert!(offsets.iter().any(|o| *o < -0.25));
    }
}
