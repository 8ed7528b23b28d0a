//! Основной файл библиотеки asmr-mixer
//!
//! Библиотека микширует голос с фоновым саундскейпом и выполняет мастеринг
//! ASMR-аудио через внешние процессы FFmpeg/FFprobe: фейды, эквализация,
//! бинауральное расширение стерео, нормализация громкости, конвертация
//! формата и эвристическая оценка качества.
//!
//! ```no_run
//! use asmr_mixer::{AudioMixer, MixerConfig, MixingOptions};
//!
//! # async fn run(voice: Vec<u8>, rain: Vec<u8>) -> asmr_mixer::Result<()> {
//! let mixer = AudioMixer::new(MixerConfig::from_env()?)?;
//! let result = mixer
//!     .mix_voice_and_soundscape(&voice, &rain, &MixingOptions::default())
//!     .await?;
//! println!("{:.1}s, score {}", result.metadata.duration, result.quality_report.overall_score);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod types;
pub mod filter;
pub mod media;
pub mod utils;

pub use config::{AudioFormat, BinauralSettings, EqSettings, MixerConfig, MixingOptions, QualityTier};
pub use error::{MixerError, Result};
pub use media::mixer::{AudioMixer, MixJob, DEFAULT_BATCH_CONCURRENCY};
pub use types::{
    AsmrMetrics, AudioMetadata, AudioProcessingResult, AudioQualityReport, FrequencyResponse,
    TechnicalMetrics,
};
pub use utils::ffmpeg::{check_ffmpeg_installed, CommandOutput, CommandRunner, MediaEngine, ProcessRunner};
pub use utils::logger::init_logger;
