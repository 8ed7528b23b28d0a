//! Обработка аудио поверх FFmpeg
//!
//! `probe` разбирает вывод ffprobe, `analysis` строит отчет о качестве,
//! `format` хранит таблицу кодеков, `mixer` связывает все в операции.

pub mod probe;
pub mod analysis;
pub mod format;
pub mod mixer;

pub use analysis::{default_report, QualityAnalyzer};
pub use format::{encoder_settings, EncoderSettings};
pub use mixer::{AudioMixer, MixJob, DEFAULT_BATCH_CONCURRENCY};
pub use probe::AudioProbe;
