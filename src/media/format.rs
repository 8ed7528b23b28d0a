//! Таблица кодеков для конвертации формата
//!
//! mp3 кодируется libmp3lame с постоянным битрейтом, aac встроенным
//! кодером, wav всегда 16-bit PCM 44.1 кГц независимо от уровня качества.

use crate::config::{AudioFormat, QualityTier};

/// Частота дискретизации для PCM-выхода
pub const PCM_SAMPLE_RATE: u32 = 44100;
/// Кодек для PCM-выхода
pub const PCM_CODEC: &str = "pcm_s16le";

/// Параметры кодирования для ffmpeg
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub codec: &'static str,
    pub bitrate: Option<&'static str>,
    pub sample_rate: Option<u32>,
}

impl EncoderSettings {
    /// Аргументы командной строки ffmpeg
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-acodec".to_string(), self.codec.to_string()];
        if let Some(bitrate) = self.bitrate {
            args.push("-b:a".to_string());
            args.push(bitrate.to_string());
        }
        if let Some(rate) = self.sample_rate {
            args.push("-ar".to_string());
            args.push(rate.to_string());
        }
        args
    }

    /// Битрейт в бит/с, если он фиксирован
    pub fn bits_per_second(&self) -> Option<u64> {
        let kbps = self.bitrate?.strip_suffix('k')?.parse::<u64>().ok()?;
        Some(kbps * 1000)
    }
}

/// Выбрать кодек и битрейт для формата и уровня качества
pub fn encoder_settings(format: AudioFormat, quality: QualityTier) -> EncoderSettings {
    match format {
        AudioFormat::Mp3 => EncoderSettings {
            codec: "libmp3lame",
            bitrate: Some(match quality {
                QualityTier::Standard => "192k",
                QualityTier::High => "256k",
                QualityTier::Premium => "320k",
            }),
            sample_rate: None,
        },
        AudioFormat::Aac => EncoderSettings {
            codec: "aac",
            bitrate: Some(match quality {
                QualityTier::Standard => "128k",
                QualityTier::High => "192k",
                QualityTier::Premium => "256k",
            }),
            sample_rate: None,
        },
        AudioFormat::Wav => pcm_settings(),
    }
}

/// 16-bit PCM 44.1 кГц
pub fn pcm_settings() -> EncoderSettings {
    EncoderSettings {
        codec: PCM_CODEC,
        bitrate: None,
        sample_rate: Some(PCM_SAMPLE_RATE),
    }
}
