//! Модуль конфигурации библиотеки asmr-mixer
//!
//! Этот модуль содержит структуры и перечисления для настройки микшера:
//! пути к FFmpeg/FFprobe, временную директорию и параметры обработки.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MixerError, Result};

/// Переменная окружения с корнем временной директории
pub const ENV_TEMP_DIR: &str = "ASMR_TEMP_DIR";
/// Переменная окружения с путем к ffmpeg
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";
/// Переменная окружения с путем к ffprobe
pub const ENV_FFPROBE_PATH: &str = "FFPROBE_PATH";
/// Переменная окружения с таймаутом процесса в секундах
pub const ENV_PROCESS_TIMEOUT: &str = "ASMR_PROCESS_TIMEOUT_SECS";

/// Конфигурация микшера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerConfig {
    /// Корень для временных файлов сессий
    pub temp_dir: PathBuf,
    /// Путь к исполняемому файлу ffmpeg
    pub ffmpeg_path: PathBuf,
    /// Путь к исполняемому файлу ffprobe
    pub ffprobe_path: PathBuf,
    /// Максимальное время работы одного процесса (в секундах)
    pub process_timeout_secs: Option<u64>,
    /// Удалять временные файлы после завершения
    pub cleanup_temp_files: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("asmr-mixer"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            process_timeout_secs: None,
            cleanup_temp_files: true,
        }
    }
}

impl MixerConfig {
    /// Собрать конфигурацию из переменных окружения
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Собрать конфигурацию через произвольный источник значений
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let process_timeout_secs = match non_empty(ENV_PROCESS_TIMEOUT) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                MixerError::Configuration(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_PROCESS_TIMEOUT, raw
                ))
            })?),
            None => defaults.process_timeout_secs,
        };

        Ok(Self {
            temp_dir: non_empty(ENV_TEMP_DIR).map(PathBuf::from).unwrap_or(defaults.temp_dir),
            ffmpeg_path: non_empty(ENV_FFMPEG_PATH).map(PathBuf::from).unwrap_or(defaults.ffmpeg_path),
            ffprobe_path: non_empty(ENV_FFPROBE_PATH).map(PathBuf::from).unwrap_or(defaults.ffprobe_path),
            process_timeout_secs,
            cleanup_temp_files: defaults.cleanup_temp_files,
        })
    }

    /// Таймаут процесса, если он задан
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_secs.map(Duration::from_secs)
    }
}

/// Настройки трехполосного эквалайзера
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqSettings {
    /// Усиление полосы ~100 Гц (дБ, -20..20)
    pub low_freq: f64,
    /// Усиление полосы ~1 кГц (дБ, -20..20)
    pub mid_freq: f64,
    /// Усиление полосы ~10 кГц (дБ, -20..20)
    pub high_freq: f64,
    /// Частота среза фильтра высоких частот (Гц)
    #[serde(default)]
    pub low_cutoff: Option<f64>,
    /// Частота среза фильтра низких частот (Гц)
    #[serde(default)]
    pub high_cutoff: Option<f64>,
}

impl Default for EqSettings {
    fn default() -> Self {
        Self {
            low_freq: 0.0,
            mid_freq: 0.0,
            high_freq: 0.0,
            low_cutoff: None,
            high_cutoff: None,
        }
    }
}

impl EqSettings {
    /// Проверить диапазоны значений
    pub fn validate(&self) -> Result<()> {
        for (name, gain) in [
            ("lowFreq", self.low_freq),
            ("midFreq", self.mid_freq),
            ("highFreq", self.high_freq),
        ] {
            check_range(name, gain, -20.0, 20.0)?;
        }

        for (name, cutoff) in [("lowCutoff", self.low_cutoff), ("highCutoff", self.high_cutoff)] {
            if let Some(hz) = cutoff {
                if !hz.is_finite() || hz <= 0.0 {
                    return Err(MixerError::InvalidOptions(format!(
                        "{} must be a positive frequency, got {}",
                        name, hz
                    )));
                }
            }
        }

        if let (Some(low), Some(high)) = (self.low_cutoff, self.high_cutoff) {
            if low >= high {
                return Err(MixerError::InvalidOptions(format!(
                    "lowCutoff ({}) must be below highCutoff ({})",
                    low, high
                )));
            }
        }

        Ok(())
    }
}

/// Параметры микширования голоса и саундскейпа
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixingOptions {
    /// Громкость голоса (0.0 - 1.0)
    pub voice_volume: f64,
    /// Громкость саундскейпа (0.0 - 1.0)
    pub soundscape_volume: f64,
    /// Длительность нарастания в начале (секунды)
    pub fade_in_duration: f64,
    /// Длительность затухания в конце (секунды)
    pub fade_out_duration: f64,
    /// Степень компрессии (1.0 - 10.0, 1.0 = без компрессии)
    pub compression_ratio: Option<f64>,
    /// Настройки эквалайзера
    pub eq_settings: Option<EqSettings>,
}

impl Default for MixingOptions {
    fn default() -> Self {
        Self {
            voice_volume: 0.7,
            soundscape_volume: 0.3,
            fade_in_duration: 3.0,
            fade_out_duration: 5.0,
            compression_ratio: None,
            eq_settings: None,
        }
    }
}

impl MixingOptions {
    /// Проверить диапазоны значений
    pub fn validate(&self) -> Result<()> {
        check_range("voiceVolume", self.voice_volume, 0.0, 1.0)?;
        check_range("soundscapeVolume", self.soundscape_volume, 0.0, 1.0)?;
        check_non_negative("fadeInDuration", self.fade_in_duration)?;
        check_non_negative("fadeOutDuration", self.fade_out_duration)?;

        if let Some(ratio) = self.compression_ratio {
            check_range("compressionRatio", ratio, 1.0, 10.0)?;
        }

        if let Some(eq) = &self.eq_settings {
            eq.validate()?;
        }

        Ok(())
    }
}

/// Настройки бинаурального эффекта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinauralSettings {
    /// Включен ли эффект
    pub enabled: bool,
    /// Ширина стереобазы (0.5 - 2.0, 1.0 = без изменений)
    pub spatial_width: f64,
    /// Задержка левого канала (мс)
    pub left_delay: f64,
    /// Задержка правого канала (мс)
    pub right_delay: f64,
    /// Доля реверберации (0.0 - 1.0)
    pub reverb_amount: f64,
}

impl Default for BinauralSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            spatial_width: 1.0,
            left_delay: 0.0,
            right_delay: 0.0,
            reverb_amount: 0.0,
        }
    }
}

impl BinauralSettings {
    /// Проверить диапазоны значений
    pub fn validate(&self) -> Result<()> {
        check_range("spatialWidth", self.spatial_width, 0.5, 2.0)?;
        check_non_negative("leftDelay", self.left_delay)?;
        check_non_negative("rightDelay", self.right_delay)?;
        check_range("reverbAmount", self.reverb_amount, 0.0, 1.0)
    }
}

/// Целевой формат конвертации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Aac,
    Wav,
}

impl AudioFormat {
    /// Получить строковое представление формата
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Wav => "wav",
        }
    }

    /// Расширение выходного файла
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl FromStr for AudioFormat {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "aac" => Ok(Self::Aac),
            "wav" => Ok(Self::Wav),
            other => Err(MixerError::InvalidOptions(format!("Unsupported audio format: {}", other))),
        }
    }
}

/// Уровень качества при конвертации
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Standard,
    #[default]
    High,
    Premium,
}

impl FromStr for QualityTier {
    type Err = MixerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "high" => Ok(Self::High),
            "premium" => Ok(Self::Premium),
            other => Err(MixerError::InvalidOptions(format!("Unsupported quality tier: {}", other))),
        }
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(MixerError::InvalidOptions(format!(
            "{} must be within [{}, {}], got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MixerError::InvalidOptions(format!(
            "{} must be zero or positive, got {}",
            name, value
        )));
    }
    Ok(())
}
