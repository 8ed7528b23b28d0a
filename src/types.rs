//! Общие типы результатов обработки
//!
//! Метаданные и отчеты сериализуются в JSON (camelCase) для вызывающего
//! сервиса; сам буфер остается сырыми байтами.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Частотная характеристика (пока фиксированные значения, без спектрального анализа)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyResponse {
    pub peak_frequency: f64,
    pub average_frequency: f64,
    pub spectral_centroid: f64,
}

impl Default for FrequencyResponse {
    fn default() -> Self {
        Self {
            peak_frequency: 1000.0,
            average_frequency: 800.0,
            spectral_centroid: 1200.0,
        }
    }
}

/// Технические метрики файла
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalMetrics {
    /// Частота дискретизации (Гц)
    pub sample_rate: u32,
    /// Битрейт (бит/с)
    pub bit_rate: u64,
    /// Динамический диапазон (дБ)
    pub dynamic_range: f64,
    /// Уровень шума (дБ)
    pub noise_floor: f64,
    pub frequency_response: FrequencyResponse,
}

/// Эвристические ASMR-метрики, каждая в диапазоне 1-10
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsmrMetrics {
    pub voice_clarity: f64,
    pub soundscape_harmony: f64,
    pub binaural_effectiveness: f64,
    pub relaxation_potential: f64,
}

/// Отчет о качестве аудио
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioQualityReport {
    /// Итоговая оценка (1-10)
    pub overall_score: f64,
    pub technical_metrics: TechnicalMetrics,
    pub asmr_metrics: AsmrMetrics,
    /// Рекомендации в порядке проверки
    pub recommendations: Vec<String>,
    /// Нужна ли повторная обработка
    pub needs_reprocessing: bool,
}

/// Метаданные результата обработки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    /// Длительность в секундах
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u32,
    pub format: String,
    /// Размер выходного буфера в байтах
    pub size: u64,
    /// Время обработки в миллисекундах
    pub processing_time: u64,
    pub processed_at: DateTime<Utc>,
}

/// Результат микширования
#[derive(Debug, Clone)]
pub struct AudioProcessingResult {
    pub output_buffer: Vec<u8>,
    pub metadata: AudioMetadata,
    pub quality_report: AudioQualityReport,
}
