//! # Audio quality analysis
//!
//! Probes an audio buffer with ffprobe and turns its technical parameters
//! into a heuristic quality report.
//!
//! ## Scoring
//!
//! * `technical` starts at 5: +2 for >= 48 kHz (+1 for >= 44.1 kHz),
//!   +2 for >= 320 kbps (+1.5 for >= 256 kbps, +1 for >= 192 kbps),
//!   +1 for stereo
//! * `asmr` starts at 5: +3 for >= 44.1 kHz with >= 256 kbps,
//!   +2 for >= 44.1 kHz with >= 192 kbps
//! * `overall` is the mean of the two
//!
//! Frequency response, dynamic range and noise floor are not measured; the
//! report carries fixed values in those fields.

use log::{debug, error};

use crate::error::Result;
use crate::media::probe::{parse_probe_output, AudioProbe};
use crate::types::{AsmrMetrics, AudioQualityReport, FrequencyResponse, TechnicalMetrics};
use crate::utils::ffmpeg::MediaEngine;
use crate::utils::temp::{TempFileManager, TempSession};

/// Единственная рекомендация отчета по умолчанию
pub const ANALYSIS_FALLBACK_RECOMMENDATION: &str = "Unable to complete detailed analysis";

pub const RECOMMEND_SAMPLE_RATE: &str =
    "Increase the sample rate to at least 44.1kHz to preserve fine ASMR detail";
pub const RECOMMEND_BIT_RATE: &str =
    "Use a bitrate of at least 256kbps to avoid compression artifacts";
pub const RECOMMEND_QUALITY: &str = "Overall audio quality needs improvement";
pub const RECOMMEND_ASMR_FILTER: &str =
    "Applying the ASMR optimization filter chain may help";

/// Порог повторной обработки по технической оценке
pub const REPROCESSING_THRESHOLD: f64 = 6.0;

const PLACEHOLDER_DYNAMIC_RANGE_DB: f64 = 60.0;
const PLACEHOLDER_NOISE_FLOOR_DB: f64 = -60.0;

const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

/// Промежуточные оценки (1-10)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityScores {
    pub technical: f64,
    pub asmr: f64,
}

impl QualityScores {
    pub fn overall(&self) -> f64 {
        clamp_score((self.technical + self.asmr) / 2.0)
    }
}

/// Посчитать техническую и ASMR оценки
pub fn score(probe: &AudioProbe) -> QualityScores {
    let mut technical = 5.0;

    if probe.sample_rate >= 48000 {
        technical += 2.0;
    } else if probe.sample_rate >= 44100 {
        technical += 1.0;
    }

    if probe.bit_rate >= 320_000 {
        technical += 2.0;
    } else if probe.bit_rate >= 256_000 {
        technical += 1.5;
    } else if probe.bit_rate >= 192_000 {
        technical += 1.0;
    }

    if probe.channels >= 2 {
        technical += 1.0;
    }

    let mut asmr = 5.0;
    if probe.sample_rate >= 44100 && probe.bit_rate >= 256_000 {
        asmr += 3.0;
    } else if probe.sample_rate >= 44100 && probe.bit_rate >= 192_000 {
        asmr += 2.0;
    }

    QualityScores {
        technical: clamp_score(technical),
        asmr: clamp_score(asmr),
    }
}

/// Собрать отчет по результату ffprobe
pub fn build_report(probe: &AudioProbe) -> AudioQualityReport {
    let scores = score(probe);

    let mut recommendations = Vec::new();
    if probe.sample_rate < 44100 {
        recommendations.push(RECOMMEND_SAMPLE_RATE.to_string());
    }
    if probe.bit_rate < 256_000 {
        recommendations.push(RECOMMEND_BIT_RATE.to_string());
    }
    if scores.technical < REPROCESSING_THRESHOLD {
        recommendations.push(RECOMMEND_QUALITY.to_string());
    }
    if scores.technical < 8.0 {
        recommendations.push(RECOMMEND_ASMR_FILTER.to_string());
    }

    AudioQualityReport {
        overall_score: scores.overall(),
        technical_metrics: technical_metrics(probe.sample_rate, probe.bit_rate),
        asmr_metrics: AsmrMetrics {
            voice_clarity: if scores.asmr > 7.0 { 8.0 } else { 6.0 },
            soundscape_harmony: 7.0,
            binaural_effectiveness: 6.0,
            relaxation_potential: if scores.asmr > 6.0 { 8.0 } else { 5.0 },
        },
        recommendations,
        needs_reprocessing: scores.technical < REPROCESSING_THRESHOLD,
    }
}

/// Отчет, который возвращается, если анализ не удался
pub fn default_report() -> AudioQualityReport {
    AudioQualityReport {
        overall_score: 5.0,
        technical_metrics: technical_metrics(44100, 256_000),
        asmr_metrics: AsmrMetrics {
            voice_clarity: 5.0,
            soundscape_harmony: 5.0,
            binaural_effectiveness: 5.0,
            relaxation_potential: 5.0,
        },
        recommendations: vec![ANALYSIS_FALLBACK_RECOMMENDATION.to_string()],
        needs_reprocessing: false,
    }
}

fn technical_metrics(sample_rate: u32, bit_rate: u64) -> TechnicalMetrics {
    TechnicalMetrics {
        sample_rate,
        bit_rate,
        dynamic_range: PLACEHOLDER_DYNAMIC_RANGE_DB,
        noise_floor: PLACEHOLDER_NOISE_FLOOR_DB,
        frequency_response: FrequencyResponse::default(),
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(MIN_SCORE, MAX_SCORE)
}

/// Анализатор качества поверх ffprobe
#[derive(Clone)]
pub struct QualityAnalyzer {
    engine: MediaEngine,
    temp: TempFileManager,
}

impl QualityAnalyzer {
    pub fn new(engine: MediaEngine, temp: TempFileManager) -> Self {
        Self { engine, temp }
    }

    /// Проанализировать буфер. Ошибки ffprobe и метаданных возвращаются как есть
    pub async fn analyze(&self, audio: &[u8]) -> Result<AudioQualityReport> {
        let mut session = self.temp.session();
        debug!("[{}] Quality analysis started ({} bytes)", session.id(), audio.len());

        let result = self.analyze_in_session(&mut session, audio).await;
        self.temp.cleanup_session(&mut session).await;

        if let Err(e) = &result {
            error!("[{}] Quality analysis failed: {}", session.id(), e);
        }
        result
    }

    async fn analyze_in_session(&self, session: &mut TempSession, audio: &[u8]) -> Result<AudioQualityReport> {
        self.temp.ensure_root().await?;
        let input = session.allocate("analysis", "wav");
        tokio::fs::write(&input, audio).await?;

        let probe = self.probe_file(&input).await?;
        debug!(
            "[{}] probed {} Hz, {} bps, {:.2}s, {} ch",
            session.id(),
            probe.sample_rate,
            probe.bit_rate,
            probe.duration,
            probe.channels
        );
        Ok(build_report(&probe))
    }

    /// Запустить ffprobe для файла на диске
    pub async fn probe_file(&self, path: &std::path::Path) -> Result<AudioProbe> {
        let json = self.engine.probe_json(path).await?;
        parse_probe_output(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(sample_rate: u32, bit_rate: u64, channels: u32) -> AudioProbe {
        AudioProbe {
            sample_rate,
            bit_rate,
            duration: 10.0,
            channels,
            codec_name: None,
            format_name: None,
            size: None,
        }
    }

    #[test]
    fn studio_quality_hits_the_ceiling() {
        let scores = score(&probe(48000, 320_000, 2));
        assert_eq!(scores.technical, 10.0);
        assert_eq!(scores.asmr, 8.0);
        assert_eq!(scores.overall(), 9.0);

        let report = build_report(&probe(48000, 320_000, 2));
        assert_eq!(report.overall_score, 9.0);
        assert!(report.recommendations.is_empty());
        assert!(!report.needs_reprocessing);
        assert_eq!(report.asmr_metrics.voice_clarity, 8.0);
        assert_eq!(report.asmr_metrics.relaxation_potential, 8.0);
    }

    #[test]
    fn cd_quality_stereo_at_256k() {
        let scores = score(&probe(44100, 256_000, 2));
        assert_eq!(scores.technical, 8.5);
        assert_eq!(scores.asmr, 8.0);

        let report = build_report(&probe(44100, 256_000, 2));
        assert_eq!(report.overall_score, 8.25);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn mid_bitrate_gets_partial_asmr_bonus() {
        let scores = score(&probe(44100, 192_000, 1));
        assert_eq!(scores.technical, 7.0);
        assert_eq!(scores.asmr, 7.0);

        let report = build_report(&probe(44100, 192_000, 1));
        assert_eq!(report.asmr_metrics.voice_clarity, 6.0);
        assert_eq!(report.asmr_metrics.relaxation_potential, 8.0);
        assert_eq!(
            report.recommendations,
            vec![RECOMMEND_BIT_RATE.to_string(), RECOMMEND_ASMR_FILTER.to_string()]
        );
    }

    #[test]
    fn low_quality_needs_reprocessing() {
        let report = build_report(&probe(22050, 64_000, 1));
        assert_eq!(report.overall_score, 5.0);
        assert!(report.needs_reprocessing);
        assert_eq!(report.asmr_metrics.voice_clarity, 6.0);
        assert_eq!(report.asmr_metrics.relaxation_potential, 5.0);
        assert_eq!(
            report.recommendations,
            vec![
                RECOMMEND_SAMPLE_RATE.to_string(),
                RECOMMEND_BIT_RATE.to_string(),
                RECOMMEND_QUALITY.to_string(),
                RECOMMEND_ASMR_FILTER.to_string(),
            ]
        );
    }

    #[test]
    fn fixed_metrics_are_present() {
        let report = build_report(&probe(44100, 128_000, 2));
        assert_eq!(report.asmr_metrics.soundscape_harmony, 7.0);
        assert_eq!(report.asmr_metrics.binaural_effectiveness, 6.0);
        assert_eq!(report.technical_metrics.frequency_response, FrequencyResponse::default());
        assert_eq!(report.technical_metrics.sample_rate, 44100);
        assert_eq!(report.technical_metrics.bit_rate, 128_000);
    }

    #[test]
    fn scores_stay_in_bounds_across_the_grid() {
        for rate in [8000, 16000, 22050, 32000, 44100, 48000, 96000, 192000] {
            for bits in [0, 64_000, 128_000, 192_000, 256_000, 320_000, 1_411_200] {
                for channels in [0, 1, 2, 6] {
                    let p = probe(rate, bits, channels);
                    let scores = score(&p);
                    let report = build_report(&p);

                    for value in [scores.technical, scores.asmr, report.overall_score] {
                        assert!((1.0..=10.0).contains(&value), "{} out of bounds", value);
                    }
                    let m = &report.asmr_metrics;
                    for value in [
                        m.voice_clarity,
                        m.soundscape_harmony,
                        m.binaural_effectiveness,
                        m.relaxation_potential,
                    ] {
                        assert!((1.0..=10.0).contains(&value));
                    }
                    assert_eq!(report.needs_reprocessing, scores.technical < 6.0);
                }
            }
        }
    }

    #[test]
    fn default_report_shape() {
        let report = default_report();
        assert_eq!(report.overall_score, 5.0);
        assert_eq!(report.technical_metrics.sample_rate, 44100);
        assert_eq!(report.technical_metrics.bit_rate, 256_000);
        assert_eq!(report.recommendations, vec![ANALYSIS_FALLBACK_RECOMMENDATION.to_string()]);
        assert!(!report.needs_reprocessing);
    }
}
