//! Модуль микширования и мастеринга
//!
//! Каждая операция работает в собственной временной сессии:
//! запись входов -> построение графа -> запуск ffmpeg -> чтение результата ->
//! (анализ) -> очистка. Очистка выполняется и при ошибке.

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AudioFormat, BinauralSettings, MixerConfig, MixingOptions, QualityTier};
use crate::error::{MixerError, Result};
use crate::filter::{
    build_asmr_optimization_chain, build_binaural_graph, build_mixing_graph,
    build_normalization_chain, FilterChain, FilterGraph,
};
use crate::media::analysis::{build_report, default_report, QualityAnalyzer};
use crate::media::format::{encoder_settings, pcm_settings, PCM_SAMPLE_RATE};
use crate::media::probe::AudioProbe;
use crate::types::{AudioMetadata, AudioProcessingResult, AudioQualityReport};
use crate::utils::ffmpeg::{check_ffmpeg_installed, ffmpeg_version, CommandRunner, MediaEngine};
use crate::utils::temp::{TempFileManager, TempSession};

/// Сколько задач пакетного микширования выполняется одновременно
pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;
/// Число каналов результата микширования
pub const MIX_CHANNELS: u32 = 2;

/// Допустимый диапазон целевой громкости loudnorm (LUFS)
const MIN_TARGET_LUFS: f64 = -70.0;
const MAX_TARGET_LUFS: f64 = -5.0;
/// Размер стандартного заголовка WAV
const WAV_HEADER_BYTES: usize = 44;

/// Задание для пакетного микширования
#[derive(Debug, Clone)]
pub struct MixJob {
    pub voice: Vec<u8>,
    pub soundscape: Vec<u8>,
    pub options: MixingOptions,
}

/// Как граф фильтров передается ffmpeg
enum FilterArgs {
    Complex(FilterGraph),
    Chain(FilterChain),
    None,
}

impl FilterArgs {
    fn to_args(&self) -> Vec<String> {
        match self {
            Self::Complex(graph) => {
                let mut args = vec!["-filter_complex".to_string(), graph.to_string()];
                if let Some(target) = graph.map_target() {
                    args.push("-map".to_string());
                    args.push(target);
                }
                args
            }
            Self::Chain(chain) => vec!["-af".to_string(), chain.to_string()],
            Self::None => Vec::new(),
        }
    }
}

/// Сервис микширования и мастеринга ASMR-аудио
#[derive(Clone)]
pub struct AudioMixer {
    config: MixerConfig,
    engine: MediaEngine,
    temp: TempFileManager,
    analyzer: QualityAnalyzer,
}

impl AudioMixer {
    /// Создать микшер, запускающий реальные ffmpeg/ffprobe
    pub fn new(config: MixerConfig) -> Result<Self> {
        let engine = MediaEngine::new(&config);
        Self::with_engine(config, engine)
    }

    /// Создать микшер с собственным способом запуска процессов
    pub fn with_runner(config: MixerConfig, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let engine = MediaEngine::with_runner(&config, runner);
        Self::with_engine(config, engine)
    }

    fn with_engine(config: MixerConfig, engine: MediaEngine) -> Result<Self> {
        let temp = TempFileManager::new(&config.temp_dir, config.cleanup_temp_files)?;
        let analyzer = QualityAnalyzer::new(engine.clone(), temp.clone());

        Ok(Self {
            config,
            engine,
            temp,
            analyzer,
        })
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// Проверить, что ffmpeg и ffprobe запускаются
    pub async fn check_engine(&self) -> bool {
        let ffmpeg_ok = check_ffmpeg_installed(self.engine.ffmpeg_path()).await;
        let ffprobe_ok = check_ffmpeg_installed(self.engine.ffprobe_path()).await;

        if ffmpeg_ok {
            match ffmpeg_version(self.engine.ffmpeg_path()).await {
                Ok(version) => info!("FFmpeg version: {}", version),
                Err(e) => warn!("Could not read FFmpeg version: {}", e),
            }
        } else {
            warn!("FFmpeg not runnable at {}", self.engine.ffmpeg_path().display());
        }
        if !ffprobe_ok {
            warn!("FFprobe not runnable at {}", self.engine.ffprobe_path().display());
        }

        ffmpeg_ok && ffprobe_ok
    }

    /// Смешать голос и саундскейп в стерео WAV 44.1 кГц
    pub async fn mix_voice_and_soundscape(
        &self,
        voice: &[u8],
        soundscape: &[u8],
        options: &MixingOptions,
    ) -> Result<AudioProcessingResult> {
        let started = Instant::now();
        let mut session = self.temp.session();
        debug!(
            "[{}] Mixing voice ({} bytes) with soundscape ({} bytes)",
            session.id(),
            voice.len(),
            soundscape.len()
        );

        let result = self
            .mix_in_session(&mut session, voice, soundscape, options, started)
            .await;
        self.finish(&mut session, "Voice/soundscape mix", result).await
    }

    async fn mix_in_session(
        &self,
        session: &mut TempSession,
        voice: &[u8],
        soundscape: &[u8],
        options: &MixingOptions,
        started: Instant,
    ) -> Result<AudioProcessingResult> {
        options.validate()?;
        self.temp.ensure_root().await?;

        let voice_path = session.allocate("voice", "wav");
        tokio::fs::write(&voice_path, voice).await?;
        let soundscape_path = session.allocate("soundscape", "wav");
        tokio::fs::write(&soundscape_path, soundscape).await?;
        let output_path = session.allocate("mixed", "wav");

        let mixed_duration = if options.fade_out_duration > 0.0 {
            self.expected_mix_duration(session.id(), &voice_path, &soundscape_path)
                .await
        } else {
            None
        };

        let graph = build_mixing_graph(options, mixed_duration);
        debug!("[{}] Mixing graph: {}", session.id(), graph);

        let mut args = input_args(&[&voice_path, &soundscape_path]);
        args.extend(FilterArgs::Complex(graph).to_args());
        args.extend(pcm_settings().to_args());
        args.extend(["-ac".to_string(), MIX_CHANNELS.to_string()]);
        args.push(path_arg(&output_path));

        self.engine.run_ffmpeg(&args, "Voice/soundscape mix").await?;
        let output_buffer = tokio::fs::read(&output_path).await?;

        let (probe, quality_report) = match self.analyzer.probe_file(&output_path).await {
            Ok(probe) => {
                let report = build_report(&probe);
                (Some(probe), report)
            }
            Err(e) => {
                warn!("[{}] Could not probe mixed output: {}", session.id(), e);
                (None, default_report())
            }
        };

        let metadata = mix_metadata(probe.as_ref(), output_buffer.len(), started);

        Ok(AudioProcessingResult {
            output_buffer,
            metadata,
            quality_report,
        })
    }

    /// Длительность микса (короткий из двух входов), если ffprobe ее знает
    async fn expected_mix_duration(&self, session_id: &str, voice: &Path, soundscape: &Path) -> Option<f64> {
        let mut shortest: Option<f64> = None;
        for input in [voice, soundscape] {
            match self.analyzer.probe_file(input).await {
                Ok(probe) => {
                    shortest = Some(shortest.map_or(probe.duration, |d| d.min(probe.duration)));
                }
                Err(e) => {
                    debug!(
                        "[{}] Duration of {} unknown ({}), fading out from stream end",
                        session_id,
                        input.display(),
                        e
                    );
                    return None;
                }
            }
        }
        shortest
    }

    /// Бинауральная обработка. Если эффект выключен, вход возвращается без изменений
    pub async fn apply_binaural_effects(&self, audio: &[u8], settings: &BinauralSettings) -> Result<Vec<u8>> {
        if !settings.enabled {
            debug!("Binaural effects disabled, returning input unchanged");
            return Ok(audio.to_vec());
        }
        settings.validate()?;

        let graph = build_binaural_graph(settings);
        self.process_single(audio, FilterArgs::Complex(graph), pcm_settings().to_args(), "wav", "Binaural effects")
            .await
    }

    /// Фиксированная ASMR-цепочка мастеринга
    pub async fn optimize_for_asmr(&self, audio: &[u8]) -> Result<Vec<u8>> {
        let chain = build_asmr_optimization_chain();
        self.process_single(audio, FilterArgs::Chain(chain), pcm_settings().to_args(), "wav", "ASMR optimization")
            .await
    }

    /// Нормализация громкости до `target_lufs`
    pub async fn normalize_audio(&self, audio: &[u8], target_lufs: f64) -> Result<Vec<u8>> {
        if !target_lufs.is_finite() || !(MIN_TARGET_LUFS..=MAX_TARGET_LUFS).contains(&target_lufs) {
            return Err(MixerError::InvalidOptions(format!(
                "target loudness must be within [{}, {}] LUFS, got {}",
                MIN_TARGET_LUFS, MAX_TARGET_LUFS, target_lufs
            )));
        }

        let chain = build_normalization_chain(target_lufs);
        self.process_single(audio, FilterArgs::Chain(chain), pcm_settings().to_args(), "wav", "Loudness normalization")
            .await
    }

    /// Конвертация в mp3/aac/wav
    pub async fn convert_format(&self, audio: &[u8], format: AudioFormat, quality: QualityTier) -> Result<Vec<u8>> {
        let encoder = encoder_settings(format, quality);
        debug!("Converting to {} with {:?}", format.as_str(), encoder);
        self.process_single(audio, FilterArgs::None, encoder.to_args(), format.extension(), "Format conversion")
            .await
    }

    /// Анализ качества. Любая ошибка превращается в отчет по умолчанию
    pub async fn analyze_audio_quality(&self, audio: &[u8]) -> AudioQualityReport {
        match self.analyzer.analyze(audio).await {
            Ok(report) => report,
            Err(_) => {
                warn!("Using default quality report");
                default_report()
            }
        }
    }

    /// Пакетное микширование с параллельностью по умолчанию
    pub async fn mix_batch_default(&self, jobs: Vec<MixJob>) -> Vec<Result<AudioProcessingResult>> {
        self.mix_batch(jobs, DEFAULT_BATCH_CONCURRENCY).await
    }

    /// Пакетное микширование с ограничением параллельности. Порядок результатов
    /// совпадает с порядком заданий
    pub async fn mix_batch(&self, jobs: Vec<MixJob>, concurrency: usize) -> Vec<Result<AudioProcessingResult>> {
        let total = jobs.len();
        info!("Batch mixing {} job(s), up to {} at a time", total, concurrency.max(1));

        stream::iter(jobs.into_iter().enumerate())
            .map(|(index, job)| async move {
                debug!("Batch job {}/{} started", index + 1, total);
                self.mix_voice_and_soundscape(&job.voice, &job.soundscape, &job.options)
                    .await
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Один вход, один выход, один проход ffmpeg
    async fn process_single(
        &self,
        audio: &[u8],
        filter: FilterArgs,
        encoder_args: Vec<String>,
        output_extension: &str,
        description: &str,
    ) -> Result<Vec<u8>> {
        let mut session = self.temp.session();
        debug!("[{}] {} started ({} bytes)", session.id(), description, audio.len());

        let result = self
            .process_single_in_session(&mut session, audio, filter, encoder_args, output_extension, description)
            .await;
        self.finish(&mut session, description, result).await
    }

    async fn process_single_in_session(
        &self,
        session: &mut TempSession,
        audio: &[u8],
        filter: FilterArgs,
        encoder_args: Vec<String>,
        output_extension: &str,
        description: &str,
    ) -> Result<Vec<u8>> {
        self.temp.ensure_root().await?;

        let input_path = session.allocate("input", "wav");
        tokio::fs::write(&input_path, audio).await?;
        let output_path = session.allocate("output", output_extension);

        let mut args = input_args(&[&input_path]);
        args.extend(filter.to_args());
        args.extend(encoder_args);
        args.push(path_arg(&output_path));

        self.engine.run_ffmpeg(&args, description).await?;
        Ok(tokio::fs::read(&output_path).await?)
    }

    /// Очистка сессии и логирование исхода операции
    async fn finish<T>(&self, session: &mut TempSession, description: &str, result: Result<T>) -> Result<T> {
        let id = session.id().to_string();
        self.temp.cleanup_session(session).await;

        match &result {
            Ok(_) => debug!("[{}] {} finished", id, description),
            Err(e) => error!("[{}] {} failed: {}", id, description, e),
        }
        result
    }
}

fn input_args(inputs: &[&PathBuf]) -> Vec<String> {
    inputs
        .iter()
        .flat_map(|path| ["-i".to_string(), path_arg(path)])
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn mix_metadata(probe: Option<&AudioProbe>, size: usize, started: Instant) -> AudioMetadata {
    let (duration, sample_rate, channels, format) = match probe {
        Some(p) => (
            p.duration,
            p.sample_rate,
            if p.channels > 0 { p.channels } else { MIX_CHANNELS },
            p.format_name.clone().unwrap_or_else(|| "wav".to_string()),
        ),
        None => (
            pcm_duration(size, PCM_SAMPLE_RATE, MIX_CHANNELS),
            PCM_SAMPLE_RATE,
            MIX_CHANNELS,
            "wav".to_string(),
        ),
    };

    AudioMetadata {
        duration,
        sample_rate,
        channels,
        format,
        size: size as u64,
        processing_time: started.elapsed().as_millis() as u64,
        processed_at: chrono::Utc::now(),
    }
}

/// Длительность 16-bit PCM WAV по размеру буфера
fn pcm_duration(size: usize, sample_rate: u32, channels: u32) -> f64 {
    let payload = size.saturating_sub(WAV_HEADER_BYTES) as f64;
    payload / (sample_rate as f64 * channels as f64 * 2.0)
}
