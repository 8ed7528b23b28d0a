//! Общие помощники интеграционных тестов: подменный запуск процессов и
//! генерация WAV-файлов

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::f32::consts::PI;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use asmr_mixer::{CommandOutput, CommandRunner, MixerConfig, MixerError, Result};

pub const FAKE_FFMPEG: &str = "fake-ffmpeg";
pub const FAKE_FFPROBE: &str = "fake-ffprobe";

/// Что делает подменный ffmpeg
#[derive(Debug, Clone)]
pub enum FfmpegBehavior {
    /// Записать байты в выходной файл (последний аргумент)
    WriteOutput(Vec<u8>),
    /// Завершиться с ненулевым кодом
    Fail { code: i32, stderr: String },
    /// Не уложиться в таймаут
    Timeout,
}

/// Что делает подменный ffprobe
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    Json(String),
    Fail,
}

/// Один записанный вызов
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub description: String,
}

impl RecordedCall {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.args.last().cloned().unwrap_or_default())
    }

    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        let index = self.args.iter().position(|a| a == flag)?;
        self.args.get(index + 1).map(|s| s.as_str())
    }
}

/// Подменный запуск ffmpeg/ffprobe без реальных процессов
pub struct FakeRunner {
    ffmpeg: FfmpegBehavior,
    probe: ProbeBehavior,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRunner {
    pub fn new(ffmpeg: FfmpegBehavior, probe: ProbeBehavior) -> Arc<Self> {
        Arc::new(Self::build(ffmpeg, probe, None))
    }

    pub fn with_delay(ffmpeg: FfmpegBehavior, probe: ProbeBehavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(ffmpeg, probe, Some(delay)))
    }

    fn build(ffmpeg: FfmpegBehavior, probe: ProbeBehavior, delay: Option<Duration>) -> Self {
        Self {
            ffmpeg,
            probe,
            delay,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn ffmpeg_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.program == FAKE_FFMPEG).collect()
    }

    pub fn probe_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.program == FAKE_FFPROBE).collect()
    }

    /// Наибольшее число одновременно выполнявшихся вызовов ffmpeg
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run_ffmpeg(&self, args: &[String], description: &str) -> Result<CommandOutput> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.ffmpeg {
            FfmpegBehavior::WriteOutput(bytes) => {
                let output = args.last().expect("ffmpeg call without output path");
                tokio::fs::write(output, bytes).await?;
                Ok(CommandOutput::default())
            }
            FfmpegBehavior::Fail { code, stderr } => Err(MixerError::EngineExecution {
                description: description.to_string(),
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            FfmpegBehavior::Timeout => Err(MixerError::EngineTimeout {
                description: description.to_string(),
                timeout: Duration::from_secs(1),
            }),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &Path, args: &[String], description: &str) -> Result<CommandOutput> {
        let program = program.to_string_lossy().to_string();
        self.calls.lock().push(RecordedCall {
            program: program.clone(),
            args: args.to_vec(),
            description: description.to_string(),
        });

        if program == FAKE_FFPROBE {
            return match &self.probe {
                ProbeBehavior::Json(json) => Ok(CommandOutput {
                    stdout: json.clone().into_bytes(),
                    stderr: String::new(),
                }),
                ProbeBehavior::Fail => Err(MixerError::EngineExecution {
                    description: description.to_string(),
                    code: Some(1),
                    stderr: "Invalid data found when processing input".to_string(),
                }),
            };
        }

        self.run_ffmpeg(args, description).await
    }
}

/// Конфигурация с подменными путями и временной директорией теста
pub fn fake_config(temp_dir: &Path) -> MixerConfig {
    MixerConfig {
        temp_dir: temp_dir.to_path_buf(),
        ffmpeg_path: PathBuf::from(FAKE_FFMPEG),
        ffprobe_path: PathBuf::from(FAKE_FFPROBE),
        process_timeout_secs: None,
        cleanup_temp_files: true,
    }
}

/// JSON в формате `ffprobe -show_format -show_streams`
pub fn probe_json(sample_rate: u32, bit_rate: u64, duration: f64, channels: u32) -> String {
    serde_json::json!({
        "streams": [{
            "index": 0,
            "codec_name": "pcm_s16le",
            "codec_type": "audio",
            "sample_rate": sample_rate.to_string(),
            "channels": channels,
            "bit_rate": bit_rate.to_string(),
            "duration": format!("{:.6}", duration),
        }],
        "format": {
            "format_name": "wav",
            "duration": format!("{:.6}", duration),
            "bit_rate": bit_rate.to_string(),
            "size": "1764078",
        }
    })
    .to_string()
}

/// Имена файлов, оставшихся во временной директории
pub fn leftover_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Создает WAV (16-bit PCM) с синусоидой
pub fn sine_wav(freq: f32, duration_sec: f32, sample_rate: u32, channels: u16, amplitude: f32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        let num_samples = (duration_sec * sample_rate as f32) as usize;
        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            let sample = (amplitude * (2.0 * PI * freq * t).sin() * i16::MAX as f32) as i16;
            for _ in 0..channels {
                writer.write_sample(sample).expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// Параметры и пиковая амплитуда WAV-буфера
pub fn wav_peak(bytes: &[u8]) -> (hound::WavSpec, f32) {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).expect("valid wav");
    let spec = reader.spec();
    let peak = reader
        .samples::<i16>()
        .filter_map(|s| s.ok())
        .map(|s| (s as f32 / i16::MAX as f32).abs())
        .fold(0.0, f32::max);
    (spec, peak)
}
