//! Модуль для запуска FFmpeg и FFprobe
//!
//! Запуск внешнего процесса с перехватом stdout/stderr и преобразованием
//! кода выхода в типизированную ошибку. Повторных попыток здесь нет.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, error, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::config::MixerConfig;
use crate::error::{MixerError, Result};

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"version n?(\d+\.\d+(?:\.\d+)?)").unwrap();
}

/// Результат успешно завершенного процесса
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }
}

/// Запуск внешней программы
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Запустить `program` с аргументами и дождаться завершения.
    ///
    /// Ненулевой код выхода превращается в `MixerError::EngineExecution`,
    /// невозможность запуска в `MixerError::EngineSpawn`.
    async fn run(&self, program: &Path, args: &[String], description: &str) -> Result<CommandOutput>;
}

/// Запуск через `tokio::process` с опциональным таймаутом
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &Path, args: &[String], description: &str) -> Result<CommandOutput> {
        debug!("{}: {} {}", description, program.display(), args.join(" "));

        let mut cmd = TokioCommand::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| {
            error!("Failed to start {} for {}: {}", program.display(), description, source);
            MixerError::EngineSpawn {
                program: program.to_path_buf(),
                source,
            }
        })?;

        let output = match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    // дочерний процесс убивается при drop (kill_on_drop)
                    warn!("{} exceeded {:?}, process killed", description, limit);
                    return Err(MixerError::EngineTimeout {
                        description: description.to_string(),
                        timeout: limit,
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            error!("{} failed with status {}: {}", description, output.status, stderr);
            return Err(MixerError::EngineExecution {
                description: description.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr,
        })
    }
}

/// FFmpeg и FFprobe с общими путями и способом запуска
#[derive(Clone)]
pub struct MediaEngine {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl MediaEngine {
    /// Создать движок, запускающий реальные процессы
    pub fn new(config: &MixerConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner::new(config.process_timeout())))
    }

    /// Создать движок с собственным способом запуска
    pub fn with_runner(config: &MixerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            runner,
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    /// Запуск команды FFmpeg (перезапись выхода, без баннера)
    pub async fn run_ffmpeg(&self, args: &[String], description: &str) -> Result<()> {
        let mut full_args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-loglevel", "error"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        full_args.extend_from_slice(args);

        self.runner.run(&self.ffmpeg_path, &full_args, description).await?;
        Ok(())
    }

    /// Запуск FFprobe с JSON-выводом формата и потоков
    pub async fn probe_json(&self, input: &Path) -> Result<String> {
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            input.to_string_lossy().to_string(),
        ];

        let output = self.runner.run(&self.ffprobe_path, &args, "Audio probe").await?;
        Ok(output.stdout_text())
    }
}

/// Проверка наличия FFmpeg (или FFprobe) по указанному пути
pub async fn check_ffmpeg_installed(path: &Path) -> bool {
    match TokioCommand::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => status.success(),
        Err(_) => false,
    }
}

/// Получение версии FFmpeg
pub async fn ffmpeg_version(path: &Path) -> Result<String> {
    let args = vec!["-version".to_string()];
    let output = ProcessRunner::default().run(path, &args, "Version check").await?;
    let text = output.stdout_text();
    let first_line = text.lines().next().unwrap_or("").trim();

    Ok(parse_version(first_line).unwrap_or_else(|| first_line.to_string()))
}

/// Выделить `x.y.z` из первой строки `-version`
fn parse_version(line: &str) -> Option<String> {
    let caps = VERSION_RE.captures(line)?;
    let version = caps.get(1)?.as_str();
    let parts: Vec<&str> = version.split('.').collect();

    Some(match parts.len() {
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_release_versions() {
        assert_eq!(
            parse_version("ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023").as_deref(),
            Some("6.1.1")
        );
        assert_eq!(
            parse_version("ffprobe version 7.0 Copyright (c) 2007-2024").as_deref(),
            Some("7.0.0")
        );
        assert_eq!(parse_version("ffmpeg version n5.1.4").as_deref(), Some("5.1.4"));
        assert_eq!(parse_version("ffmpeg version N-113000-gdeadbeef"), None);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let runner = ProcessRunner::default();
        let result = runner
            .run(Path::new("/nonexistent/definitely-not-ffmpeg"), &[], "Spawn check")
            .await;

        match result {
            Err(MixerError::EngineSpawn { program, .. }) => {
                assert_eq!(program, PathBuf::from("/nonexistent/definitely-not-ffmpeg"));
            }
            other => panic!("expected spawn error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn missing_binary_is_not_installed() {
        assert!(!check_ffmpeg_installed(Path::new("/nonexistent/definitely-not-ffmpeg")).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_stderr_and_code() {
        let runner = ProcessRunner::default();
        let args = vec!["-c".to_string(), "echo broken graph >&2; exit 3".to_string()];
        let result = runner.run(Path::new("sh"), &args, "Failing command").await;

        match result {
            Err(MixerError::EngineExecution { code, stderr, description }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken graph");
                assert_eq!(description, "Failing command");
            }
            other => panic!("expected execution error, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_captured() {
        let runner = ProcessRunner::default();
        let args = vec!["-c".to_string(), "printf '{\"ok\":true}'".to_string()];
        let output = runner.run(Path::new("sh"), &args, "Echo").await.unwrap();
        assert_eq!(output.stdout_text(), "{\"ok\":true}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let args = vec!["5".to_string()];
        let result = runner.run(Path::new("sleep"), &args, "Sleep").await;
        assert!(matches!(result, Err(MixerError::EngineTimeout { .. })));
    }
}
