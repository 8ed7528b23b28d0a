//! Модуль обработки ошибок библиотеки asmr-mixer
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при микшировании
//! и мастеринге аудио через FFmpeg.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Ошибки библиотеки asmr-mixer
#[derive(Debug, Error)]
pub enum MixerError {
    /// Не удалось запустить процесс FFmpeg/FFprobe
    #[error("Failed to start {}: {source}", program.display())]
    EngineSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Процесс запустился, но завершился с ненулевым кодом
    #[error("{description} failed (exit code: {}): {stderr}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    EngineExecution {
        description: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Процесс не уложился в отведенное время и был остановлен
    #[error("{description} timed out after {timeout:?}")]
    EngineTimeout {
        description: String,
        timeout: Duration,
    },

    /// В выводе ffprobe нет обязательных полей
    #[error("Invalid audio metadata: {0}")]
    InvalidMetadata(String),

    /// Параметры вне допустимого диапазона
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MixerError {
    /// Ошибка пришла от внешнего процесса (а не от файловой системы или параметров)
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Self::EngineSpawn { .. } | Self::EngineExecution { .. } | Self::EngineTimeout { .. }
        )
    }
}

/// Тип Result для библиотеки asmr-mixer
pub type Result<T> = std::result::Result<T, MixerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_message_carries_stderr_and_code() {
        let err = MixerError::EngineExecution {
            description: "Voice/soundscape mix".to_string(),
            code: Some(1),
            stderr: "Invalid argument".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code: 1"));
        assert!(message.contains("Invalid argument"));
        assert!(err.is_engine_error());
    }

    #[test]
    fn killed_process_has_no_exit_code() {
        let err = MixerError::EngineExecution {
            description: "Loudness normalization".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit code: none"));
    }

    #[test]
    fn io_errors_are_not_engine_errors() {
        let err: MixerError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!err.is_engine_error());
    }
}
