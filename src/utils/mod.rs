//! Вспомогательные модули: запуск FFmpeg, временные файлы, логирование

pub mod ffmpeg;
pub mod temp;
pub mod logger;
