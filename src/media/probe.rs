//! Разбор JSON-вывода ffprobe
//!
//! Ожидается вывод `ffprobe -print_format json -show_format -show_streams`.
//! Частота дискретизации, битрейт и длительность обязательны.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MixerError, Result};

/// Технические параметры аудиофайла
#[derive(Debug, Clone, PartialEq)]
pub struct AudioProbe {
    pub sample_rate: u32,
    pub bit_rate: u64,
    pub duration: f64,
    /// 0, если ffprobe не сообщил число каналов
    pub channels: u32,
    pub codec_name: Option<String>,
    pub format_name: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    sample_rate: Option<Value>,
    channels: Option<Value>,
    bit_rate: Option<Value>,
    duration: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    duration: Option<Value>,
    bit_rate: Option<Value>,
    size: Option<Value>,
}

/// Разобрать вывод ffprobe
pub fn parse_probe_output(json: &str) -> Result<AudioProbe> {
    let output: ProbeOutput = serde_json::from_str(json)?;

    let stream = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .ok_or_else(|| MixerError::InvalidMetadata("no audio stream found".to_string()))?;
    let format = output.format.as_ref();

    let sample_rate = number(&stream.sample_rate)
        .ok_or_else(|| missing("sample rate"))? as u32;

    let bit_rate = format
        .and_then(|f| number(&f.bit_rate))
        .or_else(|| number(&stream.bit_rate))
        .ok_or_else(|| missing("bit rate"))? as u64;

    let duration = format
        .and_then(|f| number(&f.duration))
        .or_else(|| number(&stream.duration))
        .ok_or_else(|| missing("duration"))?;

    Ok(AudioProbe {
        sample_rate,
        bit_rate,
        duration,
        channels: number(&stream.channels).map_or(0, |c| c as u32),
        codec_name: stream.codec_name.clone(),
        format_name: format.and_then(|f| f.format_name.clone()),
        size: format.and_then(|f| number(&f.size)).map(|s| s as u64),
    })
}

fn missing(field: &str) -> MixerError {
    MixerError::InvalidMetadata(format!("probe output has no {}", field))
}

/// ffprobe отдает числа строками, иногда "N/A"
fn number(value: &Option<Value>) -> Option<f64> {
    let parsed = match value.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}
