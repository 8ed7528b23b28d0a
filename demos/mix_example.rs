//! Пример: смешать голос с саундскейпом, применить мастеринг и сохранить mp3
//!
//! cargo run --example mix_example -- voice.wav rain.wav out.mp3

use anyhow::{bail, Context, Result};
use log::info;

use asmr_mixer::{
    init_logger, AudioFormat, AudioMixer, BinauralSettings, MixerConfig, MixingOptions, QualityTier,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!("usage: {} <voice.wav> <soundscape.wav> <output.mp3>", args[0]);
    }

    let voice = tokio::fs::read(&args[1])
        .await
        .with_context(|| format!("Failed to read voice track {}", args[1]))?;
    let soundscape = tokio::fs::read(&args[2])
        .await
        .with_context(|| format!("Failed to read soundscape {}", args[2]))?;

    let mixer = AudioMixer::new(MixerConfig::from_env()?)?;
    if !mixer.check_engine().await {
        bail!("FFmpeg/FFprobe are not available");
    }

    let mixed = mixer
        .mix_voice_and_soundscape(&voice, &soundscape, &MixingOptions::default())
        .await?;
    info!(
        "Mixed {:.1}s in {} ms, score {:.2}",
        mixed.metadata.duration, mixed.metadata.processing_time, mixed.quality_report.overall_score
    );
    for recommendation in &mixed.quality_report.recommendations {
        info!("Recommendation: {}", recommendation);
    }

    let binaural = BinauralSettings {
        enabled: true,
        spatial_width: 1.3,
        left_delay: 12.0,
        right_delay: 0.0,
        reverb_amount: 0.2,
    };
    let spatial = mixer.apply_binaural_effects(&mixed.output_buffer, &binaural).await?;
    let mastered = mixer.optimize_for_asmr(&spatial).await?;
    let mp3 = mixer
        .convert_format(&mastered, AudioFormat::Mp3, QualityTier::Premium)
        .await?;

    tokio::fs::write(&args[3], &mp3)
        .await
        .with_context(|| format!("Failed to write {}", args[3]))?;

    let report = mixer.analyze_audio_quality(&mp3).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
