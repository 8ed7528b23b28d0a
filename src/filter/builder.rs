//! # Filter graph builders
//!
//! Pure functions translating mixing/effect options into FFmpeg filter
//! descriptions. Stage order is fixed: every stage reads the label written by
//! the previous one.

use crate::config::{BinauralSettings, MixingOptions};
use crate::filter::graph::{format_number, Filter, FilterChain, FilterGraph};

/// Input pad of the voice track
pub const VOICE_INPUT: &str = "0:a";
/// Input pad of the soundscape track
pub const SOUNDSCAPE_INPUT: &str = "1:a";
/// Terminal label mapped to the output file
pub const OUTPUT_LABEL: &str = "out";

/// amix ramp when one input ends before the other (seconds)
pub const AMIX_DROPOUT_TRANSITION: u32 = 3;

/// Center frequencies of the three EQ bands (Hz)
pub const EQ_LOW_CENTER_HZ: f64 = 100.0;
pub const EQ_MID_CENTER_HZ: f64 = 1000.0;
pub const EQ_HIGH_CENTER_HZ: f64 = 10000.0;
/// Band width in octaves
pub const EQ_OCTAVE_WIDTH: f64 = 2.0;

/// dynaudnorm settings shared by the mixing and ASMR stages
pub const NORMALIZER_PEAK: f64 = 0.95;
pub const NORMALIZER_MAX_GAIN: f64 = 10.0;
pub const NORMALIZER_WINDOW: u32 = 12;

/// aecho gains shared by the binaural and ASMR stages
pub const ECHO_IN_GAIN: f64 = 0.8;
pub const ECHO_OUT_GAIN: f64 = 0.9;
/// aecho rejects zero delays and decays
pub const MIN_ECHO_DELAY_MS: f64 = 0.1;
pub const MIN_ECHO_DECAY: f64 = 0.001;

/// stereotools middle level used for width changes
pub const STEREO_MID_LEVEL: f64 = 0.8;

/// Fixed ASMR optimization chain
pub const ASMR_HIGHPASS_HZ: f64 = 80.0;
pub const ASMR_LOWPASS_HZ: f64 = 15000.0;
pub const ASMR_ECHO_DELAY_MS: f64 = 20.0;
pub const ASMR_ECHO_DECAY: f64 = 0.1;

/// Loudness normalization (EBU R128)
pub const DEFAULT_TARGET_LUFS: f64 = -23.0;
pub const LOUDNORM_TRUE_PEAK: f64 = -2.0;
pub const LOUDNORM_LOUDNESS_RANGE: f64 = 7.0;

/// Build the voice + soundscape mixing graph.
///
/// `mixed_duration` is the expected length of the mix in seconds (the shorter
/// input). When it is known the fade-out gets an absolute start; otherwise the
/// fade is addressed from the end of the stream by reversing it.
pub fn build_mixing_graph(options: &MixingOptions, mixed_duration: Option<f64>) -> FilterGraph {
    let mut graph = FilterGraph::new();

    graph
        .push([VOICE_INPUT], volume(options.voice_volume), "voice")
        .push([SOUNDSCAPE_INPUT], volume(options.soundscape_volume), "soundscape")
        .push(
            ["voice", "soundscape"],
            Filter::new("amix")
                .arg("inputs", 2)
                .arg("duration", "shortest")
                .arg("dropout_transition", AMIX_DROPOUT_TRANSITION),
            "mixed",
        );
    let mut current = "mixed".to_string();

    if options.fade_in_duration > 0.0 {
        graph.push([current.as_str()], fade("in", 0.0, options.fade_in_duration), "faded_in");
        current = "faded_in".to_string();
    }

    if options.fade_out_duration > 0.0 {
        let fade_out = options.fade_out_duration;
        // абсолютное начало только если фейд целиком помещается в микс
        match mixed_duration.filter(|d| d.is_finite() && *d >= fade_out) {
            Some(duration) => {
                let start = duration - fade_out;
                graph.push([current.as_str()], fade("out", start, fade_out), "faded_out");
            }
            None => {
                // длительность неизвестна или меньше фейда: fade-in на развернутом сигнале
                graph
                    .push([current.as_str()], Filter::new("areverse"), "reversed")
                    .push(["reversed"], fade("in", 0.0, fade_out), "reversed_faded")
                    .push(["reversed_faded"], Filter::new("areverse"), "faded_out");
            }
        }
        current = "faded_out".to_string();
    }

    if let Some(eq) = &options.eq_settings {
        for (label, center, gain) in [
            ("eq_low", EQ_LOW_CENTER_HZ, eq.low_freq),
            ("eq_mid", EQ_MID_CENTER_HZ, eq.mid_freq),
            ("eq_high", EQ_HIGH_CENTER_HZ, eq.high_freq),
        ] {
            graph.push([current.as_str()], peaking_eq(center, gain), label);
            current = label.to_string();
        }
    }

    // степень сжатия сама в фильтр не передается, только включает его
    if options.compression_ratio.map_or(false, |ratio| ratio > 1.0) {
        graph.push([current.as_str()], dynamic_normalizer(), "compressed");
        current = "compressed".to_string();
    }

    graph.push([current.as_str()], Filter::new("anull"), OUTPUT_LABEL);
    graph
}

/// Build the binaural spatialization graph.
///
/// Callers check `settings.enabled` first; a disabled effect never reaches
/// the engine.
pub fn build_binaural_graph(settings: &BinauralSettings) -> FilterGraph {
    let mut graph = FilterGraph::new();

    let widen = if settings.spatial_width == 1.0 {
        Filter::new("anull")
    } else {
        Filter::new("stereotools")
            .num("mlev", STEREO_MID_LEVEL)
            .num("slev", settings.spatial_width)
    };
    graph.push(["0:a"], widen, "widened");

    let spatial = if settings.left_delay > 0.0 || settings.right_delay > 0.0 {
        let tap = |ms: f64| format_number(ms.max(MIN_ECHO_DELAY_MS));
        let decay = format_number(settings.reverb_amount.max(MIN_ECHO_DECAY));
        Filter::new("aecho")
            .positional(format_number(ECHO_IN_GAIN))
            .positional(format_number(ECHO_OUT_GAIN))
            .positional(format!("{}|{}", tap(settings.right_delay), tap(settings.left_delay)))
            .positional(format!("{}|{}", decay, decay))
    } else {
        Filter::new("anull")
    };
    graph.push(["widened"], spatial, "spatial");

    graph.push(["spatial"], Filter::new("anull"), OUTPUT_LABEL);
    graph
}

/// The fixed ASMR mastering chain (always identical)
pub fn build_asmr_optimization_chain() -> FilterChain {
    FilterChain::new()
        .then(Filter::new("highpass").num("f", ASMR_HIGHPASS_HZ))
        .then(Filter::new("lowpass").num("f", ASMR_LOWPASS_HZ))
        .then(dynamic_normalizer())
        .then(
            Filter::new("aecho")
                .positional(format_number(ECHO_IN_GAIN))
                .positional(format_number(ECHO_OUT_GAIN))
                .positional(format_number(ASMR_ECHO_DELAY_MS))
                .positional(format_number(ASMR_ECHO_DECAY)),
        )
        .then(loudness_normalizer(DEFAULT_TARGET_LUFS))
}

/// Single-stage loudness normalization chain
pub fn build_normalization_chain(target_lufs: f64) -> FilterChain {
    FilterChain::new().then(loudness_normalizer(target_lufs))
}

/// `loudnorm` targeting the given integrated loudness
pub fn loudness_normalizer(target_lufs: f64) -> Filter {
    Filter::new("loudnorm")
        .num("I", target_lufs)
        .num("TP", LOUDNORM_TRUE_PEAK)
        .num("LRA", LOUDNORM_LOUDNESS_RANGE)
}

fn volume(gain: f64) -> Filter {
    Filter::new("volume").positional(format_number(gain))
}

fn fade(direction: &str, start: f64, duration: f64) -> Filter {
    Filter::new("afade")
        .arg("t", direction)
        .num("st", start)
        .num("d", duration)
        .arg("curve", "exp")
}

fn peaking_eq(center_hz: f64, gain_db: f64) -> Filter {
    Filter::new("equalizer")
        .num("f", center_hz)
        .arg("width_type", "o")
        .num("width", EQ_OCTAVE_WIDTH)
        .num("g", gain_db)
}

fn dynamic_normalizer() -> Filter {
    Filter::new("dynaudnorm")
        .num("p", NORMALIZER_PEAK)
        .num("m", NORMALIZER_MAX_GAIN)
        .arg("g", NORMALIZER_WINDOW)
}
