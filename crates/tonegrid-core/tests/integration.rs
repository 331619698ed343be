//! Integration tests for tonegrid-core primitives.
//!
//! Signal-level checks across modules: ladder filter responses measured with sine
//! sweeps, chained effects, LFO shapes over a full cycle and transport timing.

use tonegrid_core::{
    Effect, EffectExt, InterpolatedDelay, LadderFilter, LadderMode, Lfo, LfoWaveform, Smoother,
    Transport, clamp_cutoff,
};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

fn generate_sine(freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| 0.5 * libm::sinf(TAU * freq_hz * n as f32 / SAMPLE_RATE))
        .collect()
}

fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

/// Gain in dB of a settled sine through `filter`.
fn measure_response(filter: &mut LadderFilter, freq_hz: f32) -> f32 {
    let num_samples = 9600;
    let settle = 4800;
    let input = generate_sine(freq_hz, num_samples);
    filter.reset();
    let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
    to_db(rms(&output[settle..]) / rms(&input[settle..]))
}

// ============================================================================
// 1. Ladder filter
// ============================================================================

#[test]
fn ladder_lowpass_rolls_off_steeply() {
    let mut filter = LadderFilter::new(SAMPLE_RATE);
    filter.set_cutoff(500.0);

    let one_octave = measure_response(&mut filter, 2000.0);
    let three_octaves = measure_response(&mut filter, 8000.0);
    assert!(
        three_octaves < one_octave - 30.0,
        "expected a four-pole slope: 2 kHz {one_octave:.1} dB, 8 kHz {three_octaves:.1} dB"
    );
}

#[test]
fn ladder_resonance_boosts_near_cutoff() {
    let mut flat = LadderFilter::new(SAMPLE_RATE);
    flat.set_cutoff(1000.0);
    let mut peaky = LadderFilter::new(SAMPLE_RATE);
    peaky.set_cutoff(1000.0);
    peaky.set_resonance(0.9);

    let flat_db = measure_response(&mut flat, 1000.0);
    let peaky_db = measure_response(&mut peaky, 1000.0);
    let flat_dc = measure_response(&mut flat, 60.0);
    let peaky_dc = measure_response(&mut peaky, 60.0);

    assert!(
        peaky_db - peaky_dc > flat_db - flat_dc,
        "resonance should lift the cutoff region relative to the passband"
    );
}

#[test]
fn ladder_never_escapes_unit_range() {
    for mode in [LadderMode::LowPass, LadderMode::HighPass, LadderMode::BandPass] {
        let mut filter = LadderFilter::new(SAMPLE_RATE);
        filter.set_mode(mode);
        filter.set_resonance(1.0);
        filter.set_lfo(LfoWaveform::Square, 8.0, 1.0);
        for i in 0..SAMPLE_RATE as usize {
            let x = if i % 97 < 48 { 1.0 } else { -1.0 };
            let y = filter.process(x);
            assert!(y.is_finite() && y.abs() <= 1.0, "{mode:?} produced {y}");
        }
    }
}

#[test]
fn ladder_cutoff_clamp_tracks_sample_rate() {
    assert_eq!(clamp_cutoff(30_000.0, 44100.0), 19_845.0);
    assert_eq!(clamp_cutoff(30_000.0, 96000.0), 30_000.0);
    assert_eq!(clamp_cutoff(10.0, 96000.0), 50.0);
}

// ============================================================================
// 2. Chaining
// ============================================================================

#[test]
fn smoother_into_ladder_chain_matches_manual_wiring() {
    let mut chain = Smoother::new(0.3).chain(LadderFilter::new(SAMPLE_RATE));
    let mut smoother = Smoother::new(0.3);
    let mut ladder = LadderFilter::new(SAMPLE_RATE);

    for x in generate_sine(330.0, 512) {
        let manual = ladder.process(smoother.process(x));
        assert_eq!(chain.process(x), manual);
    }
}

// ============================================================================
// 3. Delay and LFO
// ============================================================================

#[test]
fn delay_reproduces_a_sine_late() {
    let input = generate_sine(100.0, 2000);
    let mut delay = InterpolatedDelay::from_time(SAMPLE_RATE, 0.01);
    let mut out = Vec::with_capacity(input.len());
    for &x in &input {
        delay.write(x);
        out.push(delay.read(240.0));
    }
    for i in 240..input.len() {
        assert!((out[i] - input[i - 240]).abs() < 1e-6, "mismatch at {i}");
    }
}

#[test]
fn lfo_triangle_covers_full_range_each_cycle() {
    let mut lfo = Lfo::new(SAMPLE_RATE, 10.0);
    lfo.set_waveform(LfoWaveform::Triangle);
    let cycle: Vec<f32> = (0..4800).map(|_| lfo.advance()).collect();
    let max = cycle.iter().copied().fold(f32::MIN, f32::max);
    let min = cycle.iter().copied().fold(f32::MAX, f32::min);
    assert!(max > 0.99 && min < -0.99, "range [{min}, {max}]");
}

// ============================================================================
// 4. Transport
// ============================================================================

#[test]
fn transport_counts_sixteenths() {
    let mut transport = Transport::new(SAMPLE_RATE, 120.0);
    transport.play();
    let step_samples = (transport.step_length_secs() * SAMPLE_RATE) as u64;
    assert_eq!(step_samples, 6000);
    for _ in 0..16 {
        transport.advance(step_samples);
    }
    assert!((transport.beat_position() - 4.0).abs() < 1e-4);
}
