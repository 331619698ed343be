//! Synthesis demo: oscillator laws, an ADSR cycle and a small voice pool.
//!
//! Run with: cargo run -p tonegrid-synth --example synthesis_demo

use tonegrid_synth::{
    AdsrEnvelope, Envelope, Oscillator, OscillatorType, Timbre, VoicePool, midi_to_freq,
};

fn main() {
    let sample_rate = 48000.0;

    println!("=== Oscillators at theta = 0, pi/2, pi, 3pi/2 ===\n");
    let quarter = std::f32::consts::FRAC_PI_2;
    for ty in OscillatorType::ALL {
        if ty == OscillatorType::Noise {
            continue;
        }
        let mut osc = Oscillator::new(ty.build(), sample_rate);
        let values: Vec<String> = (0..4)
            .map(|i| format!("{:+.3}", osc.sample_at(quarter * i as f32)))
            .collect();
        println!("{:<10} {}", ty.name(), values.join("  "));
    }

    println!("\n=== ADSR (A 10ms, D 100ms, S 0.6, R 200ms) ===\n");
    let mut env = AdsrEnvelope::new(0.01, 0.1, 0.6, 0.2);
    let dt = 1.0 / sample_rate;
    env.note_on();
    let mut elapsed = 0;
    for ms in [0, 5, 10, 50, 110, 300] {
        let target = (ms as f32 / 1000.0 * sample_rate) as usize;
        while elapsed < target {
            env.advance(dt);
            elapsed += 1;
        }
        println!("  +{ms:>3} ms  {:.3}  {:?}", env.level(), env.stage());
    }
    env.note_off();
    let mut samples = 0;
    while !env.is_silent() {
        env.advance(dt);
        samples += 1;
    }
    println!("  released to silence in {:.1} ms", samples as f32 / sample_rate * 1000.0);

    println!("\n=== Voice pool: C minor triad ===\n");
    let timbre = Timbre {
        osc_a: OscillatorType::Saw.build(),
        osc_b: OscillatorType::Sub.build(),
        osc_mix: 0.3,
        drive: 2.0,
        ..Timbre::default()
    };
    let mut pool = VoicePool::with_capacity(sample_rate, 8);
    for note in [48, 51, 55] {
        pool.add_voice(midi_to_freq(note), &timbre);
    }

    let mut buffer = vec![0.0f32; 4800 * 2];
    pool.render(&mut buffer, 2);
    let peak = buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    println!("  {} voices, 100 ms peak {:.3}", pool.len(), peak);

    pool.stop_all();
    let mut buffers = 0;
    while !pool.is_empty() {
        pool.render(&mut buffer, 2);
        buffers += 1;
    }
    println!("  pool empty after {} more buffers", buffers);
}
