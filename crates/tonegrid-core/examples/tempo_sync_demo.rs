//! Tempo sync demo: the transport, note divisions and a tempo-synced LFO.
//!
//! Run with: cargo run -p tonegrid-core --example tempo_sync_demo

use tonegrid_core::{Lfo, LfoWaveform, NoteDivision, Transport};

fn main() {
    let sample_rate = 48000.0;

    println!("=== Transport at 120 BPM ===\n");
    let mut transport = Transport::new(sample_rate, 120.0);
    println!("BPM: {}", transport.bpm());
    println!("Step (sixteenth): {:.4}s", transport.step_length_secs());

    println!("\n--- Note divisions at 120 BPM ---\n");
    println!("{:<18} {:>6} {:>10} {:>10}", "Division", "Beats", "ms", "Samples");
    println!("{:-<18} {:->6} {:->10} {:->10}", "", "", "", "");

    let divisions = [
        ("Half", NoteDivision::Half),
        ("Quarter", NoteDivision::Quarter),
        ("Eighth", NoteDivision::Eighth),
        ("Sixteenth", NoteDivision::Sixteenth),
        ("Thirty-second", NoteDivision::ThirtySecond),
        ("Dotted eighth", NoteDivision::DottedEighth),
        ("Triplet eighth", NoteDivision::TripletEighth),
        ("Triplet sixteenth", NoteDivision::TripletSixteenth),
    ];
    for (name, division) in divisions {
        println!(
            "{:<18} {:>6.3} {:>10.2} {:>10.1}",
            name,
            division.beats(),
            division.to_secs(120.0) * 1000.0,
            division.to_samples(120.0, sample_rate)
        );
    }

    println!("\n--- Running the transport ---\n");
    transport.play();
    let block = 4800;
    for _ in 0..6 {
        transport.advance(block);
        println!(
            "tick {:>6}  {:.2}s  beat {:.2}",
            transport.tick(),
            transport.seconds(),
            transport.beat_position()
        );
    }

    println!("\n--- LFO synced to dotted eighths at 140 BPM ---\n");
    let rate = NoteDivision::DottedEighth.to_hz(140.0);
    let mut lfo = Lfo::new(sample_rate, rate);
    lfo.set_waveform(LfoWaveform::Triangle);
    println!("rate: {rate:.3} Hz");
    let period = (sample_rate / rate) as usize;
    for i in 0..8 {
        let mut value = 0.0;
        for _ in 0..period / 8 {
            value = lfo.advance();
        }
        println!("  {}/8 period: {:+.3}", i + 1, value);
    }
}
