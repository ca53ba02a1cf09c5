//! Latency harness: the producer stamps every payload with a monotonic
//! nanosecond timestamp, the consumer measures how long it took to arrive.
//!
//! Usage: `cargo run --release --bin latency [messages] [capacity]`

use seqring::{spsc, Config, ConfigError};
use std::env;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

const DEFAULT_MESSAGES: u64 = 64 * 64;
const DEFAULT_CAPACITY: usize = 1024;

fn parse_arg<T: std::str::FromStr>(index: usize, default: T) -> T {
    env::args()
        .nth(index)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(default)
}

fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[rank]
}

fn run(messages: u64, capacity: usize) -> Result<(), ConfigError> {
    let (mut producer, mut consumer) = spsc::channel(Config::new(capacity)?);
    let epoch = Instant::now();

    let reader = thread::spawn(move || {
        let mut latencies = Vec::with_capacity(messages as usize);
        while (latencies.len() as u64) < messages {
            if let Some(stamp) = consumer.try_pop() {
                let now = epoch.elapsed().as_nanos() as u64;
                latencies.push(now.saturating_sub(stamp));
            }
        }
        latencies
    });

    let start = Instant::now();
    for _ in 0..messages {
        while producer.is_full() {
            std::hint::spin_loop();
        }
        producer.publish(epoch.elapsed().as_nanos() as u64);
    }

    let mut latencies = reader.join().expect("reader thread panicked");
    let elapsed = start.elapsed();
    latencies.sort_unstable();

    let mean = latencies.iter().sum::<u64>() as f64 / latencies.len().max(1) as f64;
    println!("=== seqring SPSC latency ===");
    println!("Messages: {}  Capacity: {}", messages, capacity);
    println!(
        "Throughput: {:.2} M msg/s ({:.3} ms)",
        messages as f64 / elapsed.as_secs_f64() / 1e6,
        elapsed.as_secs_f64() * 1e3
    );
    println!(
        "Latency ns: min {}  mean {:.0}  p50 {}  p99 {}  max {}",
        latencies.first().copied().unwrap_or(0),
        mean,
        percentile(&latencies, 0.50),
        percentile(&latencies, 0.99),
        latencies.last().copied().unwrap_or(0),
    );
    Ok(())
}

fn main() -> ExitCode {
    let messages = parse_arg(1, DEFAULT_MESSAGES);
    let capacity = parse_arg(2, DEFAULT_CAPACITY);

    match run(messages, capacity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            ExitCode::FAILURE
        }
    }
}
