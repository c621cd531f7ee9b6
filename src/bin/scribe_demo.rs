//! Scribe Demo Binary
//!
//! Spawns one consumer thread and a handful of producer threads, logs a
//! burst of records through the pipeline, then shuts down cleanly and
//! prints the run statistics.
//!
//! Usage:
//!   cargo run --release --bin scribe_demo

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use scribe::{LogLevel, LogPipeline, PipelineConfig};

const PRODUCERS: usize = 4;
const RECORDS_PER_PRODUCER: usize = 10_000;

fn main() {
    let config = PipelineConfig {
        write_period: Duration::from_millis(5),
        buffer_capacity: 16384,
        level: LogLevel::Debug,
        file_name: Some("scribe_demo.log".into()),
        rotation_size: 1024 * 1024, // 1MB segments
        copy_to_stdout: false,
    };

    let (pipeline, errors) = LogPipeline::initialise(config);
    let pipeline = Arc::new(pipeline);

    println!("Scribe demo: {} producers x {} records", PRODUCERS, RECORDS_PER_PRODUCER);

    let consumer = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || pipeline.run())
    };

    let start = Instant::now();
    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let pipeline = Arc::clone(&pipeline);
        producers.push(thread::spawn(move || {
            let sender = format!("producer-{}", p);
            for i in 0..RECORDS_PER_PRODUCER {
                pipeline.log(LogLevel::Info, &sender, &format!("record {}", i));
            }
        }));
    }

    for h in producers {
        h.join().expect("producer thread panicked");
    }
    let produce_elapsed = start.elapsed();

    pipeline.shutdown();
    consumer.join().expect("consumer thread panicked");
    let total_elapsed = start.elapsed();

    let produced = (PRODUCERS * RECORDS_PER_PRODUCER) as u64;
    let dropped = pipeline.dropped_count();
    println!("  Produced:   {}", produced);
    println!("  Dropped:    {}", dropped);
    println!("  Persisted:  {}", produced - dropped);
    println!(
        "  Produce:    {:.2} ms ({:.0} ns/record)",
        produce_elapsed.as_secs_f64() * 1000.0,
        produce_elapsed.as_nanos() as f64 / produced as f64
    );
    println!(
        "  Total:      {:.2} ms (including drain + close)",
        total_elapsed.as_secs_f64() * 1000.0
    );

    for e in errors.try_iter() {
        eprintln!("  backend error: {}", e);
    }
}
