//! seqring - Lock-Free Seqlock Ring Buffers
//!
//! A fixed-capacity ring that moves 64-bit values from one producer thread to
//! one or more consumer threads without locks. Every slot carries a version
//! word (a sequence lock) so that readers detect torn reads and stale
//! generations instead of blocking the writer.
//!
//! Two topologies share one slot protocol:
//!
//! - [`spmc`]: broadcast. Every consumer sees every value, at its own pace.
//! - [`spsc`]: exactly one consumer, whose progress is visible to the producer.
//!
//! # Key Properties
//!
//! - `publish` never blocks and never fails
//! - `try_pop` is wait-free: three loads and a fence, no spinning
//! - A consumer lapped by the producer observes [`Poll::Overrun`], never a
//!   corrupted value
//! - Write cursor on its own cache line, away from the slots
//!
//! The producer is trusted not to overrun its slowest consumer. The ring does
//! not apply backpressure; size it for the worst consumer stall you expect.
//!
//! # Example
//!
//! ```
//! use seqring::{spmc, Config};
//! use std::thread;
//!
//! let (mut producer, consumer) = spmc::channel(Config::new(1024)?);
//!
//! let readers: Vec<_> = (0..2)
//!     .map(|_| {
//!         let mut consumer = consumer.clone();
//!         thread::spawn(move || {
//!             let mut sum = 0;
//!             let mut seen = 0;
//!             while seen < 100 {
//!                 match consumer.try_pop() {
//!                     Some(value) => {
//!                         sum += value;
//!                         seen += 1;
//!                     }
//!                     None => thread::yield_now(),
//!                 }
//!             }
//!             sum
//!         })
//!     })
//!     .collect();
//!
//! for value in 0..100 {
//!     producer.publish(value);
//! }
//!
//! for reader in readers {
//!     assert_eq!(reader.join().unwrap(), 4950);
//! }
//! # Ok::<(), seqring::ConfigError>(())
//! ```

mod config;
mod cursor;
mod diagnostics;
mod error;
mod invariants;
mod ring;
mod sync;

pub mod spmc;
pub mod spsc;

pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG, MAX_CAPACITY_BITS};
pub use cursor::Cursor;
#[cfg(feature = "tracing")]
pub use diagnostics::TracingDiagnostics;
pub use diagnostics::{ConsumerId, Counters, CountersSnapshot, Diagnostics, Event};
pub use error::ConfigError;
pub use ring::Poll;
