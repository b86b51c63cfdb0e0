//! Process-wide constants.
//!
//! Both sides of the loop are configured at compile time. The `Default`
//! implementations of the backoff policies and the demo binaries read from
//! here.

use std::time::Duration;

/// Sustained admissions per second of the server's token bucket.
pub const RATE_LIMIT: f64 = 25.0;

/// Largest instantaneous burst the server's token bucket admits.
pub const BURST: u32 = 50;

/// Wait handed out by the [`Fixed`](crate::backoff::Fixed) policy.
pub const FIXED_WAIT: Duration = Duration::from_secs(5);

/// Lower clamp of the load-adaptive base delay.
pub const JITTER_MIN: Duration = Duration::from_secs(5);

/// Upper clamp of the load-adaptive base delay.
pub const JITTER_MAX: Duration = Duration::from_secs(30);

/// Seconds of base delay per request currently being turned away.
pub const JITTER_SCALE: f64 = 0.1;

/// Fraction of the base delay that may be added or removed at random.
pub const JITTER_RATIO: f64 = 0.7;

/// First delay of the echoed exponential policy.
pub const INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Ceiling of the echoed exponential policy.
pub const MAX_DELAY: Duration = Duration::from_secs(256);

/// Number of doublings the echoed exponential policy will honor.
pub const MAX_RETRY_ATTEMPTS: u32 = 7;

/// Connection attempts per issued request before giving up.
pub const MAX_CONNECT_ATTEMPTS: u32 = 5;

/// Read and write ceiling applied to the HTTP transports.
pub const IO_TIMEOUT: Duration = Duration::from_secs(200);

/// Where the server listens and the client connects.
pub const SERVER_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8080);

/// Load scenarios run back to back by the client: `(id, requests per
/// second, duration)`.
pub const SCENARIOS: [(u32, u32, Duration); 3] = [
    (1, 20, Duration::from_secs(30)),
    (2, 2000, Duration::from_secs(2)),
    (3, 20, Duration::from_secs(600)),
];
