//! Centralized queue size configuration for the transformation core's two
//! MPSC channels: consistent sizing, easy tuning, and the rationale
//! documented next to each constant instead of scattered at call sites.

/// Inbound datahub queue: tagged `nmea`/`sbs1`/`ogn` items from the external
/// feeds, pulled by the dispatcher. Sized generously since SBS-1 alone can
/// burst well above 100 msg/s during a busy sweep of nearby traffic.
pub const INPUT_QUEUE_SIZE: usize = 4_096;

/// Outbound datahub queue: `flarm` sentences pushed by the generator. One
/// sweep emits at most two sentences per aircraft in range, so this
/// comfortably covers a full sweep even with dozens of aircraft in view.
pub const OUTPUT_QUEUE_SIZE: usize = 1_024;

/// Returns 80% of `size` as the depth at which backpressure warnings should
/// fire.
pub const fn queue_warning_threshold(size: usize) -> usize {
    (size * 80) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_warning_threshold() {
        assert_eq!(queue_warning_threshold(100), 80);
        assert_eq!(queue_warning_threshold(4_096), 3_276);
    }
}
