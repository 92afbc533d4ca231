mod common;

use common::{FakeClock, FakeSource, RecordingTransport};
use embassy_futures::block_on;
use fwe_node_core::config::{FRAME_CEILING, IMAGE_TOPIC};
use fwe_node_core::{Encoding, FrameOutcome, FrameThrottle, ImagePublisher, NodeConfig, SkipReason};

struct Harness {
    throttle: FrameThrottle,
    source: FakeSource,
    transport: RecordingTransport,
    publisher: ImagePublisher,
    clock: FakeClock,
}

impl Harness {
    fn new() -> Self {
        Self::with_throttle(FrameThrottle::new(&NodeConfig::default()))
    }

    fn with_throttle(throttle: FrameThrottle) -> Self {
        let clock = FakeClock::new();
        let mut source = FakeSource::new();
        source.clock = clock.clone();
        Self {
            throttle,
            source,
            transport: RecordingTransport::new(),
            publisher: ImagePublisher::new(IMAGE_TOPIC).unwrap(),
            clock,
        }
    }

    /// One tick, one second of uptime each.
    fn tick(&mut self) -> FrameOutcome {
        self.clock.advance(1000);
        block_on(self.throttle.maybe_publish_frame(
            &mut self.source,
            &mut self.transport,
            &self.publisher,
            &self.clock,
        ))
    }

    /// Runs the non-publishing ticks up to and including the next publish tick.
    fn publish_tick(&mut self) -> FrameOutcome {
        loop {
            match self.tick() {
                FrameOutcome::NotDue => continue,
                outcome => return outcome,
            }
        }
    }
}

#[test]
fn publishes_on_every_fifth_tick_only() {
    let mut h = Harness::new();
    for _ in 0..4 {
        h.source.push_jpeg(1000);
    }

    let outcomes: Vec<_> = (0..10).map(|_| h.tick()).collect();

    for (i, outcome) in outcomes.iter().enumerate() {
        let tick = i + 1;
        if tick % 5 == 0 {
            assert_eq!(*outcome, FrameOutcome::Published { len: 1000 }, "tick {}", tick);
        } else {
            assert_eq!(*outcome, FrameOutcome::NotDue, "tick {}", tick);
        }
    }
    assert_eq!(h.throttle.counter(), 10);
    assert_eq!(h.source.acquires, 2);
    assert_eq!(h.source.releases, 2);
    assert_eq!(h.transport.sent.len(), 2);
}

#[test]
fn oversized_frame_is_released_unread() {
    let mut h = Harness::new();
    h.source.push_jpeg(200_000);

    assert_eq!(
        h.publish_tick(),
        FrameOutcome::Skipped(SkipReason::Oversized { len: 200_000 })
    );
    assert_eq!(h.source.reads, 0);
    assert_eq!(h.source.releases, 1);
    assert!(!h.source.is_holding());
    assert!(h.transport.sent.is_empty());
    assert_eq!(h.throttle.buffer().capacity(), 0);
}

#[test]
fn frame_at_the_ceiling_is_forwarded() {
    let mut h = Harness::new();
    h.source.push_jpeg(FRAME_CEILING);

    assert_eq!(h.publish_tick(), FrameOutcome::Published { len: FRAME_CEILING });
    assert_eq!(h.transport.sent[0].tail.len(), FRAME_CEILING);
}

#[test]
fn smaller_frame_reuses_the_larger_buffer() {
    let mut h = Harness::new();
    h.source.push_jpeg(50_000).push_jpeg(30_000);

    assert_eq!(h.publish_tick(), FrameOutcome::Published { len: 50_000 });
    assert_eq!(h.throttle.buffer().capacity(), 50_000);

    assert_eq!(h.publish_tick(), FrameOutcome::Published { len: 30_000 });
    assert_eq!(h.throttle.buffer().capacity(), 50_000);
    assert_eq!(h.throttle.buffer().size(), 30_000);
    assert_eq!(h.transport.sent[1].tail.len(), 30_000);
}

#[test]
fn capacity_tracks_largest_forwarded_frame() {
    let mut h = Harness::new();
    let sizes = [100, 5_000, 300, FRAME_CEILING, FRAME_CEILING + 1, 7, 64_000];
    for &len in &sizes {
        h.source.push_jpeg(len);
    }

    let mut largest = 0;
    for &len in &sizes {
        h.publish_tick();
        if len <= FRAME_CEILING {
            largest = largest.max(len);
        }
        assert_eq!(h.throttle.buffer().capacity(), largest);
    }
}

#[test]
fn non_jpeg_frames_are_never_forwarded() {
    let mut h = Harness::new();
    h.source.push(1000, Encoding::Rgb565).push(1000, Encoding::Yuv422);

    assert_eq!(h.publish_tick(), FrameOutcome::Skipped(SkipReason::WrongEncoding));
    assert_eq!(h.publish_tick(), FrameOutcome::Skipped(SkipReason::WrongEncoding));
    assert_eq!(h.source.reads, 0);
    assert_eq!(h.source.releases, 2);
    assert!(h.transport.sent.is_empty());
}

#[test]
fn capture_failure_waits_for_next_publish_tick() {
    let mut h = Harness::new();

    assert_eq!(h.publish_tick(), FrameOutcome::Skipped(SkipReason::CaptureFailed));
    assert_eq!(h.source.acquires, 1);
    // nothing was acquired, so nothing is released
    assert_eq!(h.source.releases, 0);

    // no retry on the following ticks
    for _ in 0..4 {
        assert_eq!(h.tick(), FrameOutcome::NotDue);
    }
    assert_eq!(h.source.acquires, 1);
}

#[test]
fn publish_failure_still_releases_the_frame() {
    let mut h = Harness::new();
    h.transport.fail_publish = true;
    h.source.push_jpeg(2048).push_jpeg(1024);

    assert_eq!(h.publish_tick(), FrameOutcome::Skipped(SkipReason::PublishFailed));
    assert_eq!(h.source.releases, 1);
    assert!(!h.source.is_holding());

    h.transport.fail_publish = false;
    assert_eq!(h.publish_tick(), FrameOutcome::Published { len: 1024 });
}

#[test]
fn copy_failure_leaves_no_frame_in_the_buffer() {
    let mut h = Harness::new();
    h.source.fail_reads = true;
    h.source.push_jpeg(4096);

    assert_eq!(h.publish_tick(), FrameOutcome::Skipped(SkipReason::CopyFailed));
    assert_eq!(h.throttle.buffer().size(), 0);
    assert_eq!(h.source.releases, 1);
    assert!(h.transport.sent.is_empty());
}

#[test]
fn published_image_carries_frame_bytes_and_metadata() {
    let mut h = Harness::new();
    h.source.push_jpeg(10);

    h.publish_tick();

    let sent = &h.transport.sent[0];
    assert_eq!(sent.topic, "ego_vehicle/rgb_front/image_compressed");
    assert_eq!(sent.type_name, "sensor_msgs/msg/CompressedImage");
    assert_eq!(sent.tail, (0..10u8).collect::<Vec<_>>());
    // stamp of tick 5
    assert_eq!(sent.head_u32(4), 5);
    assert_eq!(sent.head_u32(8), 0);
    // frame_id and format strings
    assert_eq!(&sent.head[16..23], b"camera\0");
    assert_eq!(&sent.head[28..33], b"jpeg\0");
    // sequence length right before the tail
    assert_eq!(sent.head_u32(sent.head.len() - 4), 10);
}

#[test]
fn stamp_is_taken_after_capture_and_copy() {
    let mut h = Harness::new();
    h.source.capture_ms = 2_750;
    h.source.copy_ms = 400;
    h.source.push_jpeg(10);

    assert_eq!(h.publish_tick(), FrameOutcome::Published { len: 10 });

    // tick 5 starts at 5.000 s, the copy finishes at 8.150 s
    let sent = &h.transport.sent[0];
    assert_eq!(sent.head_u32(4), 8);
    assert_eq!(sent.head_u32(8), 150_000_000);
}

#[test]
fn counter_wraps_and_zero_is_a_publish_tick() {
    let config = NodeConfig::default();
    let mut h = Harness::with_throttle(FrameThrottle::new(&config).starting_at(u32::MAX - 1));
    for _ in 0..3 {
        h.source.push_jpeg(16);
    }

    // u32::MAX is a multiple of 5, and so is the 0 that follows it
    assert_eq!(h.tick(), FrameOutcome::Published { len: 16 });
    assert_eq!(h.throttle.counter(), u32::MAX);
    assert_eq!(h.tick(), FrameOutcome::Published { len: 16 });
    assert_eq!(h.throttle.counter(), 0);

    for _ in 1..5 {
        assert_eq!(h.tick(), FrameOutcome::NotDue);
    }
    assert_eq!(h.tick(), FrameOutcome::Published { len: 16 });
    assert_eq!(h.throttle.counter(), 5);
    assert_eq!(h.source.releases, 3);
}
