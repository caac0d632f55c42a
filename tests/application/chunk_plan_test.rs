use std::time::Duration;

use semporna::application::services::{plan_chunks, ChunkPlan};

#[test]
fn given_short_audio_when_planning_then_single_call_with_minimum_timeout() {
    match plan_chunks(120.0) {
        ChunkPlan::Whole { timeout } => {
            // 120 * 2 = 240s is under the 300s floor.
            assert_eq!(timeout, Duration::from_secs(300));
        }
        other => panic!("expected whole-file plan, got {:?}", other),
    }
}

#[test]
fn given_threshold_duration_when_planning_then_still_single_call() {
    match plan_chunks(300.0) {
        ChunkPlan::Whole { timeout } => {
            assert_eq!(timeout, Duration::from_secs(600));
        }
        other => panic!("expected whole-file plan, got {:?}", other),
    }
}

#[test]
fn given_long_audio_when_planning_then_chunk_duration_clamps_to_floor() {
    // 400 / 40 = 10s target, clamped up to 100s.
    match plan_chunks(400.0) {
        ChunkPlan::Chunked {
            chunk_seconds,
            spans,
        } => {
            assert_eq!(chunk_seconds, 100.0);
            assert_eq!(spans.len(), 4);
        }
        other => panic!("expected chunked plan, got {:?}", other),
    }
}

#[test]
fn given_very_long_audio_when_planning_then_chunk_duration_clamps_to_ceiling() {
    // 36000 / 40 = 900s target, clamped down to 180s.
    match plan_chunks(36_000.0) {
        ChunkPlan::Chunked {
            chunk_seconds,
            spans,
        } => {
            assert_eq!(chunk_seconds, 180.0);
            assert_eq!(spans.len(), 200);
        }
        other => panic!("expected chunked plan, got {:?}", other),
    }
}

#[test]
fn given_chunked_plan_when_inspecting_spans_then_they_tile_the_duration() {
    let duration = 1234.5;
    let ChunkPlan::Chunked { spans, .. } = plan_chunks(duration) else {
        panic!("expected chunked plan");
    };

    assert_eq!(spans[0].start, 0.0);
    for pair in spans.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
        assert!(pair[0].index + 1 == pair[1].index);
    }
    assert_eq!(spans.last().unwrap().end, duration);
}

#[test]
fn given_uneven_duration_when_planning_then_last_span_is_the_remainder() {
    // 450 / 40 = 11.25 → clamped to 100s → spans of 100, 100, 100, 100, 50.
    let ChunkPlan::Chunked { spans, .. } = plan_chunks(450.0) else {
        panic!("expected chunked plan");
    };
    assert_eq!(spans.len(), 5);
    let last = spans.last().unwrap();
    assert_eq!(last.end - last.start, 50.0);
}
