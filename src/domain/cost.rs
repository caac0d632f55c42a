/// Credits charged for metadata extraction alone, and the floor for any
/// transcription estimate.
pub const BASE_COST: u32 = 10;

/// Compute-credit estimate for transcribing `duration_seconds` of audio:
/// 10 credits per started minute, minimum 10. Deterministic and
/// non-decreasing in duration.
pub fn estimate_cost(duration_seconds: f64) -> u32 {
    let seconds = duration_seconds.max(0.0);
    let minutes = (seconds / 60.0).ceil() as u32;
    (minutes * 10).max(BASE_COST)
}

/// The portion of the total estimate settled by the transcription stage
/// itself. The base share is reconciled once by the status aggregator, so
/// the two charges together never exceed the amount authorized at the last
/// admission check.
pub fn realized_cost(duration_seconds: f64) -> u32 {
    estimate_cost(duration_seconds).saturating_sub(BASE_COST)
}
