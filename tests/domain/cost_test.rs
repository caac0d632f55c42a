use semporna::domain::{estimate_cost, realized_cost, BASE_COST};

#[test]
fn given_two_minute_five_second_audio_when_estimating_then_charges_three_minutes() {
    assert_eq!(estimate_cost(125.0), 30);
}

#[test]
fn given_sub_minute_audio_when_estimating_then_charges_minimum() {
    assert_eq!(estimate_cost(59.0), 10);
}

#[test]
fn given_zero_or_negative_duration_when_estimating_then_charges_minimum() {
    assert_eq!(estimate_cost(0.0), 10);
    assert_eq!(estimate_cost(-5.0), 10);
}

#[test]
fn given_exact_minute_boundaries_when_estimating_then_does_not_round_up() {
    assert_eq!(estimate_cost(60.0), 10);
    assert_eq!(estimate_cost(120.0), 20);
    assert_eq!(estimate_cost(60.1), 20);
}

#[test]
fn given_increasing_durations_when_estimating_then_cost_never_decreases() {
    let mut previous = 0;
    for tenths in 0..36_000 {
        let cost = estimate_cost(tenths as f64 / 10.0);
        assert!(
            cost >= previous,
            "cost decreased at {}s: {} < {}",
            tenths as f64 / 10.0,
            cost,
            previous
        );
        previous = cost;
    }
}

#[test]
fn given_any_duration_when_splitting_cost_then_base_plus_realized_equals_estimate() {
    for seconds in [0.0, 59.0, 60.0, 125.0, 3600.0] {
        assert_eq!(BASE_COST + realized_cost(seconds), estimate_cost(seconds));
    }
}
