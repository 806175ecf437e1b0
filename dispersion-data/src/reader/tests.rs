//! Tests for the instance text parser.

use super::*;
use rstest::rstest;

const THREE_SITES: &str = "3 2\n0 1 5\n0 2 10\n1 2 7\n0 1 3\n";

fn parse(text: &str) -> Result<InstanceData, ParseError> {
    parse_instance(text, ReadOptions::default())
}

#[rstest]
fn parses_three_site_instance() {
    let instance = parse(THREE_SITES).expect("valid instance");
    assert_eq!(instance.points(), 3);
    assert_eq!(instance.facilities(), 2);
    assert_eq!(instance.distances(), &[0, 5, 10, 5, 0, 7, 10, 7, 0]);
    assert_eq!(instance.separation_thresholds(), &[0, 3, 3, 0]);
}

#[rstest]
fn skips_blank_lines_and_counts_them_in_line_numbers() {
    let text = "\n3 2\n\n0 1 5\n0 2 x\n";
    let err = parse(text).expect_err("invalid number");
    assert!(matches!(err, ParseError::InvalidNumber { line: 5, .. }), "{err:?}");
}

#[rstest]
fn threshold_lines_are_placed_by_their_indices() {
    let text = "2 3\n0 1 9\n1 2 4\n0 2 6\n0 1 2\n";
    let instance = parse(text).expect("valid instance");
    assert_eq!(instance.threshold(0, 1), Some(2));
    assert_eq!(instance.threshold(2, 0), Some(6));
    assert_eq!(instance.threshold(2, 1), Some(4));
}

#[rstest]
fn repeated_threshold_pairs_leave_missing_pairs_at_zero() {
    let text = "2 3\n0 1 9\n0 1 4\n0 1 5\n1 2 6\n";
    let instance = parse(text).expect("valid instance");
    assert_eq!(instance.threshold(0, 1), Some(5));
    assert_eq!(instance.threshold(0, 2), Some(0));
}

#[rstest]
#[case(0, vec![0, 12, 12, 0])]
#[case(2, vec![0, 1234, 1234, 0])]
fn decimal_points_scale_then_truncate(#[case] decimal_points: u32, #[case] expected: Vec<i64>) {
    let text = "2 2\n0 1 12.349\n0 1 -0.75\n";
    let instance =
        parse_instance(text, ReadOptions { decimal_points }).expect("valid instance");
    assert_eq!(instance.distances(), expected.as_slice());
    let threshold = instance.threshold(0, 1).expect("threshold");
    assert_eq!(threshold, if decimal_points == 0 { 0 } else { -75 });
}

#[rstest]
fn single_site_needs_no_distance_lines() {
    let instance = parse("1 2\n0 1 -1\n").expect("valid instance");
    assert_eq!(instance.distances(), &[0]);
}

#[rstest]
#[case("", ParseError::UnexpectedEnd { expected: "header" })]
#[case("3 2\n0 1 5\n", ParseError::UnexpectedEnd { expected: "distance line" })]
#[case("3 2\n0 1 5\n0 2 10\n1 2 7\n", ParseError::UnexpectedEnd { expected: "threshold line" })]
#[case("3\n", ParseError::MissingField { line: 1, field: "facility count" })]
#[case("3 2\n0 1\n", ParseError::MissingField { line: 2, field: "value" })]
#[case("3 2\n0 1 5\n0 2 10\n1 2 7\n0 2 3\n", ParseError::SlotOutOfRange { line: 5, slot: 2, facilities: 2 })]
#[case("3 2\n0 1 5\n0 2 10\n1 2 7\n1 1 3\n", ParseError::SelfPair { line: 5, slot: 1 })]
#[case("3 2\n0 1 inf\n", ParseError::ValueOutOfRange { line: 2, value: "inf".to_owned() })]
#[case("3 2\n0 1 1e300\n", ParseError::ValueOutOfRange { line: 2, value: "1e300".to_owned() })]
fn rejects_malformed_input(#[case] text: &str, #[case] expected: ParseError) {
    assert_eq!(parse(text).expect_err("malformed"), expected);
}

#[rstest]
#[case("x 2\n", "site count")]
#[case("3 -2\n", "facility count")]
#[case("3 2\na 1 5\n", "first site")]
fn rejects_non_integer_counts(#[case] text: &str, #[case] expected_field: &str) {
    match parse(text).expect_err("invalid integer") {
        ParseError::InvalidInteger { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected InvalidInteger, got {other:?}"),
    }
}

#[rstest]
#[case("3 1\n0 1 5\n0 2 10\n1 2 7\n", InstanceError::TooFewFacilities { facilities: 1 })]
#[case("0 2\n0 1 3\n", InstanceError::NoPoints)]
fn surfaces_instance_validation(#[case] text: &str, #[case] expected: InstanceError) {
    assert_eq!(parse(text).expect_err("invalid"), ParseError::Invalid(expected));
}

#[rstest]
fn ignores_trailing_lines() {
    let text = format!("{THREE_SITES}0 1 99\nextra words\n");
    let instance = parse(&text).expect("valid instance");
    assert_eq!(instance.threshold(0, 1), Some(3));
}
