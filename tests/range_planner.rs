use geoshare::error::PlanError;
use geoshare::{generate_monthly_ranges, MonthId, MonthRange};

fn month(s: &str) -> MonthId {
    s.parse().expect("valid month")
}

fn pairs(ranges: &[MonthRange]) -> Vec<(String, String)> {
    ranges
        .iter()
        .map(|r| (r.start.to_string(), r.end.to_string()))
        .collect()
}

#[test]
fn single_month_yields_one_range() {
    let ranges = generate_monthly_ranges("2024-01", "2024-01").unwrap();
    assert_eq!(pairs(&ranges), vec![("2024-01".to_string(), "2024-01".to_string())]);
}

#[test]
fn three_months_in_order() {
    let ranges = generate_monthly_ranges("2024-01", "2024-03").unwrap();
    assert_eq!(
        pairs(&ranges),
        vec![
            ("2024-01".to_string(), "2024-01".to_string()),
            ("2024-02".to_string(), "2024-02".to_string()),
            ("2024-03".to_string(), "2024-03".to_string()),
        ]
    );
}

#[test]
fn inverted_range_is_an_order_error() {
    let err = generate_monthly_ranges("2024-05", "2024-01").unwrap_err();
    assert_eq!(
        err,
        PlanError::Order {
            start: "2024-05".into(),
            end: "2024-01".into()
        }
    );
}

#[test]
fn malformed_input_is_a_format_error() {
    assert_eq!(
        generate_monthly_ranges("bad-input", "2024-01").unwrap_err(),
        PlanError::Format("bad-input".into())
    );
    assert!(matches!(
        generate_monthly_ranges("2024-01", "2024/02"),
        Err(PlanError::Format(_))
    ));
}

#[test]
fn spans_cross_year_boundaries() {
    let ranges = generate_monthly_ranges("2022-11", "2024-02").unwrap();
    assert_eq!(ranges.len(), 16);
    assert_eq!(ranges.first().unwrap().start, month("2022-11"));
    assert_eq!(ranges.last().unwrap().end, month("2024-02"));
}

#[test]
fn every_range_is_a_single_ascending_month() {
    for (start, end) in [("2019-01", "2019-01"), ("2020-02", "2021-07"), ("1999-12", "2001-01")] {
        let ranges = generate_monthly_ranges(start, end).unwrap();
        let expected = geoshare::months::month_count(month(start), month(end));
        assert_eq!(ranges.len(), expected, "{start}..{end}");

        for r in &ranges {
            assert_eq!(r.start, r.end);
        }
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].start.succ(), Some(pair[1].start));
        }
    }
}
