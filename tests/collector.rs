mod common;

use std::time::Duration;

use common::{records, status, RecordingSleeper, ScriptedSource};
use geoshare::error::FetchError;
use geoshare::retry::RetryPolicy;
use geoshare::{Collector, MonthId, MonthRange, RunRequest, TrafficType, UnitOutcome};

fn range(s: &str) -> MonthRange {
    MonthRange::single(s.parse::<MonthId>().unwrap())
}

fn request(credential: &str, traffic_type: TrafficType, limit: u32, domains: &[&str]) -> RunRequest {
    RunRequest {
        credential: credential.into(),
        traffic_type,
        start_month: "2024-01".into(),
        end_month: "2024-01".into(),
        domains: domains.iter().map(|d| d.to_string()).collect(),
        limit,
    }
}

#[test]
fn rate_limit_then_success_retries_once_with_backoff() {
    let source = ScriptedSource::new().script("a.com", vec![status(429), records(&[("Germany", 0.3, 120.0)])]);
    let sleeper = RecordingSleeper::default();
    let collector = Collector::with_sleeper(&source, &sleeper);

    let table = collector
        .fetch(&request("key", TrafficType::AllTraffic, 50, &["a.com"]), range("2024-01"))
        .unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].country_name.as_deref(), Some("Germany"));
    assert_eq!(source.call_count(), 2);
    assert_eq!(*sleeper.sleeps.lock().unwrap(), vec![Duration::from_secs(5)]);
}

#[test]
fn second_rate_limit_is_a_request_failure() {
    let source = ScriptedSource::new().script("a.com", vec![status(429), status(429), records(&[("Spain", 1.0, 1.0)])]);
    let sleeper = RecordingSleeper::default();
    let collector = Collector::with_sleeper(&source, &sleeper);

    let report = collector.fetch_unit(&request("key", TrafficType::Desktop, 50, &["a.com"]), "a.com", range("2024-01"));

    assert_eq!(report.outcome, UnitOutcome::Failed(FetchError::RequestFailed { status: 429 }));
    assert_eq!(report.attempts, 2);
    assert_eq!(source.call_count(), 2);
    assert_eq!(sleeper.sleeps.lock().unwrap().len(), 1);
}

#[test]
fn failing_domain_does_not_abort_the_month() {
    let build = || {
        ScriptedSource::new()
            .script("a.com", vec![status(404)])
            .script("b.com", vec![records(&[("Japan", 0.6, 600.0), ("Brazil", 0.4, 400.0)])])
    };
    let req = request("key", TrafficType::Mobile, 50, &["a.com", "b.com"]);
    let sleeper = RecordingSleeper::default();

    let source = build();
    let reports: Vec<_> = Collector::with_sleeper(&source, &sleeper).batches(&req, range("2024-02")).collect();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].outcome, UnitOutcome::Failed(FetchError::RequestFailed { status: 404 }));
    assert_eq!(
        reports[0].message().unwrap(),
        "Error fetching data for a.com (mobile) for 2024-02: HTTP 404"
    );
    assert!(reports[1].rows().iter().all(|r| r.domain == "b.com"));

    let source = build();
    let table = Collector::with_sleeper(&source, &sleeper).fetch(&req, range("2024-02")).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.rows().iter().all(|r| r.domain == "b.com"));
    assert!(sleeper.sleeps.lock().unwrap().is_empty());
}

#[test]
fn empty_records_contribute_nothing_and_warn() {
    let source = ScriptedSource::new().script("quiet.org", vec![common::empty()]);
    let collector = Collector::with_sleeper(&source, RecordingSleeper::default());

    let report = collector.fetch_unit(&request("key", TrafficType::Desktop, 50, &["quiet.org"]), "quiet.org", range("2023-12"));
    assert_eq!(report.outcome, UnitOutcome::Empty);

    let message = report.message().unwrap();
    assert!(message.contains("quiet.org"));
    assert!(message.contains("desktop"));
    assert!(message.contains("2023-12"));
}

#[test]
fn query_parameters_come_from_the_request() {
    let source = ScriptedSource::new().script("a.com", vec![records(&[("Italy", 0.12, 9876.0)])]);
    let collector = Collector::with_sleeper(&source, RecordingSleeper::default());
    let req = request("request-key", TrafficType::Mobile, 100, &["a.com"]);

    let report = collector.fetch_unit(&req, "a.com", range("2024-03"));

    let query = &source.calls.lock().unwrap()[0];
    assert_eq!(query.credential, "request-key");
    assert_eq!(query.traffic_type, TrafficType::Mobile);
    assert_eq!(query.limit, 100);
    assert_eq!(report.traffic_type, TrafficType::Mobile);

    let row = &report.rows()[0];
    assert_eq!(row.domain, "a.com");
    assert_eq!(row.start_date.to_string(), "2024-03");
    assert_eq!(row.end_date.to_string(), "2024-03");
    assert_eq!(row.share, Some(0.12));
    assert_eq!(row.visits, Some(9876.0));
    assert_eq!(row.api_key, "request-key");
}

#[test]
fn provenance_can_be_replaced() {
    let source = ScriptedSource::new().script("a.com", vec![records(&[("Italy", 0.12, 9876.0)])]);
    let collector = Collector::with_sleeper(&source, RecordingSleeper::default()).with_provenance("******-key");

    let report = collector.fetch_unit(&request("secret-key", TrafficType::AllTraffic, 25, &["a.com"]), "a.com", range("2024-03"));
    assert_eq!(report.rows()[0].api_key, "******-key");
    assert_eq!(source.calls.lock().unwrap()[0].credential, "secret-key");
}

#[test]
fn duplicate_domains_are_queried_twice() {
    let source = ScriptedSource::new().fallback(records(&[("Peru", 1.0, 5.0)]));
    let collector = Collector::with_sleeper(&source, RecordingSleeper::default());

    let table = collector
        .fetch(&request("key", TrafficType::AllTraffic, 5, &["a.com", "a.com"]), range("2024-01"))
        .unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(source.calls_for("a.com"), 2);
}

#[test]
fn parallel_collection_keeps_input_order() {
    let source = ScriptedSource::new()
        .script("a.com", vec![records(&[("A", 1.0, 1.0)])])
        .script("b.com", vec![status(500)])
        .script("c.com", vec![records(&[("C", 1.0, 1.0)])])
        .script("d.com", vec![status(429), records(&[("D", 1.0, 1.0)])]);
    let sleeper = RecordingSleeper::default();
    let collector = Collector::with_sleeper(&source, &sleeper);
    let req = request("key", TrafficType::AllTraffic, 5, &["a.com", "b.com", "c.com", "d.com"]);

    let reports = collector.collect_parallel(&req, range("2024-01"), 4);

    let order: Vec<&str> = reports.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(order, vec!["a.com", "b.com", "c.com", "d.com"]);
    assert!(matches!(reports[1].outcome, UnitOutcome::Failed(_)));
    assert_eq!(reports[3].attempts, 2);
    assert_eq!(source.call_count(), 5);
}

#[test]
fn custom_policy_without_retry() {
    let source = ScriptedSource::new().script("a.com", vec![status(429), records(&[("X", 1.0, 1.0)])]);
    let sleeper = RecordingSleeper::default();
    let collector = Collector::with_sleeper(&source, &sleeper).with_policy(RetryPolicy {
        max_attempts: 1,
        ..RetryPolicy::default()
    });

    let report = collector.fetch_unit(&request("key", TrafficType::AllTraffic, 5, &["a.com"]), "a.com", range("2024-01"));
    assert_eq!(report.outcome, UnitOutcome::Failed(FetchError::RequestFailed { status: 429 }));
    assert_eq!(source.call_count(), 1);
    assert!(sleeper.sleeps.lock().unwrap().is_empty());
}
