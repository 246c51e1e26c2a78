use pretty_assertions::assert_eq;

use honeycomb_triggers::query::{CalculationOp, CalculationSpec, OrderSpec, QuerySpec};
use honeycomb_triggers::transport::{InMemoryTransport, Method};
use honeycomb_triggers::{
    Action, Error, Reconciler, Refresh, ResourceAddress, ThresholdOp, Trigger, TriggerClient,
    TriggerRecipient, TriggerThreshold, ValidationError,
};

const DATASET: &str = "production";

fn reconciler() -> Reconciler<InMemoryTransport> {
    Reconciler::new(TriggerClient::new(
        InMemoryTransport::new().with_dataset(DATASET),
    ))
}

fn desired() -> Trigger {
    Trigger::new(
        "Too many slow requests",
        QuerySpec::single(CalculationSpec::of(CalculationOp::P99, "duration_ms")),
        TriggerThreshold::new(ThresholdOp::GreaterThan, 100.0),
    )
    .with_recipient(TriggerRecipient::email("hello@example.com"))
}

fn mutating_requests(r: &Reconciler<InMemoryTransport>) -> usize {
    r.client()
        .transport()
        .requests()
        .unwrap()
        .iter()
        .filter(|req| req.method != Method::Get)
        .count()
}

#[test]
fn converges_across_runs() {
    let r = reconciler();

    // First run creates and records identities.
    let first = r.reconcile(DATASET, &desired(), None).unwrap();
    assert_eq!(first.action, Action::Create);
    let address = first.state.address.clone();
    assert_eq!(first.state.applied.id.as_ref(), Some(&address.id));
    assert!(first.state.applied.recipients[0].id.is_some());

    // Unchanged definition: refreshed, nothing written.
    let writes = mutating_requests(&r);
    let second = r.reconcile(DATASET, &desired(), Some(first.state)).unwrap();
    assert_eq!(second.action, Action::Noop);
    assert_eq!(mutating_requests(&r), writes);

    // Changed definition updates in place.
    let edited = desired().with_description("p99 above 100ms").with_frequency(300);
    let third = r.reconcile(DATASET, &edited, Some(second.state)).unwrap();
    assert_eq!(third.action, Action::Update);
    assert_eq!(third.changes, vec!["description", "frequency"]);
    assert_eq!(third.state.address, address);
    assert_eq!(r.client().get(DATASET, &address.id).unwrap(), third.state.applied);

    // Deleted out of band: detected and created again.
    r.client().delete(DATASET, &address.id).unwrap();
    assert_eq!(r.refresh(third.state.clone()).unwrap(), Refresh::Gone);
    let fourth = r.reconcile(DATASET, &edited, Some(third.state)).unwrap();
    assert_eq!(fourth.action, Action::Recreate);
    assert_ne!(fourth.state.address, address);
    assert_eq!(r.client().transport().trigger_count(DATASET).unwrap(), 1);

    // Destroy is idempotent.
    r.destroy(&fourth.state).unwrap();
    r.destroy(&fourth.state).unwrap();
    assert_eq!(r.client().transport().trigger_count(DATASET).unwrap(), 0);
}

#[test]
fn invalid_definitions_never_reach_the_server() {
    let r = reconciler();
    let created = r.apply(DATASET, &desired(), None).unwrap();
    let writes = mutating_requests(&r);

    let mut ordered = desired();
    ordered.query.orders.push(OrderSpec {
        column: Some("duration_ms".to_string()),
        ..OrderSpec::default()
    });
    let err = r.apply(DATASET, &ordered, Some(&created.state)).unwrap_err();
    assert_eq!(err, Error::Validation(ValidationError::OrdersNotAllowed));
    assert_eq!(err.to_string(), "Validation error: orders is not allowed in a trigger query");
    assert_eq!(mutating_requests(&r), writes);
}

#[test]
fn imported_trigger_converges() {
    let r = reconciler();
    let existing = r.client().create(DATASET, &desired()).unwrap();
    let raw = format!("{DATASET}/{}", existing.id.as_ref().unwrap());

    let address: ResourceAddress = raw.parse().unwrap();
    let state = r.import(&address).unwrap();
    assert_eq!(state.applied, existing);

    let plan = r.plan(DATASET, &desired(), Some(&state));
    assert_eq!(plan.action, Action::Noop);
    assert_eq!(plan.desired, existing);
}

#[test]
fn slashed_dataset_round_trips_through_import() {
    let r = Reconciler::new(TriggerClient::new(
        InMemoryTransport::new()
            .with_dataset("team/api")
            .with_dataset("team"),
    ));
    let created = r.apply("team/api", &desired(), None).unwrap();
    let raw = created.state.address.to_string();
    assert!(raw.starts_with("team/api/"));

    let address: ResourceAddress = raw.parse().unwrap();
    assert_eq!(address.dataset, "team/api");
    let state = r.import(&address).unwrap();
    assert_eq!(state.applied, created.state.applied);
    assert!(r.client().list("team").unwrap().is_empty());
}

#[test]
fn state_survives_serialization() {
    let r = reconciler();
    let created = r.apply(DATASET, &desired(), None).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&created.state).unwrap()).unwrap();
    let restored = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();

    let outcome = r.apply(DATASET, &desired(), Some(&restored)).unwrap();
    assert_eq!(outcome.action, Action::Noop);
}

#[tracing_test::traced_test]
#[test]
fn drift_is_logged() {
    let r = reconciler();
    let created = r.apply(DATASET, &desired(), None).unwrap();
    assert!(logs_contain("trigger created"));

    let mut edited = created.state.applied.clone();
    edited.disabled = true;
    r.client().update(DATASET, &edited).unwrap();

    let Refresh::Present { drifted, .. } = r.refresh(created.state).unwrap() else {
        panic!("trigger should still exist");
    };
    assert!(drifted);
    assert!(logs_contain("trigger changed outside reconciliation"));
}
