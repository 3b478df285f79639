mod common;

use brushwork_engine::{
    CancellationToken, CurrentSelection, Derivation, EngineError, SelectionEngine, SelectionMode,
    SelectionPredicate, TableHandle, TickOutput,
};
use common::{ids, sales};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn engine() -> SelectionEngine {
    let mut engine = SelectionEngine::new();
    engine.register_table("sales", sales()).unwrap();
    engine
}

#[test]
fn no_current_selection_before_the_first_tick() {
    let engine = engine();
    assert!(engine.has_table("sales"));
    assert_eq!(
        engine
            .current_selection("sales", SelectionMode::Predicate)
            .unwrap(),
        None
    );
}

#[test]
fn categorical_tick_appends_history_and_filters() {
    let mut engine = engine();
    let report = engine
        .tick(
            "sales",
            SelectionPredicate::categorical("region", ["west", "east"]),
        )
        .unwrap();
    assert_eq!(report.history_len, 1);
    assert_eq!(ids(&report.filtered), vec![1.0, 2.0, 4.0, 6.0, 7.0]);

    let Some(CurrentSelection::Data(data)) = engine
        .current_selection("sales", SelectionMode::Data)
        .unwrap()
    else {
        panic!("expected data selection");
    };
    assert_eq!(data, report.filtered);
}

#[test]
fn history_grows_by_one_per_tick_and_never_changes() {
    let mut engine = engine();
    let predicates = vec![
        SelectionPredicate::range_1d("price", 0.0, 30.0),
        SelectionPredicate::categorical("region", ["north"]),
        SelectionPredicate::null(),
        SelectionPredicate::range_2d("price", (0.0, 60.0), "qty", (0.0, 50.0)),
    ];
    for (i, predicate) in predicates.iter().enumerate() {
        let report = engine.tick("sales", predicate.clone()).unwrap();
        assert_eq!(report.history_len, i + 1);
        let history = engine.table_state("sales").unwrap().history();
        assert_eq!(history, &predicates[..=i]);
    }
    assert_eq!(
        engine.selection_at("sales", 1).unwrap(),
        Some(&predicates[1])
    );
    assert_eq!(engine.selection_at("sales", 9).unwrap(), None);
}

#[test]
fn tick_on_unknown_table_fails() {
    let mut engine = engine();
    let err = engine
        .tick("missing", SelectionPredicate::null())
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownTable(name) if name == "missing"));
}

#[test]
fn tick_with_unknown_column_leaves_history_alone() {
    let mut engine = engine();
    let err = engine
        .tick("sales", SelectionPredicate::range_1d("nope", 0.0, 1.0))
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownColumn { .. }));
    assert!(engine.table_state("sales").unwrap().history().is_empty());
}

#[test]
fn bindings_run_once_each_in_registration_order_with_the_same_rows() {
    let mut engine = engine();
    let calls: Arc<Mutex<Vec<(&'static str, Vec<f64>)>>> = Arc::default();

    for label in ["first", "second", "third"] {
        let calls = calls.clone();
        engine
            .bind("sales", move |ctx| {
                calls.lock().unwrap().push((label, ids(ctx.filtered)));
                Ok(TickOutput::Unchanged)
            })
            .unwrap();
    }

    let report = engine
        .tick("sales", SelectionPredicate::range_1d("price", 20.0, 45.0))
        .unwrap();
    let rows = vec![2.0, 3.0, 5.0];
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            ("first", rows.clone()),
            ("second", rows.clone()),
            ("third", rows)
        ]
    );
    assert_eq!(report.invoked, engine.binding_ids("sales"));
}

#[test]
fn later_callbacks_observe_earlier_registry_updates() {
    let mut engine = engine();
    engine
        .bind("sales", |ctx| {
            Ok(TickOutput::Register(TableHandle::new(
                "picked",
                ctx.filtered.clone(),
            )))
        })
        .unwrap();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_cb = seen.clone();
    engine
        .bind("sales", move |ctx| {
            let rows = ctx
                .registry
                .get("picked")
                .map(|state| state.handle().table().row_count());
            *seen_in_cb.lock().unwrap() = rows;
            Ok(TickOutput::Unchanged)
        })
        .unwrap();

    let report = engine
        .tick("sales", SelectionPredicate::categorical("region", ["west"]))
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(3));
    assert_eq!(report.touched, vec!["picked".to_string()]);
    assert!(engine.has_table("picked"));
}

#[test]
fn failing_callback_aborts_the_rest_but_keeps_the_append() {
    let mut engine = engine();
    let ran_after = Arc::new(Mutex::new(false));
    engine
        .bind("sales", |_| Err(anyhow::anyhow!("boom")))
        .unwrap();
    let flag = ran_after.clone();
    engine
        .bind("sales", move |_| {
            *flag.lock().unwrap() = true;
            Ok(TickOutput::Unchanged)
        })
        .unwrap();

    let err = engine
        .tick("sales", SelectionPredicate::null())
        .unwrap_err();
    match err {
        EngineError::Callback { table, source, .. } => {
            assert_eq!(table, "sales");
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!*ran_after.lock().unwrap());
    assert_eq!(engine.table_state("sales").unwrap().history().len(), 1);
}

#[test]
fn cancelled_token_stops_before_the_next_callback() {
    let mut engine = engine();
    let token = CancellationToken::new();
    let to_cancel = token.clone();
    let second_ran = Arc::new(Mutex::new(false));
    engine
        .bind("sales", move |ctx| {
            assert!(!ctx.cancel.is_cancelled());
            to_cancel.cancel();
            Ok(TickOutput::Unchanged)
        })
        .unwrap();
    let flag = second_ran.clone();
    engine
        .bind("sales", move |_| {
            *flag.lock().unwrap() = true;
            Ok(TickOutput::Unchanged)
        })
        .unwrap();

    let err = engine
        .tick_with("sales", SelectionPredicate::null(), &token)
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled { .. }));
    assert!(!*second_ran.lock().unwrap());
}

#[test]
fn unbind_stops_future_invocations() {
    let mut engine = engine();
    let count = Arc::new(Mutex::new(0));
    let counter = count.clone();
    let id = engine
        .bind("sales", move |_| {
            *counter.lock().unwrap() += 1;
            Ok(TickOutput::Unchanged)
        })
        .unwrap();

    engine.tick("sales", SelectionPredicate::null()).unwrap();
    assert!(engine.unbind(id));
    assert!(!engine.unbind(id));
    engine.tick("sales", SelectionPredicate::null()).unwrap();
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn binding_to_an_unnamed_table_is_a_user_error() {
    let mut engine = engine();
    let err = engine
        .bind("  ", |_| Ok(TickOutput::Unchanged))
        .unwrap_err();
    assert!(matches!(err, EngineError::User(_)));
}

#[test]
fn bindings_may_precede_their_table() {
    let mut engine = SelectionEngine::new();
    let count = Arc::new(Mutex::new(0));
    let counter = count.clone();
    engine
        .bind("later", move |_| {
            *counter.lock().unwrap() += 1;
            Ok(TickOutput::Unchanged)
        })
        .unwrap();
    engine.register_table("later", sales()).unwrap();
    engine.tick("later", SelectionPredicate::null()).unwrap();
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn derived_binding_rematerializes_a_selection_join() {
    let mut engine = engine();
    let base = sales();
    engine
        .register_derived(TableHandle::new("orders_in_selection", base.clone()))
        .unwrap();
    engine
        .tick("orders_in_selection", SelectionPredicate::null())
        .unwrap();
    engine
        .bind_derived(
            "orders_in_selection",
            Derivation::selection_join("sales", base, "id"),
        )
        .unwrap();

    engine
        .tick("sales", SelectionPredicate::categorical("region", ["north", "south"]))
        .unwrap();

    let state = engine.table_state("orders_in_selection").unwrap();
    assert_eq!(ids(state.handle().table()), vec![3.0, 5.0]);
    // Replacing a handle keeps the derived table's own history.
    assert_eq!(state.history().len(), 1);
    assert_eq!(
        state.handle().derivation().map(|d| d.source()),
        Some("sales")
    );
}

#[test]
fn ticks_queue_no_registry_events() {
    let mut engine = engine();
    engine.drain_events();
    for _ in 0..1_000 {
        engine.tick("sales", SelectionPredicate::null()).unwrap();
    }
    assert_eq!(engine.table_state("sales").unwrap().history().len(), 1_000);
    assert!(engine.drain_events().is_empty());
}
