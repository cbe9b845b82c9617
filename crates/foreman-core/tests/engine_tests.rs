//! Cross-module tests driving the flow engine through whole wizard runs
//! against the in-memory repositories.

use chrono::{Duration, Utc};
use foreman_core::domain::repository::memory::{ManualClock, MemoryFlowSessionRepository};
use foreman_core::{
    flow_data, render_progress, FlowConfig, FlowData, FlowEngine, FlowError, FlowSessionStatus,
    FlowStep, FlowType, NoopEventHandler, OwnerId, StepValidatorRegistry,
};
use serde_json::json;
use std::sync::Arc;

fn engine() -> (FlowEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let engine = FlowEngine::new(Arc::new(MemoryFlowSessionRepository::new()), clock.clone())
        .with_event_handler(Arc::new(NoopEventHandler));
    (engine, clock)
}

fn owner(id: &str) -> OwnerId {
    OwnerId(id.to_string())
}

#[tokio::test]
async fn scenario_a_work_order_end_to_end() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let user = owner("tenant-42");

    engine
        .start_flow(
            &user,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;

    // Each advance carries the answer to the step being left
    let patches = [
        (2, flow_data([("typeOfWork", json!("repair"))])),
        (3, flow_data([("typeOfService", json!("corrective"))])),
        (4, flow_data([("priority", json!("high"))])),
        (5, flow_data([("location", json!("Bldg A"))])),
        (6, flow_data([("equipment", json!("HVAC#5"))])),
    ];
    for (next, patch) in patches {
        engine
            .advance_step(&user, FlowStep::Numbered(next), patch)
            .await?;
    }

    // Step 6 collects the free-text description in place
    engine
        .update_data(&user, flow_data([("description", json!("leak"))]))
        .await?;

    let completed = engine
        .complete_flow(&user, flow_data([("workOrderId", json!(42))]))
        .await?;

    assert_eq!(completed.status, FlowSessionStatus::Completed);
    assert_eq!(completed.data.len(), 7);
    assert_eq!(completed.data["typeOfWork"].as_str().unwrap(), "repair");
    assert_eq!(
        completed.data["typeOfService"].as_str().unwrap(),
        "corrective"
    );
    assert_eq!(completed.data["priority"].as_str().unwrap(), "high");
    assert_eq!(completed.data["location"].as_str().unwrap(), "Bldg A");
    assert_eq!(completed.data["equipment"].as_str().unwrap(), "HVAC#5");
    assert_eq!(completed.data["description"].as_str().unwrap(), "leak");
    assert_eq!(completed.data["workOrderId"].as_i64().unwrap(), 42);

    assert!(!engine.has_active_flow(&user).await?);
    Ok(())
}

#[tokio::test]
async fn scenario_b_go_back_discards_abandoned_step() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let user = owner("tenant-42");

    engine
        .start_flow(
            &user,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;
    engine
        .advance_step(
            &user,
            FlowStep::Numbered(2),
            flow_data([("typeOfWork", json!("repair"))]),
        )
        .await?;
    engine
        .advance_step(
            &user,
            FlowStep::Numbered(3),
            flow_data([("typeOfService", json!("corrective"))]),
        )
        .await?;

    // User picks a priority at step 3, then changes their mind
    engine
        .update_data(&user, flow_data([("priority", json!("high"))]))
        .await?;
    let history_before = engine.get_active_flow(&user).await?.unwrap().history.len();

    let session = engine.go_back(&user).await?;

    assert_eq!(session.current_step, FlowStep::Numbered(2));
    assert!(!session.data.contains_key("priority"));
    assert_eq!(session.history.len(), history_before - 1);
    Ok(())
}

#[tokio::test]
async fn scenario_c_go_back_without_any_session() {
    let (engine, _) = engine();

    let result = engine.go_back(&owner("brand-new")).await;
    assert!(matches!(result, Err(FlowError::NoActiveFlow(_))));
}

#[tokio::test]
async fn final_data_is_ordered_shallow_merge() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let user = owner("tenant-9");

    engine
        .start_flow(
            &user,
            FlowType::FacilityRegistration,
            flow_data([("name", json!("draft")), ("source", json!("chat"))]),
            FlowConfig::for_type(FlowType::FacilityRegistration),
        )
        .await?;

    // A later patch overwrites the earlier value for the same key
    engine
        .advance_step(
            &user,
            FlowStep::Numbered(2),
            flow_data([("name", json!("North Plant"))]),
        )
        .await?;
    engine
        .advance_step(
            &user,
            FlowStep::Numbered(3),
            flow_data([("address", json!("1 Factory Rd"))]),
        )
        .await?;

    let completed = engine
        .complete_flow(&user, flow_data([("facilityId", json!(7))]))
        .await?;

    assert_eq!(completed.data["name"].as_str().unwrap(), "North Plant");
    assert_eq!(completed.data["source"].as_str().unwrap(), "chat");
    assert_eq!(completed.data["address"].as_str().unwrap(), "1 Factory Rd");
    assert_eq!(completed.data["facilityId"].as_i64().unwrap(), 7);
    Ok(())
}

#[tokio::test]
async fn go_back_restores_exact_pre_advance_snapshot() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let user = owner("tenant-9");

    engine
        .start_flow(
            &user,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;
    engine
        .advance_step(
            &user,
            FlowStep::Numbered(2),
            flow_data([("typeOfWork", json!("repair"))]),
        )
        .await?;

    let before_third = engine.get_active_flow(&user).await?.unwrap();
    engine
        .advance_step(
            &user,
            FlowStep::Numbered(3),
            flow_data([("typeOfWork", json!("inspection")), ("extra", json!(true))]),
        )
        .await?;

    let restored = engine.go_back(&user).await?;

    // Snapshot restore, not a merge: the overwrite and the new key are gone
    assert_eq!(restored.current_step, before_third.current_step);
    assert_eq!(restored.data, before_third.data);
    assert_eq!(restored.history.len(), before_third.history.len());
    Ok(())
}

#[tokio::test]
async fn expired_session_is_removed_and_restart_is_clean() -> Result<(), FlowError> {
    let (engine, clock) = engine();
    let user = owner("tenant-1");

    engine
        .start_flow(
            &user,
            FlowType::WorkOrderCreation,
            flow_data([("typeOfWork", json!("repair"))]),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;

    clock.advance(Duration::minutes(31));
    assert!(engine.get_active_flow(&user).await?.is_none());

    // The stale record is gone; a new start sees none of its data
    let fresh = engine
        .start_flow(
            &user,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;
    assert!(fresh.data.is_empty());
    assert_eq!(fresh.current_step, FlowStep::Numbered(1));
    assert_eq!(fresh.version, 1);
    Ok(())
}

#[tokio::test]
async fn start_flow_always_yields_fresh_state() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let user = owner("tenant-1");

    // Prior session in every reachable state, then restart
    for terminalize in [false, true] {
        engine
            .start_flow(
                &user,
                FlowType::ReminderCreation,
                flow_data([("title", json!("old"))]),
                FlowConfig::for_type(FlowType::ReminderCreation),
            )
            .await?;
        engine
            .advance_step(&user, FlowStep::Numbered(2), FlowData::new())
            .await?;
        if terminalize {
            engine.cancel_flow(&user, None).await?;
        }

        let restarted = engine
            .start_flow(
                &user,
                FlowType::ReminderCreation,
                FlowData::new(),
                FlowConfig::for_type(FlowType::ReminderCreation),
            )
            .await?;
        assert_eq!(restarted.current_step, FlowStep::Numbered(1));
        assert!(restarted.history.is_empty());
        assert_eq!(restarted.status, FlowSessionStatus::Active);
        assert!(restarted.data.is_empty());
    }
    Ok(())
}

#[tokio::test]
async fn terminal_states_end_activity() -> Result<(), FlowError> {
    let (engine, _) = engine();

    let completer = owner("tenant-complete");
    engine
        .start_flow(
            &completer,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;
    engine.complete_flow(&completer, FlowData::new()).await?;
    assert!(!engine.has_active_flow(&completer).await?);

    let canceller = owner("tenant-cancel");
    engine
        .start_flow(
            &canceller,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;
    engine
        .cancel_flow(&canceller, Some("abandoned".to_string()))
        .await?;
    assert!(!engine.has_active_flow(&canceller).await?);
    Ok(())
}

#[tokio::test]
async fn validation_gates_are_callers_responsibility() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let user = owner("tenant-5");
    let validators = StepValidatorRegistry::with_default_rules();

    engine
        .start_flow(
            &user,
            FlowType::WorkOrderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;

    // Invalid fragment: the caller re-prompts and must not advance
    let fragment = flow_data([("typeOfWork", json!(""))]);
    let outcome = validators.validate(FlowType::WorkOrderCreation, 1, &fragment);
    assert!(!outcome.valid);

    // The engine itself never consults validators
    let session = engine
        .advance_step(&user, FlowStep::Numbered(2), fragment)
        .await?;
    assert_eq!(session.current_step, FlowStep::Numbered(2));
    Ok(())
}

#[test]
fn progress_matches_spec_example() {
    let report = render_progress(3, 6);
    assert_eq!(report.percentage, 50);
    assert_eq!(report.filled_ticks, 5);
    assert_eq!(report.empty_ticks, 5);
}

#[tokio::test]
async fn sessions_are_isolated_per_owner() -> Result<(), FlowError> {
    let (engine, _) = engine();
    let alice = owner("alice");
    let bob = owner("bob");

    engine
        .start_flow(
            &alice,
            FlowType::WorkOrderCreation,
            flow_data([("location", json!("Bldg A"))]),
            FlowConfig::for_type(FlowType::WorkOrderCreation),
        )
        .await?;
    engine
        .start_flow(
            &bob,
            FlowType::ReminderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::ReminderCreation),
        )
        .await?;

    engine.clear_flow(&bob).await?;

    let alice_session = engine.get_active_flow(&alice).await?.unwrap();
    assert_eq!(alice_session.flow_type, FlowType::WorkOrderCreation);
    assert_eq!(alice_session.data["location"].as_str().unwrap(), "Bldg A");
    assert!(!engine.has_active_flow(&bob).await?);
    Ok(())
}
