use coordinator::ParameterStore;
use serde_json::{json, Value};
use shared::domain::EffectId;
use tokio::sync::mpsc::Receiver;

use super::testing::RecordingSink;
use super::*;

fn bridge(unmap_on_remove: bool) -> (TransportBridge<RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let bridge = TransportBridge::new(CoordinatorState::default(), sink.clone(), unmap_on_remove);
    (bridge, sink)
}

fn connect(bridge: &mut TransportBridge<RecordingSink>, conn: ConnectionId) -> Receiver<UiEvent> {
    let (outbound, rx) = mpsc::channel(64);
    bridge.handle(InboundEvent::Connected { conn, outbound });
    rx
}

fn drain(rx: &mut Receiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn action(conn: ConnectionId, io_type: &str, io_flag: Option<&str>, payload: Value) -> InboundEvent {
    InboundEvent::Ui {
        conn,
        event: UiEvent::Action(ActionEnvelope {
            io_type: io_type.to_string(),
            io_flag: io_flag.map(str::to_string),
            payload,
        }),
    }
}

fn chain(conn: ConnectionId, payload: Value) -> InboundEvent {
    action(conn, "ROUTE", None, payload)
}

fn add(conn: ConnectionId, effect_type: &str) -> InboundEvent {
    chain(conn, json!({"command": "ADD_EFFECT", "effectType": effect_type}))
}

fn actions_of(events: &[UiEvent], io_type: IoType) -> Vec<&ActionEnvelope> {
    events
        .iter()
        .filter_map(|event| match event {
            UiEvent::Action(envelope) if envelope.io_type == io_type.as_str() => Some(envelope),
            _ => None,
        })
        .collect()
}

#[test]
fn connecting_pushes_current_route_to_engine() {
    let (mut bridge, sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);

    assert_eq!(bridge.phase(1), Some(ConnectionPhase::Connected));
    assert_eq!(
        sink.json_on(EngineChannel::Route),
        [json!({"input": "output"})]
    );
}

#[test]
fn first_action_activates_connection() {
    let (mut bridge, _sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);

    bridge.handle(action(1, "AUDIO_INPUT", None, json!("Built-in Mic")));
    assert_eq!(bridge.phase(1), Some(ConnectionPhase::Active));
}

#[test]
fn adding_effect_seeds_defaults_and_publishes_route() {
    let (mut bridge, sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);
    sink.take();

    bridge.handle(add(1, "reverb"));

    let sent = sink.take();
    let params: Vec<&OscMessage> = sent
        .iter()
        .filter(|(channel, _)| *channel == EngineChannel::Parameters)
        .map(|(_, message)| message)
        .collect();
    assert_eq!(params.len(), 3);
    assert!(params.iter().all(|message| message.address == "/params"));

    let (_, route) = sent
        .iter()
        .find(|(channel, _)| *channel == EngineChannel::Route)
        .expect("route datagram");
    let body: Value = serde_json::from_str(route.args[0].as_str().expect("string")).expect("json");
    assert_eq!(body, json!({"input": "reverb1", "reverb1": "output"}));

    let events = drain(&mut rx);
    assert_eq!(actions_of(&events, IoType::UpdateParameter).len(), 3);
    let echo = actions_of(&events, IoType::Route);
    assert_eq!(echo.len(), 1);
    assert_eq!(echo[0].payload["effects"][0]["effectID"], "reverb1");
    assert_eq!(echo[0].payload["route"]["input"], "reverb1");
    assert_eq!(
        bridge.state().params.get(&EffectId::from("reverb1"), "decay"),
        Some(0.5)
    );
}

#[test]
fn chain_edits_reroute_in_order() {
    let (mut bridge, sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    bridge.handle(add(1, "delay"));
    sink.take();

    bridge.handle(chain(
        1,
        json!({"command": "REORDER_EFFECT", "effectID": "delay1", "direction": "left"}),
    ));
    assert_eq!(
        sink.json_on(EngineChannel::Route),
        [json!({"input": "delay1", "delay1": "reverb1", "reverb1": "output"})]
    );

    bridge.handle(chain(1, json!({"command": "TOGGLE_BYPASS", "effectID": "delay1"})));
    assert_eq!(
        sink.json_on(EngineChannel::Route),
        [json!({"input": "reverb1", "reverb1": "output"})]
    );

    bridge.handle(chain(1, json!({"command": "TOGGLE_BYPASS", "effectID": "delay1"})));
    bridge.handle(chain(1, json!({"command": "TOGGLE_SOLO", "effectID": "reverb1"})));
    assert_eq!(
        sink.json_on(EngineChannel::Route).last(),
        Some(&json!({"input": "reverb1", "reverb1": "output"}))
    );

    bridge.handle(chain(1, json!({"command": "REMOVE_EFFECT", "effectID": "reverb1"})));
    assert_eq!(
        sink.json_on(EngineChannel::Route),
        [json!({"input": "delay1", "delay1": "output"})]
    );
}

#[test]
fn no_op_chain_edits_publish_nothing() {
    let (mut bridge, sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    sink.take();
    drain(&mut rx);

    bridge.handle(chain(
        1,
        json!({"command": "REORDER_EFFECT", "effectID": "reverb1", "direction": "left"}),
    ));
    bridge.handle(chain(1, json!({"command": "REMOVE_EFFECT", "effectID": "chorus2"})));

    assert!(sink.take().is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn capacity_error_goes_to_requesting_client_only() {
    let (mut bridge, _sink) = bridge(true);
    let mut requester = connect(&mut bridge, 1);
    let mut observer = connect(&mut bridge, 2);
    for _ in 0..3 {
        bridge.handle(add(1, "delay"));
    }
    drain(&mut requester);
    drain(&mut observer);

    bridge.handle(add(1, "delay"));

    let events = drain(&mut requester);
    assert!(matches!(
        events.as_slice(),
        [UiEvent::Message(text)] if text.contains("delay")
    ));
    assert!(drain(&mut observer).is_empty());
    assert_eq!(bridge.state().chain.effects().len(), 3);
}

#[test]
fn axis_mapping_reaches_engine_and_clients() {
    let (mut bridge, sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    sink.take();
    drain(&mut rx);

    bridge.handle(action(
        1,
        "XYZ_MAP",
        Some("SET_MAP"),
        json!({"axis": "y", "effectID": "reverb1", "paramName": "size"}),
    ));
    assert_eq!(
        sink.json_on(EngineChannel::AxisMap),
        [json!({"effectID": "reverb1", "param": "size", "axis": "y"})]
    );
    let events = drain(&mut rx);
    let echo = actions_of(&events, IoType::XyzMap);
    assert_eq!(echo.len(), 1);
    assert_eq!(echo[0].io_flag.as_deref(), Some("SET_MAP"));

    bridge.handle(action(1, "XYZ_MAP", Some("REMOVE_MAP"), json!({"axis": "y"})));
    assert_eq!(
        sink.json_on(EngineChannel::AxisMap),
        [json!({"effectID": "reverb1", "param": "size", "axis": "n"})]
    );
    assert!(bridge.state().axes.resolve(Axis::Y).is_none());
}

#[test]
fn removing_effect_releases_its_axes() {
    let (mut bridge, sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    bridge.handle(action(
        1,
        "XYZ_MAP",
        Some("SET_MAP"),
        json!({"axis": "x", "effectID": "reverb1", "paramName": "decay"}),
    ));
    sink.take();

    bridge.handle(chain(1, json!({"command": "REMOVE_EFFECT", "effectID": "reverb1"})));

    assert!(bridge.state().axes.resolve(Axis::X).is_none());
    assert!(bridge.state().params.effect(&EffectId::from("reverb1")).is_none());
    assert_eq!(
        sink.json_on(EngineChannel::AxisMap),
        [json!({"effectID": "reverb1", "param": "decay", "axis": "n"})]
    );
}

#[test]
fn removing_effect_can_leave_axes_bound() {
    let (mut bridge, sink) = bridge(false);
    let _rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    bridge.handle(action(
        1,
        "XYZ_MAP",
        Some("SET_MAP"),
        json!({"axis": "x", "effectID": "reverb1", "paramName": "decay"}),
    ));
    sink.take();

    bridge.handle(chain(1, json!({"command": "REMOVE_EFFECT", "effectID": "reverb1"})));

    assert!(bridge.state().axes.resolve(Axis::X).is_some());
    assert!(sink.json_on(EngineChannel::AxisMap).is_empty());
}

#[test]
fn ui_parameter_edit_is_echoed_to_other_clients() {
    let (mut bridge, sink) = bridge(true);
    let mut editor = connect(&mut bridge, 1);
    let mut observer = connect(&mut bridge, 2);
    bridge.handle(add(1, "reverb"));
    sink.take();
    drain(&mut editor);
    drain(&mut observer);

    bridge.handle(action(
        1,
        "UPDATE_PARAMETER",
        None,
        json!({"effectID": "reverb1", "paramName": "mix", "paramValue": 1.7}),
    ));

    assert_eq!(
        sink.json_on(EngineChannel::Parameters),
        [json!({"effectID": "reverb1", "paramName": "mix", "paramValue": 1.0})]
    );
    assert!(drain(&mut editor).is_empty());
    let echoed = drain(&mut observer);
    let echo = actions_of(&echoed, IoType::UpdateParameter);
    assert_eq!(echo.len(), 1);
    assert_eq!(echo[0].payload["paramValue"], 1.0);
}

#[test]
fn coordinate_frame_drives_bound_parameters() {
    let (mut bridge, sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    bridge.handle(action(
        1,
        "XYZ_MAP",
        Some("SET_MAP"),
        json!({"axis": "z", "effectID": "reverb1", "paramName": "mix"}),
    ));
    sink.take();
    drain(&mut rx);

    bridge.handle(InboundEvent::Coordinates(OscMessage::new(
        "/Coordinates",
        vec![OscArg::Float(0.25), OscArg::Float(0.5), OscArg::Float(0.75)],
    )));

    let sent = sink.take();
    let (_, coords) = sent
        .iter()
        .find(|(channel, _)| *channel == EngineChannel::Coordinates)
        .expect("coords datagram");
    assert_eq!(coords.address, "/coords");
    assert_eq!(coords.numeric_args(), Some(vec![0.25, 0.5, 0.75]));
    assert!(sent.iter().any(|(channel, message)| {
        *channel == EngineChannel::Parameters
            && message.args[0].as_str()
                == Some(r#"{"effectID":"reverb1","paramName":"mix","paramValue":0.75}"#)
    }));

    assert_eq!(drain(&mut rx), [UiEvent::LeapData([0.25, 0.5, 0.75])]);
    assert_eq!(
        bridge.state().params.get(&EffectId::from("reverb1"), "mix"),
        Some(0.75)
    );
}

#[test]
fn malformed_coordinate_frame_is_dropped() {
    let (mut bridge, sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);
    sink.take();

    bridge.handle(InboundEvent::Coordinates(OscMessage::new(
        "/Coordinates",
        vec![OscArg::Float(0.1), OscArg::Float(0.2)],
    )));
    bridge.handle(InboundEvent::Coordinates(OscMessage::new(
        "/Coordinates",
        vec![OscArg::Str("x".into()), OscArg::Float(0.2), OscArg::Float(0.3)],
    )));

    assert!(sink.take().is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn recognised_status_is_republished() {
    let (mut bridge, _sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);

    bridge.handle(InboundEvent::Status(OscMessage::new(
        "/TrackingMode",
        vec![OscArg::Int(1)],
    )));
    bridge.handle(InboundEvent::Status(OscMessage::new(
        "/Battery",
        vec![OscArg::Int(80)],
    )));

    let events = drain(&mut rx);
    assert_eq!(
        events,
        [UiEvent::LeapStatusUpdate(StatusFrame {
            address: "/TrackingMode".into(),
            args: vec![json!(1)],
        })]
    );
    let status = bridge.state().relay.status();
    assert!(status.is_tracking);
    assert!(status.is_connected);
}

#[test]
fn engine_lines_become_messages() {
    let (mut bridge, _sink) = bridge(true);
    let mut first = connect(&mut bridge, 1);
    let mut second = connect(&mut bridge, 2);

    bridge.handle(InboundEvent::EngineLine("dsp on".into()));

    assert_eq!(drain(&mut first), [UiEvent::Message("dsp on".into())]);
    assert_eq!(drain(&mut second), [UiEvent::Message("dsp on".into())]);
}

#[test]
fn audio_input_choice_passes_through() {
    let (mut bridge, sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);
    sink.take();

    bridge.handle(action(1, "AUDIO_INPUT", None, json!("Line In 2")));

    let sent = sink.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, EngineChannel::AudioInput);
    assert_eq!(sent[0].1.address, "/audioIn");
    assert_eq!(sent[0].1.args, [OscArg::Str("Line In 2".into())]);
}

#[test]
fn unusable_ui_input_is_dropped() {
    let (mut bridge, sink) = bridge(true);
    let mut rx = connect(&mut bridge, 1);
    sink.take();

    bridge.handle(action(1, "TELEPORT", None, json!({})));
    bridge.handle(chain(1, json!({"command": "ADD_EFFECT"})));
    bridge.handle(InboundEvent::Ui {
        conn: 1,
        event: UiEvent::Message("hello".into()),
    });
    bridge.handle(add(99, "reverb"));

    assert!(sink.take().is_empty());
    assert!(drain(&mut rx).is_empty());
    assert!(bridge.state().chain.effects().is_empty());
}

#[test]
fn disconnected_client_receives_nothing() {
    let (mut bridge, _sink) = bridge(true);
    let mut gone = connect(&mut bridge, 1);
    let mut staying = connect(&mut bridge, 2);

    bridge.handle(InboundEvent::Disconnected { conn: 1 });
    bridge.handle(InboundEvent::EngineLine("buffer 256".into()));

    assert_eq!(bridge.phase(1), None);
    assert!(drain(&mut gone).is_empty());
    assert_eq!(drain(&mut staying).len(), 1);
}

#[test]
fn snapshot_request_is_answered_from_loop_state() {
    let (mut bridge, _sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "filter"));

    let (reply, mut response) = oneshot::channel();
    bridge.handle(InboundEvent::Snapshot(reply));
    let snapshot = response.try_recv().expect("snapshot");
    assert_eq!(snapshot.effects.len(), 1);
    assert_eq!(snapshot.effects[0].id, EffectId::from("filter1"));
}

#[test]
fn parameter_edits_for_absent_effects_reach_engine_without_growing_store() {
    let (mut bridge, sink) = bridge(true);
    let _rx = connect(&mut bridge, 1);
    sink.take();

    for n in 0..50 {
        bridge.handle(action(
            1,
            "UPDATE_PARAMETER",
            None,
            json!({"effectID": format!("ghost{n}"), "paramName": "mix", "paramValue": 0.5}),
        ));
    }

    assert_eq!(sink.json_on(EngineChannel::Parameters).len(), 50);
    assert!(bridge.state().chain.effects().is_empty());
    assert_eq!(bridge.state().params, ParameterStore::default());
}

#[test]
fn stale_binding_after_remove_does_not_recreate_values() {
    let (mut bridge, sink) = bridge(false);
    let _rx = connect(&mut bridge, 1);
    bridge.handle(add(1, "reverb"));
    bridge.handle(action(
        1,
        "XYZ_MAP",
        Some("SET_MAP"),
        json!({"axis": "x", "effectID": "reverb1", "paramName": "decay"}),
    ));
    bridge.handle(chain(1, json!({"command": "REMOVE_EFFECT", "effectID": "reverb1"})));
    sink.take();

    bridge.handle(InboundEvent::Coordinates(OscMessage::new(
        "/Coordinates",
        vec![OscArg::Float(0.9), OscArg::Float(0.0), OscArg::Float(0.0)],
    )));

    assert_eq!(
        sink.json_on(EngineChannel::Parameters),
        [json!({"effectID": "reverb1", "paramName": "decay", "paramValue": 0.9})]
    );
    assert!(bridge.state().params.effect(&EffectId::from("reverb1")).is_none());
}
