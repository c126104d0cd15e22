use std::collections::HashMap;

use coordinator::{AxisEvent, CoordinatorState, ParameterUpdate, StateSnapshot, UpdateSource};
use serde::Serialize;
use shared::{
    domain::{Axis, ParamTarget},
    osc::{OscArg, OscMessage},
    protocol::{
        ActionEnvelope, AxisMapPayload, AxisMapRequest, ChainCommand, ChainPayload,
        EngineChannel, IoFlag, IoType, StatusFrame, UiAction, UiEvent,
    },
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

pub(crate) type ConnectionId = u64;

#[derive(Debug)]
pub(crate) enum InboundEvent {
    Connected {
        conn: ConnectionId,
        outbound: mpsc::Sender<UiEvent>,
    },
    Ui {
        conn: ConnectionId,
        event: UiEvent,
    },
    Disconnected {
        conn: ConnectionId,
    },
    Coordinates(OscMessage),
    Status(OscMessage),
    EngineLine(String),
    Snapshot(oneshot::Sender<StateSnapshot>),
}

pub(crate) trait EngineSink {
    fn send(&self, channel: EngineChannel, message: OscMessage);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionPhase {
    Connected,
    Active,
}

struct UiClient {
    phase: ConnectionPhase,
    outbound: mpsc::Sender<UiEvent>,
}

/// Owns the coordinator state and translates between it and the outside
/// world. Each event is handled to completion before the next is taken.
pub(crate) struct TransportBridge<S> {
    state: CoordinatorState,
    sink: S,
    clients: HashMap<ConnectionId, UiClient>,
    unmap_on_remove: bool,
}

impl<S: EngineSink> TransportBridge<S> {
    pub(crate) fn new(state: CoordinatorState, sink: S, unmap_on_remove: bool) -> Self {
        Self {
            state,
            sink,
            clients: HashMap::new(),
            unmap_on_remove,
        }
    }

    pub(crate) async fn run(mut self, mut events: mpsc::Receiver<InboundEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        info!("event loop stopped");
    }

    pub(crate) fn handle(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Connected { conn, outbound } => self.on_connected(conn, outbound),
            InboundEvent::Ui { conn, event } => self.on_ui_event(conn, event),
            InboundEvent::Disconnected { conn } => {
                if let Some(client) = self.clients.remove(&conn) {
                    info!(conn, phase = ?client.phase, "ui client disconnected");
                }
            }
            InboundEvent::Coordinates(message) => self.on_coordinates(message),
            InboundEvent::Status(message) => self.on_status(message),
            InboundEvent::EngineLine(line) => {
                debug!(%line, "engine status");
                self.broadcast(UiEvent::Message(line), None);
            }
            InboundEvent::Snapshot(reply) => {
                let _ = reply.send(self.state.snapshot());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &CoordinatorState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn phase(&self, conn: ConnectionId) -> Option<ConnectionPhase> {
        self.clients.get(&conn).map(|client| client.phase)
    }

    fn on_connected(&mut self, conn: ConnectionId, outbound: mpsc::Sender<UiEvent>) {
        info!(conn, "ui client connected");
        self.clients.insert(
            conn,
            UiClient {
                phase: ConnectionPhase::Connected,
                outbound,
            },
        );
        // Resynchronise an engine that may have restarted since the last edit.
        let route = self.state.chain.route();
        self.send_json(EngineChannel::Route, &route);
    }

    fn on_ui_event(&mut self, conn: ConnectionId, event: UiEvent) {
        let Some(client) = self.clients.get_mut(&conn) else {
            warn!(conn, "dropping event from unknown connection");
            return;
        };
        let envelope = match event {
            UiEvent::Action(envelope) => envelope,
            other => {
                warn!(conn, event = ?other, "dropping non-action event from ui client");
                return;
            }
        };
        if client.phase == ConnectionPhase::Connected {
            client.phase = ConnectionPhase::Active;
            info!(conn, "ui client active");
        }

        match envelope.decode() {
            Ok(action) => self.on_action(conn, action),
            Err(error) => warn!(conn, %error, io_type = %envelope.io_type, "dropping ui action"),
        }
    }

    fn on_action(&mut self, conn: ConnectionId, action: UiAction) {
        match action {
            UiAction::Chain(command) => self.on_chain_command(conn, command),
            UiAction::SetMap { axis, target } => {
                let events = self.state.axes.map_axis(axis, target);
                self.publish_axis_events(&events);
            }
            UiAction::RemoveMap { axis } => {
                let event = self.state.axes.unmap_axis(axis);
                self.publish_axis_events(&[event]);
            }
            UiAction::UpdateParameter(payload) => {
                let Some(update) = self.state.set_parameter(&payload) else {
                    warn!(conn, ?payload, "dropping non-finite parameter value");
                    return;
                };
                self.publish_parameter(&update, Some(conn));
            }
            UiAction::AudioInput(choice) => {
                info!(%choice, "audio input selected");
                self.sink.send(
                    EngineChannel::AudioInput,
                    OscMessage::new(EngineChannel::AudioInput.address(), vec![OscArg::Str(choice)]),
                );
            }
        }
    }

    fn on_chain_command(&mut self, conn: ConnectionId, command: ChainCommand) {
        let changed = match command {
            ChainCommand::AddEffect { effect_type } => match self.state.add_effect(&effect_type) {
                Ok((id, defaults)) => {
                    info!(%id, "effect added");
                    for update in &defaults {
                        self.publish_parameter(update, None);
                    }
                    true
                }
                Err(error) => {
                    info!(conn, %error, "effect not added");
                    self.send_to(conn, UiEvent::Message(error.to_string()));
                    false
                }
            },
            ChainCommand::RemoveEffect { effect_id } => {
                match self.state.remove_effect(&effect_id, self.unmap_on_remove) {
                    Some(removal) => {
                        info!(id = %effect_id, "effect removed");
                        self.publish_axis_events(&removal.unmapped);
                        true
                    }
                    None => false,
                }
            }
            ChainCommand::ReorderEffect {
                effect_id,
                direction,
            } => self.state.chain.reorder_effect(&effect_id, direction),
            ChainCommand::ToggleBypass { effect_id } => {
                self.state.chain.bypass_solo().toggle_bypass(&effect_id)
            }
            ChainCommand::ToggleSolo { effect_id } => {
                self.state.chain.bypass_solo().toggle_solo(&effect_id)
            }
        };

        if changed {
            self.publish_chain();
        }
    }

    fn on_coordinates(&mut self, message: OscMessage) {
        let frame = match message.numeric_args().as_deref() {
            Some(&[x, y, z]) => [x, y, z],
            _ => {
                warn!(address = %message.address, args = ?message.args, "dropping malformed coordinate frame");
                return;
            }
        };
        debug!(?frame, "coordinate frame");

        self.sink.send(
            EngineChannel::Coordinates,
            OscMessage::new(
                EngineChannel::Coordinates.address(),
                frame.iter().copied().map(OscArg::Float).collect(),
            ),
        );
        self.broadcast(UiEvent::LeapData(frame), None);

        let updates = self.state.relay.on_coordinate_frame(
            &self.state.axes,
            &self.state.chain,
            &mut self.state.params,
            frame,
        );
        for update in &updates {
            self.publish_parameter(update, None);
        }
    }

    fn on_status(&mut self, message: OscMessage) {
        if self
            .state
            .relay
            .on_status_event(&message.address, &message.args)
            .is_some()
        {
            self.broadcast(UiEvent::LeapStatusUpdate(StatusFrame::from(&message)), None);
        }
    }

    fn publish_chain(&self) {
        let route = self.state.chain.route();
        debug!(route = ?route.to_map(), "route recomputed");
        self.send_json(EngineChannel::Route, &route);

        let payload = ChainPayload {
            effects: self.state.chain.effects(),
            route: &route,
        };
        match serde_json::to_value(&payload) {
            Ok(payload) => self.broadcast(
                UiEvent::Action(ActionEnvelope::new(IoType::Route, None, payload)),
                None,
            ),
            Err(error) => warn!(%error, "failed to encode chain echo"),
        }
    }

    fn publish_axis_events(&self, events: &[AxisEvent]) {
        for event in events {
            let (engine, flag, request) = match event {
                AxisEvent::Mapped { axis, target } => (
                    AxisMapPayload::mapped(*axis, target),
                    IoFlag::SetMap,
                    axis_request(*axis, Some(target)),
                ),
                AxisEvent::Unmapped { axis, previous } => (
                    AxisMapPayload::unmapped(previous.as_ref()),
                    IoFlag::RemoveMap,
                    axis_request(*axis, previous.as_ref()),
                ),
            };
            self.send_json(EngineChannel::AxisMap, &engine);
            match serde_json::to_value(&request) {
                Ok(payload) => self.broadcast(
                    UiEvent::Action(ActionEnvelope::new(IoType::XyzMap, Some(flag), payload)),
                    None,
                ),
                Err(error) => warn!(%error, "failed to encode axis echo"),
            }
        }
    }

    /// Engine always hears about the update. UI clients only do for updates
    /// that did not come from tracking, and never the client that made it.
    fn publish_parameter(&self, update: &ParameterUpdate, origin: Option<ConnectionId>) {
        let payload = update.payload();
        self.send_json(EngineChannel::Parameters, &payload);

        if update.source == UpdateSource::Spatial {
            return;
        }
        match serde_json::to_value(&payload) {
            Ok(payload) => self.broadcast(
                UiEvent::Action(ActionEnvelope::new(IoType::UpdateParameter, None, payload)),
                origin,
            ),
            Err(error) => warn!(%error, "failed to encode parameter echo"),
        }
    }

    fn send_json(&self, channel: EngineChannel, body: &impl Serialize) {
        match serde_json::to_string(body) {
            Ok(text) => self.sink.send(
                channel,
                OscMessage::new(channel.address(), vec![OscArg::Str(text)]),
            ),
            Err(error) => warn!(?channel, %error, "failed to encode engine datagram"),
        }
    }

    fn send_to(&self, conn: ConnectionId, event: UiEvent) {
        if let Some(client) = self.clients.get(&conn) {
            if client.outbound.try_send(event).is_err() {
                debug!(conn, "ui event dropped");
            }
        }
    }

    fn broadcast(&self, event: UiEvent, except: Option<ConnectionId>) {
        for (conn, client) in &self.clients {
            if Some(*conn) == except {
                continue;
            }
            if client.outbound.try_send(event.clone()).is_err() {
                debug!(conn, "ui event dropped");
            }
        }
    }
}

fn axis_request(axis: Axis, target: Option<&ParamTarget>) -> AxisMapRequest {
    AxisMapRequest {
        axis,
        effect_id: target.map(|target| target.effect_id.clone()),
        param_name: target.map(|target| target.param_name.clone()),
    }
}


#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
