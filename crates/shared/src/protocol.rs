use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{Axis, Direction, EffectId, EffectInstance, EffectType, ParamTarget, Route},
    error::ProtocolError,
    osc::OscMessage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    Route,
    XyzMap,
    UpdateParameter,
    AudioInput,
}

impl IoType {
    pub fn as_str(self) -> &'static str {
        match self {
            IoType::Route => "ROUTE",
            IoType::XyzMap => "XYZ_MAP",
            IoType::UpdateParameter => "UPDATE_PARAMETER",
            IoType::AudioInput => "AUDIO_INPUT",
        }
    }
}

impl FromStr for IoType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROUTE" => Ok(IoType::Route),
            "XYZ_MAP" => Ok(IoType::XyzMap),
            "UPDATE_PARAMETER" => Ok(IoType::UpdateParameter),
            "AUDIO_INPUT" => Ok(IoType::AudioInput),
            other => Err(ProtocolError::UnknownIoType(other.to_string())),
        }
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoFlag {
    SetMap,
    RemoveMap,
}

impl IoFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            IoFlag::SetMap => "SET_MAP",
            IoFlag::RemoveMap => "REMOVE_MAP",
        }
    }
}

impl FromStr for IoFlag {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SET_MAP" => Ok(IoFlag::SetMap),
            "REMOVE_MAP" => Ok(IoFlag::RemoveMap),
            other => Err(ProtocolError::UnknownIoFlag(other.to_string())),
        }
    }
}

/// Generic client envelope. `ioType` and `ioFlag` stay raw strings on the wire
/// so that unknown values can be logged and dropped instead of failing the
/// whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    #[serde(rename = "ioType")]
    pub io_type: String,
    #[serde(rename = "ioFlag", default, skip_serializing_if = "Option::is_none")]
    pub io_flag: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl ActionEnvelope {
    pub fn new(io_type: IoType, io_flag: Option<IoFlag>, payload: Value) -> Self {
        Self {
            io_type: io_type.as_str().to_string(),
            io_flag: io_flag.map(|flag| flag.as_str().to_string()),
            payload,
        }
    }

    pub fn decode(&self) -> Result<UiAction, ProtocolError> {
        let io_type: IoType = self.io_type.parse()?;
        match io_type {
            IoType::Route => {
                let command = payload_as(io_type, self.payload.clone())?;
                Ok(UiAction::Chain(command))
            }
            IoType::XyzMap => {
                let flag: IoFlag = self
                    .io_flag
                    .as_deref()
                    .ok_or(ProtocolError::MissingIoFlag("XYZ_MAP"))?
                    .parse()?;
                let payload: AxisMapRequest = payload_as(io_type, self.payload.clone())?;
                match flag {
                    IoFlag::SetMap => {
                        let effect_id = payload
                            .effect_id
                            .ok_or(ProtocolError::MissingField("effectID"))?;
                        let param_name = payload
                            .param_name
                            .ok_or(ProtocolError::MissingField("paramName"))?;
                        Ok(UiAction::SetMap {
                            axis: payload.axis,
                            target: ParamTarget {
                                effect_id,
                                param_name,
                            },
                        })
                    }
                    IoFlag::RemoveMap => Ok(UiAction::RemoveMap { axis: payload.axis }),
                }
            }
            IoType::UpdateParameter => {
                let update = payload_as(io_type, self.payload.clone())?;
                Ok(UiAction::UpdateParameter(update))
            }
            IoType::AudioInput => match &self.payload {
                Value::String(choice) => Ok(UiAction::AudioInput(choice.clone())),
                other => Ok(UiAction::AudioInput(other.to_string())),
            },
        }
    }
}

fn payload_as<T: DeserializeOwned>(
    io_type: IoType,
    payload: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        io_type: io_type.as_str(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Chain(ChainCommand),
    SetMap { axis: Axis, target: ParamTarget },
    RemoveMap { axis: Axis },
    UpdateParameter(ParameterPayload),
    AudioInput(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChainCommand {
    AddEffect {
        #[serde(rename = "effectType")]
        effect_type: EffectType,
    },
    RemoveEffect {
        #[serde(rename = "effectID")]
        effect_id: EffectId,
    },
    ReorderEffect {
        #[serde(rename = "effectID")]
        effect_id: EffectId,
        direction: Direction,
    },
    ToggleBypass {
        #[serde(rename = "effectID")]
        effect_id: EffectId,
    },
    ToggleSolo {
        #[serde(rename = "effectID")]
        effect_id: EffectId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMapRequest {
    pub axis: Axis,
    #[serde(rename = "effectID", default, skip_serializing_if = "Option::is_none")]
    pub effect_id: Option<EffectId>,
    #[serde(rename = "paramName", default, skip_serializing_if = "Option::is_none")]
    pub param_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPayload {
    #[serde(rename = "effectID")]
    pub effect_id: EffectId,
    #[serde(rename = "paramName")]
    pub param_name: String,
    #[serde(rename = "paramValue")]
    pub param_value: f32,
}

/// Axis map datagram body. `axis` is `"n"` when the binding is void.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMapPayload {
    #[serde(rename = "effectID")]
    pub effect_id: Option<EffectId>,
    pub param: Option<String>,
    pub axis: String,
}

impl AxisMapPayload {
    pub const UNMAPPED: &'static str = "n";

    pub fn mapped(axis: Axis, target: &ParamTarget) -> Self {
        Self {
            effect_id: Some(target.effect_id.clone()),
            param: Some(target.param_name.clone()),
            axis: axis.as_str().to_string(),
        }
    }

    pub fn unmapped(previous: Option<&ParamTarget>) -> Self {
        Self {
            effect_id: previous.map(|target| target.effect_id.clone()),
            param: previous.map(|target| target.param_name.clone()),
            axis: Self::UNMAPPED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainPayload<'a> {
    pub effects: &'a [EffectInstance],
    pub route: &'a Route,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusFrame {
    pub address: String,
    pub args: Vec<Value>,
}

impl From<&OscMessage> for StatusFrame {
    fn from(message: &OscMessage) -> Self {
        Self {
            address: message.address.clone(),
            args: message.args.iter().map(|arg| arg.to_json()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum UiEvent {
    #[serde(rename = "action")]
    Action(ActionEnvelope),
    #[serde(rename = "leapData")]
    LeapData([f32; 3]),
    #[serde(rename = "leapStatusUpdate")]
    LeapStatusUpdate(StatusFrame),
    #[serde(rename = "message")]
    Message(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineChannel {
    Route,
    Parameters,
    AudioInput,
    Coordinates,
    AxisMap,
}

impl EngineChannel {
    pub const ALL: [EngineChannel; 5] = [
        EngineChannel::Route,
        EngineChannel::Parameters,
        EngineChannel::AudioInput,
        EngineChannel::Coordinates,
        EngineChannel::AxisMap,
    ];

    pub fn address(self) -> &'static str {
        match self {
            EngineChannel::Route => "/route",
            EngineChannel::Parameters => "/params",
            EngineChannel::AudioInput => "/audioIn",
            EngineChannel::Coordinates => "/coords",
            EngineChannel::AxisMap => "/xyzMap",
        }
    }
}
