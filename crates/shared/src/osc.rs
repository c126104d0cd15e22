use rosc::{decoder, encoder, OscPacket, OscType};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum OscError {
    #[error("malformed osc packet: {0}")]
    Malformed(String),
    #[error("unsupported osc argument type {0}")]
    UnsupportedType(&'static str),
}

impl From<rosc::OscError> for OscError {
    fn from(error: rosc::OscError) -> Self {
        OscError::Malformed(format!("{error:?}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Double(f64),
    Str(String),
    Bool(bool),
    Nil,
}

impl OscArg {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            OscArg::Int(v) => Some(*v as f32),
            OscArg::Float(v) => Some(*v),
            OscArg::Double(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OscArg::Bool(v) => Some(*v),
            OscArg::Int(v) => Some(*v != 0),
            OscArg::Float(v) => Some(*v != 0.0),
            OscArg::Double(v) => Some(*v != 0.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscArg::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            OscArg::Int(v) => Value::from(*v),
            OscArg::Float(v) => Value::from(*v),
            OscArg::Double(v) => Value::from(*v),
            OscArg::Str(v) => Value::from(v.as_str()),
            OscArg::Bool(v) => Value::from(*v),
            OscArg::Nil => Value::Null,
        }
    }
}

impl From<OscArg> for OscType {
    fn from(arg: OscArg) -> Self {
        match arg {
            OscArg::Int(v) => OscType::Int(v),
            OscArg::Float(v) => OscType::Float(v),
            OscArg::Double(v) => OscType::Double(v),
            OscArg::Str(v) => OscType::String(v),
            OscArg::Bool(v) => OscType::Bool(v),
            OscArg::Nil => OscType::Nil,
        }
    }
}

impl TryFrom<OscType> for OscArg {
    type Error = OscError;

    fn try_from(value: OscType) -> Result<Self, Self::Error> {
        let arg = match value {
            OscType::Int(v) => OscArg::Int(v),
            OscType::Float(v) => OscArg::Float(v),
            OscType::Double(v) => OscArg::Double(v),
            OscType::String(v) => OscArg::Str(v),
            OscType::Bool(v) => OscArg::Bool(v),
            OscType::Nil => OscArg::Nil,
            OscType::Blob(_) => return Err(OscError::UnsupportedType("blob")),
            _ => return Err(OscError::UnsupportedType("extended")),
        };
        Ok(arg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, OscError> {
        let packet = OscPacket::Message(rosc::OscMessage {
            addr: self.address.clone(),
            args: self.args.iter().cloned().map(OscType::from).collect(),
        });
        Ok(encoder::encode(&packet)?)
    }

    pub fn numeric_args(&self) -> Option<Vec<f32>> {
        self.args.iter().map(OscArg::as_f32).collect()
    }
}

/// Decodes one UDP payload, flattening bundles. Time tags are ignored.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<OscMessage>, OscError> {
    let (_, packet) = decoder::decode_udp(bytes)?;
    let mut messages = Vec::new();
    flatten(packet, &mut messages)?;
    Ok(messages)
}

fn flatten(packet: OscPacket, messages: &mut Vec<OscMessage>) -> Result<(), OscError> {
    match packet {
        OscPacket::Message(message) => {
            if !message.addr.starts_with('/') {
                return Err(OscError::Malformed(format!("bad address {:?}", message.addr)));
            }
            let args = message
                .args
                .into_iter()
                .map(OscArg::try_from)
                .collect::<Result<_, _>>()?;
            messages.push(OscMessage::new(message.addr, args));
        }
        OscPacket::Bundle(bundle) => {
            for element in bundle.content {
                flatten(element, messages)?;
            }
        }
    }
    Ok(())
}
