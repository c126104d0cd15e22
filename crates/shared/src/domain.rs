use std::{collections::BTreeMap, fmt};

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

name_newtype!(EffectId);
name_newtype!(EffectType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamTarget {
    #[serde(rename = "effectID")]
    pub effect_id: EffectId,
    #[serde(rename = "paramName")]
    pub param_name: String,
}

impl ParamTarget {
    pub fn new(effect_id: impl Into<EffectId>, param_name: impl Into<String>) -> Self {
        Self {
            effect_id: effect_id.into(),
            param_name: param_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectInstance {
    #[serde(rename = "effectID")]
    pub id: EffectId,
    #[serde(rename = "effectType")]
    pub effect_type: EffectType,
    #[serde(rename = "isBypassed")]
    pub is_bypassed: bool,
    #[serde(rename = "isSoloing")]
    pub is_soloing: bool,
}

impl EffectInstance {
    pub fn new(id: EffectId, effect_type: EffectType) -> Self {
        Self {
            id,
            effect_type,
            is_bypassed: false,
            is_soloing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteNode {
    Input,
    Effect(EffectId),
    Output,
}

impl RouteNode {
    pub fn label(&self) -> &str {
        match self {
            RouteNode::Input => "input",
            RouteNode::Effect(id) => id.as_str(),
            RouteNode::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    edges: Vec<(RouteNode, RouteNode)>,
}

impl Route {
    pub fn through(ids: impl IntoIterator<Item = EffectId>) -> Self {
        let mut edges = Vec::new();
        let mut from = RouteNode::Input;
        for id in ids {
            let to = RouteNode::Effect(id);
            edges.push((from, to.clone()));
            from = to;
        }
        edges.push((from, RouteNode::Output));
        Self { edges }
    }

    pub fn edges(&self) -> &[(RouteNode, RouteNode)] {
        &self.edges
    }

    pub fn effect_ids(&self) -> impl Iterator<Item = &EffectId> {
        self.edges.iter().filter_map(|(_, to)| match to {
            RouteNode::Effect(id) => Some(id),
            _ => None,
        })
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.edges
            .iter()
            .map(|(from, to)| (from.label().to_string(), to.label().to_string()))
            .collect()
    }
}

impl Default for Route {
    fn default() -> Self {
        Self::through(std::iter::empty())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.edges.len()))?;
        for (from, to) in &self.edges {
            map.serialize_entry(from.label(), to.label())?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 20.0,
            depth: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub dimensions: Dimensions,
    #[serde(rename = "isConnected")]
    pub is_connected: bool,
    #[serde(rename = "isInBounds")]
    pub is_in_bounds: bool,
    #[serde(rename = "isTracking")]
    pub is_tracking: bool,
}
