//! Bridge between [`serde_json::Value`] and graph values.

use serde_json::{Map, Value as Json};

use crate::error::NodeError;
use crate::node::{Node, NodeData};
use crate::value::Value;

impl Value {
    /// Builds a fresh graph from JSON. Every object and array becomes a new node.
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::number(n.clone()),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Node(Node::array_from(items.iter().map(Value::from_json))),
            Json::Object(map) => Value::Node(Node::object_from(
                map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))),
            )),
        }
    }

    /// Renders the value as JSON. Sets become arrays of members and maps
    /// become arrays of `[key, value]` pairs.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::String(s) => Json::String(s.clone()),
            Value::Node(node) => node.to_json(),
        }
    }
}

impl Node {
    /// Like [`Value::from_json`], for a JSON object or array.
    pub fn from_json(json: &Json) -> Result<Node, NodeError> {
        Value::from_json(json).into_node().ok_or(NodeError::NotANode)
    }

    pub fn to_json(&self) -> Json {
        match &*self.data() {
            NodeData::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json());
                }
                Json::Object(out)
            }
            NodeData::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            NodeData::Set(members) => Json::Array(members.iter().map(Value::to_json).collect()),
            NodeData::Map(entries) => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(&json)
    }
}
