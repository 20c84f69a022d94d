// SPDX-License-Identifier: MIT OR Apache-2.0
//! Object node.

use crate::error::{AnimatedError, Result};
use crate::graph::Lookup;
use crate::node::{NodeTag, NodeType};
use crate::value::{PropMap, PropValue};
use serde::Deserialize;
use serde_json::Value;

/// Key marking a template leaf to substitute
const NODE_TAG_KEY: &str = "nodeTag";

/// Template whose `{"nodeTag": N}` leaves are replaced with node values
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectNode {
    /// Template, usually a map or an array
    pub value: Value,
}

impl ObjectNode {
    /// Substitute the template
    pub(crate) fn collect(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<PropValue> {
        substitute(tag, &self.value, lookup)
    }
}

fn substitute(tag: NodeTag, value: &Value, lookup: &Lookup<'_>) -> Result<PropValue> {
    match value {
        Value::Object(map) => {
            let leaf = map
                .get(NODE_TAG_KEY)
                .filter(|leaf| leaf.is_i64() || leaf.is_u64());
            if let Some(leaf) = leaf {
                let input = NodeTag::deserialize(leaf).map_err(|source| {
                    AnimatedError::InvalidNodeConfig {
                        node_type: NodeType::Object,
                        source,
                    }
                })?;
                if lookup.node(input).is_err() {
                    return Err(AnimatedError::IllegalInput { tag, input });
                }
                return lookup.prop(tag, input);
            }
            let mut props = PropMap::new();
            for (key, value) in map {
                props.insert(key.clone(), substitute(tag, value, lookup)?);
            }
            Ok(PropValue::Map(props))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| substitute(tag, item, lookup))
            .collect::<Result<Vec<_>>>()
            .map(PropValue::Array),
        other => Ok(PropValue::from(other)),
    }
}
