// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transform node.

use crate::error::Result;
use crate::graph::Lookup;
use crate::node::NodeTag;
use crate::value::{PropMap, PropValue};
use serde::Deserialize;
use serde_json::Value;

/// One entry of a transform list
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransformEntry {
    /// Driven by a value node
    Animated {
        /// Transform property, e.g. `translateX`
        property: String,
        /// Value node
        #[serde(rename = "nodeTag")]
        node_tag: NodeTag,
    },
    /// Fixed value
    Static {
        /// Transform property
        property: String,
        /// Value
        value: Value,
    },
}

/// Ordered list of transform entries
#[derive(Debug, Clone, Deserialize)]
pub struct TransformNode {
    /// Entries, applied in order
    pub transforms: Vec<TransformEntry>,
}

impl TransformNode {
    /// Collect entries into `[{property: value}, ...]`
    pub(crate) fn collect(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<PropValue> {
        self.transforms
            .iter()
            .map(|entry| {
                let (property, value) = match entry {
                    TransformEntry::Animated { property, node_tag } => {
                        (property, lookup.value_prop(tag, *node_tag)?)
                    }
                    TransformEntry::Static { property, value } => (property, PropValue::from(value)),
                };
                let mut map = PropMap::new();
                map.insert(property.clone(), value);
                Ok(PropValue::Map(map))
            })
            .collect::<Result<Vec<_>>>()
            .map(PropValue::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeGraph;
    use crate::node::AnimatedNode;
    use serde_json::json;

    #[test]
    fn test_collects_in_order() {
        let mut graph = NodeGraph::new();
        graph
            .add_node(AnimatedNode::from_config(NodeTag(1), &json!({"type": "value", "value": 12.0})).unwrap())
            .unwrap();
        let node: TransformNode = serde_json::from_value(json!({
            "transforms": [
                {"property": "translateX", "type": "animated", "nodeTag": 1},
                {"property": "rotate", "type": "static", "value": "45deg"},
            ]
        }))
        .unwrap();

        let collected = node.collect(NodeTag(2), &graph.lookup()).unwrap();
        assert_eq!(
            serde_json::to_value(&collected).unwrap(),
            json!([{"translateX": 12.0}, {"rotate": "45deg"}])
        );
    }
}
