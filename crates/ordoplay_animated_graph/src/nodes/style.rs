// SPDX-License-Identifier: MIT OR Apache-2.0
//! Style node.

use crate::error::Result;
use crate::graph::Lookup;
use crate::node::{NodeKind, NodeTag};
use crate::value::PropMap;
use indexmap::IndexMap;
use serde::Deserialize;

/// Style property name to node mapping
#[derive(Debug, Clone, Deserialize)]
pub struct StyleNode {
    /// Mapped nodes by style property
    pub style: IndexMap<String, NodeTag>,
}

impl StyleNode {
    /// Collect the current style values.
    ///
    /// A transform node always lands under the `transform` key.
    pub(crate) fn collect(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<PropMap> {
        let mut props = PropMap::new();
        for (name, input) in &self.style {
            let node = lookup.node(*input)?;
            let key = match node.kind {
                NodeKind::Transform(_) => "transform",
                _ => name.as_str(),
            };
            props.insert(key.to_string(), lookup.prop(tag, *input)?);
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeGraph;
    use crate::node::AnimatedNode;
    use crate::value::PropValue;
    use serde_json::json;

    #[test]
    fn test_collects_values_and_transform() {
        let mut graph = NodeGraph::new();
        for (tag, config) in [
            (1, json!({"type": "value", "value": 0.5})),
            (2, json!({"type": "transform", "transforms": [
                {"property": "scale", "type": "animated", "nodeTag": 1}
            ]})),
        ] {
            graph
                .add_node(AnimatedNode::from_config(NodeTag(tag), &config).unwrap())
                .unwrap();
        }
        let style: StyleNode =
            serde_json::from_value(json!({"style": {"opacity": 1, "transforms": 2}})).unwrap();

        let props = style.collect(NodeTag(3), &graph.lookup()).unwrap();
        assert_eq!(props["opacity"], PropValue::Number(0.5));
        assert!(matches!(props["transform"], PropValue::Array(_)));
        assert!(!props.contains_key("transforms"));
    }

    #[test]
    fn test_missing_mapped_node() {
        let graph = NodeGraph::new();
        let style: StyleNode = serde_json::from_value(json!({"style": {"opacity": 9}})).unwrap();
        assert!(style.collect(NodeTag(3), &graph.lookup()).is_err());
    }
}
