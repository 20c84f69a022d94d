// SPDX-License-Identifier: MIT OR Apache-2.0
//! Props node.

use crate::error::Result;
use crate::graph::Lookup;
use crate::node::{decode, NodeKind, NodeTag, NodeType, ViewTag};
use crate::value::{PropMap, PropValue};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct PropsConfig {
    props: IndexMap<String, NodeTag>,
}

/// Aggregates style and value nodes into the props of connected views
#[derive(Debug, Clone)]
pub struct PropsNode {
    /// Mapped nodes by prop name
    pub props: IndexMap<String, NodeTag>,
    views: IndexSet<ViewTag>,
    last_props: PropMap,
}

impl PropsNode {
    /// Build from a host config map
    pub fn from_config(config: &Value) -> Result<Self> {
        let config: PropsConfig = decode(NodeType::Props, config)?;
        Ok(Self {
            props: config.props,
            views: IndexSet::new(),
            last_props: PropMap::new(),
        })
    }

    /// Start applying props to `view`
    pub fn connect_view(&mut self, view: ViewTag) {
        self.views.insert(view);
    }

    /// Stop applying props to `view`; returns whether it was connected
    pub fn disconnect_view(&mut self, view: ViewTag) -> bool {
        self.views.shift_remove(&view)
    }

    /// Connected views
    pub fn views(&self) -> impl Iterator<Item = ViewTag> + '_ {
        self.views.iter().copied()
    }

    /// Whether any view is connected
    pub fn has_views(&self) -> bool {
        !self.views.is_empty()
    }

    /// Props sent by the last update
    pub fn last_props(&self) -> &PropMap {
        &self.last_props
    }

    pub(crate) fn set_last_props(&mut self, props: PropMap) {
        self.last_props = props;
    }

    /// Collect the current props; style maps are merged in
    pub(crate) fn collect(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<PropMap> {
        let mut props = PropMap::new();
        for (name, input) in &self.props {
            let node = lookup.node(*input)?;
            match &node.kind {
                NodeKind::Style(style) => props.extend(style.collect(*input, lookup)?),
                _ => {
                    props.insert(name.clone(), lookup.prop(tag, *input)?);
                }
            }
        }
        Ok(props)
    }

    /// Props that reset every previously sent key, or `None` without views
    pub(crate) fn restore_defaults(&mut self) -> Option<PropMap> {
        if self.views.is_empty() {
            return None;
        }
        for value in self.last_props.values_mut() {
            *value = PropValue::Null;
        }
        Some(self.last_props.clone())
    }
}
