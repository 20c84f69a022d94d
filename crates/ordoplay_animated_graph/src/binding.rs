// SPDX-License-Identifier: MIT OR Apache-2.0
//! Event-to-value bindings.
//!
//! A binding copies one number out of a view event's payload into a value
//! node, so scroll offsets or gesture positions drive animations without a
//! round trip through the host.

use crate::error::{AnimatedError, Result};
use crate::node::{NodeTag, ViewTag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scroll events also get bound to the event sent when dragging ends
const SCROLL_EVENT: &str = "topScroll";
const SCROLL_ENDED_EVENT: &str = "topScrollEnded";

/// Event dispatched by a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimatedEvent {
    /// Dispatching view
    pub view_tag: ViewTag,
    /// Event name, `topFoo` or `onFoo`
    pub name: String,
    /// Event payload
    pub payload: Value,
}

/// Mapping config of `add_animated_event_to_view`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMapping {
    /// Keys and array indices leading to the number
    pub native_event_path: Vec<String>,
    /// Value node receiving the number
    pub animated_value_tag: NodeTag,
}

impl EventMapping {
    /// Parse a host mapping map
    pub fn from_value(mapping: &Value) -> Result<Self> {
        Self::deserialize(mapping).map_err(AnimatedError::InvalidEventMapping)
    }
}

/// Maps `onFoo` handler names to the `topFoo` event names views dispatch
pub fn normalize_event_name(name: &str) -> String {
    match name.strip_prefix("on") {
        Some(rest) => format!("top{rest}"),
        None => name.to_string(),
    }
}

/// One (event, view) to value node binding
#[derive(Debug, Clone, PartialEq)]
pub struct EventBinding {
    /// Normalised event name
    pub event_name: String,
    /// View the event must come from
    pub view_tag: ViewTag,
    /// Path into the payload
    pub path: Vec<String>,
    /// Value node receiving the number
    pub node_tag: NodeTag,
}

impl EventBinding {
    /// Number at this binding's path, walking object keys and array indices
    pub fn extract(&self, payload: &Value) -> Option<f64> {
        let mut current = payload;
        for segment in &self.path {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        current.as_f64()
    }

    fn matches(&self, view_tag: ViewTag, event_name: &str) -> bool {
        self.view_tag == view_tag && self.event_name == event_name
    }
}

/// All bindings, in registration order
#[derive(Debug, Default)]
pub struct EventBindings {
    bindings: Vec<EventBinding>,
}

impl EventBindings {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding; `topScroll` also binds `topScrollEnded`
    pub fn add(&mut self, view_tag: ViewTag, event_name: &str, mapping: &EventMapping) {
        let event_name = normalize_event_name(event_name);
        self.bindings.push(EventBinding {
            event_name: event_name.clone(),
            view_tag,
            path: mapping.native_event_path.clone(),
            node_tag: mapping.animated_value_tag,
        });
        if event_name == SCROLL_EVENT {
            self.add(view_tag, SCROLL_ENDED_EVENT, mapping);
        }
    }

    /// Remove the first binding matching the exact triple; `topScroll` also
    /// removes its `topScrollEnded` twin
    pub fn remove(&mut self, view_tag: ViewTag, event_name: &str, node_tag: NodeTag) {
        let event_name = normalize_event_name(event_name);
        if let Some(index) = self
            .bindings
            .iter()
            .position(|b| b.matches(view_tag, &event_name) && b.node_tag == node_tag)
        {
            self.bindings.remove(index);
        }
        if event_name == SCROLL_EVENT {
            self.remove(view_tag, SCROLL_ENDED_EVENT, node_tag);
        }
    }

    /// Drop every binding feeding `node_tag`
    pub fn remove_for_node(&mut self, node_tag: NodeTag) {
        self.bindings.retain(|b| b.node_tag != node_tag);
    }

    /// Bindings for an event from a view
    pub fn matching<'a>(
        &'a self,
        view_tag: ViewTag,
        event_name: &'a str,
    ) -> impl Iterator<Item = &'a EventBinding> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.matches(view_tag, event_name))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
