// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animated nodes manager.
//!
//! Owns the node arena, the active drivers and the event bindings, and runs
//! propagation on every frame. All commands are synchronous: they either
//! succeed or return an error and leave the graph usable.

use crate::binding::{normalize_event_name, AnimatedEvent, EventBindings, EventMapping};
use crate::driver::{AnimationDriver, AnimationId};
use crate::error::{AnimatedError, Result};
use crate::evaluation::{check, ConsistencyPolicy, PassStats, Propagation};
use crate::graph::NodeGraph;
use crate::node::{AnimatedNode, NodeKind, NodeTag, NodeType, ValueState, ViewTag};
use crate::nodes::{AnimationRestart, PropsNode};
use crate::notify::{
    report_ends, AnimationEndChannel, HostEvent, HostEventEmitter, PropsSink, ValueReply,
};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// Runs an animated node graph on behalf of a host
pub struct AnimatedNodesManager {
    graph: NodeGraph,
    drivers: IndexMap<AnimationId, AnimationDriver>,
    /// Nodes changed by commands since the last frame
    dirty: IndexSet<NodeTag>,
    bindings: EventBindings,
    propagation: Propagation,
    policy: ConsistencyPolicy,
    last_pass: PassStats,
    sink: Box<dyn PropsSink + Send>,
    emitter: Box<dyn HostEventEmitter + Send>,
}

impl std::fmt::Debug for AnimatedNodesManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedNodesManager")
            .field("nodes", &self.graph.len())
            .field("drivers", &self.drivers.len())
            .field("dirty", &self.dirty)
            .field("bindings", &self.bindings.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AnimatedNodesManager {
    /// Create a manager applying props to `sink` and emitting host events to
    /// `emitter`
    pub fn new(
        sink: impl PropsSink + Send + 'static,
        emitter: impl HostEventEmitter + Send + 'static,
    ) -> Self {
        Self {
            graph: NodeGraph::new(),
            drivers: IndexMap::new(),
            dirty: IndexSet::new(),
            bindings: EventBindings::new(),
            propagation: Propagation::default(),
            policy: ConsistencyPolicy::default(),
            last_pass: PassStats::default(),
            sink: Box::new(sink),
            emitter: Box::new(emitter),
        }
    }

    /// Builder-style policy override
    pub fn with_policy(mut self, policy: ConsistencyPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy applied to inconsistent passes
    pub fn policy(&self) -> ConsistencyPolicy {
        self.policy
    }

    /// Change the policy applied to inconsistent passes
    pub fn set_policy(&mut self, policy: ConsistencyPolicy) {
        self.policy = policy;
    }

    /// Node arena
    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Node by tag
    pub fn node(&self, tag: NodeTag) -> Option<&AnimatedNode> {
        self.graph.node(tag)
    }

    /// Active drivers, in start order
    pub fn drivers(&self) -> impl Iterator<Item = &AnimationDriver> {
        self.drivers.values()
    }

    /// Registered event bindings
    pub fn bindings(&self) -> &EventBindings {
        &self.bindings
    }

    /// Counts of the last propagation pass
    pub fn last_pass(&self) -> PassStats {
        self.last_pass
    }

    /// Whether the next frame has work to do
    pub fn has_active_animations(&self) -> bool {
        !self.drivers.is_empty() || !self.dirty.is_empty()
    }

    // Structure

    /// Create a node from a host config map
    pub fn create_animated_node(&mut self, tag: NodeTag, config: &Value) -> Result<()> {
        if self.graph.contains(tag) {
            return Err(AnimatedError::NodeAlreadyExists(tag));
        }
        let node = AnimatedNode::from_config(tag, config)?;
        tracing::debug!("Created animated node {}", node.pretty_print());
        self.graph.add_node(node)?;
        self.dirty.insert(tag);
        Ok(())
    }

    /// Replace the config of an interpolation or object node.
    ///
    /// Drivers on the node are stopped. Other node types are left untouched.
    pub fn update_animated_node_config(&mut self, tag: NodeTag, config: &Value) -> Result<()> {
        let node_type = self.graph.require(tag)?.node_type();
        if !matches!(node_type, NodeType::Interpolation | NodeType::Object) {
            tracing::debug!("Ignoring config update of {} node [{}]", node_type, tag);
            return Ok(());
        }
        self.stop_animations_for_node(tag);
        self.graph.require_mut(tag)?.update_config(config)?;
        self.dirty.insert(tag);
        Ok(())
    }

    /// Drop a node, its edges, its event bindings and the drivers animating
    /// it; unknown tags are ignored
    pub fn drop_animated_node(&mut self, tag: NodeTag) {
        if self.graph.remove_node(tag).is_none() {
            return;
        }
        self.dirty.shift_remove(&tag);
        self.bindings.remove_for_node(tag);
        self.stop_animations_for_node(tag);
        tracing::debug!("Dropped animated node [{}]", tag);
    }

    /// Add the edge `parent -> child`
    pub fn connect_animated_nodes(&mut self, parent: NodeTag, child: NodeTag) -> Result<()> {
        self.graph.connect(parent, child)?;
        self.dirty.insert(child);
        Ok(())
    }

    /// Remove the edge `parent -> child`
    pub fn disconnect_animated_nodes(&mut self, parent: NodeTag, child: NodeTag) -> Result<()> {
        self.graph.disconnect(parent, child)?;
        self.dirty.insert(child);
        Ok(())
    }

    /// Start applying a props node to a view
    pub fn connect_animated_node_to_view(&mut self, tag: NodeTag, view: ViewTag) -> Result<()> {
        self.props_mut(tag)?.connect_view(view);
        self.dirty.insert(tag);
        Ok(())
    }

    /// Stop applying a props node to a view
    pub fn disconnect_animated_node_from_view(&mut self, tag: NodeTag, view: ViewTag) -> Result<()> {
        if !self.props_mut(tag)?.disconnect_view(view) {
            return Err(AnimatedError::ViewNotConnected { tag, view });
        }
        Ok(())
    }

    /// Send null for every prop last applied by a props node, so the views
    /// fall back to their own defaults
    pub fn restore_default_values(&mut self, tag: NodeTag) -> Result<()> {
        if !self.graph.contains(tag) {
            return Ok(());
        }
        let props = self.props_mut(tag)?;
        let Some(restored) = props.restore_defaults() else {
            return Ok(());
        };
        let views: Vec<_> = props.views().collect();
        let mut first_error = None;
        for view in views {
            if let Err(e) = self.sink.apply_props(view, &restored) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn props_mut(&mut self, tag: NodeTag) -> Result<&mut PropsNode> {
        let node = self.graph.require_mut(tag)?;
        let found = node.node_type();
        match &mut node.kind {
            NodeKind::Props(props) => Ok(props),
            _ => Err(AnimatedError::WrongNodeType {
                tag,
                expected: "props",
                found,
            }),
        }
    }

    fn value_state_mut(&mut self, tag: NodeTag) -> Result<&mut ValueState> {
        self.graph.require_mut(tag)?.value_state_mut()
    }

    // Values

    /// Overwrite the raw value; drivers on the node are stopped
    pub fn set_animated_node_value(&mut self, tag: NodeTag, value: f64) -> Result<()> {
        self.value_state_mut(tag)?;
        self.stop_animations_for_node(tag);
        self.value_state_mut(tag)?.value = value;
        self.dirty.insert(tag);
        Ok(())
    }

    /// Overwrite the offset
    pub fn set_animated_node_offset(&mut self, tag: NodeTag, offset: f64) -> Result<()> {
        self.value_state_mut(tag)?.offset = offset;
        self.dirty.insert(tag);
        Ok(())
    }

    /// Merge the offset into the value
    pub fn flatten_animated_node_offset(&mut self, tag: NodeTag) -> Result<()> {
        self.value_state_mut(tag)?.flatten_offset();
        Ok(())
    }

    /// Move the value into the offset
    pub fn extract_animated_node_offset(&mut self, tag: NodeTag) -> Result<()> {
        self.value_state_mut(tag)?.extract_offset();
        Ok(())
    }

    /// Effective value of a value-like node
    pub fn value_of(&self, tag: NodeTag) -> Result<f64> {
        self.graph.value(tag)
    }

    /// Read the effective value and reply through `reply`
    pub fn get_value(&mut self, tag: NodeTag, reply: ValueReply) -> Result<()> {
        let value = self.graph.value(tag)?;
        match reply {
            ValueReply::Callback(callback) => callback(value),
            ValueReply::Emit => self.emitter.emit(HostEvent::GetValue { tag, value }),
        }
        Ok(())
    }

    /// Call `listener` with the effective value after every update of a node
    pub fn start_listening_to_animated_node_value(
        &mut self,
        tag: NodeTag,
        listener: impl FnMut(f64) + Send + 'static,
    ) -> Result<()> {
        self.value_state_mut(tag)?.listener = Some(Box::new(listener));
        Ok(())
    }

    /// Remove the value listener of a node
    pub fn stop_listening_to_animated_node_value(&mut self, tag: NodeTag) -> Result<()> {
        self.value_state_mut(tag)?.listener = None;
        Ok(())
    }

    // Animations

    /// Start a driver on a value-like node.
    ///
    /// Reusing the id of a running animation reconfigures it in place and
    /// keeps its original end channel.
    pub fn start_animating_node(
        &mut self,
        animation_id: AnimationId,
        tag: NodeTag,
        config: &Value,
        end: AnimationEndChannel,
    ) -> Result<()> {
        self.graph.require(tag)?.value_state()?;
        if let Some(driver) = self.drivers.get_mut(&animation_id) {
            driver.reset_config(config)?;
            return Ok(());
        }
        let driver = AnimationDriver::new(animation_id, tag, config, end)?;
        tracing::debug!(
            "Starting {} animation {} on node [{}]",
            driver.model().driver_type().name(),
            animation_id,
            tag
        );
        self.drivers.insert(animation_id, driver);
        Ok(())
    }

    /// Stop an animation, reporting `finished: false`; unknown ids are ignored
    pub fn stop_animation(&mut self, animation_id: AnimationId) {
        let Some(driver) = self.drivers.shift_remove(&animation_id) else {
            return;
        };
        let value = self.raw_value(driver.node_tag);
        report_ends(vec![driver.into_end(false, value)], self.emitter.as_mut());
    }

    fn stop_animations_for_node(&mut self, tag: NodeTag) {
        let ids: Vec<_> = self
            .drivers
            .values()
            .filter(|driver| driver.node_tag == tag)
            .map(|driver| driver.id)
            .collect();
        if ids.is_empty() {
            return;
        }
        let value = self.raw_value(tag);
        let ends = ids
            .into_iter()
            .filter_map(|id| self.drivers.shift_remove(&id))
            .map(|driver| driver.into_end(false, value))
            .collect();
        report_ends(ends, self.emitter.as_mut());
    }

    fn raw_value(&self, tag: NodeTag) -> f64 {
        self.graph
            .node(tag)
            .and_then(|node| node.value.as_ref())
            .map_or(0.0, |state| state.value)
    }

    fn apply_restarts(&mut self, restarts: Vec<AnimationRestart>) {
        for restart in restarts {
            if let Err(e) = self.start_animating_node(
                restart.animation_id,
                restart.node_tag,
                &restart.config,
                AnimationEndChannel::Emit,
            ) {
                tracing::warn!(
                    "Failed to restart tracked animation {}: {}",
                    restart.animation_id,
                    e
                );
            }
        }
    }

    // Events

    /// Bind a number in a view event's payload to a value node
    pub fn add_animated_event_to_view(
        &mut self,
        view: ViewTag,
        event_name: &str,
        mapping: &Value,
    ) -> Result<()> {
        let mapping = EventMapping::from_value(mapping)?;
        self.graph
            .require(mapping.animated_value_tag)?
            .value_state()?;
        self.bindings.add(view, event_name, &mapping);
        Ok(())
    }

    /// Remove a binding added by [`Self::add_animated_event_to_view`]
    pub fn remove_animated_event_from_view(
        &mut self,
        view: ViewTag,
        event_name: &str,
        node_tag: NodeTag,
    ) {
        self.bindings.remove(view, event_name, node_tag);
    }

    /// Feed a view event through the bindings and propagate right away.
    ///
    /// Returns whether any binding matched. Every matching binding is
    /// processed; the first failure is returned afterwards.
    pub fn on_event_dispatch(&mut self, event: &AnimatedEvent) -> Result<bool> {
        let name = normalize_event_name(&event.name);
        let matching: Vec<_> = self
            .bindings
            .matching(event.view_tag, &name)
            .cloned()
            .collect();
        if matching.is_empty() {
            return Ok(false);
        }

        let mut seeds = Vec::with_capacity(matching.len());
        let mut first_error = None;
        for binding in &matching {
            self.stop_animations_for_node(binding.node_tag);
            let Some(value) = binding.extract(&event.payload) else {
                first_error.get_or_insert(AnimatedError::EventPath {
                    event: name.clone(),
                    path: binding.path.clone(),
                });
                continue;
            };
            match self.value_state_mut(binding.node_tag) {
                Ok(state) => {
                    state.value = value;
                    seeds.push(binding.node_tag);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        let result = self.propagate(&seeds);
        match first_error {
            Some(error) => Err(error),
            None => result.map(|()| true),
        }
    }

    // Frames

    /// Advance every driver to `frame_time_nanos` and propagate changes
    pub fn run_updates(&mut self, frame_time_nanos: i64) -> Result<()> {
        let mut seeds: Vec<_> = self.dirty.drain(..).collect();

        for driver in self.drivers.values_mut() {
            let Some(state) = self
                .graph
                .node_mut(driver.node_tag)
                .and_then(|node| node.value.as_mut())
            else {
                tracing::warn!(
                    "Animation {} targets missing node [{}]",
                    driver.id,
                    driver.node_tag
                );
                continue;
            };
            driver.run_animation_step(frame_time_nanos, state);
            seeds.push(driver.node_tag);
        }

        let result = self.propagate(&seeds);

        // Tracking restarts may have revived a finished driver
        let finished: Vec<_> = self
            .drivers
            .values()
            .filter(|driver| driver.has_finished())
            .map(|driver| driver.id)
            .collect();
        if !finished.is_empty() {
            let mut ends = Vec::with_capacity(finished.len());
            for id in finished {
                if let Some(driver) = self.drivers.shift_remove(&id) {
                    let value = self.raw_value(driver.node_tag);
                    ends.push(driver.into_end(true, value));
                }
            }
            report_ends(ends, self.emitter.as_mut());
        }
        result
    }

    fn propagate(&mut self, seeds: &[NodeTag]) -> Result<()> {
        let mut outcome =
            self.propagation
                .update_nodes(&mut self.graph, seeds, self.sink.as_mut(), self.policy);
        self.last_pass = outcome.stats;
        self.apply_restarts(std::mem::take(&mut outcome.restarts));
        check(&mut outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::notify::AnimationEnd;
    use crate::value::{PropMap, PropValue};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    type Applied = Arc<Mutex<Vec<(ViewTag, PropMap)>>>;
    type Emitted = Arc<Mutex<Vec<HostEvent>>>;

    struct Sink(Applied);

    impl PropsSink for Sink {
        fn apply_props(&mut self, view: ViewTag, props: &PropMap) -> std::result::Result<(), SinkError> {
            self.0.lock().push((view, props.clone()));
            Ok(())
        }
    }

    struct Emitter(Emitted);

    impl HostEventEmitter for Emitter {
        fn emit(&mut self, event: HostEvent) {
            self.0.lock().push(event);
        }
    }

    fn manager() -> (AnimatedNodesManager, Applied, Emitted) {
        let applied = Applied::default();
        let emitted = Emitted::default();
        let manager = AnimatedNodesManager::new(
            Sink(Arc::clone(&applied)),
            Emitter(Arc::clone(&emitted)),
        );
        (manager, applied, emitted)
    }

    const FRAME: i64 = 16_666_667;

    #[test]
    fn test_create_marks_dirty() {
        let (mut manager, _, _) = manager();
        assert!(!manager.has_active_animations());
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 1.0}))
            .unwrap();
        assert!(manager.has_active_animations());
        manager.run_updates(0).unwrap();
        assert!(!manager.has_active_animations());
    }

    #[test]
    fn test_create_existing_tag_fails() {
        let (mut manager, _, _) = manager();
        let config = json!({"type": "value"});
        manager.create_animated_node(NodeTag(1), &config).unwrap();
        assert!(matches!(
            manager.create_animated_node(NodeTag(1), &config),
            Err(AnimatedError::NodeAlreadyExists(NodeTag(1)))
        ));
        assert!(matches!(
            manager.create_animated_node(NodeTag(2), &json!({"type": "spline"})),
            Err(AnimatedError::UnsupportedNodeType(_))
        ));
    }

    #[test]
    fn test_set_value_on_wrong_node() {
        let (mut manager, _, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "style", "style": {}}))
            .unwrap();
        assert!(matches!(
            manager.set_animated_node_value(NodeTag(1), 1.0),
            Err(AnimatedError::WrongNodeType { .. })
        ));
        assert!(matches!(
            manager.set_animated_node_value(NodeTag(2), 1.0),
            Err(AnimatedError::NodeNotFound(NodeTag(2)))
        ));
    }

    #[test]
    fn test_set_value_stops_animation() {
        let (mut manager, _, emitted) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.0}))
            .unwrap();
        manager
            .start_animating_node(
                AnimationId(3),
                NodeTag(1),
                &json!({"type": "frames", "frames": [0.0, 0.5, 1.0], "toValue": 1.0}),
                AnimationEndChannel::Emit,
            )
            .unwrap();
        manager.run_updates(FRAME).unwrap();

        manager.set_animated_node_value(NodeTag(1), 7.0).unwrap();
        assert_eq!(manager.drivers().count(), 0);
        assert_eq!(
            *emitted.lock(),
            [HostEvent::AnimationsFinished {
                animations: vec![AnimationEnd {
                    animation_id: AnimationId(3),
                    finished: false,
                    value: 0.0,
                }]
            }]
        );
        assert_eq!(manager.value_of(NodeTag(1)).unwrap(), 7.0);
    }

    #[test]
    fn test_restart_with_same_id_keeps_channel() {
        let (mut manager, _, emitted) = manager();
        let ends = Arc::new(Mutex::new(Vec::new()));
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.0}))
            .unwrap();
        let sink = Arc::clone(&ends);
        manager
            .start_animating_node(
                AnimationId(1),
                NodeTag(1),
                &json!({"type": "frames", "frames": [0.0, 1.0], "toValue": 5.0}),
                AnimationEndChannel::callback(move |end| sink.lock().push(end)),
            )
            .unwrap();
        manager
            .start_animating_node(
                AnimationId(1),
                NodeTag(1),
                &json!({"type": "frames", "frames": [0.0, 1.0], "toValue": 9.0}),
                AnimationEndChannel::Emit,
            )
            .unwrap();
        assert_eq!(manager.drivers().count(), 1);

        manager.run_updates(0).unwrap();
        manager.run_updates(FRAME).unwrap();
        assert_eq!(manager.value_of(NodeTag(1)).unwrap(), 9.0);
        assert_eq!(
            *ends.lock(),
            [AnimationEnd {
                animation_id: AnimationId(1),
                finished: true,
                value: 9.0,
            }]
        );
        assert!(emitted.lock().is_empty());
    }

    #[test]
    fn test_start_animating_needs_value_node() {
        let (mut manager, _, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "props", "props": {}}))
            .unwrap();
        let config = json!({"type": "decay", "velocity": 1.0, "deceleration": 0.99});
        assert!(matches!(
            manager.start_animating_node(AnimationId(1), NodeTag(1), &config, AnimationEndChannel::Emit),
            Err(AnimatedError::WrongNodeType { .. })
        ));
        assert!(matches!(
            manager.start_animating_node(AnimationId(1), NodeTag(2), &config, AnimationEndChannel::Emit),
            Err(AnimatedError::NodeNotFound(NodeTag(2)))
        ));
    }

    #[test]
    fn test_stop_unknown_animation_is_silent() {
        let (mut manager, _, emitted) = manager();
        manager.stop_animation(AnimationId(42));
        assert!(emitted.lock().is_empty());
    }

    #[test]
    fn test_view_connection() {
        let (mut manager, applied, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.5}))
            .unwrap();
        manager
            .create_animated_node(NodeTag(2), &json!({"type": "props", "props": {"opacity": 1}}))
            .unwrap();
        manager.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
        assert!(matches!(
            manager.connect_animated_node_to_view(NodeTag(1), ViewTag(10)),
            Err(AnimatedError::WrongNodeType { .. })
        ));
        manager
            .connect_animated_node_to_view(NodeTag(2), ViewTag(10))
            .unwrap();
        manager.run_updates(0).unwrap();
        assert_eq!(applied.lock().len(), 1);

        assert!(matches!(
            manager.disconnect_animated_node_from_view(NodeTag(2), ViewTag(11)),
            Err(AnimatedError::ViewNotConnected { .. })
        ));
        manager
            .disconnect_animated_node_from_view(NodeTag(2), ViewTag(10))
            .unwrap();
        manager.set_animated_node_value(NodeTag(1), 1.0).unwrap();
        manager.run_updates(FRAME).unwrap();
        assert_eq!(applied.lock().len(), 1);
    }

    #[test]
    fn test_restore_default_values() {
        let (mut manager, applied, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.5}))
            .unwrap();
        manager
            .create_animated_node(NodeTag(2), &json!({"type": "props", "props": {"opacity": 1}}))
            .unwrap();
        manager.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
        manager
            .connect_animated_node_to_view(NodeTag(2), ViewTag(10))
            .unwrap();
        manager.run_updates(0).unwrap();

        manager.restore_default_values(NodeTag(2)).unwrap();
        let applied = applied.lock();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1].1["opacity"], PropValue::Null);
        drop(applied);

        manager.restore_default_values(NodeTag(99)).unwrap();
        assert!(matches!(
            manager.restore_default_values(NodeTag(1)),
            Err(AnimatedError::WrongNodeType { .. })
        ));
    }

    #[test]
    fn test_restore_reaches_views_after_failure() {
        struct Unmounted(ViewTag, Applied);

        impl PropsSink for Unmounted {
            fn apply_props(&mut self, view: ViewTag, props: &PropMap) -> std::result::Result<(), SinkError> {
                if view == self.0 {
                    return Err(SinkError::ViewNotFound(view));
                }
                self.1.lock().push((view, props.clone()));
                Ok(())
            }
        }

        let applied = Applied::default();
        let mut manager = AnimatedNodesManager::new(
            Unmounted(ViewTag(10), Arc::clone(&applied)),
            Emitter(Emitted::default()),
        );
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.5}))
            .unwrap();
        manager
            .create_animated_node(NodeTag(2), &json!({"type": "props", "props": {"opacity": 1}}))
            .unwrap();
        manager.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
        for view in [10, 11, 12] {
            manager
                .connect_animated_node_to_view(NodeTag(2), ViewTag(view))
                .unwrap();
        }
        manager.run_updates(0).unwrap();
        applied.lock().clear();

        assert!(matches!(
            manager.restore_default_values(NodeTag(2)),
            Err(AnimatedError::Sink(SinkError::ViewNotFound(ViewTag(10))))
        ));
        let applied = applied.lock();
        let views: Vec<_> = applied.iter().map(|(view, _)| *view).collect();
        assert_eq!(views, [ViewTag(11), ViewTag(12)]);
        assert!(applied.iter().all(|(_, props)| props["opacity"] == PropValue::Null));
    }

    #[test]
    fn test_get_value_replies() {
        let (mut manager, _, emitted) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 2.0, "offset": 1.0}))
            .unwrap();
        let read = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&read);
        manager
            .get_value(NodeTag(1), ValueReply::callback(move |v| *sink.lock() = Some(v)))
            .unwrap();
        assert_eq!(*read.lock(), Some(3.0));

        manager.get_value(NodeTag(1), ValueReply::Emit).unwrap();
        assert_eq!(
            *emitted.lock(),
            [HostEvent::GetValue {
                tag: NodeTag(1),
                value: 3.0
            }]
        );
        assert!(manager.get_value(NodeTag(2), ValueReply::Emit).is_err());
    }

    #[test]
    fn test_offsets() {
        let (mut manager, _, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 4.0}))
            .unwrap();
        manager.set_animated_node_offset(NodeTag(1), 6.0).unwrap();
        manager.flatten_animated_node_offset(NodeTag(1)).unwrap();
        let state = manager.node(NodeTag(1)).unwrap().value_state().unwrap();
        assert_eq!((state.value, state.offset), (10.0, 0.0));

        manager.extract_animated_node_offset(NodeTag(1)).unwrap();
        let state = manager.node(NodeTag(1)).unwrap().value_state().unwrap();
        assert_eq!((state.value, state.offset), (0.0, 10.0));
        assert_eq!(manager.value_of(NodeTag(1)).unwrap(), 10.0);
    }

    #[test]
    fn test_update_config_of_interpolation() {
        let (mut manager, _, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.5}))
            .unwrap();
        manager
            .create_animated_node(
                NodeTag(2),
                &json!({"type": "interpolation", "inputRange": [0, 1], "outputRange": [0, 10]}),
            )
            .unwrap();
        manager.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
        manager.run_updates(0).unwrap();
        assert_eq!(manager.value_of(NodeTag(2)).unwrap(), 5.0);

        manager
            .update_animated_node_config(
                NodeTag(2),
                &json!({"type": "interpolation", "inputRange": [0, 1], "outputRange": [0, 100]}),
            )
            .unwrap();
        manager.run_updates(FRAME).unwrap();
        assert_eq!(manager.value_of(NodeTag(2)).unwrap(), 50.0);

        // Ignored for types without updatable config
        manager
            .update_animated_node_config(NodeTag(1), &json!({"type": "value", "value": 9.0}))
            .unwrap();
        assert_eq!(manager.value_of(NodeTag(1)).unwrap(), 0.5);
    }

    #[test]
    fn test_drop_removes_bindings_and_drivers() {
        let (mut manager, _, emitted) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 0.0}))
            .unwrap();
        manager
            .add_animated_event_to_view(
                ViewTag(5),
                "onScroll",
                &json!({"nativeEventPath": ["contentOffset", "y"], "animatedValueTag": 1}),
            )
            .unwrap();
        manager
            .start_animating_node(
                AnimationId(1),
                NodeTag(1),
                &json!({"type": "decay", "velocity": 1.0, "deceleration": 0.998}),
                AnimationEndChannel::Emit,
            )
            .unwrap();

        manager.drop_animated_node(NodeTag(1));
        manager.drop_animated_node(NodeTag(1));
        assert!(manager.bindings().is_empty());
        assert_eq!(manager.drivers().count(), 0);
        assert_eq!(emitted.lock().len(), 1);
        assert!(!manager.has_active_animations());
    }

    #[test]
    fn test_event_binding_needs_value_node() {
        let (mut manager, _, _) = manager();
        let mapping = json!({"nativeEventPath": ["value"], "animatedValueTag": 1});
        assert!(matches!(
            manager.add_animated_event_to_view(ViewTag(1), "onChange", &mapping),
            Err(AnimatedError::NodeNotFound(NodeTag(1)))
        ));
        assert!(matches!(
            manager.add_animated_event_to_view(ViewTag(1), "onChange", &json!({})),
            Err(AnimatedError::InvalidEventMapping(_))
        ));
    }

    #[test]
    fn test_event_path_mismatch() {
        let (mut manager, _, _) = manager();
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 3.0}))
            .unwrap();
        manager
            .add_animated_event_to_view(
                ViewTag(1),
                "onChange",
                &json!({"nativeEventPath": ["value"], "animatedValueTag": 1}),
            )
            .unwrap();
        let event = AnimatedEvent {
            view_tag: ViewTag(1),
            name: "topChange".into(),
            payload: json!({"other": 1.0}),
        };
        assert!(matches!(
            manager.on_event_dispatch(&event),
            Err(AnimatedError::EventPath { .. })
        ));
        assert_eq!(manager.value_of(NodeTag(1)).unwrap(), 3.0);

        let unrelated = AnimatedEvent {
            view_tag: ViewTag(2),
            ..event
        };
        assert!(!manager.on_event_dispatch(&unrelated).unwrap());
    }

    #[test]
    fn test_listener_receives_updates() {
        let (mut manager, _, _) = manager();
        let heard = Arc::new(Mutex::new(Vec::new()));
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 1.0}))
            .unwrap();
        let sink = Arc::clone(&heard);
        manager
            .start_listening_to_animated_node_value(NodeTag(1), move |v| sink.lock().push(v))
            .unwrap();
        manager.run_updates(0).unwrap();
        manager.set_animated_node_value(NodeTag(1), 2.0).unwrap();
        manager.run_updates(FRAME).unwrap();
        manager.stop_listening_to_animated_node_value(NodeTag(1)).unwrap();
        manager.set_animated_node_value(NodeTag(1), 3.0).unwrap();
        manager.run_updates(2 * FRAME).unwrap();

        assert_eq!(*heard.lock(), [1.0, 2.0]);
    }

    #[test]
    fn test_lenient_policy_keeps_running() {
        let (manager, _, _) = manager();
        let mut manager = manager.with_policy(ConsistencyPolicy::Lenient);
        manager
            .create_animated_node(NodeTag(1), &json!({"type": "value", "value": 1.0}))
            .unwrap();
        manager
            .create_animated_node(NodeTag(2), &json!({"type": "value", "value": 1.0}))
            .unwrap();
        manager.connect_animated_nodes(NodeTag(1), NodeTag(2)).unwrap();
        manager.connect_animated_nodes(NodeTag(2), NodeTag(1)).unwrap();
        manager.run_updates(0).unwrap();
        assert!(!manager.last_pass().is_consistent());
    }
}
