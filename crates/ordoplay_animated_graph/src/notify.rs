// SPDX-License-Identifier: MIT OR Apache-2.0
//! Result channels between the engine and its host.
//!
//! Commands that produce a result later (animation end, value read) either
//! carry a direct callback or ask for the result to be emitted as a host
//! event. Applied props go to a [`PropsSink`].

use crate::driver::AnimationId;
use crate::error::SinkError;
use crate::node::{NodeTag, ViewTag};
use crate::value::PropMap;
use serde::Serialize;
use std::fmt;

/// Outcome of an animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationEnd {
    /// Animation id
    pub animation_id: AnimationId,
    /// `true` when the driver reached its end, `false` when stopped
    pub finished: bool,
    /// Raw value of the animated node, without offset
    pub value: f64,
}

/// Callback receiving an animation end
pub type EndCallback = Box<dyn FnOnce(AnimationEnd) + Send>;

/// Callback receiving a value read
pub type ValueCallback = Box<dyn FnOnce(f64) + Send>;

/// Listener called with the effective value after every update of a node
pub type ValueListener = Box<dyn FnMut(f64) + Send>;

/// Where an animation end is reported
pub enum AnimationEndChannel {
    /// Call this closure
    Callback(EndCallback),
    /// Batch into [`HostEvent::AnimationsFinished`]
    Emit,
}

impl AnimationEndChannel {
    /// Channel calling `callback`
    pub fn callback(callback: impl FnOnce(AnimationEnd) + Send + 'static) -> Self {
        Self::Callback(Box::new(callback))
    }
}

impl fmt::Debug for AnimationEndChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback"),
            Self::Emit => f.write_str("Emit"),
        }
    }
}

/// Where a value read is reported
pub enum ValueReply {
    /// Call this closure
    Callback(ValueCallback),
    /// Emit [`HostEvent::GetValue`]
    Emit,
}

impl ValueReply {
    /// Reply calling `callback`
    pub fn callback(callback: impl FnOnce(f64) + Send + 'static) -> Self {
        Self::Callback(Box::new(callback))
    }
}

impl fmt::Debug for ValueReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback"),
            Self::Emit => f.write_str("Emit"),
        }
    }
}

/// Event sent to the host when no callback was given
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    /// Animations ended during one frame or command
    AnimationsFinished {
        /// Ends, in driver order
        animations: Vec<AnimationEnd>,
    },
    /// Reply to a value read
    GetValue {
        /// Node read
        tag: NodeTag,
        /// Effective value
        value: f64,
    },
}

/// Receives host events
pub trait HostEventEmitter {
    /// Deliver one event
    fn emit(&mut self, event: HostEvent);
}

/// Receives computed props for mounted views.
///
/// Implementations must not call back into the engine.
pub trait PropsSink {
    /// Apply `props` to `view`
    fn apply_props(&mut self, view: ViewTag, props: &PropMap) -> Result<(), SinkError>;
}

/// Emitter that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmitter;

impl HostEventEmitter for NoopEmitter {
    fn emit(&mut self, event: HostEvent) {
        tracing::trace!("Dropping host event {:?}", event);
    }
}

/// Sink that discards props
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl PropsSink for NoopSink {
    fn apply_props(&mut self, view: ViewTag, _props: &PropMap) -> Result<(), SinkError> {
        tracing::trace!("Discarding props for view [{}]", view);
        Ok(())
    }
}

/// Deliver animation ends: callbacks now, the rest as one batched event
pub(crate) fn report_ends(
    ends: Vec<(AnimationEnd, AnimationEndChannel)>,
    emitter: &mut dyn HostEventEmitter,
) {
    let mut emitted = Vec::new();
    for (end, channel) in ends {
        match channel {
            AnimationEndChannel::Callback(callback) => callback(end),
            AnimationEndChannel::Emit => emitted.push(end),
        }
    }
    if !emitted.is_empty() {
        emitter.emit(HostEvent::AnimationsFinished {
            animations: emitted,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder(Vec<HostEvent>);

    impl HostEventEmitter for Recorder {
        fn emit(&mut self, event: HostEvent) {
            self.0.push(event);
        }
    }

    fn end(id: i32) -> AnimationEnd {
        AnimationEnd {
            animation_id: AnimationId(id),
            finished: true,
            value: 1.0,
        }
    }

    #[test]
    fn test_ends_are_split_by_channel() {
        let called = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&called);
        let mut recorder = Recorder::default();

        report_ends(
            vec![
                (end(1), AnimationEndChannel::Emit),
                (
                    end(2),
                    AnimationEndChannel::callback(move |end| sink.lock().push(end.animation_id)),
                ),
                (end(3), AnimationEndChannel::Emit),
            ],
            &mut recorder,
        );

        assert_eq!(*called.lock(), [AnimationId(2)]);
        assert_eq!(
            recorder.0,
            [HostEvent::AnimationsFinished {
                animations: vec![end(1), end(3)]
            }]
        );
    }

    #[test]
    fn test_nothing_emitted_without_emit_channels() {
        let mut recorder = Recorder::default();
        report_ends(Vec::new(), &mut recorder);
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn test_host_event_json_shape() {
        let event = HostEvent::GetValue {
            tag: NodeTag(3),
            value: 2.5,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"event": "getValue", "tag": 3, "value": 2.5})
        );
    }
}
