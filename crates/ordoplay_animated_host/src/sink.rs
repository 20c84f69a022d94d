// SPDX-License-Identifier: MIT OR Apache-2.0
//! Props sinks and host event emitters.

use ordoplay_animated_graph::{HostEvent, HostEventEmitter, PropMap, PropsSink, SinkError, ViewTag};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Props applied to one view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedProps {
    /// Target view
    pub view: ViewTag,
    /// Props sent
    pub props: PropMap,
}

/// Sink and emitter keeping everything in shared memory.
///
/// Clones share the same storage, so one clone can be handed to the render
/// thread while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    props: Arc<Mutex<Vec<AppliedProps>>>,
    events: Arc<Mutex<Vec<HostEvent>>>,
}

impl Recorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Props applied so far
    pub fn props(&self) -> Vec<AppliedProps> {
        self.props.lock().clone()
    }

    /// Host events emitted so far
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    /// Last props applied to `view`
    pub fn last_props(&self, view: ViewTag) -> Option<PropMap> {
        self.props
            .lock()
            .iter()
            .rev()
            .find(|applied| applied.view == view)
            .map(|applied| applied.props.clone())
    }

    /// Remove and return everything recorded
    pub fn take(&self) -> (Vec<AppliedProps>, Vec<HostEvent>) {
        (
            std::mem::take(&mut *self.props.lock()),
            std::mem::take(&mut *self.events.lock()),
        )
    }
}

impl PropsSink for Recorder {
    fn apply_props(&mut self, view: ViewTag, props: &PropMap) -> Result<(), SinkError> {
        self.props.lock().push(AppliedProps {
            view,
            props: props.clone(),
        });
        Ok(())
    }
}

impl HostEventEmitter for Recorder {
    fn emit(&mut self, event: HostEvent) {
        self.events.lock().push(event);
    }
}

/// Writes one JSON object per applied props or host event
#[derive(Debug)]
pub struct JsonLines<W> {
    writer: W,
}

impl<W: Write> JsonLines<W> {
    /// Write to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, value: &impl Serialize) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write> PropsSink for JsonLines<W> {
    fn apply_props(&mut self, view: ViewTag, props: &PropMap) -> Result<(), SinkError> {
        let applied = AppliedProps {
            view,
            props: props.clone(),
        };
        self.write_line(&applied)
            .map_err(|e| SinkError::Rejected {
                view,
                reason: e.to_string(),
            })
    }
}

impl<W: Write> HostEventEmitter for JsonLines<W> {
    fn emit(&mut self, event: HostEvent) {
        if let Err(e) = self.write_line(&event) {
            tracing::error!("Failed to write host event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_animated_graph::{NodeTag, PropValue};

    fn props(opacity: f64) -> PropMap {
        let mut props = PropMap::new();
        props.insert("opacity".to_string(), PropValue::Number(opacity));
        props
    }

    #[test]
    fn test_recorder_clones_share_storage() {
        let recorder = Recorder::new();
        let mut sink = recorder.clone();
        sink.apply_props(ViewTag(1), &props(0.5)).unwrap();
        sink.apply_props(ViewTag(2), &props(0.7)).unwrap();
        sink.apply_props(ViewTag(1), &props(1.0)).unwrap();

        assert_eq!(recorder.props().len(), 3);
        assert_eq!(recorder.last_props(ViewTag(1)), Some(props(1.0)));
        assert_eq!(recorder.last_props(ViewTag(3)), None);

        let (applied, events) = recorder.take();
        assert_eq!(applied.len(), 3);
        assert!(events.is_empty());
        assert!(recorder.props().is_empty());
    }

    #[test]
    fn test_json_lines() {
        let mut out = JsonLines::new(Vec::new());
        out.apply_props(ViewTag(4), &props(0.25)).unwrap();
        out.emit(HostEvent::GetValue {
            tag: NodeTag(2),
            value: 1.5,
        });

        let text = String::from_utf8(out.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"view":4,"props":{"opacity":0.25}}"#,
                r#"{"event":"getValue","tag":2,"value":1.5}"#,
            ]
        );
    }
}
