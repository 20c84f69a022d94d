// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interpolation node.
//!
//! Maps the value of the node connected into it through piecewise linear
//! ranges. Outputs are numbers, packed colors or strings with embedded
//! numbers such as `"45deg"` or `"rgba(0, 0, 255, 0.5)"`.

use super::color::{pack_argb, unpack_argb};
use super::NodeUpdate;
use crate::error::{AnimatedError, Result};
use crate::graph::Lookup;
use crate::node::{decode, NodeTag, NodeType};
use crate::value::PropValue;
use serde::Deserialize;
use serde_json::Value;

/// Behaviour outside the input range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolation {
    /// Keep following the edge segment
    #[default]
    Extend,
    /// Hold the edge output
    Clamp,
    /// Pass the input through unchanged
    Identity,
}

/// Output side of the mapping
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRange {
    /// Numbers
    Number(Vec<f64>),
    /// Packed ARGB colors
    Color(Vec<u32>),
    /// Strings sharing one shape, differing only in their numbers
    Pattern(StringPattern),
}

/// Output strings split around their numbers
#[derive(Debug, Clone, PartialEq)]
pub struct StringPattern {
    /// Text around the numbers of the first output, one more than numbers
    segments: Vec<String>,
    /// `outputs[k][i]` is the k-th number of the i-th output string
    outputs: Vec<Vec<f64>>,
    /// Round the first three numbers, for `rgb()`/`rgba()` strings
    round_channels: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterpolationConfig {
    input_range: Vec<f64>,
    output_range: Vec<Value>,
    #[serde(default)]
    extrapolate_left: Extrapolation,
    #[serde(default)]
    extrapolate_right: Extrapolation,
    #[serde(default)]
    output_type: Option<String>,
}

/// Range mapping of its parent value
#[derive(Debug, Clone)]
pub struct InterpolationNode {
    /// Value node feeding this one, set on connect
    pub parent: Option<NodeTag>,
    /// Input breakpoints, ascending
    pub input_range: Vec<f64>,
    /// Output at each breakpoint
    pub output: OutputRange,
    /// Below the first breakpoint
    pub extrapolate_left: Extrapolation,
    /// Above the last breakpoint
    pub extrapolate_right: Extrapolation,
}

impl InterpolationNode {
    /// Build from a host config map
    pub fn from_config(config: &Value) -> Result<Self> {
        let config: InterpolationConfig = decode(NodeType::Interpolation, config)?;
        if config.input_range.len() < 2 {
            return Err(AnimatedError::InvalidInterpolation(
                "input range needs at least two values",
            ));
        }
        if config.output_range.len() != config.input_range.len() {
            return Err(AnimatedError::InvalidInterpolation(
                "output range length differs from input range length",
            ));
        }
        Ok(Self {
            parent: None,
            output: parse_output(config.output_type.as_deref(), &config.output_range)?,
            input_range: config.input_range,
            extrapolate_left: config.extrapolate_left,
            extrapolate_right: config.extrapolate_right,
        })
    }

    pub(crate) fn update(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<NodeUpdate> {
        let Some(parent) = self.parent else {
            return Ok(NodeUpdate::Unchanged);
        };
        let value = lookup.value(tag, parent)?;
        Ok(match &self.output {
            OutputRange::Number(outputs) => NodeUpdate::Value(self.interpolate(value, outputs)),
            OutputRange::Color(colors) => {
                NodeUpdate::Object(PropValue::Color(self.interpolate_color(value, colors)))
            }
            OutputRange::Pattern(pattern) => NodeUpdate::Object(PropValue::String(
                pattern.render(|outputs| self.interpolate(value, outputs)),
            )),
        })
    }

    /// Map `value` onto numeric `outputs`
    pub fn interpolate(&self, value: f64, outputs: &[f64]) -> f64 {
        let index = find_range_index(value, &self.input_range);
        interpolate_segment(
            value,
            [self.input_range[index], self.input_range[index + 1]],
            [outputs[index], outputs[index + 1]],
            self.extrapolate_left,
            self.extrapolate_right,
        )
    }

    fn interpolate_color(&self, value: f64, colors: &[u32]) -> u32 {
        let index = find_range_index(value, &self.input_range);
        let (start, end) = (colors[index], colors[index + 1]);
        if start == end {
            return start;
        }
        let (input_min, input_max) = (self.input_range[index], self.input_range[index + 1]);
        if input_min == input_max {
            return if value <= input_min { start } else { end };
        }

        let ratio = ((value - input_min) / (input_max - input_min)).clamp(0.0, 1.0);
        let [sa, sr, sg, sb] = unpack_argb(start);
        let [ea, er, eg, eb] = unpack_argb(end);
        pack_argb(
            sa + (ea - sa) * ratio,
            sr + (er - sr) * ratio,
            sg + (eg - sg) * ratio,
            sb + (eb - sb) * ratio,
        )
    }
}

/// Index of the segment `value` falls into; edge segments extend outwards
fn find_range_index(value: f64, ranges: &[f64]) -> usize {
    let mut index = 1;
    while index < ranges.len() - 1 && ranges[index] < value {
        index += 1;
    }
    index - 1
}

fn interpolate_segment(
    value: f64,
    [input_min, input_max]: [f64; 2],
    [output_min, output_max]: [f64; 2],
    extrapolate_left: Extrapolation,
    extrapolate_right: Extrapolation,
) -> f64 {
    let mut result = value;
    if result < input_min {
        match extrapolate_left {
            Extrapolation::Identity => return result,
            Extrapolation::Clamp => result = input_min,
            Extrapolation::Extend => {}
        }
    }
    if result > input_max {
        match extrapolate_right {
            Extrapolation::Identity => return result,
            Extrapolation::Clamp => result = input_max,
            Extrapolation::Extend => {}
        }
    }

    if output_min == output_max {
        return output_min;
    }
    if input_min == input_max {
        return if value <= input_min { output_min } else { output_max };
    }
    output_min + (output_max - output_min) * (result - input_min) / (input_max - input_min)
}

fn parse_output(output_type: Option<&str>, items: &[Value]) -> Result<OutputRange> {
    if output_type == Some("color") {
        return items
            .iter()
            .map(|item| {
                item.as_i64()
                    .map(|c| c as u32)
                    .or_else(|| item.as_f64().map(|c| c as i64 as u32))
                    .ok_or(AnimatedError::InvalidInterpolation("color output must be numeric"))
            })
            .collect::<Result<Vec<_>>>()
            .map(OutputRange::Color);
    }
    if items.iter().all(Value::is_number) {
        return Ok(OutputRange::Number(
            items.iter().filter_map(Value::as_f64).collect(),
        ));
    }
    let strings = items
        .iter()
        .map(Value::as_str)
        .collect::<Option<Vec<_>>>()
        .ok_or(AnimatedError::InvalidInterpolation(
            "output range mixes numbers and strings",
        ))?;
    StringPattern::parse(&strings).map(OutputRange::Pattern)
}

impl StringPattern {
    fn parse(strings: &[&str]) -> Result<Self> {
        let Some((first, _)) = strings.first().map(|s| split_numbers(s)) else {
            return Err(AnimatedError::InvalidInterpolation("empty output range"));
        };
        let count = first.len() - 1;
        let mut outputs = vec![Vec::with_capacity(strings.len()); count];
        for s in strings {
            let (_, numbers) = split_numbers(s);
            if numbers.len() != count {
                return Err(AnimatedError::InvalidInterpolation(
                    "output strings differ in their number of values",
                ));
            }
            for (k, number) in numbers.into_iter().enumerate() {
                outputs[k].push(number);
            }
        }
        Ok(Self {
            round_channels: first[0].starts_with("rgb"),
            segments: first,
            outputs,
        })
    }

    /// Rebuild the string with each number produced by `interpolate`
    fn render(&self, interpolate: impl Fn(&[f64]) -> f64) -> String {
        let mut out = String::new();
        for (k, segment) in self.segments.iter().enumerate() {
            out.push_str(segment);
            if let Some(outputs) = self.outputs.get(k) {
                let mut value = interpolate(outputs);
                if self.round_channels && k < 3 {
                    value = value.round();
                }
                out.push_str(&value.to_string());
            }
        }
        out
    }
}

/// Split a string into the text around its numbers and the numbers
fn split_numbers(s: &str) -> (Vec<String>, Vec<f64>) {
    let bytes = s.as_bytes();
    let mut segments = Vec::new();
    let mut numbers = Vec::new();
    let mut segment_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = number_end(bytes, i) {
            if let Ok(number) = s[i..end].parse::<f64>() {
                segments.push(s[segment_start..i].to_string());
                numbers.push(number);
                segment_start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    segments.push(s[segment_start..].to_string());
    (segments, numbers)
}

/// End of the number literal starting at `start`, if one does
fn number_end(bytes: &[u8], start: usize) -> Option<usize> {
    let is_digit = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);
    let mut i = start;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while is_digit(i) {
        i += 1;
    }
    let mut digits = i - int_start;
    if bytes.get(i) == Some(&b'.') {
        let mut j = i + 1;
        while is_digit(j) {
            j += 1;
        }
        if digits > 0 || j > i + 1 {
            digits += j - (i + 1);
            i = j;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exponent_start = j;
        while is_digit(j) {
            j += 1;
        }
        if j > exponent_start {
            i = j;
        }
    }
    Some(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeGraph;
    use crate::node::AnimatedNode;
    use serde_json::json;

    fn node(config: Value) -> InterpolationNode {
        InterpolationNode::from_config(&config).unwrap()
    }

    #[test]
    fn test_numeric_ranges() {
        let node = node(json!({
            "inputRange": [0, 1, 2],
            "outputRange": [0, 10, 0],
        }));
        let OutputRange::Number(outputs) = node.output.clone() else {
            panic!("expected numeric output");
        };
        assert_eq!(node.interpolate(0.5, &outputs), 5.0);
        assert_eq!(node.interpolate(1.5, &outputs), 5.0);
        assert_eq!(node.interpolate(3.0, &outputs), -10.0);
        assert_eq!(node.interpolate(-1.0, &outputs), -10.0);
    }

    #[test]
    fn test_extrapolation_modes() {
        let clamp = node(json!({
            "inputRange": [0, 100],
            "outputRange": [0, 1],
            "extrapolateLeft": "clamp",
            "extrapolateRight": "identity",
        }));
        let outputs = [0.0, 1.0];
        assert_eq!(clamp.interpolate(-50.0, &outputs), 0.0);
        assert_eq!(clamp.interpolate(150.0, &outputs), 150.0);
        assert_eq!(clamp.interpolate(50.0, &outputs), 0.5);
    }

    #[test]
    fn test_degenerate_segments() {
        let flat = node(json!({"inputRange": [0, 1], "outputRange": [3, 3]}));
        assert_eq!(flat.interpolate(0.7, &[3.0, 3.0]), 3.0);

        let step = node(json!({"inputRange": [1, 1], "outputRange": [0, 10]}));
        assert_eq!(step.interpolate(1.0, &[0.0, 10.0]), 0.0);
        assert_eq!(step.interpolate(1.5, &[0.0, 10.0]), 10.0);
    }

    #[test]
    fn test_range_length_mismatch() {
        let err = InterpolationNode::from_config(&json!({
            "inputRange": [0, 1],
            "outputRange": [0, 1, 2],
        }))
        .unwrap_err();
        assert!(matches!(err, AnimatedError::InvalidInterpolation(_)));
    }

    #[test]
    fn test_string_pattern() {
        let node = node(json!({
            "inputRange": [0, 1],
            "outputRange": ["0deg", "90deg"],
        }));
        let OutputRange::Pattern(pattern) = &node.output else {
            panic!("expected pattern output");
        };
        assert_eq!(pattern.render(|outputs| node.interpolate(0.5, outputs)), "45deg");
    }

    #[test]
    fn test_rgba_pattern_rounds_channels() {
        let node = node(json!({
            "inputRange": [0, 1],
            "outputRange": ["rgba(0, 0, 0, 0)", "rgba(255, 100, 1, 1)"],
        }));
        let OutputRange::Pattern(pattern) = &node.output else {
            panic!("expected pattern output");
        };
        assert_eq!(
            pattern.render(|outputs| node.interpolate(0.5, outputs)),
            "rgba(128, 50, 1, 0.5)"
        );
    }

    #[test]
    fn test_split_numbers() {
        let (segments, numbers) = split_numbers("translate(-10.5px, .25e2px)");
        assert_eq!(segments, ["translate(", "px, ", "px)"]);
        assert_eq!(numbers, [-10.5, 25.0]);
    }

    #[test]
    fn test_color_output() {
        let mut graph = NodeGraph::new();
        graph
            .add_node(AnimatedNode::from_config(NodeTag(1), &json!({"type": "value", "value": 0.5})).unwrap())
            .unwrap();
        let mut node = node(json!({
            "inputRange": [0, 1],
            "outputRange": [0xff00_0000_u32, 0xffff_ffff_u32],
            "outputType": "color",
        }));
        node.parent = Some(NodeTag(1));

        let update = node.update(NodeTag(2), &graph.lookup()).unwrap();
        assert_eq!(update, NodeUpdate::Object(PropValue::Color(0xff80_8080)));
    }

    #[test]
    fn test_without_parent_is_unchanged() {
        let graph = NodeGraph::new();
        let node = node(json!({"inputRange": [0, 1], "outputRange": [0, 1]}));
        assert_eq!(node.update(NodeTag(2), &graph.lookup()).unwrap(), NodeUpdate::Unchanged);
    }
}
