// SPDX-License-Identifier: MIT OR Apache-2.0
//! Numeric operator nodes.

use crate::error::{AnimatedError, Result};
use crate::graph::Lookup;
use crate::node::{NodeTag, NodeType};
use serde::Deserialize;

/// Operator folded over an input list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// Sum
    Addition,
    /// First input minus the rest
    Subtraction,
    /// Product
    Multiplication,
    /// First input divided by the rest
    Division,
}

impl ArithmeticOp {
    /// Operator for an arithmetic node type
    pub fn from_node_type(node_type: NodeType) -> Option<Self> {
        match node_type {
            NodeType::Addition => Some(Self::Addition),
            NodeType::Subtraction => Some(Self::Subtraction),
            NodeType::Multiplication => Some(Self::Multiplication),
            NodeType::Division => Some(Self::Division),
            _ => None,
        }
    }

    /// Node type of this operator
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Addition => NodeType::Addition,
            Self::Subtraction => NodeType::Subtraction,
            Self::Multiplication => NodeType::Multiplication,
            Self::Division => NodeType::Division,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OperandsConfig {
    input: Vec<NodeTag>,
}

/// Addition, subtraction, multiplication or division over input nodes
#[derive(Debug, Clone)]
pub struct ArithmeticNode {
    /// Operator
    pub op: ArithmeticOp,
    /// Input node tags, in order
    pub input: Vec<NodeTag>,
}

impl ArithmeticNode {
    pub(crate) fn new(op: ArithmeticOp, config: OperandsConfig) -> Self {
        Self {
            op,
            input: config.input,
        }
    }

    /// Fold the inputs; `None` when a subtraction or division has no input
    pub(crate) fn update(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<Option<f64>> {
        let mut acc = match self.op {
            ArithmeticOp::Addition => Some(0.0),
            ArithmeticOp::Multiplication => Some(1.0),
            ArithmeticOp::Subtraction | ArithmeticOp::Division => None,
        };

        for input in &self.input {
            let value = lookup.value(tag, *input)?;
            acc = Some(match (self.op, acc) {
                (ArithmeticOp::Addition, Some(sum)) => sum + value,
                (ArithmeticOp::Multiplication, Some(product)) => product * value,
                (ArithmeticOp::Subtraction, Some(diff)) => diff - value,
                (ArithmeticOp::Division, Some(quotient)) => {
                    if value == 0.0 {
                        return Err(AnimatedError::DivisionByZero(tag));
                    }
                    quotient / value
                }
                (_, None) => value,
            });
        }
        Ok(acc)
    }
}

/// Positive remainder of an input by a constant
#[derive(Debug, Clone, Deserialize)]
pub struct ModulusNode {
    /// Input node
    pub input: NodeTag,
    /// Divisor
    pub modulus: f64,
}

impl ModulusNode {
    pub(crate) fn from_config(config: Self) -> Result<Self> {
        require_non_zero(NodeType::Modulus, "modulus", config.modulus)?;
        Ok(config)
    }

    pub(crate) fn update(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<f64> {
        let value = lookup.value(tag, self.input)?;
        Ok(((value % self.modulus) + self.modulus) % self.modulus)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DiffClampConfig {
    input: NodeTag,
    min: f64,
    max: f64,
}

/// Accumulates input deltas, clamped to `[min, max]`.
///
/// Used for headers that hide on scroll down and reappear on scroll up
/// without waiting for the scroll position to return.
#[derive(Debug, Clone)]
pub struct DiffClampNode {
    /// Input node
    pub input: NodeTag,
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
    /// Input value seen by the previous update
    pub last_value: f64,
}

impl DiffClampNode {
    pub(crate) fn from_config(config: DiffClampConfig) -> Self {
        Self {
            input: config.input,
            min: config.min,
            max: config.max,
            last_value: 0.0,
        }
    }

    /// Value before the first update
    pub fn initial_value(&self) -> f64 {
        self.clamp(0.0)
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Returns the new value and the input to remember
    pub(crate) fn update(&self, tag: NodeTag, current: f64, lookup: &Lookup<'_>) -> Result<(f64, f64)> {
        let input = lookup.value(tag, self.input)?;
        let diff = input - self.last_value;
        Ok((self.clamp(current + diff), input))
    }
}

/// Rounds an input to the nearest multiple of a constant
#[derive(Debug, Clone, Deserialize)]
pub struct RoundNode {
    /// Input node
    pub input: NodeTag,
    /// Step to round to
    pub nearest: f64,
}

impl RoundNode {
    pub(crate) fn from_config(config: Self) -> Result<Self> {
        require_non_zero(NodeType::Round, "nearest", config.nearest)?;
        Ok(config)
    }

    pub(crate) fn update(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<f64> {
        let value = lookup.value(tag, self.input)?;
        Ok((value / self.nearest).round() * self.nearest)
    }
}

fn require_non_zero(node_type: NodeType, field: &'static str, value: f64) -> Result<()> {
    if value == 0.0 || !value.is_finite() {
        return Err(AnimatedError::InvalidNodeParameter {
            node_type,
            field,
            value,
        });
    }
    Ok(())
}
