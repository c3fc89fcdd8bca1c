//! Reassembly of tool calls split across streamed chunks.

use std::collections::BTreeMap;

use crate::tool::{StreamToolCall, ToolCall};

/// Accumulates streaming tool call fragments into complete tool calls.
///
/// The first fragment for an index usually carries the id and function name;
/// later fragments carry pieces of the argument string.
#[derive(Debug, Default)]
pub struct StreamToolAccumulator {
    calls: BTreeMap<u32, PartialToolCall>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

impl StreamToolAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the fragments of one chunk.
    pub fn process_chunk(&mut self, fragments: &[StreamToolCall]) {
        for fragment in fragments {
            let entry = self.calls.entry(fragment.index).or_default();

            if let Some(id) = &fragment.id {
                entry.id = Some(id.clone());
            }
            if let Some(function) = &fragment.function {
                if let Some(name) = &function.name {
                    entry.name = Some(name.clone());
                }
                if let Some(args) = &function.arguments {
                    entry.arguments.push_str(args);
                }
            }
        }
    }

    /// Complete tool calls, ordered by index. Fragments that never received
    /// a function name are dropped.
    pub fn into_tool_calls(self) -> Vec<ToolCall> {
        self.calls
            .into_iter()
            .filter_map(|(index, partial)| {
                Some(ToolCall {
                    id: partial.id.unwrap_or_else(|| format!("call_{}", index)),
                    name: partial.name?,
                    arguments: partial.arguments,
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
