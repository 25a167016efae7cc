use crate::{Keymap, KeymapOutput, MappingTrie, Resolution};
use core_events::{Event, FunctionEvent, KeyEvent};
use tracing::trace;

/// Buffers raw input code points and decodes them into [`Event`]s using a compiled keymap.
#[derive(Debug, Clone)]
pub struct KeyDecoder {
    trie: MappingTrie,
    pending: Vec<char>,
}

impl KeyDecoder {
    pub fn new(keymap: &Keymap) -> Self {
        Self {
            trie: keymap.compile(),
            pending: Vec::new(),
        }
    }

    pub fn append(&mut self, data: &[char]) {
        self.pending.extend_from_slice(data);
        trace!(target: "input.decoder", appended = data.len(), pending = self.pending.len(), "append");
    }

    /// True when `next` would produce an event. A buffer that is still a strict
    /// prefix of some binding does not count, even if a shorter binding matches it.
    pub fn has_next(&self) -> bool {
        !waits_for_more(&self.trie.resolve(&self.pending))
    }

    pub fn next(&mut self) -> Option<Event> {
        match self.trie.resolve(&self.pending) {
            resolution if waits_for_more(&resolution) => None,
            Resolution::Matched {
                consumed, output, ..
            } => {
                self.pending.drain(..consumed);
                let event = match output {
                    KeymapOutput::Key(code_points) => Event::Key(KeyEvent::new(&code_points)),
                    KeymapOutput::Function(name) => Event::Function(FunctionEvent::new(name)),
                };
                trace!(target: "input.decoder", consumed, "decoded_binding");
                Some(event)
            }
            Resolution::FallbackLiteral(ch) => {
                self.pending.remove(0);
                Some(Event::Key(KeyEvent::new(&[ch])))
            }
            Resolution::NeedMore => None,
        }
    }

    /// Remove and return every buffered code point, decoded or not.
    pub fn clear(&mut self) -> Vec<char> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn waits_for_more(resolution: &Resolution) -> bool {
    matches!(
        resolution,
        Resolution::NeedMore | Resolution::Matched { ambiguous: true, .. }
    )
}
