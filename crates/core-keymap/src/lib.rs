//! core-keymap: static keymap and key decoding.
//!
//! Design principles:
//! - Pure and deterministic: resolution depends only on the pending buffer.
//! - Bindings compiled into a compressed trie for cache locality.
//! - A buffer that is a strict prefix of one or more bindings resolves to
//!   `NeedMore` so escape sequences split across reads are reassembled.
//! - No side effects: logging only at TRACE for traversal steps.

use core_events::keys;
use smallvec::SmallVec;
use tracing::trace;

mod decoder;
pub use decoder::KeyDecoder;

// -------------------------------------------------------------------------------------------------
// Public Symbolic Output
// -------------------------------------------------------------------------------------------------
/// What a bound sequence decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeymapOutput {
    /// Deliver a key event carrying these code points.
    Key(SmallVec<[char; 4]>),
    /// Deliver a function event with this name.
    Function(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub sequence: Vec<char>,
    pub output: KeymapOutput,
}

// -------------------------------------------------------------------------------------------------
// Keymap
// -------------------------------------------------------------------------------------------------
/// Ordered binding table. Later bindings for the same sequence override earlier ones.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::standard()
    }
}

impl Keymap {
    /// Keymap without any binding: every code point decodes to a single key event.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Emacs-flavoured defaults for VT100/xterm style terminals.
    pub fn standard() -> Self {
        let mut km = Self::empty();
        km.bind_key(&[keys::CTRL_M], &[keys::CTRL_M])
            .bind_key(&[keys::CTRL_I], &[keys::CTRL_I])
            .bind_function(&[keys::DEL], "backward-delete-char")
            .bind_function(&[keys::CTRL_H], "backward-delete-char")
            .bind_function(&[keys::CTRL_D], "delete-char")
            .bind_function(&[keys::CTRL_A], "beginning-of-line")
            .bind_function(&[keys::CTRL_E], "end-of-line")
            .bind_function(&[keys::CTRL_B], "backward-char")
            .bind_function(&[keys::CTRL_F], "forward-char")
            .bind_function(&[keys::CTRL_K], "kill-line")
            .bind_function(&[keys::CTRL_U], "unix-line-discard")
            .bind_function(&[keys::ESC, '[', '3', '~'], "delete-char")
            .bind_function(&[keys::ESC, '[', 'H'], "beginning-of-line")
            .bind_function(&[keys::ESC, '[', 'F'], "end-of-line");
        // CSI and SS3 cursor keys.
        for intro in ['[', 'O'] {
            km.bind_function(&[keys::ESC, intro, 'A'], "previous-history")
                .bind_function(&[keys::ESC, intro, 'B'], "next-history")
                .bind_function(&[keys::ESC, intro, 'C'], "forward-char")
                .bind_function(&[keys::ESC, intro, 'D'], "backward-char");
        }
        km
    }

    pub fn bind_key(&mut self, sequence: &[char], key: &[char]) -> &mut Self {
        self.bind(sequence, KeymapOutput::Key(SmallVec::from_slice(key)))
    }

    pub fn bind_function(&mut self, sequence: &[char], name: impl Into<String>) -> &mut Self {
        self.bind(sequence, KeymapOutput::Function(name.into()))
    }

    fn bind(&mut self, sequence: &[char], output: KeymapOutput) -> &mut Self {
        if sequence.is_empty() {
            trace!(target: "input.map", "empty_sequence_ignored");
            return self;
        }
        self.bindings.push(Binding {
            sequence: sequence.to_vec(),
            output,
        });
        self
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Exact lookup of a full sequence (last binding wins).
    pub fn lookup(&self, sequence: &[char]) -> Option<&KeymapOutput> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.sequence == sequence)
            .map(|b| &b.output)
    }

    pub fn compile(&self) -> MappingTrie {
        MappingTrie::build(self.bindings.clone())
    }
}

// -------------------------------------------------------------------------------------------------
// Trie Representation
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone)]
struct Edge {
    ch: char,
    next: usize,
}

#[derive(Debug, Clone)]
struct Node {
    terminal: Option<usize>, // index into bindings vec
    edges: SmallVec<[Edge; 4]>,
}

impl Node {
    fn new() -> Self {
        Self {
            terminal: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingTrie {
    nodes: Vec<Node>,
    bindings: Vec<Binding>,
}

impl MappingTrie {
    pub fn build(bindings: Vec<Binding>) -> Self {
        let mut trie = MappingTrie {
            nodes: vec![Node::new()],
            bindings,
        };
        for (idx, b) in trie.bindings.iter().enumerate() {
            let mut cur = 0usize;
            for ch in &b.sequence {
                let next = if let Some(e) = trie.nodes[cur].edges.iter().find(|e| e.ch == *ch) {
                    e.next
                } else {
                    let new_idx = trie.nodes.len();
                    trie.nodes.push(Node::new());
                    trie.nodes[cur].edges.push(Edge {
                        ch: *ch,
                        next: new_idx,
                    });
                    new_idx
                };
                cur = next;
            }
            if trie.nodes[cur].terminal.is_some() {
                trace!(
                    target: "input.map",
                    binding_index = idx,
                    node = cur,
                    "terminal_override"
                );
            }
            trie.nodes[cur].terminal = Some(idx);
        }
        trie
    }

    /// Longest-match resolution of the head of `buffer`.
    pub fn resolve(&self, buffer: &[char]) -> Resolution {
        let mut node_idx = 0usize;
        let mut last_terminal: Option<(usize, usize)> = None; // (consumed, binding index)
        let mut exhausted = true;
        for (i, ch) in buffer.iter().enumerate() {
            match self.nodes[node_idx].edges.iter().find(|e| e.ch == *ch) {
                Some(edge) => {
                    node_idx = edge.next;
                    trace!(target: "input.map", step = i, node = node_idx, "advance");
                    if let Some(bi) = self.nodes[node_idx].terminal {
                        last_terminal = Some((i + 1, bi));
                    }
                }
                None => {
                    exhausted = false;
                    break;
                }
            }
        }
        if let Some((consumed, bi)) = last_terminal {
            Resolution::Matched {
                consumed,
                output: self.bindings[bi].output.clone(),
                ambiguous: exhausted && !self.nodes[node_idx].edges.is_empty(),
            }
        } else if buffer.is_empty() || (exhausted && node_idx != 0) {
            Resolution::NeedMore
        } else {
            Resolution::FallbackLiteral(buffer[0])
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Resolution Result
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched {
        consumed: usize,
        output: KeymapOutput,
        ambiguous: bool,
    },
    NeedMore, // empty buffer or strict prefix of one or more bindings
    FallbackLiteral(char),
}
