use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

/// Pivot byte between the reversed prefix and the forward suffix of each
/// stored sequence. Normalized words are strictly A-Z, so it cannot collide.
const DELIMITER: u8 = b'+';

pub const MIN_WORD_LENGTH: usize = 2;
pub const MAX_WORD_LENGTH: usize = 15;

type NodeId = u32;

#[derive(Debug, Clone, Default)]
struct Node {
    transitions: BTreeMap<u8, NodeId>,
    terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaddagStats {
    pub word_count: usize,
    pub node_count: usize,
    pub transition_count: usize,
}

/// Bidirectional word automaton (GADDAG) over an arena of nodes.
///
/// Each accepted word `w` is stored as `+w` plus, for every split index `i`,
/// `rev(w[0..=i]) + '+' + w[i+1..]`, so a search can start from any interior
/// letter. After `semi_minimize` the arena contains aliased subtrees and must
/// be treated as read-only.
#[derive(Debug, Clone)]
pub struct Gaddag {
    nodes: Vec<Node>,
    root: NodeId,
    word_count: usize,
    frozen: bool,
}

/// Uppercases, folds French diacritics (including Œ→OE and Æ→AE) and drops
/// everything that is not A-Z.
pub fn normalize_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars().flat_map(char::to_uppercase) {
        match c {
            'A'..='Z' => out.push(c),
            'À' | 'Â' | 'Ä' | 'Á' | 'Ã' | 'Å' => out.push('A'),
            'Ç' => out.push('C'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'Ñ' => out.push('N'),
            'Ò' | 'Ó' | 'Ô' | 'Ö' | 'Õ' => out.push('O'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('U'),
            'Ý' | 'Ÿ' => out.push('Y'),
            'Œ' => out.push_str("OE"),
            'Æ' => out.push_str("AE"),
            _ => {}
        }
    }
    out
}

/// A vocabulary word: 2-15 letters, A-Z only after normalization.
pub fn is_valid_word(word: &str) -> bool {
    (MIN_WORD_LENGTH..=MAX_WORD_LENGTH).contains(&word.len())
        && word.bytes().all(|b| b.is_ascii_uppercase())
}

impl Default for Gaddag {
    fn default() -> Self {
        Self::new()
    }
}

impl Gaddag {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            root: 0,
            word_count: 0,
            frozen: false,
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut gaddag = Self::new();
        for word in words {
            gaddag.add_word(word.as_ref());
        }
        gaddag
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Adds a word, inserting its n+1 transition sequences. Returns false if
    /// the word does not survive normalization/validation; such words are
    /// silently skipped during bulk loads.
    pub fn add_word(&mut self, word: &str) -> bool {
        debug_assert!(!self.frozen, "add_word after semi_minimize");
        let word = normalize_word(word);
        if !is_valid_word(&word) {
            return false;
        }
        let bytes = word.as_bytes();

        // Pure forward representation: +WORD
        let mut seq = Vec::with_capacity(bytes.len() + 1);
        seq.push(DELIMITER);
        seq.extend_from_slice(bytes);
        self.insert_sequence(&seq);

        // One pivoted representation per interior start letter
        for i in 0..bytes.len() {
            seq.clear();
            seq.extend(bytes[..=i].iter().rev());
            seq.push(DELIMITER);
            seq.extend_from_slice(&bytes[i + 1..]);
            self.insert_sequence(&seq);
        }

        self.word_count += 1;
        true
    }

    fn insert_sequence(&mut self, sequence: &[u8]) {
        let mut node = self.root;
        for &byte in sequence {
            node = match self.nodes[node as usize].transitions.get(&byte) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len() as NodeId;
                    self.nodes.push(Node::default());
                    self.nodes[node as usize].transitions.insert(byte, next);
                    next
                }
            };
        }
        self.nodes[node as usize].terminal = true;
    }

    fn walk(&self, start: NodeId, sequence: &[u8]) -> Option<NodeId> {
        let mut node = start;
        for byte in sequence {
            node = *self.nodes[node as usize].transitions.get(byte)?;
        }
        Some(node)
    }

    /// Whole-word membership. Both stored representations are consulted: a
    /// plain walk of the letters and a walk of `+word`.
    pub fn contains(&self, word: &str) -> bool {
        let word = normalize_word(word);
        if !is_valid_word(&word) {
            return false;
        }

        if let Some(node) = self.walk(self.root, word.as_bytes()) {
            if self.nodes[node as usize].terminal {
                return true;
            }
        }

        let mut seq = Vec::with_capacity(word.len() + 1);
        seq.push(DELIMITER);
        seq.extend_from_slice(word.as_bytes());
        match self.walk(self.root, &seq) {
            Some(node) => self.nodes[node as usize].terminal,
            None => false,
        }
    }

    /// Letters reachable after a raw prefix walk from the root.
    pub fn possible_letters(&self, prefix: &str) -> BTreeSet<char> {
        match self.walk(self.root, prefix.as_bytes()) {
            Some(node) => self.nodes[node as usize]
                .transitions
                .keys()
                .map(|&b| b as char)
                .collect(),
            None => BTreeSet::new(),
        }
    }

    /// Loads a word-per-line dictionary. Invalid words are skipped without
    /// being counted; a missing file is a hard failure.
    pub fn load_dictionary<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("dictionary not found: {}", path.as_ref().display()))?;
        let reader = BufReader::new(file);
        let mut loaded = 0;
        for line in reader.lines() {
            let line = line?;
            if self.add_word(line.trim()) {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Every dictionary word matching the skeleton (fixed letters at fixed
    /// offsets), with all remaining letters drawn from `available` or the
    /// skeleton values themselves. Sorted and deduplicated.
    pub fn find_words_with_skeleton(
        &self,
        skeleton: &BTreeMap<usize, char>,
        available: &HashSet<char>,
    ) -> Vec<String> {
        let skeleton: BTreeMap<isize, u8> = skeleton
            .iter()
            .filter_map(|(&pos, &letter)| {
                let norm = normalize_word(&letter.to_string());
                norm.bytes().next().map(|b| (pos as isize, b))
            })
            .collect();
        let mut allowed: HashSet<u8> = available
            .iter()
            .filter_map(|&letter| normalize_word(&letter.to_string()).bytes().next())
            .collect();
        allowed.extend(skeleton.values().copied());

        let max_skeleton_pos = skeleton.keys().next_back().copied().unwrap_or(-1);
        let search = SkeletonSearch {
            gaddag: self,
            skeleton,
            allowed,
        };

        let mut words = BTreeSet::new();
        let mut buf = Vec::with_capacity(MAX_WORD_LENGTH);
        search.backward(self.root, &mut buf, max_skeleton_pos + 1, &mut words);
        words
            .into_iter()
            .map(|w| w.into_iter().map(char::from).collect())
            .collect()
    }

    /// Compacts the arena by aliasing structurally identical subtrees.
    /// Accepted words are unchanged; the automaton is frozen afterwards.
    pub fn semi_minimize(&mut self) {
        // Post-order over the (still tree-shaped) arena, children first
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, false)];
        let mut seen = vec![false; self.nodes.len()];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if seen[id as usize] {
                continue;
            }
            seen[id as usize] = true;
            stack.push((id, true));
            for &target in self.nodes[id as usize].transitions.values() {
                stack.push((target, false));
            }
        }

        let mut alias: Vec<NodeId> = (0..self.nodes.len() as NodeId).collect();
        let mut canonical: HashMap<(bool, Vec<(u8, NodeId)>), NodeId> = HashMap::new();
        for id in order {
            // Point every transition at its canonical target, then dedupe the
            // node itself on the rewritten signature
            let targets: Vec<(u8, NodeId)> = self.nodes[id as usize]
                .transitions
                .iter()
                .map(|(&byte, &target)| (byte, alias[target as usize]))
                .collect();
            self.nodes[id as usize].transitions = targets.iter().copied().collect();
            let sig = (self.nodes[id as usize].terminal, targets);
            alias[id as usize] = *canonical.entry(sig).or_insert(id);
        }
        self.root = alias[self.root as usize];
        self.frozen = true;
    }

    /// Node/transition counts by identity-keyed traversal. Aliased nodes are
    /// counted once.
    pub fn statistics(&self) -> GaddagStats {
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        let mut node_count = 0;
        let mut transition_count = 0;
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = &self.nodes[id as usize];
            node_count += 1;
            transition_count += node.transitions.len();
            stack.extend(node.transitions.values().copied());
        }
        GaddagStats {
            word_count: self.word_count,
            node_count,
            transition_count,
        }
    }
}

struct SkeletonSearch<'a> {
    gaddag: &'a Gaddag,
    skeleton: BTreeMap<isize, u8>,
    allowed: HashSet<u8>,
}

impl SkeletonSearch<'_> {
    fn required(&self, pos: isize) -> Option<u8> {
        self.skeleton.get(&pos).copied()
    }

    /// Full consistency check against every skeleton offset. Needed at accept
    /// time because some offsets lie past the point the walk first reached.
    fn accepts(&self, word: &[u8]) -> bool {
        let max_pos = self.skeleton.keys().next_back().copied().unwrap_or(-1);
        if (word.len() as isize) <= max_pos {
            return false;
        }
        word.iter().enumerate().all(|(i, &letter)| {
            match self.required(i as isize) {
                Some(required) => letter == required,
                None => self.allowed.contains(&letter),
            }
        })
    }

    /// Fixed offsets falling inside the word's current span must agree.
    fn partial_ok(&self, word: &[u8], word_start: isize) -> bool {
        self.skeleton.iter().all(|(&pos, &required)| {
            let rel = pos - word_start;
            if rel >= 0 && (rel as usize) < word.len() {
                word[rel as usize] == required
            } else {
                true
            }
        })
    }

    fn backward(
        &self,
        node: NodeId,
        word: &mut Vec<u8>,
        pos: isize,
        words: &mut BTreeSet<Vec<u8>>,
    ) {
        let n = &self.gaddag.nodes[node as usize];
        if n.terminal && self.accepts(word) {
            words.insert(word.clone());
        }
        if word.len() >= MAX_WORD_LENGTH {
            return;
        }

        for (&byte, &next) in &n.transitions {
            if byte == DELIMITER {
                self.forward(next, word, pos + 1, words);
            } else {
                let fits = match self.required(pos) {
                    Some(required) => byte == required,
                    None => self.allowed.contains(&byte),
                };
                if fits {
                    word.insert(0, byte);
                    self.backward(next, word, pos - 1, words);
                    word.remove(0);
                }
            }
        }
    }

    fn forward(
        &self,
        node: NodeId,
        word: &mut Vec<u8>,
        word_start: isize,
        words: &mut BTreeSet<Vec<u8>>,
    ) {
        if word.len() > MAX_WORD_LENGTH {
            return;
        }
        if !self.partial_ok(word, word_start) {
            return;
        }

        let n = &self.gaddag.nodes[node as usize];
        if n.terminal && word.len() >= MIN_WORD_LENGTH && self.accepts(word) {
            words.insert(word.clone());
        }

        let current_pos = word_start + word.len() as isize - 1;
        for (&byte, &next) in &n.transitions {
            if byte == DELIMITER {
                continue;
            }
            let next_pos = current_pos + 1;
            let fits = match self.required(next_pos) {
                Some(required) => byte == required,
                None => self.allowed.contains(&byte),
            };
            if fits {
                word.push(byte);
                self.forward(next, word, word_start, words);
                word.pop();
            }
        }
    }
}
