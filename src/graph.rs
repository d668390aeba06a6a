use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::util::{Direction, Position};

/// Interned word handle; all graph internals are keyed by these.
pub type WordId = usize;

/// A direct intersection edge between two placed words. Always stored in
/// mirrored pairs so the graph stays logically undirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub word1: WordId,
    pub word2: WordId,
    pub position: Position,
    pub letter: char,
    pub is_support: bool,
    /// Hop count of this edge. Direct intersections are always 1.
    pub distance: u32,
}

impl Connection {
    pub fn mirrored(&self) -> Connection {
        Connection {
            word1: self.word2,
            word2: self.word1,
            ..*self
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordNode {
    pub word: WordId,
    pub position: Position,
    pub direction: Direction,
    pub connections: Vec<Connection>,
    pub degree: usize,
}

/// Disjoint sets over word ids with path compression and union by rank.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: Vec<WordId>,
    rank: Vec<u8>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grows the backing tables so `id` exists as a singleton.
    pub fn make_set(&mut self, id: WordId) {
        while self.parent.len() <= id {
            self.parent.push(self.parent.len());
            self.rank.push(0);
            self.size.push(1);
        }
    }

    pub fn find(&mut self, id: WordId) -> WordId {
        self.make_set(id);
        let mut root = id;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Compress the walked path
        let mut current = id;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    pub fn union(&mut self, a: WordId, b: WordId) {
        let mut root_a = self.find(a);
        let mut root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        if self.rank[root_a] < self.rank[root_b] {
            std::mem::swap(&mut root_a, &mut root_b);
        }
        self.parent[root_b] = root_a;
        self.size[root_a] += self.size[root_b];
        if self.rank[root_a] == self.rank[root_b] {
            self.rank[root_a] += 1;
        }
    }

    pub fn are_connected(&mut self, a: WordId, b: WordId) -> bool {
        self.find(a) == self.find(b)
    }

    pub fn component_size(&mut self, id: WordId) -> usize {
        let root = self.find(id);
        self.size[root]
    }
}

/// An expected word's connectivity status relative to the central word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unconnected {
    pub word: String,
    pub in_graph: bool,
    /// BFS hop count to the central word; `None` means unreachable.
    pub distance: Option<u32>,
}

/// Connectivity graph over placed words: intersections, components and
/// cached pairwise hop distances.
#[derive(Debug, Clone, Default)]
pub struct WordGraph {
    words: Vec<String>,
    index: HashMap<String, WordId>,
    nodes: HashMap<WordId, WordNode>,
    central: Option<WordId>,
    expected: BTreeSet<WordId>,
    support_letters: HashMap<WordId, HashMap<char, usize>>,
    union_find: UnionFind,
    distances: HashMap<WordId, HashMap<WordId, u32>>,
    paths: HashMap<WordId, HashMap<WordId, Vec<Connection>>>,
}

impl WordGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.index.get(word) {
            return id;
        }
        let id = self.words.len();
        self.words.push(word.to_string());
        self.index.insert(word.to_string(), id);
        id
    }

    pub fn word(&self, id: WordId) -> &str {
        &self.words[id]
    }

    pub fn id_of(&self, word: &str) -> Option<WordId> {
        self.index.get(word).copied()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.id_of(word).map_or(false, |id| self.nodes.contains_key(&id))
    }

    pub fn node(&self, word: &str) -> Option<&WordNode> {
        self.nodes.get(&self.id_of(word)?)
    }

    pub fn word_nodes(&self) -> impl Iterator<Item = &WordNode> {
        self.nodes.values()
    }

    pub fn word_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers a word as part of the target vocabulary without placing it.
    pub fn expect_word(&mut self, word: &str) {
        let id = self.intern(word);
        self.expected.insert(id);
    }

    pub fn set_support_letters(&mut self, word: &str, letters: HashMap<char, usize>) {
        let id = self.intern(word);
        self.support_letters.insert(id, letters);
    }

    pub fn set_central(&mut self, word: &str) {
        let id = self.intern(word);
        self.central = Some(id);
    }

    pub fn central(&self) -> Option<&str> {
        self.central.map(|id| self.word(id))
    }

    /// Authoritative support rule: the shared letter counts as a support
    /// connection iff it sits at the designated index of either word's
    /// support-letter map.
    pub fn is_support_connection(
        &self,
        word1: WordId,
        index1: usize,
        word2: WordId,
        index2: usize,
        letter: char,
    ) -> bool {
        let designated = |word: WordId, index: usize| {
            self.support_letters
                .get(&word)
                .and_then(|map| map.get(&letter))
                .map_or(false, |&at| at == index)
        };
        designated(word1, index1) || designated(word2, index2)
    }

    /// Registers a placed word. Idempotent when the word is already present.
    pub fn add_word(&mut self, word: &str, position: Position, direction: Direction) -> WordId {
        let id = self.intern(word);
        if !self.nodes.contains_key(&id) {
            self.nodes.insert(
                id,
                WordNode {
                    word: id,
                    position,
                    direction,
                    connections: Vec::new(),
                    degree: 0,
                },
            );
            self.union_find.make_set(id);
            self.expected.insert(id);
            self.distances.entry(id).or_default().insert(id, 0);
        }
        id
    }

    /// Appends the connection and its mirror, merges the two components and
    /// repairs the distance table for the affected closure only.
    pub fn add_connection(&mut self, connection: Connection) {
        if !self.nodes.contains_key(&connection.word1)
            || !self.nodes.contains_key(&connection.word2)
        {
            return;
        }
        let mirror = connection.mirrored();

        let node1 = self.nodes.get_mut(&connection.word1).expect("checked above");
        node1.connections.push(connection);
        node1.degree += 1;
        let node2 = self.nodes.get_mut(&connection.word2).expect("checked above");
        node2.connections.push(mirror);
        node2.degree += 1;

        self.union_find.union(connection.word1, connection.word2);
        self.repair_distances(connection);

        // Cached shortest paths are stale only for the two endpoints
        for id in [connection.word1, connection.word2] {
            self.paths.entry(id).or_default().clear();
            self.distances.entry(id).or_default().insert(id, 0);
        }
    }

    fn distance_between(&self, a: WordId, b: WordId) -> Option<u32> {
        self.distances.get(&a).and_then(|row| row.get(&b)).copied()
    }

    /// All-pairs relaxation restricted to the component the new edge touched.
    /// O(k^3) in the component size, not the whole graph.
    fn repair_distances(&mut self, connection: Connection) {
        let mut reachable = Vec::new();
        let mut visited: HashSet<WordId> = [connection.word1, connection.word2].into();
        let mut queue: VecDeque<WordId> = visited.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            reachable.push(id);
            for conn in &self.nodes[&id].connections {
                if visited.insert(conn.word2) {
                    queue.push_back(conn.word2);
                }
            }
        }

        for &id in &reachable {
            self.distances.entry(id).or_default().insert(id, 0);
        }
        let edge = connection.distance;
        self.distances
            .entry(connection.word1)
            .or_default()
            .insert(connection.word2, edge);
        self.distances
            .entry(connection.word2)
            .or_default()
            .insert(connection.word1, edge);

        for &k in &reachable {
            for &i in &reachable {
                for &j in &reachable {
                    let (Some(ik), Some(kj)) =
                        (self.distance_between(i, k), self.distance_between(k, j))
                    else {
                        continue;
                    };
                    let candidate = ik + kj;
                    if self.distance_between(i, j).map_or(true, |d| candidate < d) {
                        self.distances.entry(i).or_default().insert(j, candidate);
                        self.distances.entry(j).or_default().insert(i, candidate);
                    }
                }
            }
        }
    }

    /// Exact hop distance, if both words sit in a component the distance
    /// table has been repaired for.
    pub fn distance(&self, a: &str, b: &str) -> Option<u32> {
        let (a, b) = (self.id_of(a)?, self.id_of(b)?);
        self.distance_between(a, b)
    }

    /// Shortest connection path via BFS, cached per source word.
    pub fn shortest_path(&mut self, from: &str, to: &str) -> Option<Vec<Connection>> {
        let (from, to) = (self.id_of(from)?, self.id_of(to)?);
        self.shortest_path_ids(from, to)
    }

    fn shortest_path_ids(&mut self, from: WordId, to: WordId) -> Option<Vec<Connection>> {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return None;
        }
        if let Some(path) = self.paths.get(&from).and_then(|cache| cache.get(&to)) {
            return Some(path.clone());
        }

        let mut visited: HashSet<WordId> = [from].into();
        let mut queue: VecDeque<(WordId, Vec<Connection>)> = VecDeque::new();
        queue.push_back((from, Vec::new()));
        while let Some((current, path)) = queue.pop_front() {
            if current == to {
                self.paths
                    .entry(from)
                    .or_default()
                    .insert(to, path.clone());
                return Some(path);
            }
            for conn in &self.nodes[&current].connections {
                if visited.insert(conn.word2) {
                    let mut next_path = path.clone();
                    next_path.push(*conn);
                    queue.push_back((conn.word2, next_path));
                }
            }
        }
        None
    }

    /// Every simple path between two words, optionally bounded in hops.
    pub fn all_paths(
        &self,
        from: &str,
        to: &str,
        max_length: Option<usize>,
    ) -> Vec<Vec<Connection>> {
        let (Some(from), Some(to)) = (self.id_of(from), self.id_of(to)) else {
            return Vec::new();
        };
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut visited: HashSet<WordId> = [from].into();
        let mut path = Vec::new();
        self.paths_dfs(from, to, max_length, &mut visited, &mut path, &mut found);
        found
    }

    fn paths_dfs(
        &self,
        current: WordId,
        to: WordId,
        max_length: Option<usize>,
        visited: &mut HashSet<WordId>,
        path: &mut Vec<Connection>,
        found: &mut Vec<Vec<Connection>>,
    ) {
        if current == to {
            found.push(path.clone());
            return;
        }
        if max_length.is_some_and(|max| path.len() >= max) {
            return;
        }
        for conn in &self.nodes[&current].connections {
            if visited.insert(conn.word2) {
                path.push(*conn);
                self.paths_dfs(conn.word2, to, max_length, visited, path, found);
                path.pop();
                visited.remove(&conn.word2);
            }
        }
    }

    /// Expected words that are missing from the board or stranded outside the
    /// central word's component, with their hop distance to it. Without a
    /// central word everything is reported unreachable.
    pub fn unconnected_words(&mut self) -> Vec<Unconnected> {
        let mut report = Vec::new();
        let Some(central) = self.central else {
            for &id in &self.expected.clone() {
                report.push(Unconnected {
                    word: self.word(id).to_string(),
                    in_graph: self.nodes.contains_key(&id),
                    distance: None,
                });
            }
            report.sort_by(|a, b| a.word.cmp(&b.word));
            return report;
        };

        for id in self.expected.clone() {
            if id == central {
                continue;
            }
            if !self.nodes.contains_key(&id) {
                report.push(Unconnected {
                    word: self.word(id).to_string(),
                    in_graph: false,
                    distance: None,
                });
            } else if !self.union_find.are_connected(central, id) {
                let distance = self
                    .shortest_path_ids(central, id)
                    .map(|path| path.len() as u32);
                report.push(Unconnected {
                    word: self.word(id).to_string(),
                    in_graph: true,
                    distance,
                });
            }
        }
        report.sort_by(|a, b| a.word.cmp(&b.word));
        report
    }

    /// A path is valid when consecutive edges chain and at least one edge
    /// runs through a designated support letter.
    pub fn validate_path(&self, path: &[Connection]) -> bool {
        if path.is_empty() {
            return false;
        }
        for pair in path.windows(2) {
            if pair[0].word2 != pair[1].word1 {
                return false;
            }
        }
        path.iter().any(|conn| conn.is_support)
    }

    pub fn union_find_mut(&mut self) -> &mut UnionFind {
        &mut self.union_find
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn connect(
        graph: &mut WordGraph,
        a: &str,
        b: &str,
        at: Position,
        letter: char,
        is_support: bool,
    ) {
        let (a, b) = (graph.id_of(a).unwrap(), graph.id_of(b).unwrap());
        graph.add_connection(Connection {
            word1: a,
            word2: b,
            position: at,
            letter,
            is_support,
            distance: 1,
        });
    }

    #[test]
    fn test_union_find_algebra() {
        let mut uf = UnionFind::new();
        uf.make_set(0);
        uf.make_set(1);
        uf.make_set(2);
        assert!(!uf.are_connected(0, 1));
        assert_eq!(uf.component_size(0), 1);

        uf.union(0, 1);
        assert!(uf.are_connected(0, 1));
        assert_eq!(uf.component_size(0), 2);
        assert_eq!(uf.component_size(1), 2);

        uf.union(1, 2);
        assert_eq!(uf.component_size(2), 3);
        assert_eq!(uf.find(0), uf.find(2));
    }

    #[test]
    fn test_add_word_idempotent() {
        let mut graph = WordGraph::new();
        let id = graph.add_word("MAISON", pos(4, 5), Direction::Horizontal);
        let again = graph.add_word("MAISON", pos(9, 9), Direction::Vertical);
        assert_eq!(id, again);
        assert_eq!(graph.node("MAISON").unwrap().position, pos(4, 5));
        assert_eq!(graph.word_count(), 1);
        assert_eq!(graph.distance("MAISON", "MAISON"), Some(0));
    }

    #[test]
    fn test_connections_are_mirrored() {
        let mut graph = WordGraph::new();
        graph.add_word("MAISON", pos(4, 5), Direction::Horizontal);
        graph.add_word("PAPIER", pos(4, 7), Direction::Vertical);
        connect(&mut graph, "MAISON", "PAPIER", pos(4, 7), 'P', false);

        let maison = graph.node("MAISON").unwrap();
        let papier = graph.node("PAPIER").unwrap();
        assert_eq!(maison.degree, 1);
        assert_eq!(papier.degree, 1);
        assert_eq!(maison.connections[0].word2, papier.word);
        assert_eq!(papier.connections[0].word2, maison.word);
        assert_eq!(graph.distance("MAISON", "PAPIER"), Some(1));

        let (a, b) = (graph.id_of("MAISON").unwrap(), graph.id_of("PAPIER").unwrap());
        assert!(graph.union_find_mut().are_connected(a, b));
    }

    #[test]
    fn test_distance_repair_across_chain() {
        let mut graph = WordGraph::new();
        graph.add_word("UN", pos(0, 0), Direction::Horizontal);
        graph.add_word("DEUX", pos(0, 1), Direction::Vertical);
        graph.add_word("TROIS", pos(2, 0), Direction::Horizontal);
        connect(&mut graph, "UN", "DEUX", pos(0, 1), 'N', false);
        connect(&mut graph, "DEUX", "TROIS", pos(2, 1), 'U', false);

        assert_eq!(graph.distance("UN", "TROIS"), Some(2));
        assert_eq!(graph.distance("TROIS", "UN"), Some(2));

        // A direct edge shortens the cached distance
        connect(&mut graph, "UN", "TROIS", pos(2, 0), 'T', false);
        assert_eq!(graph.distance("UN", "TROIS"), Some(1));
    }

    #[test]
    fn test_shortest_and_all_paths() {
        let mut graph = WordGraph::new();
        for word in ["A", "B", "C", "D"] {
            graph.add_word(word, pos(0, 0), Direction::Horizontal);
        }
        connect(&mut graph, "A", "B", pos(0, 1), 'X', false);
        connect(&mut graph, "B", "D", pos(0, 2), 'X', false);
        connect(&mut graph, "A", "C", pos(1, 0), 'X', false);
        connect(&mut graph, "C", "D", pos(1, 2), 'X', false);

        let shortest = graph.shortest_path("A", "D").unwrap();
        assert_eq!(shortest.len(), 2);
        // Cached result is stable
        assert_eq!(graph.shortest_path("A", "D").unwrap().len(), 2);

        let all = graph.all_paths("A", "D", None);
        assert_eq!(all.len(), 2);
        let bounded = graph.all_paths("A", "D", Some(1));
        assert!(bounded.is_empty());
        assert!(graph.shortest_path("A", "MISSING").is_none());
    }

    #[test]
    fn test_unconnected_words() {
        let mut graph = WordGraph::new();
        graph.expect_word("ABSENT");
        graph.add_word("MAISON", pos(4, 5), Direction::Horizontal);
        graph.add_word("ILOT", pos(12, 0), Direction::Horizontal);

        // No central word designated yet: everything is unreachable
        let report = graph.unconnected_words();
        assert_eq!(report.len(), 3);
        assert!(report.iter().all(|u| u.distance.is_none()));

        graph.set_central("MAISON");
        let report = graph.unconnected_words();
        let words: Vec<&str> = report.iter().map(|u| u.word.as_str()).collect();
        assert_eq!(words, vec!["ABSENT", "ILOT"]);
        assert!(!report[0].in_graph);
        assert!(report[1].in_graph);

        // Connect the islet and it drops out of the report
        connect(&mut graph, "MAISON", "ILOT", pos(4, 5), 'I', false);
        let report = graph.unconnected_words();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].word, "ABSENT");
    }

    #[test]
    fn test_validate_path_requires_support_edge() {
        let mut graph = WordGraph::new();
        for word in ["A", "B", "C"] {
            graph.add_word(word, pos(0, 0), Direction::Horizontal);
        }
        connect(&mut graph, "A", "B", pos(0, 1), 'X', false);
        connect(&mut graph, "B", "C", pos(0, 2), 'X', true);

        let a_b = graph.node("A").unwrap().connections[0];
        let b_c = graph.node("B").unwrap().connections[1];
        assert!(graph.validate_path(&[a_b, b_c]));
        assert!(!graph.validate_path(&[a_b]));
        assert!(!graph.validate_path(&[]));
        // Broken chain
        let c_b = graph.node("C").unwrap().connections[0];
        assert!(!graph.validate_path(&[a_b, c_b]));
    }

    #[test]
    fn test_support_rule() {
        let mut graph = WordGraph::new();
        graph.set_support_letters("CHAT", [('T', 3)].into());
        let chat = graph.add_word("CHAT", pos(0, 0), Direction::Horizontal);
        let train = graph.add_word("TRAIN", pos(0, 3), Direction::Vertical);

        assert!(graph.is_support_connection(chat, 3, train, 0, 'T'));
        // Same letter at the wrong index is not a support connection
        assert!(!graph.is_support_connection(chat, 0, train, 0, 'T'));
        assert!(!graph.is_support_connection(train, 1, chat, 2, 'A'));
    }
}
