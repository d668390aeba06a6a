use gridgen::cbic::{
    build_grid, build_grid_quiet, BuildConfig, BuildEvent, BuildObserver, SupportLetters,
};
use gridgen::gaddag::Gaddag;

fn dictionary() -> Gaddag {
    Gaddag::from_words([
        "DATAIS", "TRAIN", "SALON", "RADIS", "CHAT", "CHATS", "TROP", "BOBO", "MAISON",
    ])
}

fn config(central: &str) -> BuildConfig {
    BuildConfig {
        central_word: central.to_string(),
        ..BuildConfig::default()
    }
}

#[test]
fn empty_vocabulary_places_only_central() {
    let gaddag = dictionary();
    let mut result = build_grid_quiet(&[], &gaddag, &SupportLetters::new(), &config("DATAIS"));

    assert_eq!(
        result.placed.iter().collect::<Vec<_>>(),
        vec![&"DATAIS".to_string()]
    );
    assert!(result.unplaced.is_empty());
    assert_eq!(result.rounds, 0);
    assert!(!result.capped);
    assert!(!result.board.is_empty());
    assert_eq!(result.graph.central(), Some("DATAIS"));
    assert!(result.graph.unconnected_words().is_empty());
}

#[test]
fn placed_words_are_connected_to_central() {
    let gaddag = dictionary();
    let words = ["train", "SALON", "RADIS"].map(String::from);
    let mut result = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config("DATAIS"));

    // Lowercase input was normalized on the way in
    assert!(result.placed.contains("TRAIN"));
    assert!(result.unplaced.is_empty());

    let central = result.graph.id_of("DATAIS").unwrap();
    for word in result.placed.clone() {
        let id = result.graph.id_of(&word).unwrap();
        assert!(
            result.graph.union_find_mut().are_connected(central, id),
            "{word} was placed but is not connected to the central word"
        );
        if word != "DATAIS" {
            assert!(
                !result.graph.node(&word).unwrap().connections.is_empty(),
                "{word} has no recorded connection"
            );
        }
    }
}

#[test]
fn unplaceable_word_is_reported_not_aborted() {
    let gaddag = dictionary();
    // BOBO shares no letter with DATAIS or the other review words' letters
    let words = ["TRAIN", "BOBO"].map(String::from);
    let result = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config("DATAIS"));

    assert!(result.placed.contains("TRAIN"));
    assert!(result.unplaced.contains("BOBO"));
    assert!(!result.capped);

    let mut graph = result.graph;
    let report = graph.unconnected_words();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].word, "BOBO");
    assert!(!report[0].in_graph);
    assert_eq!(report[0].distance, None);
}

#[test]
fn round_budget_caps_the_build() {
    let gaddag = dictionary();
    let words = ["TRAIN", "SALON", "RADIS"].map(String::from);
    let config = BuildConfig {
        central_word: "DATAIS".to_string(),
        max_rounds: 1,
    };
    let result = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config);

    assert_eq!(result.rounds, 1);
    assert!(result.capped);
    assert_eq!(result.placed.len(), 2); // central + one round
    assert_eq!(result.unplaced.len(), 2);
}

#[test]
fn builds_are_deterministic() {
    let gaddag = dictionary();
    let words = ["TRAIN", "SALON", "RADIS", "CHAT"].map(String::from);

    let first = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config("DATAIS"));
    let second = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config("DATAIS"));

    assert_eq!(first.placed, second.placed);
    assert_eq!(first.unplaced, second.unplaced);
    assert_eq!(first.board.to_string(), second.board.to_string());
}

#[derive(Default)]
struct RecordingObserver {
    events: Vec<String>,
}

impl BuildObserver for RecordingObserver {
    fn notify(&mut self, event: BuildEvent<'_>) {
        let tag = match event {
            BuildEvent::CentralPlaced { word, .. } => format!("central:{word}"),
            BuildEvent::PlacementApplied { placement, .. } => {
                format!("placed:{}", placement.word)
            }
            BuildEvent::WordsUnplaced { words } => format!("unplaced:{}", words.len()),
            BuildEvent::RoundLimitReached { .. } => "capped".to_string(),
        };
        self.events.push(tag);
    }
}

#[test]
fn observer_sees_the_whole_build() {
    let gaddag = dictionary();
    let words = ["TRAIN", "BOBO"].map(String::from);
    let mut observer = RecordingObserver::default();
    build_grid(
        &words,
        &gaddag,
        &SupportLetters::new(),
        &config("DATAIS"),
        &mut observer,
    );

    assert_eq!(observer.events[0], "central:DATAIS");
    assert!(observer.events.contains(&"placed:TRAIN".to_string()));
    assert_eq!(observer.events.last().unwrap(), "unplaced:1");
}

#[test]
fn minimized_automaton_builds_the_same_grid() {
    let mut gaddag = dictionary();
    let words = ["TRAIN", "SALON"].map(String::from);
    let plain = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config("DATAIS"));

    gaddag.semi_minimize();
    let minimized = build_grid_quiet(&words, &gaddag, &SupportLetters::new(), &config("DATAIS"));

    assert_eq!(plain.placed, minimized.placed);
    assert_eq!(plain.board.to_string(), minimized.board.to_string());
}
