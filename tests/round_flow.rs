use std::{fs, path::Path, sync::Arc};

use cluequiz::{
    config::AppConfig,
    dao::{
        clue_set::CategorySet,
        save::{MemoryStore, PersistedSave, SaveError, load_save},
    },
    input::{
        InputMerger, ScriptedSource, SourceKind,
        keyboard::{HeldButtons, KeyboardSource},
    },
    services::{
        bootstrap,
        controller::{ControllerInput, ModeratorKey, PresentationController},
    },
    state::{
        GameSession, Phase, SessionRules, SessionSetup,
        board::{BoardShapeError, Cell, CellPos, PlayerId},
        events::{EventHub, RoundEventKind},
        rotation::Rotation,
    },
};

fn player(index: usize) -> PlayerId {
    PlayerId::new(index).unwrap()
}

fn pos(column: usize, row: usize) -> CellPos {
    CellPos::new(column, row).unwrap()
}

fn asset_yaml() -> String {
    let mut yaml = String::new();
    for c in 0..6 {
        yaml.push_str(&format!("Topic {c}:\n"));
        for r in 0..5 {
            yaml.push_str(&format!("  - clue: Q{c}{r}\n    question: A{c}{r}\n"));
        }
    }
    yaml
}

fn session(rules: SessionRules, store: MemoryStore, events: EventHub) -> GameSession {
    let set = CategorySet::from_yaml_str(Path::new("round.yml"), &asset_yaml()).unwrap();
    GameSession::new(SessionSetup {
        rules,
        clue_sets: Rotation::new(vec![Arc::new(set)]).unwrap(),
        store: Box::new(store),
        events,
        restore: None,
    })
}

struct Show {
    controller: PresentationController,
    keys: HeldButtons,
    device: ScriptedSource,
    store: MemoryStore,
}

fn show(viewer: bool) -> Show {
    let store = MemoryStore::new();
    let keys = HeldButtons::new();
    let device = ScriptedSource::new(SourceKind::Device);
    let merger = InputMerger::new()
        .with(Box::new(KeyboardSource::new(keys.clone())))
        .with(Box::new(device.clone()));
    let session = session(SessionRules::default(), store.clone(), EventHub::default());
    Show {
        controller: PresentationController::new(session, merger, viewer),
        keys,
        device,
        store,
    }
}

fn click(column: usize, row: usize) -> ControllerInput {
    ControllerInput::Pointer { column, row }
}

fn key(key: ModeratorKey) -> ControllerInput {
    ControllerInput::Key(key)
}

#[test]
fn correct_answer_on_a_fresh_board() {
    let mut show = show(false);
    let ctl = &mut show.controller;

    ctl.handle(click(2, 3));
    show.device.press(player(1));
    ctl.tick();
    ctl.handle(key(ModeratorKey::Accept));

    let session = ctl.session();
    assert_eq!(session.cell(pos(2, 3)), Cell::Claimed(player(1)));
    assert_eq!(session.scores(), [0, 400, 0, 0]);
    assert_eq!(session.choosing(), player(1));
    assert_eq!(session.history_len(), 2);
    assert_eq!(show.store.latest().unwrap().scores, [0, 400, 0, 0]);
}

#[test]
fn four_wrong_answers_reveal_the_clue() {
    let mut show = show(false);
    let ctl = &mut show.controller;
    ctl.handle(click(2, 3));

    for index in [1, 0, 3, 2] {
        show.device.press(player(index));
        ctl.tick();
        assert_eq!(ctl.phase(), Phase::Responding(player(index)));
        ctl.handle(key(ModeratorKey::Reject));
    }

    assert_eq!(ctl.phase(), Phase::DisplayQuestion);
    let session = ctl.session();
    assert_eq!(session.scores(), [-400; 4]);
    assert_eq!(session.cell(pos(2, 3)), Cell::Ignored);
    assert_eq!(session.choosing(), player(0));
}

#[test]
fn held_keyboard_key_counts_once_per_clue() {
    let mut show = show(false);
    let ctl = &mut show.controller;
    ctl.handle(click(0, 0));

    show.keys.press(player(2));
    ctl.tick();
    assert_eq!(ctl.phase(), Phase::Responding(player(2)));
    ctl.handle(key(ModeratorKey::Reject));

    ctl.tick();
    ctl.tick();
    assert_eq!(ctl.phase(), Phase::DisplayClue);

    show.device.press(player(0));
    ctl.tick();
    assert_eq!(ctl.phase(), Phase::Responding(player(0)));
}

#[test]
fn device_beats_keyboard() {
    let mut show = show(false);
    let ctl = &mut show.controller;
    ctl.handle(click(1, 1));

    show.keys.press(player(3));
    show.device.press(player(1));
    ctl.tick();
    assert_eq!(ctl.phase(), Phase::Responding(player(1)));
}

#[test]
fn undo_restores_the_previous_commit() {
    let mut show = show(false);
    let ctl = &mut show.controller;

    ctl.handle(click(4, 0));
    show.device.press(player(2));
    ctl.tick();
    ctl.handle(key(ModeratorKey::Accept));
    ctl.handle(key(ModeratorKey::Other));
    let board = ctl.session().board().clone();
    let scores = ctl.session().scores();

    ctl.handle(click(3, 4));
    show.device.press(player(2));
    ctl.tick();
    ctl.handle(key(ModeratorKey::Accept));
    ctl.handle(key(ModeratorKey::Other));
    assert_eq!(ctl.session().score(player(2)), 600);

    assert_eq!(ctl.handle(key(ModeratorKey::Undo)), Phase::Choosing);
    assert_eq!(ctl.session().board(), &board);
    assert_eq!(ctl.session().scores(), scores);
    assert_eq!(show.store.latest().unwrap().scores, scores);
}

#[test]
fn viewer_mode_never_scores() {
    let mut show = show(true);
    let ctl = &mut show.controller;

    assert_eq!(ctl.handle(click(0, 4)), Phase::DisplayQuestion);
    assert_eq!(ctl.current_clue().unwrap().answer, "A04");
    show.device.press(player(0));
    ctl.tick();
    assert_eq!(ctl.handle(key(ModeratorKey::Accept)), Phase::Choosing);

    assert_eq!(ctl.session().scores(), [0; 4]);
    assert!(ctl.session().cell(pos(0, 4)).is_unrevealed());
    assert_eq!(show.store.count(), 0);
}

#[test]
fn override_lets_players_retry() {
    let events = EventHub::new(32);
    let mut rx = events.subscribe();
    let mut session = session(
        SessionRules {
            ignore_responded: true,
        },
        MemoryStore::new(),
        events,
    );

    session.select_cell(pos(5, 1)).unwrap();
    for _ in 0..3 {
        assert!(session.set_responder(player(0)));
        session.mark_wrong().unwrap();
    }
    assert!(!session.all_responded());
    assert_eq!(session.score(player(0)), -600);

    let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|event| event.name)
        .collect();
    assert_eq!(kinds.first(), Some(&RoundEventKind::Select));
    assert_eq!(kinds.len(), 7);
}

#[test]
fn saves_reload_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let set = dir.path().join("round.yml");
    fs::write(&set, asset_yaml()).unwrap();
    let autosave = dir.path().join("autosave.yml");
    let yaml = format!(
        "serial:\n  port: {}\nautosave: {}\nclue-sets:\n  - {}\n",
        dir.path().join("no-tty").display(),
        autosave.display(),
        set.display()
    );
    let config = AppConfig::from_yaml_str(&yaml).unwrap();

    let mut session = bootstrap::build_session(&config, None, EventHub::default()).unwrap();
    session.set_name(player(0), "Ada");
    session.select_cell(pos(1, 4)).unwrap();
    session.set_responder(player(0));
    session.mark_correct().unwrap();

    let restored = load_save(&autosave).unwrap();
    let resumed = bootstrap::build_session(&config, Some(restored), EventHub::default()).unwrap();
    assert_eq!(resumed.name(player(0)), "Ada");
    assert_eq!(resumed.score(player(0)), 500);
    assert_eq!(resumed.cell(pos(1, 4)), Cell::Claimed(player(0)));
    assert_eq!(resumed.history_len(), 1);
}

#[test]
fn five_column_save_is_rejected() {
    let column = "  - [null, null, null, null, null]\n";
    let yaml = format!(
        "board:\n{}scores: [0, 0, 0, 0]\nnames: [a, b, c, d]\nchoosing: 0\n",
        column.repeat(5)
    );
    let err = PersistedSave::from_yaml_str(Path::new("save.yml"), &yaml).unwrap_err();
    assert!(matches!(err, SaveError::Board(BoardShapeError::Columns(5))));
}
