use gemtui::engine::clock::TICK;
use gemtui::engine::matcher;
use gemtui::engine::{
    Engine, EngineConfig, EngineEvent, GemKind, GemSource, Grid, Phase, Pos, ScriptedSource,
};
use test_log::test;

/// 8x8 board with no runs. Swapping (3,3) and (3,4) lines up three reds in row 3, columns 1..=3.
const BOARD: &str = "RBPGYRBP
                     GYRBPGYR
                     BPGYRBPG
                     YRRPRYRB
                     PGYRBPGY
                     RBPGYRBP
                     GYRBPGYR
                     BPGYRBPG";

fn config() -> EngineConfig {
    EngineConfig {
        ensure_playable: false,
        ..EngineConfig::default()
    }
}

fn scripted(script: &[GemKind]) -> Engine<ScriptedSource> {
    let grid = Grid::parse(BOARD).unwrap();
    Engine::from_grid(config(), grid, ScriptedSource::new(script.iter().copied(), 11)).unwrap()
}

fn run_until_idle<S: GemSource>(engine: &mut Engine<S>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    for _ in 0..2000 {
        events.extend(engine.step(TICK));
        if engine.is_input_enabled() {
            return events;
        }
    }
    panic!("engine never settled");
}

fn awards(events: &[EngineEvent]) -> Vec<(u32, u32, usize)> {
    events
        .iter()
        .filter_map(|e| match *e {
            EngineEvent::ScoreAwarded {
                delta, depth, gems, ..
            } => Some((delta, depth, gems)),
            _ => None,
        })
        .collect()
}

#[test]
fn fixed_board_has_no_runs() {
    let grid = Grid::parse(BOARD).unwrap();
    assert!(matcher::scan(&grid).is_empty());
}

#[test]
fn single_run_swap_removes_three_and_drops_three_columns() {
    use GemKind::*;
    let mut engine = scripted(&[Yellow, Red, Green]);
    engine.request_swap(Pos::new(3, 3), Pos::new(3, 4)).unwrap();

    // The swap animation runs for 12 ticks; the cascade step resolves on the tick it lands.
    let mut events = Vec::new();
    for _ in 0..12 {
        events.extend(engine.step(TICK));
    }
    assert_eq!(engine.phase(), Phase::Falling(1));
    let removed: Vec<Pos> = events
        .iter()
        .filter_map(|e| match *e {
            EngineEvent::GemRemoved { pos, .. } => Some(pos),
            _ => None,
        })
        .collect();
    assert_eq!(removed, vec![Pos::new(3, 1), Pos::new(3, 2), Pos::new(3, 3)]);
    assert_eq!(awards(&events), vec![(30, 1, 3)]);

    let view = engine.snapshot();
    for cell in view.cells.iter().flatten() {
        if cell.falling {
            assert!((1..=3).contains(&cell.pos.col), "{} should not fall", cell.pos);
            assert!(cell.pos.row <= 3);
            assert!(cell.visual_row < cell.pos.row as f32);
        }
    }
    let falling = view.cells.iter().flatten().filter(|c| c.falling).count();
    assert_eq!(falling, 12);

    let rest = run_until_idle(&mut engine);
    assert!(rest.contains(&EngineEvent::CascadeFinished { depth: 1, moves: 1 }));
    let view = engine.snapshot();
    assert_eq!(view.score, 30);
    for cell in view.cells.iter().flatten() {
        assert!(!cell.falling);
        assert_eq!(cell.visual_row, cell.pos.row as f32);
    }
    assert_eq!(view.cell(Pos::new(0, 1)).map(|c| c.kind), Some(Yellow));
    assert_eq!(view.cell(Pos::new(3, 1)).map(|c| c.kind), Some(Purple));
}

#[test]
fn scripted_refill_chains_to_depth_two() {
    use GemKind::*;
    // Three blues refill row 0 of columns 1..=3 and line up; the second refill is quiet.
    let mut engine = scripted(&[Blue, Blue, Blue, Purple, Green, Purple]);
    engine.request_swap(Pos::new(3, 3), Pos::new(3, 4)).unwrap();
    let events = run_until_idle(&mut engine);

    assert_eq!(awards(&events), vec![(30, 1, 3), (60, 2, 3)]);
    assert!(events.contains(&EngineEvent::CascadeFinished { depth: 2, moves: 1 }));
    let summary = engine.summary();
    assert_eq!(summary.score, 90);
    assert_eq!(summary.max_combo, 2);
    assert_eq!(summary.moves, 1);
    assert_eq!(engine.last_cascade_passes(), 2);
    assert!(matcher::scan(engine.grid()).is_empty());
}

#[test]
fn reverted_swap_leaves_kinds_unchanged() {
    let mut engine = scripted(&[]);
    let before = engine.grid().kinds();
    // (0,0) R and (0,1) B: no run either way.
    engine.request_swap(Pos::new(0, 0), Pos::new(0, 1)).unwrap();
    let events = run_until_idle(&mut engine);

    assert!(events.contains(&EngineEvent::SwapReverted {
        a: Pos::new(0, 0),
        b: Pos::new(0, 1)
    }));
    assert!(!events.iter().any(|e| matches!(e, EngineEvent::ScoreAwarded { .. })));
    assert_eq!(engine.grid().kinds(), before);
    assert_eq!(engine.summary().moves, 0);
}

#[test]
fn seeded_cascades_terminate_and_settle() {
    for seed in 0..12 {
        let mut engine = Engine::new(EngineConfig::default(), seed).unwrap();
        for _ in 0..5 {
            let Some((a, b)) = engine.hint() else {
                panic!("seed {seed}: playable board has no hint");
            };
            engine.request_swap(a, b).unwrap();
            let events = run_until_idle(&mut engine);

            assert!(events.contains(&EngineEvent::SwapCommitted { a, b }));
            let grid = engine.grid();
            assert!(engine.last_cascade_passes() <= grid.rows() * grid.cols());
            assert!(grid.is_full());
            assert!(matcher::scan(grid).is_empty());
            assert!(grid.gems().all(|g| !g.falling && !g.matched));
        }
    }
}

#[test]
fn committed_iff_swapped_grid_matches() {
    let grid = Grid::parse(BOARD).unwrap();
    let pairs = [
        (Pos::new(3, 3), Pos::new(3, 4)),
        (Pos::new(0, 0), Pos::new(1, 0)),
        (Pos::new(5, 5), Pos::new(5, 6)),
    ];
    for (a, b) in pairs {
        let mut swapped = grid.clone();
        swapped.swap(a, b).unwrap();
        let expect_match = !matcher::scan(&swapped).is_empty();

        let mut engine = scripted(&[]);
        engine.request_swap(a, b).unwrap();
        let events = run_until_idle(&mut engine);
        let committed = events.contains(&EngineEvent::SwapCommitted { a, b });
        let reverted = events.contains(&EngineEvent::SwapReverted { a, b });
        assert_eq!(committed, expect_match, "{a} <-> {b}");
        assert_eq!(reverted, !expect_match, "{a} <-> {b}");
    }
}

#[test]
fn input_is_dropped_while_resolving() {
    let mut engine = scripted(&[]);
    engine.request_swap(Pos::new(3, 3), Pos::new(3, 4)).unwrap();
    assert!(!engine.is_input_enabled());
    assert!(engine.hint().is_none());
    assert_eq!(
        engine.select(Pos::new(0, 0)),
        gemtui::engine::SelectOutcome::Ignored
    );
    run_until_idle(&mut engine);
    assert!(engine.snapshot().selection.is_none());
}

#[test]
fn dead_board_after_cascade_is_reshuffled() {
    use GemKind::*;
    // Swapping (0,2) and (1,2) clears the top row; the scripted refill leaves YPO/GBG/WOW,
    // where no swap lines anything up.
    let grid = Grid::parse(
        "RRG
         GBR
         WOW",
    )
    .unwrap();
    let config = EngineConfig {
        ensure_playable: true,
        ..EngineConfig::default()
    };
    let source = ScriptedSource::new([Yellow, Purple, Orange], 5);
    let mut engine = Engine::from_grid(config, grid, source).unwrap();
    engine.request_swap(Pos::new(0, 2), Pos::new(1, 2)).unwrap();
    let events = run_until_idle(&mut engine);

    let tail: Vec<&EngineEvent> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                EngineEvent::CascadeFinished { .. } | EngineEvent::Reshuffled { .. }
            )
        })
        .collect();
    assert_eq!(tail, vec![
        &EngineEvent::CascadeFinished { depth: 1, moves: 1 },
        &EngineEvent::Reshuffled { playable: true },
    ]);
    assert!(matcher::scan(engine.grid()).is_empty());
    assert!(matcher::has_legal_move(engine.grid()));
    assert!(engine.grid().is_full());
}
