use ergomux::config::{Config, LayerId};
use ergomux::event_processor::actions::DualPhase;
use ergomux::event_processor::layer_stack::LayerSnapshot;
use ergomux::event_processor::resolver::Keymap;
use ergomux::event_processor::{Emit, KeyPos, KeyTransition, KeymapProcessor};
use ergomux::keycode::KeyCode;
use ergomux::persist::MemoryStore;
use ergomux::timer::Timestamp;
use smallvec::smallvec;

const BASE: LayerId = LayerId(0);
const NAV: LayerId = LayerId(1);
const SYMB: LayerId = LayerId(2);
const WIN: LayerId = LayerId(3);

const TEST_KEYMAP: &str = r#"(
    tapping_term_ms: 200,
    rows: 2,
    cols: 4,
    default_layer: "base",
    layers: [
        (
            name: "base",
            keys: [
                [DualTapHold(tap: [KC_A], hold: Layer("nav")), Plain(KC_B), Transparent, LayerToggle("symb")],
                [DualTapHold(tap: [KC_MHEN, KC_LANG2], hold: Modifier(KC_LALT)), LayerMove("nav"), LayerMove("symb"), Modifier(KC_LSFT)],
            ],
        ),
        (
            name: "nav",
            keys: [
                [Transparent, Plain(KC_LEFT), DefaultLayerSet("win"), Transparent],
                [Transparent, Transparent, Transparent, Transparent],
            ],
        ),
        (
            name: "symb",
            keys: [
                [Transparent, Plain(KC_1), Transparent, Transparent],
                [Chord(mods: [KC_LSFT, KC_LCTL], code: KC_TAB), Transparent, Transparent, Transparent],
            ],
        ),
        (
            name: "win",
            keys: [
                [Transparent, Plain(KC_X), Transparent, Transparent],
                [Transparent, Transparent, Transparent, Transparent],
            ],
        ),
    ],
)"#;

fn keymap() -> Keymap {
    let config = Config::from_ron_str(TEST_KEYMAP).expect("test keymap should parse");
    Keymap::from_config(&config).expect("test keymap should validate")
}

fn processor_with(store: MemoryStore) -> KeymapProcessor {
    KeymapProcessor::new(keymap(), Box::new(store))
}

fn processor() -> KeymapProcessor {
    processor_with(MemoryStore::new())
}

fn press(p: &mut KeymapProcessor, row: u8, col: u8, ms: u32) -> Vec<Emit> {
    p.process_key(KeyTransition::press(row, col, Timestamp(ms)))
        .into_vec()
}

fn release(p: &mut KeymapProcessor, row: u8, col: u8, ms: u32) -> Vec<Emit> {
    p.process_key(KeyTransition::release(row, col, Timestamp(ms)))
        .into_vec()
}

fn layers(default_layer: LayerId, active: &[LayerId]) -> Emit {
    Emit::LayerChanged(LayerSnapshot {
        default_layer,
        active: active.iter().copied().collect(),
    })
}

fn taps(emits: &[Emit]) -> usize {
    emits
        .iter()
        .filter(|e| matches!(e, Emit::TypeSequence(_)))
        .count()
}

#[test]
fn test_plain_key_press_release() {
    let mut p = processor();
    assert_eq!(press(&mut p, 0, 1, 0), vec![Emit::KeyDown(KeyCode::KC_B)]);
    assert_eq!(release(&mut p, 0, 1, 30), vec![Emit::KeyUp(KeyCode::KC_B)]);
}

#[test]
fn test_dual_layer_key_tapped_at_50ms() {
    let mut p = processor();

    // Hold side effect is applied immediately
    assert_eq!(press(&mut p, 0, 0, 0), vec![layers(BASE, &[NAV])]);
    p.tick(Timestamp(50));
    assert_eq!(p.dual_phase(KeyPos::new(0, 0)), Some(DualPhase::Undetermined));

    let emits = release(&mut p, 0, 0, 50);
    assert_eq!(
        emits,
        vec![
            layers(BASE, &[]),
            Emit::TypeSequence(smallvec![KeyCode::KC_A]),
        ]
    );
    assert!(p.layer_stack().layers().is_empty());
}

#[test]
fn test_dual_layer_key_held_for_400ms() {
    let mut p = processor();
    press(&mut p, 0, 0, 0);

    p.tick(Timestamp(199));
    assert_eq!(p.dual_phase(KeyPos::new(0, 0)), Some(DualPhase::Undetermined));
    p.tick(Timestamp(200));
    assert_eq!(p.dual_phase(KeyPos::new(0, 0)), Some(DualPhase::HoldResolved));

    let emits = release(&mut p, 0, 0, 400);
    assert_eq!(emits, vec![layers(BASE, &[])]);
    assert_eq!(p.dual_phase(KeyPos::new(0, 0)), None);
}

#[test]
fn test_release_after_term_without_tick_does_not_tap() {
    let mut p = processor();
    press(&mut p, 0, 0, 0);
    let emits = release(&mut p, 0, 0, 200);
    assert_eq!(taps(&emits), 0);
}

#[test]
fn test_tap_decided_by_release_timestamp() {
    let mut p = processor();
    press(&mut p, 1, 0, 0);

    // A tick from a clock running ahead of the event stamps
    p.tick(Timestamp(250));
    assert_eq!(p.dual_phase(KeyPos::new(1, 0)), Some(DualPhase::HoldResolved));

    assert_eq!(
        release(&mut p, 1, 0, 150),
        vec![
            Emit::KeyUp(KeyCode::KC_LALT),
            Emit::TypeSequence(smallvec![KeyCode::KC_MHEN, KeyCode::KC_LANG2]),
        ]
    );
}

#[test]
fn test_chord_holds_modifiers_around_key() {
    let mut p = processor();
    press(&mut p, 0, 3, 0);
    release(&mut p, 0, 3, 10);

    assert_eq!(
        press(&mut p, 1, 0, 20),
        vec![
            Emit::KeyDown(KeyCode::KC_LSFT),
            Emit::KeyDown(KeyCode::KC_LCTL),
            Emit::KeyDown(KeyCode::KC_TAB),
        ]
    );
    let mut held = p.get_held_keys();
    held.sort_by_key(|code| code.code());
    assert_eq!(held, vec![KeyCode::KC_TAB, KeyCode::KC_LCTL, KeyCode::KC_LSFT]);

    // Leaving symb while the chord is down still releases the chord
    assert_eq!(press(&mut p, 0, 3, 30), vec![layers(BASE, &[])]);
    assert_eq!(
        release(&mut p, 1, 0, 40),
        vec![
            Emit::KeyUp(KeyCode::KC_TAB),
            Emit::KeyUp(KeyCode::KC_LCTL),
            Emit::KeyUp(KeyCode::KC_LSFT),
        ]
    );
    assert!(p.get_held_keys().is_empty());
}

#[test]
fn test_nav_key_while_holding_dual_key() {
    let mut p = processor();
    press(&mut p, 0, 0, 0);

    assert_eq!(press(&mut p, 0, 1, 100), vec![Emit::KeyDown(KeyCode::KC_LEFT)]);
    assert_eq!(release(&mut p, 0, 1, 150), vec![Emit::KeyUp(KeyCode::KC_LEFT)]);

    p.tick(Timestamp(300));
    let emits = release(&mut p, 0, 0, 400);
    assert_eq!(emits, vec![layers(BASE, &[])]);
}

#[test]
fn test_quick_roll_types_both() {
    // Dual key released inside the term while another key is still down
    let mut p = processor();
    press(&mut p, 0, 0, 0);
    assert_eq!(press(&mut p, 0, 1, 50), vec![Emit::KeyDown(KeyCode::KC_LEFT)]);

    let emits = release(&mut p, 0, 0, 100);
    assert_eq!(
        emits,
        vec![
            layers(BASE, &[]),
            Emit::TypeSequence(smallvec![KeyCode::KC_A]),
        ]
    );

    // The key pressed on nav is released as what it was pressed as
    assert_eq!(release(&mut p, 0, 1, 120), vec![Emit::KeyUp(KeyCode::KC_LEFT)]);
}

#[test]
fn test_dual_modifier_key_tapped_types_sequence() {
    let mut p = processor();
    assert_eq!(press(&mut p, 1, 0, 0), vec![Emit::KeyDown(KeyCode::KC_LALT)]);
    assert_eq!(
        release(&mut p, 1, 0, 120),
        vec![
            Emit::KeyUp(KeyCode::KC_LALT),
            Emit::TypeSequence(smallvec![KeyCode::KC_MHEN, KeyCode::KC_LANG2]),
        ]
    );
}

#[test]
fn test_dual_modifier_key_held_only_modifies() {
    let mut p = processor();
    press(&mut p, 1, 0, 0);
    p.tick(Timestamp(250));
    assert_eq!(press(&mut p, 0, 1, 260), vec![Emit::KeyDown(KeyCode::KC_B)]);
    release(&mut p, 0, 1, 280);
    assert_eq!(
        release(&mut p, 1, 0, 300),
        vec![Emit::KeyUp(KeyCode::KC_LALT)]
    );
}

#[test]
fn test_two_dual_keys_undetermined_at_once() {
    let mut p = processor();
    press(&mut p, 0, 0, 0);
    press(&mut p, 1, 0, 10);
    assert_eq!(p.dual_phase(KeyPos::new(0, 0)), Some(DualPhase::Undetermined));
    assert_eq!(p.dual_phase(KeyPos::new(1, 0)), Some(DualPhase::Undetermined));

    let emits = release(&mut p, 1, 0, 60);
    assert!(emits.contains(&Emit::TypeSequence(smallvec![
        KeyCode::KC_MHEN,
        KeyCode::KC_LANG2
    ])));

    let emits = release(&mut p, 0, 0, 100);
    assert!(emits.contains(&Emit::TypeSequence(smallvec![KeyCode::KC_A])));
}

#[test]
fn test_tap_across_timer_wraparound() {
    let mut p = processor();
    press(&mut p, 1, 0, u32::MAX - 20);
    p.tick(Timestamp(10));
    assert_eq!(p.dual_phase(KeyPos::new(1, 0)), Some(DualPhase::Undetermined));

    let emits = release(&mut p, 1, 0, 30);
    assert_eq!(taps(&emits), 1);
}

#[test]
fn test_tick_ignores_time_before_press() {
    let mut p = processor();
    press(&mut p, 0, 0, 1000);
    p.tick(Timestamp(500));
    assert_eq!(p.dual_phase(KeyPos::new(0, 0)), Some(DualPhase::Undetermined));
}

#[test]
fn test_toggle_twice_restores_stack() {
    let mut p = processor();
    let before = p.layer_stack().snapshot();

    assert_eq!(press(&mut p, 0, 3, 0), vec![layers(BASE, &[SYMB])]);
    assert!(release(&mut p, 0, 3, 10).is_empty());
    assert_eq!(press(&mut p, 0, 3, 20), vec![layers(BASE, &[])]);
    assert!(release(&mut p, 0, 3, 30).is_empty());

    assert_eq!(p.layer_stack().snapshot(), before);
}

#[test]
fn test_move_replaces_overlay() {
    let mut p = processor();
    press(&mut p, 0, 3, 0);
    release(&mut p, 0, 3, 10);

    assert_eq!(press(&mut p, 1, 1, 20), vec![layers(BASE, &[NAV])]);
    release(&mut p, 1, 1, 30);
    assert_eq!(press(&mut p, 1, 2, 40), vec![layers(BASE, &[SYMB])]);
    release(&mut p, 1, 2, 50);

    assert_eq!(p.layer_stack().layers(), &[SYMB]);
    assert_eq!(press(&mut p, 0, 1, 60), vec![Emit::KeyDown(KeyCode::KC_1)]);
}

#[test]
fn test_move_to_active_layer_is_silent() {
    let mut p = processor();
    press(&mut p, 1, 1, 0);
    release(&mut p, 1, 1, 10);
    assert!(press(&mut p, 1, 1, 20).is_empty());
}

#[test]
fn test_set_default_survives_restart() {
    let store = MemoryStore::new();
    let mut p = processor_with(store.clone());

    press(&mut p, 0, 0, 0);
    p.tick(Timestamp(250));
    assert_eq!(press(&mut p, 0, 2, 260), vec![layers(WIN, &[NAV])]);
    release(&mut p, 0, 2, 280);
    assert_eq!(release(&mut p, 0, 0, 300), vec![layers(WIN, &[])]);

    let mut restarted = processor_with(store);
    assert_eq!(restarted.layer_stack().default_layer(), WIN);
    assert!(restarted.layer_stack().layers().is_empty());
    assert_eq!(
        press(&mut restarted, 0, 1, 0),
        vec![Emit::KeyDown(KeyCode::KC_X)]
    );
}

#[test]
fn test_invalid_persisted_default_falls_back() {
    let p = processor_with(MemoryStore::with_layer(LayerId(42)));
    assert_eq!(p.layer_stack().default_layer(), BASE);
}

#[test]
fn test_out_of_range_event_ignored() {
    let mut p = processor();
    assert!(press(&mut p, 2, 0, 0).is_empty());
    assert!(press(&mut p, 0, 4, 0).is_empty());
    assert!(release(&mut p, 9, 9, 10).is_empty());
    assert!(p.get_held_keys().is_empty());
}

#[test]
fn test_release_without_press_is_ignored() {
    let mut p = processor();
    assert!(release(&mut p, 0, 1, 10).is_empty());
}

#[test]
fn test_repeated_press_closes_previous() {
    let mut p = processor();
    press(&mut p, 0, 1, 0);
    let emits = press(&mut p, 0, 1, 10);
    assert_eq!(
        emits,
        vec![Emit::KeyUp(KeyCode::KC_B), Emit::KeyDown(KeyCode::KC_B)]
    );
}

#[test]
fn test_release_all_releases_without_tapping() {
    let mut p = processor();
    press(&mut p, 1, 3, 0);
    press(&mut p, 0, 0, 10);
    assert_eq!(p.get_held_keys(), vec![KeyCode::KC_LSFT]);

    let emits = p.release_all().into_vec();
    assert!(emits.contains(&Emit::KeyUp(KeyCode::KC_LSFT)));
    assert!(emits.contains(&layers(BASE, &[])));
    assert_eq!(taps(&emits), 0);
    assert!(p.get_held_keys().is_empty());
    assert!(p.layer_stack().layers().is_empty());
}

#[test]
fn test_startup_layer_applied() {
    let source = TEST_KEYMAP.replacen(
        "default_layer: \"base\",",
        "default_layer: \"base\", startup_layer: Some(\"symb\"),",
        1,
    );
    let config = Config::from_ron_str(&source).unwrap();
    let keymap = Keymap::from_config(&config).unwrap();
    let mut p = KeymapProcessor::new(keymap, Box::new(MemoryStore::new()));
    assert_eq!(p.layer_stack().layers(), &[SYMB]);
    assert_eq!(press(&mut p, 0, 1, 0), vec![Emit::KeyDown(KeyCode::KC_1)]);

    p.reset();
    assert_eq!(p.layer_stack().layers(), &[SYMB]);
}
