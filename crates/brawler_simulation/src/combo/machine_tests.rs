//! Tests for ComboMachine.

#[cfg(test)]
mod tests {
    use crate::combo::machine::{ComboMachine, ComboState, ComboStep, HitWindowEdge};
    use crate::combo::moves::MoveLibrary;
    use crate::input::{InputBuffer, InputKind};

    /// A: 0.5s, cancel [0.3, 0.8], Heavy → B
    fn two_move_library() -> MoveLibrary {
        MoveLibrary::from_ron(
            r#"(
                moves: [
                    (name: "A", duration: 0.5, cancel_window: (0.3, 0.8), hit_window: (0.2, 0.6),
                     branches: [(input: Heavy, next: "B")]),
                    (name: "B", duration: 0.6),
                    (name: "Air", air_usable: true),
                    (name: "C", duration: 0.5, cancel_window: (0.0, 1.0), branches: [
                        (input: Light, next: "Air", requires_airborne: true),
                        (input: Light, next: "B", min_combo_count: 2),
                        (input: Light, next: "A"),
                    ]),
                ],
                openers: [(input: Light, opens: "A"), (input: Jump, opens: "B"), (input: Special, opens: "C")],
            )"#,
        )
        .expect("test library must load")
    }

    fn started(library: &MoveLibrary, kind: InputKind) -> (ComboMachine, InputBuffer) {
        let mut machine = ComboMachine::new(2.0);
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(kind, 0.0);
        assert!(machine.try_start_from_buffer(&mut buffer, library, false).is_some());
        (machine, buffer)
    }

    #[test]
    fn test_opener_consumes_intent() {
        let library = two_move_library();
        let (machine, buffer) = started(&library, InputKind::Light);

        assert_eq!(machine.state(), ComboState::InMove(library.find("A").unwrap()));
        assert_eq!(machine.timer(), 0.0);
        assert!(buffer.is_empty());
        assert_eq!(machine.move_serial(), 1);
    }

    #[test]
    fn test_no_opener_leaves_input_buffered() {
        let library = two_move_library();
        let mut machine = ComboMachine::new(2.0);
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Heavy, 0.0);

        assert!(machine.try_start_from_buffer(&mut buffer, &library, false).is_none());
        assert!(machine.is_idle());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_ground_only_opener_blocked_in_air() {
        let library = two_move_library();
        let mut machine = ComboMachine::new(2.0);
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Light, 0.0);

        assert!(machine.try_start_from_buffer(&mut buffer, &library, true).is_none());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_branch_waits_for_cancel_window() {
        let library = two_move_library();
        let (mut machine, mut buffer) = started(&library, InputKind::Light);
        let b = library.find("B").unwrap();

        // progress 0.2 — вне окна, Heavy ждёт в буфере
        buffer.register(InputKind::Heavy, 0.1);
        assert_eq!(machine.advance(0.1, &mut buffer, &library, false), ComboStep::Continue);
        assert!(!machine.in_cancel_window());
        assert_eq!(buffer.len(), 1);

        // progress 0.35 — окно открыто, ветка принята
        let step = machine.advance(0.075, &mut buffer, &library, false);
        assert!(matches!(step, ComboStep::Branched { to, .. } if to == b), "step = {:?}", step);
        assert_eq!(machine.state(), ComboState::InMove(b));
        assert_eq!(machine.timer(), 0.0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_unmatched_input_stays_buffered() {
        let library = two_move_library();
        let (mut machine, mut buffer) = started(&library, InputKind::Light);

        buffer.register(InputKind::Jump, 0.15);
        machine.advance(0.2, &mut buffer, &library, false);

        assert!(machine.in_cancel_window());
        assert_eq!(machine.state(), ComboState::InMove(library.find("A").unwrap()));
        assert_eq!(buffer.len(), 1, "ветки нет — ввод не выбрасывается");
    }

    #[test]
    fn test_move_ends_in_idle_without_input() {
        let library = two_move_library();
        let (mut machine, mut buffer) = started(&library, InputKind::Light);

        assert_eq!(machine.advance(0.3, &mut buffer, &library, false), ComboStep::Continue);
        assert_eq!(machine.advance(0.25, &mut buffer, &library, false), ComboStep::Finished);
        assert!(machine.is_idle());
    }

    #[test]
    fn test_branch_order_and_requirements() {
        let library = two_move_library();

        // Земля, 0 попаданий → третья ветка (A)
        let (mut machine, mut buffer) = started(&library, InputKind::Special);
        buffer.register(InputKind::Light, 0.0);
        machine.advance(0.01, &mut buffer, &library, false);
        assert_eq!(machine.current_move(), library.find("A"));

        // Воздух → первая ветка (Air)
        let (mut machine, mut buffer) = started(&library, InputKind::Special);
        buffer.register(InputKind::Light, 0.0);
        machine.advance(0.01, &mut buffer, &library, true);
        assert_eq!(machine.current_move(), library.find("Air"));

        // Земля, 2 попадания → вторая ветка (B)
        let (mut machine, mut buffer) = started(&library, InputKind::Special);
        machine.confirm_hit(0.0);
        machine.confirm_hit(0.0);
        buffer.register(InputKind::Light, 0.0);
        machine.advance(0.01, &mut buffer, &library, false);
        assert_eq!(machine.current_move(), library.find("B"));
    }

    #[test]
    fn test_combo_counter_timeout() {
        let mut machine = ComboMachine::new(2.0);
        assert_eq!(machine.confirm_hit(0.0), 1);
        assert_eq!(machine.confirm_hit(1.5), 2);
        assert_eq!(machine.confirm_hit(3.5), 3, "разрыв ровно timeout — ещё не сброс");

        // Разрыв > timeout — сброс до следующего попадания
        assert_eq!(machine.confirm_hit(6.0), 1);

        assert!(!machine.check_timeout(7.0));
        assert!(machine.check_timeout(8.5));
        assert_eq!(machine.hit_count(), 0);
        assert!(!machine.check_timeout(9.0), "повторный сброс не сообщается");
    }

    #[test]
    fn test_force_interrupt_clears_buffer() {
        let library = two_move_library();
        let (mut machine, mut buffer) = started(&library, InputKind::Light);
        buffer.register(InputKind::Heavy, 0.05);

        let interrupted = machine.force_interrupt(&mut buffer);
        assert_eq!(interrupted, library.find("A"));
        assert!(machine.is_idle());
        assert!(buffer.is_empty());
        assert_eq!(machine.advance(0.1, &mut buffer, &library, false), ComboStep::Idle);
    }

    #[test]
    fn test_hit_window_edges_fire_once() {
        let library = two_move_library();
        let (mut machine, mut buffer) = started(&library, InputKind::Light);
        let a = library.get(library.find("A").unwrap()).unwrap().clone();

        assert_eq!(machine.poll_hit_window(&a), None);
        machine.advance(0.1, &mut buffer, &library, false);
        assert_eq!(machine.poll_hit_window(&a), Some(HitWindowEdge::Open));
        assert_eq!(machine.poll_hit_window(&a), None);

        machine.advance(0.25, &mut buffer, &library, false);
        assert_eq!(machine.poll_hit_window(&a), Some(HitWindowEdge::Close));
        assert_eq!(machine.poll_hit_window(&a), None);
    }

    #[test]
    fn test_missing_move_forces_idle() {
        let library = two_move_library();
        let (mut machine, mut buffer) = started(&library, InputKind::Light);

        let empty = MoveLibrary::default();
        assert_eq!(machine.advance(0.1, &mut buffer, &empty, false), ComboStep::Finished);
        assert!(machine.is_idle());
    }
}
