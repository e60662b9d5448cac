//! Tests for InputBuffer.

#[cfg(test)]
mod tests {
    use crate::input::*;

    #[test]
    fn test_retention_window() {
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Light, 0.0);

        buffer.prune_expired(0.15);
        assert_eq!(buffer.peek_oldest().map(|i| i.kind), Some(InputKind::Light));

        buffer.prune_expired(0.25);
        assert!(buffer.is_empty(), "Light должен протухнуть к 0.25");
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Heavy, 0.0);

        // now - ts == retention → ещё живо (expire только при строго больше)
        buffer.prune_expired(0.2);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_fifo_order_and_consume() {
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Light, 0.0);
        buffer.register(InputKind::Heavy, 0.05);
        buffer.register(InputKind::Jump, 0.1);

        assert_eq!(buffer.consume().map(|i| i.kind), Some(InputKind::Light));
        assert_eq!(buffer.peek_oldest().map(|i| i.kind), Some(InputKind::Heavy));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_prune_stops_at_first_fresh_entry() {
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Light, 0.0);
        buffer.register(InputKind::Light, 0.1);
        buffer.register(InputKind::Heavy, 0.3);

        let dropped = buffer.prune_expired(0.35);
        assert_eq!(dropped, 2);
        assert_eq!(buffer.peek_oldest().map(|i| i.kind), Some(InputKind::Heavy));
    }

    #[test]
    fn test_try_consume_kind_only_matches_oldest() {
        let mut buffer = InputBuffer::new(0.2);
        buffer.register(InputKind::Light, 0.0);
        buffer.register(InputKind::Heavy, 0.01);

        assert!(!buffer.try_consume_kind(InputKind::Heavy), "Heavy не самое старое");
        assert_eq!(buffer.len(), 2);

        assert!(buffer.try_consume_kind(InputKind::Light));
        assert!(buffer.try_consume_kind(InputKind::Heavy));
        assert!(!buffer.try_consume_kind(InputKind::Heavy));
    }

    #[test]
    fn test_clear_and_empty_queries() {
        let mut buffer = InputBuffer::new(0.2);
        assert!(buffer.peek_oldest().is_none());
        assert!(buffer.consume().is_none());

        buffer.register(InputKind::Special, 0.0);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
