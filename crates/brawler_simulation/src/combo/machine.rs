//! ComboMachine — Idle / InMove(move) state machine управляемого entity.
//!
//! Чистая логика без ECS: система `run_combo_machines` вызывает методы и
//! применяет побочные эффекты (momentum, клип, звук, регион атаки).

use bevy::prelude::*;

use super::moves::{MoveDefinition, MoveId, MoveLibrary};
use crate::input::InputBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboState {
    Idle,
    InMove(MoveId),
}

/// Результат `advance` за один тик
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboStep {
    /// Машина в Idle, ничего не произошло
    Idle,
    Continue,
    /// Мув доигран (или пропал из библиотеки) → Idle
    Finished,
    /// Cancel в следующий мув через ветку
    Branched { from: MoveId, to: MoveId },
}

/// Граница hit window текущего мува
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitWindowEdge {
    Open,
    Close,
}

#[derive(Component, Debug, Clone)]
pub struct ComboMachine {
    state: ComboState,
    /// Секунды в текущем муве
    timer: f32,
    in_cancel_window: bool,
    hit_count: u32,
    last_hit_at: Option<f32>,
    /// Растёт на каждый вход в мув (AI следит за новыми атаками игрока)
    move_serial: u64,
    region_opened: bool,
    region_closed: bool,
    combo_timeout: f32,
}

impl Default for ComboMachine {
    fn default() -> Self {
        Self::new(crate::config::CombatConfig::default().combo_timeout)
    }
}

impl ComboMachine {
    pub fn new(combo_timeout: f32) -> Self {
        Self {
            state: ComboState::Idle,
            timer: 0.0,
            in_cancel_window: false,
            hit_count: 0,
            last_hit_at: None,
            move_serial: 0,
            region_opened: false,
            region_closed: false,
            combo_timeout,
        }
    }

    pub fn state(&self) -> ComboState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == ComboState::Idle
    }

    pub fn current_move(&self) -> Option<MoveId> {
        match self.state {
            ComboState::InMove(id) => Some(id),
            ComboState::Idle => None,
        }
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn in_cancel_window(&self) -> bool {
        self.in_cancel_window
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn last_hit_at(&self) -> Option<f32> {
        self.last_hit_at
    }

    pub fn move_serial(&self) -> u64 {
        self.move_serial
    }

    fn enter(&mut self, id: MoveId) {
        self.state = ComboState::InMove(id);
        self.timer = 0.0;
        self.in_cancel_window = false;
        self.move_serial += 1;
        self.region_opened = false;
        self.region_closed = false;
    }

    fn reset_to_idle(&mut self) {
        self.state = ComboState::Idle;
        self.timer = 0.0;
        self.in_cancel_window = false;
        self.region_opened = false;
        self.region_closed = false;
    }

    /// Idle → opener по самому старому нажатию. Нажатие без opener'а остаётся в буфере.
    pub fn try_start_from_buffer(
        &mut self,
        buffer: &mut InputBuffer,
        library: &MoveLibrary,
        airborne: bool,
    ) -> Option<MoveId> {
        if !self.is_idle() {
            return None;
        }

        let intent = buffer.peek_oldest()?;
        let opener = library.opener(intent.kind)?;
        let definition = library.get(opener)?;
        if airborne && !definition.air_usable {
            return None;
        }

        buffer.consume();
        self.enter(opener);
        Some(opener)
    }

    /// Один тик InMove: таймер, cancel window, конец мува, ветки.
    pub fn advance(
        &mut self,
        delta: f32,
        buffer: &mut InputBuffer,
        library: &MoveLibrary,
        airborne: bool,
    ) -> ComboStep {
        let ComboState::InMove(current) = self.state else {
            return ComboStep::Idle;
        };

        let Some(definition) = library.get(current) else {
            crate::logger::log_error(&format!(
                "ComboMachine: move {:?} missing from library → forced Idle",
                current
            ));
            self.reset_to_idle();
            return ComboStep::Finished;
        };

        self.timer += delta;
        self.in_cancel_window = definition.in_cancel_window(self.timer);

        // Без нового ввода цепочка не продолжается
        if self.timer >= definition.duration {
            self.reset_to_idle();
            return ComboStep::Finished;
        }

        if !self.in_cancel_window {
            return ComboStep::Continue;
        }

        let Some(intent) = buffer.peek_oldest() else {
            return ComboStep::Continue;
        };

        let accepted = definition
            .branches
            .iter()
            .find(|branch| branch.accepts(intent.kind, airborne, self.hit_count))
            .map(|branch| branch.next);

        match accepted {
            Some(next) => {
                buffer.consume();
                self.enter(next);
                self.in_cancel_window = library
                    .get(next)
                    .map(|next_definition| next_definition.in_cancel_window(0.0))
                    .unwrap_or(false);
                ComboStep::Branched { from: current, to: next }
            }
            // Ввод остаётся в буфере до следующего решения или expiry
            None => ComboStep::Continue,
        }
    }

    /// Открыть/закрыть регион атаки по hit window текущего мува
    pub fn poll_hit_window(&mut self, definition: &MoveDefinition) -> Option<HitWindowEdge> {
        if self.is_idle() {
            return None;
        }

        let progress = definition.progress(self.timer);
        if !self.region_opened && progress >= definition.hit_window.0 {
            self.region_opened = true;
            return Some(HitWindowEdge::Open);
        }
        if self.region_opened && !self.region_closed && progress >= definition.hit_window.1 {
            self.region_closed = true;
            return Some(HitWindowEdge::Close);
        }
        None
    }

    /// Combo counter → 0 если с последнего попадания прошло больше timeout.
    /// Проверяется каждый тик независимо от состояния. true = сброс произошёл.
    pub fn check_timeout(&mut self, now: f32) -> bool {
        match self.last_hit_at {
            Some(last) if self.hit_count > 0 && now - last > self.combo_timeout => {
                self.hit_count = 0;
                true
            }
            _ => false,
        }
    }

    /// Hit confirm: сначала timeout (разрыв > timeout → счёт с нуля), потом +1
    pub fn confirm_hit(&mut self, now: f32) -> u32 {
        self.check_timeout(now);
        self.hit_count += 1;
        self.last_hit_at = Some(now);
        self.hit_count
    }

    /// Немедленно в Idle + очистить буфер. Возвращает прерванный мув.
    pub fn force_interrupt(&mut self, buffer: &mut InputBuffer) -> Option<MoveId> {
        let interrupted = self.current_move();
        self.reset_to_idle();
        buffer.clear();
        interrupted
    }
}
