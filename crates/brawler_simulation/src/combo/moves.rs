//! Move data: MoveDefinition (immutable), MoveLibrary (arena + openers)
//!
//! Данные авторятся офлайн в RON (`data/moves.ron`), ветки ссылаются на мувы
//! по имени. После загрузки ссылки — `MoveId` (индекс в арене), мувы не копируются.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combat::RegionSpec;
use crate::error::{ContentError, ContentResult};
use crate::input::InputKind;

/// Индекс мува в MoveLibrary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveId(pub usize);

/// Ветка: (ввод, airborne, min combo) → следующий мув
#[derive(Debug, Clone, PartialEq)]
pub struct MoveBranch {
    pub required_input: InputKind,
    pub requires_airborne: bool,
    pub min_combo_count: u32,
    pub next: MoveId,
}

impl MoveBranch {
    pub fn accepts(&self, input: InputKind, airborne: bool, hit_count: u32) -> bool {
        self.required_input == input
            && (!self.requires_airborne || airborne)
            && hit_count >= self.min_combo_count
    }
}

/// Неизменяемое описание мува
#[derive(Debug, Clone, PartialEq)]
pub struct MoveDefinition {
    pub name: String,
    pub clip: String,
    pub duration: f32,
    pub damage: u32,
    pub knockback: Vec2,
    pub hitstop: f32,
    pub launcher: bool,
    pub finisher: bool,
    /// Normalized [min, max]
    pub cancel_window: (f32, f32),
    /// Normalized [open, close] — когда регион атаки активен
    pub hit_window: (f32, f32),
    pub forward_momentum: f32,
    pub air_usable: bool,
    pub super_armor: bool,
    pub attack_sound: String,
    pub hit_sound: String,
    pub stamina_cost: f32,
    pub reach: f32,
    pub radius: f32,
    pub multi_hit: bool,
    pub branches: Vec<MoveBranch>,
}

impl MoveDefinition {
    pub fn progress(&self, timer: f32) -> f32 {
        timer / self.duration
    }

    pub fn in_cancel_window(&self, timer: f32) -> bool {
        let progress = self.progress(timer);
        progress >= self.cancel_window.0 && progress <= self.cancel_window.1
    }

    /// Регион, который открывается в hit window
    pub fn region_spec(&self) -> RegionSpec {
        RegionSpec {
            damage: self.damage,
            knockback: self.knockback.x,
            lift: if self.launcher { self.knockback.y } else { 0.0 },
            hitstop: self.hitstop,
            radius: self.radius,
            offset: Vec2::new(self.reach, 0.0),
            lifetime: f32::INFINITY,
            multi_hit: self.multi_hit,
            falloff: None,
            hit_sound: Some(self.hit_sound.clone()),
        }
    }
}

// ============================================================================
// RON data layer
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchData {
    pub input: InputKind,
    pub next: String,
    pub requires_airborne: bool,
    pub min_combo_count: u32,
}

impl Default for BranchData {
    fn default() -> Self {
        Self {
            input: InputKind::Light,
            next: String::new(),
            requires_airborne: false,
            min_combo_count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveData {
    pub name: String,
    /// None → имя мува
    pub clip: Option<String>,
    pub duration: f32,
    pub damage: u32,
    pub knockback: (f32, f32),
    pub hitstop: f32,
    pub launcher: bool,
    pub finisher: bool,
    pub cancel_window: (f32, f32),
    pub hit_window: (f32, f32),
    pub forward_momentum: f32,
    pub air_usable: bool,
    pub super_armor: bool,
    pub attack_sound: String,
    pub hit_sound: String,
    pub stamina_cost: f32,
    pub reach: f32,
    pub radius: f32,
    pub multi_hit: bool,
    pub branches: Vec<BranchData>,
}

impl Default for MoveData {
    fn default() -> Self {
        Self {
            name: String::new(),
            clip: None,
            duration: 0.5,
            damage: 10,
            knockback: (5.0, 2.0),
            hitstop: 0.1,
            launcher: false,
            finisher: false,
            cancel_window: (0.3, 0.8),
            hit_window: (0.2, 0.6),
            forward_momentum: 2.0,
            air_usable: false,
            super_armor: false,
            attack_sound: "Whoosh_Attack".to_string(),
            hit_sound: "Hit_Impact".to_string(),
            stamina_cost: 0.0,
            reach: 0.8,
            radius: 0.6,
            multi_hit: false,
            branches: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenerData {
    pub input: InputKind,
    pub opens: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveSetData {
    pub moves: Vec<MoveData>,
    pub openers: Vec<OpenerData>,
}

fn unit_range(window: (f32, f32)) -> bool {
    (0.0..=1.0).contains(&window.0) && (0.0..=1.0).contains(&window.1) && window.0 <= window.1
}

fn validate(data: &MoveData) -> ContentResult<()> {
    let invalid = |reason: &str| ContentError::InvalidMove {
        name: data.name.clone(),
        reason: reason.to_string(),
    };

    if data.name.is_empty() {
        return Err(invalid("empty name"));
    }
    if !(data.duration > 0.0) {
        return Err(invalid("duration must be positive"));
    }
    if !unit_range(data.cancel_window) {
        return Err(invalid("cancel_window must be an ordered range inside [0, 1]"));
    }
    if !unit_range(data.hit_window) {
        return Err(invalid("hit_window must be an ordered range inside [0, 1]"));
    }
    if data.hitstop < 0.0 || data.radius < 0.0 {
        return Err(invalid("hitstop and radius must be non-negative"));
    }
    Ok(())
}

// ============================================================================
// MoveLibrary
// ============================================================================

/// Resource: все мувы + openers. Read-only после загрузки.
#[derive(Resource, Debug, Clone, Default)]
pub struct MoveLibrary {
    moves: Vec<MoveDefinition>,
    by_name: HashMap<String, MoveId>,
    openers: HashMap<InputKind, MoveId>,
}

impl MoveLibrary {
    pub fn from_ron(text: &str) -> ContentResult<Self> {
        let data: MoveSetData = ron::from_str(text).map_err(|source| ContentError::Parse {
            what: "move set",
            source,
        })?;
        Self::from_data(data)
    }

    /// Встроенный `data/moves.ron`
    pub fn builtin() -> ContentResult<Self> {
        Self::from_ron(include_str!("../../data/moves.ron"))
    }

    /// Невалидный мув или дубликат имени → ошибка всего набора.
    /// Висячие ссылки (ветка/opener на несуществующий мув) → warning + ссылка выброшена.
    pub fn from_data(data: MoveSetData) -> ContentResult<Self> {
        let mut by_name = HashMap::new();
        for (index, move_data) in data.moves.iter().enumerate() {
            validate(move_data)?;
            if by_name.insert(move_data.name.clone(), MoveId(index)).is_some() {
                return Err(ContentError::Duplicate {
                    what: "move",
                    name: move_data.name.clone(),
                });
            }
        }

        let moves = data
            .moves
            .into_iter()
            .map(|move_data| {
                let branches = move_data
                    .branches
                    .iter()
                    .filter_map(|branch| match by_name.get(&branch.next) {
                        Some(&next) => Some(MoveBranch {
                            required_input: branch.input,
                            requires_airborne: branch.requires_airborne,
                            min_combo_count: branch.min_combo_count,
                            next,
                        }),
                        None => {
                            crate::logger::log_warning(&format!(
                                "Move '{}': branch {:?} → unknown move '{}' (dropped)",
                                move_data.name, branch.input, branch.next
                            ));
                            None
                        }
                    })
                    .collect();

                MoveDefinition {
                    clip: move_data.clip.clone().unwrap_or_else(|| move_data.name.clone()),
                    name: move_data.name,
                    duration: move_data.duration,
                    damage: move_data.damage,
                    knockback: Vec2::new(move_data.knockback.0, move_data.knockback.1),
                    hitstop: move_data.hitstop,
                    launcher: move_data.launcher,
                    finisher: move_data.finisher,
                    cancel_window: move_data.cancel_window,
                    hit_window: move_data.hit_window,
                    forward_momentum: move_data.forward_momentum,
                    air_usable: move_data.air_usable,
                    super_armor: move_data.super_armor,
                    attack_sound: move_data.attack_sound,
                    hit_sound: move_data.hit_sound,
                    stamina_cost: move_data.stamina_cost,
                    reach: move_data.reach,
                    radius: move_data.radius,
                    multi_hit: move_data.multi_hit,
                    branches,
                }
            })
            .collect();

        let mut openers = HashMap::new();
        for opener in data.openers {
            match by_name.get(&opener.opens) {
                Some(&id) => {
                    openers.insert(opener.input, id);
                }
                None => crate::logger::log_warning(&format!(
                    "Opener {:?} → unknown move '{}' (dropped)",
                    opener.input, opener.opens
                )),
            }
        }

        Ok(Self { moves, by_name, openers })
    }

    pub fn get(&self, id: MoveId) -> Option<&MoveDefinition> {
        self.moves.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<MoveId> {
        self.by_name.get(name).copied()
    }

    pub fn opener(&self, input: InputKind) -> Option<MoveId> {
        self.openers.get(&input).copied()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_moves_load() {
        let library = MoveLibrary::builtin().expect("builtin moves.ron must load");
        assert!(library.opener(InputKind::Light).is_some());
        assert!(library.opener(InputKind::Heavy).is_some());

        let jab = library.find("Jab").and_then(|id| library.get(id)).unwrap();
        assert!(!jab.branches.is_empty());
    }

    #[test]
    fn test_dangling_branch_is_dropped_not_fatal() {
        let library = MoveLibrary::from_ron(
            r#"(
                moves: [
                    (name: "A", branches: [(input: Heavy, next: "Missing"), (input: Light, next: "A")]),
                ],
                openers: [(input: Light, opens: "A"), (input: Heavy, opens: "Nope")],
            )"#,
        )
        .unwrap();

        let a = library.get(library.find("A").unwrap()).unwrap();
        assert_eq!(a.branches.len(), 1);
        assert_eq!(a.branches[0].required_input, InputKind::Light);
        assert!(library.opener(InputKind::Heavy).is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = MoveLibrary::from_ron(r#"(moves: [(name: "A"), (name: "A")])"#);
        assert!(matches!(result, Err(ContentError::Duplicate { .. })));
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let reversed = MoveLibrary::from_ron(r#"(moves: [(name: "A", cancel_window: (0.8, 0.3))])"#);
        assert!(matches!(reversed, Err(ContentError::InvalidMove { .. })));

        let zero = MoveLibrary::from_ron(r#"(moves: [(name: "A", duration: 0.0)])"#);
        assert!(matches!(zero, Err(ContentError::InvalidMove { .. })));
    }

    #[test]
    fn test_region_spec_lift_only_for_launchers() {
        let library = MoveLibrary::from_ron(
            r#"(moves: [(name: "Up", launcher: true, knockback: (3.0, 6.0)), (name: "Jab", knockback: (3.0, 6.0))])"#,
        )
        .unwrap();

        let up = library.get(library.find("Up").unwrap()).unwrap().region_spec();
        let jab = library.get(library.find("Jab").unwrap()).unwrap().region_spec();
        assert_eq!(up.lift, 6.0);
        assert_eq!(jab.lift, 0.0);
        assert_eq!(jab.knockback, 3.0);
    }
}
