use serde::Serialize;

use super::combat::AttackResult;
use super::geometry::WorldPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Walk,
    Attack,
    Die,
}

impl ActionType {
    pub fn label(self) -> &'static str {
        match self {
            ActionType::Walk => "walk",
            ActionType::Attack => "attack",
            ActionType::Die => "die",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UpdatePayload {
    Walk {
        #[serde(rename = "newX")]
        new_x: i32,
        #[serde(rename = "newY")]
        new_y: i32,
    },
    Attack(AttackResult),
}

/// One creature's action for a tick, handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub name: String,
    #[serde(rename = "type")]
    pub action: ActionType,
    pub update: Option<UpdatePayload>,
}

impl Notification {
    pub fn walk(name: &str, to: WorldPos) -> Self {
        Notification {
            name: name.to_string(),
            action: ActionType::Walk,
            update: Some(UpdatePayload::Walk {
                new_x: to.x,
                new_y: to.y,
            }),
        }
    }

    pub fn attack(name: &str, result: AttackResult) -> Self {
        Notification {
            name: name.to_string(),
            action: ActionType::Attack,
            update: Some(UpdatePayload::Attack(result)),
        }
    }

    pub fn die(name: &str) -> Self {
        Notification {
            name: name.to_string(),
            action: ActionType::Die,
            update: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::combat::{AttackOutcome, Deflection};
    use serde_json::json;

    #[test]
    fn test_walk_json() {
        let n = Notification::walk("skeleton", WorldPos::new(80, 0));
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({"name": "skeleton", "type": "walk", "update": {"newX": 80, "newY": 0}})
        );
    }

    #[test]
    fn test_die_json() {
        let n = Notification::die("rat");
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({"name": "rat", "type": "die", "update": null})
        );
    }

    #[test]
    fn test_attack_json() {
        let n = Notification::attack(
            "orc",
            AttackResult {
                target: "alice".into(),
                outcome: AttackOutcome::Deflected { d: Deflection::Miss },
                counter: None,
            },
        );
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({"name": "orc", "type": "attack", "update": {"t": "alice", "d": 0}})
        );
    }
}
