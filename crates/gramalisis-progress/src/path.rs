use serde::Serialize;

use crate::catalog::Catalog;

const LOCKED_ACCENT: &str = "#cbd5f5";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    Grammar,
    Exercise,
}

/// A node on the sublevel path. Node `order` is looked up in the catalog to
/// find its unlock requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathNode {
    pub step: PathStep,
    pub order: u32,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
}

pub const SUBLEVEL_PATH: [PathNode; 2] = [
    PathNode {
        step: PathStep::Grammar,
        order: 1,
        title: "Gramática",
        subtitle: "Identifica raíces, flexiones y patrones.",
        icon: "📘",
    },
    PathNode {
        step: PathStep::Exercise,
        order: 2,
        title: "Ejercicio",
        subtitle: "Aplica las reglas con ejemplos guiados.",
        icon: "📝",
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathNodeStatus {
    pub node: PathNode,
    pub unlocked: bool,
    pub remaining: u32,
    pub accent: String,
}

/// Lock state of every node on the sublevel path.
///
/// Orders missing from the catalog count as requirement 0.
pub fn path_status(catalog: &Catalog, entries_count: u32) -> Vec<PathNodeStatus> {
    SUBLEVEL_PATH
        .iter()
        .map(|node| {
            let stage = catalog.get(node.order);
            let requirement = stage.map_or(0, |s| s.unlock_requirement);
            PathNodeStatus {
                node: node.clone(),
                unlocked: entries_count >= requirement,
                remaining: requirement.saturating_sub(entries_count),
                accent: stage.map_or_else(|| LOCKED_ACCENT.to_string(), |s| s.accent.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Stage;

    #[test]
    fn test_exercise_locked_until_stage_two() {
        let catalog = Catalog::learning_stages();

        let status = path_status(&catalog, 1);
        assert!(status[0].unlocked);
        assert!(!status[1].unlocked);
        assert_eq!(status[1].remaining, 2);
        assert_eq!(status[1].accent, "#78c6ff");

        let status = path_status(&catalog, 3);
        assert!(status.iter().all(|s| s.unlocked && s.remaining == 0));
    }

    #[test]
    fn test_missing_order_is_open() {
        let catalog = Catalog::new(vec![Stage {
            id: "only".into(),
            order: 1,
            title: "Only".into(),
            focus: String::new(),
            description: String::new(),
            unlock_requirement: 0,
            icon: String::new(),
            level_tag: String::new(),
            accent: "#123456".into(),
        }])
        .unwrap();

        let status = path_status(&catalog, 0);
        assert!(status[1].unlocked);
        assert_eq!(status[1].accent, LOCKED_ACCENT);
    }
}
