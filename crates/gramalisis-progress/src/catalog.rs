use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// One progression tier, unlocked once the entry count reaches
/// `unlock_requirement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub order: u32,
    pub title: String,
    #[serde(default)]
    pub focus: String,
    pub description: String,
    pub unlock_requirement: u32,
    pub icon: String,
    #[serde(default)]
    pub level_tag: String,
    pub accent: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("stage catalog is empty")]
    Empty,

    #[error("stage orders must be 1..=n without gaps: expected {expected}, found {found}")]
    NonDenseOrder { expected: u32, found: u32 },

    #[error("unlock requirement decreases at stage {order}")]
    DecreasingRequirement { order: u32 },

    #[error("catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// Which built-in catalog to evaluate against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Learning stages that gate the sublevel path and mini-games
    #[default]
    Stages,
    /// Star levels shown on the home screen
    Levels,
}

impl CatalogKind {
    pub fn builtin(self) -> Catalog {
        match self {
            Self::Stages => Catalog::learning_stages(),
            Self::Levels => Catalog::achievement_levels(),
        }
    }
}

/// An ordered, validated, immutable list of stages.
///
/// Invariants: never empty, `order` runs 1..=n in sequence, and
/// `unlock_requirement` never decreases along the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    stages: Vec<Stage>,
}

impl Catalog {
    /// Validate and build a catalog. Stages may be given in any order.
    pub fn new(mut stages: Vec<Stage>) -> Result<Self, CatalogError> {
        if stages.is_empty() {
            return Err(CatalogError::Empty);
        }

        stages.sort_by_key(|s| s.order);

        let mut previous_requirement = 0;
        for (i, stage) in stages.iter().enumerate() {
            let expected = i as u32 + 1;
            if stage.order != expected {
                return Err(CatalogError::NonDenseOrder {
                    expected,
                    found: stage.order,
                });
            }
            if stage.unlock_requirement < previous_requirement {
                return Err(CatalogError::DecreasingRequirement { order: stage.order });
            }
            previous_requirement = stage.unlock_requirement;
        }

        Ok(Self { stages })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let stages: Vec<Stage> = serde_json::from_str(json)?;
        Self::new(stages)
    }

    /// Read a JSON array of stages from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        info!("Loaded {} stages from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn first(&self) -> &Stage {
        // non-empty by construction
        &self.stages[0]
    }

    pub fn last(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    /// Stage with the given order, if any.
    pub fn get(&self, order: u32) -> Option<&Stage> {
        let index = order.checked_sub(1)? as usize;
        self.stages.get(index)
    }

    /// The default catalog: five learning stages starting unlocked.
    pub fn learning_stages() -> Self {
        let stages = vec![
            stage(
                "principiante",
                1,
                "Principiante",
                "Morfología esencial",
                "Identifica sustantivos, adjetivos y la concordancia básica.",
                0,
                "🌱",
                "#6ddccf",
            ),
            stage(
                "basico",
                2,
                "Básico",
                "Flexiones regulares y conectores simples",
                "Aprende a clasificar raíces y observar las variaciones de género.",
                3,
                "🚀",
                "#78c6ff",
            ),
            stage(
                "pre-intermedio",
                3,
                "Pre-intermedio",
                "Prefijos y sufijos clave",
                "Asocia sufijos con modificaciones de significado y forma palabras.",
                7,
                "🧠",
                "#f59e0b",
            ),
            stage(
                "intermedio",
                4,
                "Intermedio",
                "Tiempos compuestos y morfemas",
                "Explora verbos compuestos y cómo los morfemas cambian sus formas.",
                12,
                "🔥",
                "#ef4444",
            ),
            stage(
                "avanzado",
                5,
                "Avanzado",
                "Derivaciones complejas y variaciones",
                "Conecta raíces, sufijos y prefijos para construir vocabulario experto.",
                18,
                "🌌",
                "#9333ea",
            ),
        ];
        Self { stages }
    }

    /// Star levels. Level 1 needs one entry, so a new user sits on level 1
    /// without having unlocked it.
    pub fn achievement_levels() -> Self {
        let levels = [
            ("Explorador", "Registra tu primer análisis y descubre los insights básicos.", 1),
            ("Analista", "Mantén una racha de 5 análisis para desbloquear métricas avanzadas.", 5),
            ("Estratega", "Comparte 10 textos distintos para activar recomendaciones.", 10),
            ("Mentor", "Colabora con tu equipo compartiendo 15 análisis.", 15),
            ("Leyenda", "Completa 25 análisis para desbloquear todos los reportes.", 25),
        ];

        let stages = levels
            .iter()
            .enumerate()
            .map(|(i, (title, description, requirement))| {
                let order = i as u32 + 1;
                Stage {
                    id: format!("nivel-{}", order),
                    order,
                    title: title.to_string(),
                    focus: String::new(),
                    description: description.to_string(),
                    unlock_requirement: *requirement,
                    icon: "★".to_string(),
                    level_tag: format!("Nivel {}", order),
                    accent: "#18529D".to_string(),
                }
            })
            .collect();
        Self { stages }
    }
}

#[allow(clippy::too_many_arguments)]
fn stage(
    id: &str,
    order: u32,
    title: &str,
    focus: &str,
    description: &str,
    unlock_requirement: u32,
    icon: &str,
    accent: &str,
) -> Stage {
    Stage {
        id: id.to_string(),
        order,
        title: title.to_string(),
        focus: focus.to_string(),
        description: description.to_string(),
        unlock_requirement,
        icon: icon.to_string(),
        level_tag: format!("Nivel {}", order),
        accent: accent.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare(order: u32, req: u32) -> Stage {
        Stage {
            id: format!("s{}", order),
            order,
            title: String::new(),
            focus: String::new(),
            description: String::new(),
            unlock_requirement: req,
            icon: String::new(),
            level_tag: String::new(),
            accent: String::new(),
        }
    }

    #[test]
    fn test_builtin_catalogs_are_valid() {
        for kind in [CatalogKind::Stages, CatalogKind::Levels] {
            let builtin = kind.builtin();
            let rebuilt = Catalog::new(builtin.stages().to_vec()).unwrap();
            assert_eq!(rebuilt, builtin);
        }
        assert_eq!(Catalog::learning_stages().first().unlock_requirement, 0);
        assert_eq!(Catalog::achievement_levels().last().unlock_requirement, 25);
    }

    #[test]
    fn test_new_sorts_by_order() {
        let catalog = Catalog::new(vec![bare(3, 6), bare(1, 0), bare(2, 3)]).unwrap();
        let orders: Vec<u32> = catalog.stages().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(catalog.get(2).unwrap().unlock_requirement, 3);
        assert!(catalog.get(0).is_none());
        assert!(catalog.get(4).is_none());
    }

    #[test]
    fn test_rejects_invalid_catalogs() {
        assert!(matches!(Catalog::new(vec![]), Err(CatalogError::Empty)));
        assert!(matches!(
            Catalog::new(vec![bare(1, 0), bare(3, 2)]),
            Err(CatalogError::NonDenseOrder { expected: 2, found: 3 })
        ));
        assert!(matches!(
            Catalog::new(vec![bare(1, 0), bare(1, 2)]),
            Err(CatalogError::NonDenseOrder { expected: 2, found: 1 })
        ));
        assert!(matches!(
            Catalog::new(vec![bare(1, 4), bare(2, 2)]),
            Err(CatalogError::DecreasingRequirement { order: 2 })
        ));
    }

    #[test]
    fn test_from_json_defaults_optional_fields() {
        let json = r##"[
            {"id": "a", "order": 1, "title": "A", "description": "d", "unlock_requirement": 0, "icon": "x", "accent": "#000"},
            {"id": "b", "order": 2, "title": "B", "description": "d", "unlock_requirement": 4, "icon": "y", "accent": "#fff"}
        ]"##;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.last().id, "b");
        assert!(catalog.first().focus.is_empty());

        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_catalog_kind_parses_lowercase() {
        let kind: CatalogKind = serde_json::from_str("\"levels\"").unwrap();
        assert_eq!(kind, CatalogKind::Levels);
        assert_eq!(CatalogKind::default(), CatalogKind::Stages);
    }
}
