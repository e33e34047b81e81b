//! Era catalog: named temporal phases that reweight which templates and
//! systems fire and how strongly.
//!
//! Eras are static for the life of a run and selected purely by epoch index.
//! A missing weight or modifier means 1.0; an explicit 0 is a hard disable,
//! not a low probability.

use std::collections::BTreeMap;

use contracts::{EraId, SystemId, TemplateId};

/// Direct-mutation hook attached to an era, applied once by the orchestrator
/// when the era's epoch opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraRule {
    /// An outside host crosses the border: ensure the invader faction exists,
    /// turn every active faction against it, and raise war tension. Internal
    /// conflict is suspended for the era via a zero contagion modifier.
    BorderInvasion,
    /// Recovery after the storm: declining colonies stabilize and scarcity
    /// eases.
    Rebuilding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Era {
    pub id: EraId,
    pub name: String,
    pub template_weights: BTreeMap<TemplateId, f64>,
    pub system_modifiers: BTreeMap<SystemId, f64>,
    pub special_rule: Option<EraRule>,
}

impl Era {
    pub fn template_weight(&self, id: TemplateId) -> f64 {
        self.template_weights.get(&id).copied().unwrap_or(1.0)
    }

    pub fn system_modifier(&self, id: SystemId) -> f64 {
        self.system_modifiers.get(&id).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EraCatalog {
    eras: Vec<Era>,
}

impl EraCatalog {
    pub fn new(eras: Vec<Era>) -> Self {
        Self { eras }
    }

    /// Era for an epoch index; the catalog cycles once exhausted.
    pub fn era_for_epoch(&self, epoch: u32) -> &Era {
        let idx = epoch as usize % self.eras.len().max(1);
        &self.eras[idx]
    }

    pub fn len(&self) -> usize {
        self.eras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eras.is_empty()
    }

    pub fn default_catalog() -> Self {
        let mut eras = Vec::new();

        let mut weights = BTreeMap::new();
        weights.insert(TemplateId::ColonyFounding, 2.0);
        weights.insert(TemplateId::MigrantArrival, 1.5);
        weights.insert(TemplateId::OutlawEmergence, 0.5);
        let mut modifiers = BTreeMap::new();
        modifiers.insert(SystemId::ConflictContagion, 0.5);
        eras.push(Era {
            id: EraId::Expansion,
            name: "The Great Expansion".to_string(),
            template_weights: weights,
            system_modifiers: modifiers,
            special_rule: None,
        });

        let mut weights = BTreeMap::new();
        weights.insert(TemplateId::ColonyFounding, 0.5);
        weights.insert(TemplateId::OutlawEmergence, 1.5);
        weights.insert(TemplateId::HeroEmergence, 1.5);
        let mut modifiers = BTreeMap::new();
        modifiers.insert(SystemId::ConflictContagion, 2.0);
        modifiers.insert(SystemId::AllianceFormation, 1.5);
        eras.push(Era {
            id: EraId::Conflict,
            name: "The Feuding Years".to_string(),
            template_weights: weights,
            system_modifiers: modifiers,
            special_rule: None,
        });

        let mut weights = BTreeMap::new();
        weights.insert(TemplateId::CharterDeclaration, 2.0);
        weights.insert(TemplateId::RelicDiscovery, 2.0);
        weights.insert(TemplateId::FactionFounding, 1.5);
        let mut modifiers = BTreeMap::new();
        modifiers.insert(SystemId::CulturalDrift, 1.5);
        modifiers.insert(SystemId::ConflictContagion, 0.5);
        eras.push(Era {
            id: EraId::Innovation,
            name: "The Flowering".to_string(),
            template_weights: weights,
            system_modifiers: modifiers,
            special_rule: None,
        });

        let mut weights = BTreeMap::new();
        weights.insert(TemplateId::ColonyFounding, 0.0);
        weights.insert(TemplateId::MigrantArrival, 0.5);
        weights.insert(TemplateId::HeroEmergence, 2.0);
        let mut modifiers = BTreeMap::new();
        modifiers.insert(SystemId::ConflictContagion, 0.0);
        modifiers.insert(SystemId::AllianceFormation, 2.0);
        modifiers.insert(SystemId::ResourceFlow, 0.75);
        eras.push(Era {
            id: EraId::Invasion,
            name: "The Ashen Tide".to_string(),
            template_weights: weights,
            system_modifiers: modifiers,
            special_rule: Some(EraRule::BorderInvasion),
        });

        let mut weights = BTreeMap::new();
        weights.insert(TemplateId::MigrantArrival, 1.5);
        weights.insert(TemplateId::OutlawEmergence, 0.0);
        weights.insert(TemplateId::CharterDeclaration, 1.5);
        let mut modifiers = BTreeMap::new();
        modifiers.insert(SystemId::ResourceFlow, 1.5);
        modifiers.insert(SystemId::ConflictContagion, 0.25);
        eras.push(Era {
            id: EraId::Reconstruction,
            name: "The Mending".to_string(),
            template_weights: weights,
            system_modifiers: modifiers,
            special_rule: Some(EraRule::Rebuilding),
        });

        Self::new(eras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_cycles_by_epoch_index() {
        let catalog = EraCatalog::default_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.era_for_epoch(0).id, EraId::Expansion);
        assert_eq!(catalog.era_for_epoch(3).id, EraId::Invasion);
        assert_eq!(catalog.era_for_epoch(5).id, EraId::Expansion);
    }

    #[test]
    fn absent_weights_default_to_unity() {
        let catalog = EraCatalog::default_catalog();
        let expansion = catalog.era_for_epoch(0);
        assert_eq!(expansion.template_weight(TemplateId::SuccessionCrisis), 1.0);
        assert_eq!(expansion.system_modifier(SystemId::ResourceFlow), 1.0);
    }

    #[test]
    fn invasion_hard_disables_internal_conflict() {
        let catalog = EraCatalog::default_catalog();
        let invasion = catalog.era_for_epoch(3);
        assert_eq!(invasion.system_modifier(SystemId::ConflictContagion), 0.0);
        assert_eq!(invasion.template_weight(TemplateId::ColonyFounding), 0.0);
        assert_eq!(invasion.special_rule, Some(EraRule::BorderInvasion));
    }
}
