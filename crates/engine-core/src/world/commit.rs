//! The single-writer commit path.
//!
//! Growth batches land all-or-nothing: any unresolvable reference discards
//! the template's entire contribution. Individual relationships and patches
//! degrade gracefully — schema violations and unknown endpoints become
//! diagnostics, duplicates and cooldown hits are dropped silently as normal
//! throttling.

use serde_json::json;

use contracts::{
    DuplicatePolicy, Entity, EntityChange, EntityClass, EntityPatch, EventType, GrowthBatch,
    LinkEnd, RejectReason, RelationProposal, Relationship, SystemBatch, SystemId, TemplateId,
    MAX_ENTITY_TAGS,
};

use crate::systems::cooldown_window;

use super::HistoryWorld;

fn resolve_end(end: &LinkEnd, assigned: &[String]) -> Option<String> {
    match end {
        LinkEnd::Existing(id) => Some(id.clone()),
        LinkEnd::New(idx) => assigned.get(*idx).cloned(),
    }
}

impl HistoryWorld {
    /// Commit one template application. Returns false if the whole batch was
    /// discarded.
    pub(super) fn commit_growth_batch(
        &mut self,
        template_id: TemplateId,
        batch: GrowthBatch,
        tick: u64,
        sequence_in_tick: &mut u64,
    ) -> bool {
        let source = format!("template:{template_id:?}");

        // Pass 1: every reference must resolve before anything lands.
        for spec in &batch.relationships {
            for end in [&spec.src, &spec.dst] {
                let resolvable = match end {
                    LinkEnd::New(idx) => *idx < batch.entities.len(),
                    LinkEnd::Existing(id) => self.graph.entity(id).is_some(),
                };
                if !resolvable {
                    let detail = match end {
                        LinkEnd::New(idx) => format!(
                            "local reference #{idx} with only {} produced entities",
                            batch.entities.len()
                        ),
                        LinkEnd::Existing(id) => format!("existing endpoint {id} not found"),
                    };
                    self.push_diagnostic(
                        tick,
                        source,
                        RejectReason::UnresolvedPlaceholder,
                        detail,
                    );
                    self.push_event(
                        tick,
                        sequence_in_tick,
                        EventType::TemplateAborted,
                        Vec::new(),
                        format!("{template_id:?} discarded without committing"),
                        None,
                    );
                    return false;
                }
            }
        }

        // Pass 2: mint ids and insert the new entities.
        let mut assigned = Vec::with_capacity(batch.entities.len());
        for proto in batch.entities {
            let id = self.graph.allocate_id(proto.class.kind());
            let tags = proto.tags.into_iter().take(MAX_ENTITY_TAGS).collect();
            let entity = Entity {
                id: id.clone(),
                name: proto.name,
                description: proto.description,
                class: proto.class,
                prominence: proto.prominence,
                tags,
                created_at_tick: tick,
                updated_at_tick: tick,
            };
            if self.graph.insert_entity(entity).is_err() {
                // The allocator is the only id source; reaching this means
                // the graph is already corrupt and epoch-end validation will
                // abort the run.
                self.push_diagnostic(
                    tick,
                    source,
                    RejectReason::UnknownEndpoint,
                    format!("id collision inserting {id}"),
                );
                return false;
            }
            assigned.push(id);
        }

        // Pass 3: resolve local references and append legal relationships.
        let mut formed = 0_usize;
        for spec in &batch.relationships {
            let (Some(src), Some(dst)) = (
                resolve_end(&spec.src, &assigned),
                resolve_end(&spec.dst, &assigned),
            ) else {
                continue;
            };
            let proposal = RelationProposal {
                kind: spec.kind,
                src,
                dst,
            };
            if self.commit_relationship(proposal, tick, sequence_in_tick, &source) {
                formed += 1;
            }
        }

        self.push_event(
            tick,
            sequence_in_tick,
            EventType::TemplateApplied,
            assigned.clone(),
            batch.description,
            Some(json!({
                "template": template_id,
                "entities_added": assigned.len(),
                "relationships_added": formed,
            })),
        );
        true
    }

    /// Commit one system's batch. Each dropped mutation degrades into a
    /// diagnostic or silent throttle; nothing here aborts.
    pub(super) fn commit_system_batch(
        &mut self,
        system_id: SystemId,
        batch: SystemBatch,
        tick: u64,
        sequence_in_tick: &mut u64,
    ) {
        if batch.is_empty() {
            return;
        }
        let source = format!("system:{system_id:?}");

        let mut formed = 0_usize;
        for proposal in batch.relationships {
            if self.commit_relationship(proposal, tick, sequence_in_tick, &source) {
                formed += 1;
            }
        }
        let mut patched = 0_usize;
        for change in batch.changes {
            if self.apply_entity_patch(change, tick, sequence_in_tick, &source) {
                patched += 1;
            }
        }
        for (kind, delta) in &batch.pressure_deltas {
            self.graph.nudge_pressure(*kind, *delta);
        }

        self.push_event(
            tick,
            sequence_in_tick,
            EventType::SystemApplied,
            Vec::new(),
            format!("{system_id:?}: {formed} relationships, {patched} changes"),
            Some(json!({
                "system": system_id,
                "notes": batch.notes,
                "pressure_deltas": batch.pressure_deltas,
            })),
        );
    }

    /// Validate and append a single relationship. Shared by the growth and
    /// system commit paths so schema, duplicate, and cooldown discipline is
    /// enforced uniformly.
    pub(super) fn commit_relationship(
        &mut self,
        proposal: RelationProposal,
        tick: u64,
        sequence_in_tick: &mut u64,
        source: &str,
    ) -> bool {
        let Some(src_kind) = self.graph.entity(&proposal.src).map(|e| e.kind()) else {
            self.push_diagnostic(
                tick,
                source.to_string(),
                RejectReason::UnknownEndpoint,
                format!("src {} not found", proposal.src),
            );
            return false;
        };
        let Some(dst_kind) = self.graph.entity(&proposal.dst).map(|e| e.kind()) else {
            self.push_diagnostic(
                tick,
                source.to_string(),
                RejectReason::UnknownEndpoint,
                format!("dst {} not found", proposal.dst),
            );
            return false;
        };
        if !self.matrix.allows(src_kind, dst_kind, proposal.kind) {
            self.push_diagnostic(
                tick,
                source.to_string(),
                RejectReason::SchemaViolation,
                format!(
                    "{} {} -> {} not legal for ({:?}, {:?})",
                    proposal.kind, proposal.src, proposal.dst, src_kind, dst_kind
                ),
            );
            return false;
        }
        if self.config.policy_for(proposal.kind) == DuplicatePolicy::Idempotent
            && self.graph.duplicate_exists(&proposal)
        {
            return false;
        }
        let window = cooldown_window(proposal.kind, &self.config.tuning);
        if window > 0
            && (self
                .graph
                .cooldown_active(&proposal.src, proposal.kind, tick, window)
                || self
                    .graph
                    .cooldown_active(&proposal.dst, proposal.kind, tick, window))
        {
            return false;
        }

        let src_name = self.display_name(&proposal.src);
        let dst_name = self.display_name(&proposal.dst);
        self.graph.push_relationship(Relationship {
            kind: proposal.kind,
            src: proposal.src.clone(),
            dst: proposal.dst.clone(),
            formed_at_tick: tick,
        });
        if window > 0 {
            self.graph.record_cooldown(&proposal.src, proposal.kind, tick);
            self.graph.record_cooldown(&proposal.dst, proposal.kind, tick);
        }
        self.push_event(
            tick,
            sequence_in_tick,
            EventType::RelationshipFormed,
            vec![proposal.src, proposal.dst],
            format!("{src_name} is now {} {dst_name}", proposal.kind),
            None,
        );
        true
    }

    /// Apply one attribute patch. Returns false when the patch was dropped.
    pub(super) fn apply_entity_patch(
        &mut self,
        change: EntityChange,
        tick: u64,
        sequence_in_tick: &mut u64,
        source: &str,
    ) -> bool {
        let Some(entity) = self.graph.entity(&change.entity_id) else {
            self.push_diagnostic(
                tick,
                source.to_string(),
                RejectReason::UnknownEndpoint,
                format!("patch target {} not found", change.entity_id),
            );
            return false;
        };
        let id = entity.id.clone();
        let name = entity.name.clone();
        let class = entity.class;
        let prominence = entity.prominence;
        let tag_count = entity.tags.len();

        let kind_mismatch = |world: &mut Self| {
            world.push_diagnostic(
                tick,
                source.to_string(),
                RejectReason::SchemaViolation,
                format!("status patch does not match the kind of {id}"),
            );
            false
        };

        match change.patch {
            EntityPatch::SetNpcStatus(status) => {
                let EntityClass::Npc { role, .. } = class else {
                    return kind_mismatch(self);
                };
                self.set_class(&id, EntityClass::Npc { role, status }, class, &name, tick, sequence_in_tick)
            }
            EntityPatch::SetLocationStatus(status) => {
                let EntityClass::Location { terrain, .. } = class else {
                    return kind_mismatch(self);
                };
                self.set_class(
                    &id,
                    EntityClass::Location { terrain, status },
                    class,
                    &name,
                    tick,
                    sequence_in_tick,
                )
            }
            EntityPatch::SetFactionStatus(status) => {
                let EntityClass::Faction { charter, .. } = class else {
                    return kind_mismatch(self);
                };
                self.set_class(
                    &id,
                    EntityClass::Faction { charter, status },
                    class,
                    &name,
                    tick,
                    sequence_in_tick,
                )
            }
            EntityPatch::SetLoreStatus(status) => {
                let next = match class {
                    EntityClass::Rules { scope, .. } => EntityClass::Rules { scope, status },
                    EntityClass::Abilities { school, .. } => {
                        EntityClass::Abilities { school, status }
                    }
                    _ => return kind_mismatch(self),
                };
                self.set_class(&id, next, class, &name, tick, sequence_in_tick)
            }
            EntityPatch::RaiseProminence => {
                let next = prominence.raised();
                if next == prominence {
                    return false;
                }
                if let Some(entry) = self.graph.entity_mut(&id) {
                    entry.prominence = next;
                    entry.updated_at_tick = tick;
                }
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::ProminenceChanged,
                    vec![id],
                    format!("{name} rises to {} prominence", prominence_label(next)),
                    None,
                );
                true
            }
            EntityPatch::LowerProminence => {
                let next = prominence.lowered();
                if next == prominence {
                    return false;
                }
                if let Some(entry) = self.graph.entity_mut(&id) {
                    entry.prominence = next;
                    entry.updated_at_tick = tick;
                }
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::ProminenceChanged,
                    vec![id],
                    format!("{name} fades to {} prominence", prominence_label(next)),
                    None,
                );
                true
            }
            EntityPatch::AddTag(tag) => {
                if entity_has_tag(self, &id, &tag) {
                    return false;
                }
                if tag_count >= MAX_ENTITY_TAGS {
                    self.push_diagnostic(
                        tick,
                        source.to_string(),
                        RejectReason::TagCapReached,
                        format!("{id} already carries {MAX_ENTITY_TAGS} tags"),
                    );
                    return false;
                }
                if let Some(entry) = self.graph.entity_mut(&id) {
                    entry.tags.insert(tag.clone());
                    entry.updated_at_tick = tick;
                }
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::TagAdded,
                    vec![id],
                    format!("{name} takes on the mark of {tag}"),
                    None,
                );
                true
            }
        }
    }

    fn set_class(
        &mut self,
        id: &str,
        next: EntityClass,
        current: EntityClass,
        name: &str,
        tick: u64,
        sequence_in_tick: &mut u64,
    ) -> bool {
        if next == current {
            return false;
        }
        if let Some(entry) = self.graph.entity_mut(id) {
            entry.class = next;
            entry.updated_at_tick = tick;
        }
        self.push_event(
            tick,
            sequence_in_tick,
            EventType::StatusChanged,
            vec![id.to_string()],
            format!("{name} is now {}", next.status_label()),
            None,
        );
        true
    }

    pub(super) fn display_name(&self, id: &str) -> String {
        self.graph
            .entity(id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

fn prominence_label(prominence: contracts::Prominence) -> &'static str {
    use contracts::Prominence::*;
    match prominence {
        Forgotten => "forgotten",
        Marginal => "marginal",
        Recognized => "recognized",
        Renowned => "renowned",
        Mythic => "mythic",
    }
}

fn entity_has_tag(world: &HistoryWorld, id: &str, tag: &str) -> bool {
    world
        .graph
        .entity(id)
        .map(|e| e.has_tag(tag))
        .unwrap_or(false)
}
