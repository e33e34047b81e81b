//! The growth phase: weighted, shuffled template application.

use contracts::EventType;

use crate::era::Era;
use crate::rolls::Dice;

use super::HistoryWorld;

/// Attempts a weight earns this phase: the whole part, plus one more with
/// probability equal to the fraction. Capped so a heavily boosted template
/// cannot monopolize an epoch.
fn attempts_for_weight(weight: f64, dice: &mut Dice) -> u32 {
    let whole = weight.floor() as u32;
    let fraction = weight - weight.floor();
    let extra = u32::from(fraction > 0.0 && dice.chance_bps((fraction * 10_000.0) as u32));
    (whole + extra).min(3)
}

impl HistoryWorld {
    pub(super) fn growth_phase(&mut self, era: &Era, tick: u64, sequence_in_tick: &mut u64) {
        let budget = self.config.templates_per_epoch;
        if budget == 0 {
            return;
        }

        // Shuffle the catalog for variety; the stream is keyed on the tick so
        // each epoch draws a different order, reproducibly.
        let mut order = (0..self.templates.len()).collect::<Vec<_>>();
        let mut shuffle_dice = Dice::for_stream(self.config.seed, tick, "growth:shuffle");
        shuffle_dice.shuffle(&mut order);

        let mut applied = 0_u32;
        for idx in order {
            if applied >= budget {
                break;
            }
            let (template_id, primary_kind, weight) = {
                let template = &self.templates[idx];
                (
                    template.id(),
                    template.primary_kind(),
                    template.base_weight() * era.template_weight(template.id()),
                )
            };
            // 0 is a hard disable.
            if weight <= 0.0 {
                continue;
            }
            if let Some(target) = self.config.target_for(primary_kind) {
                if self.graph.count_of_kind(primary_kind) >= target {
                    continue;
                }
            }

            let mut dice =
                Dice::for_stream(self.config.seed, tick, &format!("template:{template_id:?}"));
            let attempts = attempts_for_weight(weight, &mut dice);
            for _ in 0..attempts {
                if applied >= budget {
                    break;
                }
                let expansion = {
                    let template = &self.templates[idx];
                    if !template.can_apply(&self.graph, &self.config.tuning) {
                        break;
                    }
                    let targets = template.find_targets(&self.graph);
                    // A template must never be expanded without a target.
                    if targets.is_empty() {
                        break;
                    }
                    let Some(target_idx) = dice.index(targets.len()) else {
                        break;
                    };
                    template.expand(&self.graph, &targets[target_idx], &mut dice)
                };
                match expansion {
                    Some(batch) => {
                        if self.commit_growth_batch(template_id, batch, tick, sequence_in_tick) {
                            applied += 1;
                        }
                    }
                    None => {
                        // Invalid target on closer inspection: skip the
                        // template for this cycle, never crash the epoch.
                        self.push_event(
                            tick,
                            sequence_in_tick,
                            EventType::TemplateAborted,
                            Vec::new(),
                            format!("{template_id:?} found no valid expansion for its target"),
                            None,
                        );
                        break;
                    }
                }
            }
        }
    }
}
