//! Offer Generation
//!
//! Enumerates every actor's candidate actions and marks the ones that fail
//! V1 or V2 as blocked.

use simkit_events::{ActionKind, ActionOffer};

use crate::actions::{action_from_offer, spec_for, ActionCtx, Check};
use crate::error::Result;

/// Kinds offered to an actor with an open intent
pub const INTENT_KINDS: [ActionKind; 3] = [
    ActionKind::ContinueIntent,
    ActionKind::AbortIntent,
    ActionKind::Wait,
];

/// All offers for this tick, in rank order (score descending, then actor,
/// target and kind).
pub fn enumerate_action_offers(ctx: &ActionCtx) -> Result<Vec<ActionOffer>> {
    let mut offers = Vec::new();

    for actor in ctx.world.characters() {
        let kinds: Vec<ActionKind> = if ctx.world.facts.has_intent(&actor.id) {
            INTENT_KINDS.to_vec()
        } else {
            ActionKind::all()
                .iter()
                .copied()
                .filter(|k| !k.is_intent_control())
                .collect()
        };

        for kind in kinds {
            let spec = spec_for(kind);
            for mut offer in spec.enumerate(ctx, actor)? {
                let action = action_from_offer(ctx.world, ctx.cfg, &offer);
                if let Check::Fail(reason) = spec.validate_v1(ctx, &action)? {
                    offer.block(reason);
                } else if let Check::Fail(reason) = spec.validate_v2(ctx, &action)? {
                    offer.block(reason);
                }
                offers.push(offer);
            }
        }
    }

    offers.sort_by(|a, b| a.rank_cmp(b));
    Ok(offers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::yard;
    use crate::config::SimConfig;

    #[test]
    fn test_offers_are_ranked_and_blocked() {
        let mut world = yard();
        world.get_loc_mut("yard").unwrap().norms.insert("no_violence".into(), 0.9);
        let cfg = SimConfig::default();
        let ctx = ActionCtx::new(&world, &cfg);
        let offers = enumerate_action_offers(&ctx).unwrap();

        for pair in offers.windows(2) {
            assert_ne!(pair[0].rank_cmp(&pair[1]), std::cmp::Ordering::Greater);
        }
        let attack = offers
            .iter()
            .find(|o| o.kind == ActionKind::Attack && o.actor_id == "ada")
            .unwrap();
        assert!(attack.blocked);
        assert_eq!(attack.reason.as_deref(), Some("norm:no_violence"));
        assert!(offers.iter().all(|o| !o.kind.is_intent_control()));
    }

    #[test]
    fn test_open_intent_restricts_offers() {
        let mut world = yard();
        let record = crate::actions::intent::IntentRecord {
            id: "intent:000000:ada".into(),
            started_at_tick: 0,
            remaining_ticks: 2,
            intent: crate::actions::intent::IntentBody {
                original_action: simkit_events::SimAction::wait(0, "ada"),
            },
        };
        world.facts.set_intent("ada", &record).unwrap();
        let cfg = SimConfig::default();
        let ctx = ActionCtx::new(&world, &cfg);
        let offers = enumerate_action_offers(&ctx).unwrap();

        let mut ada: Vec<ActionKind> = offers
            .iter()
            .filter(|o| o.actor_id == "ada")
            .map(|o| o.kind)
            .collect();
        ada.sort();
        assert_eq!(
            ada,
            vec![ActionKind::Wait, ActionKind::ContinueIntent, ActionKind::AbortIntent]
        );
        assert!(offers.iter().any(|o| o.actor_id == "bo" && o.kind == ActionKind::Talk));
    }
}
