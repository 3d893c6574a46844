//! Economic phases: transfers, trade, regional income, markets, and
//! faction withdrawal.

use crate::engine::{drain_orders, faction_error, faction_event, PhaseError, TurnCtx};
use crate::game::item::Item;
use crate::game::session::Session;
use crate::game::unit::TaxState;
use crate::orders::Order;

/// Silver one man can raise from a region's wealth per turn.
const TAX_PER_MAN: i64 = 50;

/// Phase 8: GIVE/PAY/TRANSFER. Unconditional transfer to a unit in the
/// same region; target 0 discards the goods.
pub fn run_give_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut gives: Vec<(u32, u32, i64, Item)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let giver = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Give { .. })) {
                if let Order::Give {
                    target,
                    amount,
                    item,
                } = order
                {
                    gives.push((giver, target, amount, item));
                }
            }
        }
        for (giver, target, amount, item) in gives {
            give(session, region_idx, giver, target, amount, item);
        }
    }
    Ok(())
}

fn give(
    session: &mut Session,
    region_idx: usize,
    giver: u32,
    target: u32,
    amount: i64,
    item: Item,
) {
    let giver_faction = match session.regions[region_idx].unit(giver) {
        Some(u) => u.faction,
        None => return,
    };
    if target != 0 && session.regions[region_idx].unit(target).is_none() {
        faction_error(
            session,
            giver_faction,
            format!("give: unit {} is not here.", target),
        );
        return;
    }
    let moved = session.regions[region_idx]
        .unit_mut(giver)
        .map(|u| u.take_item(item, amount))
        .unwrap_or(0);
    if moved == 0 {
        faction_error(
            session,
            giver_faction,
            format!("give: nothing to give ({}).", item.keyword()),
        );
        return;
    }
    if target == 0 {
        faction_event(
            session,
            giver_faction,
            format!("Discards {} {}.", moved, item.keyword()),
        );
        return;
    }
    let target_faction = session.regions[region_idx].unit(target).map(|u| u.faction);
    if let Some(unit) = session.regions[region_idx].unit_mut(target) {
        unit.add_item(item, moved);
    }
    faction_event(
        session,
        giver_faction,
        format!("Gives {} {} to unit {}.", moved, item.keyword(), target),
    );
    if let Some(tf) = target_faction {
        if tf != giver_faction {
            faction_event(
                session,
                tf,
                format!("Unit {} receives {} {} from unit {}.", target, moved, item.keyword(), giver),
            );
        }
    }
}

/// Phase 9: EXCHANGE. Kept distinct from GIVE because it settles only on
/// a mutual offer match: A offers X for Y to B while B offers Y for X to A.
pub fn run_exchange_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    #[derive(Clone, Copy)]
    struct Offer {
        unit: u32,
        target: u32,
        give_amount: i64,
        give_item: Item,
        want_amount: i64,
        want_item: Item,
    }

    for region_idx in 0..session.regions.len() {
        let mut offers: Vec<Offer> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Exchange { .. })) {
                if let Order::Exchange {
                    target,
                    give_amount,
                    give_item,
                    want_amount,
                    want_item,
                } = order
                {
                    offers.push(Offer {
                        unit: num,
                        target,
                        give_amount,
                        give_item,
                        want_amount,
                        want_item,
                    });
                }
            }
        }

        let mut settled = vec![false; offers.len()];
        for i in 0..offers.len() {
            if settled[i] {
                continue;
            }
            let a = offers[i];
            let matched = (i + 1..offers.len()).find(|&j| {
                !settled[j] && {
                    let b = offers[j];
                    b.unit == a.target
                        && b.target == a.unit
                        && b.give_item == a.want_item
                        && b.give_amount == a.want_amount
                        && b.want_item == a.give_item
                        && b.want_amount == a.give_amount
                }
            });
            let j = match matched {
                Some(j) => j,
                None => {
                    let faction = session.regions[region_idx]
                        .unit(a.unit)
                        .map(|u| u.faction);
                    if let Some(f) = faction {
                        faction_error(
                            session,
                            f,
                            format!("exchange: no matching offer from unit {}.", a.target),
                        );
                    }
                    continue;
                }
            };

            let region = &session.regions[region_idx];
            let a_has = region
                .unit(a.unit)
                .map(|u| u.item_amount(a.give_item) >= a.give_amount)
                .unwrap_or(false);
            let b_has = region
                .unit(a.target)
                .map(|u| u.item_amount(a.want_item) >= a.want_amount)
                .unwrap_or(false);
            if !a_has || !b_has {
                let short = if a_has { a.target } else { a.unit };
                let faction = region.unit(short).map(|u| u.faction);
                if let Some(f) = faction {
                    faction_error(
                        session,
                        f,
                        format!("exchange: unit {} lacks the offered goods.", short),
                    );
                }
                settled[i] = true;
                settled[j] = true;
                continue;
            }

            let region = &mut session.regions[region_idx];
            if let Some(u) = region.unit_mut(a.unit) {
                u.add_item(a.give_item, -a.give_amount);
                u.add_item(a.want_item, a.want_amount);
            }
            if let Some(u) = region.unit_mut(a.target) {
                u.add_item(a.want_item, -a.want_amount);
                u.add_item(a.give_item, a.give_amount);
            }
            settled[i] = true;
            settled[j] = true;
            let f_a = session.regions[region_idx].unit(a.unit).map(|u| u.faction);
            if let Some(f) = f_a {
                faction_event(
                    session,
                    f,
                    format!(
                        "Exchanges {} {} for {} {} with unit {}.",
                        a.give_amount,
                        a.give_item.keyword(),
                        a.want_amount,
                        a.want_item.keyword(),
                        a.target
                    ),
                );
            }
        }
    }
    Ok(())
}

/// Phase 11: PILLAGE. Violent extraction: double the tax take, at the
/// cost of halving the region's remaining wealth. Runs before TAX so
/// pillagers are ineligible taxers in the same pass.
pub fn run_pillage_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut pillagers: Vec<u32> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for _ in drain_orders(unit, |o| matches!(o, Order::Pillage)) {
                pillagers.push(num);
            }
        }
        for num in pillagers {
            let region = &session.regions[region_idx];
            let (faction, men) = match region.unit(num) {
                Some(u) if !u.is_empty() => (u.faction, u.men),
                _ => continue,
            };
            if let Some(guard) = region.guard_faction {
                if guard != faction {
                    faction_error(
                        session,
                        faction,
                        format!("pillage: {} is guarded.", session.regions[region_idx].name),
                    );
                    continue;
                }
            }
            let take = (men * TAX_PER_MAN * 2).min(session.regions[region_idx].wealth);
            let region = &mut session.regions[region_idx];
            region.wealth = (region.wealth - take) / 2;
            let name = region.name.clone();
            if let Some(unit) = region.unit_mut(num) {
                unit.add_item(Item::Silver, take);
                unit.taxing = TaxState::Pillage;
            }
            faction_event(
                session,
                faction,
                format!("Pillages {} silver from {}.", take, name),
            );
        }
    }
    Ok(())
}

/// Phase 12: TAX. Peaceful regional income; mutually exclusive with
/// pillage per unit per turn.
pub fn run_tax_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut taxers: Vec<u32> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for _ in drain_orders(unit, |o| matches!(o, Order::Tax)) {
                taxers.push(num);
            }
        }
        for num in taxers {
            let region = &session.regions[region_idx];
            let (faction, men, taxing) = match region.unit(num) {
                Some(u) if !u.is_empty() => (u.faction, u.men, u.taxing),
                _ => continue,
            };
            if taxing != TaxState::None {
                faction_error(
                    session,
                    faction,
                    format!("tax: unit {} already pillaged this month.", num),
                );
                continue;
            }
            if let Some(guard) = region.guard_faction {
                if guard != faction {
                    faction_error(
                        session,
                        faction,
                        format!("tax: {} is guarded.", region.name),
                    );
                    continue;
                }
            }
            let take = (men * TAX_PER_MAN).min(session.regions[region_idx].wealth);
            let region = &mut session.regions[region_idx];
            region.wealth -= take;
            let name = region.name.clone();
            if let Some(unit) = region.unit_mut(num) {
                unit.add_item(Item::Silver, take);
                unit.taxing = TaxState::Tax;
            }
            faction_event(
                session,
                faction,
                format!("Collects {} silver in taxes from {}.", take, name),
            );
        }
    }
    Ok(())
}

/// Phase 13: GUARD (the guard-on variant; guard-off is an instant order
/// handled at parse time).
pub fn run_guard_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let is_ocean = session.regions[region_idx].is_ocean();
        let mut errors: Vec<(u32, String)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            for _ in drain_orders(unit, |o| matches!(o, Order::Guard)) {
                if is_ocean {
                    errors.push((unit.faction, "guard: cannot guard the open sea.".to_string()));
                } else if unit.is_empty() {
                    continue;
                } else {
                    unit.guard = true;
                }
            }
        }
        for (faction, message) in errors {
            faction_error(session, faction, message);
        }
    }
    Ok(())
}

/// Phase 15a: SELL. Sales stock the region market, so same-turn buys can
/// consume them; this is why SELL precedes BUY.
pub fn run_sell_orders(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut sells: Vec<(u32, i64, Item)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Sell { .. })) {
                if let Order::Sell { amount, item } = order {
                    sells.push((num, amount, item));
                }
            }
        }
        for (num, amount, item) in sells {
            let faction = match session.regions[region_idx].unit(num) {
                Some(u) => u.faction,
                None => continue,
            };
            if !ctx.rules.item_enabled(item) || item == Item::Silver {
                faction_error(
                    session,
                    faction,
                    format!("sell: {} cannot be traded.", item.keyword()),
                );
                continue;
            }
            let price = session.regions[region_idx]
                .market_line(item)
                .map(|l| l.price)
                .unwrap_or_else(|| item.base_price());
            let sold = session.regions[region_idx]
                .unit_mut(num)
                .map(|u| u.take_item(item, amount))
                .unwrap_or(0);
            if sold == 0 {
                faction_error(
                    session,
                    faction,
                    format!("sell: no {} to sell.", item.keyword()),
                );
                continue;
            }
            session.regions[region_idx].stock_market(item, sold);
            if let Some(unit) = session.regions[region_idx].unit_mut(num) {
                unit.add_item(Item::Silver, sold * price);
            }
            faction_event(
                session,
                faction,
                format!("Sells {} {} for {} silver.", sold, item.keyword(), sold * price),
            );
        }
    }
    Ok(())
}

/// Phase 15b: BUY, consuming market stock including this turn's sales.
pub fn run_buy_orders(session: &mut Session, ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut buys: Vec<(u32, i64, Item)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Buy { .. })) {
                if let Order::Buy { amount, item } = order {
                    buys.push((num, amount, item));
                }
            }
        }
        for (num, amount, item) in buys {
            let faction = match session.regions[region_idx].unit(num) {
                Some(u) => u.faction,
                None => continue,
            };
            if !ctx.rules.item_enabled(item) || item == Item::Silver {
                faction_error(
                    session,
                    faction,
                    format!("buy: {} cannot be traded.", item.keyword()),
                );
                continue;
            }
            let (price, stock) = match session.regions[region_idx].market_line(item) {
                Some(line) if line.amount > 0 => (line.price, line.amount),
                _ => {
                    faction_error(
                        session,
                        faction,
                        format!("buy: no {} for sale here.", item.keyword()),
                    );
                    continue;
                }
            };
            let silver = session.regions[region_idx]
                .unit(num)
                .map(|u| u.silver())
                .unwrap_or(0);
            let wanted = amount.min(stock).min(silver / price);
            if wanted <= 0 {
                faction_error(
                    session,
                    faction,
                    format!("buy: cannot afford any {}.", item.keyword()),
                );
                continue;
            }
            if let Some(line) = session.regions[region_idx].market_line_mut(item) {
                line.amount -= wanted;
            }
            if let Some(unit) = session.regions[region_idx].unit_mut(num) {
                unit.add_item(Item::Silver, -(wanted * price));
                unit.add_item(item, wanted);
            }
            faction_event(
                session,
                faction,
                format!("Buys {} {} for {} silver.", wanted, item.keyword(), wanted * price),
            );
        }
    }
    Ok(())
}

/// Phase 18: QUIT. A quit order flags the whole faction; flagged factions
/// (including those removed for inactivity) are wound up here.
pub fn run_quit_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region in &mut session.regions {
        for unit in &mut region.units {
            let quits = !drain_orders(unit, |o| matches!(o, Order::Quit)).is_empty();
            if quits {
                let faction = unit.faction;
                if let Some(f) = session.factions.iter_mut().find(|f| f.num == faction) {
                    if !f.is_npc {
                        f.quit = true;
                    }
                }
            }
        }
    }

    let quitting: Vec<u32> = session
        .factions
        .iter()
        .filter(|f| f.quit && f.exists && !f.is_npc)
        .map(|f| f.num)
        .collect();
    if quitting.is_empty() {
        return Ok(());
    }
    for region in &mut session.regions {
        for unit in &mut region.units {
            if quitting.contains(&unit.faction) {
                unit.destroy();
            }
        }
    }
    for num in quitting {
        if let Some(f) = session.factions.iter_mut().find(|f| f.num == num) {
            f.exists = false;
            f.event("Your faction has left the game.".to_string());
        }
    }
    Ok(())
}

/// Phase 20: WITHDRAW. Draws silver from the faction's unclaimed reserve
/// once the faction is being wound up (or at any time, for solvent
/// factions).
pub fn run_withdraw_orders(session: &mut Session, _ctx: &TurnCtx) -> Result<(), PhaseError> {
    for region_idx in 0..session.regions.len() {
        let mut withdraws: Vec<(u32, i64, Item)> = Vec::new();
        for unit in &mut session.regions[region_idx].units {
            let num = unit.num;
            for order in drain_orders(unit, |o| matches!(o, Order::Withdraw { .. })) {
                if let Order::Withdraw { amount, item } = order {
                    withdraws.push((num, amount, item));
                }
            }
        }
        for (num, amount, item) in withdraws {
            let faction = match session.regions[region_idx].unit(num) {
                Some(u) => u.faction,
                None => continue,
            };
            if item != Item::Silver {
                faction_error(
                    session,
                    faction,
                    "withdraw: only silver can be withdrawn.".to_string(),
                );
                continue;
            }
            let available = session.faction(faction).map(|f| f.unclaimed).unwrap_or(0);
            let drawn = amount.min(available).max(0);
            if drawn == 0 {
                faction_error(
                    session,
                    faction,
                    "withdraw: no unclaimed silver.".to_string(),
                );
                continue;
            }
            if let Some(f) = session.faction_mut(faction) {
                f.unclaimed -= drawn;
            }
            if let Some(unit) = session.regions[region_idx].unit_mut(num) {
                unit.add_item(Item::Silver, drawn);
            }
            faction_event(
                session,
                faction,
                format!("Withdraws {} silver from the faction reserve.", drawn),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::unit::Unit;
    use crate::rules::RuleSet;
    use std::path::Path;

    fn ctx(rules: &RuleSet) -> TurnCtx<'_> {
        TurnCtx {
            rules,
            dir: Path::new("."),
        }
    }

    fn two_units() -> (Session, u32, u32, u32) {
        let mut session = Session::dummy();
        let faction = session.new_faction("Traders", false);
        let a = session.next_unit_num();
        let mut ua = Unit::new(a, faction, "A");
        ua.men = 5;
        session.regions[0].units.push(ua);
        let b = session.next_unit_num();
        let mut ub = Unit::new(b, faction, "B");
        ub.men = 5;
        session.regions[0].units.push(ub);
        (session, faction, a, b)
    }

    #[test]
    fn give_transfers_capped_at_holdings() {
        let rules = RuleSet::standard();
        let (mut session, _, a, b) = two_units();
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Grain, 6);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Give {
            target: b,
            amount: 10,
            item: Item::Grain,
        });
        run_give_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Grain), 0);
        assert_eq!(session.unit(b).unwrap().item_amount(Item::Grain), 6);
    }

    #[test]
    fn give_crosses_faction_lines_and_notifies_the_recipient() {
        let rules = RuleSet::standard();
        let (mut session, _, a, _) = two_units();
        let strangers = session.new_faction("Strangers", false);
        let c = session.next_unit_num();
        let mut uc = Unit::new(c, strangers, "C");
        uc.men = 5;
        session.regions[0].units.push(uc);
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Grain, 4);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Give {
            target: c,
            amount: 4,
            item: Item::Grain,
        });
        run_give_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(c).unwrap().item_amount(Item::Grain), 4);
        assert!(session
            .faction(strangers)
            .unwrap()
            .events
            .iter()
            .any(|e| e.contains("receives")));
    }

    #[test]
    fn give_to_unit_zero_discards() {
        let rules = RuleSet::standard();
        let (mut session, faction, a, _) = two_units();
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Wood, 3);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Give {
            target: 0,
            amount: 3,
            item: Item::Wood,
        });
        run_give_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Wood), 0);
        assert!(session
            .faction(faction)
            .unwrap()
            .events
            .iter()
            .any(|e| e.contains("Discards")));
    }

    #[test]
    fn matched_exchange_settles() {
        let rules = RuleSet::standard();
        let (mut session, _, a, b) = two_units();
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Grain, 10);
        session.regions[0].unit_mut(b).unwrap().add_item(Item::Sword, 1);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Exchange {
            target: b,
            give_amount: 10,
            give_item: Item::Grain,
            want_amount: 1,
            want_item: Item::Sword,
        });
        session.regions[0].unit_mut(b).unwrap().orders.push(Order::Exchange {
            target: a,
            give_amount: 1,
            give_item: Item::Sword,
            want_amount: 10,
            want_item: Item::Grain,
        });
        run_exchange_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Sword), 1);
        assert_eq!(session.unit(b).unwrap().item_amount(Item::Grain), 10);
    }

    #[test]
    fn unmatched_exchange_is_an_error() {
        let rules = RuleSet::standard();
        let (mut session, faction, a, b) = two_units();
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Grain, 10);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Exchange {
            target: b,
            give_amount: 10,
            give_item: Item::Grain,
            want_amount: 1,
            want_item: Item::Sword,
        });
        run_exchange_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Grain), 10);
        assert!(!session.faction(faction).unwrap().errors.is_empty());
    }

    #[test]
    fn tax_collects_and_pillage_excludes_tax() {
        let rules = RuleSet::standard();
        let (mut session, _, a, b) = two_units();
        session.regions[0].wealth = 10_000;
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Pillage);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Tax);
        session.regions[0].unit_mut(b).unwrap().orders.push(Order::Tax);
        run_pillage_orders(&mut session, &ctx(&rules)).unwrap();
        run_tax_orders(&mut session, &ctx(&rules)).unwrap();

        // a pillaged 5 men * 50 * 2 = 500; its tax order then fails.
        assert_eq!(session.unit(a).unwrap().silver(), 500);
        assert_eq!(session.unit(a).unwrap().taxing, TaxState::Pillage);
        // b taxed against the halved remaining wealth.
        assert_eq!(session.unit(b).unwrap().silver(), 250);
    }

    #[test]
    fn pillage_halves_remaining_wealth() {
        let rules = RuleSet::standard();
        let (mut session, _, a, _) = two_units();
        session.regions[0].wealth = 1000;
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Pillage);
        run_pillage_orders(&mut session, &ctx(&rules)).unwrap();
        // take = 500, remaining (1000-500)/2 = 250.
        assert_eq!(session.regions[0].wealth, 250);
    }

    #[test]
    fn guarded_region_blocks_foreign_tax() {
        let rules = RuleSet::standard();
        let (mut session, faction, a, _) = two_units();
        let other = session.new_faction("Overlords", true);
        session.regions[0].guard_faction = Some(other);
        session.regions[0].wealth = 1000;
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Tax);
        run_tax_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().silver(), 0);
        assert!(!session.faction(faction).unwrap().errors.is_empty());
    }

    #[test]
    fn guard_order_sets_the_flag() {
        let rules = RuleSet::standard();
        let (mut session, _, a, _) = two_units();
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Guard);
        run_guard_orders(&mut session, &ctx(&rules)).unwrap();
        assert!(session.unit(a).unwrap().guard);
    }

    #[test]
    fn sell_stocks_market_for_same_turn_buy() {
        let rules = RuleSet::standard();
        let (mut session, _, a, b) = two_units();
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Sword, 2);
        session.regions[0].unit_mut(b).unwrap().add_item(Item::Silver, 1000);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Sell {
            amount: 2,
            item: Item::Sword,
        });
        session.regions[0].unit_mut(b).unwrap().orders.push(Order::Buy {
            amount: 2,
            item: Item::Sword,
        });
        run_sell_orders(&mut session, &ctx(&rules)).unwrap();
        run_buy_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(b).unwrap().item_amount(Item::Sword), 2);
        assert_eq!(
            session.unit(a).unwrap().silver(),
            2 * Item::Sword.base_price()
        );
    }

    #[test]
    fn buy_is_limited_by_silver() {
        let rules = RuleSet::standard();
        let (mut session, _, a, _) = two_units();
        session.regions[0].stock_market(Item::Horse, 10);
        session.regions[0].unit_mut(a).unwrap().add_item(Item::Silver, 100);
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Buy {
            amount: 10,
            item: Item::Horse,
        });
        run_buy_orders(&mut session, &ctx(&rules)).unwrap();
        // 100 silver at 60 per horse buys exactly one.
        assert_eq!(session.unit(a).unwrap().item_amount(Item::Horse), 1);
        assert_eq!(session.unit(a).unwrap().silver(), 40);
    }

    #[test]
    fn quit_winds_up_the_faction() {
        let rules = RuleSet::standard();
        let (mut session, faction, a, b) = two_units();
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Quit);
        run_quit_orders(&mut session, &ctx(&rules)).unwrap();
        let f = session.faction(faction).unwrap();
        assert!(f.quit);
        assert!(!f.exists);
        assert!(session.unit(a).unwrap().is_empty());
        assert!(session.unit(b).unwrap().is_empty());
    }

    #[test]
    fn withdraw_draws_from_unclaimed() {
        let rules = RuleSet::standard();
        let (mut session, faction, a, _) = two_units();
        session.faction_mut(faction).unwrap().unclaimed = 300;
        session.regions[0].unit_mut(a).unwrap().orders.push(Order::Withdraw {
            amount: 500,
            item: Item::Silver,
        });
        run_withdraw_orders(&mut session, &ctx(&rules)).unwrap();
        assert_eq!(session.unit(a).unwrap().silver(), 300);
        assert_eq!(session.faction(faction).unwrap().unclaimed, 0);
    }
}
