use std::collections::{HashMap, HashSet};

use crate::grammar::{Grammar, Production, Symbol};

/// Fresh variable names drawn from a single incrementing counter (`U1`,
/// `U2`, ...), skipping any name the grammar already uses. Owned by the
/// pipeline driver and threaded into the stages that mint variables.
#[derive(Debug)]
pub struct FreshNames {
    next: usize,
}

impl Default for FreshNames {
    fn default() -> Self {
        Self::new()
    }
}

impl FreshNames {
    pub fn new() -> Self {
        FreshNames { next: 1 }
    }

    /// Mint a name not present in the grammar's variable set
    pub fn fresh(&mut self, grammar: &Grammar) -> String {
        loop {
            let name = format!("U{}", self.next);
            self.next += 1;
            if !grammar.variables().contains(&name) {
                return name;
            }
        }
    }
}

/// Convert the grammar to Chomsky Normal Form in place.
///
/// Runs the four stages in fixed order; each stage assumes the invariants
/// established by the previous ones. Panics if the result violates the CNF
/// shape, since that indicates a pipeline bug rather than bad input.
pub fn to_cnf(grammar: &mut Grammar) {
    let mut names = FreshNames::new();

    isolate_start(grammar);
    eliminate_epsilon(grammar);
    eliminate_units(grammar);
    shorten_productions(grammar, &mut names);
    isolate_terminals(grammar, &mut names);

    let violations = cnf_violations(grammar);
    assert!(
        violations.is_empty(),
        "normalization produced a non-CNF grammar: {:?}",
        violations
    );
}

/// Enumerate every way of keeping or dropping each occurrence of
/// `variable` in the production. Dropping all occurrences of the only
/// symbols present yields the `[ε]` sentinel. The result may contain
/// duplicates; insertion-level dedup removes them.
pub fn combinations(production: &Production, variable: &str) -> Vec<Production> {
    let indices: Vec<usize> = production
        .symbols
        .iter()
        .enumerate()
        .filter(|(_, symbol)| symbol.as_variable() == Some(variable))
        .map(|(index, _)| index)
        .collect();

    let mut results = Vec::new();
    for mask in 0..(1usize << indices.len()) {
        let mut symbols = Vec::with_capacity(production.len());
        for (position, symbol) in production.symbols.iter().enumerate() {
            let dropped = indices
                .iter()
                .position(|&index| index == position)
                .is_some_and(|bit| mask & (1 << bit) == 0);
            if !dropped {
                symbols.push(symbol.clone());
            }
        }
        if symbols.is_empty() {
            results.push(Production::epsilon());
        } else {
            results.push(Production::new(symbols));
        }
    }
    results
}

/// Guarantee the start variable never occurs on a right-hand side.
///
/// If it does, a fresh start variable is minted (`S0`, `S1`, ... first
/// name not taken), bound to the old start by a unit rule, and made the
/// new start. The first occurrence found short-circuits the scan; a no-op
/// otherwise.
pub fn isolate_start(grammar: &mut Grammar) {
    let old_start = grammar.start_variable().to_string();
    if !grammar.occurs_on_rhs(&old_start) {
        return;
    }

    let new_start = (0..)
        .map(|n| format!("S{}", n))
        .find(|name| !grammar.variables().contains(name))
        .unwrap();
    grammar.add_production(&new_start, Production::new(vec![Symbol::Variable(old_start)]));
    grammar.set_start_variable(&new_start);
}

/// Remove `[ε]` productions while preserving the language.
///
/// Worklist over nullable variables: removing a variable's `[ε]`
/// production is compensated by regenerating, for every production that
/// mentions it, all keep/drop combinations of its occurrences. Variables
/// that *become* nullable through that expansion are re-enqueued until the
/// nullable closure is exhausted.
///
/// The current start variable keeps its `[ε]` production, so the empty
/// string stays in the language; its occurrences elsewhere are still
/// compensated (after isolation there are none).
pub fn eliminate_epsilon(grammar: &mut Grammar) {
    let epsilon = Production::epsilon();
    let mut visited: HashSet<String> = HashSet::new();
    let mut worklist: Vec<String> = grammar
        .rule_order()
        .iter()
        .filter(|variable| grammar.productions(variable).contains(&epsilon))
        .cloned()
        .collect();

    while let Some(variable) = worklist.pop() {
        if !visited.insert(variable.clone()) {
            continue;
        }
        if variable != grammar.start_variable() {
            grammar.remove_production(&variable, &epsilon);
        }

        for other in grammar.rule_order().to_vec() {
            let mut rewritten = Vec::new();
            let mut changed = false;
            for production in grammar.productions(&other) {
                if production.contains_variable(&variable) {
                    rewritten.extend(combinations(production, &variable));
                    changed = true;
                } else {
                    rewritten.push(production.clone());
                }
            }
            if changed {
                grammar.replace_productions(&other, rewritten);
            }

            if grammar.productions(&other).contains(&epsilon)
                && !visited.contains(&other)
                && !worklist.contains(&other)
            {
                worklist.push(other);
            }
        }
    }
}

/// Remove unit productions `A → B` by inlining.
///
/// The unit graph and every production list are snapshotted at stage
/// entry. Each variable ends up with its own non-unit productions plus the
/// snapshot non-unit productions of every variable reachable from it
/// through the snapshot unit graph. Only non-unit productions are copied,
/// so no new unit pair can appear; self-loops and longer cycles are
/// bounded by the reachability visited-set.
pub fn eliminate_units(grammar: &mut Grammar) {
    let order = grammar.rule_order().to_vec();
    let mut snapshot: HashMap<String, Vec<Production>> = HashMap::new();
    let mut unit_targets: HashMap<String, Vec<String>> = HashMap::new();
    for variable in &order {
        let productions = grammar.productions(variable).to_vec();
        let targets = productions
            .iter()
            .filter_map(|production| production.as_unit())
            .map(str::to_string)
            .collect();
        unit_targets.insert(variable.clone(), targets);
        snapshot.insert(variable.clone(), productions);
    }

    for variable in &order {
        let units: Vec<Production> = grammar
            .productions(variable)
            .iter()
            .filter(|production| production.as_unit().is_some())
            .cloned()
            .collect();
        if units.is_empty() {
            continue;
        }
        for unit in &units {
            grammar.remove_production(variable, unit);
        }

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(variable.clone());
        let mut queue: Vec<String> = units
            .iter()
            .filter_map(|production| production.as_unit())
            .map(str::to_string)
            .collect();
        while let Some(target) = queue.pop() {
            if !seen.insert(target.clone()) {
                continue;
            }
            if let Some(productions) = snapshot.get(&target) {
                for production in productions {
                    if production.as_unit().is_none() {
                        grammar.add_production(variable, production.clone());
                    }
                }
            }
            if let Some(next) = unit_targets.get(&target) {
                queue.extend(next.iter().cloned());
            }
        }
    }
}

/// Binarization pass A: split every production of length ≥ 3 into
/// `[first, tail]`, binding the tail to an existing variable whose sole
/// production already equals it, or to a freshly minted one.
///
/// Driven as an index loop over `rule_order`; minted tail variables land
/// at the end and are split in turn until no long production remains.
pub fn shorten_productions(grammar: &mut Grammar, names: &mut FreshNames) {
    let mut index = 0;
    while index < grammar.rule_order().len() {
        let variable = grammar.rule_order()[index].clone();
        let mut slot = 0;
        while slot < grammar.productions(&variable).len() {
            let production = grammar.productions(&variable)[slot].clone();
            if production.len() < 3 {
                slot += 1;
                continue;
            }

            let tail = Production::new(production.symbols[1..].to_vec());
            let tail_variable = match sole_production_owner(grammar, &tail) {
                Some(owner) => owner,
                None => {
                    let fresh = names.fresh(grammar);
                    grammar.add_production(&fresh, tail);
                    fresh
                }
            };
            let replacement = Production::new(vec![
                production.symbols[0].clone(),
                Symbol::Variable(tail_variable),
            ]);
            if grammar.replace_production_at(&variable, slot, replacement) {
                slot += 1;
            }
        }
        index += 1;
    }
}

/// Binarization pass B: in every length-2 production, replace each
/// terminal with a variable whose sole production is that terminal,
/// reusing an existing one where possible.
pub fn isolate_terminals(grammar: &mut Grammar, names: &mut FreshNames) {
    let mut index = 0;
    while index < grammar.rule_order().len() {
        let variable = grammar.rule_order()[index].clone();
        let mut slot = 0;
        while slot < grammar.productions(&variable).len() {
            let production = grammar.productions(&variable)[slot].clone();
            if production.len() != 2 {
                slot += 1;
                continue;
            }
            let position = match production.symbols.iter().position(Symbol::is_terminal) {
                Some(position) => position,
                None => {
                    slot += 1;
                    continue;
                }
            };

            let token = Production::new(vec![production.symbols[position].clone()]);
            let isolated = match sole_production_owner(grammar, &token) {
                Some(owner) => owner,
                None => {
                    let fresh = names.fresh(grammar);
                    grammar.add_production(&fresh, token);
                    fresh
                }
            };
            let mut symbols = production.symbols;
            symbols[position] = Symbol::Variable(isolated);
            // On success the slot is re-examined: the other position may
            // hold a terminal too.
            grammar.replace_production_at(&variable, slot, Production::new(symbols));
        }
        index += 1;
    }
}

/// The variable whose production list is exactly `[production]`, if any.
/// The start variable is never reused: it must not reappear on a
/// right-hand side.
fn sole_production_owner(grammar: &Grammar, production: &Production) -> Option<String> {
    grammar
        .rule_order()
        .iter()
        .find(|variable| {
            variable.as_str() != grammar.start_variable()
                && grammar.productions(variable).len() == 1
                && grammar.productions(variable)[0] == *production
        })
        .cloned()
}

/// Every way the grammar's shape deviates from Chomsky Normal Form.
///
/// Empty after a successful pipeline run: every production is a single
/// terminal or two variables, epsilon occurs only as the start variable's
/// `[ε]`, and the start variable is absent from every right-hand side.
pub fn cnf_violations(grammar: &Grammar) -> Vec<String> {
    let start = grammar.start_variable().to_string();
    let mut violations = Vec::new();
    for variable in grammar.rule_order() {
        for production in grammar.productions(variable) {
            let rendered = format!("{} → {}", variable, production);
            match production.len() {
                1 => match &production.symbols[0] {
                    Symbol::Terminal(_) => {}
                    Symbol::Epsilon if *variable == start => {}
                    Symbol::Epsilon => {
                        violations.push(format!("ε outside the start variable: {}", rendered));
                    }
                    Symbol::Variable(_) => {
                        violations.push(format!("unit production: {}", rendered));
                    }
                },
                2 => {
                    if !production.symbols.iter().all(Symbol::is_variable) {
                        violations.push(format!("terminal in a binary production: {}", rendered));
                    } else if production.contains_variable(&start) {
                        violations
                            .push(format!("start variable on a right-hand side: {}", rendered));
                    }
                }
                length => {
                    violations.push(format!("production of length {}: {}", length, rendered));
                }
            }
        }
    }
    violations
}
