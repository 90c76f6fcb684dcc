use rand::Rng;
use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::grammar::{Grammar, Symbol};

/// All terminal strings derivable from the start variable within the
/// given bounds: at most `max_terminals` terminal symbols per string and
/// at most `max_steps` derivation steps.
///
/// Breadth-first leftmost derivation over sentential forms. Visited forms
/// are deduplicated, so unit cycles terminate; forms that already carry
/// more terminals than the bound are pruned, since terminals never
/// disappear. With the same bounds on both sides this serves as a
/// language-comparison oracle for small grammars.
pub fn enumerate(grammar: &Grammar, max_terminals: usize, max_steps: usize) -> BTreeSet<String> {
    let mut strings = BTreeSet::new();
    let start_form = vec![Symbol::Variable(grammar.start_variable().to_string())];
    let mut visited: HashSet<Vec<Symbol>> = HashSet::new();
    visited.insert(start_form.clone());
    let mut queue: VecDeque<(Vec<Symbol>, usize)> = VecDeque::new();
    queue.push_back((start_form, 0));

    while let Some((form, steps)) = queue.pop_front() {
        let terminal_count = form.iter().filter(|symbol| symbol.is_terminal()).count();
        if terminal_count > max_terminals {
            continue;
        }

        let position = match form.iter().position(Symbol::is_variable) {
            Some(position) => position,
            None => {
                let text: String = form.iter().map(ToString::to_string).collect();
                strings.insert(text);
                continue;
            }
        };
        if steps >= max_steps {
            continue;
        }

        let variable = match &form[position] {
            Symbol::Variable(name) => name.clone(),
            _ => unreachable!(),
        };
        for production in grammar.productions(&variable) {
            let mut next = Vec::with_capacity(form.len() + production.len());
            next.extend_from_slice(&form[..position]);
            next.extend(
                production
                    .symbols
                    .iter()
                    .filter(|symbol| **symbol != Symbol::Epsilon)
                    .cloned(),
            );
            next.extend_from_slice(&form[position + 1..]);
            if visited.insert(next.clone()) {
                queue.push_back((next, steps + 1));
            }
        }
    }
    strings
}

/// Draw one random string from the grammar by leftmost expansion,
/// choosing uniformly among each variable's productions. Returns `None`
/// when the depth bound is hit or a variable has no productions.
pub fn sample<R: Rng>(grammar: &Grammar, rng: &mut R, max_depth: usize) -> Option<String> {
    let mut output = String::new();
    expand(grammar, grammar.start_variable(), rng, max_depth, &mut output)?;
    Some(output)
}

fn expand<R: Rng>(
    grammar: &Grammar,
    variable: &str,
    rng: &mut R,
    depth: usize,
    output: &mut String,
) -> Option<()> {
    if depth == 0 {
        return None;
    }
    let productions = grammar.productions(variable);
    if productions.is_empty() {
        return None;
    }

    let production = &productions[rng.gen_range(0..productions.len())];
    for symbol in &production.symbols {
        match symbol {
            Symbol::Terminal(token) => output.push_str(token),
            Symbol::Variable(name) => expand(grammar, name, rng, depth - 1, output)?,
            Symbol::Epsilon => {}
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn balanced() -> Grammar {
        GrammarBuilder::new("S")
            .rule("S", &["a S b", "ε"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_enumerate_balanced() {
        let strings = enumerate(&balanced(), 6, 24);
        let expected: BTreeSet<String> = ["", "ab", "aabb", "aaabbb"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(strings, expected);
    }

    #[test]
    fn test_enumerate_respects_terminal_bound() {
        let strings = enumerate(&balanced(), 2, 24);
        assert_eq!(strings.len(), 2);
        assert!(strings.contains(""));
        assert!(strings.contains("ab"));
    }

    #[test]
    fn test_enumerate_survives_unit_cycle() {
        let grammar = GrammarBuilder::new("A")
            .rule("A", &["B", "a"])
            .rule("B", &["A", "b"])
            .build()
            .unwrap();
        let strings = enumerate(&grammar, 4, 16);
        let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(strings, expected);
    }

    #[test]
    fn test_sample_stays_in_language() {
        let grammar = balanced();
        let strings = enumerate(&grammar, 12, 40);
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            if let Some(text) = sample(&grammar, &mut rng, 6) {
                assert!(strings.contains(&text), "sampled {:?} outside language", text);
            }
        }
    }

    #[test]
    fn test_sample_depth_limit() {
        // Every production recurses, so expansion always hits the bound.
        let grammar = GrammarBuilder::new("A")
            .rule("A", &["a A"])
            .build()
            .unwrap();
        let mut rng = rand::thread_rng();
        assert_eq!(sample(&grammar, &mut rng, 8), None);
    }
}
