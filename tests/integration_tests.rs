use cnf_norm::normalize::{
    eliminate_epsilon, eliminate_units, isolate_start, isolate_terminals, shorten_productions,
};
use cnf_norm::{
    FreshNames, Grammar, GrammarBuilder, GrammarError, GrammarSchema, Production, cnf_violations,
    language, to_cnf,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::fs;

/// Bounded-exhaustive language oracle: every derivable string with at
/// most six terminals.
fn language_of(grammar: &Grammar) -> BTreeSet<String> {
    language::enumerate(grammar, 6, 24)
}

#[test]
fn test_balanced_pairs_scenario() {
    let mut grammar = GrammarBuilder::new("S")
        .rule("S", &["a S b", "ε"])
        .build()
        .unwrap();
    let before = language_of(&grammar);

    to_cnf(&mut grammar);

    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), before);
    assert!(before.contains(""));

    // The empty string survives as the new start's ε production.
    assert_eq!(grammar.start_variable(), "S0");
    assert!(grammar.productions("S0").contains(&Production::epsilon()));

    // Exactly two terminal-unit variables, one for `a` and one for `b`.
    let terminal_units: BTreeSet<String> = grammar
        .rule_order()
        .iter()
        .filter(|variable| {
            let productions = grammar.productions(variable);
            productions.len() == 1
                && productions[0].len() == 1
                && productions[0].symbols[0].is_terminal()
        })
        .map(|variable| grammar.productions(variable)[0].to_string())
        .collect();
    let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    assert_eq!(terminal_units, expected);
}

#[test]
fn test_unit_chain_scenario() {
    let mut grammar = GrammarBuilder::new("A")
        .rule("A", &["B"])
        .rule("B", &["C"])
        .rule("C", &["a"])
        .build()
        .unwrap();
    let before = language_of(&grammar);
    assert_eq!(before.len(), 1);

    to_cnf(&mut grammar);

    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), before);
    // Transitively inlined: A derives `a` directly.
    assert_eq!(grammar.productions("A"), &[Production::parse("a").unwrap()]);
}

#[test]
fn test_long_production_scenario() {
    let mut grammar = GrammarBuilder::new("S")
        .rule("S", &["a B c D"])
        .rule("B", &["b"])
        .rule("D", &["d"])
        .build()
        .unwrap();
    let before = language_of(&grammar);

    to_cnf(&mut grammar);

    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), before);
    for variable in grammar.rule_order() {
        for production in grammar.productions(variable) {
            assert!(production.len() <= 2);
        }
    }
}

#[test]
fn test_invalid_rule_name_scenario() {
    let mut grammar = Grammar::new("S");
    let result = grammar.add_rule("s", vec![Production::parse("a").unwrap()]);
    assert!(matches!(result, Err(GrammarError::InvalidRuleName(_))));
}

#[test]
fn test_each_stage_preserves_language() {
    let grammar = GrammarBuilder::new("S")
        .rule("S", &["A", "a S b", "ε"])
        .rule("A", &["c"])
        .build()
        .unwrap();
    let reference = language_of(&grammar);

    let mut staged = grammar.clone();
    let mut names = FreshNames::new();

    isolate_start(&mut staged);
    assert_eq!(language_of(&staged), reference, "start isolation");

    eliminate_epsilon(&mut staged);
    assert_eq!(language_of(&staged), reference, "epsilon elimination");

    eliminate_units(&mut staged);
    assert_eq!(language_of(&staged), reference, "unit elimination");

    shorten_productions(&mut staged, &mut names);
    assert_eq!(language_of(&staged), reference, "binarization");

    isolate_terminals(&mut staged, &mut names);
    assert_eq!(language_of(&staged), reference, "terminal isolation");

    assert!(cnf_violations(&staged).is_empty());
}

#[test]
fn test_pipeline_is_idempotent() {
    let mut grammar = GrammarBuilder::new("S")
        .rule("S", &["a S b", "ε"])
        .build()
        .unwrap();
    to_cnf(&mut grammar);
    let first = language_of(&grammar);

    // A second run may rename variables but must keep the shape and the
    // language.
    to_cnf(&mut grammar);
    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), first);
}

#[test]
fn test_unit_cycle_loses_nothing() {
    let mut grammar = GrammarBuilder::new("A")
        .rule("A", &["B", "a"])
        .rule("B", &["C", "b"])
        .rule("C", &["A", "c"])
        .build()
        .unwrap();
    let before = language_of(&grammar);
    let expected: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    assert_eq!(before, expected);

    to_cnf(&mut grammar);
    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), expected);
}

#[test]
fn test_empty_string_only_grammar() {
    let mut grammar = GrammarBuilder::new("S").rule("S", &["ε"]).build().unwrap();
    to_cnf(&mut grammar);

    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(grammar.to_string(), "S → ε");
    assert_eq!(language_of(&grammar), BTreeSet::from(["".to_string()]));
}

#[test]
fn test_display_after_conversion() {
    let mut grammar = GrammarBuilder::new("S").rule("S", &["a b"]).build().unwrap();
    to_cnf(&mut grammar);
    assert_eq!(grammar.to_string(), "S → U1U2\nU1 → a\nU2 → b");
}

#[test]
fn test_load_text_grammar_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("balanced.txt");
    fs::write(
        &path,
        "# balanced pairs\nS -> a S b | ε\n",
    )
    .unwrap();

    let mut grammar = Grammar::from_file(&path, "S").unwrap();
    let before = language_of(&grammar);

    to_cnf(&mut grammar);
    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), before);
}

#[test]
fn test_load_json_grammar_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("balanced.json");
    fs::write(
        &path,
        r#"{
            "variables": ["S"],
            "terminals": ["a", "b"],
            "rules": { "S": [["a", "S", "b"], ["ε"]] },
            "start_variable": "S"
        }"#,
    )
    .unwrap();

    let schema = GrammarSchema::from_file(&path).unwrap();
    let mut grammar = schema.into_grammar().unwrap();
    let before = language_of(&grammar);

    to_cnf(&mut grammar);
    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), before);
}

#[test]
fn test_mixed_grammar_end_to_end() {
    // Epsilon, units, long productions and embedded terminals all at once.
    let mut grammar = GrammarBuilder::new("S")
        .rule("S", &["A B", "B"])
        .rule("A", &["a A", "ε"])
        .rule("B", &["b S c", "d"])
        .build()
        .unwrap();
    let before = language_of(&grammar);

    to_cnf(&mut grammar);
    assert!(cnf_violations(&grammar).is_empty());
    assert_eq!(language_of(&grammar), before);
}
