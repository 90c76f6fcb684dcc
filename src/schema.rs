use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::grammar::{Grammar, Production, Symbol};
use crate::utils::{GrammarError, Result};

/// A grammar description as stored in JSON files: declared variables and
/// terminals, rules mapping each variable to its productions (each a
/// sequence of symbol tokens), and the start variable.
///
/// ```json
/// {
///   "variables": ["S"],
///   "terminals": ["a", "b"],
///   "rules": { "S": [["a", "S", "b"], ["ε"]] },
///   "start_variable": "S"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarSchema {
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub terminals: Vec<String>,
    pub rules: BTreeMap<String, Vec<Vec<String>>>,
    pub start_variable: String,
}

impl GrammarSchema {
    /// Load a grammar description from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let schema = serde_json::from_str(&text)?;
        Ok(schema)
    }

    /// Build a validated grammar from the description. Symbols referenced
    /// in rules but missing from the declared lists are promoted by the
    /// usual casing/marker heuristic.
    pub fn into_grammar(self) -> Result<Grammar> {
        let GrammarSchema {
            variables,
            terminals,
            rules,
            start_variable,
        } = self;

        let mut grammar = Grammar::new(&start_variable);
        grammar.declare_variables(variables);
        grammar.declare_terminals(terminals);

        for (lhs, alternatives) in rules {
            let mut productions = Vec::new();
            for tokens in alternatives {
                if tokens.is_empty() {
                    return Err(GrammarError::Parse(format!(
                        "empty production for {} in grammar description",
                        lhs
                    )));
                }
                let symbols = tokens.iter().map(|token| Symbol::classify(token)).collect();
                productions.push(Production::new(symbols));
            }
            grammar.add_rule(&lhs, productions)?;
        }

        if grammar.productions(&start_variable).is_empty() {
            return Err(GrammarError::UnknownStartVariable(start_variable));
        }
        Ok(grammar)
    }
}
