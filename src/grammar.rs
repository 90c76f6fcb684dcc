use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::utils::{GrammarError, Result, is_variable_name};

/// A symbol occurring in a production: a variable (non-terminal), a
/// terminal token, or the distinguished epsilon marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A variable (non-terminal), named by an uppercase letter plus
    /// optional digits
    Variable(String),
    /// A terminal token
    Terminal(String),
    /// The empty-production marker
    Epsilon,
}

impl Symbol {
    /// Classify a raw token: `ε` is epsilon, tokens matching the
    /// variable-name convention are variables, everything else is a
    /// terminal. Undeclared symbols are later promoted into the grammar's
    /// variable/terminal sets by the same heuristic.
    pub fn classify(token: &str) -> Symbol {
        if token == "ε" {
            Symbol::Epsilon
        } else if is_variable_name(token) {
            Symbol::Variable(token.to_string())
        } else {
            Symbol::Terminal(token.to_string())
        }
    }

    /// The variable name, if this symbol is a variable
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Symbol::Variable(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Symbol::Variable(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Variable(name) => write!(f, "{}", name),
            Symbol::Terminal(token) => write!(f, "{}", token),
            Symbol::Epsilon => write!(f, "ε"),
        }
    }
}

/// One alternative for a variable: an ordered sequence of symbols.
/// The single-element sequence `[ε]` is the sentinel for "derives the
/// empty string".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    /// The sequence of symbols in this production
    pub symbols: Vec<Symbol>,
}

impl Production {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Production { symbols }
    }

    /// The `[ε]` sentinel production
    pub fn epsilon() -> Self {
        Production {
            symbols: vec![Symbol::Epsilon],
        }
    }

    /// Parse a production from whitespace-separated tokens, e.g. `"a S b"`.
    /// A lone `ε` is the empty production; `ε` inside a longer sequence is
    /// rejected.
    pub fn parse(text: &str) -> Result<Production> {
        let symbols: Vec<Symbol> = text.split_whitespace().map(Symbol::classify).collect();
        if symbols.is_empty() {
            return Err(GrammarError::Parse(format!(
                "empty production in {:?}",
                text
            )));
        }
        if symbols.len() > 1 && symbols.contains(&Symbol::Epsilon) {
            return Err(GrammarError::Parse(format!(
                "ε must stand alone in a production: {:?}",
                text
            )));
        }
        Ok(Production { symbols })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// True for the `[ε]` sentinel
    pub fn is_epsilon(&self) -> bool {
        self.symbols.len() == 1 && self.symbols[0] == Symbol::Epsilon
    }

    /// If this is a unit production `[B]`, the variable name `B`
    pub fn as_unit(&self) -> Option<&str> {
        if self.symbols.len() == 1 {
            self.symbols[0].as_variable()
        } else {
            None
        }
    }

    /// Whether any position holds the given variable
    pub fn contains_variable(&self, name: &str) -> bool {
        self.symbols
            .iter()
            .any(|symbol| symbol.as_variable() == Some(name))
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

/// A context-free grammar: variables, terminals, per-variable production
/// lists and a start variable.
///
/// Rule entries keep their insertion order in `rule_order`, so fixed-point
/// loops can walk the entries by index while appending freshly minted
/// variables at the end.
#[derive(Debug, Clone)]
pub struct Grammar {
    variables: HashSet<String>,
    terminals: HashSet<String>,
    rules: HashMap<String, Vec<Production>>,
    rule_order: Vec<String>,
    start_variable: String,
}

impl Grammar {
    /// Create an empty grammar with the given start variable
    pub fn new(start_variable: &str) -> Self {
        let mut variables = HashSet::new();
        variables.insert(start_variable.to_string());
        Grammar {
            variables,
            terminals: HashSet::new(),
            rules: HashMap::new(),
            rule_order: Vec::new(),
            start_variable: start_variable.to_string(),
        }
    }

    /// Parse a grammar from line-based text.
    ///
    /// Each rule line reads `LHS -> alt | alt | ...` (the arrow may also be
    /// written `→`); alternatives are whitespace-separated symbol tokens
    /// and `ε` denotes the empty production. Blank lines and `#` comments
    /// are skipped; repeated left-hand sides merge their alternatives.
    pub fn from_str_rules(text: &str, start_variable: &str) -> Result<Self> {
        let rule_regex = Regex::new(r"^\s*(\S+)\s*(?:->|→)\s*(.+?)\s*$").unwrap();
        let mut grammar = Grammar::new(start_variable);

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let captures = rule_regex.captures(trimmed).ok_or_else(|| {
                GrammarError::Parse(format!("malformed rule line: {:?}", trimmed))
            })?;
            let lhs = captures.get(1).unwrap().as_str();
            let rhs = captures.get(2).unwrap().as_str();

            let mut productions = Vec::new();
            for alternative in rhs.split('|') {
                let alternative = alternative.trim();
                if alternative.is_empty() {
                    return Err(GrammarError::Parse(format!(
                        "empty alternative in rule line: {:?}",
                        trimmed
                    )));
                }
                productions.push(Production::parse(alternative)?);
            }
            grammar.add_rule(lhs, productions)?;
        }

        if !grammar.rules.contains_key(start_variable) {
            return Err(GrammarError::UnknownStartVariable(
                start_variable.to_string(),
            ));
        }
        Ok(grammar)
    }

    /// Parse a grammar from a file in the text format of [`from_str_rules`]
    ///
    /// [`from_str_rules`]: Grammar::from_str_rules
    pub fn from_file<P: AsRef<Path>>(path: P, start_variable: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Grammar::from_str_rules(&text, start_variable)
    }

    /// Register declared variables up front. Symbols referenced in rules
    /// are promoted lazily, so this is only needed for variables that never
    /// occur anywhere.
    pub fn declare_variables<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.variables.insert(name.into());
        }
    }

    /// Register declared terminals up front
    pub fn declare_terminals<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for token in tokens {
            self.terminals.insert(token.into());
        }
    }

    /// Append a production to a variable's list unless an identical one is
    /// already listed. Registers the variable if it has no entry yet.
    pub fn add_production(&mut self, variable: &str, production: Production) {
        self.variables.insert(variable.to_string());
        match self.rules.get_mut(variable) {
            Some(productions) => {
                if !productions.contains(&production) {
                    productions.push(production);
                }
            }
            None => {
                self.rules.insert(variable.to_string(), vec![production]);
                self.rule_order.push(variable.to_string());
            }
        }
    }

    /// Add a rule `lhs → productions`.
    ///
    /// Fails with [`GrammarError::InvalidRuleName`] when `lhs` does not
    /// match the variable-name convention, and performs no mutation in that
    /// case. Symbols occurring in the productions are silently promoted
    /// into the variable or terminal set by the casing/marker heuristic.
    pub fn add_rule(&mut self, lhs: &str, productions: Vec<Production>) -> Result<()> {
        if !is_variable_name(lhs) {
            return Err(GrammarError::InvalidRuleName(lhs.to_string()));
        }
        for production in &productions {
            if production.len() > 1 && production.symbols.contains(&Symbol::Epsilon) {
                return Err(GrammarError::InvalidGrammar(format!(
                    "ε must stand alone in a production of {}",
                    lhs
                )));
            }
        }

        for production in productions {
            for symbol in &production.symbols {
                match symbol {
                    Symbol::Variable(name) => {
                        self.variables.insert(name.clone());
                    }
                    Symbol::Terminal(token) => {
                        self.terminals.insert(token.clone());
                    }
                    Symbol::Epsilon => {}
                }
            }
            self.add_production(lhs, production);
        }
        Ok(())
    }

    /// Remove one production from a variable's list; true if it was present
    pub fn remove_production(&mut self, variable: &str, production: &Production) -> bool {
        if let Some(productions) = self.rules.get_mut(variable) {
            if let Some(index) = productions.iter().position(|p| p == production) {
                productions.remove(index);
                return true;
            }
        }
        false
    }

    /// Replace a variable's whole production list, deduplicating the new
    /// entries
    pub fn replace_productions(&mut self, variable: &str, productions: Vec<Production>) {
        if let Some(existing) = self.rules.get_mut(variable) {
            existing.clear();
        }
        for production in productions {
            self.add_production(variable, production);
        }
    }

    /// Replace the production at a given slot in place. When an identical
    /// production already occupies another slot, the slot is deleted
    /// instead, keeping the list duplicate-free; returns false in that
    /// case.
    pub fn replace_production_at(
        &mut self,
        variable: &str,
        index: usize,
        production: Production,
    ) -> bool {
        let productions = self
            .rules
            .get_mut(variable)
            .expect("replace_production_at on variable without rules");
        if let Some(existing) = productions.iter().position(|p| p == &production) {
            if existing != index {
                productions.remove(index);
                return false;
            }
        }
        productions[index] = production;
        true
    }

    /// The production list of a variable (empty if it has no rules)
    pub fn productions(&self, variable: &str) -> &[Production] {
        self.rules.get(variable).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rule entries in insertion order
    pub fn rule_order(&self) -> &[String] {
        &self.rule_order
    }

    pub fn variables(&self) -> &HashSet<String> {
        &self.variables
    }

    pub fn terminals(&self) -> &HashSet<String> {
        &self.terminals
    }

    pub fn start_variable(&self) -> &str {
        &self.start_variable
    }

    /// Reassign the start variable, registering it as a variable
    pub fn set_start_variable(&mut self, name: &str) {
        self.variables.insert(name.to_string());
        self.start_variable = name.to_string();
    }

    /// Number of variables with at least one rule entry
    pub fn rule_count(&self) -> usize {
        self.rule_order.len()
    }

    /// Whether the given variable occurs anywhere on a right-hand side
    pub fn occurs_on_rhs(&self, name: &str) -> bool {
        self.rule_order.iter().any(|variable| {
            self.productions(variable)
                .iter()
                .any(|production| production.contains_variable(name))
        })
    }
}

impl fmt::Display for Grammar {
    /// Renders one line per variable as `A → α|β`, start variable first
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |variable: &str| -> String {
            let alternatives: Vec<String> = self
                .productions(variable)
                .iter()
                .map(Production::to_string)
                .collect();
            format!("{} → {}", variable, alternatives.join("|"))
        };

        let mut lines = Vec::new();
        if self.rules.contains_key(&self.start_variable) {
            lines.push(render(&self.start_variable));
        }
        for variable in &self.rule_order {
            if *variable != self.start_variable {
                lines.push(render(variable));
            }
        }
        write!(f, "{}", lines.join("\n"))
    }
}

/// Builder for constructing grammars from string-form rules
pub struct GrammarBuilder {
    start_variable: String,
    rules: Vec<(String, Vec<String>)>,
}

impl GrammarBuilder {
    pub fn new(start_variable: &str) -> Self {
        GrammarBuilder {
            start_variable: start_variable.to_string(),
            rules: Vec::new(),
        }
    }

    /// Queue a rule; each alternative is a whitespace-separated symbol
    /// string such as `"a S b"` or `"ε"`
    pub fn rule(mut self, lhs: &str, alternatives: &[&str]) -> Self {
        self.rules.push((
            lhs.to_string(),
            alternatives.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Build the grammar, surfacing the first rule error encountered
    pub fn build(self) -> Result<Grammar> {
        let mut grammar = Grammar::new(&self.start_variable);
        for (lhs, alternatives) in self.rules {
            let mut productions = Vec::new();
            for alternative in &alternatives {
                productions.push(Production::parse(alternative)?);
            }
            grammar.add_rule(&lhs, productions)?;
        }
        if grammar.productions(&self.start_variable).is_empty() {
            return Err(GrammarError::UnknownStartVariable(self.start_variable));
        }
        Ok(grammar)
    }
}
