use cnf_norm::{GrammarBuilder, cnf_violations, language, to_cnf};
use std::error::Error;

/// Example of converting a small grammar programmatically
fn main() -> Result<(), Box<dyn Error>> {
    let mut grammar = GrammarBuilder::new("S")
        .rule("S", &["a S b", "ε"])
        .build()?;

    println!("Input grammar:\n{}\n", grammar);

    to_cnf(&mut grammar);
    assert!(cnf_violations(&grammar).is_empty());
    println!("Chomsky Normal Form:\n{}\n", grammar);

    println!("Strings with at most six terminals:");
    for text in language::enumerate(&grammar, 6, 24) {
        if text.is_empty() {
            println!("  ε");
        } else {
            println!("  {}", text);
        }
    }

    println!("\nRandom samples:");
    let mut rng = rand::thread_rng();
    for i in 1..=5 {
        match language::sample(&grammar, &mut rng, 16) {
            Some(text) if text.is_empty() => println!("{}. ε", i),
            Some(text) => println!("{}. {}", i, text),
            None => println!("{}. (depth limit reached)", i),
        }
    }

    Ok(())
}
