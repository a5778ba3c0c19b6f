//! Greeting smoke test.

use crate::cli::Output;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Greeting for a name, if one was given.
fn greeting(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(format!("Nice to meet you, {}!", name))
    }
}

/// Run the hello command. Asks for a name when none is given.
pub fn run_hello(name: Option<String>) -> Result<()> {
    println!("\n{}", style("👋 Hello from Itinera!").bold());
    println!("If you can see this, the CLI is running correctly.\n");

    let name = match name {
        Some(name) => name,
        None => {
            print!("What is your name? ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        }
    };

    if let Some(message) = greeting(&name) {
        Output::success(&message);
    }
    Ok(())
}
