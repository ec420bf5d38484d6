//! Interactive portal shell.
//!
//! Runs when `bizhire` starts without a subcommand. The prompt shows the
//! current location; every `open` goes through the role-gated router exactly
//! as the one-shot commands do, so redirects, the login return path, and the
//! forced logout on a rejected session all behave the same here.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::pages;
use crate::router::Guard;
use crate::Portal;

pub async fn run(portal: &Portal) -> Result<()> {
    println!("BizHire portal shell. Type 'help' for commands, 'quit' to leave.");
    let mut editor = DefaultEditor::new()?;

    pages::render_current(portal).await?;

    loop {
        let prompt = format!("bizhire {}> ", portal.nav.current());
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let argument = parts.next();

        match command {
            "quit" | "exit" => break,
            "help" => print_help(portal),
            "open" => match argument {
                Some(path) => pages::visit(portal, path).await?,
                None => println!("Usage: open <path>"),
            },
            // A bare path is shorthand for `open`.
            path if path.starts_with('/') => pages::visit(portal, path).await?,
            "back" => match portal.nav.back() {
                Some(_) => pages::render_current(portal).await?,
                None => println!("Nothing to go back to."),
            },
            "forward" => match portal.nav.forward() {
                Some(_) => pages::render_current(portal).await?,
                None => println!("Nothing to go forward to."),
            },
            "whoami" => match portal.auth.identity() {
                Some(identity) => println!(
                    "{} <{}> ({})",
                    identity.display_name(),
                    identity.email,
                    identity.role
                ),
                None => println!("Not signed in."),
            },
            "logout" => {
                portal.auth.logout();
                println!("Signed out.");
                pages::render_current(portal).await?;
            }
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }

    Ok(())
}

fn print_help(portal: &Portal) {
    println!("Commands:");
    println!("  open <path>   go to a page (a bare /path works too)");
    println!("  back          go back through history");
    println!("  forward       go forward through history");
    println!("  whoami        show the signed-in account");
    println!("  logout        sign out");
    println!("  quit          leave the shell");
    println!();
    println!("Pages:");
    for route in portal.routes.routes() {
        let access = match route.guard {
            Guard::Public => "public".to_string(),
            Guard::AnyRole => "any signed-in role".to_string(),
            Guard::Roles(roles) => roles
                .iter()
                .map(|role| role.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        };
        println!("  {:<34} {:<22} [{}]", route.pattern, route.title, access);
    }
}
