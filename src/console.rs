//! Line-oriented console chat.
//!
//! A thin adapter over [`Assistant`] with no logic of its own: prompt for
//! a path, analyze, then loop over questions.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::assistant::Assistant;

pub async fn run_console(mut assistant: Assistant) -> Result<()> {
    let stdin = io::stdin();

    println!("repo-chat console. Commands: :path <dir> to switch repository, :quit to exit.");

    if assistant.session().repo_path().is_none() {
        print!("repository path> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let path = line.trim();
        if path.is_empty() {
            println!("No repository path given.");
            return Ok(());
        }
        assistant.set_repo_path(PathBuf::from(path))?;
    }

    run_analysis(&mut assistant).await;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == ":quit" || input == ":q" {
            break;
        }
        if let Some(path) = input.strip_prefix(":path ") {
            match assistant.set_repo_path(PathBuf::from(path.trim())) {
                Ok(()) => run_analysis(&mut assistant).await,
                Err(e) => println!("Invalid path: {:#}", e),
            }
            continue;
        }

        let answer = assistant.ask(input).await;
        println!("{}", answer);
    }

    Ok(())
}

async fn run_analysis(assistant: &mut Assistant) {
    match assistant.analyze().await {
        Ok(message) => println!("{}", message),
        Err(e) => println!("Analysis failed: {:#}", e),
    }
}
