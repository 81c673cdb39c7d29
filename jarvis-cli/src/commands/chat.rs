//! Interactive chat loop.

use anyhow::Result;
use jarvis_assistant::Assistant;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, error};

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    NewChat,
    History,
    Exit,
    Unknown(&'a str),
    Question(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "/new" | "/reset" => Input::NewChat,
        "/history" => Input::History,
        "/exit" | "/quit" => Input::Exit,
        cmd if cmd.starts_with('/') => Input::Unknown(cmd),
        question => Input::Question(question),
    }
}

/// Run the chat loop until `/exit`, Ctrl-D or Ctrl-C.
pub async fn run(assistant: &Assistant) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let name = &assistant.config().assistant_name;
    println!(
        "{name} is ready. Ask about {}. Commands: /new, /history, /exit",
        assistant.config().subject
    );

    loop {
        let line = match editor.readline("You > ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Exit => break,
            Input::NewChat => {
                assistant.reset().await;
                println!("Started a new chat.");
            }
            Input::History => {
                let history = assistant.history().await;
                if history.is_empty() {
                    println!("(no messages yet)");
                }
                for turn in history {
                    println!("[{}] You > {}", turn.timestamp.format("%H:%M:%S"), turn.question);
                    println!("[{}] {name} > {}", turn.timestamp.format("%H:%M:%S"), turn.answer);
                }
            }
            Input::Unknown(cmd) => {
                println!("Unknown command {cmd}. Try /new, /history or /exit.")
            }
            Input::Question(question) => {
                if let Err(e) = editor.add_history_entry(question) {
                    debug!(error = %e, "failed to record line history");
                }
                match assistant.ask(question).await {
                    Ok(answer) => println!("{name} > {}\n", answer.text),
                    Err(e) => {
                        error!(error = %e, "ask failed");
                        println!("{name} > Sorry, something went wrong: {e}\n");
                    }
                }
            }
        }
    }
    Ok(())
}
