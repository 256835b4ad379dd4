use mlua::{Function, Value};
use rustyline::{DefaultEditor, error::ReadlineError};

use rk_core::{BindError, Host};

const CHUNK: &str = "stdin";

fn print_repl_help() {
    eprintln!("Commands: :quit | :exit | :q, :help");
}

/// The interpreter stopped at end of input, so more lines may complete the chunk.
fn is_incomplete(err: &BindError) -> bool {
    matches!(
        err,
        BindError::Script(mlua::Error::SyntaxError {
            incomplete_input: true,
            ..
        })
    )
}

/// Render a result the way `tostring` would, so instances show their class name.
fn echo(host: &Host, value: Value) -> anyhow::Result<String> {
    let tostring: Function = host.lua()?.globals().get("tostring")?;
    Ok(tostring.call::<String>(value)?)
}

pub fn run(host: &Host) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;

    print_repl_help();

    loop {
        let mut acc = String::new();
        // Read lines until the chunk parses or fails for a reason other than missing input.
        let result = loop {
            let prompt = if acc.is_empty() { "> " } else { "... " };
            match rl.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim_end();

                    if acc.is_empty() && trimmed.starts_with(':') {
                        match trimmed {
                            ":quit" | ":exit" | ":q" => return Ok(()),
                            ":help" => print_repl_help(),
                            _ => eprintln!("Unknown command. Type :help for help."),
                        }
                        break None;
                    }
                    if acc.is_empty() && trimmed.is_empty() {
                        continue;
                    }

                    acc.push_str(trimmed);
                    acc.push('\n');
                    match host.run_named(&acc, CHUNK) {
                        Err(err) if is_incomplete(&err) => continue,
                        other => break Some(other),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    eprintln!("^C");
                    break None;
                }
                Err(ReadlineError::Eof) => {
                    if acc.trim().is_empty() {
                        println!();
                        return Ok(());
                    }
                    break Some(host.run_named(&acc, CHUNK));
                }
                Err(e) => {
                    eprintln!("Readline error: {}", e);
                    continue;
                }
            }
        };

        if !acc.trim().is_empty() {
            let _ = rl.add_history_entry(acc.trim_end());
        }

        match result {
            Some(Ok(Value::Nil)) | None => {}
            Some(Ok(value)) => match echo(host, value) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: {}", e),
            },
            Some(Err(e)) => eprintln!("Error: {}", e),
        }
    }
}
