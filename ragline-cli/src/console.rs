use std::io::Write;

use anyhow::Result;
use ragline_agent::Conversation;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::error;

const PROMPT: &str = "You > ";

/// Whether `line` asks to leave the console.
pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Run the blocking `op` on `value` without holding up a runtime worker,
/// handing `value` back afterwards.
async fn off_runtime<V, T, F>(mut value: V, op: F) -> Result<(V, T)>
where
    V: Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut V) -> T + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || {
        let out = op(&mut value);
        (value, out)
    })
    .await?)
}

/// Read one line at a time and stream each reply to stdout.
///
/// Ends on `exit` in any letter case, on end of input, or on Ctrl-C. A failed
/// turn is reported and the loop continues.
pub async fn run_console(mut conversation: Conversation) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Type your prompt, or \"exit\" to quit.\n");

    loop {
        let (editor, read) = off_runtime(rl, |rl| rl.readline(PROMPT)).await?;
        rl = editor;
        let line = match read {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if is_exit(&line) {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        print!("\nAssistant > ");
        let mut stdout = std::io::stdout();
        let _ = stdout.flush();
        let sent = conversation
            .send(input, |fragment| {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            })
            .await;
        println!("\n");
        if let Err(e) = sent {
            error!(error = %e, "chat turn failed");
            eprintln!("Error: {e}\n");
        }
    }

    println!("Exiting...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn blocking_read_leaves_the_runtime_free() {
        let (tx, rx) = std::sync::mpsc::channel();
        tokio::spawn(async move { tx.send("typed").unwrap() });

        let wait = Duration::from_secs(5);
        let (_rx, line) = off_runtime(rx, move |rx| rx.recv_timeout(wait)).await.unwrap();

        assert_eq!(line, Ok("typed"));
    }

    #[test]
    fn exit_is_case_insensitive() {
        assert!(is_exit("exit"));
        assert!(is_exit("EXIT"));
        assert!(is_exit("  Exit \n"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit("quit"));
    }
}
