//! Terminal rendition of the chat loop.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::chat::ChatBot;
use crate::render::PAGE_TITLE;
use crate::transcript::Session;

/// Reads questions line by line until EOF or `exit`/`quit`.
///
/// Generator failures are printed and the loop continues with the session
/// unchanged.
pub async fn run<R: BufRead, W: Write + Send>(bot: &ChatBot, mut input: R, mut out: W) -> Result<Session> {
    let mut session = Session::new();
    writeln!(out, "{PAGE_TITLE}\n").context("Failed to write banner")?;

    loop {
        write!(out, "Ask a medical question: ")?;
        out.flush().ok();

        let mut line = String::new();
        let read = input.read_line(&mut line).context("Failed to read input")?;
        if read == 0 {
            break;
        }
        let question = line.trim_end_matches(['\r', '\n']);
        if question.trim().is_empty() {
            continue;
        }
        if matches!(question.trim(), "exit" | "quit") {
            break;
        }

        let mut progress_err: Option<std::io::Error> = None;
        let result = bot
            .submit_with_progress(&mut session, question, |stage| {
                if progress_err.is_none() {
                    progress_err = writeln!(out, "{}", stage.status()).err();
                }
            })
            .await;
        if let Some(err) = progress_err {
            return Err(err).context("Failed to write progress");
        }

        match result {
            Ok(reply) => writeln!(out, "\n{reply}")?,
            Err(err) => writeln!(out, "Error: {err}")?,
        }
    }

    Ok(session)
}
