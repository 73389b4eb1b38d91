use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use crate::app::*;

/// An analysis assistant run as an external program.
///
/// The request is written as JSON on the standard input of the program, and the
/// answer is whatever the program writes on its standard output.
pub struct CommandAssistant {
    command_line: String,
}

impl CommandAssistant {
    pub fn new(command_line: &str) -> CommandAssistant {
        CommandAssistant {
            command_line: command_line.to_string(),
        }
    }

    fn failure(&self, message: impl Into<String>) -> CollaboratorFailure {
        CollaboratorFailure::new("assistant", message)
    }
}

impl AnalysisAssistant for CommandAssistant {
    fn analyze(
        &self,
        context: &AssistantContext,
        history: &[ConversationTurn],
    ) -> Result<String, CollaboratorFailure> {
        let mut parts = self.command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| self.failure("empty assistant command"))?;
        let request = assistant_request_to_json(context, history).to_string();
        debug!("CommandAssistant: running {:?} with {:?}", program, request);

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(format!("cannot start {}: {}", program, e)))?;
        // Fed from its own thread: the program may write before it is done reading.
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || stdin.write_all(request.as_bytes()))
        });
        let output = child
            .wait_with_output()
            .map_err(|e| self.failure(format!("no answer: {}", e)))?;
        let written = match writer.map(|h| h.join()) {
            None | Some(Ok(Ok(()))) => Ok(()),
            Some(Ok(Err(e))) => Err(format!("cannot write the request: {}", e)),
            Some(Err(_)) => Err("the request writer panicked".to_string()),
        };
        if !output.status.success() {
            return Err(self.failure(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if let Err(msg) = written {
            // A program may answer without reading the whole request.
            warn!("CommandAssistant: {}", msg);
        }
        let answer = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!("CommandAssistant: {:?} bytes of answer", answer.len());
        Ok(answer)
    }
}
