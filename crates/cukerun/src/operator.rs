//! Questions put to the person running the suite.

use crate::cancel::CancellationToken;
use crate::error::AskError;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Longest single wait between cancellation checks.
const POLL_SLICE: Duration = Duration::from_millis(25);

/// Prompt channel to a human operator.
///
/// Answers are read line by line on a background thread, so
/// [`ask`](Self::ask) can give up after a timeout without blocking the
/// runner on input that never comes. A cancelled run interrupts a pending
/// question.
#[derive(Clone)]
pub struct Operator {
    answers: Arc<Mutex<Receiver<String>>>,
    prompt: Arc<Mutex<Box<dyn Write + Send>>>,
    cancellation: Option<CancellationToken>,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator").finish_non_exhaustive()
    }
}

impl Operator {
    /// Read answers from `input` and write questions to `prompt`.
    pub fn new(input: impl BufRead + Send + 'static, prompt: impl Write + Send + 'static) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            for line in input.lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            answers: Arc::new(Mutex::new(receiver)),
            prompt: Arc::new(Mutex::new(Box::new(prompt))),
            cancellation: None,
        }
    }

    /// Stop waiting for answers once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Prompt on standard output and read answers from standard input.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }

    /// Ask `question` and wait up to `timeout` for a one-line answer.
    ///
    /// # Errors
    /// [`AskError::Timeout`] when no answer arrives in time,
    /// [`AskError::Cancelled`] when the run is cancelled while waiting,
    /// [`AskError::Closed`] once the input has ended and [`AskError::Io`]
    /// when the question cannot be written.
    pub fn ask(&self, question: &str, timeout: Duration) -> Result<String, AskError> {
        {
            let mut prompt = self.prompt.lock().unwrap_or_else(PoisonError::into_inner);
            writeln!(prompt, "{question}")?;
            prompt.flush()?;
        }
        let answers = self.answers.lock().unwrap_or_else(PoisonError::into_inner);
        let deadline = Instant::now() + timeout;
        loop {
            if self.cancellation.as_ref().is_some_and(CancellationToken::is_cancelled) {
                log::debug!("question {question:?} abandoned: run cancelled");
                return Err(AskError::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!("no answer to {question:?} within {timeout:?}");
                return Err(AskError::Timeout {
                    question: question.to_owned(),
                    timeout_ms: timeout.as_millis(),
                });
            }
            match answers.recv_timeout(remaining.min(POLL_SLICE)) {
                Ok(answer) => return Ok(answer),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(AskError::Closed),
            }
        }
    }
}
