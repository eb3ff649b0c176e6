use log::{info, warn};
use std::io::{self, BufRead, Write};

use crate::BoxFuture;

/// native stand-ins for host dialogs, used when no host is attached
pub trait FallbackDialogs: Send + Sync {
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()>;

    fn confirm<'a>(&'a self, message: &'a str) -> BoxFuture<'a, bool>;

    fn open_link(&self, target: &str);
}

/// terminal prompts on stderr/stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDialogs;

impl ConsoleDialogs {
    fn read_answer(message: String) -> io::Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{} [y/N] ", message)?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

impl FallbackDialogs for ConsoleDialogs {
    fn alert<'a>(&'a self, message: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            eprintln!("{}", message);
        })
    }

    fn confirm<'a>(&'a self, message: &'a str) -> BoxFuture<'a, bool> {
        let message = message.to_string();
        Box::pin(async move {
            // stdin is blocking, keep it off the runtime threads
            match tokio::task::spawn_blocking(move || Self::read_answer(message)).await {
                Ok(Ok(answer)) => answer,
                Ok(Err(e)) => {
                    warn!("Confirm prompt failed, treating as declined: {}", e);
                    false
                }
                Err(e) => {
                    warn!("Confirm prompt task failed, treating as declined: {}", e);
                    false
                }
            }
        })
    }

    fn open_link(&self, target: &str) {
        info!("No host attached, open this link manually: {}", target);
    }
}
