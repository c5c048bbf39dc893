//! In-process stand-in for a board running the relay REPL firmware.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex},
    time::sleep,
};

#[derive(Clone, Copy, Default)]
pub struct Behaviour {
    /// Do not reply to the commands containing the pattern.
    silent_on: Option<&'static str>,

    /// Reply late to the commands containing the pattern.
    slow_on: Option<(&'static str, Duration)>,
}

impl Behaviour {
    pub const fn silent_on(pattern: &'static str) -> Self {
        Self { silent_on: Some(pattern), slow_on: None }
    }

    pub const fn slow_on(pattern: &'static str, delay: Duration) -> Self {
        Self { silent_on: None, slow_on: Some((pattern, delay)) }
    }
}

/// Commands received by the simulator, in order.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn commands(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, command: String) {
        self.0.lock().unwrap().push(command);
    }
}

pub struct Simulator {
    stream: BufReader<DuplexStream>,
    behaviour: Behaviour,
    journal: Journal,
}

impl Simulator {
    /// Spawn the simulator and return the host side of the connection.
    pub fn spawn(behaviour: Behaviour) -> (DuplexStream, Journal) {
        let (host, board) = duplex(1024);
        let journal = Journal::default();
        let simulator =
            Self { stream: BufReader::new(board), behaviour, journal: journal.clone() };
        tokio::spawn(simulator.run());
        (host, journal)
    }

    async fn run(mut self) {
        let mut prompt = "";
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match self.stream.read_until(b'\r', &mut buffer).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let command = String::from_utf8_lossy(&buffer).trim().to_owned();
            self.journal.push(command.clone());
            if self.behaviour.silent_on.is_some_and(|pattern| command.contains(pattern)) {
                continue;
            }
            if let Some((pattern, delay)) = self.behaviour.slow_on
                && command.contains(pattern)
            {
                sleep(delay).await;
            }
            let reply = format!("{prompt}{}\r", Self::reply_to(&command));
            if self.stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                break;
            }
            prompt = ">>> ";
        }
    }

    fn reply_to(command: &str) -> String {
        if command == "ping()" {
            "pong".to_owned()
        } else if let Some(pin) = Self::argument(command, "turn_on_pin(") {
            format!("turned ON pin {pin}")
        } else if let Some(pin) = Self::argument(command, "turn_off_pin(") {
            format!("turned OFF pin {pin}")
        } else {
            format!("received '{command}'")
        }
    }

    fn argument<'a>(command: &'a str, prefix: &str) -> Option<&'a str> {
        command.strip_prefix(prefix)?.strip_suffix(')')
    }
}
