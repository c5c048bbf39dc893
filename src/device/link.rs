use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    time::timeout,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::{device::LinkError, prelude::*};

/// Line-oriented connection to a board running a REPL.
///
/// Commands and replies are terminated by a carriage return. After the first
/// exchange the board prefixes its replies with a prompt, which is stripped.
pub struct Link<S = SerialStream> {
    name: String,
    stream: Option<BufReader<S>>,
    timeout: Duration,

    /// A reply may still be on its way after a timeout.
    is_stale: bool,
}

impl Link {
    /// Open the serial endpoint exclusively.
    #[instrument(skip_all, fields(path = path, baud_rate = baud_rate))]
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, LinkError> {
        let stream = tokio_serial::new(path, baud_rate)
            .timeout(timeout)
            .open_native_async()
            .map_err(|source| LinkError::Open { path: path.to_owned(), source })?;
        info!("opened");
        Ok(Self::new(path, stream, timeout))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Link<S> {
    const TERMINATOR: u8 = b'\r';
    const PROMPT: &str = ">>>";
    const PROBE: &str = "ping()";

    pub fn new(name: impl Into<String>, stream: S, timeout: Duration) -> Self {
        Self { name: name.into(), stream: Some(BufReader::new(stream)), timeout, is_stale: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send the command and wait for the reply line.
    ///
    /// Pending input is discarded before the command is written. After a timeout, the next
    /// call first waits for the line to stay quiet for the timeout, so that a late reply
    /// is never taken for the reply to the next command.
    #[instrument(skip_all, fields(link = %self.name, command = command))]
    pub async fn send(&mut self, command: &str) -> Result<String, LinkError> {
        let stream = self.stream.as_mut().ok_or(LinkError::Closed)?;
        let quiet_period = if self.is_stale { self.timeout } else { Duration::ZERO };
        Self::discard_pending(stream, quiet_period).await?;
        self.is_stale = false;

        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(Self::TERMINATOR);
        stream.get_mut().write_all(&line).await?;
        stream.get_mut().flush().await?;

        let mut buffer = Vec::new();
        let Ok(n_read) = timeout(self.timeout, stream.read_until(Self::TERMINATOR, &mut buffer)).await
        else {
            self.is_stale = true;
            return Err(LinkError::Timeout(self.timeout));
        };
        if n_read? == 0 {
            return Err(LinkError::Eof);
        }

        let reply = Self::strip_prompt(&String::from_utf8_lossy(&buffer)).to_owned();
        debug!(%reply, "received");
        Ok(reply)
    }

    /// Drop the buffered input and whatever arrives until the line stays quiet for the period.
    async fn discard_pending(
        stream: &mut BufReader<S>,
        quiet_period: Duration,
    ) -> Result<(), LinkError> {
        let mut discarded = Vec::new();
        loop {
            let n_buffered = stream.buffer().len();
            if n_buffered != 0 {
                discarded.extend_from_slice(stream.buffer());
                stream.consume(n_buffered);
            }
            match timeout(quiet_period, stream.fill_buf()).await {
                Err(_) => break,
                Ok(Ok([])) => return Err(LinkError::Eof),
                Ok(Ok(_)) => {}
                Ok(Err(error)) => return Err(error.into()),
            }
        }
        if !discarded.is_empty() {
            warn!(discarded = %String::from_utf8_lossy(&discarded).trim(), "discarded stale input");
        }
        Ok(())
    }

    /// Send the liveness probe and check that the board has answered.
    #[instrument(skip_all, fields(link = %self.name))]
    pub async fn verify(&mut self) -> bool {
        match self.send(Self::PROBE).await {
            Ok(reply) if !reply.is_empty() => {
                info!(%reply, "verified");
                true
            }
            Ok(_) => {
                error!("empty reply to the probe");
                false
            }
            Err(error) => {
                error!(%error, "verification failed");
                false
            }
        }
    }

    /// Release the endpoint. Closing a closed link does nothing.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            info!(link = %self.name, "closed");
        }
    }

    fn strip_prompt(line: &str) -> &str {
        let line = line.trim();
        line.strip_prefix(Self::PROMPT).map_or(line, str::trim_start)
    }
}
