use std::{io, time::Duration};

use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    time::timeout,
};

/// TCP stream that connects only when asked and never retries on its own.
pub struct TcpLink {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpLink {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        connect_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        TcpLink {
            host: host.into(),
            port,
            stream: None,
            connect_timeout,
            write_timeout,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Single connection attempt bounded by the connect timeout.
    pub async fn connect(&mut self) -> io::Result<()> {
        if self.stream.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "Link is already connected",
            ));
        }

        let stream = timeout(
            self.connect_timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "Connect timed out"))??;

        stream.set_nodelay(true)?;
        self.stream = Some(stream);

        Ok(())
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "Link is not connected",
            ));
        };

        let result = match timeout(self.write_timeout, stream.write_all(buf)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "Write timed out")),
        };

        if let Err(e) = &result {
            if matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ) {
                // The peer is gone; a later write must not pretend otherwise.
                self.stream = None;
            }
        }

        result
    }

    /// Appends every byte that is already readable to `buf` without waiting.
    pub fn drain(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let Some(stream) = self.stream.as_ref() else {
            return Ok(0);
        };

        let mut chunk = [0u8; 512];
        let mut total = 0;

        loop {
            match stream.try_read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        Ok(total)
    }

    /// Releases the socket. Returns `false` if there was nothing to release.
    pub async fn shutdown(&mut self) -> io::Result<bool> {
        match self.stream.take() {
            Some(mut stream) => {
                stream.shutdown().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{io::AsyncReadExt, net::TcpListener};

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn write_before_connect_is_rejected() {
        let mut link = TcpLink::new("127.0.0.1", 1, TIMEOUT, TIMEOUT);
        let err = link.write_all(b"RE\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn connect_refused_is_reported_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut link = TcpLink::new("127.0.0.1", port, TIMEOUT, TIMEOUT);
        assert!(link.connect().await.is_err());
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn writes_reach_peer_and_drain_collects_replies() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let peer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 3];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(b"ok\n").await.unwrap();
            let mut rest = Vec::new();
            socket.read_to_end(&mut rest).await.unwrap();
            buf.to_vec()
        });

        let mut link = TcpLink::new("127.0.0.1", port, TIMEOUT, TIMEOUT);
        link.connect().await.unwrap();
        link.write_all(b"A\n\n").await.unwrap();

        let mut inbound = Vec::new();
        for _ in 0..50 {
            link.drain(&mut inbound).unwrap();
            if !inbound.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(inbound, b"ok\n");

        assert!(link.shutdown().await.unwrap());
        assert!(!link.shutdown().await.unwrap());
        assert_eq!(peer.await.unwrap(), b"A\n\n");
    }
}
