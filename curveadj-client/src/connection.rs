use anyhow::{anyhow, Context};
use futures::future::BoxFuture;
use std::path::Path;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpStream, ToSocketAddrs, UnixStream},
};
use tracing::info;

pub trait DaemonConnection: Send {
    fn request<'a>(&'a mut self, payload: &'a str) -> BoxFuture<'a, anyhow::Result<String>>;
}

/// Line-delimited JSON over any byte stream to the daemon.
pub struct StreamConnection<S> {
    inner: BufReader<S>,
}

impl StreamConnection<UnixStream> {
    pub async fn connect_unix(path: &Path) -> anyhow::Result<Box<Self>> {
        info!("connecting to service at {path:?}");
        let stream = UnixStream::connect(path)
            .await
            .context("Could not connect to daemon")?;
        Ok(Box::new(Self::new(stream)))
    }
}

impl StreamConnection<TcpStream> {
    pub async fn connect_tcp(addr: impl ToSocketAddrs) -> anyhow::Result<Box<Self>> {
        info!("connecting to remote TCP service");
        let stream = TcpStream::connect(addr)
            .await
            .context("Could not connect to remote daemon")?;
        Ok(Box::new(Self::new(stream)))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> StreamConnection<S> {
    fn new(stream: S) -> Self {
        Self {
            inner: BufReader::new(stream),
        }
    }

    async fn send_line(&mut self, payload: &str) -> anyhow::Result<String> {
        if !self.inner.buffer().is_empty() {
            return Err(anyhow!("Another request was not processed properly"));
        }

        self.inner.write_all(payload.as_bytes()).await?;
        self.inner.write_all(b"\n").await?;

        let mut response_payload = String::new();
        let read = self
            .inner
            .read_line(&mut response_payload)
            .await
            .context("Could not read response")?;
        if read == 0 {
            return Err(anyhow!("Daemon closed the connection"));
        }

        Ok(response_payload)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> DaemonConnection for StreamConnection<S> {
    fn request<'a>(&'a mut self, payload: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(self.send_line(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::{DaemonConnection, StreamConnection};
    use pretty_assertions::assert_eq;
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};

    #[tokio::test]
    async fn request_reads_one_line() {
        let (client, server) = duplex(1024);
        let mut connection = StreamConnection::new(client);

        let daemon = tokio::spawn(async move {
            let mut server = BufReader::new(server);
            let mut line = String::new();
            server.read_line(&mut line).await.unwrap();
            server
                .get_mut()
                .write_all(b"{\"status\":\"ok\",\"data\":null}\n")
                .await
                .unwrap();
            line
        });

        let response = DaemonConnection::request(&mut connection, r#"{"command":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response, "{\"status\":\"ok\",\"data\":null}\n");
        assert_eq!(daemon.await.unwrap(), "{\"command\":\"ping\"}\n");
    }

    #[tokio::test]
    async fn closed_connection_is_an_error() {
        let (client, server) = duplex(1024);
        drop(server);
        let mut connection = StreamConnection::new(client);

        assert!(DaemonConnection::request(&mut connection, "{}").await.is_err());
    }
}
