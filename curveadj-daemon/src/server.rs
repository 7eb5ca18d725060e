pub mod handler;

use self::handler::Handler;
use crate::{config::Config, socket};
use anyhow::Context;
use curveadj_schema::{Pong, Request, Response};
use futures::future::join_all;
use serde::Serialize;
use std::{fmt::Debug, future::Future, path::Path};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpListener, UnixListener},
};
use tracing::{error, info, instrument, trace};

pub struct Server {
    pub handler: Handler,
    unix_listener: UnixListener,
    tcp_listener: Option<TcpListener>,
}

impl Server {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        Self::start(config, &socket::get_socket_path(), Handler::new(config)).await
    }

    /// Binds the listeners before `init` runs, so a second instance fails without touching
    /// the hardware. Connections are only accepted once [`Server::run`] is called.
    pub(crate) async fn start(
        config: &Config,
        socket_path: &Path,
        init: impl Future<Output = anyhow::Result<Handler>>,
    ) -> anyhow::Result<Self> {
        let unix_listener = socket::listen(socket_path, &config.daemon.admin_groups)?;

        let listeners = async {
            let tcp_listener = bind_tcp(config).await?;
            let handler = init.await?;
            anyhow::Ok((tcp_listener, handler))
        };

        match listeners.await {
            Ok((tcp_listener, handler)) => Ok(Self {
                handler,
                unix_listener,
                tcp_listener,
            }),
            Err(err) => {
                socket::remove(socket_path);
                Err(err)
            }
        }
    }

    pub async fn run(self) {
        let mut tasks = vec![];

        let unix_handler = self.handler.clone();
        let unix_listener = self.unix_listener;
        tasks.push(tokio::spawn(async move {
            loop {
                match unix_listener.accept().await {
                    Ok((stream, _)) => spawn_stream(stream, unix_handler.clone()),
                    Err(error) => error!("failed to handle connection: {error}"),
                }
            }
        }));

        if let Some(tcp_listener) = self.tcp_listener {
            let tcp_handler = self.handler.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    match tcp_listener.accept().await {
                        Ok((stream, _)) => spawn_stream(stream, tcp_handler.clone()),
                        Err(error) => error!("failed to handle connection: {error}"),
                    }
                }
            }));
        }

        join_all(tasks).await;
    }
}

async fn bind_tcp(config: &Config) -> anyhow::Result<Option<TcpListener>> {
    if let Some(address) = &config.daemon.tcp_listen_address {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Could not bind to TCP address {address}"))?;
        info!("TCP listening on {}", listener.local_addr()?);
        Ok(Some(listener))
    } else {
        info!("TCP listener disabled");
        Ok(None)
    }
}

fn spawn_stream<T>(stream: T, handler: Handler)
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(error) = handle_stream(stream, handler).await {
            error!("{error}");
        }
    });
}

#[instrument(level = "debug", skip(stream, handler))]
pub async fn handle_stream<T: AsyncRead + AsyncWrite + Unpin>(
    stream: T,
    handler: Handler,
) -> anyhow::Result<()> {
    let mut stream = BufReader::new(stream);

    let mut buf = String::new();
    while stream.read_line(&mut buf).await? != 0 {
        trace!("handling request: {}", buf.trim_end());

        let maybe_request = serde_json::from_str(&buf);
        let response = match maybe_request {
            Ok(request) => match handle_request(request, &handler).await {
                Ok(response) => response,
                Err(error) => serde_json::to_vec(&Response::<()>::from(error))?,
            },
            Err(error) => serde_json::to_vec(&Response::<()>::from(
                anyhow::Error::new(error).context("Failed to deserialize"),
            ))?,
        };

        stream.write_all(&response).await?;
        stream.write_all(b"\n").await?;

        buf.clear();
    }

    Ok(())
}

#[instrument(level = "debug", skip(handler))]
async fn handle_request(request: Request, handler: &Handler) -> anyhow::Result<Vec<u8>> {
    match request {
        Request::Ping => ok_response(Pong),
        Request::DaemonInfo => ok_response(handler.daemon_info()),
        Request::ActiveState => ok_response(handler.active_state().await),
        Request::SetConfiguration(fields) => {
            ok_response(handler.set_configuration(&fields).await)
        }
        Request::ApplyFullConfiguration(fields) => {
            ok_response(handler.apply_full_configuration(&fields).await)
        }
        Request::Reapply => ok_response(handler.reapply().await),
        Request::ResumeFromSuspend => ok_response(handler.resume_from_suspend().await),
    }
}

fn ok_response<T: Serialize + Debug>(data: T) -> anyhow::Result<Vec<u8>> {
    trace!("responding with {data:?}");
    Ok(serde_json::to_vec(&Response::Ok(data))?)
}
