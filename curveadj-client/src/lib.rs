mod connection;

pub use curveadj_schema as schema;

use anyhow::Context;
use connection::{DaemonConnection, StreamConnection};
use nix::unistd::getuid;
use schema::{
    ActiveState, ApplyResponse, ConfigurationFields, DaemonInfo, Pong, Request, Response,
};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tokio::{net::ToSocketAddrs, sync::Mutex};
use tracing::trace;

pub struct DaemonClient {
    stream: Mutex<Box<dyn DaemonConnection>>,
}

impl DaemonClient {
    pub async fn connect() -> anyhow::Result<Self> {
        let path =
            get_socket_path().context("Could not connect to daemon: socket file not found")?;
        let stream = StreamConnection::connect_unix(&path).await?;
        Ok(Self::from_connection(stream))
    }

    pub async fn connect_tcp(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        let stream = StreamConnection::connect_tcp(addr).await?;
        Ok(Self::from_connection(stream))
    }

    fn from_connection(connection: Box<dyn DaemonConnection>) -> Self {
        Self {
            stream: Mutex::new(connection),
        }
    }

    async fn make_request<T: DeserializeOwned>(&self, request: Request) -> anyhow::Result<T> {
        let mut stream = self.stream.lock().await;

        let request_payload = serde_json::to_string(&request)?;
        trace!("sending request {request_payload}");
        let response_payload = stream.request(&request_payload).await?;
        parse_response(&response_payload)
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.make_request::<Pong>(Request::Ping).await.map(|_| ())
    }

    pub async fn daemon_info(&self) -> anyhow::Result<DaemonInfo> {
        self.make_request(Request::DaemonInfo).await
    }

    pub async fn active_state(&self) -> anyhow::Result<ActiveState> {
        self.make_request(Request::ActiveState).await
    }

    pub async fn set_configuration(
        &self,
        fields: ConfigurationFields,
    ) -> anyhow::Result<ApplyResponse> {
        self.make_request(Request::SetConfiguration(fields)).await
    }

    pub async fn apply_full_configuration(
        &self,
        fields: ConfigurationFields,
    ) -> anyhow::Result<ApplyResponse> {
        self.make_request(Request::ApplyFullConfiguration(fields))
            .await
    }

    pub async fn reapply(&self) -> anyhow::Result<ApplyResponse> {
        self.make_request(Request::Reapply).await
    }

    pub async fn resume_from_suspend(&self) -> anyhow::Result<ApplyResponse> {
        self.make_request(Request::ResumeFromSuspend).await
    }
}

fn parse_response<T: DeserializeOwned>(payload: &str) -> anyhow::Result<T> {
    let response: Response<T> =
        serde_json::from_str(payload).context("Could not deserialize response from daemon")?;
    match response {
        Response::Ok(data) => Ok(data),
        Response::Error(err) => {
            Err(anyhow::Error::new(err).context("Got error from daemon, end of client boundary"))
        }
    }
}

fn get_socket_path() -> Option<PathBuf> {
    let root_path = PathBuf::from("/run/curveadjd.sock");

    if root_path.exists() {
        return Some(root_path);
    }

    let uid = getuid();
    let user_path = PathBuf::from(format!("/run/user/{uid}/curveadjd.sock"));

    if user_path.exists() {
        Some(user_path)
    } else {
        None
    }
}
