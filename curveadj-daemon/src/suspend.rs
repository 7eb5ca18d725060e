use crate::server::handler::Handler;
use futures::StreamExt;
use tracing::{debug, error, info};
use zbus::{Connection, Proxy};

pub async fn listen_events(handler: Handler) {
    match connect_proxy().await {
        // The signal fires both before suspending (`true`) and after resuming (`false`)
        Ok(proxy) => match proxy.receive_signal("PrepareForSleep").await {
            Ok(mut stream) => {
                while let Some(message) = stream.next().await {
                    let going_to_sleep = match message.body().deserialize::<bool>() {
                        Ok(value) => value,
                        Err(err) => {
                            error!("invalid PrepareForSleep signal, ignoring it: {err}");
                            continue;
                        }
                    };

                    if going_to_sleep {
                        debug!("system is going to sleep");
                        continue;
                    }

                    info!("resume event detected");
                    let response = handler.resume_from_suspend().await;
                    if let Some(details) = response.details {
                        debug!("reapplied with {}", details.command_line());
                    }
                }
            }
            Err(err) => error!("could not subscribe to suspend events: {err:#}"),
        },
        Err(err) => {
            error!("could not connect to dbus proxy: {err:#}");
        }
    }
    error!("suspend/resume events will not be handled.");
}

async fn connect_proxy() -> anyhow::Result<Proxy<'static>> {
    let conn = Box::pin(Connection::system()).await?;
    let proxy = Proxy::new_owned(
        conn,
        "org.freedesktop.login1",
        "/org/freedesktop/login1",
        "org.freedesktop.login1.Manager",
    )
    .await?;
    Ok(proxy)
}
