use anyhow::{anyhow, Context};
use nix::{
    sys::stat::{umask, Mode},
    unistd::{chown, getuid, Gid, Group},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

pub fn get_socket_path() -> PathBuf {
    let uid = getuid();
    if uid.is_root() {
        PathBuf::from("/run/curveadjd.sock")
    } else {
        PathBuf::from(format!("/run/user/{uid}/curveadjd.sock"))
    }
}

pub fn cleanup() {
    remove(&get_socket_path());
}

pub fn remove(socket_path: &Path) {
    if socket_path.exists() {
        match fs::remove_file(socket_path) {
            Ok(()) => debug!("removed socket"),
            Err(err) => error!("failed to remove socket {socket_path:?}: {err}"),
        }
    }
}

pub fn listen(socket_path: &Path, admin_groups: &[String]) -> anyhow::Result<UnixListener> {
    if socket_path.exists() {
        return Err(anyhow!(
            "Socket {socket_path:?} already exists. \
            This probably means that another instance of curveadj-daemon is currently running. \
            If you are sure that this is not the case, please remove the file"
        ));
    }

    let socket_mask = Mode::S_IXUSR | Mode::S_IXGRP | Mode::S_IRWXO;
    let previous_mask = umask(socket_mask);
    let listener = UnixListener::bind(socket_path);
    umask(previous_mask);
    let listener =
        listener.with_context(|| format!("Could not bind to socket {socket_path:?}"))?;

    let group = socket_group(admin_groups);
    debug!("using gid {group} for socket");
    chown(socket_path, None, Some(group)).context("Could not set socket permissions")?;

    info!("listening on {socket_path:?}");
    Ok(listener)
}

/// First admin group that exists on the system, falling back to the current group
fn socket_group(admin_groups: &[String]) -> Gid {
    for name in admin_groups {
        match Group::from_name(name) {
            Ok(Some(group)) => return group.gid,
            Ok(None) => debug!("group {name} does not exist"),
            Err(err) => warn!("could not look up group {name}: {err}"),
        }
    }

    if !admin_groups.is_empty() {
        warn!("none of the admin groups {admin_groups:?} exist, socket will only be accessible by the current group");
    }
    Gid::current()
}
