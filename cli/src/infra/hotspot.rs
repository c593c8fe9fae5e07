//! `AttachMechanism` speaking the HotSpot dynamic-attach protocol.
//!
//! The JVM listens on `<tmp>/.java_pid<pid>` once its attach listener is
//! running. A cold JVM starts the listener when it sees `.attach_pid<pid>`
//! in its working directory (or tmp) and receives `SIGQUIT`. All paths go
//! through `/proc/<pid>/root` so a JVM inside a container is reached through
//! its own filesystem view.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::application::ports::{AttachMechanism, Signaller};
use crate::domain::attach::{
    DEFAULT_ATTACH_TIMEOUT, LoadRejection, load_agent_request, namespace_pid, parse_load_reply,
    socket_name, trigger_name,
};
use crate::domain::error::AttachError;
use crate::domain::process::HostProcessDescriptor;

const FIRST_POLL: Duration = Duration::from_millis(20);
const MAX_POLL: Duration = Duration::from_millis(500);

/// An attach listener socket known to exist.
#[derive(Debug)]
pub struct HotSpotSession {
    pid: u32,
    socket: PathBuf,
}

impl HotSpotSession {
    #[must_use]
    pub fn socket(&self) -> &Path {
        &self.socket
    }
}

pub struct HotSpotAttach<S: Signaller> {
    signaller: S,
    proc_root: PathBuf,
    timeout: Duration,
}

impl<S: Signaller> HotSpotAttach<S> {
    #[must_use]
    pub fn new(signaller: S) -> Self {
        Self {
            signaller,
            proc_root: PathBuf::from("/proc"),
            timeout: DEFAULT_ATTACH_TIMEOUT,
        }
    }

    /// Resolve every path under `proc_root` instead of `/proc`.
    #[must_use]
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn proc_dir(&self, pid: u32) -> PathBuf {
        self.proc_root.join(pid.to_string())
    }

    /// The pid the JVM knows itself by.
    fn ns_pid(&self, pid: u32) -> u32 {
        std::fs::read_to_string(self.proc_dir(pid).join("status"))
            .ok()
            .and_then(|status| namespace_pid(&status))
            .unwrap_or(pid)
    }

    fn tmp_dir(&self, pid: u32) -> PathBuf {
        self.proc_dir(pid).join("root").join("tmp")
    }

    /// Drop the trigger file where the attach listener looks for it.
    fn create_trigger(&self, pid: u32, ns_pid: u32) -> Result<PathBuf, AttachError> {
        let name = trigger_name(ns_pid);
        let cwd_trigger = self.proc_dir(pid).join("cwd").join(&name);
        if std::fs::write(&cwd_trigger, b"").is_ok() {
            return Ok(cwd_trigger);
        }
        let tmp_trigger = self.tmp_dir(pid).join(&name);
        std::fs::write(&tmp_trigger, b"")
            .map(|()| tmp_trigger)
            .map_err(|source| AttachError::Io { pid, source })
    }

    async fn start_listener(&self, pid: u32, socket: &Path, ns_pid: u32) -> Result<(), AttachError> {
        let trigger = self.create_trigger(pid, ns_pid)?;
        tracing::debug!(pid, trigger = %trigger.display(), "attach listener not running; sending SIGQUIT");

        let signalled = self.signal_quit(pid);
        let outcome = match signalled {
            Ok(()) => self.await_socket(pid, socket).await,
            Err(e) => Err(e),
        };
        if let Err(e) = std::fs::remove_file(&trigger) {
            tracing::debug!(error = %e, "trigger file already gone");
        }
        outcome
    }

    fn signal_quit(&self, pid: u32) -> Result<(), AttachError> {
        match self.signaller.quit(pid) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound || !self.proc_dir(pid).exists() => {
                tracing::debug!(pid, error = %e, "SIGQUIT found no process");
                Err(AttachError::ProcessGone { pid })
            }
            Err(source) => Err(AttachError::Io { pid, source }),
        }
    }

    async fn await_socket(&self, pid: u32, socket: &Path) -> Result<(), AttachError> {
        let started = tokio::time::Instant::now();
        let mut delay = FIRST_POLL;
        loop {
            if socket.exists() {
                return Ok(());
            }
            if !self.proc_dir(pid).exists() {
                return Err(AttachError::ProcessGone { pid });
            }
            if started.elapsed() >= self.timeout {
                return Err(AttachError::Timeout {
                    pid,
                    secs: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_POLL);
        }
    }
}

impl<S: Signaller> AttachMechanism for HotSpotAttach<S> {
    type Session = HotSpotSession;

    async fn attach(&self, target: &HostProcessDescriptor) -> Result<HotSpotSession, AttachError> {
        let pid = target.pid;
        if !self.proc_dir(pid).exists() {
            return Err(AttachError::ProcessGone { pid });
        }
        let ns_pid = self.ns_pid(pid);
        let socket = self.tmp_dir(pid).join(socket_name(ns_pid));
        if !socket.exists() {
            self.start_listener(pid, &socket, ns_pid).await?;
        }
        tracing::debug!(pid, socket = %socket.display(), "attach socket ready");
        Ok(HotSpotSession { pid, socket })
    }

    async fn deliver(
        &self,
        session: HotSpotSession,
        bundle: &Path,
        payload: &str,
    ) -> Result<(), AttachError> {
        let pid = session.pid;
        let io = |source| AttachError::Io { pid, source };

        let request = load_agent_request(&bundle.display().to_string(), payload);
        let exchange = async {
            let mut stream = UnixStream::connect(&session.socket).await?;
            stream.write_all(&request).await?;
            let mut reply = String::new();
            stream.read_to_string(&mut reply).await?;
            Ok::<_, std::io::Error>(reply)
        };
        let reply = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| AttachError::Timeout {
                pid,
                secs: self.timeout.as_secs(),
            })?
            .map_err(io)?;
        tracing::debug!(pid, %reply, "attach reply");

        parse_load_reply(&reply).map_err(|rejection| match rejection {
            LoadRejection::Refused { code, detail } => AttachError::Refused { pid, code, detail },
            LoadRejection::Malformed => AttachError::Protocol { pid, reply },
        })
    }
}
