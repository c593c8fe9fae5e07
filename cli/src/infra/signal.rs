//! `Signaller` backed by `kill(2)` through `nix`.

use std::io;

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::application::ports::Signaller;

pub struct NixSignaller;

impl Signaller for NixSignaller {
    fn quit(&self, pid: u32) -> io::Result<()> {
        // 0 and negative values address process groups.
        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}")))?;
        match kill(Pid::from_raw(raw), Signal::SIGQUIT) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(io::Error::new(io::ErrorKind::NotFound, format!("no process {pid}"))),
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}
