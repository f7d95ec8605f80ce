//! Process helpers: the address advertised to ONVIF clients and the PID file.

use std::fs;
use std::io::{self, Write};
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::path::Path;

use log::{info, warn};

// ── Advertised address ────────────────────────────────────────────────────────

/// Address of the interface that routes outward, as seen by a connected UDP
/// socket (nothing is sent).  Unspecified when the host has no route.
pub fn get_own_ip() -> IpAddr {
    (|| -> io::Result<IpAddr> {
        let sock = UdpSocket::bind("0.0.0.0:0")?;
        sock.connect("8.8.8.8:80")?;
        Ok(sock.local_addr()?.ip())
    })()
    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Host written into every XAddr and stream URI when `advertise_host` is not
/// configured.  An unspecified address is still used, but clients cannot
/// reach it, so the operator is warned.
pub fn advertised_host(detected: IpAddr) -> String {
    if detected.is_unspecified() {
        warn!("no outbound route, advertising {detected}; set advertise_host so clients can reach the services");
    } else {
        info!("detected host address: {detected}");
    }
    detected.to_string()
}

// ── PID file ──────────────────────────────────────────────────────────────────

/// Record this responder's PID at `path`, creating parent directories.
pub fn write_pid_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    writeln!(f, "{}", std::process::id())?;
    Ok(())
}

/// Remove the PID file on shutdown; a failure is only logged.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("failed to remove PID file {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv6Addr;

    use super::*;

    #[test]
    fn unroutable_host_is_still_advertised() {
        assert_eq!(advertised_host(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), "0.0.0.0");
        assert_eq!(advertised_host(IpAddr::V6(Ipv6Addr::UNSPECIFIED)), "::");
    }

    #[test]
    fn detected_host_is_advertised_verbatim() {
        assert_eq!(advertised_host(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))), "10.0.0.5");
    }

    #[test]
    fn pid_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("onvif-responder-{}", std::process::id()))
            .join("responder.pid");
        write_pid_file(&path).unwrap();
        let pid = fs::read_to_string(&path).unwrap();
        assert_eq!(pid.trim(), std::process::id().to_string());
        remove_pid_file(&path);
        assert!(!path.exists());
    }
}
