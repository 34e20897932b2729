//! Bringing up the link to the actuation service.

use crate::config::Config;
use crate::error::{MotionError, Result};
use crate::registry::Registry;
use crate::sport::{SimSport, SportApi};
use regex::Regex;
use std::sync::OnceLock;

static IFACE_RE: OnceLock<Regex> = OnceLock::new();

/// Linux interface names: at most 15 bytes, no whitespace, no `/`.
pub fn validate_interface(iface: &str) -> Result<()> {
    let re = IFACE_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._:@-]{0,14}$").unwrap());
    if re.is_match(iface) {
        Ok(())
    } else {
        Err(MotionError::transport(
            iface,
            "not a valid network interface name",
        ))
    }
}

/// Initialize the channel on `iface` and return a ready sport client.
///
/// The bundled client is the simulator; status overrides come from
/// `config.sim.fail`. Unknown names there are skipped (`Config::validate`
/// already reports them).
pub fn connect(iface: &str, config: &Config) -> Result<SimSport> {
    validate_interface(iface)?;

    let registry = Registry::standard();
    let mut sport = SimSport::new();
    for (name, code) in &config.sim.fail {
        if let Some(action) = registry.find(name) {
            sport.set_failure(action.primitive, *code);
        }
    }

    sport.set_timeout(config.timeout());
    sport.init();
    tracing::info!(iface, timeout_secs = config.timeout().as_secs_f64(), "sport client ready");
    Ok(sport)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sport::{Motion, Primitive, Status};
    use std::time::Duration;

    #[test]
    fn accepts_common_interface_names() {
        for iface in ["eth0", "enp3s0", "wlan0", "eth0.100", "veth-a1b2"] {
            assert!(validate_interface(iface).is_ok(), "{iface}");
        }
    }

    #[test]
    fn rejects_bad_interface_names() {
        for iface in ["", "eth 0", "../eth0", "averyveryverylongname0"] {
            let err = validate_interface(iface).unwrap_err();
            assert!(err.is_transport(), "{iface}");
        }
    }

    #[test]
    fn connect_applies_config() {
        let mut config = Config::default();
        config.timeout_secs = 2.5;
        config.sim.fail.insert("sit".into(), 3104);
        config.sim.fail.insert("nonsense".into(), 1);

        let mut sport = connect("eth0", &config).unwrap();
        assert!(sport.is_initialized());
        assert_eq!(sport.timeout(), Duration::from_millis(2500));
        assert_eq!(sport.execute(Motion::Basic(Primitive::Sit)), Status(3104));
    }

    #[test]
    fn connect_fails_on_bad_interface() {
        assert!(connect("no such iface", &Config::default())
            .unwrap_err()
            .is_transport());
    }
}
