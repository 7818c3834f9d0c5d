use std::net::SocketAddr;

use k8s_nodegc_collector::ConfigError;
use k8s_nodegc_collector::GcConfig;

const NODEGC_LISTEN_ADDR: &str = "NODEGC_LISTEN_ADDR";
const DEFAULT_LISTEN_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
    8080,
);

#[derive(Debug)]
pub(crate) struct Config {
    pub(crate) gc: GcConfig,
    pub(crate) listen_addr: SocketAddr,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let gc = GcConfig::from_lookup(&lookup)?;
        let listen_addr = match lookup(NODEGC_LISTEN_ADDR) {
            Some(text) => text
                .trim()
                .parse()
                .map_err(|err| ConfigError::invalid(NODEGC_LISTEN_ADDR, &text, err))?,
            None => DEFAULT_LISTEN_ADDR,
        };
        Ok(Self { gc, listen_addr })
    }
}
