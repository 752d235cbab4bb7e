use std::net::{IpAddr, Ipv4Addr};

const EXPORTER_PORT: &str = "EERO_EXPORTER_PORT";

const DEFAULT_PORT: u16 = 9118;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

/// Port from `EERO_EXPORTER_PORT`, if set and valid
pub fn get_port() -> Option<u16> {
    std::env::var(EXPORTER_PORT).ok()?.trim().parse().ok()
}

const EXPORTER_HOST: &str = "EERO_EXPORTER_HOST";

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

pub fn get_default_host() -> IpAddr {
    DEFAULT_HOST
}

/// Listen address from `EERO_EXPORTER_HOST`, if set and valid
pub fn get_host() -> Option<IpAddr> {
    std::env::var(EXPORTER_HOST).ok()?.trim().parse().ok()
}

const SESSION_TOKEN: &str = "EERO_SESSION_TOKEN";

pub fn get_session_token() -> Option<String> {
    std::env::var(SESSION_TOKEN)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
