pub const RELAY_URL_ENV: &str = "PARLANCE_RELAY_URL";

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:3000";

pub const SESSION_PATH: &str = "/session";
