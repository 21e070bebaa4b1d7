pub mod api {
    pub const DEFAULT_BASE_URL: &str = "https://api.modusign.co.kr";
    pub const FILES_PATH: &str = "/files";
    pub const USER_AGENT: &str = "modusign-mcp/1.0";
}

pub mod retry {
    pub const MAX_RETRIES: u32 = 3;
    pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;
}

pub mod env {
    pub const EMAIL: &str = "MODUSIGN_EMAIL";
    pub const API_KEY: &str = "MODUSIGN_API_KEY";
    pub const BASE_URL: &str = "MODUSIGN_BASE_URL";
}
