use modusign_mcp::services::logger::Logger;
use modusign_mcp::services::modusign_client::ModusignClient;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const TEST_EMAIL: &str = "user@example.com";
pub const TEST_API_KEY: &str = "secret";
pub const TEST_AUTH_HEADER: &str = "Basic dXNlckBleGFtcGxlLmNvbTpzZWNyZXQ=";

pub fn test_client(base_url: &str) -> ModusignClient {
    ModusignClient::new(Logger::new("test"), TEST_EMAIL, TEST_API_KEY, Some(base_url))
        .expect("client must build")
}
