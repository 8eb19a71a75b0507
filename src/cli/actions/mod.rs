pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        token_secret: SecretString,
        csrf_key: SecretString,
        base_url: String,
        store_timeout_seconds: u64,
        enforce_csrf: bool,
    },
}
