use serde::{Serialize, Deserialize};

/// Who is on the other end of a request, as far as rate limiting can tell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub fingerprint: String,
    pub ip: String,
}

/// Stable digest of the client address. Request headers a client controls,
/// such as `User-Agent`, are left out so rotating them yields the same key.
pub fn generate_server_fingerprint(ip: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;
    use sha2::{Sha256, Digest};

    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    URL_SAFE.encode(hasher.finalize())
}

#[cfg(feature = "backend")]
mod backend_impl {
    use super::*;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for ClientInfo {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            // `client_ip` only honours the proxy header the server was
            // configured to trust and otherwise reports the socket peer.
            let ip = req.client_ip()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            let fingerprint = super::generate_server_fingerprint(&ip);

            Outcome::Success(ClientInfo { fingerprint, ip })
        }
    }
}
