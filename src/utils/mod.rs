use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, header::CONTENT_TYPE};

/// Best-effort caller identity for rate limiting: first `x-forwarded-for`
/// entry, then `x-real-ip`, then the socket peer. Spoofable by design of the
/// headers; not a security boundary.
pub fn caller_identity<B>(req: &Request<B>) -> String {
    let headers = req.headers();
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()));
    let real_ip = header_str(headers, "x-real-ip")
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or(peer)
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

/// Lowercased media type without parameters, e.g. `multipart/form-data`.
pub fn media_type(headers: &HeaderMap) -> Option<String> {
    header_str(headers, CONTENT_TYPE.as_str())
        .and_then(|ct| ct.split(';').next())
        .map(|mt| mt.trim().to_ascii_lowercase())
        .filter(|mt| !mt.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let req = request(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.1"),
        ]);
        assert_eq!(caller_identity(&req), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_real_ip_then_peer_then_unknown() {
        assert_eq!(caller_identity(&request(&[("x-real-ip", "198.51.100.1")])), "198.51.100.1");

        let mut req = request(&[("x-forwarded-for", " , ")]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(caller_identity(&req), "127.0.0.1");

        assert_eq!(caller_identity(&request(&[])), "unknown");
    }

    #[test]
    fn media_type_strips_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            "Multipart/Form-Data; boundary=xyz".parse().unwrap(),
        );
        assert_eq!(media_type(&headers).as_deref(), Some("multipart/form-data"));
        assert_eq!(media_type(&HeaderMap::new()), None);
    }
}
