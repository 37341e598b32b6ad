use super::headers::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
    SIMPLE_RESPONSE_HEADERS,
};
use super::options::AllOrSome;
use super::ResourceOptions;
use crate::dispatcher::HandlerResponse;

/// Add the actual-request CORS headers to `res` for an allowed origin.
///
/// Exposed headers are computed first so that a `"*"` policy only sees the
/// handler's own headers.
///
/// # Panics
///
/// If the response already carries `Access-Control-Allow-Origin`,
/// `Access-Control-Allow-Credentials` or `Access-Control-Expose-Headers`.
/// That means the response was decorated twice or the handler set CORS headers
/// itself.
pub fn decorate_response(res: &mut HandlerResponse, origin: &str, options: &ResourceOptions) {
    for name in [
        ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        ACCESS_CONTROL_EXPOSE_HEADERS,
    ] {
        assert!(
            !res.has_header(name),
            "response already carries '{name}' before CORS decoration"
        );
    }

    // "*" always sets the header, even when every response header is simple.
    let exposed = match options.expose_headers() {
        AllOrSome::All => Some(
            res.header_names()
                .filter(|name| {
                    !SIMPLE_RESPONSE_HEADERS
                        .iter()
                        .any(|simple| name.eq_ignore_ascii_case(simple))
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        AllOrSome::Some(headers) if !headers.is_empty() => {
            Some(headers.iter().map(String::as_str).collect::<Vec<_>>().join(","))
        }
        AllOrSome::Some(_) => None,
    };
    if let Some(exposed) = exposed {
        res.set_header(ACCESS_CONTROL_EXPOSE_HEADERS, exposed);
    }

    res.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, origin.to_string());
    if options.allow_credentials() {
        res.set_header(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string());
    }
}
