//! Connect-URL construction.
//!
//! `<endpoint>?Authorization=Bearer <token>&id=<session-or--1>&presetId=<preset>`
//!
//! The token is framed with the bearer scheme before encoding; a temporary
//! session key becomes the sentinel `-1` so the remote endpoint allocates a
//! durable id. Query values are percent-encoded (the bearer prefix contains
//! a space).

use chatwire_core::SessionKey;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in query-parameter values. Conservative superset of
/// what RFC 3986 requires for the query component; keeps `-` intact so the
/// sentinel reads literally as `-1`.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'=')
    .add(b'?');

/// Build the WebSocket connect URL for one session.
pub(crate) fn build_connect_url(
    endpoint: &str,
    token: Option<&str>,
    session: &SessionKey,
    preset_id: Option<&str>,
) -> String {
    let auth = token.map(|t| format!("Bearer {t}")).unwrap_or_default();
    let auth = utf8_percent_encode(&auth, QUERY_VALUE);
    let id = utf8_percent_encode(session.wire_id(), QUERY_VALUE);
    let preset = utf8_percent_encode(preset_id.unwrap_or_default(), QUERY_VALUE);
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}Authorization={auth}&id={id}&presetId={preset}")
}
