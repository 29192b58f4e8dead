//! Shared browser-identity headers for page and asset fetches.
//!
//! Single source for the User-Agent and Accept header values so page, asset,
//! and probe traffic present the same identity to origins.

/// Browser User-Agent sent with every request.
///
/// Some origins reject unknown clients outright; a mainstream browser
/// identity keeps block rates low for publicly served assets.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Accept header matching what a browser sends for top-level navigation.
pub(crate) const ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Accept-Language header.
pub(crate) const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Accept-Encoding header. Set explicitly so the transport hands back the
/// body exactly as the server encoded it; decoding happens in
/// [`crate::fetch::decode`] where a failed decode can fall back to the raw
/// bytes instead of aborting the fetch.
pub(crate) const ACCEPT_ENCODING: &str = "gzip, deflate, br";
