/// Turn a user-typed address into something `Tab::navigate_to` accepts
///
/// Addresses with a scheme pass through. Local hosts get `http://`, anything
/// that looks like a domain gets `https://`, and a bare word is treated as a
/// `.com` domain.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();

    const SCHEMES: [&str; 7] = [
        "http://",
        "https://",
        "file://",
        "data:",
        "about:",
        "chrome://",
        "chrome-extension://",
    ];
    if SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return trimmed.to_string();
    }

    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    if trimmed.contains('.') || trimmed.contains('/') {
        return format!("https://{}", trimmed);
    }

    format!("https://www.{}.com", trimmed)
}
