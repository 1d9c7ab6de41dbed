//! JS-level fingerprint hardening injected before any document script runs.

/// Build the init script. `accept_language` is the header value sent by the
/// session; `navigator.languages` is derived from it so the two agree.
pub fn stealth_script(accept_language: &str) -> String {
    let languages = navigator_languages(accept_language);
    let languages_json =
        serde_json::to_string(&languages).unwrap_or_else(|_| "[\"it-IT\",\"it\"]".to_string());
    STEALTH_TEMPLATE.replace("__LANGUAGES__", &languages_json)
}

/// `it-IT,it;q=0.9,en;q=0.8` → `["it-IT", "it", "en"]`.
pub fn navigator_languages(accept_language: &str) -> Vec<String> {
    accept_language
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

const STEALTH_TEMPLATE: &str = r#"
(() => {
    const proto = Navigator.prototype;
    try {
        Object.defineProperty(proto, 'webdriver', { get: () => undefined, configurable: true });
    } catch (e) {}
    try { delete navigator.webdriver; } catch (e) {}
    try {
        Object.defineProperty(proto, 'languages', { get: () => __LANGUAGES__, configurable: true });
    } catch (e) {}
    try {
        Object.defineProperty(proto, 'plugins', { get: () => [1, 2, 3, 4, 5], configurable: true });
    } catch (e) {}
})();

if (!window.chrome) {
    window.chrome = {};
}
if (!window.chrome.runtime) {
    window.chrome.runtime = {
        connect: function() { return { onDisconnect: { addListener: function() {} } }; },
        sendMessage: function() {},
    };
}

const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}

const getParameter = WebGLRenderingContext.prototype.getParameter;
WebGLRenderingContext.prototype.getParameter = function(parameter) {
    if (parameter === 37445) return 'Intel Inc.';
    if (parameter === 37446) return 'Intel Iris OpenGL Engine';
    return getParameter.apply(this, arguments);
};

delete window.__playwright;
delete window.__puppeteer;
delete window.__selenium;
delete window.callPhantom;
delete window._phantom;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_follow_accept_language_header() {
        assert_eq!(
            navigator_languages("it-IT,it;q=0.9,en-US;q=0.8"),
            vec!["it-IT", "it", "en-US"]
        );
    }

    #[test]
    fn script_embeds_language_list() {
        let script = stealth_script("it-IT,it;q=0.9");
        assert!(script.contains(r#"["it-IT","it"]"#));
        assert!(script.contains("webdriver"));
        assert!(!script.contains("__LANGUAGES__"));
    }
}
