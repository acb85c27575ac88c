//! Small helpers for hand-built XML documents (TwiML, SSML).

/// Escape the five XML special characters.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_escape() {
        let escaped = xml_escape("Hola <mundo> & \"amigos\"");
        assert_eq!(escaped, "Hola &lt;mundo&gt; &amp; &quot;amigos&quot;");
    }

    #[test]
    fn test_xml_escape_apostrophe() {
        assert_eq!(xml_escape("it's"), "it&apos;s");
    }
}
