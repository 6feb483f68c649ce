//! OData value encoding

use std::borrow::Cow;

/// Percent-encode a value placed in a URL path segment or query value
pub fn encode_uri_component(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Encode a value placed inside a single-quoted OData literal, e.g.
/// `getByTitle('...')`. Quotes are doubled before encoding.
pub fn encode_query_parameter(value: &str) -> String {
    urlencoding::encode(&value.replace('\'', "''")).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_query_parameter_doubles_quotes() {
        assert_eq!(encode_query_parameter("Bob's list"), "Bob%27%27s%20list");
        assert_eq!(encode_query_parameter("Documents"), "Documents");
    }

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_uri_component("0x0101"), "0x0101");
    }
}
