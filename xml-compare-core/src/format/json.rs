use crate::diff::result::Difference;

/// Format differences as a JSON array.
pub fn format_json(differences: &[Difference<'_>]) -> String {
    serde_json::to_string_pretty(differences).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::format_json;
    use crate::diff::compare;
    use crate::tree::XmlNode;

    #[test]
    fn json_carries_kind_result_and_positions() {
        let control = XmlNode::new("a").with_attribute("x", "1");
        let test = XmlNode::new("a").with_attribute("x", "2");
        let diff = compare(&control, &test);

        let value: serde_json::Value =
            serde_json::from_str(&format_json(diff.as_slice())).expect("valid json");
        let first = &value[0];
        assert_eq!(first["result"], "DIFFERENT");
        assert_eq!(first["comparison"]["kind"], "attribute_value");
        assert_eq!(first["comparison"]["control"]["position"], "/a[1]/@x");
        assert_eq!(first["comparison"]["test"]["value"]["value"], "2");
    }
}
