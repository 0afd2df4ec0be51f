use crate::config::CostCenters;

/// Pick the cost-center code for a request. First match wins:
/// group A marker, group B marker, a structured school name, then the default.
///
/// `school_list` is expected lower-cased.
pub fn determine_cost_center<'a>(
    school_list: &str,
    structured_name: Option<&str>,
    centers: &'a CostCenters,
) -> &'a str {
    if centers.group_a.matches(school_list) {
        return &centers.group_a.code;
    }
    if centers.group_b.matches(school_list) {
        return &centers.group_b.code;
    }
    if structured_name.is_some_and(|s| !s.trim().is_empty()) {
        return &centers.structured_name_code;
    }
    &centers.default_code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_order() {
        let cc = CostCenters::default();
        assert_eq!(
            determine_cost_center("langagerskolen og stensagerskolen", Some("x"), &cc),
            "XG-5240220808-00004"
        );
        assert_eq!(
            determine_cost_center("stensagerskolen (afd. nord)", Some("x"), &cc),
            "XG-5240220808-00005"
        );
        assert_eq!(
            determine_cost_center("anden skole", Some("Friskolen"), &cc),
            "XG-5240220835-00004"
        );
        assert_eq!(
            determine_cost_center("anden skole", None, &cc),
            "XG-5240220808-00003"
        );
        assert_eq!(
            determine_cost_center("", Some("   "), &cc),
            "XG-5240220808-00003"
        );
    }

    #[test]
    fn always_one_of_four() {
        let cc = CostCenters::default();
        let codes = [
            cc.group_a.code.as_str(),
            cc.group_b.code.as_str(),
            cc.structured_name_code.as_str(),
            cc.default_code.as_str(),
        ];
        for text in ["", "langagerskolen", "xyz", "stensagerskolen", "ÆØÅ"] {
            for name in [None, Some(""), Some("Skole")] {
                assert!(codes.contains(&determine_cost_center(text, name, &cc)));
            }
        }
    }
}
