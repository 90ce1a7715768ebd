//! Product type -> department code mapping.
//!
//! The external catalog carries free-form product types; the counting
//! workflow groups them into a fixed set of store departments.

/// Map a platform product type to a department code, if it belongs to one.
pub fn department_for(product_type: &str) -> Option<&'static str> {
    match product_type.to_uppercase().trim() {
        "BRAID" | "HAIR" | "WIG" => Some("HAIR"),
        "HAIR & SKIN CARE" => Some("CARE"),
        "JEWELRY" | "MAKEUP" | "K-BEAUTY" | "TOOLS & ACCESSORIES" => Some("GENM"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_map_to_departments() {
        assert_eq!(department_for("BRAID"), Some("HAIR"));
        assert_eq!(department_for("wig"), Some("HAIR"));
        assert_eq!(department_for("Hair & Skin Care"), Some("CARE"));
        assert_eq!(department_for("K-BEAUTY"), Some("GENM"));
    }

    #[test]
    fn unknown_types_map_to_none() {
        assert_eq!(department_for("FURNITURE"), None);
        assert_eq!(department_for(""), None);
    }
}
