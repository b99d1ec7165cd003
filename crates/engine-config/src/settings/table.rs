use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FROM_TABLE: Regex = Regex::new(r"(?i)\bFROM\s+([^\s,;]+)").unwrap();
}

/// Name of the first table after a `FROM` keyword, if any.
pub fn infer_table_name(query: &str) -> Option<String> {
    FROM_TABLE
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_table_name() {
        assert_eq!(infer_table_name("SELECT * FROM users;").as_deref(), Some("users"));
        assert_eq!(
            infer_table_name("select id\nfrom\tshop.orders o, items").as_deref(),
            Some("shop.orders")
        );
        assert_eq!(
            infer_table_name("SELECT a FROM t1 WHERE b IN (SELECT b FROM t2)").as_deref(),
            Some("t1")
        );
        assert_eq!(infer_table_name("SELECT fromage FROM `cheese`").as_deref(), Some("`cheese`"));
        assert_eq!(infer_table_name("SELECT 1"), None);
    }
}
