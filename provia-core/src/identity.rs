use uuid::Uuid;

/// A buyer reference as carried on an order: either a parseable account id
/// or a free-form company name that the buyer directory resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyerRef {
    Id(Uuid),
    Name(String),
}

impl BuyerRef {
    pub fn parse(reference: &str) -> Option<Self> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return None;
        }
        match Uuid::parse_str(trimmed) {
            Ok(id) => Some(BuyerRef::Id(id)),
            Err(_) => Some(BuyerRef::Name(trimmed.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_or_name() {
        let id = Uuid::new_v4();
        assert_eq!(BuyerRef::parse(&id.to_string()), Some(BuyerRef::Id(id)));
        assert_eq!(
            BuyerRef::parse("  Restaurante Vista "),
            Some(BuyerRef::Name("Restaurante Vista".to_string()))
        );
        assert_eq!(BuyerRef::parse("   "), None);
    }
}
