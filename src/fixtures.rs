#[cfg(test)]
pub mod test {
    use crate::catalogue::{self, CatalogueConfig};
    use crate::patch::LoaderOverrides;
    use crate::registry::RuleRegistry;
    use crate::resolve;
    use crate::types::Target;

    /// Resolved registry for `target` with no overrides.
    pub fn registry(target: Target, devtool: Option<&str>) -> RuleRegistry {
        let rules = catalogue::build(&CatalogueConfig::new(target, devtool));
        RuleRegistry::new(resolve::resolve(rules, &LoaderOverrides::new()))
    }

    pub fn generic_registry() -> RuleRegistry {
        registry(Target::Generic, None)
    }

    pub fn client_registry() -> RuleRegistry {
        registry(Target::Client, None)
    }

    #[test]
    fn fixtures_cover_both_targets() {
        assert_eq!(generic_registry().len(), 6);
        assert_eq!(client_registry().len(), 7);
        assert!(client_registry().get("nunjucks").is_some());
    }
}
