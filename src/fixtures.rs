#[cfg(test)]
pub mod test {
    use std::path::Path;

    use crate::env::MapEnv;
    use crate::file;
    use crate::resolve::Resolver;
    use crate::store::ConfigStore;

    /// A synthetic environment holding exactly `vars`.
    pub fn env(vars: &[(&str, &str)]) -> MapEnv {
        vars.iter().copied().collect()
    }

    /// A store loaded from TOML text, as if read from `config.toml`.
    pub fn store(toml: &str) -> ConfigStore {
        let path = Path::new("config.toml");
        let table = file::parse(path, toml).unwrap();
        ConfigStore::from_table(Some(path.to_path_buf()), table)
    }

    /// A resolver for the program `abc`, with the given environment and config.
    pub fn resolver(vars: &[(&str, &str)], toml: &str) -> Resolver {
        Resolver::new("ABC", env(vars), store(toml))
    }

    #[test]
    fn env_fixture_holds_vars() {
        use crate::env::EnvSource;
        let e = env(&[("ABC_PORT", "1")]);
        assert_eq!(e.get("ABC_PORT").as_deref(), Some("1"));
        assert_eq!(e.get("ABC_HOST"), None);
    }

    #[test]
    fn store_fixture_parses_toml() {
        let s = store("[database]\nurl = \"pg://\"\n");
        assert_eq!(s.get("database.url").unwrap().as_str(), Some("pg://"));
    }
}
