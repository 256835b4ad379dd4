#[cfg(test)]
mod tests {
    use anyhow::Result;
    use mlua::{Lua, Table};

    use crate::error::BindError;
    use crate::kinds::Container;
    use crate::marshal::{CONTAINER_KEYS, StringHash, container_from_table, image_name};

    fn table(lua: &Lua, source: &str) -> Result<Table> {
        Ok(lua.load(source).eval()?)
    }

    #[test]
    fn test_name_defaults_to_image_short_name() -> Result<()> {
        let lua = Lua::new();
        let container = container_from_table(&table(&lua, "{image = 'repo/foo:tag'}")?, "new_app")?;
        assert_eq!(
            container,
            Container {
                name: "foo".to_string(),
                image: "repo/foo:tag".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn test_explicit_name_wins() -> Result<()> {
        let lua = Lua::new();
        let container = container_from_table(&table(&lua, "{image = 'nginx', name = 'web'}")?, "new_app")?;
        assert_eq!(container.name, "web");
        assert_eq!(container.image, "nginx");
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Result<()> {
        let lua = Lua::new();
        let err = container_from_table(&table(&lua, "{image = 'x', bogus = 'y'}")?, "new_app").unwrap_err();
        assert!(matches!(err, BindError::Validation(_)));
        assert_eq!(err.to_string(), "new_app only accepts `image`, `name` as keys, got `bogus`");
        Ok(())
    }

    #[test]
    fn test_non_string_value_is_a_type_error() -> Result<()> {
        let lua = Lua::new();
        let err = container_from_table(&table(&lua, "{image = 1}")?, "new_app").unwrap_err();
        assert!(matches!(err, BindError::Type(_)));
        assert_eq!(err.to_string(), "value for key `image` is not string");
        Ok(())
    }

    #[test]
    fn test_missing_image() -> Result<()> {
        let lua = Lua::new();
        let err = container_from_table(&table(&lua, "{name = 'web'}")?, "new_app").unwrap_err();
        assert_eq!(err.to_string(), "new_app requires `image`");
        Ok(())
    }

    #[test]
    fn test_string_hash_keeps_only_allowed_pairs() -> Result<()> {
        let lua = Lua::new();
        let hash = StringHash::from_table(&table(&lua, "{image = 'a', name = 'b'}")?, "f", CONTAINER_KEYS)?;
        assert_eq!(hash.len(), 2);
        assert_eq!(hash.get("name"), Some("b"));
        assert!(StringHash::from_table(&lua.create_table()?, "f", CONTAINER_KEYS)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_image_name() {
        assert_eq!(image_name("nginx"), "nginx");
        assert_eq!(image_name("nginx:1.25"), "nginx");
        assert_eq!(image_name("registry:5000/team/app:v1"), "app");
        assert_eq!(image_name("ghcr.io/org/tool@sha256:abc"), "tool");
    }
}
